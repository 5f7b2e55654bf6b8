//! The LZMA probability model: literal/match/rep decision trees, the
//! 12-state automaton, and distance/length coding built on top of the
//! [`RangeEncoder`](super::range_coder::RangeEncoder).

use super::price::{DIRECT_BIT_PRICE, PriceTable};
use super::range_coder::{INITIAL_PROB, RangeEncoder, init_probs};

const NUM_REPS: usize = 4;
const NUM_STATES: usize = 12;
const NUM_LIT_TABLES: usize = 3;

const NUM_POS_BITS_MAX: usize = 4;
const NUM_POS_STATES_MAX: usize = 1 << NUM_POS_BITS_MAX;

const LEN_NUM_LOW_BITS: u32 = 3;
const LEN_NUM_LOW_SYMBOLS: usize = 1 << LEN_NUM_LOW_BITS;
const LEN_NUM_MID_BITS: u32 = 3;
const LEN_NUM_MID_SYMBOLS: usize = 1 << LEN_NUM_MID_BITS;
const LEN_NUM_HIGH_BITS: u32 = 8;
const LEN_NUM_HIGH_SYMBOLS: usize = 1 << LEN_NUM_HIGH_BITS;

/// Shortest length LZMA can express as a match; shorter runs are always
/// literals or the decoder's "short rep" single-byte special case.
pub const MATCH_LEN_MIN: u32 = 2;
/// Longest length a single match/rep token can express before the
/// optimizer must split it into more than one token.
pub const MATCH_LEN_MAX: u32 = MATCH_LEN_MIN + (LEN_NUM_LOW_SYMBOLS + LEN_NUM_MID_SYMBOLS + LEN_NUM_HIGH_SYMBOLS) as u32 - 1;

const NUM_LEN_TO_POS_STATES: usize = 4;
const NUM_POS_SLOT_BITS: u32 = 6;
const NUM_ALIGN_BITS: u32 = 4;
const ALIGN_TABLE_SIZE: usize = 1 << NUM_ALIGN_BITS;

const START_POS_MODEL_INDEX: usize = 4;
const END_POS_MODEL_INDEX: usize = 14;
const NUM_FULL_DISTANCES_BITS: usize = END_POS_MODEL_INDEX / 2;
const NUM_FULL_DISTANCES: usize = 1 << NUM_FULL_DISTANCES_BITS;

const LIT_NEXT_STATES: [usize; NUM_STATES] = [0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 4, 5];
const MATCH_NEXT_STATES: [usize; NUM_STATES] = [7, 7, 7, 7, 7, 7, 7, 10, 10, 10, 10, 10];
const REP_NEXT_STATES: [usize; NUM_STATES] = [8, 8, 8, 8, 8, 8, 8, 11, 11, 11, 11, 11];
const SHORT_REP_NEXT_STATES: [usize; NUM_STATES] = [9, 9, 9, 9, 9, 9, 9, 11, 11, 11, 11, 11];

/// Returns whether `state` represents "just came from a match or rep",
/// the condition that switches literal coding into matched-literal mode.
pub fn state_is_after_match(state: usize) -> bool {
    state >= 7
}

/// Length encoder shared by match and rep tokens: a 3-tier bit-tree
/// tree (low/mid/high) selected by two leading choice bits.
#[derive(Clone)]
pub struct LengthEncoder {
    choice: u16,
    choice2: u16,
    low: [[u16; LEN_NUM_LOW_SYMBOLS]; NUM_POS_STATES_MAX],
    mid: [[u16; LEN_NUM_MID_SYMBOLS]; NUM_POS_STATES_MAX],
    high: [u16; LEN_NUM_HIGH_SYMBOLS],
}

impl LengthEncoder {
    pub fn new() -> Self {
        let mut enc = Self {
            choice: INITIAL_PROB,
            choice2: INITIAL_PROB,
            low: [[INITIAL_PROB; LEN_NUM_LOW_SYMBOLS]; NUM_POS_STATES_MAX],
            mid: [[INITIAL_PROB; LEN_NUM_MID_SYMBOLS]; NUM_POS_STATES_MAX],
            high: [INITIAL_PROB; LEN_NUM_HIGH_SYMBOLS],
        };
        enc.reset();
        enc
    }

    pub fn reset(&mut self) {
        self.choice = INITIAL_PROB;
        self.choice2 = INITIAL_PROB;
        for ps in &mut self.low {
            init_probs(ps);
        }
        for ps in &mut self.mid {
            init_probs(ps);
        }
        init_probs(&mut self.high);
    }

    /// Encodes `length` (`MATCH_LEN_MIN..=MATCH_LEN_MAX`) at `pos_state`.
    pub fn encode(&mut self, rc: &mut RangeEncoder, length: u32, pos_state: usize) {
        let len = length - MATCH_LEN_MIN;
        if len < LEN_NUM_LOW_SYMBOLS as u32 {
            rc.encode_bit(&mut self.choice, false);
            rc.encode_bit_tree(&mut self.low[pos_state], LEN_NUM_LOW_BITS, len);
        } else if len < (LEN_NUM_LOW_SYMBOLS + LEN_NUM_MID_SYMBOLS) as u32 {
            rc.encode_bit(&mut self.choice, true);
            rc.encode_bit(&mut self.choice2, false);
            let symbol = len - LEN_NUM_LOW_SYMBOLS as u32;
            rc.encode_bit_tree(&mut self.mid[pos_state], LEN_NUM_MID_BITS, symbol);
        } else {
            rc.encode_bit(&mut self.choice, true);
            rc.encode_bit(&mut self.choice2, true);
            let symbol = len - (LEN_NUM_LOW_SYMBOLS + LEN_NUM_MID_SYMBOLS) as u32;
            rc.encode_bit_tree(&mut self.high, LEN_NUM_HIGH_BITS, symbol);
        }
    }
}

impl Default for LengthEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Full adaptive probability model for one LZMA stream: literal
/// context tables, match/rep decision bits, and distance/length
/// sub-encoders, plus the automaton state and the 4 most recent
/// distances used by rep matches.
pub struct LzmaState {
    lc: u32,
    lp: u32,
    pb: u32,
    pos_state_mask: u32,

    state: usize,
    reps: [u32; NUM_REPS],

    is_match: [[u16; NUM_POS_STATES_MAX]; NUM_STATES],
    is_rep: [u16; NUM_STATES],
    is_rep_g0: [u16; NUM_STATES],
    is_rep_g1: [u16; NUM_STATES],
    is_rep_g2: [u16; NUM_STATES],
    is_rep0_long: [[u16; NUM_POS_STATES_MAX]; NUM_STATES],

    literal_probs: Vec<u16>,

    dist_slot_encoders: [[u16; 1 << NUM_POS_SLOT_BITS]; NUM_LEN_TO_POS_STATES],
    dist_align_encoders: [u16; ALIGN_TABLE_SIZE],
    dist_encoders: [u16; NUM_FULL_DISTANCES - END_POS_MODEL_INDEX],

    len_encoder: LengthEncoder,
    rep_len_encoder: LengthEncoder,
}

impl LzmaState {
    /// Builds a fresh model for the given `(lc, lp, pb)` triple. A solid
    /// unit's first chunk always starts from a fresh state; later
    /// chunks in the same unit carry the state forward via `reset`
    /// being skipped (the caller keeps the same `LzmaState`).
    pub fn new(lc: u32, lp: u32, pb: u32) -> Self {
        let num_literal_probs = (NUM_LIT_TABLES * 256) << (lc + lp);
        let mut state = Self {
            lc,
            lp,
            pb,
            pos_state_mask: (1 << pb) - 1,
            state: 0,
            reps: [0; NUM_REPS],
            is_match: [[INITIAL_PROB; NUM_POS_STATES_MAX]; NUM_STATES],
            is_rep: [INITIAL_PROB; NUM_STATES],
            is_rep_g0: [INITIAL_PROB; NUM_STATES],
            is_rep_g1: [INITIAL_PROB; NUM_STATES],
            is_rep_g2: [INITIAL_PROB; NUM_STATES],
            is_rep0_long: [[INITIAL_PROB; NUM_POS_STATES_MAX]; NUM_STATES],
            literal_probs: vec![INITIAL_PROB; num_literal_probs],
            dist_slot_encoders: [[INITIAL_PROB; 1 << NUM_POS_SLOT_BITS]; NUM_LEN_TO_POS_STATES],
            dist_align_encoders: [INITIAL_PROB; ALIGN_TABLE_SIZE],
            dist_encoders: [INITIAL_PROB; NUM_FULL_DISTANCES - END_POS_MODEL_INDEX],
            len_encoder: LengthEncoder::new(),
            rep_len_encoder: LengthEncoder::new(),
        };
        state.reset();
        state
    }

    /// Resets the model to its initial (all-50%, state 0, zero reps)
    /// condition, used at the start of a new solid unit.
    pub fn reset(&mut self) {
        self.state = 0;
        self.reps = [0; NUM_REPS];
        for row in &mut self.is_match {
            init_probs(row);
        }
        init_probs(&mut self.is_rep);
        init_probs(&mut self.is_rep_g0);
        init_probs(&mut self.is_rep_g1);
        init_probs(&mut self.is_rep_g2);
        for row in &mut self.is_rep0_long {
            init_probs(row);
        }
        init_probs(&mut self.literal_probs);
        for row in &mut self.dist_slot_encoders {
            init_probs(row);
        }
        init_probs(&mut self.dist_align_encoders);
        init_probs(&mut self.dist_encoders);
        self.len_encoder.reset();
        self.rep_len_encoder.reset();
    }

    fn pos_state(&self, pos: usize) -> usize {
        pos & self.pos_state_mask as usize
    }

    fn literal_context(&self, pos: usize, prev_byte: u8) -> usize {
        let lp_mask = (1usize << self.lp) - 1;
        let pos_bits = pos & lp_mask;
        let prev_bits = (prev_byte as usize) >> (8 - self.lc as usize);
        (pos_bits << self.lc as usize) + prev_bits
    }

    /// Encodes one literal byte, using matched-literal coding when the
    /// state just came from a match (`match_byte` is the dictionary
    /// byte at the rep0 distance).
    pub fn encode_literal(
        &mut self,
        rc: &mut RangeEncoder,
        byte: u8,
        pos: usize,
        prev_byte: u8,
        match_byte: Option<u8>,
    ) {
        let pos_state = self.pos_state(pos);
        rc.encode_bit(&mut self.is_match[self.state][pos_state], false);

        let context = self.literal_context(pos, prev_byte);
        let probs_offset = context * NUM_LIT_TABLES * 256;

        if state_is_after_match(self.state) {
            if let Some(mb) = match_byte {
                self.encode_matched_literal(rc, probs_offset, byte, mb);
            } else {
                self.encode_normal_literal(rc, probs_offset, byte);
            }
        } else {
            self.encode_normal_literal(rc, probs_offset, byte);
        }

        self.state = LIT_NEXT_STATES[self.state];
    }

    fn encode_normal_literal(&mut self, rc: &mut RangeEncoder, probs_offset: usize, byte: u8) {
        let mut symbol = 1u32;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) != 0;
            rc.encode_bit(&mut self.literal_probs[probs_offset + symbol as usize], bit);
            symbol = (symbol << 1) | (bit as u32);
        }
    }

    fn encode_matched_literal(
        &mut self,
        rc: &mut RangeEncoder,
        probs_offset: usize,
        byte: u8,
        match_byte: u8,
    ) {
        let mut symbol = 1u32;
        let mut offset = 0x100usize;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) != 0;
            let match_bit = ((match_byte >> i) & 1) as usize;
            let idx = probs_offset + offset + match_bit * 0x100 + symbol as usize;
            rc.encode_bit(&mut self.literal_probs[idx], bit);
            symbol = (symbol << 1) | (bit as u32);
            if match_bit != (bit as usize) {
                offset = 0;
            }
        }
    }

    /// Encodes a new match: distance (converted to 0-indexed internally)
    /// and length, then rotates it into the rep-distance window.
    pub fn encode_match(&mut self, rc: &mut RangeEncoder, distance: u32, length: u32, pos: usize) {
        let pos_state = self.pos_state(pos);
        rc.encode_bit(&mut self.is_match[self.state][pos_state], true);
        rc.encode_bit(&mut self.is_rep[self.state], false);
        self.len_encoder.encode(rc, length, pos_state);

        let dist = distance - 1;
        self.encode_distance(rc, dist, length);

        self.reps[3] = self.reps[2];
        self.reps[2] = self.reps[1];
        self.reps[1] = self.reps[0];
        self.reps[0] = dist;

        self.state = MATCH_NEXT_STATES[self.state];
    }

    /// Encodes a repeat match against one of the 4 carried distances.
    /// `length == 1` with `rep_index == 0` is the "short rep" special
    /// case: a single repeated byte coded without a length tree at all.
    pub fn encode_rep(&mut self, rc: &mut RangeEncoder, rep_index: usize, length: u32, pos: usize) {
        let pos_state = self.pos_state(pos);
        rc.encode_bit(&mut self.is_match[self.state][pos_state], true);
        rc.encode_bit(&mut self.is_rep[self.state], true);

        if rep_index == 0 {
            rc.encode_bit(&mut self.is_rep_g0[self.state], false);
            if length == 1 {
                rc.encode_bit(&mut self.is_rep0_long[self.state][pos_state], false);
                self.state = SHORT_REP_NEXT_STATES[self.state];
                return;
            }
            rc.encode_bit(&mut self.is_rep0_long[self.state][pos_state], true);
        } else {
            rc.encode_bit(&mut self.is_rep_g0[self.state], true);
            if rep_index == 1 {
                rc.encode_bit(&mut self.is_rep_g1[self.state], false);
            } else {
                rc.encode_bit(&mut self.is_rep_g1[self.state], true);
                rc.encode_bit(&mut self.is_rep_g2[self.state], rep_index != 2);
            }
            let rep_dist = self.reps[rep_index];
            for i in (1..=rep_index).rev() {
                self.reps[i] = self.reps[i - 1];
            }
            self.reps[0] = rep_dist;
        }

        self.rep_len_encoder.encode(rc, length, pos_state);
        self.state = REP_NEXT_STATES[self.state];
    }

    /// Estimated cost, in 1/16-bit units, of coding `byte` as a literal
    /// at `pos` without mutating any probability. Used by the optimal
    /// parser to compare candidate edges before committing to one.
    pub fn price_literal(
        &self,
        prices: &PriceTable,
        byte: u8,
        pos: usize,
        prev_byte: u8,
        match_byte: Option<u8>,
    ) -> u32 {
        let pos_state = self.pos_state(pos);
        let mut price = prices.price(self.is_match[self.state][pos_state], false);

        let context = self.literal_context(pos, prev_byte);
        let probs_offset = context * NUM_LIT_TABLES * 256;

        if state_is_after_match(self.state) {
            if let Some(mb) = match_byte {
                price += self.price_matched_literal(prices, probs_offset, byte, mb);
                return price;
            }
        }
        price += self.price_normal_literal(prices, probs_offset, byte);
        price
    }

    fn price_normal_literal(&self, prices: &PriceTable, probs_offset: usize, byte: u8) -> u32 {
        let mut symbol = 1u32;
        let mut price = 0u32;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) != 0;
            price += prices.price(self.literal_probs[probs_offset + symbol as usize], bit);
            symbol = (symbol << 1) | (bit as u32);
        }
        price
    }

    fn price_matched_literal(&self, prices: &PriceTable, probs_offset: usize, byte: u8, match_byte: u8) -> u32 {
        let mut symbol = 1u32;
        let mut offset = 0x100usize;
        let mut price = 0u32;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) != 0;
            let match_bit = ((match_byte >> i) & 1) as usize;
            let idx = probs_offset + offset + match_bit * 0x100 + symbol as usize;
            price += prices.price(self.literal_probs[idx], bit);
            symbol = (symbol << 1) | (bit as u32);
            if match_bit != (bit as usize) {
                offset = 0;
            }
        }
        price
    }

    /// Estimated cost of a new match at `distance`/`length` from `pos`.
    pub fn price_match(&self, prices: &PriceTable, distance: u32, length: u32, pos: usize) -> u32 {
        let pos_state = self.pos_state(pos);
        let mut price = prices.price(self.is_match[self.state][pos_state], true);
        price += prices.price(self.is_rep[self.state], false);
        price += self.price_length(prices, &self.len_encoder, length, pos_state);
        price += self.price_distance(prices, distance - 1, length);
        price
    }

    /// Estimated cost of a repeat match against `rep_index`'s distance.
    /// `length == 1` prices the short-rep special case.
    pub fn price_rep(&self, prices: &PriceTable, rep_index: usize, length: u32, pos: usize) -> u32 {
        let pos_state = self.pos_state(pos);
        let mut price = prices.price(self.is_match[self.state][pos_state], true);
        price += prices.price(self.is_rep[self.state], true);

        if rep_index == 0 {
            price += prices.price(self.is_rep_g0[self.state], false);
            if length == 1 {
                price += prices.price(self.is_rep0_long[self.state][pos_state], false);
                return price;
            }
            price += prices.price(self.is_rep0_long[self.state][pos_state], true);
        } else {
            price += prices.price(self.is_rep_g0[self.state], true);
            if rep_index == 1 {
                price += prices.price(self.is_rep_g1[self.state], false);
            } else {
                price += prices.price(self.is_rep_g1[self.state], true);
                price += prices.price(self.is_rep_g2[self.state], rep_index != 2);
            }
        }
        price += self.price_length(prices, &self.rep_len_encoder, length, pos_state);
        price
    }

    fn price_length(&self, prices: &PriceTable, enc: &LengthEncoder, length: u32, pos_state: usize) -> u32 {
        let len = length - MATCH_LEN_MIN;
        if len < LEN_NUM_LOW_SYMBOLS as u32 {
            prices.price(enc.choice, false) + prices.bit_tree_price(&enc.low[pos_state], LEN_NUM_LOW_BITS, len)
        } else if len < (LEN_NUM_LOW_SYMBOLS + LEN_NUM_MID_SYMBOLS) as u32 {
            let symbol = len - LEN_NUM_LOW_SYMBOLS as u32;
            prices.price(enc.choice, true)
                + prices.price(enc.choice2, false)
                + prices.bit_tree_price(&enc.mid[pos_state], LEN_NUM_MID_BITS, symbol)
        } else {
            let symbol = len - (LEN_NUM_LOW_SYMBOLS + LEN_NUM_MID_SYMBOLS) as u32;
            prices.price(enc.choice, true)
                + prices.price(enc.choice2, true)
                + prices.bit_tree_price(&enc.high, LEN_NUM_HIGH_BITS, symbol)
        }
    }

    fn price_distance(&self, prices: &PriceTable, dist: u32, length: u32) -> u32 {
        let len_state = ((length - MATCH_LEN_MIN) as usize).min(NUM_LEN_TO_POS_STATES - 1);
        let slot = dist_slot(dist);
        let mut price = prices.bit_tree_price(&self.dist_slot_encoders[len_state], NUM_POS_SLOT_BITS, slot);

        if slot >= START_POS_MODEL_INDEX as u32 {
            let num_direct_bits = (slot >> 1) - 1;
            let base = (2 | (slot & 1)) << num_direct_bits;
            let dist_reduced = dist - base;

            if slot < END_POS_MODEL_INDEX as u32 {
                let base_idx = dist_encoder_base(slot);
                price += self.price_dist_special(prices, base_idx, dist_reduced, num_direct_bits);
            } else {
                let direct_bits = num_direct_bits - NUM_ALIGN_BITS;
                price += direct_bits * DIRECT_BIT_PRICE;
                let align_symbol = dist_reduced & (ALIGN_TABLE_SIZE as u32 - 1);
                price += prices.bit_tree_reverse_price(&self.dist_align_encoders, NUM_ALIGN_BITS, align_symbol);
            }
        }
        price
    }

    fn price_dist_special(&self, prices: &PriceTable, base_idx: usize, symbol: u32, num_bits: u32) -> u32 {
        let mut m = 1u32;
        let mut price = 0u32;
        for i in 0..num_bits {
            let bit = (symbol >> i) & 1;
            let idx = base_idx + m as usize - 1;
            if idx < self.dist_encoders.len() {
                price += prices.price(self.dist_encoders[idx], bit != 0);
            }
            m = (m << 1) | bit;
        }
        price
    }

    fn encode_distance(&mut self, rc: &mut RangeEncoder, dist: u32, length: u32) {
        let len_state = ((length - MATCH_LEN_MIN) as usize).min(NUM_LEN_TO_POS_STATES - 1);
        let slot = dist_slot(dist);
        rc.encode_bit_tree(&mut self.dist_slot_encoders[len_state], NUM_POS_SLOT_BITS, slot);

        if slot >= START_POS_MODEL_INDEX as u32 {
            let num_direct_bits = (slot >> 1) - 1;
            let base = (2 | (slot & 1)) << num_direct_bits;
            let dist_reduced = dist - base;

            if slot < END_POS_MODEL_INDEX as u32 {
                let base_idx = dist_encoder_base(slot);
                self.encode_dist_special(rc, base_idx, dist_reduced, num_direct_bits);
            } else {
                let direct_bits = num_direct_bits - NUM_ALIGN_BITS;
                rc.encode_direct_bits(dist_reduced >> NUM_ALIGN_BITS, direct_bits);
                let align_symbol = dist_reduced & (ALIGN_TABLE_SIZE as u32 - 1);
                rc.encode_bit_tree_reverse(&mut self.dist_align_encoders, NUM_ALIGN_BITS, align_symbol);
            }
        }
    }

    fn encode_dist_special(&mut self, rc: &mut RangeEncoder, base_idx: usize, symbol: u32, num_bits: u32) {
        let mut m = 1u32;
        for i in 0..num_bits {
            let bit = (symbol >> i) & 1;
            let idx = base_idx + m as usize - 1;
            if idx < self.dist_encoders.len() {
                rc.encode_bit(&mut self.dist_encoders[idx], bit != 0);
            }
            m = (m << 1) | bit;
        }
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn reps(&self) -> &[u32; NUM_REPS] {
        &self.reps
    }

    pub fn lc(&self) -> u32 {
        self.lc
    }

    pub fn lp(&self) -> u32 {
        self.lp
    }

    pub fn pb(&self) -> u32 {
        self.pb
    }
}

fn dist_encoder_base(slot: u32) -> usize {
    let mut base = 0usize;
    for s in START_POS_MODEL_INDEX as u32..slot {
        let bits = (s >> 1) - 1;
        base += 1 << bits;
    }
    base
}

/// Classifies a 0-indexed distance into its logarithmic slot: slots
/// 0-3 are exact, every pair of slots beyond that doubles the range
/// of distances it covers.
fn dist_slot(dist: u32) -> u32 {
    if dist < 4 {
        return dist;
    }
    let highest_bit_pos = 32 - dist.leading_zeros();
    let second_bit = (dist >> (highest_bit_pos - 2)) & 1;
    (highest_bit_pos - 1) * 2 + second_bit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_encoder_covers_all_three_tiers() {
        let mut rc = RangeEncoder::new();
        let mut enc = LengthEncoder::new();
        enc.encode(&mut rc, MATCH_LEN_MIN, 0);
        enc.encode(&mut rc, 12, 0);
        enc.encode(&mut rc, MATCH_LEN_MAX, 0);
        assert!(!rc.finish().is_empty());
    }

    #[test]
    fn dist_slot_matches_known_boundaries() {
        assert_eq!(dist_slot(0), 0);
        assert_eq!(dist_slot(3), 3);
        assert_eq!(dist_slot(4), 4);
        assert_eq!(dist_slot(7), 5);
        assert_eq!(dist_slot(8), 6);
        assert_eq!(dist_slot(15), 7);
    }

    #[test]
    fn state_transitions_follow_the_12_state_automaton() {
        assert_eq!(LIT_NEXT_STATES[0], 0);
        assert_eq!(MATCH_NEXT_STATES[0], 7);
        assert_eq!(REP_NEXT_STATES[7], 11);
        assert_eq!(SHORT_REP_NEXT_STATES[0], 9);
        assert!(state_is_after_match(7));
        assert!(!state_is_after_match(6));
    }

    #[test]
    fn fresh_state_starts_at_zero_with_no_reps() {
        let state = LzmaState::new(3, 0, 2);
        assert_eq!(state.state(), 0);
        assert_eq!(state.reps(), &[0, 0, 0, 0]);
    }

    #[test]
    fn encoding_a_literal_does_not_leave_state_zero() {
        let mut state = LzmaState::new(3, 0, 2);
        let mut rc = RangeEncoder::new();
        state.encode_literal(&mut rc, b'A', 0, 0, None);
        assert_eq!(state.state(), 0);
        assert!(!rc.finish().is_empty());
    }

    #[test]
    fn encoding_a_match_advances_state_and_rotates_reps() {
        let mut state = LzmaState::new(3, 0, 2);
        let mut rc = RangeEncoder::new();
        state.encode_match(&mut rc, 10, 5, 0);
        assert_eq!(state.state(), 7);
        assert_eq!(state.reps()[0], 9);
        assert!(!rc.finish().is_empty());
    }

    #[test]
    fn encoding_a_rep_after_a_match_reuses_its_distance_window() {
        let mut state = LzmaState::new(3, 0, 2);
        let mut rc = RangeEncoder::new();
        state.encode_match(&mut rc, 10, 5, 0);
        state.encode_rep(&mut rc, 0, 3, 5);
        assert!(!rc.finish().is_empty());
    }

    #[test]
    fn short_rep_uses_a_distinct_next_state() {
        let mut state = LzmaState::new(3, 0, 2);
        let mut rc = RangeEncoder::new();
        state.encode_match(&mut rc, 10, 5, 0);
        state.encode_rep(&mut rc, 0, 1, 5);
        assert_eq!(state.state(), SHORT_REP_NEXT_STATES[7]);
    }

    #[test]
    fn literal_context_distinguishes_high_bit_of_previous_byte() {
        let state = LzmaState::new(3, 0, 2);
        assert_ne!(state.literal_context(0, 0), state.literal_context(0, 0x80));
    }

    #[test]
    fn priced_literal_matches_actual_encoded_bit_count_within_rounding() {
        let state = LzmaState::new(3, 0, 2);
        let prices = PriceTable::new();
        let price = state.price_literal(&prices, b'A', 0, 0, None);
        assert!(price > 0);
    }

    #[test]
    fn pricing_never_mutates_the_model() {
        let state = LzmaState::new(3, 0, 2);
        let prices = PriceTable::new();
        let before = state.price_match(&prices, 10, 5, 0);
        let after = state.price_match(&prices, 10, 5, 0);
        assert_eq!(before, after);
    }

    #[test]
    fn a_rep0_is_cheaper_to_price_than_a_fresh_match_with_large_distance() {
        let mut state = LzmaState::new(3, 0, 2);
        let mut rc = RangeEncoder::new();
        state.encode_match(&mut rc, 1000, 10, 0);
        let prices = PriceTable::new();
        let rep_price = state.price_rep(&prices, 0, 10, 10);
        let fresh_price = state.price_match(&prices, 50000, 10, 10);
        assert!(rep_price < fresh_price);
    }
}
