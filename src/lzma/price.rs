//! Bit-price estimation used by the optimal parser to compare candidate
//! edges without actually running the range coder.
//!
//! Follows the standard LZMA SDK technique: a 128-entry table gives an
//! approximate `-log2(p) * 16` cost for each coarse probability bucket,
//! built once from the bit-model arithmetic itself rather than a
//! floating-point log. Neither the teacher crate nor the rest of the
//! example pack implements an optimal parser, so this table has no
//! direct teacher file to adapt — it is the textbook technique every
//! LZMA encoder (including the `xz`/`7-Zip` reference implementations)
//! uses, rebuilt here in the teacher's module style.

use super::range_coder::{BIT_MODEL_TOTAL, NUM_BIT_MODEL_TOTAL_BITS};

const NUM_MOVE_REDUCING_BITS: u32 = 4;
const NUM_BIT_PRICE_SHIFT_BITS: u32 = 4;
/// Cost, in 1/16-bit units, of encoding one directly-coded bit.
pub const DIRECT_BIT_PRICE: u32 = 1 << NUM_BIT_PRICE_SHIFT_BITS;

const TABLE_SIZE: usize = (BIT_MODEL_TOTAL >> NUM_MOVE_REDUCING_BITS) as usize;

/// A precomputed probability → price lookup table.
pub struct PriceTable {
    prices: [u16; TABLE_SIZE],
}

impl PriceTable {
    pub fn new() -> Self {
        let mut prices = [0u16; TABLE_SIZE];
        for (i, slot) in prices.iter_mut().enumerate() {
            let mut w = ((i as u32) << NUM_MOVE_REDUCING_BITS) + (1 << (NUM_MOVE_REDUCING_BITS - 1));
            let mut bit_count = 0u32;
            for _ in 0..NUM_BIT_PRICE_SHIFT_BITS {
                w = w.wrapping_mul(w);
                bit_count <<= 1;
                while w >= 1 << 16 {
                    w >>= 1;
                    bit_count += 1;
                }
            }
            *slot = ((NUM_BIT_MODEL_TOTAL_BITS << NUM_BIT_PRICE_SHIFT_BITS) - 15 - bit_count) as u16;
        }
        Self { prices }
    }

    /// Cost of encoding `bit` against adaptive probability `prob`.
    pub fn price(&self, prob: u16, bit: bool) -> u32 {
        let p = prob as u32;
        let index = if bit { BIT_MODEL_TOTAL - p } else { p } >> NUM_MOVE_REDUCING_BITS;
        self.prices[index as usize] as u32
    }

    /// Cost of encoding `symbol` through an MSB-first bit tree.
    pub fn bit_tree_price(&self, probs: &[u16], num_bits: u32, symbol: u32) -> u32 {
        let mut price = 0u32;
        let mut m = 1u32;
        for i in (0..num_bits).rev() {
            let bit = (symbol >> i) & 1;
            price += self.price(probs[m as usize], bit != 0);
            m = (m << 1) | bit;
        }
        price
    }

    /// Cost of encoding `symbol` through an LSB-first (reverse) bit tree.
    pub fn bit_tree_reverse_price(&self, probs: &[u16], num_bits: u32, symbol: u32) -> u32 {
        let mut price = 0u32;
        let mut m = 1u32;
        for i in 0..num_bits {
            let bit = (symbol >> i) & 1;
            price += self.price(probs[m as usize], bit != 0);
            m = (m << 1) | bit;
        }
        price
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::range_coder::INITIAL_PROB;

    #[test]
    fn fifty_percent_probability_prices_both_outcomes_equally() {
        let table = PriceTable::new();
        assert_eq!(table.price(INITIAL_PROB, true), table.price(INITIAL_PROB, false));
    }

    #[test]
    fn a_near_certain_outcome_is_cheap_and_its_opposite_is_expensive() {
        let table = PriceTable::new();
        let high_prob = (BIT_MODEL_TOTAL - 32) as u16;
        assert!(table.price(high_prob, false) < table.price(high_prob, true));
    }

    #[test]
    fn bit_tree_price_is_nonzero_for_any_symbol() {
        let table = PriceTable::new();
        let probs = [INITIAL_PROB; 8];
        assert!(table.bit_tree_price(&probs, 3, 5) > 0);
    }

    #[test]
    fn prices_are_monotone_decreasing_as_probability_of_the_bit_rises() {
        let table = PriceTable::new();
        let low = table.price(200, false);
        let mid = table.price(1024, false);
        let high = table.price(1900, false);
        assert!(low > mid);
        assert!(mid > high);
    }
}
