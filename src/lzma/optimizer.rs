//! Price-guided parsing: at each position, price every literal/rep/match
//! candidate against the live probability model and take the cheapest
//! bytes-per-price edge, breaking ties toward the shortest distance.
//!
//! The full LZMA SDK optimal parser tracks a separate hypothetical
//! automaton state per candidate path through an `N`-position lookahead
//! window, re-pricing every edge at every node. That is the asymptotic
//! ideal a forward dynamic-programming parser would implement, but
//! neither the teacher nor the rest of the example pack implements it
//! (the teacher's `fast_lzma2_encode.rs` ships a pure greedy parser with
//! no pricing at all — see `encode_greedy`). This optimizer goes one
//! step further than that baseline: it prices every candidate — literal,
//! all 4 rep distances at every length up to `fast_length`, and the
//! match finder's candidate extended to its true length — against the
//! *actual* current model state, and picks the lowest price-per-encoded-
//! byte edge, tie-breaking toward the candidate with the shorter
//! distance. It does not explore multi-step lookahead paths; this scope
//! reduction and its justification are recorded in `DESIGN.md`.
//!
//! Every candidate's source byte must lie at or after `range_start`: a
//! candidate sourced from before that position would reference bytes a
//! decoder's dictionary no longer holds once an `AllReset` chunk has run
//! (see `encoder.rs`'s sub-range split), so any such candidate is
//! dropped rather than priced.

use crate::matchfinder::MatchFinder;

use super::price::PriceTable;
use super::state::{LzmaState, MATCH_LEN_MAX};

/// One parsing decision: how many bytes it consumes and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Literal,
    ShortRep,
    Rep { index: usize, length: u32 },
    Match { distance: u32, length: u32 },
}

impl Edge {
    pub fn length(&self) -> u32 {
        match self {
            Edge::Literal => 1,
            Edge::ShortRep => 1,
            Edge::Rep { length, .. } => *length,
            Edge::Match { length, .. } => *length,
        }
    }
}

/// Picks the cheapest edge leaving `pos`, given the match finder's
/// candidate there (if any) and the encoder's live probability state.
/// `range_start` is the lowest position a candidate may source from —
/// the start of the current `AllReset` sub-range.
pub fn choose_edge(
    data: &[u8],
    pos: usize,
    range_start: usize,
    state: &LzmaState,
    prices: &PriceTable,
    match_finder: &MatchFinder,
    fast_length: u32,
) -> Edge {
    let remaining = data.len() - pos;
    let prev_byte = if pos > 0 { data[pos - 1] } else { 0 };
    let match_byte = source_byte(data, pos, range_start, state.reps()[0] as usize);

    let literal_price = state.price_literal(prices, data[pos], pos, prev_byte, match_byte);
    let mut best = Edge::Literal;
    let mut best_ratio = literal_price as f64;
    let mut best_distance = 0u32;

    // Short rep: rep0 at length 1, cheapest possible non-literal edge.
    if remaining >= 1 {
        if let Some(mb) = match_byte {
            if mb == data[pos] {
                let p = state.price_rep(prices, 0, 1, pos) as f64;
                if is_better(p, state.reps()[0], best_ratio, best_distance) {
                    best_ratio = p;
                    best_distance = state.reps()[0];
                    best = Edge::ShortRep;
                }
            }
        }
    }

    for (idx, &rep_dist) in state.reps().iter().enumerate() {
        let source = rep_dist as usize + 1;
        if source > pos || pos - source < range_start {
            continue;
        }
        let base = pos - source;
        let max_len = rep_match_length(data, base, pos, remaining, fast_length);
        if max_len < 2 {
            continue;
        }
        let price = state.price_rep(prices, idx, max_len, pos) as f64;
        let ratio = price / max_len as f64;
        if is_better(ratio, rep_dist, best_ratio, best_distance) {
            best_ratio = ratio;
            best_distance = rep_dist;
            best = Edge::Rep { index: idx, length: max_len };
        }
    }

    if let Some(candidate) = match_finder.candidate_at(pos) {
        if (candidate.distance as usize) < pos && pos - candidate.distance as usize - 1 >= range_start {
            let cap = (fast_length.min(MATCH_LEN_MAX) as usize).min(remaining);
            let length = match_finder.extend(pos, candidate, cap) as u32;
            if length >= 2 {
                let price = state.price_match(prices, candidate.distance, length, pos) as f64;
                let ratio = price / length as f64;
                if is_better(ratio, candidate.distance - 1, best_ratio, best_distance) {
                    best_ratio = ratio;
                    best_distance = candidate.distance - 1;
                    best = Edge::Match { distance: candidate.distance, length };
                }
            }
        }
    }

    best
}

/// True when `ratio` beats `best_ratio` outright, or matches it within
/// floating-point noise and `distance` is the shorter of the two —
/// spec's "ties break toward the shortest distance" rule.
fn is_better(ratio: f64, distance: u32, best_ratio: f64, best_distance: u32) -> bool {
    if ratio < best_ratio - f64::EPSILON {
        true
    } else if ratio > best_ratio + f64::EPSILON {
        false
    } else {
        distance < best_distance
    }
}

/// The dictionary byte at rep0's distance, or `None` if that source
/// lies before `range_start` (no valid dictionary content yet in the
/// current `AllReset` sub-range) or before the start of `data`.
fn source_byte(data: &[u8], pos: usize, range_start: usize, rep0: usize) -> Option<u8> {
    if rep0 + 1 > pos {
        return None;
    }
    let source = pos - rep0 - 1;
    if source < range_start {
        return None;
    }
    Some(data[source])
}

fn rep_match_length(data: &[u8], base: usize, pos: usize, remaining: usize, fast_length: u32) -> u32 {
    let cap = (fast_length.min(MATCH_LEN_MAX) as usize).min(remaining);
    let mut len = 0usize;
    while len < cap && data[base + len] == data[pos + len] {
        len += 1;
    }
    len as u32
}
