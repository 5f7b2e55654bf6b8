//! Multi-pass radix bucket sort match finder.
//!
//! Builds a match-link table over a dictionary window in stages:
//!
//! 1. An initial pass buckets every position by its next two bytes,
//!    giving up to 65536 lists of positions that already share a 2-byte
//!    prefix.
//! 2. Every member of a list is immediately given a provisional link to
//!    its nearest lower-offset neighbor within the list, confirmed to
//!    the list's current depth — so even a position whose list never
//!    gets refined further still ends up with a usable, if short, match.
//!    Every [`REPEAT_CHECK_INTERVAL`] depth steps, a list still being
//!    refined is checked for being a tandem-repeating run (every member
//!    within `depth` of its predecessor, the signature of a block made
//!    of one short repeated pattern); such a list is capped at
//!    [`OVERLAP_LENGTH_CAP`] and stops recursing instead of deepening
//!    one more byte per remaining position, which is what a plain
//!    byte-at-a-time bucket pass would otherwise do on that input.
//! 3. Lists whose length falls in [`BUFFERED_LOWER_BOUND`]..=
//!    [`MATCH_BUFFER_SIZE`], with enough depth left before `max_depth`
//!    to be worth it, are refined through [`refine_buffered`] instead:
//!    their next few bytes are read into a local [`StringMatch`] cache
//!    once, and every subsequent bucketing pass reads that cache rather
//!    than re-touching `data`. The cache is reloaded from `data` once a
//!    pass has consumed it.
//! 4. Lists at or below [`MAX_BRUTE_FORCE`] members (or that have
//!    reached the configured search depth) are finished by direct
//!    pairwise comparison, which both bounds the recursion and beats
//!    another bucketing pass once a list is that small.
//!
//! Unlike a hash chain, a bucket pass narrows every member of a list at
//! once, so the cost of confirming a long shared prefix across many
//! positions is paid once per prefix length, not once per position.
//!
//! Top-level lists are independent of each other, so [`build`] hands
//! them out through a [`HeadIndexes`] queue to worker threads. Each
//! worker accumulates its own link updates and they are merged into the
//! shared table once every worker finishes, which avoids the unsynchronized
//! concurrent writes into one shared table that a pointer-based
//! implementation would use.

use super::head_queue::{HeadIndexes, ListHead};
use super::packed_table::PackedMatchTable;

/// Lists at or below this length are finished by direct pairwise
/// comparison rather than another bucketing pass.
const MAX_BRUTE_FORCE: usize = 6;
/// How often, in depth steps, a list still being recursively refined is
/// checked for being a tandem-repeating run.
const REPEAT_CHECK_INTERVAL: u32 = 32;
/// Length a detected tandem-repeating run is capped at instead of
/// recursing one more byte per remaining position.
const OVERLAP_LENGTH_CAP: u32 = 273;
/// Lower bound, in member count, for routing a list through the
/// buffered sub-path rather than reading `data` directly on every pass.
const BUFFERED_LOWER_BOUND: usize = 30;
/// Upper bound, in member count, for the buffered sub-path; larger lists
/// go through the plain recursive pass instead.
const MATCH_BUFFER_SIZE: usize = 512;
/// The buffered sub-path only starts if at least this many depth steps
/// remain before `max_depth`, so there is enough work left to amortize
/// the cost of loading the cache.
const BUFFERED_DEPTH_MARGIN: usize = 4;
/// Bytes cached per member in the buffered sub-path before it has to
/// reload from `data`.
const CACHE_WINDOW: usize = 8;
/// A link update produced by refining one list: `(position, link, confirmed length)`.
type LinkUpdate = (u32, u32, u32);

/// Builds a match-link table over `data`, treating everything at or
/// after `dict_start` as both a valid match source and target, and
/// everything before it as dictionary content usable only as a source.
/// No chain confirms more than `max_depth` bytes of shared prefix.
pub fn build(data: &[u8], dict_start: usize, max_depth: usize, thread_count: usize) -> PackedMatchTable {
    let mut table = PackedMatchTable::new(data.len());
    if data.len() < 2 {
        return table;
    }
    let top_lists = initial_buckets(data);
    let heads: Vec<ListHead> = top_lists
        .iter()
        .map(|members| ListHead {
            head: members.first().copied().unwrap_or(u32::MAX),
            count: members.len() as u32,
        })
        .collect();
    let queue = HeadIndexes::new(&heads, thread_count.max(1));
    let updates: Vec<LinkUpdate> = if thread_count <= 1 {
        drain_queue(&queue, &top_lists, data, max_depth)
    } else {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..thread_count)
                .map(|_| scope.spawn(|| drain_queue(&queue, &top_lists, data, max_depth)))
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        })
    };
    for (pos, link, length) in updates {
        if (pos as usize) >= dict_start {
            table.set(pos as usize, link, length);
        }
    }
    table
}

fn drain_queue(queue: &HeadIndexes, top_lists: &[Vec<u32>], data: &[u8], max_depth: usize) -> Vec<LinkUpdate> {
    let mut updates = Vec::new();
    while let Some(index) = queue.next_index() {
        let members = &top_lists[index];
        if members.len() >= 2 {
            refine(data, members, 2, max_depth, &mut updates);
        }
    }
    updates
}

/// Groups every position in `0..data.len()-1` by its next two bytes,
/// preserving ascending position order within each group.
fn initial_buckets(data: &[u8]) -> Vec<Vec<u32>> {
    const RADIX: usize = 1 << 16;
    let mut buckets: Vec<Vec<u32>> = (0..RADIX).map(|_| Vec::new()).collect();
    for pos in 0..data.len() - 1 {
        let radix = (data[pos] as usize) | ((data[pos + 1] as usize) << 8);
        buckets[radix].push(pos as u32);
    }
    buckets
}

/// Refines one list of positions already known to share `depth` bytes
/// of common prefix, recording a link for every member and recursing
/// into sub-lists that can still be narrowed further.
fn refine(data: &[u8], members: &[u32], depth: u32, max_depth: usize, updates: &mut Vec<LinkUpdate>) {
    if members.len() < 2 {
        return;
    }
    // Provisional link: every member points at its nearest lower-offset
    // neighbor, confirmed to the depth the whole list already shares.
    // A deeper pass below overwrites this for anyone it can narrow
    // further; anyone left out keeps this as their final match.
    for pair in members.windows(2) {
        updates.push((pair[1], pair[0], depth));
    }
    if depth > 0 && depth % REPEAT_CHECK_INTERVAL == 0 && is_overlapping_run(members, depth) {
        cap_overlapping_run(members, max_depth, updates);
        return;
    }
    if members.len() <= MAX_BRUTE_FORCE || depth as usize >= max_depth {
        brute_force(data, members, depth, max_depth, updates);
        return;
    }
    if members.len() >= BUFFERED_LOWER_BOUND
        && members.len() <= MATCH_BUFFER_SIZE
        && (depth as usize) + BUFFERED_DEPTH_MARGIN <= max_depth
    {
        let buffered: Vec<StringMatch> = members.iter().map(|&pos| StringMatch::load(data, pos, depth)).collect();
        refine_buffered(data, &buffered, depth, depth, max_depth, updates);
        return;
    }
    const RADIX: usize = 256;
    let mut sub_buckets: Vec<Vec<u32>> = (0..RADIX).map(|_| Vec::new()).collect();
    for &pos in members {
        let byte = *data.get(pos as usize + depth as usize).unwrap_or(&0) as usize;
        sub_buckets[byte].push(pos);
    }
    for sub in sub_buckets {
        if sub.len() >= 2 {
            refine(data, &sub, depth + 1, max_depth, updates);
        }
    }
}

/// True when every member is within `depth` positions of its
/// predecessor — the signature of a list made of one short pattern
/// repeated back to back (e.g. a run of one byte, or a short tandem
/// repeat), where continuing to bucket one byte at a time would cost one
/// recursion level per remaining position instead of converging quickly.
fn is_overlapping_run(members: &[u32], depth: u32) -> bool {
    members.windows(2).all(|pair| pair[1] - pair[0] <= depth)
}

/// Caps a detected tandem-repeating run at [`OVERLAP_LENGTH_CAP`] instead
/// of recursing further into it.
fn cap_overlapping_run(members: &[u32], max_depth: usize, updates: &mut Vec<LinkUpdate>) {
    let capped = OVERLAP_LENGTH_CAP.min(max_depth as u32);
    for pair in members.windows(2) {
        updates.push((pair[1], pair[0], capped));
    }
}

/// A member of the buffered sub-path's working set: its position plus a
/// small window of bytes read once from `data` and reused across every
/// bucketing pass the sub-list goes through until the window runs out.
#[derive(Clone, Copy)]
struct StringMatch {
    pos: u32,
    cache: [u8; CACHE_WINDOW],
}

impl StringMatch {
    fn load(data: &[u8], pos: u32, depth: u32) -> Self {
        let start = pos as usize + depth as usize;
        let mut cache = [0u8; CACHE_WINDOW];
        for (i, slot) in cache.iter_mut().enumerate() {
            *slot = *data.get(start + i).unwrap_or(&0);
        }
        Self { pos, cache }
    }
}

/// Refines a buffered sub-list the same way [`refine`] refines a plain
/// one, but reads the next bucketing byte from each member's cache
/// instead of `data` until the cache built at `base_depth` is consumed,
/// at which point it is reloaded from `data` and reused for the next
/// [`CACHE_WINDOW`] depth steps.
fn refine_buffered(
    data: &[u8],
    members: &[StringMatch],
    base_depth: u32,
    depth: u32,
    max_depth: usize,
    updates: &mut Vec<LinkUpdate>,
) {
    if members.len() < 2 {
        return;
    }
    let positions: Vec<u32> = members.iter().map(|m| m.pos).collect();
    for pair in positions.windows(2) {
        updates.push((pair[1], pair[0], depth));
    }
    if depth > 0 && depth % REPEAT_CHECK_INTERVAL == 0 && is_overlapping_run(&positions, depth) {
        cap_overlapping_run(&positions, max_depth, updates);
        return;
    }
    if members.len() <= MAX_BRUTE_FORCE || depth as usize >= max_depth {
        brute_force(data, &positions, depth, max_depth, updates);
        return;
    }
    let offset = (depth - base_depth) as usize;
    if offset >= CACHE_WINDOW {
        let reloaded: Vec<StringMatch> = positions.iter().map(|&pos| StringMatch::load(data, pos, depth)).collect();
        refine_buffered(data, &reloaded, depth, depth, max_depth, updates);
        return;
    }
    const RADIX: usize = 256;
    let mut sub_buckets: Vec<Vec<StringMatch>> = (0..RADIX).map(|_| Vec::new()).collect();
    for &m in members {
        sub_buckets[m.cache[offset] as usize].push(m);
    }
    for sub in sub_buckets {
        if sub.len() >= 2 {
            refine_buffered(data, &sub, base_depth, depth + 1, max_depth, updates);
        }
    }
}

/// Finishes a short list by comparing every pair directly: for each
/// member (besides the earliest), finds whichever earlier member shares
/// the longest prefix and records that as its final link.
fn brute_force(data: &[u8], members: &[u32], depth: u32, max_depth: usize, updates: &mut Vec<LinkUpdate>) {
    let limit = max_depth.saturating_sub(depth as usize);
    for i in 1..members.len() {
        let pos = members[i] as usize;
        let base = &data[pos..];
        let mut best_len = 0usize;
        let mut best_source = members[i - 1];
        for &candidate in &members[..i] {
            let other = &data[candidate as usize..];
            let mut len = 0;
            while len < limit && base.get(len) == other.get(len) {
                len += 1;
            }
            if len > best_len {
                best_len = len;
                best_source = candidate;
                if len >= limit {
                    break;
                }
            }
        }
        if best_len > 0 {
            updates.push((members[i], best_source, depth + best_len as u32));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_produces_empty_table() {
        let table = build(&[], 0, 16, 1);
        assert!(table.is_empty());
    }

    #[test]
    fn single_byte_has_no_links() {
        let table = build(&[0x42], 0, 16, 1);
        assert_eq!(table.len(), 1);
        assert!(table.is_null(0));
    }

    #[test]
    fn repeated_pattern_links_back_far_enough_to_confirm_full_repeat() {
        let data = b"abcabcabc";
        let table = build(data, 0, 16, 1);
        assert!(!table.is_null(3));
        assert_eq!(table.link(3), 0);
        assert!(table.length(3) >= 6);
    }

    #[test]
    fn unique_bytes_never_link() {
        let data = b"abcdefgh";
        let table = build(data, 0, 16, 1);
        for i in 0..data.len() {
            assert!(table.is_null(i), "position {i} should have no match");
        }
    }

    #[test]
    fn positions_before_dict_start_are_never_assigned_a_link() {
        let data = b"aaaaaaaa";
        let table = build(data, 4, 6, 1);
        for i in 0..4 {
            assert!(table.is_null(i));
        }
        for i in 4..data.len() - 1 {
            assert!(!table.is_null(i));
        }
    }

    #[test]
    fn single_and_multi_thread_agree_on_links() {
        let data = b"the quick brown fox jumps over the lazy dog the quick brown fox";
        let single = build(data, 0, 32, 1);
        let multi = build(data, 0, 32, 4);
        for i in 0..data.len() {
            assert_eq!(single.is_null(i), multi.is_null(i), "position {i} disagrees");
        }
    }

    #[test]
    fn brute_force_finds_longest_not_nearest_match() {
        // position 6 ("xyzzzz" tail) should prefer the longer match at 0
        // ("xyzxyz") over the nearer but shorter one, once depth allows it.
        let data = b"xyzxyzxyzxyz";
        let table = build(data, 0, 32, 1);
        assert!(!table.is_null(6));
        assert!(table.length(6) >= 6);
    }

    #[test]
    fn a_long_run_of_one_byte_is_capped_instead_of_recursing_to_max_depth() {
        // Every position in a run of one repeated byte is within `depth`
        // of its predecessor at every depth step, so the repeat check
        // should catch and cap a position well inside the run (clear of
        // the tail, where running out of data would split it off early
        // regardless) at OVERLAP_LENGTH_CAP rather than letting it
        // recurse one more byte of depth per position all the way to
        // max_depth (400).
        let data = vec![b'a'; 2000];
        let table = build(&data, 0, 400, 1);
        assert!(!table.is_null(1000));
        assert_eq!(table.length(1000), OVERLAP_LENGTH_CAP);
    }

    #[test]
    fn a_wide_shared_prefix_list_routes_through_the_buffered_sub_path() {
        // 40 blocks of "xy" followed by distinct trailing bytes: enough
        // members sharing a 2-byte prefix to exceed BUFFERED_LOWER_BOUND
        // and land in refine_buffered, with block spacing (20) far wider
        // than the depth at which they enter it (2), so the repeat check
        // never fires and every block keeps its own distinguishing tail.
        const BLOCKS: usize = 40;
        const BLOCK_LEN: usize = 20;
        let mut data = vec![0u8; BLOCKS * BLOCK_LEN];
        for (i, block) in data.chunks_mut(BLOCK_LEN).enumerate() {
            block[0] = b'x';
            block[1] = b'y';
            for (j, b) in block[2..].iter_mut().enumerate() {
                *b = ((i * 37 + j * 13) % 251) as u8;
            }
        }
        let table = build(&data, 0, 64, 1);
        let mut linked_with_shared_prefix = 0;
        for i in (BLOCK_LEN..data.len()).step_by(BLOCK_LEN) {
            if !table.is_null(i) {
                assert!(table.length(i) >= 2, "position {i} should confirm at least the shared \"xy\" prefix");
                linked_with_shared_prefix += 1;
            }
        }
        assert!(linked_with_shared_prefix > 0);
    }
}
