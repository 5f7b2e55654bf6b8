//! Double-ended atomic work queue handing out radix buckets to worker
//! threads.
//!
//! A plain front-to-back split lets the longest lists (which tend to
//! cluster at one end of the bucket table, since common byte values sort
//! together) all land on the last few threads to grab work, so those
//! threads finish long after everyone else is idle. Handing out buckets
//! from both ends at once — long lists from the back, short ones from the
//! front — keeps threads finishing close together.

use std::sync::atomic::{AtomicIsize, Ordering};

/// One radix bucket: the head of its match-link chain and how many
/// positions are chained into it.
#[derive(Debug, Clone, Copy)]
pub struct ListHead {
    pub head: u32,
    pub count: u32,
}

impl ListHead {
    pub const EMPTY: Self = Self { head: 0, count: 0 };
}

/// Hands out bucket indices `0..table_len` to concurrent workers, biggest
/// buckets first from the back, everything else from the front.
pub struct HeadIndexes {
    front: AtomicIsize,
    back: AtomicIsize,
    end: isize,
}

impl HeadIndexes {
    /// `buckets` is scanned once, single-threaded, to find `end`: the
    /// boundary such that buckets at or after it are all singletons or
    /// empty and can be skipped without ever going through the queue.
    pub fn new(buckets: &[ListHead], thread_count: usize) -> Self {
        let table_len = buckets.len() as isize;
        if thread_count <= 1 {
            return Self {
                front: AtomicIsize::new(0),
                back: AtomicIsize::new(table_len),
                end: table_len,
            };
        }
        let mut end = table_len;
        while end > 1 && buckets[(end - 1) as usize].count <= 1 {
            end -= 1;
        }
        Self {
            front: AtomicIsize::new(0),
            back: AtomicIsize::new(end),
            end,
        }
    }

    /// Atomically claims the next bucket index, or `None` once the queue
    /// is drained. Safe to call from any number of threads concurrently.
    pub fn next_index(&self) -> Option<usize> {
        if self.back.load(Ordering::Acquire) > self.end {
            let index = self.back.fetch_sub(1, Ordering::AcqRel) - 1;
            if index >= self.end {
                return Some(index as usize);
            }
        }
        if self.front.load(Ordering::Acquire) < self.end {
            let index = self.front.fetch_add(1, Ordering::AcqRel);
            if index < self.end {
                return Some(index as usize);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(counts: &[u32]) -> Vec<ListHead> {
        counts
            .iter()
            .map(|&count| ListHead { head: 0, count })
            .collect()
    }

    #[test]
    fn single_threaded_drains_front_to_back() {
        let b = buckets(&[5, 3, 2]);
        let q = HeadIndexes::new(&b, 1);
        let mut seen = vec![];
        while let Some(i) = q.next_index() {
            seen.push(i);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn multi_threaded_drains_every_index_exactly_once() {
        let b = buckets(&[5, 3, 2, 1, 0, 9, 4]);
        let q = HeadIndexes::new(&b, 4);
        let mut seen = vec![];
        while let Some(i) = q.next_index() {
            seen.push(i);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..b.len()).collect::<Vec<_>>());
    }

    #[test]
    fn trailing_singletons_are_excluded_as_guaranteed_no_ops() {
        // A list with count <= 1 has nothing to refine, so the queue
        // permanently drops the trailing run of such buckets rather than
        // handing them to a worker that would immediately no-op on them.
        let b = buckets(&[4, 4, 1, 0]);
        let q = HeadIndexes::new(&b, 2);
        let mut seen = vec![];
        while let Some(i) = q.next_index() {
            seen.push(i);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1]);
    }
}
