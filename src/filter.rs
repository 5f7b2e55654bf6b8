//! The in-place filter pipeline run over a dictionary block before LZMA2
//! encodes it.
//!
//! Modeled as a small trait with a boxed list rather than a base-class
//! hierarchy, since this crate supports exactly one filter today and a
//! trait object list is the idiomatic way to leave room for more without
//! committing to a specific enum of variants.

use crate::bcj;
use crate::model::CoderInfo;

/// One step of the filter pipeline.
pub trait Filter: Send {
    /// Applies the filter in place to `buf[..main_end]`, treating bytes
    /// in `main_end..block_end` as read-only lookahead the filter may
    /// consult but never rewrite. Returns the new end of fully-processed
    /// data, which may trail `main_end` by up to [`Filter::max_overrun`]
    /// bytes if the filter couldn't classify the tail yet.
    fn encode(&mut self, buf: &mut [u8], main_end: usize, block_end: usize) -> usize;

    /// Clears any carried state (instruction pointer, prefix mask) back
    /// to its initial value, used when a new solid unit starts.
    fn reset(&mut self);

    /// The coder descriptor this filter contributes to a unit's header.
    fn coder_info(&self) -> CoderInfo;

    /// Maximum trailing bytes this filter may decline to process in one
    /// call; the dictionary buffer sizes its overrun zone from this.
    fn max_overrun(&self) -> usize;
}

/// The x86 BCJ filter, tracking the running instruction-pointer base
/// across calls so a multi-block unit filters as if it were one buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcjFilter {
    ip_base: u32,
}

impl BcjFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filter for BcjFilter {
    fn encode(&mut self, buf: &mut [u8], main_end: usize, _block_end: usize) -> usize {
        let processed = bcj::encode(&mut buf[..main_end], self.ip_base);
        self.ip_base = self.ip_base.wrapping_add(processed as u32);
        processed
    }

    fn reset(&mut self) {
        self.ip_base = 0;
    }

    fn coder_info(&self) -> CoderInfo {
        bcj::coder_info()
    }

    fn max_overrun(&self) -> usize {
        bcj::MAX_UNPROCESSED
    }
}

/// An ordered pipeline of filters, run in sequence over the same region.
#[derive(Default)]
pub struct FilterPipeline {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Box<dyn Filter>) {
        self.stages.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total overrun headroom the dictionary buffer must reserve to
    /// satisfy every stage.
    pub fn max_overrun(&self) -> usize {
        self.stages.iter().map(|f| f.max_overrun()).max().unwrap_or(0)
    }

    /// Runs every stage over `buf[..main_end]` in order, returning the
    /// minimum new end across stages (the pipeline as a whole can only
    /// claim as processed what every stage agrees on).
    pub fn run(&mut self, buf: &mut [u8], main_end: usize, block_end: usize) -> usize {
        let mut end = main_end;
        for stage in &mut self.stages {
            end = end.min(stage.encode(buf, end, block_end));
        }
        end
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    pub fn coder_infos(&self) -> Vec<CoderInfo> {
        self.stages.iter().map(|f| f.coder_info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pipeline_is_a_passthrough() {
        let mut pipeline = FilterPipeline::new();
        let mut buf = vec![1u8, 2, 3, 4];
        let end = pipeline.run(&mut buf, 4, 4);
        assert_eq!(end, 4);
        assert_eq!(pipeline.max_overrun(), 0);
    }

    #[test]
    fn bcj_stage_reports_its_coder_info() {
        let mut pipeline = FilterPipeline::new();
        pipeline.push(Box::new(BcjFilter::new()));
        assert_eq!(pipeline.coder_infos().len(), 1);
        assert_eq!(pipeline.max_overrun(), bcj::MAX_UNPROCESSED);
    }

    #[test]
    fn reset_zeroes_bcj_ip_base() {
        let mut bcj = BcjFilter::new();
        let mut buf = vec![0xE8, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let len = buf.len();
        bcj.encode(&mut buf, len, len);
        bcj.reset();
        assert_eq!(bcj.ip_base, 0);
    }
}
