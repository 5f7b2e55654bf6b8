//! Compression options: the single configuration surface threaded from
//! the CLI (or any other caller) into the scheduler.
//!
//! Defaults mirror the `-mx6` preset: a reasonable balance of ratio and
//! speed rather than the extremes at either end of the `-mx{1..12}` scale.

use crate::ext_table;

/// How aggressively the optimizer searches for matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    Fast,
    #[default]
    Normal,
    Best,
    High,
}

/// Whether the x86 BCJ filter runs, and on what it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Off,
    #[default]
    Auto,
    ForceBcj,
}

/// Solid-unit boundary policy (`-ms`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidPolicy {
    /// Every file gets its own unit.
    Off,
    /// One unit for the whole archive (bounded only by `solid_unit_size`).
    On,
    /// At most `files` files per unit.
    FileCount(u64),
    /// At most `bytes` uncompressed bytes per unit.
    ByteSize(u64),
    /// One unit per distinct extension group.
    ByExtension,
}

impl Default for SolidPolicy {
    fn default() -> Self {
        Self::On
    }
}

/// Top-level compression configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// LZMA `lc` (literal context bits).
    pub lc: u32,
    /// LZMA `lp` (literal position bits).
    pub lp: u32,
    /// LZMA `pb` (position bits).
    pub pb: u32,
    /// Maximum match length the optimizer will consider in one step.
    pub fast_length: u32,
    /// Match finder recursion depth cap.
    pub search_depth: u32,
    /// Dictionary size in bytes.
    pub dictionary_size: u64,
    /// Secondary (match-buffer) dictionary size in KiB, as in the original CLI unit.
    pub second_dict_size: u32,
    /// `log2` of the match finder's buffered sub-path capacity.
    pub match_buffer_log: u32,
    /// Number of worker threads; 0 means "pick automatically".
    pub thread_count: usize,
    pub strategy: Strategy,
    pub filter_mode: FilterMode,
    pub solid: SolidPolicy,
    /// Block overlap, in `1/16`ths of the dictionary size (`-mo{1..14}`).
    pub block_overlap: u32,
    pub store_full_paths: bool,
    pub store_creation_time: bool,
    pub share_deny_none: bool,
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_level(6)
    }
}

impl Options {
    /// Builds options from an `-mx{level}` preset, `1..=12`, then applies
    /// the original's fixed defaults for everything the level doesn't
    /// scale directly.
    pub fn from_level(level: u32) -> Self {
        let level = level.clamp(1, 12);
        let dictionary_size: u64 = match level {
            1..=3 => 1 << 20,
            4..=5 => 4 << 20,
            6 => 16 << 20,
            7..=8 => 32 << 20,
            9..=10 => 64 << 20,
            _ => 192 << 20,
        };
        let fast_length = match level {
            1..=3 => 32,
            4..=6 => 48,
            7..=9 => 64,
            _ => 128,
        };
        let strategy = match level {
            1..=4 => Strategy::Fast,
            5..=7 => Strategy::Normal,
            8..=10 => Strategy::Best,
            _ => Strategy::High,
        };
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
            fast_length,
            search_depth: 42,
            dictionary_size,
            second_dict_size: 512,
            match_buffer_log: 4,
            thread_count: 0,
            strategy,
            filter_mode: FilterMode::Auto,
            solid: SolidPolicy::On,
            block_overlap: 2,
            store_full_paths: false,
            store_creation_time: false,
            share_deny_none: false,
            quiet: false,
        }
    }

    /// Resolves `thread_count == 0` ("automatic") against the machine's
    /// available parallelism.
    pub fn resolved_thread_count(&self) -> usize {
        if self.thread_count > 0 {
            return self.thread_count;
        }
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    /// Whether BCJ should be applied to a file whose extension index is
    /// `ext_index`, per the "executables get their own units" policy.
    pub fn bcj_applies_to(&self, ext_index: u32) -> bool {
        match self.filter_mode {
            FilterMode::Off => false,
            FilterMode::ForceBcj => true,
            FilterMode::Auto => ext_table::is_exe_group(ext_index),
        }
    }

    /// Maximum bytes a single solid unit may accumulate before the
    /// scheduler closes it, independent of `solid`'s file/extension
    /// policy (the `2 GiB` ceiling named in the unit policy).
    pub fn solid_unit_size(&self) -> u64 {
        2 << 30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_level_six() {
        let d = Options::default();
        let l6 = Options::from_level(6);
        assert_eq!(d.dictionary_size, l6.dictionary_size);
        assert_eq!(d.fast_length, l6.fast_length);
    }

    #[test]
    fn level_is_clamped_to_valid_range() {
        let low = Options::from_level(0);
        let high = Options::from_level(99);
        assert_eq!(low.dictionary_size, Options::from_level(1).dictionary_size);
        assert_eq!(high.dictionary_size, Options::from_level(12).dictionary_size);
    }

    #[test]
    fn higher_levels_use_larger_dictionaries() {
        let low = Options::from_level(1);
        let high = Options::from_level(12);
        assert!(high.dictionary_size > low.dictionary_size);
    }

    #[test]
    fn bcj_auto_mode_follows_extension_group() {
        let opts = Options::default();
        let exe_idx = ext_table::lookup("exe");
        let txt_idx = ext_table::lookup("txt");
        assert!(opts.bcj_applies_to(exe_idx));
        assert!(!opts.bcj_applies_to(txt_idx));
    }

    #[test]
    fn bcj_off_mode_never_applies() {
        let mut opts = Options::default();
        opts.filter_mode = FilterMode::Off;
        assert!(!opts.bcj_applies_to(ext_table::lookup("exe")));
    }

    #[test]
    fn thread_count_zero_resolves_to_at_least_one() {
        let opts = Options::default();
        assert!(opts.resolved_thread_count() >= 1);
    }
}
