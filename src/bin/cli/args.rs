//! Parses the 7-Zip-style embedded-value switches (`-mx9`, `-md64m`,
//! `-ms=2g|e`, `-i!*.txt`, ...) spec.md's CLI surface names.
//!
//! These switches don't fit clap's derive model (no `--flag value`
//! separator, values glued directly onto the switch letters), so after
//! clap has handled the top-level `--help`/`--version`/`--completions`
//! surface in [`crate::cli::cli_args`], the remaining tokens are parsed by
//! hand here — the same division of labor the teacher's CLI used between
//! clap-derived subcommands and its own `FileSelector` pattern parsing.

use std::path::PathBuf;

use radyx::options::{FilterMode, Options, SolidPolicy};

use crate::cli::error::RadyxError;
use crate::cli::selector::{Recursion, Selector};

/// Everything parsed out of the command line beyond clap's own surface.
#[derive(Debug)]
pub struct ParsedSession {
    pub archive: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub options: Options,
    pub selector: Selector,
    pub recursion: Recursion,
    /// `-w{dir}`: accepted for compatibility. This implementation never
    /// spills to a working directory (a solid unit is held in memory, see
    /// `radyx::scheduler`), so the value is recorded but otherwise unused.
    pub working_dir: Option<PathBuf>,
}

/// `args[0]` is the command letter, `args[1]` the archive path, and
/// `args[2..]` a mix of input paths and switches.
pub fn parse(args: &[String]) -> Result<ParsedSession, RadyxError> {
    let [command, archive, rest @ ..] = args else {
        return Err(RadyxError::InvalidArgument(
            "usage: radyx a <archive> <file>... [switches]".into(),
        ));
    };
    if command != "a" {
        return Err(RadyxError::InvalidArgument(format!(
            "unsupported command {command:?}; only \"a\" (add) is implemented"
        )));
    }

    let mut options = Options::default();
    let mut selector = Selector::new();
    let mut recursion = Recursion::default();
    let mut working_dir = None;
    let mut inputs = Vec::new();

    for token in rest {
        if let Some(switch) = token.strip_prefix('-') {
            apply_switch(switch, &mut options, &mut selector, &mut recursion, &mut working_dir)?;
        } else {
            inputs.push(PathBuf::from(token));
        }
    }

    if inputs.is_empty() {
        return Err(RadyxError::InvalidArgument("no input files or directories given".into()));
    }

    Ok(ParsedSession {
        archive: PathBuf::from(archive),
        inputs,
        options,
        selector,
        recursion,
        working_dir,
    })
}

fn apply_switch(
    switch: &str,
    options: &mut Options,
    selector: &mut Selector,
    recursion: &mut Recursion,
    working_dir: &mut Option<PathBuf>,
) -> Result<(), RadyxError> {
    // Longer, more specific prefixes are checked first so e.g. `-msd42`
    // isn't mistaken for `-ms` with value `d42`.
    if let Some(value) = switch.strip_prefix("mds") {
        options.second_dict_size = (parse_size(value)? / 1024) as u32;
    } else if let Some(value) = switch.strip_prefix("msd") {
        options.search_depth = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mfb") {
        options.fast_length = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mmc") {
        // The radix match finder exposes one recursion-depth knob
        // (`SearchConfig::max_depth`); match cycles and search depth both
        // drive it.
        options.search_depth = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mmt") {
        options.thread_count = parse_thread_count(value)?;
    } else if let Some(value) = switch.strip_prefix("mlc") {
        options.lc = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mlp") {
        options.lp = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mpb") {
        options.pb = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mtc") {
        options.store_creation_time = parse_on_off(value)?;
    } else if let Some(value) = switch.strip_prefix("mx") {
        let level = parse_u32(value)?;
        *options = Options::from_level(level);
    } else if let Some(value) = switch.strip_prefix("md") {
        options.dictionary_size = parse_size(value)?;
    } else if let Some(value) = switch.strip_prefix("ma") {
        options.strategy = parse_strategy(value)?;
    } else if let Some(value) = switch.strip_prefix("mo") {
        options.block_overlap = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mb") {
        options.match_buffer_log = parse_u32(value)?;
    } else if let Some(value) = switch.strip_prefix("mq") {
        // Divide-and-conquer toggle: the radix builder has only one
        // strategy, so this is accepted but has no effect.
        parse_on_off(value)?;
    } else if let Some(value) = switch.strip_prefix("mf") {
        options.filter_mode = parse_filter_mode(value)?;
    } else if let Some(value) = switch.strip_prefix("ms") {
        options.solid = parse_solid(value)?;
    } else if let Some(path) = switch.strip_prefix("i@") {
        selector.add_include_list(&PathBuf::from(path))?;
    } else if let Some(pattern) = switch.strip_prefix("i!") {
        selector.add_include_pattern(pattern)?;
    } else if let Some(path) = switch.strip_prefix("x@") {
        selector.add_exclude_list(&PathBuf::from(path))?;
    } else if let Some(pattern) = switch.strip_prefix("x!") {
        selector.add_exclude_pattern(pattern)?;
    } else if switch == "r" {
        *recursion = Recursion::Full;
    } else if switch == "r-" {
        *recursion = Recursion::None;
    } else if switch == "r0" {
        *recursion = Recursion::NamedOnly;
    } else if let Some(dir) = switch.strip_prefix('w') {
        *working_dir = Some(PathBuf::from(dir));
    } else if switch == "ssw" {
        options.share_deny_none = true;
    } else if switch == "spf" {
        options.store_full_paths = true;
    } else if switch == "q" {
        options.quiet = true;
    } else {
        return Err(RadyxError::InvalidArgument(format!("unrecognized switch -{switch}")));
    }
    Ok(())
}

fn strip_equals(value: &str) -> &str {
    value.strip_prefix('=').unwrap_or(value)
}

fn parse_u32(value: &str) -> Result<u32, RadyxError> {
    let value = strip_equals(value);
    value
        .parse()
        .map_err(|_| RadyxError::InvalidArgument(format!("expected a number, got {value:?}")))
}

/// Parses a size with an optional trailing unit suffix: `k`/`m`/`g`
/// (binary, case-insensitive) or no suffix for bytes.
fn parse_size(value: &str) -> Result<u64, RadyxError> {
    let value = strip_equals(value);
    let (digits, multiplier) = match value.chars().last() {
        Some(c) if c.eq_ignore_ascii_case(&'k') => (&value[..value.len() - 1], 1024u64),
        Some(c) if c.eq_ignore_ascii_case(&'m') => (&value[..value.len() - 1], 1024 * 1024),
        Some(c) if c.eq_ignore_ascii_case(&'g') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value, 1),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| RadyxError::InvalidArgument(format!("expected a size, got {value:?}")))?;
    Ok(n * multiplier)
}

fn parse_thread_count(value: &str) -> Result<usize, RadyxError> {
    let value = strip_equals(value);
    if value.is_empty() {
        return Ok(0);
    }
    if value == "-" {
        return Ok(1);
    }
    value
        .parse()
        .map_err(|_| RadyxError::InvalidArgument(format!("expected a thread count, got {value:?}")))
}

fn parse_on_off(value: &str) -> Result<bool, RadyxError> {
    match strip_equals(value) {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(RadyxError::InvalidArgument(format!("expected on/off, got {other:?}"))),
    }
}

fn parse_strategy(value: &str) -> Result<radyx::options::Strategy, RadyxError> {
    use radyx::options::Strategy;
    match strip_equals(value) {
        "0" => Ok(Strategy::Fast),
        "1" => Ok(Strategy::Normal),
        "2" => Ok(Strategy::Best),
        "3" => Ok(Strategy::High),
        other => Err(RadyxError::InvalidArgument(format!("expected 0-3, got {other:?}"))),
    }
}

fn parse_filter_mode(value: &str) -> Result<FilterMode, RadyxError> {
    match strip_equals(value) {
        "off" => Ok(FilterMode::Off),
        "on" => Ok(FilterMode::Auto),
        "BCJ" => Ok(FilterMode::ForceBcj),
        other => Err(RadyxError::InvalidArgument(format!("expected on/off/BCJ, got {other:?}"))),
    }
}

/// Clauses compose with `|` (`"2g|e"`); since [`SolidPolicy`] models a
/// single active policy rather than a conjunction, the last recognized
/// clause wins.
fn parse_solid(value: &str) -> Result<SolidPolicy, RadyxError> {
    let value = strip_equals(value);
    if value.is_empty() {
        return Ok(SolidPolicy::On);
    }
    let mut policy = None;
    for clause in value.split('|') {
        policy = Some(parse_solid_clause(clause)?);
    }
    Ok(policy.unwrap_or(SolidPolicy::On))
}

fn parse_solid_clause(clause: &str) -> Result<SolidPolicy, RadyxError> {
    match clause {
        "off" => return Ok(SolidPolicy::Off),
        "on" => return Ok(SolidPolicy::On),
        "e" => return Ok(SolidPolicy::ByExtension),
        _ => {}
    }
    let Some(last) = clause.chars().last() else {
        return Err(RadyxError::InvalidArgument("empty -ms clause".into()));
    };
    if last == 'f' {
        let n: u64 = clause[..clause.len() - 1]
            .parse()
            .map_err(|_| RadyxError::InvalidArgument(format!("bad -ms file count clause {clause:?}")))?;
        return Ok(SolidPolicy::FileCount(n));
    }
    Ok(SolidPolicy::ByteSize(parse_size(clause)?))
}
