//! The `radyx` command-line binary: a single `a` (add) command in the
//! 7-Zip embedded-switch style, wired to the library's [`radyx::Scheduler`].

mod cli;

use std::fs;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use clap_complete::generate;

use radyx::model::DirPool;
use radyx::progress::format_bytes_iec;
use radyx::{InterruptFlag, Scheduler};

use cli::cli_args::Cli;
use cli::error::RadyxError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = cli::cli_args::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(&cli.args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("radyx: {err}");
            err.exit_code()
        }
    }
}

fn run(args: &[String]) -> Result<ExitCode, RadyxError> {
    let session = cli::args::parse(args)?;

    let log_level = if session.options.quiet { log::LevelFilter::Error } else { log::LevelFilter::Warn };
    env_logger::Builder::from_default_env().filter_level(log_level).format_timestamp(None).try_init().ok();

    if session.archive.exists() {
        return Err(RadyxError::Session(radyx::Error::ArchiveExists(session.archive.clone())));
    }

    let interrupt = InterruptFlag::new();
    {
        let interrupt = interrupt.clone();
        ctrlc::set_handler(move || interrupt.set()).ok();
    }

    let mut pool = DirPool::new();
    let files = cli::walk::collect(
        &session.inputs,
        &session.selector,
        session.recursion,
        session.options.store_full_paths,
        &mut pool,
    );

    if files.is_empty() {
        if !session.options.quiet {
            println!("no files matched; nothing to archive");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let files = radyx::scheduler::prepare(files, session.options.store_full_paths).map_err(RadyxError::Session)?;

    let total_bytes: u64 = files.iter().map(|f| f.size).sum();
    let start = Instant::now();

    let out = fs::File::create(&session.archive).map_err(|source| RadyxError::Session(radyx::Error::IoOpen {
        path: session.archive.clone(),
        source,
    }))?;

    let scheduler = Scheduler::new(out, session.options.clone(), interrupt)?;
    match scheduler.run(files) {
        Ok(_writer) => {
            if !session.options.quiet {
                let packed = fs::metadata(&session.archive).map(|m| m.len()).unwrap_or(0);
                println!(
                    "{} -> {} in {:.1}s",
                    format_bytes_iec(total_bytes),
                    format_bytes_iec(packed),
                    start.elapsed().as_secs_f64()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(radyx::Error::Interrupted) => {
            let _ = fs::remove_file(&session.archive);
            Err(RadyxError::Session(radyx::Error::Interrupted))
        }
        Err(other) => Err(RadyxError::Session(other)),
    }
}
