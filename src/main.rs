#[cfg(not(feature = "cli"))]
compile_error!("The `sqlb` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use tracing_subscriber::EnvFilter;

use sqlb::cli;
use sqlb::cli::app::{Cli, ColorMode, Commands};
use sqlb::SqlbError;

/// Install the stderr log subscriber. `RUST_LOG` wins when set; otherwise
/// the level follows the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sqlb={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, SqlbError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| SqlbError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Search {
            file,
            root,
            json,
            threads,
            page_size,
            max_depth,
        } => cli::search::execute(
            &cli::search::SearchOptions {
                file,
                root,
                json,
                threads,
                page_size,
                max_depth,
            },
            &mut std::io::stdin().lock(),
            &mut writer,
        ),

        Commands::Info { file, json } => {
            cli::info::execute(&cli::info::InfoOptions { file, json }, &mut writer)
        }

        Commands::Pages {
            file,
            page,
            json,
            page_size,
        } => cli::pages::execute(
            &cli::pages::PagesOptions {
                file,
                page,
                json,
                page_size,
            },
            &mut writer,
        ),

        Commands::Dump {
            file,
            page,
            length,
            raw,
            page_size,
        } => cli::dump::execute(
            &cli::dump::DumpOptions {
                file,
                page,
                length,
                raw,
                page_size,
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "sqlb", &mut writer);
            Ok(())
        }
    };

    let result = result.and_then(|()| {
        writer
            .flush()
            .map_err(|e| SqlbError::Io(format!("Cannot flush output: {}", e)))
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
