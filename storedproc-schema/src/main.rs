//! Stored procedure schema reporter.
//!
//! Executes one stored procedure, describes its first result set and prints
//! either a metadata dump or a load script to stdout. Logs and errors go to
//! stderr, so stdout can be redirected straight into a `.sql` file.
//!
//! # Exit status
//! - 0: success
//! - 1: I/O or configuration failure
//! - 2: usage error
//! - 3: malformed `--param`
//! - 4: connection failure
//! - 5: procedure missing or failed
//! - 6: parameter does not match the procedure

use clap::{CommandFactory, error::ErrorKind};
use std::{error::Error, io, process::ExitCode};
use storedproc_schema::{Cli, parse_cli, run, usage_error};
use storedproc_schema_core::{SchemaReporterError, SqlServerAdapter, init_logging};
use tracing::error;

/// Prints an error and its source chain to stderr.
fn report(err: &SchemaReporterError) {
    eprintln!("Error: {}", err);

    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            e.exit()
        }
        Err(e) => {
            eprint!("{}", e);
            eprintln!();
            eprintln!("{}", Cli::command().render_help());
            return ExitCode::from(usage_error(&e).exit_code());
        }
    };

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        report(&e);
        return ExitCode::from(e.exit_code());
    }

    let adapter = SqlServerAdapter::new();
    let mut stdout = io::stdout().lock();

    match run(&cli, &adapter, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed with exit status {}", e.exit_code());
            report(&e);
            ExitCode::from(e.exit_code())
        }
    }
}
