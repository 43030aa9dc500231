//! Entry point for lvis2nc.
//! Handles CLI parsing and logging setup, then dispatches to conversion,
//! archive sync or inspection.

use clap::Parser;
use lvis2nc::cli::{Cli, Command, ConvertArgs, InspectArgs, SyncArgs};
use lvis2nc::inspect::{print_document, summarize_document};
use lvis2nc::parallel::{convert_batch, get_parallel_info};
use lvis2nc::sync::{sync_archive, LocalArchive};
use lvis2nc::Result;
use std::process::ExitCode;
use tracing::{debug, error, info};

fn setup_logging(log_level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lvis2nc={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn run_convert(args: &ConvertArgs) -> Result<bool> {
    let config = args.convert_config();
    let parallel = args.parallel_config();
    if parallel.is_parallel() {
        let info = get_parallel_info();
        debug!(
            threads = ?parallel.num_threads,
            available_cores = info.available_cores,
            available_parallelism = info.available_parallelism,
            "parallel conversion"
        );
    }
    let report = convert_batch(&args.files, &config, &parallel)?;
    info!(
        converted = report.converted.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report.is_success())
}

fn run_sync(args: &SyncArgs) -> Result<bool> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let source = LocalArchive::new(&args.archive);
    let report = runtime.block_on(sync_archive(&source, &args.sync_options()))?;
    info!(
        transferred = report.transferred.len(),
        up_to_date = report.up_to_date,
        failed = report.failed.len(),
        "sync finished"
    );
    Ok(report.failed.is_empty())
}

fn run_inspect(args: &InspectArgs) -> Result<bool> {
    let file = netcdf::open(&args.file)?;
    let summary = summarize_document(&file)?;
    print_document(&summary);
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.command.log_level());

    let outcome = match &cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Sync(args) => run_sync(args),
        Command::Inspect(args) => run_inspect(args),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
