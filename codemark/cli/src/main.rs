use clap::Parser;
use codemark_cli::{Cli, run};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber based on verbosity level.
///
/// Verbosity levels:
/// - 0 (default): no subscriber unless `RUST_LOG` is set
/// - 1 (-v): INFO (pass summaries)
/// - 2 (-vv): DEBUG (skipped blocks, rejected highlight tokens)
/// - 3 (-vvv): TRACE (per-block and per-row work)
/// - 4+ (-vvvv): TRACE with file/line numbers
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => return,
            1 => "warn,codemark_lib=info,codemark_cli=info".to_string(),
            2 => "info,codemark_lib=debug,codemark_cli=debug".to_string(),
            _ => "debug,codemark_lib=trace,codemark_cli=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(verbose >= 4)
                .with_line_number(verbose >= 4)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to start the async runtime")?;

    let output = runtime.block_on(run(&cli))?;
    println!("{}", output);
    Ok(())
}
