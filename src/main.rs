use anyhow::Result;
use std::{io, path::PathBuf, process::ExitCode};
use tabload::{import, Config, RunOutcome};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<ExitCode> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,tabload=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    info!(
        db = %config.db_path.display(),
        data = %config.data_dir.display(),
        "config"
    );

    // ─── 3) interactive session ──────────────────────────────────────
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    match import::run(&config, &mut input, &mut out)? {
        RunOutcome::Completed(report) => {
            info!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                "all done"
            );
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::InvalidMode(choice) => {
            warn!(choice = %choice, "no import performed");
            Ok(ExitCode::from(2))
        }
    }
}
