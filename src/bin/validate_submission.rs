//! Validate a submission file and print the report.
//!
//! Usage: `validate-submission [PATH]`
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use std::process::ExitCode;

use research_validator::adapters::cli::{render_report, run_validation, DEFAULT_SUBMISSION_PATH};
use research_validator::ValidationService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SUBMISSION_PATH.to_string());

    let service = match ValidationService::from_env() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Validation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_validation(&service, &path).await {
        Ok(report) => {
            print!("{}", render_report(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Validation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
