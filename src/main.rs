//! table_hammer - entry point
//!
//! ```text
//! table_hammer [host] [port]
//! ```
//!
//! Without arguments the server address comes from `config/harness.yaml`
//! (or `127.0.0.1:8080`). Exit status is 0 only when every table reported
//! the expected item count.

use std::process::ExitCode;

use anyhow::Context;

use table_hammer::config::HarnessConfig;
use table_hammer::{Harness, HarnessError};

const USAGE: &str = "run: table_hammer [host] [port]";

/// `None` on a wrong argument count.
fn parse_args(args: &[String]) -> Option<Option<(&str, &str)>> {
    match args {
        [_] => Some(None),
        [_, host, port] => Some(Some((host.as_str(), port.as_str()))),
        _ => None,
    }
}

fn load_config(server: Option<(&str, &str)>) -> anyhow::Result<HarnessConfig> {
    let config = HarnessConfig::load().context("loading harness configuration")?;
    match server {
        Some((host, port)) => config
            .with_server(host, port)
            .context("applying [host] [port]"),
        None => Ok(config),
    }
}

/// Number of tables checked on success. A count mismatch comes back as
/// `HarnessError::CountMismatch`.
async fn run(config: HarnessConfig) -> anyhow::Result<u32> {
    let harness = Harness::new(config)?;
    let report = harness.run().await?;
    tracing::info!(
        writes = report.writes,
        write_ms = report.write_elapsed.as_millis() as u64,
        total_ms = report.total_elapsed.as_millis() as u64,
        pass = report.verdict.is_pass(),
        "Harness finished"
    );
    Ok(report.verdict.into_result()?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(server) = parse_args(&args) else {
        println!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    let config = match load_config(server) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = table_hammer::logging::init_logging(&config);
    tracing::info!(addr = %config.server.addr(), "Starting table_hammer");

    match run(config).await {
        Ok(_) => {
            println!("All table has correct amount of items");
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<HarnessError>() {
                Some(mismatch @ HarnessError::CountMismatch { .. }) => println!("{}", mismatch),
                Some(HarnessError::Connect { addr, .. }) => {
                    println!("Unable to connect {}", addr);
                }
                _ => eprintln!("❌ FATAL: {:#}", e),
            }
            tracing::error!(error = %format!("{:#}", e), "Harness aborted");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&args(&["table_hammer"])), Some(None));
        assert_eq!(
            parse_args(&args(&["table_hammer", "10.0.0.1", "9000"])),
            Some(Some(("10.0.0.1", "9000")))
        );
        assert_eq!(parse_args(&args(&["table_hammer", "10.0.0.1"])), None);
        assert_eq!(parse_args(&args(&["table_hammer", "a", "b", "c"])), None);
    }
}
