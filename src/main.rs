//! Runs one ingestion cycle and prints the response.
//!
//! Intended to be started by a daily scheduler. Logs go to stderr; stdout
//! carries only the response JSON.

mod setup;

use clap::Parser;
use photoferry_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use time::Date;
use time::macros::format_description;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "photoferry", version, about = "Publish the day's staged images")]
struct Cli {
    /// Config file (TOML, YAML or JSON). Defaults to the platform config
    /// directory; environment variables prefixed `PHOTOFERRY_` override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Process uploads registered on this day (`YYYYMMDD`) instead of today.
    #[arg(long, value_parser = parse_date)]
    date: Option<Date>,
    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year][month][day]")).map_err(|e| e.to_string())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(?err, "failed to load configuration");
            return ExitCode::FAILURE;
        },
    };
    let pipeline = match setup::pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            tracing::error!(?err, "failed to set up pipeline");
            return ExitCode::FAILURE;
        },
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(%err, "failed to start runtime");
            return ExitCode::FAILURE;
        },
    };

    let response = runtime.block_on(async {
        match cli.date {
            Some(date) => pipeline.run_for(date).await,
            None => pipeline.handle(&serde_json::json!({"source": "cli"})).await,
        }
    });
    match serde_json::to_string(&response) {
        Ok(output) => println!("{output}"),
        Err(err) => tracing::error!(%err, "failed to serialize response"),
    }
    if response.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;
    use time::macros::date;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("20240307", date!(2024 - 03 - 07))]
    #[case("19991231", date!(1999 - 12 - 31))]
    fn test_parse_date(#[case] value: &str, #[case] expected: Date) {
        assert_eq!(parse_date(value).unwrap(), expected);
    }

    #[rstest]
    #[case("2024-03-07")]
    #[case("20241301")]
    #[case("today")]
    fn test_parse_date_invalid(#[case] value: &str) {
        assert!(parse_date(value).is_err());
    }

    #[test]
    fn test_arguments() {
        let cli = Cli::try_parse_from(["photoferry", "--config", "/etc/photoferry.toml", "--date", "20240307", "--json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/photoferry.toml")));
        assert_eq!(cli.date, Some(date!(2024 - 03 - 07)));
        assert!(cli.json);

        let cli = Cli::try_parse_from(["photoferry"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.date, None);
        assert!(!cli.json);
    }
}
