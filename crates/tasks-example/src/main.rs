//! Tasks - filter a task list with URL-style parameters.
//!
//! Run with: cargo run --bin tasks -- 'status=open&priority=3-5'
//!
//! Tasks come from a JSON file (`--file`) or a built-in sample. Parameters can
//! be given as a query string, as repeated `--param name=value` flags, or both.
//! Matching tasks are printed as a JSON array.

mod tasks;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use paramsieve::{FilteredResource, Params};
use tracing_subscriber::EnvFilter;

use crate::tasks::TaskList;

#[derive(Parser)]
#[command(name = "tasks")]
#[command(about = "Filter a task list with URL-style parameters")]
struct Cli {
    /// Query string, e.g. `status=open&owner=ana,bo`
    query: Option<String>,

    /// Extra parameter as `name=value`; may be repeated
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// JSON file holding an array of tasks
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Log filter decisions
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn collect_params(cli: &Cli) -> Result<Params> {
    let mut params = cli
        .query
        .as_deref()
        .map(Params::from_query_string)
        .unwrap_or_default();

    for param in &cli.params {
        let Some((name, value)) = param.split_once('=') else {
            bail!("parameter '{param}' must look like name=value");
        };
        params.insert(name, value);
    }
    Ok(params)
}

fn limit(params: &Params) -> Option<usize> {
    params
        .get("limit")
        .last()
        .and_then(|raw| raw.trim().parse().ok())
}

fn run(cli: &Cli) -> Result<()> {
    let list = match &cli.file {
        Some(path) => TaskList::load(path)?,
        None => TaskList::sample()?,
    };
    let params = collect_params(cli)?;
    tracing::debug!(params = params.len(), tasks = list.tasks().len(), "filtering");

    let query = list.filtered_query(&params)?;
    let mut found = list.select(&query);
    if let Some(limit) = limit(&params) {
        found.truncate(limit);
    }

    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("tasks").chain(args.iter().copied()))
    }

    #[test]
    fn query_and_flags_combine() {
        let args = ["status=open", "-p", "owner=ana", "--param", "status=done"];
        let params = collect_params(&cli(&args)).unwrap();
        assert_eq!(params.get("status"), ["open", "done"]);
        assert_eq!(params.get("owner"), ["ana"]);
    }

    #[test]
    fn flag_without_equals_is_rejected() {
        let err = collect_params(&cli(&["-p", "owner"])).unwrap_err();
        assert!(err.to_string().contains("name=value"));
    }

    #[test]
    fn limit_reads_last_value() {
        assert_eq!(limit(&Params::from_query_string("limit=2")), Some(2));
        assert_eq!(limit(&Params::from_query_string("limit=lots")), None);
        assert_eq!(limit(&Params::new()), None);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
