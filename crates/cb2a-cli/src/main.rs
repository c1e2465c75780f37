//! Binary entrypoint: inspect and check the variants of a CB2A catalog.
//!
//! ```text
//! cb2a-cli list
//! cb2a-cli check <variant-id> [--proof]
//! cb2a-cli check-all
//! ```
//!
//! `--proof` runs the check stage by stage and prints the per-stage hashes
//! next to the evaluation. JSON goes to stdout, logs to stderr. `CB2A_CATALOG` and `CB2A_PROFILE`
//! point at a catalog and a validation profile file; `CB2A_LOG` sets the
//! log filter.
use anyhow::{bail, Context, Result};
use cb2a_core::Catalog;
use cb2a_quality::{ValidationProfile, Validator};
use cb2a_stages::Evaluator;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: cb2a-cli <list | check <variant-id> [--proof] | check-all>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Check { variant_id: String, proof: bool },
    CheckAll,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let command = match args.as_slice() {
        ["list"] => Command::List,
        ["check", variant_id] => Command::Check {
            variant_id: variant_id.to_string(),
            proof: false,
        },
        ["check", variant_id, "--proof"] | ["check", "--proof", variant_id] => Command::Check {
            variant_id: variant_id.to_string(),
            proof: true,
        },
        ["check-all"] => Command::CheckAll,
        _ => bail!(USAGE),
    };
    Ok(command)
}

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_env("CB2A_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    let evaluator = evaluator()?;

    match command {
        Command::List => list(&evaluator),
        Command::Check { variant_id, proof } => check(&evaluator, &variant_id, proof),
        Command::CheckAll => check_all(&evaluator),
    }
}

fn evaluator() -> Result<Evaluator> {
    let catalog = match std::env::var("CB2A_CATALOG") {
        Ok(path) => Arc::new(
            Catalog::load(&path).with_context(|| format!("failed to load catalog {}", path))?,
        ),
        Err(_) => Catalog::embedded().context("embedded catalog is invalid")?,
    };

    let profile = match std::env::var("CB2A_PROFILE") {
        Ok(path) => ValidationProfile::load(&path)
            .with_context(|| format!("failed to load validation profile {}", path))?,
        Err(_) => ValidationProfile::strict(),
    };
    let validator = Validator::new(&profile).context("invalid validation profile")?;

    tracing::info!(
        catalog = %catalog.meta().version,
        profile = %validator.profile(),
        "evaluator ready"
    );

    Ok(Evaluator::new(catalog, validator))
}

fn list(evaluator: &Evaluator) -> Result<ExitCode> {
    let catalog = evaluator.catalog();
    for variant in catalog.variants() {
        println!("{}\t{}", variant.id, catalog.variant_label(variant));
    }
    Ok(ExitCode::SUCCESS)
}

fn check(evaluator: &Evaluator, variant_id: &str, proof: bool) -> Result<ExitCode> {
    let evaluation = if proof {
        let (evaluation, run_proof) = evaluator.run_with_proof(variant_id)?;
        let output = serde_json::json!({ "evaluation": &evaluation, "proof": run_proof });
        println!("{}", serde_json::to_string_pretty(&output)?);
        evaluation
    } else {
        let evaluation = evaluator.evaluate(variant_id)?;
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        evaluation
    };

    if evaluation.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(variant = %variant_id, "{}", evaluation.report.summary());
        Ok(ExitCode::FAILURE)
    }
}

fn check_all(evaluator: &Evaluator) -> Result<ExitCode> {
    let mut failed = 0;
    for evaluation in evaluator.evaluate_all()? {
        if !evaluation.passed() {
            failed += 1;
        }
        println!("{}\t{}", evaluation.variant_id, evaluation.report.summary());
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
