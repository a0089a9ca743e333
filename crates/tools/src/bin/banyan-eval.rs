//! Evaluate a ruleset or challenge of a DAR archive against evidence.
//!
//! Usage: `banyan-eval <dar> (--ruleset ID | --challenge ID) [--version N] --evidence JSON`

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

use banyan_runtime::{ChallengeKey, DarLoader, Evaluator, EvidenceContext, RulesetKey};

#[derive(Parser, Debug)]
#[command(name = "banyan-eval")]
#[command(about = "Evaluate a DAR archive against evidence")]
struct Args {
    /// Path to the DAR archive
    dar: PathBuf,

    /// Ruleset to evaluate
    #[arg(long, conflicts_with = "challenge")]
    ruleset: Option<String>,

    /// Challenge to evaluate; defaults to the archive root
    #[arg(long)]
    challenge: Option<String>,

    /// Version of the ruleset or challenge
    #[arg(long, default_value_t = 1)]
    version: u32,

    /// Evidence as a JSON object
    #[arg(long, default_value = "{}")]
    evidence: String,
}

fn run(args: Args) -> anyhow::Result<()> {
    let context = DarLoader::load(&args.dar)
        .with_context(|| format!("failed to load {}", args.dar.display()))?;
    let evidence = EvidenceContext::from_json_str(&args.evidence).context("invalid evidence")?;
    let evaluator = Evaluator::new(Arc::new(context));

    match (&args.ruleset, &args.challenge) {
        (Some(id), None) => {
            let key = RulesetKey::new(id.clone(), args.version);
            let result = evaluator.evaluate(&key, &evidence)?;
            info!("Ruleset {} evaluated to {}", key, result);
            println!("{result}");
        }
        (None, challenge) => {
            let key = match challenge {
                Some(id) => ChallengeKey::new(id.clone(), args.version),
                None => evaluator.context().root_key(),
            };
            let outcome = evaluator.evaluate_challenge(&key, &evidence)?;
            for task in &outcome.tasks {
                info!("Task {} passed={} emitted={:?}", task.key, task.passed, task.emitted);
            }
            info!("Challenge {} passed={}", key, outcome.passed());
            println!("{}", outcome.passed());
        }
        (Some(_), Some(_)) => bail!("--ruleset and --challenge are mutually exclusive"),
    }
    Ok(())
}

fn main() {
    banyan_tools::init_logging();

    if let Err(e) = run(Args::parse()) {
        error!("{:#}", e);
        process::exit(1);
    }
}
