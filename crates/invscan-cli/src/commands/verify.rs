//! Verify command - check sealed JSON records for tampering.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use serde_json::Value;

use invscan_core::{verify_record, Verification};

/// Arguments for the verify command.
#[derive(Args)]
pub struct VerifyArgs {
    /// Sealed JSON records
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FileVerification {
    path: PathBuf,
    #[serde(flatten)]
    verification: Verification,
}

pub fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let mut results = Vec::with_capacity(args.inputs.len());

    for path in args.inputs {
        let content = fs::read_to_string(&path)?;
        let record: Value = serde_json::from_str(&content)?;
        results.push(FileVerification {
            verification: verify_record(&record),
            path,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            let v = &result.verification;
            if v.valid {
                println!("{} {}", style("✓ intact").green(), result.path.display());
            } else if v.expected_digest.is_none() {
                println!("{} {}", style("✗ unsealed").yellow(), result.path.display());
            } else {
                println!("{} {}", style("✗ tampered").red(), result.path.display());
                println!("    stored:  {}", v.expected_digest.as_deref().unwrap_or("-"));
                println!("    current: {}", v.current_digest.as_deref().unwrap_or("uncomputable"));
            }
        }
    }

    let failed = results.iter().filter(|r| !r.verification.valid).count();
    if failed > 0 {
        anyhow::bail!("{} of {} records failed verification", failed, results.len());
    }

    Ok(())
}
