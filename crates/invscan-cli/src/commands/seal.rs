//! Seal command - attach a content digest to a JSON record.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;
use serde_json::Value;

use invscan_core::{seal_record, AuditAction, AuditTargetType, GuardedOperation, TamperGuard};

use super::{configured_actor, load_config, open_audit_log};

/// Arguments for the seal command.
#[derive(Args)]
pub struct SealArgs {
    /// JSON record to seal
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Rewrite the input file
    #[arg(long)]
    in_place: bool,

    /// Record an audit entry for this entity type (invoice, client, payment, settings)
    #[arg(long)]
    target_type: Option<AuditTargetType>,

    /// Entity id for the audit entry (default: the record's "id", else the file name)
    #[arg(long, requires = "target_type")]
    target_id: Option<String>,
}

pub fn run(args: SealArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.input)?;
    let mut record: Value = serde_json::from_str(&content)?;

    // A tampered record must not be laundered by resealing it.
    TamperGuard::inspect(&record).ensure_mutable(GuardedOperation::Edit)?;
    let previous = record.clone();

    let digest = seal_record(&mut record, Utc::now())?;
    let sealed = serde_json::to_string_pretty(&record)?;

    let destination = if args.in_place {
        Some(&args.input)
    } else {
        args.output.as_ref()
    };
    match destination {
        Some(path) => {
            fs::write(path, &sealed)?;
            println!(
                "{} Sealed {} ({})",
                style("✓").green(),
                path.display(),
                digest
            );
        }
        None => println!("{}", sealed),
    }

    if let Some(target_type) = args.target_type {
        let config = load_config(config_path)?;
        let target_id = args
            .target_id
            .or_else(|| record.get("id").map(id_string))
            .or_else(|| {
                args.input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unknown".to_string());

        open_audit_log(&config).record(
            AuditAction::Update,
            target_type,
            target_id,
            &configured_actor(&config),
            Some(previous),
            Some(record),
        );
    }

    Ok(())
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
