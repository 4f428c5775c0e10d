//! Audit command - inspect and append to the audit log.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use invscan_core::{AuditAction, AuditLogEntry, AuditQuery, AuditTargetType};

use super::{configured_actor, load_config, open_audit_log};

/// Arguments for the audit command.
#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    command: AuditCommand,
}

#[derive(Subcommand)]
enum AuditCommand {
    /// List entries, newest first
    List(ListArgs),

    /// Append an entry
    Record(RecordArgs),

    /// Show the audit log file path
    Path,
}

#[derive(Args)]
struct ListArgs {
    /// Only entries for this entity type
    #[arg(long)]
    target_type: Option<AuditTargetType>,

    /// Only entries for this entity id
    #[arg(long)]
    target_id: Option<String>,

    /// Only this action (create, update, delete)
    #[arg(long)]
    action: Option<AuditAction>,

    /// Only entries by this user id
    #[arg(long)]
    user: Option<String>,

    /// Entries at or after this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,

    /// Entries at or before this time (RFC 3339 or YYYY-MM-DD, a bare date covers the whole day)
    #[arg(long, value_parser = parse_until)]
    until: Option<DateTime<Utc>>,

    /// Maximum number of entries
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RecordArgs {
    /// Action performed
    #[arg(long)]
    action: AuditAction,

    /// Entity type
    #[arg(long)]
    target_type: AuditTargetType,

    /// Entity id
    #[arg(long)]
    target_id: String,

    /// JSON file with the entity before the change
    #[arg(long)]
    old: Option<PathBuf>,

    /// JSON file with the entity after the change
    #[arg(long)]
    new: Option<PathBuf>,

    /// Free-form remarks
    #[arg(long)]
    remarks: Option<String>,
}

pub fn run(args: AuditArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let log = open_audit_log(&config);

    match args.command {
        AuditCommand::List(list) => {
            let mut query = AuditQuery::new();
            query.target_type = list.target_type;
            query.target_id = list.target_id;
            query.action = list.action;
            query.user_id = list.user;
            query.since = list.since;
            query.until = list.until;
            query.limit = list.limit;

            let entries = log.query(&query)?;
            if list.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("{} No audit entries.", style("ℹ").blue());
            } else {
                for entry in &entries {
                    println!("{}", format_entry(entry));
                }
            }
        }
        AuditCommand::Record(record) => {
            let mut entry = AuditLogEntry::new(
                record.action,
                record.target_type,
                record.target_id,
                &configured_actor(&config),
                record.old.as_ref().map(read_json).transpose()?,
                record.new.as_ref().map(read_json).transpose()?,
            );
            if let Some(remarks) = record.remarks {
                entry = entry.with_remarks(remarks);
            }

            log.append(entry.clone())?;
            println!(
                "{} Recorded {} {} {}",
                style("✓").green(),
                entry.action(),
                entry.target_type(),
                entry.target_id()
            );
        }
        AuditCommand::Path => {
            println!("Audit log: {}", log.store().path().display());
        }
    }

    Ok(())
}

fn read_json(path: &PathBuf) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time(s, |d| d.and_hms_opt(0, 0, 0))
}

fn parse_until(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time(s, |d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
}

fn parse_time(
    s: &str,
    day_bound: impl FnOnce(NaiveDate) -> Option<NaiveDateTime>,
) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(day_bound)
        .map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid time '{}': use RFC 3339 or YYYY-MM-DD", s))
}

fn format_entry(entry: &AuditLogEntry) -> String {
    let mut line = format!(
        "{}  {:<6} {:<8} {:<20} by {} ({})",
        entry.timestamp().format("%Y-%m-%d %H:%M:%S"),
        entry.action(),
        entry.target_type(),
        entry.target_id(),
        entry.user_name(),
        entry.user_id()
    );
    if let Some(fields) = entry.changed_fields() {
        let names: Vec<&str> = fields.iter().map(String::as_str).collect();
        line.push_str(&format!("  changed: {}", names.join(", ")));
    }
    if let Some(remarks) = entry.remarks() {
        line.push_str(&format!("  - {}", remarks));
    }
    line
}
