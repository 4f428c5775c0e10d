//! Extract command - pull invoice fields from a single file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invscan_core::extraction::CascadeMatch;
use invscan_core::{AuditAction, AuditTargetType, ExtractionResult, FieldName};

use super::{configured_actor, load_config, open_audit_log, Scanner};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (recognized text, or an image when built with OCR support)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,

    /// Show which rule produced each field instead of the result
    #[arg(long, conflicts_with = "output")]
    explain: bool,

    /// Record the extraction in the audit log as a new invoice
    #[arg(long)]
    audit: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let scanner = Scanner::new(&config);

    if args.explain {
        if super::is_image(&args.input) {
            anyhow::bail!("--explain works on text input only");
        }
        let text = super::read_text(&args.input)?;
        print!("{}", format_explanation(&scanner.engine().explain(&text)));
        return Ok(());
    }

    let result = scanner.scan(&args.input).await;
    scanner.shutdown().await;
    let result = result?;

    if result.needs_manual_entry(config.extraction.min_overall_confidence) {
        eprintln!(
            "{} Low confidence or missing total; review before saving.",
            style("⚠").yellow()
        );
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            result.overall_confidence * 100.0
        );
        println!(
            "{} Processing time: {:.1}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    if args.audit {
        let target_id = result
            .value(FieldName::InvoiceNumber)
            .map(str::to_string)
            .or_else(|| {
                args.input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unknown".to_string());

        let entry = open_audit_log(&config).record_entry(
            invscan_core::AuditLogEntry::new(
                AuditAction::Create,
                AuditTargetType::Invoice,
                target_id,
                &configured_actor(&config),
                None,
                Some(serde_json::to_value(&result)?),
            )
            .with_remarks(format!("extracted from {}", args.input.display())),
        );
        debug!("Recorded audit entry {}", entry.id());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["field", "value", "confidence"])?;
    for (field, recognized) in &result.fields {
        wtr.write_record([
            field.as_str(),
            recognized.value.as_str(),
            &format!("{:.2}", recognized.confidence),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    for field in FieldName::ALL {
        let line = match result.get(field) {
            Some(recognized) => format!(
                "{:<14} {} ({:.0}%)\n",
                field.as_str(),
                recognized.value,
                recognized.confidence * 100.0
            ),
            None => format!("{:<14} -\n", field.as_str()),
        };
        output.push_str(&line);
    }

    output.push_str(&format!(
        "\nConfidence: {:.1}%\n",
        result.overall_confidence * 100.0
    ));

    let missing = result.missing_fields();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        output.push_str(&format!("Missing: {}\n", names.join(", ")));
    }

    output
}

fn format_explanation(matches: &[CascadeMatch]) -> String {
    let mut output = String::new();

    for m in matches {
        output.push_str(&format!(
            "{:<14} {:<24} {:<28} {:?} {:.2}\n",
            m.field.as_str(),
            m.value,
            m.rule,
            m.tier,
            m.confidence
        ));
    }

    output
}
