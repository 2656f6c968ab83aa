//! Subcommand implementations.

use anyhow::{bail, Context};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tabstat_core::{
    find_missing, parse_rows, run_indexed_query, schema, Database, Document, DocumentStore, Pipeline,
    PipelineConfig, Stage, StageOutcome, TabstatConfig,
};

use crate::output;
use crate::FormatArg;

fn create_progress_bar(total: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Writes the default configuration to `output`.
pub fn init(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let text = TabstatConfig::default().to_toml()?;
    std::fs::write(output, text)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!(
        "{} Configuration written to {}",
        "✓".green().bold(),
        output.display()
    );
    Ok(())
}

/// Loads a CSV file into the dataset collection and reports missing cells.
pub fn load(
    db: &Database,
    config: &TabstatConfig,
    csv: Option<PathBuf>,
    collection: Option<String>,
    progress: bool,
) -> anyhow::Result<()> {
    let path = csv.unwrap_or_else(|| PathBuf::from(&config.dataset.csv_path));
    let name = collection.unwrap_or_else(|| config.dataset.collection.clone());
    let start = Instant::now();

    println!("\n{}", "Loading dataset".bold().underline());
    println!("  File:       {}", path.display());
    println!("  Collection: {name}");

    let rows = parse_rows(&path, &config.dataset.ingest_options())
        .with_context(|| format!("cannot read {}", path.display()))?;
    let target = db.collection(&name)?;

    let pb = create_progress_bar(rows.len(), progress);
    let mut inserted = Vec::with_capacity(rows.len());
    for body in rows {
        let id = target.insert(body.clone())?;
        inserted.push(Document::new(id, body));
        pb.inc(1);
    }
    pb.finish_and_clear();
    target.flush()?;

    let report = schema::validate(&inserted, &config.column_set()?);
    println!(
        "  {} {} records loaded in {:.2}s",
        "✓".green(),
        inserted.len(),
        start.elapsed().as_secs_f64()
    );
    output::print_schema_report(&report);
    Ok(())
}

/// Lists documents with a null or NaN declared column.
pub fn missing(db: &Database, config: &TabstatConfig, format: FormatArg) -> anyhow::Result<()> {
    let dataset = db.existing_collection(&config.dataset.collection)?;
    let docs = find_missing(dataset.as_ref(), &config.column_set()?)?;
    output::print_documents_as(&docs, format)
}

/// Runs the full pipeline or a single stage.
pub fn run(
    db: &Database,
    config: &TabstatConfig,
    stage: Option<Stage>,
    format: FormatArg,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(db, PipelineConfig::from_config(config)?);

    let Some(stage) = stage else {
        let report = pipeline.run()?;
        return match format {
            FormatArg::Json => output::print_json(&report),
            FormatArg::Table => {
                output::print_report(&report);
                Ok(())
            }
        };
    };

    let outcome = pipeline.run_stage(stage)?;
    if let FormatArg::Json = format {
        return output::print_json(&outcome);
    }

    output::print_heading(stage.name());
    match &outcome {
        StageOutcome::Normalize(n) => println!(
            "  {} document(s) with missing values, {} patched",
            n.missing_documents, n.patched
        ),
        StageOutcome::Statistics(s) => output::print_statistics(s),
        StageOutcome::Frequencies(f) => output::print_frequencies(f),
        StageOutcome::BelowMean(p) | StageOutcome::AboveMean(p) => output::print_partition(p),
        StageOutcome::EmbedCategorical(n) | StageOutcome::EmbedContinuous(n) => {
            println!("  {n} enriched document(s) written");
        }
        StageOutcome::Threshold(flagged) => output::print_flagged(flagged),
        StageOutcome::Query(docs) => output::print_documents(docs),
    }
    Ok(())
}

/// Runs the configured compound-index query against the dataset.
pub fn query(db: &Database, config: &TabstatConfig, format: FormatArg) -> anyhow::Result<()> {
    let dataset = db.existing_collection(&config.dataset.collection)?;
    let docs = run_indexed_query(dataset.as_ref(), &config.query.spec())?;
    output::print_documents_as(&docs, format)
}

/// Shows the data directory and every collection with its size.
pub fn info(db: &Database) -> anyhow::Result<()> {
    println!("\n{}", "Database".bold().underline());
    println!("  Data dir: {}", db.data_dir().display());

    let names = db.list_collections()?;
    if names.is_empty() {
        println!("  {}", "No collections.".dimmed());
        return Ok(());
    }
    for name in names {
        let count = db.existing_collection(&name)?.count()?;
        println!("  {} {name}: {count} document(s)", "•".cyan());
    }
    Ok(())
}

/// Drops the named collections, or every derived collection when none is named.
pub fn drop(db: &Database, config: &TabstatConfig, collections: &[String]) -> anyhow::Result<()> {
    let names: Vec<String> = if collections.is_empty() {
        config
            .collection_names()
            .derived()
            .iter()
            .map(ToString::to_string)
            .collect()
    } else {
        collections.to_vec()
    };

    for name in &names {
        if db.has_collection(name) {
            db.drop_collection(name)?;
            println!("  {} dropped {name}", "✓".green());
        } else {
            println!("  {} {name} does not exist, skipped", "-".yellow());
        }
    }
    Ok(())
}

/// Drops every collection.
pub fn drop_db(db: &Database) -> anyhow::Result<()> {
    let dropped = db.drop_all()?;
    println!(
        "{} dropped {} collection(s) from {}",
        "✓".green().bold(),
        dropped.len(),
        db.data_dir().display()
    );
    Ok(())
}

/// Exports every collection as a JSON array file.
pub fn export(db: &Database, dir: &Path) -> anyhow::Result<()> {
    let written = db.export(dir)?;
    for path in &written {
        println!("  {} {}", "✓".green(), path.display());
    }
    println!("{} file(s) written to {}", written.len(), dir.display());
    Ok(())
}
