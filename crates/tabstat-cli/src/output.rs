//! Output formatting for the CLI.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use tabstat_core::schema::SchemaReport;
use tabstat_core::{Document, FrequencyTable, Partition, PipelineReport, Statistics};

use crate::FormatArg;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

fn number_cell(value: f64) -> Cell {
    let text = if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.4}")
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Prints any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints one section title.
pub fn print_heading(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Prints per-column statistics.
pub fn print_statistics(statistics: &Statistics) {
    if statistics.is_empty() {
        println!("{}", "No continuous columns.".dimmed());
        return;
    }

    let mut table = new_table(&["Column", "Mean", "Std", "Count", "Flag"]);
    for (column, stats) in statistics.iter() {
        let flag = stats
            .exceeds_threshold
            .map_or_else(|| Cell::new("-"), |mean| number_cell(mean).fg(Color::Yellow));
        table.add_row(vec![
            Cell::new(column),
            number_cell(stats.mean),
            number_cell(stats.std),
            Cell::new(stats.non_missing_count).set_alignment(CellAlignment::Right),
            flag,
        ]);
    }
    println!("{table}");
}

/// Prints label counts, one row per (column, label).
pub fn print_frequencies(frequencies: &FrequencyTable) {
    if frequencies.is_empty() {
        println!("{}", "No categorical columns.".dimmed());
        return;
    }

    let mut table = new_table(&["Column", "Label", "Count"]);
    for (column, counts) in frequencies.iter() {
        for (label, count) in counts {
            table.add_row(vec![
                Cell::new(column),
                Cell::new(label),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    println!("{table}");
}

/// Prints the size of each mean-split bucket.
pub fn print_partition(partition: &Partition) {
    let mut table = new_table(&["Column", "Mean", "Values"]);
    for (column, bucket) in partition {
        table.add_row(vec![
            Cell::new(column),
            number_cell(bucket.mean),
            Cell::new(bucket.values.len()).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

/// Prints the flagged column names.
pub fn print_flagged(flagged: &[String]) {
    if flagged.is_empty() {
        println!("{}", "No column exceeds the variance threshold.".dimmed());
        return;
    }
    for column in flagged {
        println!("  {} {}", "⚑".yellow(), column);
    }
}

/// Prints documents as a table, `_id` first then fields in first-seen order.
pub fn print_documents(docs: &[Document]) {
    if docs.is_empty() {
        println!("{}", "No results.".dimmed());
        return;
    }

    let mut columns: Vec<&str> = Vec::new();
    for doc in docs {
        for key in doc.body.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut header = vec!["_id"];
    header.extend(columns.iter().copied());
    let mut table = new_table(&header);

    for doc in docs {
        let mut cells = vec![Cell::new(doc.id.0)];
        cells.extend(columns.iter().map(|col| {
            Cell::new(match doc.body.get(*col) {
                Some(Value::String(s)) => s.clone(),
                None | Some(Value::Null) => "-".to_string(),
                Some(other) => other.to_string(),
            })
        }));
        table.add_row(cells);
    }

    println!("{table}");
    println!("{}", format!("{} document(s)", docs.len()).dimmed());
}

/// Prints documents in the requested format.
pub fn print_documents_as(docs: &[Document], format: FormatArg) -> anyhow::Result<()> {
    match format {
        FormatArg::Json => print_json(docs),
        FormatArg::Table => {
            print_documents(docs);
            Ok(())
        }
    }
}

/// Prints the missing/malformed cell counts of a schema check.
pub fn print_schema_report(report: &SchemaReport) {
    if report.is_clean() {
        println!("  {} all {} records complete", "✓".green(), report.records);
        return;
    }

    let mut table = new_table(&["Column", "Missing", "Malformed"]);
    for (column, found) in &report.columns {
        if found.missing == 0 && found.malformed == 0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(column),
            Cell::new(found.missing).set_alignment(CellAlignment::Right),
            Cell::new(found.malformed).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

/// Prints a full pipeline report.
pub fn print_report(report: &PipelineReport) {
    print_heading("Normalize");
    println!(
        "  {} document(s) with missing values, {} patched",
        report.normalize.missing_documents, report.normalize.patched
    );

    print_heading("Statistics");
    print_statistics(&report.statistics);

    print_heading("Frequencies");
    print_frequencies(&report.frequencies);

    print_heading("At or below mean");
    print_partition(&report.below_mean);

    print_heading("Above mean");
    print_partition(&report.above_mean);

    print_heading("Embedded copies");
    println!("  categories: {}", report.embedded_categories);
    println!("  statistics: {}", report.embedded_statistics);

    print_heading("High-variance columns");
    print_flagged(&report.flagged);

    if let Some(docs) = &report.query {
        print_heading("Query");
        print_documents(docs);
    }

    println!(
        "\n{} pipeline finished in {:.2}s",
        "✓".green().bold(),
        report.duration_secs
    );
}
