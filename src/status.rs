// System status display: database size, table row counts, last import.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, config: &Config) -> Result<()> {
    let db_display_path = config.db_path.as_str();
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    match db.get_app_state("last_import_at").await? {
        Some(at) => {
            let source = db.get_app_state("last_import_source").await?;
            println!(
                "Last import: {} ({})",
                at,
                source.as_deref().unwrap_or("unknown file")
            );
        }
        None => {
            println!("Last import: never");
            println!("  Run `oewg-ternary import <file.json>` to load data");
        }
    }

    println!("\n{}", "Tables:".bold());
    for (table, count) in db.table_counts().await? {
        let line = format!("  {:<48} {:>8}", table, count);
        if count == 0 {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }

    println!("\n{}", "Plots:".bold());
    println!(
        "  Item plot:     {}{}",
        config.item_plot.source,
        model_suffix(config.item_plot.model_id)
    );
    println!(
        "  Centroid plot: {}{} (default power {:.1})",
        config.centroid_plot.source,
        model_suffix(config.centroid_plot.model_id),
        config.centroid_plot.amplification_power
    );

    Ok(())
}

fn model_suffix(model_id: Option<i64>) -> String {
    model_id.map(|id| format!(", model {id}")).unwrap_or_default()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
