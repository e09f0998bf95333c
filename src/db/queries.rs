// Database queries: loaders for the analysis tables and the JSON import.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
//
// Loaders convert join keys to the data source's declared KeyKind here, at
// the boundary, so the ternary pipeline never has to guess key types.

use anyhow::{Context, Result};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::models::{
    CategoryInfo, CategoryWeight, Cell, Dataset, ImportSummary, ItemRecord, KeyKind, StatsRow,
};
use crate::config::{DataSource, SourceLayout};

// --- App state ---

/// Get an app state value by key (e.g., "last_import_at").
pub fn get_app_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM app_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set an app state value (upsert).
pub fn set_app_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Cell conversion ---

fn cell_from(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(v) => Cell::Int(v),
        ValueRef::Real(v) => Cell::Real(v),
        ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Cell::Null,
    }
}

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Int(v) => Value::Integer(*v),
        Cell::Real(v) => Value::Real(*v),
        Cell::Text(s) => Value::Text(s.clone()),
    }
}

fn cell_text(cell: Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Int(v) => v.to_string(),
        Cell::Real(v) => v.to_string(),
        Cell::Text(s) => s,
    }
}

// --- Loaders ---

/// Load every item of a data source, optionally restricted to one model run.
///
/// Rows whose id cannot be converted to the source's key kind are dropped.
pub fn load_items(
    conn: &Connection,
    source: DataSource,
    model_id: Option<i64>,
) -> Result<Vec<ItemRecord>> {
    let layout = source.layout();
    let columns = SourceLayout::NUMERIC_COLUMNS.join(", ");
    let filter = match (layout.model_id_column, model_id) {
        (Some(col), Some(_)) => format!(" WHERE {col} = ?1"),
        (None, Some(id)) => {
            warn!(source = %source, model_id = id, "Source has no model id column, ignoring model filter");
            String::new()
        }
        _ => String::new(),
    };
    let sql = format!(
        "SELECT {id}, {label}, {columns} FROM {table}{filter} ORDER BY rowid",
        id = layout.id_column,
        label = layout.label_column,
        table = layout.table,
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to query {}", layout.table))?;

    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(Cell, Cell, Vec<Cell>)> {
        let id = cell_from(row.get_ref(0)?);
        let label = cell_from(row.get_ref(1)?);
        let mut counts = Vec::with_capacity(SourceLayout::NUMERIC_COLUMNS.len());
        for i in 0..SourceLayout::NUMERIC_COLUMNS.len() {
            counts.push(cell_from(row.get_ref(i + 2)?));
        }
        Ok((id, label, counts))
    };

    let raw: Vec<(Cell, Cell, Vec<Cell>)> = if layout.model_id_column.is_some() && model_id.is_some() {
        stmt.query_map(params![model_id], map_row)?
            .collect::<rusqlite::Result<_>>()?
    } else {
        stmt.query_map([], map_row)?.collect::<rusqlite::Result<_>>()?
    };

    let mut dropped = 0usize;
    let items: Vec<ItemRecord> = raw
        .into_iter()
        .filter_map(|(id, label, counts)| {
            let Some(key) = layout.key_kind.coerce(&id) else {
                dropped += 1;
                return None;
            };
            let mut record = ItemRecord::new(key, cell_text(label));
            for (name, value) in SourceLayout::NUMERIC_COLUMNS.iter().zip(counts) {
                record.columns.insert(name.to_string(), value);
            }
            Some(record)
        })
        .collect();

    if dropped > 0 {
        warn!(source = %source, dropped, "Dropped items whose id does not match the declared key kind");
    }
    info!(source = %source, items = items.len(), "Loaded items");
    Ok(items)
}

/// Load per-country item weights for a data source.
///
/// Only n-grams have a weights view; other sources yield an empty table.
pub fn load_category_weights(conn: &Connection, source: DataSource) -> Result<Vec<CategoryWeight>> {
    let layout = source.layout();
    if !layout.has_category_weights {
        info!(source = %source, "No per-country weights for this source");
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT country_speaker, ngram_id, count_sentences_for_ngram_by_country
         FROM vw_country_ngram_sentence_counts
         ORDER BY country_speaker, ngram_id",
    )?;
    let raw: Vec<(Cell, Cell, Cell)> = stmt
        .query_map([], |row| {
            Ok((
                cell_from(row.get_ref(0)?),
                cell_from(row.get_ref(1)?),
                cell_from(row.get_ref(2)?),
            ))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let weights: Vec<CategoryWeight> = raw
        .into_iter()
        .filter_map(|(country, item, weight)| {
            Some(CategoryWeight {
                item_id: layout.key_kind.coerce(&item)?,
                category_id: KeyKind::Text.coerce(&country)?,
                weight: weight.as_number().unwrap_or(0.0),
            })
        })
        .collect();

    info!(weights = weights.len(), "Loaded country weights");
    Ok(weights)
}

/// Load country metadata: display name and voting community.
pub fn load_category_info(conn: &Connection) -> Result<Vec<CategoryInfo>> {
    let mut stmt = conn.prepare(
        "SELECT id, merge_name, cpm_community_after_10_CPM_0_53 FROM country ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            cell_from(row.get_ref(0)?),
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut info = Vec::new();
    for row in rows {
        let (id, name, grouping) = row?;
        if let Some(id) = KeyKind::Text.coerce(&id) {
            info.push(CategoryInfo { id, name, grouping });
        }
    }
    info!(countries = info.len(), "Loaded country info");
    Ok(info)
}

/// Row counts for the main tables, for status display.
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let tables = [
        DataSource::Ngrams.layout().table,
        DataSource::Ai.layout().table,
        DataSource::Bert.layout().table,
        "country",
        "intervention",
        "speech_sentence",
        "junc_sentence_id_to_ngram_id",
    ];
    tables
        .into_iter()
        .map(|table| -> Result<(&'static str, i64)> {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok((table, count))
        })
        .collect()
}

// --- Import ---

fn insert_stats(
    tx: &rusqlite::Transaction<'_>,
    source: DataSource,
    rows: &[StatsRow],
    progress: &dyn Fn(u64),
) -> Result<usize> {
    let layout = source.layout();
    let mut columns = vec![layout.id_column, layout.label_column];
    if let Some(model_col) = layout.model_id_column {
        columns.push(model_col);
    }
    columns.extend(SourceLayout::NUMERIC_COLUMNS);
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        layout.table,
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut stmt = tx.prepare(&sql)?;
    for row in rows {
        let mut values = vec![
            cell_value(&row.id),
            row.label.clone().map(Value::Text).unwrap_or(Value::Null),
        ];
        if layout.model_id_column.is_some() {
            let Some(model_id) = row.model_id else {
                anyhow::bail!("{} row {:?} is missing model_id", source, row.id);
            };
            values.push(Value::Integer(model_id));
        }
        for name in SourceLayout::NUMERIC_COLUMNS {
            values.push(row.counts.get(name).map(cell_value).unwrap_or(Value::Null));
        }
        for extra in row.counts.keys().filter(|k| !SourceLayout::NUMERIC_COLUMNS.contains(&k.as_str())) {
            debug!(source = %source, column = %extra, "Ignoring unknown import column");
        }
        stmt.execute(rusqlite::params_from_iter(values))?;
        progress(1);
    }
    Ok(rows.len())
}

/// Bulk-insert a dataset inside a single transaction.
///
/// Existing rows with the same primary key are replaced. `progress` is
/// called once per inserted row.
pub fn import_dataset(
    conn: &mut Connection,
    dataset: &Dataset,
    progress: &dyn Fn(u64),
) -> Result<ImportSummary> {
    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();

    for (source, rows) in [
        (DataSource::Ngrams, &dataset.ngrams),
        (DataSource::Ai, &dataset.ai_topics),
        (DataSource::Bert, &dataset.bert_topics),
    ] {
        let n = insert_stats(&tx, source, rows, progress)
            .with_context(|| format!("Failed to import {source} stats"))?;
        summary.tables.push((source.layout().table, n));
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO country (id, merge_name, cpm_community_after_10_CPM_0_53)
             VALUES (?1, ?2, ?3)",
        )?;
        for c in &dataset.countries {
            stmt.execute(params![c.id, c.name, c.community])?;
            progress(1);
        }
        summary.tables.push(("country", dataset.countries.len()));
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO intervention (id, meeting, speaker, speaker_type, speech)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for i in &dataset.interventions {
            stmt.execute(params![i.id, i.meeting, i.speaker, i.speaker_type, i.speech])?;
            progress(1);
        }
        summary.tables.push(("intervention", dataset.interventions.len()));
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO speech_sentence (id, intervention_id, sentence_full, sentence_cleaned)
             VALUES (?1, ?2, ?3, lower(?3))",
        )?;
        for s in &dataset.sentences {
            stmt.execute(params![s.id, s.intervention_id, s.text])?;
            progress(1);
        }
        summary.tables.push(("speech_sentence", dataset.sentences.len()));
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO oewg_ngrams_to_use (id, ngram, is_filtered_out)
             VALUES (?1, ?2, ?3)",
        )?;
        for n in &dataset.ngrams_to_use {
            stmt.execute(params![n.id, n.ngram, n.is_filtered_out])?;
            progress(1);
        }
        summary.tables.push(("oewg_ngrams_to_use", dataset.ngrams_to_use.len()));
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO junc_sentence_id_to_ngram_id (sentence_id, ngram_id)
             VALUES (?1, ?2)",
        )?;
        for j in &dataset.sentence_ngrams {
            stmt.execute(params![j.sentence_id, j.ngram_id])?;
            progress(1);
        }
        summary
            .tables
            .push(("junc_sentence_id_to_ngram_id", dataset.sentence_ngrams.len()));
    }

    tx.commit().context("Failed to commit import")?;
    info!(rows = summary.total(), "Imported dataset");
    Ok(summary)
}
