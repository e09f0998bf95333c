// Database schema: table creation and migrations.
//
// Mirrors the OEWG analysis database: three per-community stats tables (one
// per data source), the country table with its voting-community labels, and
// the transcript tables the per-country weights view is derived from.
//
// Count columns are declared without NOT NULL so loosely-typed imports
// (missing or textual counts) survive storage and get sanitised on load.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// The three item stats tables share one column set.
fn stats_table(name: &str, id_decl: &str, extra: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {name} (
            {id_decl},
            topic_short_description TEXT,
            ngram TEXT,
            count_A INTEGER DEFAULT 0,
            count_BCDE INTEGER DEFAULT 0,
            count_F INTEGER DEFAULT 0,
            count_G INTEGER DEFAULT 0,
            count_all_communities INTEGER DEFAULT 0{extra}
        );"
    )
}

/// Create all tables if they don't exist yet.
///
/// Idempotent; runs on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Key/value bookkeeping (last import time, source file)
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS country (
            id TEXT PRIMARY KEY,                        -- ISO 3-letter code
            merge_name TEXT,                            -- display name
            cpm_community_after_10_CPM_0_53 TEXT        -- voting community (A..G)
        );

        CREATE TABLE IF NOT EXISTS intervention (
            id INTEGER PRIMARY KEY,
            meeting TEXT,
            speaker TEXT,                               -- country id, or a non-state speaker
            speaker_type TEXT,
            speech TEXT
        );

        CREATE TABLE IF NOT EXISTS speech_sentence (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            intervention_id INTEGER NOT NULL REFERENCES intervention(id),
            sentence_full TEXT NOT NULL,
            sentence_cleaned TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS oewg_ngrams_to_use (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ngram TEXT NOT NULL,
            is_filtered_out INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS junc_sentence_id_to_ngram_id (
            sentence_id INTEGER NOT NULL REFERENCES speech_sentence(id),
            ngram_id INTEGER NOT NULL REFERENCES oewg_ngrams_to_use(id),
            PRIMARY KEY (sentence_id, ngram_id)
        );

        CREATE INDEX IF NOT EXISTS idx_junc_ngram
            ON junc_sentence_id_to_ngram_id(ngram_id);

        CREATE INDEX IF NOT EXISTS idx_sentence_intervention
            ON speech_sentence(intervention_id);
        ",
    )
    .context("Failed to create database tables")?;

    let stats = [
        stats_table("analysis_ngram_community_stats", "ngram_id INTEGER PRIMARY KEY", ""),
        stats_table(
            "analysis_ai_labelled_topic_community_stats",
            "topic_id TEXT PRIMARY KEY",
            "",
        ),
        stats_table(
            "analysis_bert_labelled_topic_community_stats",
            "topic_id INTEGER NOT NULL",
            ",\n            bert_model_id INTEGER NOT NULL,\n            PRIMARY KEY (topic_id, bert_model_id)",
        ),
    ];
    conn.execute_batch(&stats.join("\n"))
        .context("Failed to create community stats tables")?;

    // Distinct sentences per (country speaker, ngram). Non-country speakers
    // drop out through the join on `country`; Palestine (observer) and
    // filtered-out ngrams are excluded explicitly.
    conn.execute_batch(
        "
        CREATE VIEW IF NOT EXISTS vw_country_ngram_sentence_counts AS
        SELECT
            i.speaker AS country_speaker,
            j.ngram_id AS ngram_id,
            COUNT(DISTINCT j.sentence_id) AS count_sentences_for_ngram_by_country
        FROM junc_sentence_id_to_ngram_id j
        JOIN speech_sentence s ON s.id = j.sentence_id
        JOIN intervention i ON i.id = s.intervention_id
        JOIN country c ON c.id = i.speaker
        JOIN oewg_ngrams_to_use n ON n.id = j.ngram_id
        WHERE i.speaker <> 'PSE'
          AND COALESCE(n.is_filtered_out, 0) = 0
        GROUP BY i.speaker, j.ngram_id;
        ",
    )
    .context("Failed to create country weights view")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, app_state, country, intervention, speech_sentence,
        // oewg_ngrams_to_use, junc_sentence_id_to_ngram_id + 3 stats tables
        assert_eq!(table_count(&conn).unwrap(), 10i64);
    }

    #[test]
    fn test_view_exists() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let views: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='view'
                 AND name='vw_country_ngram_sentence_counts'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(views, 1);
    }

    #[test]
    fn test_counts_accept_loose_values() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO analysis_ngram_community_stats (ngram_id, ngram, count_A, count_G)
             VALUES (1, 'x', NULL, 'lots')",
            [],
        )
        .unwrap();
        let g: String = conn
            .query_row(
                "SELECT count_G FROM analysis_ngram_community_stats WHERE ngram_id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(g, "lots");
    }
}
