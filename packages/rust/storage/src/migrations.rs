//! SQL migration definitions for the cloudgraph database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: runs, entities, relationships, step_results",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per ingestion run
CREATE TABLE IF NOT EXISTS runs (
    id          TEXT PRIMARY KEY,
    instance_id TEXT NOT NULL,
    started_at  TEXT NOT NULL,
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_instance ON runs(instance_id);

-- Entities collected during a run
CREATE TABLE IF NOT EXISTS entities (
    run_id     TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    key        TEXT NOT NULL,
    type       TEXT NOT NULL,
    class_json TEXT NOT NULL,
    data_json  TEXT NOT NULL,
    PRIMARY KEY (run_id, key)
);

CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(run_id, type);

-- Relationships collected during a run
CREATE TABLE IF NOT EXISTS relationships (
    run_id    TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    key       TEXT NOT NULL,
    type      TEXT NOT NULL,
    class     TEXT NOT NULL,
    from_key  TEXT NOT NULL,
    to_key    TEXT NOT NULL,
    data_json TEXT NOT NULL,
    PRIMARY KEY (run_id, key)
);

CREATE INDEX IF NOT EXISTS idx_relationships_from ON relationships(run_id, from_key);
CREATE INDEX IF NOT EXISTS idx_relationships_to ON relationships(run_id, to_key);

-- Per-step outcome of a run, in execution order
CREATE TABLE IF NOT EXISTS step_results (
    run_id        TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    position      INTEGER NOT NULL,
    step_id       TEXT NOT NULL,
    status        TEXT NOT NULL,
    entities      INTEGER NOT NULL,
    relationships INTEGER NOT NULL,
    duration_ms   INTEGER,
    detail        TEXT,
    PRIMARY KEY (run_id, step_id)
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
