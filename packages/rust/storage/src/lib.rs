//! Turso Embedded / libSQL storage layer (offline mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding finished ingestion
//! runs: the entities and relationships collected, plus per-step outcomes.
//!
//! **Access rules:**
//! - `cloudgraph run`: read-write (sole writer) via [`Storage::open`]
//! - Reporting and inspection: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use cloudgraph_shared::{CloudGraphError, Entity, Relationship, Result, RunId, RunRecord, StepRecord};
use libsql::{Connection, Database, params};
use tracing::debug;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

fn storage_err(e: impl std::fmt::Display) -> CloudGraphError {
    CloudGraphError::Storage(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CloudGraphError::Storage(format!("invalid timestamp {value:?}: {e}")))
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CloudGraphError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CloudGraphError::Storage(format!(
                "database not found: {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        CloudGraphError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CloudGraphError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    /// Record the start of a run.
    pub async fn insert_run(&self, run: &RunRecord) -> Result<()> {
        self.check_writable()?;
        let finished_at = run.finished_at.map(|t| t.to_rfc3339());
        self.conn
            .execute(
                "INSERT INTO runs (id, instance_id, started_at, finished_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run.id.to_string(),
                    run.instance_id.as_str(),
                    run.started_at.to_rfc3339(),
                    finished_at
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Stamp a run as finished now.
    pub async fn finish_run(&self, run_id: &RunId) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let updated = self
            .conn
            .execute(
                "UPDATE runs SET finished_at = ?1 WHERE id = ?2",
                params![now, run_id.to_string()],
            )
            .await
            .map_err(storage_err)?;

        if updated == 0 {
            return Err(CloudGraphError::Storage(format!("unknown run {run_id}")));
        }
        Ok(())
    }

    /// Get a run by ID.
    pub async fn get_run(&self, run_id: &RunId) -> Result<Option<RunRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, instance_id, started_at, finished_at FROM runs WHERE id = ?1",
                params![run_id.to_string()],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_run(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Runs of an instance, newest first.
    pub async fn list_runs(&self, instance_id: &str) -> Result<Vec<RunRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, instance_id, started_at, finished_at FROM runs
                 WHERE instance_id = ?1 ORDER BY started_at DESC",
                params![instance_id],
            )
            .await
            .map_err(storage_err)?;

        let mut runs = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            runs.push(row_to_run(&row)?);
        }
        Ok(runs)
    }

    // -----------------------------------------------------------------------
    // Graph data
    // -----------------------------------------------------------------------

    /// Insert a batch of entities in one transaction.
    pub async fn insert_entities(&self, run_id: &RunId, entities: &[Entity]) -> Result<usize> {
        self.check_writable()?;
        let run = run_id.to_string();
        let tx = self.conn.transaction().await.map_err(storage_err)?;

        for entity in entities {
            let class_json = serde_json::to_string(&entity.class)
                .map_err(|e| CloudGraphError::Storage(format!("{}: {e}", entity.key)))?;
            let data_json = serde_json::to_string(entity)
                .map_err(|e| CloudGraphError::Storage(format!("{}: {e}", entity.key)))?;
            tx.execute(
                "INSERT INTO entities (run_id, key, type, class_json, data_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run.as_str(),
                    entity.key.as_str(),
                    entity.entity_type.as_str(),
                    class_json,
                    data_json
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        debug!(run_id = %run_id, count = entities.len(), "stored entities");
        Ok(entities.len())
    }

    /// Insert a batch of relationships in one transaction.
    pub async fn insert_relationships(
        &self,
        run_id: &RunId,
        relationships: &[Relationship],
    ) -> Result<usize> {
        self.check_writable()?;
        let run = run_id.to_string();
        let tx = self.conn.transaction().await.map_err(storage_err)?;

        for rel in relationships {
            let data_json = serde_json::to_string(rel)
                .map_err(|e| CloudGraphError::Storage(format!("{}: {e}", rel.key)))?;
            tx.execute(
                "INSERT INTO relationships (run_id, key, type, class, from_key, to_key, data_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    run.as_str(),
                    rel.key.as_str(),
                    rel.rel_type.as_str(),
                    rel.class.as_str(),
                    rel.from_key.as_str(),
                    rel.to_key.as_str(),
                    data_json
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        debug!(run_id = %run_id, count = relationships.len(), "stored relationships");
        Ok(relationships.len())
    }

    /// Entities of one `_type` in a run, ordered by key.
    pub async fn list_entities_by_type(&self, run_id: &RunId, entity_type: &str) -> Result<Vec<Entity>> {
        let mut rows = self
            .conn
            .query(
                "SELECT data_json FROM entities WHERE run_id = ?1 AND type = ?2 ORDER BY key",
                params![run_id.to_string(), entity_type],
            )
            .await
            .map_err(storage_err)?;

        let mut entities = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let data: String = row.get(0).map_err(storage_err)?;
            entities.push(serde_json::from_str(&data).map_err(storage_err)?);
        }
        Ok(entities)
    }

    /// Relationships leaving `from_key` in a run.
    pub async fn list_relationships_from(&self, run_id: &RunId, from_key: &str) -> Result<Vec<Relationship>> {
        let mut rows = self
            .conn
            .query(
                "SELECT data_json FROM relationships WHERE run_id = ?1 AND from_key = ?2 ORDER BY key",
                params![run_id.to_string(), from_key],
            )
            .await
            .map_err(storage_err)?;

        let mut relationships = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let data: String = row.get(0).map_err(storage_err)?;
            relationships.push(serde_json::from_str(&data).map_err(storage_err)?);
        }
        Ok(relationships)
    }

    pub async fn count_entities(&self, run_id: &RunId) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM entities WHERE run_id = ?1", run_id)
            .await
    }

    pub async fn count_relationships(&self, run_id: &RunId) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM relationships WHERE run_id = ?1", run_id)
            .await
    }

    async fn count(&self, sql: &str, run_id: &RunId) -> Result<u64> {
        let mut rows = self
            .conn
            .query(sql, params![run_id.to_string()])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => row.get::<u64>(0).map_err(storage_err),
            Ok(None) => Ok(0),
            Err(e) => Err(storage_err(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Step results
    // -----------------------------------------------------------------------

    /// Record one step outcome. `position` is the step's index in the plan.
    pub async fn insert_step_result(&self, run_id: &RunId, position: usize, record: &StepRecord) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO step_results
                    (run_id, position, step_id, status, entities, relationships, duration_ms, detail)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    run_id.to_string(),
                    position as i64,
                    record.step_id.as_str(),
                    record.status.as_str(),
                    record.entities as i64,
                    record.relationships as i64,
                    record.duration_ms.map(|d| d as i64),
                    record.detail.clone()
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Step outcomes of a run, in execution order.
    pub async fn list_step_results(&self, run_id: &RunId) -> Result<Vec<StepRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT step_id, status, entities, relationships, duration_ms, detail
                 FROM step_results WHERE run_id = ?1 ORDER BY position",
                params![run_id.to_string()],
            )
            .await
            .map_err(storage_err)?;

        let mut records = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            records.push(StepRecord {
                step_id: row.get::<String>(0).map_err(storage_err)?,
                status: row.get::<String>(1).map_err(storage_err)?,
                entities: row.get::<u64>(2).map_err(storage_err)? as usize,
                relationships: row.get::<u64>(3).map_err(storage_err)? as usize,
                duration_ms: row.get::<Option<u64>>(4).map_err(storage_err)?,
                detail: row.get::<Option<String>>(5).map_err(storage_err)?,
            });
        }
        Ok(records)
    }
}

fn row_to_run(row: &libsql::Row) -> Result<RunRecord> {
    let id: String = row.get(0).map_err(storage_err)?;
    let started_at: String = row.get(2).map_err(storage_err)?;
    let finished_at: Option<String> = row.get(3).map_err(storage_err)?;

    Ok(RunRecord {
        id: id
            .parse()
            .map_err(|e| CloudGraphError::Storage(format!("invalid run id {id:?}: {e}")))?,
        instance_id: row.get(1).map_err(storage_err)?,
        started_at: parse_timestamp(&started_at)?,
        finished_at: finished_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudgraph_shared::{EntitySchema, RelationshipClass};
    use uuid::Uuid;

    const VAULT: EntitySchema = EntitySchema {
        resource_name: "[RM] Key Vault",
        entity_type: "azure_keyvault_service",
        class: &["Service"],
    };

    const RESOURCE_GROUP: EntitySchema = EntitySchema {
        resource_name: "[RM] Resource Group",
        entity_type: "azure_resource_group",
        class: &["Group"],
    };

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("cg_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    async fn started_run(storage: &Storage) -> RunId {
        let run = RunRecord {
            id: RunId::new(),
            instance_id: "instance".into(),
            started_at: Utc::now(),
            finished_at: None,
        };
        storage.insert_run(&run).await.expect("insert run");
        run.id
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("cg_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn run_lifecycle() {
        let storage = test_storage().await;
        let run_id = started_run(&storage).await;

        let run = storage.get_run(&run_id).await.unwrap().unwrap();
        assert_eq!(run.instance_id, "instance");
        assert!(run.finished_at.is_none());

        storage.finish_run(&run_id).await.expect("finish run");
        let run = storage.get_run(&run_id).await.unwrap().unwrap();
        assert!(run.finished_at.is_some());

        let runs = storage.list_runs("instance").await.unwrap();
        assert_eq!(runs.len(), 1);

        assert!(storage.finish_run(&RunId::new()).await.is_err());
    }

    #[tokio::test]
    async fn entities_and_relationships_roundtrip() {
        let storage = test_storage().await;
        let run_id = started_run(&storage).await;

        let group = Entity::new("/subscriptions/s/resourceGroups/j1dev", &RESOURCE_GROUP)
            .with("name", "j1dev");
        let vault = Entity::new(
            "/subscriptions/s/resourceGroups/j1dev/providers/Microsoft.KeyVault/vaults/v1",
            &VAULT,
        )
        .with("displayName", "v1")
        .with("endpoints", vec!["https://v1.vault.azure.net/"]);
        let rel = Relationship::between(RelationshipClass::Has, &group, &vault);

        storage
            .insert_entities(&run_id, &[group.clone(), vault.clone()])
            .await
            .expect("insert entities");
        storage
            .insert_relationships(&run_id, std::slice::from_ref(&rel))
            .await
            .expect("insert relationships");

        assert_eq!(storage.count_entities(&run_id).await.unwrap(), 2);
        assert_eq!(storage.count_relationships(&run_id).await.unwrap(), 1);

        let vaults = storage
            .list_entities_by_type(&run_id, "azure_keyvault_service")
            .await
            .unwrap();
        assert_eq!(vaults, vec![vault]);

        let from_group = storage
            .list_relationships_from(&run_id, &group.key)
            .await
            .unwrap();
        assert_eq!(from_group, vec![rel]);
    }

    #[tokio::test]
    async fn duplicate_entity_key_in_run_is_rejected() {
        let storage = test_storage().await;
        let run_id = started_run(&storage).await;
        let vault = Entity::new("vault-1", &VAULT);

        let result = storage
            .insert_entities(&run_id, &[vault.clone(), vault])
            .await;
        assert!(result.is_err());
        assert_eq!(storage.count_entities(&run_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn step_results_keep_execution_order() {
        let storage = test_storage().await;
        let run_id = started_run(&storage).await;

        let records = [
            StepRecord {
                step_id: "ad-account".into(),
                status: "success".into(),
                entities: 1,
                relationships: 0,
                duration_ms: Some(5),
                detail: None,
            },
            StepRecord {
                step_id: "ad-users".into(),
                status: "skipped".into(),
                entities: 0,
                relationships: 0,
                duration_ms: None,
                detail: Some("ad-account".into()),
            },
        ];
        for (position, record) in records.iter().enumerate() {
            storage
                .insert_step_result(&run_id, position, record)
                .await
                .expect("insert step result");
        }

        let stored = storage.list_step_results(&run_id).await.unwrap();
        assert_eq!(stored, records.to_vec());
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("cg_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        let run_id = started_run(&rw).await;
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert!(ro.get_run(&run_id).await.unwrap().is_some());

        let result = ro.finish_run(&run_id).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_database() {
        let tmp = std::env::temp_dir().join(format!("cg_missing_{}.db", Uuid::now_v7()));
        assert!(Storage::open_readonly(&tmp).await.is_err());
    }
}
