//! Run-scoped store of collected entities and relationships.
//!
//! Job State is additive-only: entities and relationships are appended in
//! the order steps produce them and never mutated or removed. It is owned by
//! the runner and lent mutably to one step handler at a time.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use cloudgraph_shared::{CloudGraphError, Entity, Relationship, Result};

/// Result of a best-effort relationship attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// One endpoint was never ingested; nothing was recorded.
    TargetNotFound,
}

/// Entity and relationship counts at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub entities: usize,
    pub relationships: usize,
}

#[derive(Debug, Default)]
pub struct JobState {
    entities: Vec<Entity>,
    by_key: HashMap<String, usize>,
    /// Lower-cased key → index, for ARM IDs that come back in mixed case.
    by_lower_key: HashMap<String, usize>,
    external_keys: HashSet<String>,
    relationships: Vec<Relationship>,
    relationship_keys: HashSet<String>,
    data: HashMap<String, Value>,
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    /// Store an entity. Keys are unique within a run.
    pub fn add_entity(&mut self, entity: Entity) -> Result<&Entity> {
        if self.by_key.contains_key(&entity.key) {
            return Err(CloudGraphError::validation(format!(
                "duplicate entity key: {}",
                entity.key
            )));
        }

        let index = self.entities.len();
        self.by_key.insert(entity.key.clone(), index);
        self.by_lower_key
            .entry(entity.key.to_lowercase())
            .or_insert(index);
        self.entities.push(entity);
        Ok(&self.entities[index])
    }

    /// Mark a key as a valid relationship endpoint without storing an entity
    /// for it (e.g. an entity owned by another integration).
    pub fn register_external_key(&mut self, key: impl Into<String>) {
        self.external_keys.insert(key.into());
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key) || self.external_keys.contains(key)
    }

    pub fn find_entity(&self, key: &str) -> Option<&Entity> {
        self.by_key.get(key).map(|&i| &self.entities[i])
    }

    /// Like [`find_entity`](Self::find_entity), ignoring ASCII case.
    pub fn find_entity_ignore_case(&self, key: &str) -> Option<&Entity> {
        self.find_entity(key).or_else(|| {
            self.by_lower_key
                .get(&key.to_lowercase())
                .map(|&i| &self.entities[i])
        })
    }

    /// Entities of one `_type`, in insertion order.
    pub fn iterate_entities<'a>(&'a self, entity_type: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }

    /// Typed projections of every entity of one `_type`.
    ///
    /// Entities that do not fit `T` are skipped with a warning.
    pub fn entities_of_type<T: DeserializeOwned>(&self, entity_type: &str) -> Vec<T> {
        self.iterate_entities(entity_type)
            .filter_map(|entity| match entity.project::<T>() {
                Ok(projection) => Some(projection),
                Err(e) => {
                    warn!(key = %entity.key, entity_type, error = %e, "entity does not match projection, skipping");
                    None
                }
            })
            .collect()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    // -----------------------------------------------------------------------
    // Relationships
    // -----------------------------------------------------------------------

    /// Store a relationship between two known keys.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<()> {
        if self.relationship_keys.contains(&relationship.key) {
            return Err(CloudGraphError::validation(format!(
                "duplicate relationship key: {}",
                relationship.key
            )));
        }
        for endpoint in [&relationship.from_key, &relationship.to_key] {
            if !self.has_key(endpoint) {
                return Err(CloudGraphError::validation(format!(
                    "relationship {} references unknown entity {endpoint}",
                    relationship.key
                )));
            }
        }

        self.relationship_keys.insert(relationship.key.clone());
        self.relationships.push(relationship);
        Ok(())
    }

    /// Store a relationship if both endpoints are known.
    ///
    /// A missing endpoint is not an error: the relationship is dropped and
    /// [`LinkOutcome::TargetNotFound`] returned. Duplicate keys still fail.
    pub fn link(&mut self, relationship: Relationship) -> Result<LinkOutcome> {
        if !self.has_key(&relationship.from_key) || !self.has_key(&relationship.to_key) {
            debug!(
                from = %relationship.from_key,
                to = %relationship.to_key,
                rel_type = %relationship.rel_type,
                "link target not found, skipping"
            );
            return Ok(LinkOutcome::TargetNotFound);
        }
        self.add_relationship(relationship)?;
        Ok(LinkOutcome::Linked)
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    // -----------------------------------------------------------------------
    // Side-channel
    // -----------------------------------------------------------------------

    pub fn set_data<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| CloudGraphError::parse(format!("job data {key}: {e}")))?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get_data<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.data
            .get(key)
            .map(|value| {
                T::deserialize(value)
                    .map_err(|e| CloudGraphError::parse(format!("job data {key}: {e}")))
            })
            .transpose()
    }

    // -----------------------------------------------------------------------
    // Attribution
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entities: self.entities.len(),
            relationships: self.relationships.len(),
        }
    }

    /// Entities added since `snapshot` was taken.
    pub fn entities_since(&self, snapshot: Snapshot) -> &[Entity] {
        &self.entities[snapshot.entities.min(self.entities.len())..]
    }

    /// Relationships added since `snapshot` was taken.
    pub fn relationships_since(&self, snapshot: Snapshot) -> &[Relationship] {
        &self.relationships[snapshot.relationships.min(self.relationships.len())..]
    }

    /// Hand the collected graph over for persistence.
    pub fn into_parts(self) -> (Vec<Entity>, Vec<Relationship>) {
        (self.entities, self.relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudgraph_shared::{EntitySchema, RelationshipClass};
    use serde::Deserialize;

    const GROUP: EntitySchema = EntitySchema {
        resource_name: "[RM] Resource Group",
        entity_type: "azure_resource_group",
        class: &["Group"],
    };
    const VAULT: EntitySchema = EntitySchema {
        resource_name: "[RM] Key Vault",
        entity_type: "azure_keyvault_service",
        class: &["Service"],
    };

    #[derive(Debug, Deserialize, PartialEq)]
    struct GroupRef {
        id: String,
        name: String,
    }

    fn group(name: &str) -> Entity {
        let id = format!("/subscriptions/s/resourceGroups/{name}");
        Entity::new(id.clone(), &GROUP)
            .with("id", id)
            .with("name", name)
    }

    #[test]
    fn rejects_duplicate_entity_keys() {
        let mut state = JobState::new();
        state.add_entity(group("a")).unwrap();
        let err = state.add_entity(group("a")).unwrap_err();
        assert!(err.to_string().contains("duplicate entity key"));
        assert_eq!(state.entities().len(), 1);
    }

    #[test]
    fn finds_entities_ignoring_case() {
        let mut state = JobState::new();
        state.add_entity(group("J1Dev")).unwrap();
        assert!(state.find_entity("/subscriptions/s/resourcegroups/j1dev").is_none());
        assert!(
            state
                .find_entity_ignore_case("/subscriptions/s/resourcegroups/j1dev")
                .is_some()
        );
    }

    #[test]
    fn relationship_endpoints_must_exist() {
        let mut state = JobState::new();
        let rg = state.add_entity(group("a")).unwrap().clone();
        let vault = Entity::new("vault", &VAULT);

        let rel = Relationship::between(RelationshipClass::Has, &rg, &vault);
        assert!(state.add_relationship(rel.clone()).is_err());

        state.add_entity(vault).unwrap();
        state.add_relationship(rel.clone()).unwrap();
        let err = state.add_relationship(rel).unwrap_err();
        assert!(err.to_string().contains("duplicate relationship key"));
    }

    #[test]
    fn external_keys_are_valid_endpoints() {
        let mut state = JobState::new();
        let vault = state.add_entity(Entity::new("vault", &VAULT)).unwrap().clone();
        state.register_external_key("azure_account_id");

        let rel = Relationship::new(
            RelationshipClass::Has,
            "azure_account_id",
            "azure_account",
            &vault.key,
            &vault.entity_type,
        );
        state.add_relationship(rel).unwrap();
        assert_eq!(state.relationships().len(), 1);
    }

    #[test]
    fn link_reports_missing_target() {
        let mut state = JobState::new();
        let rg = state.add_entity(group("a")).unwrap().clone();
        let missing = Relationship::new(
            RelationshipClass::Has,
            &rg.key,
            &rg.entity_type,
            "not-ingested",
            "azure_keyvault_service",
        );

        assert_eq!(state.link(missing).unwrap(), LinkOutcome::TargetNotFound);
        assert!(state.relationships().is_empty());

        let vault = state.add_entity(Entity::new("vault", &VAULT)).unwrap().clone();
        let rel = Relationship::between(RelationshipClass::Has, &rg, &vault);
        assert_eq!(state.link(rel).unwrap(), LinkOutcome::Linked);
    }

    #[test]
    fn typed_projection_skips_misfits() {
        let mut state = JobState::new();
        state.add_entity(group("a")).unwrap();
        state.add_entity(Entity::new("no-name", &GROUP)).unwrap();
        state.add_entity(group("b")).unwrap();

        let refs: Vec<GroupRef> = state.entities_of_type("azure_resource_group");
        assert_eq!(
            refs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(refs[0].id, "/subscriptions/s/resourceGroups/a");
    }

    #[test]
    fn side_channel_roundtrip() {
        let mut state = JobState::new();
        assert_eq!(state.get_data::<Entity>("azure_account").unwrap(), None);

        let account = Entity::new("acct", &GROUP).with("defaultDomain", "contoso.com");
        state.set_data("azure_account", &account).unwrap();
        let loaded: Entity = state.get_data("azure_account").unwrap().unwrap();
        assert_eq!(loaded, account);
    }

    #[test]
    fn snapshot_attributes_additions() {
        let mut state = JobState::new();
        state.add_entity(group("a")).unwrap();
        let snapshot = state.snapshot();
        state.add_entity(group("b")).unwrap();

        let added = state.entities_since(snapshot);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].str_property("name"), Some("b"));
        assert!(state.relationships_since(snapshot).is_empty());
    }
}
