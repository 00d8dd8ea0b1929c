use std::{collections::HashMap, sync::{RwLock, RwLockReadGuard, RwLockWriteGuard}};

use serde_json::Value;

use crate::entity_type::EntityType;
use crate::row::cell_text;

/// The identifier the remote service assigns to a created object, normally its URL.
pub type RemoteId = String;

/// What [`ReferenceRegistry::resolve_list`] does with keys that have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentPolicy {
    /// Keep a `None` in place, so the output lines up with the input keys.
    Keep,
    Drop,
}

/// A human key narrowed down by the identifier of a related object, e.g. a
/// team reference together with its institution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedKey {
    pub key: String,
    pub qualifier: RemoteId,
}

impl QualifiedKey {
    pub fn new(key: &str, qualifier: &str) -> Self {
        QualifiedKey {
            key: key.trim().to_string(),
            qualifier: qualifier.trim().to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Entries {
    plain: HashMap<EntityType, HashMap<String, RemoteId>>,
    qualified: HashMap<EntityType, HashMap<QualifiedKey, RemoteId>>,
}

/// Maps human keys (names, codes, slugs) to the remote identifiers of the
/// objects created for them, per entity type.
///
/// An entry exists only once the remote service has acknowledged the object.
/// Registration may happen from several submission tasks at once; a key
/// written twice keeps the last identifier. Keys that are not unique on their
/// own can also be registered with a qualifier, which keeps every object
/// reachable.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    entries: RwLock<Entries>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register(
        &self,
        entity_type: EntityType,
        key: impl Into<String>,
        id: impl Into<RemoteId>,
    ) {
        let key: String = key.into();
        self.write()
            .plain
            .entry(entity_type)
            .or_default()
            .insert(key.trim().to_string(), id.into());
    }

    pub fn register_qualified(
        &self,
        entity_type: EntityType,
        key: QualifiedKey,
        id: impl Into<RemoteId>,
    ) {
        self.write()
            .qualified
            .entry(entity_type)
            .or_default()
            .insert(key, id.into());
    }

    pub fn resolve(&self, entity_type: EntityType, key: &str) -> Option<RemoteId> {
        self.read()
            .plain
            .get(&entity_type)
            .and_then(|keys| keys.get(key.trim()))
            .cloned()
    }

    pub fn resolve_qualified(
        &self,
        entity_type: EntityType,
        key: &QualifiedKey,
    ) -> Option<RemoteId> {
        self.read()
            .qualified
            .get(&entity_type)
            .and_then(|keys| keys.get(key))
            .cloned()
    }

    pub fn resolve_cell(&self, entity_type: EntityType, cell: Option<&Value>) -> Option<RemoteId> {
        cell.and_then(cell_text)
            .and_then(|key| self.resolve(entity_type, &key))
    }

    /// Resolves a `;`-separated list of keys in order. Blank input gives an
    /// empty list.
    pub fn resolve_list(
        &self,
        entity_type: EntityType,
        keys: &str,
        policy: AbsentPolicy,
    ) -> Vec<Option<RemoteId>> {
        if keys.trim().is_empty() {
            return vec![];
        }

        let entries = self.read();
        let known = entries.plain.get(&entity_type);
        keys.split(';')
            .map(|key| known.and_then(|k| k.get(key.trim())).cloned())
            .filter(|id| policy == AbsentPolicy::Keep || id.is_some())
            .collect()
    }

    pub fn resolve_list_cell(
        &self,
        entity_type: EntityType,
        cell: Option<&Value>,
        policy: AbsentPolicy,
    ) -> Vec<Option<RemoteId>> {
        match cell.and_then(cell_text) {
            Some(keys) => self.resolve_list(entity_type, &keys, policy),
            None => vec![],
        }
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.read().plain.get(&entity_type).map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        let entries = self.read();
        entries.plain.values().all(|keys| keys.is_empty())
            && entries.qualified.values().all(|keys| keys.is_empty())
    }
}
