use serde_json::{Map, Value};

use crate::entity_type::EntityType;
use crate::registry::{ReferenceRegistry, RemoteId};
use crate::row::Row;

use super::{Payload, RowTransformer, TransformResult};

/// A patch adding one conflict to the `field` list of the resolved owner.
fn conflict_patch(
    owner: Option<RemoteId>,
    field: &str,
    conflict: Option<RemoteId>,
) -> TransformResult {
    let conflict = conflict.map(Value::String).unwrap_or(Value::Null);
    let mut body = Map::new();
    body.insert(field.to_string(), Value::Array(vec![conflict]));
    Payload::patch(owner, &body)
}

pub struct TeamConflictTransformer;

impl RowTransformer for TeamConflictTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        conflict_patch(
            registry.resolve_cell(EntityType::Adjudicators, row.get("adjudicator")),
            "team_conflicts",
            registry.resolve_cell(EntityType::Teams, row.get("team")),
        )
    }
}

pub struct InstitutionConflictTransformer;

impl RowTransformer for InstitutionConflictTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        conflict_patch(
            registry.resolve_cell(EntityType::Adjudicators, row.get("adjudicator")),
            "institution_conflicts",
            registry.resolve_cell(EntityType::Institutions, row.get("institution")),
        )
    }
}

pub struct AdjudicatorConflictTransformer;

impl RowTransformer for AdjudicatorConflictTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        conflict_patch(
            registry.resolve_cell(EntityType::Adjudicators, row.get("adjudicator1")),
            "adjudicator_conflicts",
            registry.resolve_cell(EntityType::Adjudicators, row.get("adjudicator2")),
        )
    }
}

pub struct TeamInstitutionConflictTransformer;

impl RowTransformer for TeamInstitutionConflictTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        conflict_patch(
            registry.resolve_cell(EntityType::Teams, row.get("team")),
            "institution_conflicts",
            registry.resolve_cell(EntityType::Institutions, row.get("institution")),
        )
    }
}
