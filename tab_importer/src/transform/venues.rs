use serde::Serialize;
use serde_json::Value;

use crate::entity_type::EntityType;
use crate::normalize::{VenueNameDisplay, VENUE_NAME_DISPLAYS};
use crate::registry::{AbsentPolicy, ReferenceRegistry, RemoteId};
use crate::row::Row;

use super::{Payload, RowTransformer, TransformResult};

#[derive(Debug, Serialize)]
struct VenueCategoryBody {
    #[serde(flatten)]
    columns: Row,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_in_venue_name: Option<VenueNameDisplay>,
    venues: Vec<RemoteId>,
}

#[derive(Debug, Serialize)]
struct VenueBody {
    #[serde(flatten)]
    columns: Row,
    categories: Vec<Option<RemoteId>>,
}

#[derive(Debug, Serialize)]
struct VenueConstraint {
    category: Option<RemoteId>,
    priority: Option<Value>,
}

#[derive(Debug, Serialize)]
struct VenueConstraintPatch {
    venue_constraints: Vec<VenueConstraint>,
}

pub struct VenueCategoryTransformer;

impl RowTransformer for VenueCategoryTransformer {
    fn transform(&self, _registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        // A blank cell means the default placement
        let display = row.take_text("display_in_venue_name").unwrap_or_default();
        let body = VenueCategoryBody {
            display_in_venue_name: VENUE_NAME_DISPLAYS.get(&display),
            venues: vec![],
            columns: row,
        };
        Payload::create(EntityType::VenueCategories, &body)
    }
}

pub struct VenueTransformer;

impl RowTransformer for VenueTransformer {
    fn transform(&self, registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let category = row.take("category");
        let body = VenueBody {
            categories: registry.resolve_list_cell(
                EntityType::VenueCategories,
                category.as_ref(),
                AbsentPolicy::Keep,
            ),
            columns: row,
        };
        Payload::create(EntityType::Venues, &body)
    }
}

fn venue_constraint_patch(
    registry: &ReferenceRegistry,
    mut row: Row,
    owner_type: EntityType,
    owner_column: &str,
) -> TransformResult {
    let target = registry.resolve_cell(owner_type, row.get(owner_column));
    let body = VenueConstraintPatch {
        venue_constraints: vec![VenueConstraint {
            category: registry.resolve_cell(EntityType::VenueCategories, row.get("category")),
            priority: row.take("priority"),
        }],
    };
    Payload::patch(target, &body)
}

pub struct AdjudicatorVenueConstraintTransformer;

impl RowTransformer for AdjudicatorVenueConstraintTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        venue_constraint_patch(registry, row, EntityType::Adjudicators, "adjudicator")
    }
}

pub struct TeamVenueConstraintTransformer;

impl RowTransformer for TeamVenueConstraintTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        venue_constraint_patch(registry, row, EntityType::Teams, "team")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transform::Target;
    use serde_json::json;

    #[test]
    fn test_venue_category_prefix() {
        let registry = ReferenceRegistry::new();
        let row = Row::new().with("name", "Online").with("display_in_venue_name", "prefix");

        let payload = VenueCategoryTransformer.transform(&registry, row).unwrap();

        assert_eq!(payload.target, Target::Collection(EntityType::VenueCategories));
        assert_eq!(
            payload.body,
            json!({"name": "Online", "display_in_venue_name": "P", "venues": []})
        );
    }

    #[test]
    fn test_venue_category_blank_display_is_suffix() {
        let registry = ReferenceRegistry::new();

        let blank = Row::new().with("name", "Online").with("display_in_venue_name", "");
        let payload = VenueCategoryTransformer.transform(&registry, blank).unwrap();
        assert_eq!(payload.body["display_in_venue_name"], json!("S"));

        let empty_cell = Row::new()
            .with("name", "Online")
            .with("display_in_venue_name", Value::Null);
        let payload = VenueCategoryTransformer.transform(&registry, empty_cell).unwrap();
        assert_eq!(payload.body["display_in_venue_name"], json!("S"));
    }

    #[test]
    fn test_venue_resolves_categories() {
        let registry = ReferenceRegistry::new();
        registry.register(EntityType::VenueCategories, "Online", "/vc/1");

        let row = Row::new()
            .with("name", "Room 1")
            .with("priority", 10)
            .with("category", "Online;Accessible");
        let payload = VenueTransformer.transform(&registry, row).unwrap();

        assert_eq!(
            payload.body,
            json!({"name": "Room 1", "priority": 10, "categories": ["/vc/1", null]})
        );
    }

    #[test]
    fn test_team_venue_constraint_patches_team() {
        let registry = ReferenceRegistry::new();
        registry.register(EntityType::Teams, "Alpha 1", "/teams/1");
        registry.register(EntityType::VenueCategories, "Ground floor", "/vc/2");

        let row = Row::new()
            .with("team", "Alpha 1")
            .with("category", "Ground floor")
            .with("priority", 5);
        let payload = TeamVenueConstraintTransformer.transform(&registry, row).unwrap();

        assert_eq!(payload.target, Target::Resource(Some("/teams/1".into())));
        assert_eq!(
            payload.body,
            json!({"venue_constraints": [{"category": "/vc/2", "priority": 5}]})
        );
    }

    #[test]
    fn test_unknown_adjudicator_leaves_target_unresolved() {
        let registry = ReferenceRegistry::new();
        let row = Row::new()
            .with("adjudicator", "Nobody")
            .with("category", "Online")
            .with("priority", 1);

        let payload = AdjudicatorVenueConstraintTransformer.transform(&registry, row).unwrap();

        assert_eq!(payload.target, Target::Resource(None));
        assert_eq!(payload.body["venue_constraints"][0]["category"], Value::Null);
    }
}
