use serde::Serialize;
use serde_json::Value;

use crate::entity_type::EntityType;
use crate::normalize::{normalize_bool, DrawType, RoundStage, DRAW_TYPES, ROUND_STAGES};
use crate::registry::{AbsentPolicy, ReferenceRegistry, RemoteId};
use crate::row::Row;

use super::{Payload, RowTransformer, TransformResult};

#[derive(Debug, Serialize)]
struct BreakCategoryBody {
    #[serde(flatten)]
    columns: Row,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_general: Option<bool>,
}

#[derive(Debug, Serialize)]
struct SpeakerCategoryBody {
    #[serde(flatten)]
    columns: Row,
    #[serde(skip_serializing_if = "Option::is_none")]
    public: Option<bool>,
}

#[derive(Debug, Serialize)]
struct RoundBody {
    #[serde(flatten)]
    columns: Row,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<RoundStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    silent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draw_type: Option<DrawType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    break_category: Option<RemoteId>,
}

#[derive(Debug, Serialize)]
struct RoundMotion {
    round: Option<RemoteId>,
    seq: Value,
}

#[derive(Debug, Serialize)]
struct MotionBody {
    #[serde(flatten)]
    columns: Row,
    rounds: Vec<RoundMotion>,
}

pub struct BreakCategoryTransformer;

impl RowTransformer for BreakCategoryTransformer {
    fn transform(&self, _registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let is_general = row.take("is_general");
        let body = BreakCategoryBody {
            is_general: normalize_bool(is_general.as_ref()),
            columns: row,
        };
        Payload::create(EntityType::BreakCategories, &body)
    }
}

pub struct SpeakerCategoryTransformer;

impl RowTransformer for SpeakerCategoryTransformer {
    fn transform(&self, _registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let public = row.take("public");
        let body = SpeakerCategoryBody {
            public: normalize_bool(public.as_ref()),
            columns: row,
        };
        Payload::create(EntityType::SpeakerCategories, &body)
    }
}

pub struct RoundTransformer;

impl RowTransformer for RoundTransformer {
    fn transform(&self, registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let stage = row.take("stage");
        let silent = row.take("silent");
        let draw_type = row.take("draw_type");
        let break_category = row.take("break_category");

        let body = RoundBody {
            stage: ROUND_STAGES.get_cell(stage.as_ref()),
            silent: normalize_bool(silent.as_ref()),
            draw_type: DRAW_TYPES.get_cell(draw_type.as_ref()),
            break_category: registry
                .resolve_cell(EntityType::BreakCategories, break_category.as_ref()),
            columns: row,
        };
        Payload::create(EntityType::Rounds, &body)
    }
}

pub struct MotionTransformer;

impl RowTransformer for MotionTransformer {
    fn transform(&self, registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let rounds = row.take("rounds");
        let seq = row.take("seq").unwrap_or_else(|| Value::from(1));

        let rounds = registry
            .resolve_list_cell(EntityType::Rounds, rounds.as_ref(), AbsentPolicy::Keep)
            .into_iter()
            .map(|round| RoundMotion { round, seq: seq.clone() })
            .collect();

        Payload::create(EntityType::Motions, &MotionBody { columns: row, rounds })
    }
}
