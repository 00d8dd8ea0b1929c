use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::entity_type::EntityType;
use crate::normalize::{normalize_bool, Gender, GENDERS};
use crate::registry::{AbsentPolicy, QualifiedKey, ReferenceRegistry, RemoteId};
use crate::row::Row;

use super::{Payload, RowTransformer, TransformResult};

fn serialize_gender_or_blank<S>(gender: &Option<Gender>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match gender {
        Some(gender) => gender.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerBody {
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Value>,
    pub anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_key: Option<Value>,
    #[serde(serialize_with = "serialize_gender_or_blank")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronoun: Option<Value>,
    pub categories: Vec<Option<RemoteId>>,
}

impl SpeakerBody {
    /// Reads the speaker fields stored under `{prefix}name`, `{prefix}email`, ...
    fn from_columns(registry: &ReferenceRegistry, row: &Row, prefix: &str) -> Self {
        let column = |field: &str| format!("{}{}", prefix, field);
        SpeakerBody {
            name: row.get(&column("name")).cloned(),
            email: row.get(&column("email")).cloned(),
            phone: row.get(&column("phone")).cloned(),
            anonymous: normalize_bool(row.get(&column("anonymous"))).unwrap_or(false),
            code_name: row.get(&column("code_name")).cloned(),
            url_key: row.get(&column("url_key")).cloned(),
            gender: GENDERS.get_cell(row.get(&column("gender"))),
            pronoun: row.get(&column("pronoun")).cloned(),
            categories: registry.resolve_list_cell(
                EntityType::SpeakerCategories,
                row.get(&column("category")),
                AbsentPolicy::Keep,
            ),
        }
    }
}

/// Expands the `speaker1_*`, `speaker2_*`, ... column groups of a team row,
/// stopping at the first group without a name.
pub fn expand_speakers(registry: &ReferenceRegistry, row: &Row) -> Vec<SpeakerBody> {
    (1..)
        .map(|n| format!("speaker{}_", n))
        .take_while(|prefix| row.contains(&format!("{}name", prefix)))
        .map(|prefix| SpeakerBody::from_columns(registry, row, &prefix))
        .collect()
}

#[derive(Debug, Serialize)]
struct TeamBody {
    institution: Option<RemoteId>,
    break_categories: Vec<Option<RemoteId>>,
    institution_conflicts: Vec<Option<RemoteId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emoji: Option<Value>,
    use_institution_prefix: bool,
    speakers: Vec<SpeakerBody>,
}

#[derive(Debug, Serialize)]
struct StandaloneSpeakerBody {
    team: Option<RemoteId>,
    #[serde(flatten)]
    speaker: SpeakerBody,
}

#[derive(Debug, Serialize)]
struct AdjudicatorBody {
    #[serde(flatten)]
    columns: Row,
    #[serde(skip_serializing_if = "Option::is_none")]
    institution: Option<RemoteId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    adj_core: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    independent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<Gender>,
}

#[derive(Debug, Serialize)]
struct ScorePatch {
    base_score: Option<Value>,
}

pub struct InstitutionTransformer;

impl RowTransformer for InstitutionTransformer {
    fn transform(&self, _registry: &ReferenceRegistry, row: Row) -> TransformResult {
        Payload::create(EntityType::Institutions, &row)
    }
}

pub struct TeamTransformer;

impl RowTransformer for TeamTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        let institution = registry.resolve_cell(EntityType::Institutions, row.get("institution"));
        let use_institution_prefix = normalize_bool(row.get("use_institution_prefix"))
            .unwrap_or(institution.is_some());

        let body = TeamBody {
            break_categories: registry.resolve_list_cell(
                EntityType::BreakCategories,
                row.get("break_category"),
                AbsentPolicy::Keep,
            ),
            institution_conflicts: registry.resolve_list_cell(
                EntityType::Institutions,
                row.get("institution_conflicts"),
                AbsentPolicy::Keep,
            ),
            reference: row.get("reference").cloned(),
            code_name: row.get("code_name").cloned(),
            emoji: row.get("emoji").cloned(),
            speakers: expand_speakers(registry, &row),
            institution,
            use_institution_prefix,
        };
        Payload::create(EntityType::Teams, &body)
    }
}

/// Team references are only unique within an institution, so a speaker row
/// naming an institution is matched on both. Without one the bare reference
/// is used.
fn resolve_team(registry: &ReferenceRegistry, row: &Row) -> Option<RemoteId> {
    let reference = row.text("team_name")?;
    if !row.contains("institution") {
        return registry.resolve(EntityType::Teams, &reference);
    }

    let institution = registry.resolve_cell(EntityType::Institutions, row.get("institution"))?;
    registry.resolve_qualified(EntityType::Teams, &QualifiedKey::new(&reference, &institution))
}

pub struct SpeakerTransformer;

impl RowTransformer for SpeakerTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        let body = StandaloneSpeakerBody {
            team: resolve_team(registry, &row),
            speaker: SpeakerBody::from_columns(registry, &row, ""),
        };
        Payload::create(EntityType::Speakers, &body)
    }
}

pub struct AdjudicatorTransformer;

impl RowTransformer for AdjudicatorTransformer {
    fn transform(&self, registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let institution = row.take("institution");
        let adj_core = row.take("adj_core");
        let independent = row.take("independent");
        let gender = row.take("gender");

        let body = AdjudicatorBody {
            institution: registry.resolve_cell(EntityType::Institutions, institution.as_ref()),
            adj_core: normalize_bool(adj_core.as_ref()),
            independent: normalize_bool(independent.as_ref()),
            gender: GENDERS.get_cell(gender.as_ref()),
            columns: row,
        };
        Payload::create(EntityType::Adjudicators, &body)
    }
}

pub struct ScoreTransformer;

impl RowTransformer for ScoreTransformer {
    fn transform(&self, registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let target = registry.resolve_cell(EntityType::Adjudicators, row.get("adjudicator"));
        Payload::patch(target, &ScorePatch { base_score: row.take("score") })
    }
}
