use std::{fmt::{Display, Formatter}, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::ReferenceRegistry;
use crate::row::Row;
use crate::transform::conflicts::{
    AdjudicatorConflictTransformer, InstitutionConflictTransformer, TeamConflictTransformer,
    TeamInstitutionConflictTransformer,
};
use crate::transform::feedback::FeedbackQuestionTransformer;
use crate::transform::participants::{
    AdjudicatorTransformer, InstitutionTransformer, ScoreTransformer, SpeakerTransformer,
    TeamTransformer,
};
use crate::transform::rounds::{
    BreakCategoryTransformer, MotionTransformer, RoundTransformer, SpeakerCategoryTransformer,
};
use crate::transform::venues::{
    AdjudicatorVenueConstraintTransformer, TeamVenueConstraintTransformer, VenueCategoryTransformer,
    VenueTransformer,
};
use crate::transform::{RowTransformer, TransformResult};

/// A category of importable tournament record. Each variant owns exactly one
/// input file and one transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    VenueCategories,
    Venues,
    Institutions,
    BreakCategories,
    SpeakerCategories,
    Teams,
    Speakers,
    Adjudicators,
    Scores,
    Rounds,
    Motions,
    #[serde(rename = "adj_feedback_questions")]
    FeedbackQuestions,
    #[serde(rename = "adj_venue_constraints")]
    AdjudicatorVenueConstraints,
    TeamVenueConstraints,
    TeamConflicts,
    InstitutionConflicts,
    AdjudicatorConflicts,
    TeamInstitutionConflicts,
}

/// Types that reference others always come after the types they reference.
pub const IMPORT_ORDER: [EntityType; 18] = [
    EntityType::VenueCategories,
    EntityType::Venues,
    EntityType::Institutions,
    EntityType::BreakCategories,
    EntityType::SpeakerCategories,
    EntityType::Teams,
    EntityType::Speakers,
    EntityType::Adjudicators,
    EntityType::Scores,
    EntityType::Rounds,
    EntityType::Motions,
    EntityType::FeedbackQuestions,
    EntityType::AdjudicatorVenueConstraints,
    EntityType::TeamVenueConstraints,
    EntityType::TeamConflicts,
    EntityType::InstitutionConflicts,
    EntityType::AdjudicatorConflicts,
    EntityType::TeamInstitutionConflicts,
];

/// Where a collection endpoint hangs off the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// `{tournament_url}/{collection}`
    Tournament,
    /// `{api_root}/{collection}`, for objects shared between tournaments.
    Api,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown entity type {0}")]
pub struct UnknownEntityType(pub String);

impl EntityType {
    pub fn file_stem(&self) -> &'static str {
        match self {
            EntityType::VenueCategories => "venue_categories",
            EntityType::Venues => "venues",
            EntityType::Institutions => "institutions",
            EntityType::BreakCategories => "break_categories",
            EntityType::SpeakerCategories => "speaker_categories",
            EntityType::Teams => "teams",
            EntityType::Speakers => "speakers",
            EntityType::Adjudicators => "adjudicators",
            EntityType::Scores => "scores",
            EntityType::Rounds => "rounds",
            EntityType::Motions => "motions",
            EntityType::FeedbackQuestions => "adj_feedback_questions",
            EntityType::AdjudicatorVenueConstraints => "adj_venue_constraints",
            EntityType::TeamVenueConstraints => "team_venue_constraints",
            EntityType::TeamConflicts => "team_conflicts",
            EntityType::InstitutionConflicts => "institution_conflicts",
            EntityType::AdjudicatorConflicts => "adjudicator_conflicts",
            EntityType::TeamInstitutionConflicts => "team_institution_conflicts",
        }
    }

    /// The remote collection rows of this type are created in. `None` for
    /// patch-style types, which update a resource owned by another type.
    pub fn collection(&self) -> Option<&'static str> {
        match self {
            EntityType::VenueCategories => Some("venue-categories"),
            EntityType::Venues => Some("venues"),
            EntityType::Institutions => Some("institutions"),
            EntityType::BreakCategories => Some("break-categories"),
            EntityType::SpeakerCategories => Some("speaker-categories"),
            EntityType::Teams => Some("teams"),
            EntityType::Speakers => Some("speakers"),
            EntityType::Adjudicators => Some("adjudicators"),
            EntityType::Rounds => Some("rounds"),
            EntityType::Motions => Some("motions"),
            EntityType::FeedbackQuestions => Some("feedback-questions"),
            EntityType::Scores
            | EntityType::AdjudicatorVenueConstraints
            | EntityType::TeamVenueConstraints
            | EntityType::TeamConflicts
            | EntityType::InstitutionConflicts
            | EntityType::AdjudicatorConflicts
            | EntityType::TeamInstitutionConflicts => None,
        }
    }

    pub fn collection_scope(&self) -> CollectionScope {
        match self {
            EntityType::Institutions => CollectionScope::Api,
            _ => CollectionScope::Tournament,
        }
    }

    /// The human-readable field other files use to refer to rows of this type.
    pub fn key_field(&self) -> Option<&'static str> {
        match self {
            EntityType::VenueCategories => Some("name"),
            EntityType::Venues => Some("name"),
            EntityType::Institutions => Some("code"),
            EntityType::BreakCategories => Some("slug"),
            EntityType::SpeakerCategories => Some("slug"),
            EntityType::Teams => Some("reference"),
            EntityType::Speakers => Some("name"),
            EntityType::Adjudicators => Some("name"),
            EntityType::Rounds => Some("abbreviation"),
            EntityType::Motions => Some("reference"),
            EntityType::FeedbackQuestions => Some("reference"),
            _ => None,
        }
    }

    /// A second field that, together with the key, tells apart rows whose key
    /// alone is not unique. Team references repeat across institutions.
    pub fn qualifier_field(&self) -> Option<&'static str> {
        match self {
            EntityType::Teams => Some("institution"),
            _ => None,
        }
    }

    pub fn is_patch_style(&self) -> bool {
        self.collection().is_none()
    }

    pub fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult {
        let transformer: &dyn RowTransformer = match self {
            EntityType::VenueCategories => &VenueCategoryTransformer,
            EntityType::Venues => &VenueTransformer,
            EntityType::Institutions => &InstitutionTransformer,
            EntityType::BreakCategories => &BreakCategoryTransformer,
            EntityType::SpeakerCategories => &SpeakerCategoryTransformer,
            EntityType::Teams => &TeamTransformer,
            EntityType::Speakers => &SpeakerTransformer,
            EntityType::Adjudicators => &AdjudicatorTransformer,
            EntityType::Scores => &ScoreTransformer,
            EntityType::Rounds => &RoundTransformer,
            EntityType::Motions => &MotionTransformer,
            EntityType::FeedbackQuestions => &FeedbackQuestionTransformer,
            EntityType::AdjudicatorVenueConstraints => &AdjudicatorVenueConstraintTransformer,
            EntityType::TeamVenueConstraints => &TeamVenueConstraintTransformer,
            EntityType::TeamConflicts => &TeamConflictTransformer,
            EntityType::InstitutionConflicts => &InstitutionConflictTransformer,
            EntityType::AdjudicatorConflicts => &AdjudicatorConflictTransformer,
            EntityType::TeamInstitutionConflicts => &TeamInstitutionConflictTransformer,
        };
        transformer.transform(registry, row)
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s.trim().trim_end_matches(".csv");
        IMPORT_ORDER
            .iter()
            .find(|t| t.file_stem() == stem)
            .copied()
            .ok_or_else(|| UnknownEntityType(s.to_string()))
    }
}
