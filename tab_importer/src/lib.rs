pub mod bootstrap;
pub mod client;
pub mod config;
pub mod entity_type;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod row;
pub mod sequencer;
pub mod transform;

pub use bootstrap::{bootstrap_tournament, TournamentBase, TournamentSettings};
pub use client::{HttpApi, SubmissionRequest, SubmitMethod, TournamentApi};
pub use entity_type::{EntityType, IMPORT_ORDER};
pub use error::{ApiError, ImportError};
pub use registry::{AbsentPolicy, QualifiedKey, ReferenceRegistry, RemoteId};
pub use row::Row;
pub use sequencer::{Activity, ImportSources, ImportState, ImportSummary, Importer, TypeSummary};
