use serde::Serialize;
use serde_json::Value;

use crate::entity_type::EntityType;
use crate::registry::{ReferenceRegistry, RemoteId};
use crate::row::Row;

pub mod conflicts;
pub mod feedback;
pub mod participants;
pub mod rounds;
pub mod venues;

/// Where a transformed row is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Create a new object in the collection of this type.
    Collection(EntityType),
    /// Update an existing object. `None` if the reference did not resolve.
    Resource(Option<RemoteId>),
}

/// A row translated into the request body the remote service expects.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub target: Target,
    pub body: Value,
}

impl Payload {
    pub fn create<T>(entity_type: EntityType, body: &T) -> TransformResult where T: Serialize {
        Ok(Payload {
            target: Target::Collection(entity_type),
            body: serde_json::to_value(body)?,
        })
    }

    pub fn patch<T>(target: Option<RemoteId>, body: &T) -> TransformResult where T: Serialize {
        Ok(Payload {
            target: Target::Resource(target),
            body: serde_json::to_value(body)?,
        })
    }
}

pub type TransformResult = Result<Payload, serde_json::Error>;

/// Translates one raw row of an entity type's file into a [`Payload`].
///
/// Transformers never fail on missing or unresolvable cells: normalized tokens
/// without a match and references without a registry entry come out absent.
pub trait RowTransformer {
    fn transform(&self, registry: &ReferenceRegistry, row: Row) -> TransformResult;
}
