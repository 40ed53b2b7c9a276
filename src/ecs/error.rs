//! ECS error types.

use thiserror::Error;

use crate::ecs::component::ComponentKind;
use crate::ecs::entity::EntityId;
use crate::state::StateError;

/// Errors returned by world operations.
#[derive(Error, Debug)]
pub enum EcsError {
    /// The id is not (or no longer) present in the registry.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// A system's update returned an error. The rest of the frame was skipped.
    #[error("system `{system}` failed: {source}")]
    SystemUpdateFailed {
        system: String,
        #[source]
        source: SystemError,
    },

    /// A system matched an entity that lacks one of its required components.
    /// Raised as a panic: it means the match cache is out of sync.
    #[error("system `{system}` matched entity {entity} without its required {kind} component")]
    ComponentMatchInvariantViolated {
        system: String,
        entity: EntityId,
        kind: ComponentKind,
    },
}

/// Errors a system may return from its update.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error("{0}")]
    Failed(String),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error(transparent)]
    State(#[from] StateError),
}

impl SystemError {
    pub fn failed(message: impl Into<String>) -> Self {
        SystemError::Failed(message.into())
    }
}

/// Result type for world operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Result type for system updates.
pub type SystemResult = Result<(), SystemError>;
