//! Error types shared across the crate.

use thiserror::Error;

use crate::models::ModelKind;

/// Convenience alias for fallible node operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors produced by model registration, state operations, and publishing.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A model or node configuration is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The model registry is full.
    #[error("model registry full ({max} models)")]
    CapacityExceeded { max: usize },

    /// No registered model matches the requested kind and instance index.
    #[error("{kind} model #{index} not found")]
    ModelNotFound { kind: ModelKind, index: usize },

    /// The sensor model declares no sensor with this property ID.
    #[error("sensor property 0x{property_id:04X} not found")]
    SensorNotFound { property_id: u16 },

    /// The model has no usable publish address yet. Publish addresses are
    /// assigned by the provisioner, so this is normal before configuration
    /// completes.
    #[error("publication not configured")]
    PublicationNotConfigured,

    /// An operation was attempted in a state that cannot honor it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The model kind is declared but has no implementation.
    #[error("{0} models are not supported")]
    Unsupported(ModelKind),

    /// Failure reported by the underlying mesh stack.
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Errors surfaced by a [`MeshStack`](crate::stack::MeshStack)
/// implementation.
#[derive(Debug, Error)]
pub enum StackError {
    /// The stack was driven before `initialize` succeeded.
    #[error("mesh stack not initialized")]
    NotInitialized,

    /// The stack ran out of outbound message buffers.
    #[error("mesh stack out of transmit buffers")]
    OutOfBuffers,

    /// The stack rejected or failed a transmission.
    #[error("transmit failed: {0}")]
    Transmit(String),
}
