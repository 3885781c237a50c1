//! Error Types
//!
//! This module defines the error type shared by every Kiln crate.
//!
//! # Overview
//!
//! [`KilnError`] covers three families of failure:
//! - Graph construction errors (bad pass wiring). These are programmer errors
//!   and abort engine startup.
//! - Resource acquisition errors raised while loading pass attachments.
//! - Per-frame query errors. The frame is dropped, the engine keeps running.
//!
//! Missing optional data (no directional light, no skybox, scene still
//! loading) is never an error; it is handled by explicit branches.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kiln_core::errors::{KilnError, Result};
//!
//! fn wire_graph() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Kiln engine.
#[derive(Error, Debug)]
pub enum KilnError {
    // ========================================================================
    // Graph Construction Errors
    // ========================================================================
    /// A pass with the same name already exists in the graph.
    #[error("Rendergraph '{graph}': pass '{pass}' already exists")]
    DuplicatePass {
        /// Graph name
        graph: String,
        /// Offending pass name
        pass: String,
    },

    /// A global source with the same name is already registered.
    #[error("Rendergraph '{graph}': global source '{source_name}' already registered")]
    DuplicateGlobalSource {
        /// Graph name
        graph: String,
        /// Offending source name
        source_name: String,
    },

    /// The pass already declares a sink with this name.
    #[error("Pass '{pass}': sink '{sink}' declared twice")]
    DuplicateSink {
        /// Pass name
        pass: String,
        /// Sink name
        sink: String,
    },

    /// The pass already declares a source with this name.
    #[error("Pass '{pass}': source '{source_name}' declared twice")]
    DuplicateSource {
        /// Pass name
        pass: String,
        /// Source name
        source_name: String,
    },

    /// No pass with the given name exists.
    #[error("Rendergraph '{graph}': no pass named '{pass}'")]
    PassNotFound {
        /// Graph name
        graph: String,
        /// Requested pass name
        pass: String,
    },

    /// The pass has no sink with the given name.
    #[error("Pass '{pass}': no sink named '{sink}'")]
    SinkNotFound {
        /// Pass name
        pass: String,
        /// Requested sink name
        sink: String,
    },

    /// The pass has no source with the given name.
    #[error("Pass '{pass}': no source named '{source_name}'")]
    SourceNotFound {
        /// Pass name
        pass: String,
        /// Requested source name
        source_name: String,
    },

    /// No global source with the given name is registered.
    #[error("Rendergraph '{graph}': no global source named '{source_name}'")]
    GlobalSourceNotFound {
        /// Graph name
        graph: String,
        /// Requested source name
        source_name: String,
    },

    /// A sink was linked to a pass that is not declared before the consumer.
    #[error(
        "Pass '{consumer}': producer pass '{producer}' must be declared before its consumers"
    )]
    ProducerNotDeclared {
        /// Consuming pass
        consumer: String,
        /// Producer pass named by the linkage
        producer: String,
    },

    /// A sink was never linked to a source.
    #[error("Pass '{pass}': sink '{sink}' has no linked source")]
    UnresolvedSink {
        /// Pass name
        pass: String,
        /// Sink name
        sink: String,
    },

    /// A pass-through source has no sink of the same name to forward.
    #[error("Pass '{pass}': source '{source_name}' forwards a sink that does not exist")]
    PassthroughSinkMissing {
        /// Pass name
        pass: String,
        /// Source name
        source_name: String,
    },

    /// Structural edits after finalization are rejected.
    #[error("Rendergraph '{0}' is finalized; its structure can no longer change")]
    GraphFinalized(String),

    /// The graph is not in the state the operation requires.
    #[error("Rendergraph '{graph}': '{operation}' requires state {expected}, graph is {actual}")]
    InvalidGraphState {
        /// Graph name
        graph: String,
        /// Operation that was attempted
        operation: &'static str,
        /// Required state
        expected: &'static str,
        /// Current state
        actual: &'static str,
    },

    /// The pass create callback failed.
    #[error("Pass '{pass}' could not be created: {reason}")]
    PassCreateFailed {
        /// Pass name
        pass: String,
        /// Reason reported by the callback
        reason: String,
    },

    // ========================================================================
    // Resource Acquisition Errors
    // ========================================================================
    /// A pass failed to acquire or bind its attachments.
    #[error("Pass '{pass}': resource load failed: {reason}")]
    ResourceLoad {
        /// Pass name
        pass: String,
        /// Failure description
        reason: String,
    },

    /// The render backend reported a failure.
    #[error("Render backend error: {0}")]
    Backend(String),

    // ========================================================================
    // Scene Lifecycle Errors
    // ========================================================================
    /// The scene lifecycle transition is not valid from the current state.
    #[error("Scene '{scene}': cannot {operation} while {actual}")]
    InvalidSceneState {
        /// Scene name
        scene: String,
        /// Attempted transition
        operation: &'static str,
        /// Current state
        actual: &'static str,
    },

    // ========================================================================
    // Per-frame Query Errors
    // ========================================================================
    /// A render-data query was issued against a scene that is not loaded.
    #[error("Scene '{0}' is not loaded")]
    SceneNotLoaded(String),

    /// The caller-provided debug geometry buffer cannot hold every record.
    #[error("Debug geometry buffer too small: need {required}, got {provided}")]
    DebugBufferTooSmall {
        /// Records the scene would write
        required: usize,
        /// Capacity of the caller's buffer
        provided: usize,
    },

    /// A handle referenced an object that no longer exists.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Alias for `Result<T, KilnError>`.
pub type Result<T> = std::result::Result<T, KilnError>;
