//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the pipeline returns [`Result<T>`], whose
//! error side is a single [`Error`] enum. This keeps the decoder FFI shim,
//! the loader, and the runtime propagating through the same type instead of
//! each layer inventing its own.

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// A convenience alias for a `Result` using the crate's [`Error`] type.
pub type Result<T = ()> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the lifting pipeline.
///
/// Most variants are fatal to the call that produced them; the exceptions
/// are documented individually and are the only ones the runtime recovers
/// from locally (see [`crate::runtime::Runtime::perform_lift`]).
#[derive(Debug, ThisError)]
pub enum Error {
    /// `perform_lift` was called before a target was loaded.
    #[error("no target has been loaded into the runtime")]
    NoTarget,

    /// The supplied configuration does not specify how to obtain input bytes.
    #[error("configuration does not specify an input mode")]
    NoInputMode,

    /// `load_target` was called on a runtime that already owns a target.
    #[error("a target is already loaded")]
    TargetPresent,

    /// An I/O error occurred while reading a dump or spec file.
    #[error("unable to load file {path}: {source}")]
    UnableToLoadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `VarReference` construction referenced a register the map does not know.
    #[error("no register at offset {offset:#x} covers width {width}")]
    InvalidRegisterLookup { offset: u64, width: u64 },

    /// The decoder rejected the `.sla` spec file.
    #[error("decoder rejected spec file: {0}")]
    InvalidSpec(String),

    /// The decoder rejected the `.pspec` processor spec.
    #[error("decoder rejected processor spec: {0}")]
    InvalidPspec(String),

    /// A varnode carried an address-space tag the pipeline does not support.
    #[error("unsupported varnode address space {space:?}")]
    BadVarSpace { space: String },

    /// The decoder could not decode bytes at the given address.
    #[error("unable to lift instruction at {address:#x}")]
    UnableToLift { address: u64 },

    /// A context pair named a key the decoder's spec does not declare.
    #[error("unknown context variable {name:?}")]
    BadContextVariable { name: String },

    /// A decoder operation was invoked in the wrong lifecycle state.
    #[error("decoder must be started with `begin` before this operation")]
    CallBeginFirst,

    /// A malformed region dump (bad hex, odd length, oversized input).
    #[error("malformed region dump: {0}")]
    MalformedDump(String),

    /// A generic decoder failure that does not fit a more specific variant.
    #[error("decoder operation failed: {0}")]
    Fail(String),
}
