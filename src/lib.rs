//! A SLEIGH-backed P-code lifting pipeline: load machine code into an
//! external decoder, walk its address space, and produce a flat sequence of
//! semantically-summarised IL blocks suitable for gadget discovery and
//! similar binary-analysis workloads.
//!
//! The pipeline is a straight line: [`loader`] turns a file on disk into
//! [`region::MemoryRegion`]s and context pairs, [`runtime::Runtime`] stages
//! them into the decoder behind [`ffi::DecoderHandle`] and walks
//! [`target::Target`]'s address cursor, and each decoded instruction is
//! converted into a [`block::ILBlock`] via [`varref::VarReference`],
//! [`ilop::ILOp`], and [`summary::SemanticSummary`].

mod block;
mod config;
mod decode;
mod error;
mod ffi;
mod ilop;
mod loader;
mod opcode;
mod region;
mod register;
mod runtime;
mod summary;
mod target;
mod varref;

pub use block::ILBlock;
pub use config::{InputSource, LiftConfig};
pub use decode::Decode;
pub use error::{Error, Result};
pub use ilop::{ILOp, OpPayload};
pub use loader::{context_pairs_from_spec, dump_to_regions, raw_file_to_regions};
pub use region::MemoryRegion;
pub use register::{RegisterDescriptor, RegisterMap};
pub use runtime::Runtime;
pub use summary::{SemanticFlags, SemanticSummary};
pub use target::{ContextPair, Target};
pub use varref::VarReference;

pub use ffi::DecoderHandle;
