//! Narrow trait abstracting over the decoder FFI shim.
//!
//! [`crate::runtime::Runtime`] is generic over this trait rather than
//! hard-wired to [`crate::ffi::DecoderHandle`] so that the lift loop's
//! control flow — gap skipping, local recovery, ordering — can be exercised
//! in unit tests without linking the external native library.

use std::path::Path;

use crate::error::Result;
use crate::ffi::{RawInsn, RawRegister};

/// The safe operations [`crate::runtime::Runtime`] needs from a decoder.
///
/// This is exactly the operation set of design component 4.A; see
/// [`crate::ffi::DecoderHandle`] for the implementation backed by the real
/// C-ABI lifter.
pub trait Decode {
    fn load_spec(&mut self, path: &Path) -> Result<()>;
    fn begin(&mut self) -> Result<()>;
    fn set_context_default(&mut self, key: &str, value: u32) -> Result<()>;
    fn load_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()>;
    fn lift_at(&mut self, address: u64) -> Result<Option<RawInsn>>;
    fn registers(&self) -> Result<Vec<RawRegister>>;
    fn user_ops(&self) -> Result<Vec<String>>;
}

impl Decode for crate::ffi::DecoderHandle {
    fn load_spec(&mut self, path: &Path) -> Result<()> {
        crate::ffi::DecoderHandle::load_spec(self, path)
    }

    fn begin(&mut self) -> Result<()> {
        crate::ffi::DecoderHandle::begin(self)
    }

    fn set_context_default(&mut self, key: &str, value: u32) -> Result<()> {
        crate::ffi::DecoderHandle::set_context_default(self, key, value)
    }

    fn load_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        crate::ffi::DecoderHandle::load_bytes(self, address, bytes)
    }

    fn lift_at(&mut self, address: u64) -> Result<Option<RawInsn>> {
        crate::ffi::DecoderHandle::lift_at(self, address)
    }

    fn registers(&self) -> Result<Vec<RawRegister>> {
        crate::ffi::DecoderHandle::registers(self)
    }

    fn user_ops(&self) -> Result<Vec<String>> {
        crate::ffi::DecoderHandle::user_ops(self)
    }
}
