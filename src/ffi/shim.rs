//! Typed, safe view over the decoder's C-ABI (design component 4.A).
//!
//! Every raw pointer the C library hands back is copied into an owned Rust
//! value before it crosses back out of this module — callers never see a
//! `*const` from here on.

use std::ffi::CString;
use std::os::raw::c_char;
use std::path::Path;

use super::{Decoder, InsnDesc, RegisterList, Status, UserOpList};
use crate::error::{Error, Result};

/// Lifecycle state of a [`DecoderHandle`], enforced by every method below.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Created,
    SpecLoaded,
    Started,
}

/// Owned copy of a single decoder operand.
#[derive(Clone, Debug)]
pub struct RawVarnode {
    pub space: String,
    pub offset: u64,
    pub size: u64,
}

/// Owned copy of a single raw P-code micro-operation.
#[derive(Clone, Debug)]
pub struct RawPcodeOp {
    pub opcode: i32,
    pub output: Option<RawVarnode>,
    pub inputs: Vec<RawVarnode>,
}

/// Owned copy of one decoded machine instruction.
#[derive(Clone, Debug)]
pub struct RawInsn {
    pub address: u64,
    pub size: u64,
    pub mnemonic: String,
    pub body: String,
    pub ops: Vec<RawPcodeOp>,
}

/// One entry of the decoder's register table, owned.
#[derive(Clone, Debug)]
pub struct RawRegister {
    pub name: String,
    pub space: String,
    pub offset: u64,
    pub size: u64,
}

/// A live handle to the external decoder.
///
/// Enforces the `Created -> SpecLoaded -> Started` state machine described
/// in the design: any operation other than [`DecoderHandle::load_spec`]
/// attempted before [`DecoderHandle::begin`] has run returns
/// [`Error::CallBeginFirst`].
pub struct DecoderHandle {
    raw: *mut Decoder,
    state: State,
}

impl DecoderHandle {
    /// Creates a fresh decoder instance in the `Created` state.
    pub fn new() -> Result<Self> {
        let raw = unsafe { super::sleigh_decoder_new() };
        if raw.is_null() {
            return Err(Error::Fail("decoder allocation failed".into()));
        }
        Ok(DecoderHandle {
            raw,
            state: State::Created,
        })
    }

    fn require_started(&self) -> Result<()> {
        if self.state == State::Started {
            Ok(())
        } else {
            Err(Error::CallBeginFirst)
        }
    }

    /// Loads the `.sla` processor spec. Must be called before [`Self::begin`].
    pub fn load_spec(&mut self, path: &Path) -> Result<()> {
        let cpath = path_to_cstring(path)?;
        let status = unsafe { super::sleigh_decoder_load_specfile(self.raw, cpath.as_ptr()) };
        if status.is_error() {
            return Err(Error::InvalidSpec(path.display().to_string()));
        }
        self.state = State::SpecLoaded;
        Ok(())
    }

    /// Transitions the decoder into the `Started` state. All other
    /// operations besides [`Self::load_spec`] must be called after this.
    pub fn begin(&mut self) -> Result<()> {
        if self.state == State::Created {
            return Err(Error::CallBeginFirst);
        }
        let status = unsafe { super::sleigh_decoder_begin(self.raw) };
        if status.is_error() {
            return Err(Error::Fail("decoder failed to start".into()));
        }
        self.state = State::Started;
        Ok(())
    }

    /// Sets a SLEIGH context variable's default value.
    pub fn set_context_default(&mut self, key: &str, value: u32) -> Result<()> {
        self.require_started()?;
        let ckey = CString::new(key).map_err(|_| Error::BadContextVariable {
            name: key.to_owned(),
        })?;
        let status = unsafe {
            super::sleigh_decoder_context_var_set_default(self.raw, ckey.as_ptr(), value)
        };
        if status.is_error() {
            return Err(Error::BadContextVariable {
                name: key.to_owned(),
            });
        }
        Ok(())
    }

    /// Stages a byte region at `address` inside the decoder's address space.
    pub fn load_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        self.require_started()?;
        let status = unsafe {
            super::sleigh_decoder_load_region(
                self.raw,
                address,
                bytes.as_ptr(),
                bytes.len() as u64,
            )
        };
        if status.is_error() {
            return Err(Error::Fail(format!(
                "failed to stage {} bytes at {address:#x}",
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Decodes the instruction starting at `address`, if any.
    ///
    /// Returns `Ok(None)` when the decoder reports the bytes at `address`
    /// as undecodable — that is local recovery territory for the caller,
    /// not a hard error.
    pub fn lift_at(&mut self, address: u64) -> Result<Option<RawInsn>> {
        self.require_started()?;
        let mut desc = InsnDesc {
            op_count: 0,
            ops: std::ptr::null(),
            size: 0,
            address: 0,
            mnemonic: std::ptr::null(),
            mnemonic_len: 0,
            body: std::ptr::null(),
            body_len: 0,
        };
        let status = unsafe { super::sleigh_decoder_lift_insn(self.raw, address, &mut desc) };
        match status {
            Status::Ok => {
                let insn = unsafe { copy_insn(&desc) };
                unsafe { super::sleigh_insn_free(&mut desc) };
                Ok(Some(insn))
            }
            Status::UnableToLift | Status::InsnDecodeError => Ok(None),
            other => Err(other_to_error(other, address)),
        }
    }

    /// Returns the full register table, copied out of the decoder.
    pub fn registers(&self) -> Result<Vec<RawRegister>> {
        self.require_started()?;
        let mut list = RegisterList {
            count: 0,
            items: std::ptr::null(),
        };
        let status = unsafe { super::sleigh_decoder_get_all_registers(self.raw, &mut list) };
        if status.is_error() {
            return Err(Error::Fail("failed to fetch register table".into()));
        }
        let out = unsafe { copy_registers(&list) };
        unsafe { super::sleigh_register_list_free(&mut list) };
        Ok(out)
    }

    /// Returns the decoder's user-op (`CALLOTHER`) name table.
    pub fn user_ops(&self) -> Result<Vec<String>> {
        self.require_started()?;
        let mut list = UserOpList {
            count: 0,
            name_lens: std::ptr::null(),
            names: std::ptr::null(),
        };
        let status = unsafe { super::sleigh_decoder_get_user_ops(self.raw, &mut list) };
        if status.is_error() {
            return Err(Error::Fail("failed to fetch user-op table".into()));
        }
        let out = unsafe { copy_user_ops(&list) };
        unsafe { super::sleigh_user_op_list_free(&mut list) };
        Ok(out)
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        unsafe { super::sleigh_decoder_free(self.raw) };
    }
}

fn other_to_error(status: Status, address: u64) -> Error {
    match status {
        Status::BadVarSpace => Error::BadVarSpace {
            space: "<unknown>".into(),
        },
        Status::CallBeginFirst => Error::CallBeginFirst,
        _ => Error::UnableToLift { address },
    }
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    let s = path.to_str().ok_or_else(|| {
        Error::UnableToLoadFile {
            path: path.to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "non-UTF8 path"),
        }
    })?;
    CString::new(s).map_err(|_| Error::UnableToLoadFile {
        path: path.to_owned(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "embedded NUL in path"),
    })
}

unsafe fn copy_cstr_fixed(ptr: *const c_char, len: usize) -> String {
    if ptr.is_null() || len == 0 {
        return String::new();
    }
    let bytes = std::slice::from_raw_parts(ptr as *const u8, len);
    String::from_utf8_lossy(bytes).trim_end_matches('\0').to_owned()
}

unsafe fn copy_varnode(v: &super::VarnodeDesc) -> RawVarnode {
    let space_bytes: Vec<u8> = v
        .space
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as u8)
        .collect();
    RawVarnode {
        space: String::from_utf8_lossy(&space_bytes).into_owned(),
        offset: v.offset,
        size: v.size,
    }
}

unsafe fn copy_insn(desc: &InsnDesc) -> RawInsn {
    let mnemonic = copy_cstr_fixed(desc.mnemonic, desc.mnemonic_len as usize);
    let body = copy_cstr_fixed(desc.body, desc.body_len as usize);

    let raw_ops = if desc.ops.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(desc.ops, desc.op_count as usize)
    };

    let ops = raw_ops
        .iter()
        .map(|op| {
            let output = if op.output.is_null() {
                None
            } else {
                Some(copy_varnode(&*op.output))
            };
            let raw_inputs = if op.inputs.is_null() {
                &[]
            } else {
                std::slice::from_raw_parts(op.inputs, op.input_len as usize)
            };
            let inputs = raw_inputs.iter().map(|v| copy_varnode(v)).collect();
            RawPcodeOp {
                opcode: op.opcode,
                output,
                inputs,
            }
        })
        .collect();

    RawInsn {
        address: desc.address,
        size: desc.size,
        mnemonic,
        body,
        ops,
    }
}

unsafe fn copy_registers(list: &RegisterList) -> Vec<RawRegister> {
    if list.items.is_null() {
        return Vec::new();
    }
    let raw = std::slice::from_raw_parts(list.items, list.count as usize);
    raw.iter()
        .map(|r| {
            let name_bytes: Vec<u8> = r
                .name
                .iter()
                .take_while(|&&b| b != 0)
                .map(|&b| b as u8)
                .collect();
            let varnode = copy_varnode(&r.varnode);
            RawRegister {
                name: String::from_utf8_lossy(&name_bytes).into_owned(),
                space: varnode.space,
                offset: varnode.offset,
                size: varnode.size,
            }
        })
        .collect()
}

unsafe fn copy_user_ops(list: &UserOpList) -> Vec<String> {
    if list.names.is_null() {
        return Vec::new();
    }
    let names = std::slice::from_raw_parts(list.names, list.count as usize);
    let lens = std::slice::from_raw_parts(list.name_lens, list.count as usize);
    names
        .iter()
        .zip(lens.iter())
        .map(|(&ptr, &len)| copy_cstr_fixed(ptr, len as usize))
        .collect()
}
