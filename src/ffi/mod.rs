//! Raw C-ABI surface of the external SLEIGH-backed decoder.
//!
//! This module only defines the wire types and the `extern "C"` functions
//! listed in the external-interfaces section of the design. Nothing here is
//! meant to be used directly outside of [`crate::ffi::shim`] — treat it the
//! same way the generated bindings of a typical FFI crate are treated:
//! plumbing, not API.

mod shim;

pub use shim::{DecoderHandle, RawInsn, RawPcodeOp, RawRegister, RawVarnode};

use std::os::raw::c_char;

/// Opaque decoder instance, owned exclusively by the FFI shim.
#[repr(C)]
pub struct Decoder {
    _private: [u8; 0],
}

/// A single P-code operand as reported by the decoder.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct VarnodeDesc {
    pub space: [c_char; 16],
    pub offset: u64,
    pub size: u64,
}

/// A single raw P-code micro-operation.
#[repr(C)]
pub struct PcodeOp {
    pub opcode: i32,
    pub output: *const VarnodeDesc,
    pub input_len: u64,
    pub inputs: *const VarnodeDesc,
}

/// A fully decoded machine instruction, expanded to P-code.
#[repr(C)]
pub struct InsnDesc {
    pub op_count: u64,
    pub ops: *const PcodeOp,
    pub size: u64,
    pub address: u64,
    pub mnemonic: *const c_char,
    pub mnemonic_len: u64,
    pub body: *const c_char,
    pub body_len: u64,
}

/// One entry of the decoder's architecture register table.
#[repr(C)]
pub struct RegisterDesc {
    pub name: [c_char; 64],
    pub varnode: VarnodeDesc,
}

/// The full register table, valid only for the lifetime of the call that
/// produced it.
#[repr(C)]
pub struct RegisterList {
    pub count: u64,
    pub items: *const RegisterDesc,
}

/// The decoder's user-defined pseudo-op name table (`CALLOTHER` operands).
#[repr(C)]
pub struct UserOpList {
    pub count: u64,
    pub name_lens: *const u64,
    pub names: *const *const c_char,
}

/// Status code returned by every FFI entry point.
///
/// Mirrors the taxonomy in the design's error-handling section; [`crate::error::Error`]
/// is the safe, owned equivalent that the shim converts these into.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok = 0,
    Uninit = 1,
    BadVarSpace = 2,
    BadOperation = 3,
    Fail = 4,
    CallBeginFirst = 5,
    UnableToLift = 6,
    InvalidSpec = 7,
    InvalidPspec = 8,
    InsnDecodeError = 9,
    BadContextVariable = 10,
}

impl Status {
    pub fn is_error(self) -> bool {
        !matches!(self, Status::Ok)
    }
}

#[link(name = "sleigh_shim")]
extern "C" {
    pub fn sleigh_decoder_new() -> *mut Decoder;

    pub fn sleigh_decoder_free(decoder: *mut Decoder);

    pub fn sleigh_decoder_load_specfile(decoder: *mut Decoder, path: *const c_char) -> Status;

    pub fn sleigh_decoder_begin(decoder: *mut Decoder) -> Status;

    pub fn sleigh_decoder_context_var_set_default(
        decoder: *mut Decoder,
        name: *const c_char,
        value: u32,
    ) -> Status;

    pub fn sleigh_decoder_load_region(
        decoder: *mut Decoder,
        address: u64,
        data: *const u8,
        len: u64,
    ) -> Status;

    pub fn sleigh_decoder_lift_insn(
        decoder: *mut Decoder,
        address: u64,
        out: *mut InsnDesc,
    ) -> Status;

    pub fn sleigh_decoder_next_insn(decoder: *mut Decoder, address: u64) -> u64;

    pub fn sleigh_decoder_get_all_registers(
        decoder: *const Decoder,
        out: *mut RegisterList,
    ) -> Status;

    pub fn sleigh_decoder_get_user_ops(decoder: *const Decoder, out: *mut UserOpList) -> Status;

    pub fn sleigh_insn_free(insn: *mut InsnDesc);

    pub fn sleigh_register_list_free(list: *mut RegisterList);

    pub fn sleigh_user_op_list_free(list: *mut UserOpList);
}
