//! Raw P-code opcode numbering, as emitted by the SLEIGH-backed decoder.
//!
//! These match the numbering of Ghidra's `pcoderaw.hh` `OpCode` enum, which
//! is the de-facto standard the decoder's C-ABI is modelled on. Only the
//! control-flow and data-movement opcodes are named individually; everything
//! else (arithmetic, logic, floating point, `CALLOTHER`, and any future
//! addition) collapses to [`crate::ilop::ILOpTag::Unimplemented`].

pub const COPY: i32 = 1;
pub const LOAD: i32 = 2;
pub const STORE: i32 = 3;
pub const BRANCH: i32 = 4;
pub const CBRANCH: i32 = 5;
pub const BRANCHIND: i32 = 6;
pub const CALL: i32 = 7;
pub const CALLIND: i32 = 8;
pub const CALLOTHER: i32 = 9;
pub const RETURN: i32 = 10;
