//! Compressed, semantically-labelled opcode tag and the raw-to-IL
//! translation (design 4.F).

use crate::error::Result;
use crate::ffi::RawPcodeOp;
use crate::opcode;
use crate::register::RegisterMap;
use crate::varref::VarReference;

/// The inputs and optional output shared by every [`ILOp`] variant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpPayload {
    pub inputs: Vec<VarReference>,
    pub output: Option<VarReference>,
}

/// A compressed subset of the raw P-code opcode table, labelled by the
/// semantic role it plays downstream rather than by its literal mnemonic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ILOp {
    /// Any opcode this pipeline doesn't distinguish further (arithmetic,
    /// logic, float, `CALLOTHER`, or an opcode number outside the known
    /// table).
    Unimplemented(OpPayload),
    Copy(OpPayload),
    Store(OpPayload),
    Load(OpPayload),
    Branch(OpPayload),
    BranchConditional(OpPayload),
    BranchIndirect(OpPayload),
    Call(OpPayload),
    CallIndirect(OpPayload),
    Return(OpPayload),
    /// Reserved for address-space kinds (`join`/`iop`/`fspec`) that might
    /// one day get first-class IL treatment. Nothing currently constructs
    /// this variant: those spaces are rejected as [`crate::error::Error::BadVarSpace`]
    /// instead (see the open question in the design notes).
    NotSupported(OpPayload),
}

impl ILOp {
    /// Converts one raw P-code operation into its IL form, resolving every
    /// operand through `register_map` along the way.
    pub fn from_raw(raw: &RawPcodeOp, register_map: &RegisterMap) -> Result<ILOp> {
        let inputs = raw
            .inputs
            .iter()
            .map(|v| VarReference::from_varnode(v, register_map))
            .collect::<Result<Vec<_>>>()?;
        let output = raw
            .output
            .as_ref()
            .map(|v| VarReference::from_varnode(v, register_map))
            .transpose()?;
        let payload = OpPayload { inputs, output };

        Ok(match raw.opcode {
            opcode::COPY => ILOp::Copy(payload),
            opcode::LOAD => ILOp::Load(payload),
            opcode::STORE => ILOp::Store(payload),
            opcode::BRANCH => ILOp::Branch(payload),
            opcode::CBRANCH => ILOp::BranchConditional(payload),
            opcode::BRANCHIND => ILOp::BranchIndirect(payload),
            opcode::CALL => ILOp::Call(payload),
            opcode::CALLIND => ILOp::CallIndirect(payload),
            opcode::RETURN => ILOp::Return(payload),
            _ => ILOp::Unimplemented(payload),
        })
    }

    pub fn payload(&self) -> &OpPayload {
        match self {
            ILOp::Unimplemented(p)
            | ILOp::Copy(p)
            | ILOp::Store(p)
            | ILOp::Load(p)
            | ILOp::Branch(p)
            | ILOp::BranchConditional(p)
            | ILOp::BranchIndirect(p)
            | ILOp::Call(p)
            | ILOp::CallIndirect(p)
            | ILOp::Return(p)
            | ILOp::NotSupported(p) => p,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, ILOp::Return(_))
    }

    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            ILOp::Branch(_) | ILOp::BranchConditional(_) | ILOp::BranchIndirect(_)
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(self, ILOp::Call(_) | ILOp::CallIndirect(_))
    }

    pub fn is_unimplemented(&self) -> bool {
        matches!(self, ILOp::Unimplemented(_))
    }
}

/// True iff this op's output is a register whose stored name contains the
/// substring `sp` anywhere (`sp`, `esp`, `rsp`, `r15sp`, ...).
///
/// This is a known false-positive generator: architectures with registers
/// like `spsr` (ARM) or `sph` (AVR) will be flagged as stack-pointer writes
/// even though they are not. A correct answer needs the processor spec to
/// name its stack-pointer register explicitly, which the decoder API does
/// not currently expose.
pub fn modifies_sp(op: &ILOp, register_map: &RegisterMap) -> bool {
    op.payload()
        .output
        .as_ref()
        .is_some_and(|out| out.register_name_contains_sp(register_map))
}
