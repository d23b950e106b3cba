//! Boolean label vector over an operation sequence (design 4.G).

use bitflags::bitflags;

use crate::ilop::{modifies_sp, ILOp};
use crate::register::RegisterMap;

bitflags! {
    /// Backing bitset for [`SemanticSummary`].
    ///
    /// Modelled as a `bitflags!` set in the same style the teacher uses for
    /// other attribute-like boolean vectors, so the reserved flags cost
    /// nothing extra once a future pass starts populating them.
    #[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct SemanticFlags: u16 {
        const PURE = 1 << 0;
        const REGISTER_PURE = 1 << 1;
        const ATOMIC = 1 << 2;
        const MSR_ACCESS = 1 << 3;
        const RET = 1 << 4;
        const JUMP = 1 << 5;
        const CALL = 1 << 6;
        const HALT = 1 << 7;
        const INTERRUPT = 1 << 8;
        const MODIFIES_SP = 1 << 9;
        const UNIMPLEMENTED = 1 << 10;
    }
}

/// A once-computed, immutable record of what one lifted machine instruction
/// does, in terms downstream analyses can consume without re-walking the IL.
///
/// Only `ret`, `jump`, `call`, `modifies_sp`, and `unimplemented` are
/// populated by [`summarise`] in this release; the rest default to `false`
/// and are reserved for a future revision.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SemanticSummary(SemanticFlags);

impl SemanticSummary {
    pub fn pure(&self) -> bool {
        self.0.contains(SemanticFlags::PURE)
    }

    pub fn register_pure(&self) -> bool {
        self.0.contains(SemanticFlags::REGISTER_PURE)
    }

    pub fn atomic(&self) -> bool {
        self.0.contains(SemanticFlags::ATOMIC)
    }

    pub fn msr_access(&self) -> bool {
        self.0.contains(SemanticFlags::MSR_ACCESS)
    }

    pub fn ret(&self) -> bool {
        self.0.contains(SemanticFlags::RET)
    }

    pub fn jump(&self) -> bool {
        self.0.contains(SemanticFlags::JUMP)
    }

    pub fn call(&self) -> bool {
        self.0.contains(SemanticFlags::CALL)
    }

    pub fn halt(&self) -> bool {
        self.0.contains(SemanticFlags::HALT)
    }

    pub fn interrupt(&self) -> bool {
        self.0.contains(SemanticFlags::INTERRUPT)
    }

    pub fn modifies_sp(&self) -> bool {
        self.0.contains(SemanticFlags::MODIFIES_SP)
    }

    pub fn unimplemented(&self) -> bool {
        self.0.contains(SemanticFlags::UNIMPLEMENTED)
    }
}

/// Computes the summary for one instruction's op sequence. Called exactly
/// once per [`crate::block::ILBlock`].
pub fn summarise(ops: &[ILOp], register_map: &RegisterMap) -> SemanticSummary {
    let mut flags = SemanticFlags::empty();
    for op in ops {
        if modifies_sp(op, register_map) {
            flags |= SemanticFlags::MODIFIES_SP;
        }
        if op.is_unimplemented() {
            flags |= SemanticFlags::UNIMPLEMENTED;
        } else if op.is_return() {
            flags |= SemanticFlags::RET;
        } else if op.is_jump() {
            flags |= SemanticFlags::JUMP;
        } else if op.is_call() {
            flags |= SemanticFlags::CALL;
        }
    }
    SemanticSummary(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilop::OpPayload;
    use crate::register::RegisterDescriptor;
    use crate::varref::VarReference;

    fn copy_to(reg_index: u32) -> ILOp {
        ILOp::Copy(OpPayload {
            inputs: vec![],
            output: Some(VarReference::RegisterRef {
                index: reg_index,
                width: 8,
            }),
        })
    }

    #[test]
    fn copy_copy_return_sets_ret_only() {
        let map = RegisterMap::from_entries(vec![RegisterDescriptor::new("rax", 0, 8)]);
        let ops = vec![copy_to(0), copy_to(0), ILOp::Return(OpPayload::default())];
        let summary = summarise(&ops, &map);
        assert!(summary.ret());
        assert!(!summary.jump());
        assert!(!summary.call());
        assert!(!summary.modifies_sp());
    }

    #[test]
    fn modifies_sp_propagates_from_any_op() {
        let map = RegisterMap::from_entries(vec![RegisterDescriptor::new("rsp", 0x20, 8)]);
        let ops = vec![copy_to(0), ILOp::Return(OpPayload::default())];
        let summary = summarise(&ops, &map);
        assert!(summary.ret());
        assert!(summary.modifies_sp());
    }

    #[test]
    fn unimplemented_op_is_recorded() {
        let map = RegisterMap::new();
        let ops = vec![ILOp::Unimplemented(OpPayload::default())];
        let summary = summarise(&ops, &map);
        assert!(summary.unimplemented());
        assert!(!summary.ret());
    }
}
