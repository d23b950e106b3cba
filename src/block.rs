//! Summary + ops + pretty text for one decoded machine instruction
//! (design 4.H).

use crate::error::Result;
use crate::ffi::RawInsn;
use crate::ilop::ILOp;
use crate::register::RegisterMap;
use crate::summary::{summarise, SemanticSummary};

/// One fully lifted machine instruction.
#[derive(Clone, Debug)]
pub struct ILBlock {
    address: u64,
    size: u64,
    text: String,
    ops: Vec<ILOp>,
    summary: SemanticSummary,
}

impl ILBlock {
    /// Builds a block from a raw decoded instruction, converting every
    /// op in order and aborting with the first op's error if any operand
    /// can't be classified.
    pub fn from_raw(raw: &RawInsn, register_map: &RegisterMap) -> Result<ILBlock> {
        let ops = raw
            .ops
            .iter()
            .map(|op| ILOp::from_raw(op, register_map))
            .collect::<Result<Vec<_>>>()?;
        let summary = summarise(&ops, register_map);
        let text = if raw.body.is_empty() {
            raw.mnemonic.clone()
        } else {
            format!("{} {}", raw.mnemonic, raw.body)
        };

        Ok(ILBlock {
            address: raw.address,
            size: raw.size,
            text,
            ops,
            summary,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ops(&self) -> &[ILOp] {
        &self.ops
    }

    pub fn summary(&self) -> SemanticSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::RawPcodeOp;
    use crate::opcode;

    fn raw_insn(address: u64, size: u64, opcodes: Vec<i32>) -> RawInsn {
        RawInsn {
            address,
            size,
            mnemonic: "ret".into(),
            body: String::new(),
            ops: opcodes
                .into_iter()
                .map(|opcode| RawPcodeOp {
                    opcode,
                    output: None,
                    inputs: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn block_summary_reflects_return_op() {
        let map = RegisterMap::new();
        let raw = raw_insn(0x1000, 1, vec![opcode::RETURN]);
        let block = ILBlock::from_raw(&raw, &map).unwrap();
        assert_eq!(block.address(), 0x1000);
        assert_eq!(block.size(), 1);
        assert!(block.summary().ret());
        assert!(!block.ops().is_empty());
    }

    #[test]
    fn text_joins_mnemonic_and_body_with_one_space() {
        let map = RegisterMap::new();
        let mut raw = raw_insn(0, 4, vec![]);
        raw.mnemonic = "mov".into();
        raw.body = "eax, ebx".into();
        let block = ILBlock::from_raw(&raw, &map).unwrap();
        assert_eq!(block.text(), "mov eax, ebx");
    }

    #[test]
    fn empty_body_yields_bare_mnemonic() {
        let map = RegisterMap::new();
        let mut raw = raw_insn(0, 2, vec![]);
        raw.mnemonic = "nop".into();
        let block = ILBlock::from_raw(&raw, &map).unwrap();
        assert_eq!(block.text(), "nop");
    }
}
