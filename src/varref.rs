//! Tagged classification of a decoder operand (design 4.E).

use crate::error::{Error, Result};
use crate::ffi::RawVarnode;
use crate::register::RegisterMap;

/// A single operand of a lifted micro-operation, classified by the
/// address-space it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarReference {
    /// A literal value, carrying its own width since constants have no
    /// backing storage to infer one from.
    Constant { value: u64, width: u64 },
    /// A handle into the owning runtime's [`RegisterMap`], stable for its
    /// lifetime.
    RegisterRef { index: u32, width: u64 },
    /// An address in one of the `ram`/`data`/`code`/`stack` spaces.
    Memory { address: u64, width: u64 },
    /// A decoder-internal temporary (`unique` space).
    Unique { slot: u64, width: u64 },
}

impl VarReference {
    /// Builds a `VarReference` from a raw decoder varnode, classifying its
    /// address space and, for registers, resolving it through `register_map`.
    ///
    /// A register lookup miss is a hard error: it means the IL references a
    /// register the current processor spec never declared. An unrecognised
    /// address space (`join`, `iop`, `fspec`, or anything else) is likewise
    /// rejected rather than guessed at.
    pub fn from_varnode(varnode: &RawVarnode, register_map: &RegisterMap) -> Result<Self> {
        let space = varnode.space.as_str();
        if matches!(space, "ram" | "data" | "code" | "stack") {
            return Ok(VarReference::Memory {
                address: varnode.offset,
                width: varnode.size,
            });
        }
        if space == "const" {
            return Ok(VarReference::Constant {
                value: varnode.offset,
                width: varnode.size,
            });
        }
        if space == "register" {
            let (index, _) = register_map
                .lookup(varnode.offset, varnode.size)
                .ok_or(Error::InvalidRegisterLookup {
                    offset: varnode.offset,
                    width: varnode.size,
                })?;
            return Ok(VarReference::RegisterRef {
                index,
                width: varnode.size,
            });
        }
        if space == "unique" {
            return Ok(VarReference::Unique {
                slot: varnode.offset,
                width: varnode.size,
            });
        }
        Err(Error::BadVarSpace {
            space: space.to_owned(),
        })
    }

    pub fn width(&self) -> u64 {
        match self {
            VarReference::Constant { width, .. }
            | VarReference::RegisterRef { width, .. }
            | VarReference::Memory { width, .. }
            | VarReference::Unique { width, .. } => *width,
        }
    }

    pub fn as_register_index(&self) -> Option<u32> {
        match self {
            VarReference::RegisterRef { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// True iff the register this reference names contains the substring
    /// `sp` anywhere in its stored name (see [`crate::ilop::modifies_sp`]).
    pub fn register_name_contains_sp(&self, register_map: &RegisterMap) -> bool {
        match self {
            VarReference::RegisterRef { index, .. } => register_map
                .get(*index)
                .is_some_and(|d| d.name().contains("sp")),
            _ => false,
        }
    }

    /// Pretty-prints this reference: constants as decimal, memory as hex,
    /// unique slots as `Unique{slot}`, registers by their stored name.
    pub fn text(&self, register_map: &RegisterMap) -> String {
        match self {
            VarReference::Constant { value, .. } => value.to_string(),
            VarReference::Memory { address, .. } => format!("0x{address:x}"),
            VarReference::Unique { slot, .. } => format!("Unique{{{slot}}}"),
            VarReference::RegisterRef { index, .. } => register_map
                .get(*index)
                .map(|d| d.name().to_owned())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::RegisterDescriptor;

    fn varnode(space: &str, offset: u64, size: u64) -> RawVarnode {
        RawVarnode {
            space: space.to_owned(),
            offset,
            size,
        }
    }

    #[test]
    fn maps_memory_spaces() {
        let map = RegisterMap::new();
        for space in ["ram", "data", "code", "stack"] {
            let v = VarReference::from_varnode(&varnode(space, 0x10, 4), &map).unwrap();
            assert!(matches!(
                v,
                VarReference::Memory {
                    address: 0x10,
                    width: 4
                }
            ));
        }
    }

    #[test]
    fn maps_const_and_unique() {
        let map = RegisterMap::new();
        let c = VarReference::from_varnode(&varnode("const", 5, 8), &map).unwrap();
        assert!(matches!(c, VarReference::Constant { value: 5, width: 8 }));

        let u = VarReference::from_varnode(&varnode("unique", 0x20, 4), &map).unwrap();
        assert!(matches!(u, VarReference::Unique { slot: 0x20, width: 4 }));
    }

    #[test]
    fn register_lookup_miss_is_an_error() {
        let map = RegisterMap::new();
        let err = VarReference::from_varnode(&varnode("register", 0, 4), &map).unwrap_err();
        assert!(matches!(err, Error::InvalidRegisterLookup { .. }));
    }

    #[test]
    fn register_lookup_hit_resolves_to_index() {
        let map = RegisterMap::from_entries(vec![RegisterDescriptor::new("rsp", 0x20, 8)]);
        let v = VarReference::from_varnode(&varnode("register", 0x20, 8), &map).unwrap();
        assert_eq!(v.as_register_index(), Some(0));
        assert!(v.register_name_contains_sp(&map));
    }

    #[test]
    fn unknown_space_is_bad_var_space() {
        let map = RegisterMap::new();
        let err = VarReference::from_varnode(&varnode("join", 0, 4), &map).unwrap_err();
        assert!(matches!(err, Error::BadVarSpace { .. }));
    }
}
