//! Offset/width → register-descriptor lookup with sub-width fallback
//! (design 4.D).

/// One entry of the decoder's register table.
///
/// `(offset, size)` is unique within a single [`RegisterMap`]; `name` is not,
/// since some architectures alias several widths onto the same offset.
#[derive(Clone, Debug)]
pub struct RegisterDescriptor {
    name: String,
    offset: u64,
    size: u64,
    scratch: u64,
}

impl RegisterDescriptor {
    /// Creates a descriptor for a register named `name`, occupying `size`
    /// bytes at `offset` in the decoder's `register` address space.
    ///
    /// # Examples
    ///
    /// ```
    /// use sleigh_ir::{RegisterDescriptor, RegisterMap};
    ///
    /// let map = RegisterMap::from_entries(vec![RegisterDescriptor::new("rax", 0x0, 8)]);
    /// let (index, found) = map.lookup(0x0, 8).unwrap();
    /// assert_eq!(found.name(), "rax");
    /// assert_eq!(index, 0);
    /// ```
    pub fn new(name: impl Into<String>, offset: u64, size: u64) -> Self {
        RegisterDescriptor {
            name: name.into(),
            offset,
            size,
            scratch: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn scratch(&self) -> u64 {
        self.scratch
    }

    pub fn set_scratch(&mut self, value: u64) {
        self.scratch = value;
    }
}

/// Divisors tried, in order, when no exact `(offset, width)` match exists.
/// Smaller divisors are preferred, matching the lookup contract.
const FALLBACK_DIVISORS: [u64; 3] = [2, 4, 8];

/// A flat table of [`RegisterDescriptor`]s, built once from the decoder's
/// register table and never resized afterwards.
///
/// `VarReference::RegisterRef` stores a stable index into this table rather
/// than a descriptor copy or a raw pointer, so the table's entries must keep
/// their position for the lifetime of the owning runtime.
#[derive(Clone, Debug, Default)]
pub struct RegisterMap {
    entries: Vec<RegisterDescriptor>,
}

impl RegisterMap {
    pub fn new() -> Self {
        RegisterMap {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<RegisterDescriptor>) -> Self {
        RegisterMap { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetches a descriptor by its stable index (a `RegisterRef` handle).
    pub fn get(&self, index: u32) -> Option<&RegisterDescriptor> {
        self.entries.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut RegisterDescriptor> {
        self.entries.get_mut(index as usize)
    }

    /// Looks up the register covering `width` bytes at `offset`.
    ///
    /// Tries an exact `(offset, width)` match first; failing that, looks for
    /// a register at the same offset whose stored width is `width * m` for
    /// `m` in `{2, 4, 8}`, smallest `m` first. This compensates for
    /// architectures (e.g. RISC-V) that do not expose sub-width register
    /// varnodes.
    pub fn lookup(&self, offset: u64, width: u64) -> Option<(u32, &RegisterDescriptor)> {
        if let Some((idx, desc)) = self.find(offset, width) {
            return Some((idx, desc));
        }
        for &m in &FALLBACK_DIVISORS {
            if let Some(wider) = width.checked_mul(m) {
                if let Some((idx, desc)) = self.find(offset, wider) {
                    return Some((idx, desc));
                }
            }
        }
        None
    }

    fn find(&self, offset: u64, width: u64) -> Option<(u32, &RegisterDescriptor)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, d)| d.offset() == offset && d.size() == width)
            .map(|(i, d)| (i as u32, d))
    }
}
