//! Orchestrates the decoder, target, and register map over a full image
//! (design 4.I).

use std::path::Path;

use tracing::{debug, instrument, trace, warn};

use crate::block::ILBlock;
use crate::config::{InputSource, LiftConfig};
use crate::decode::Decode;
use crate::error::{Error, Result};
use crate::ffi::DecoderHandle;
use crate::loader;
use crate::register::{RegisterDescriptor, RegisterMap};
use crate::target::Target;

/// Lifecycle state of a [`Runtime`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RuntimeState {
    Empty,
    Loaded,
    Lifted,
}

/// Owns the decoder handle, the current target, and the register map built
/// from it, and drives the lift loop described in the design.
///
/// Generic over the decoder implementation so the lift loop can be driven
/// against a fake in tests; [`Runtime::new`] returns the real, FFI-backed
/// variant.
///
/// A `Runtime` is single-use with respect to targets: [`Runtime::load_target`]
/// may only be called once per instance, matching the external decoder's
/// process-wide mutable state (see the concurrency model notes).
pub struct Runtime<D: Decode = DecoderHandle> {
    decoder: D,
    target: Option<Target>,
    register_map: RegisterMap,
    state: RuntimeState,
}

impl Runtime<DecoderHandle> {
    /// Creates a fresh runtime backed by the real decoder: a new decoder
    /// instance, no target, and an empty register map.
    pub fn new() -> Result<Self> {
        Ok(Runtime::with_decoder(DecoderHandle::new()?))
    }
}

impl<D: Decode> Runtime<D> {
    /// Builds a runtime around an arbitrary [`Decode`] implementation.
    pub fn with_decoder(decoder: D) -> Self {
        Runtime {
            decoder,
            target: None,
            register_map: RegisterMap::new(),
            state: RuntimeState::Empty,
        }
    }

    pub fn register_map(&self) -> &RegisterMap {
        &self.register_map
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Builds a target from `config`'s input source via the loader (4.J) and
    /// loads it, the single-call equivalent of the out-of-scope CLI invoking
    /// the loader itself before handing regions to the runtime.
    ///
    /// Fails with [`Error::NoInputMode`] if `config` names neither a raw
    /// file nor a dump file to read regions from.
    #[instrument(skip_all)]
    pub fn load_input(&mut self, config: LiftConfig) -> Result<()> {
        let regions = match config.input() {
            Some(InputSource::RawFile(path)) => loader::raw_file_to_regions(path)?,
            Some(InputSource::Dump(path)) => loader::dump_to_regions(path)?,
            None => return Err(Error::NoInputMode),
        };
        let mut target = Target::from_regions(regions);

        let config = if let Some(pspec_path) = config.pspec_path().map(Path::to_path_buf) {
            let mut pairs = loader::context_pairs_from_spec(&pspec_path)?;
            pairs.extend(config.context_pairs().iter().cloned());
            config.with_context_pairs(pairs)
        } else {
            config
        };

        target.set_spec_path(config.sla_path().to_path_buf());
        self.load_target(target, config)
    }

    /// Loads `target` into the decoder, applying `config` on top of it
    /// first (load base, alignment, context pairs, and spec path — the
    /// in-process equivalent of the out-of-scope CLI's flags).
    ///
    /// Fails with [`Error::TargetPresent`] if a target has already been
    /// loaded; this runtime is single-use.
    #[instrument(skip_all)]
    pub fn load_target(&mut self, mut target: Target, config: LiftConfig) -> Result<()> {
        if self.target.is_some() {
            return Err(Error::TargetPresent);
        }

        target.set_base_address(config.load_base());
        target.set_alignment(config.alignment());
        if !config.context_pairs().is_empty() {
            target.set_context_pairs(config.context_pairs().to_vec());
        }
        target.set_spec_path(config.sla_path().to_path_buf());

        debug!(path = %target.spec_path().display(), "loading processor spec");
        self.decoder.load_spec(target.spec_path())?;
        self.decoder.begin()?;

        for (name, value) in target.context_pairs() {
            let truncated = *value as u32;
            if let Err(err) = self.decoder.set_context_default(name, truncated) {
                warn!(name, "skipping unknown context variable: {err}");
                continue;
            }
        }

        let raw_registers = self.decoder.registers()?;
        debug!(count = raw_registers.len(), "fetched register table");
        let entries = raw_registers
            .into_iter()
            .map(|r| RegisterDescriptor::new(r.name, r.offset, r.size))
            .collect();
        self.register_map = RegisterMap::from_entries(entries);

        for region in target.regions_rebased() {
            trace!(base = %format_args!("{:#x}", region.base()), len = region.len(), "staging region");
            self.decoder.load_bytes(region.base(), region.data())?;
        }

        self.target = Some(target);
        self.state = RuntimeState::Loaded;
        Ok(())
    }

    /// Walks the target's address space from its load base and returns the
    /// summarised IL blocks in strictly increasing `base_address` order.
    ///
    /// Only two failure kinds are recovered locally: an address the decoder
    /// can't decode (the cursor steps forward by the target's alignment) and
    /// a block whose operand referenced a register the current map doesn't
    /// know (`Error::InvalidRegisterLookup`; the cursor steps forward by the
    /// reported instruction size and the block is skipped). Every other
    /// error, including an operand naming an unsupported address space
    /// (`Error::BadVarSpace`), aborts the pass and propagates to the caller.
    #[instrument(skip_all)]
    pub fn perform_lift(&mut self) -> Result<Vec<ILBlock>> {
        if self.target.is_none() {
            return Err(Error::NoTarget);
        }

        let mut out = Vec::new();
        let mut cursor = self.target.as_ref().unwrap().base_address();

        loop {
            let next = match &self.target {
                Some(t) => t.next_address(cursor),
                None => return Err(Error::NoTarget),
            };
            let Some(addr) = next else { break };
            cursor = addr;

            let alignment = self.target.as_ref().unwrap().alignment();
            match self.decoder.lift_at(cursor) {
                Ok(None) => {
                    trace!(address = %format_args!("{cursor:#x}"), "undecodable, skipping");
                    cursor += alignment;
                }
                Ok(Some(raw)) => {
                    let size = raw.size;
                    match ILBlock::from_raw(&raw, &self.register_map) {
                        Ok(block) => {
                            out.push(block);
                        }
                        Err(err @ Error::InvalidRegisterLookup { .. }) => {
                            warn!(address = %format_args!("{cursor:#x}"), "skipping malformed block: {err}");
                        }
                        Err(err) => return Err(err),
                    }
                    cursor += size;
                }
                Err(err) => return Err(err),
            }
        }

        self.state = RuntimeState::Lifted;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use super::*;
    use crate::ffi::{RawInsn, RawPcodeOp, RawRegister, RawVarnode};
    use crate::opcode;
    use crate::region::MemoryRegion;

    /// An in-memory stand-in for the external decoder: a fixed map from
    /// address to raw instruction, with everything else a no-op.
    #[derive(Default)]
    struct FakeDecoder {
        insns: BTreeMap<u64, RawInsn>,
        registers: Vec<RawRegister>,
    }

    impl FakeDecoder {
        fn with_insns(insns: Vec<RawInsn>) -> Self {
            FakeDecoder {
                insns: insns.into_iter().map(|i| (i.address, i)).collect(),
                registers: vec![RawRegister {
                    name: "rsp".into(),
                    space: "register".into(),
                    offset: 0x20,
                    size: 8,
                }],
            }
        }
    }

    impl Decode for FakeDecoder {
        fn load_spec(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn begin(&mut self) -> Result<()> {
            Ok(())
        }

        fn set_context_default(&mut self, _key: &str, _value: u32) -> Result<()> {
            Ok(())
        }

        fn load_bytes(&mut self, _address: u64, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        fn lift_at(&mut self, address: u64) -> Result<Option<RawInsn>> {
            Ok(self.insns.get(&address).cloned())
        }

        fn registers(&self) -> Result<Vec<RawRegister>> {
            Ok(self.registers.clone())
        }

        fn user_ops(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn insn(address: u64, size: u64, opcode: i32) -> RawInsn {
        RawInsn {
            address,
            size,
            mnemonic: "insn".into(),
            body: String::new(),
            ops: vec![RawPcodeOp {
                opcode,
                output: None,
                inputs: vec![],
            }],
        }
    }

    fn insn_with_input(address: u64, size: u64, opcode: i32, input: RawVarnode) -> RawInsn {
        RawInsn {
            address,
            size,
            mnemonic: "insn".into(),
            body: String::new(),
            ops: vec![RawPcodeOp {
                opcode,
                output: None,
                inputs: vec![input],
            }],
        }
    }

    fn loaded_runtime(decoder: FakeDecoder, region_len: u64) -> Runtime<FakeDecoder> {
        let mut rt = Runtime::with_decoder(decoder);
        let target = Target::from_regions(vec![MemoryRegion::new(
            "image",
            0,
            vec![0u8; region_len as usize],
        )]);
        let config = LiftConfig::new("spec.sla");
        rt.load_target(target, config).unwrap();
        rt
    }

    #[test]
    fn perform_lift_without_target_is_no_target() {
        let mut rt = Runtime::with_decoder(FakeDecoder::default());
        assert!(matches!(rt.perform_lift(), Err(Error::NoTarget)));
    }

    #[test]
    fn load_input_without_a_source_is_no_input_mode() {
        let mut rt = Runtime::with_decoder(FakeDecoder::default());
        let config = LiftConfig::new("spec.sla");
        assert!(matches!(rt.load_input(config), Err(Error::NoInputMode)));
    }

    #[test]
    fn load_input_reads_a_raw_file_into_a_single_region() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 8]).unwrap();

        let mut rt = Runtime::with_decoder(FakeDecoder::with_insns(vec![insn(
            0x0,
            2,
            opcode::RETURN,
        )]));
        let config = LiftConfig::new("spec.sla").with_raw_file(file.path());
        rt.load_input(config).unwrap();

        let blocks = rt.perform_lift().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].address(), 0x0);
    }

    #[test]
    fn sparse_lift_skips_undecodable_gap() {
        // Decodable at 0 (size 4), undecodable 2 bytes, decodable at 6.
        let decoder =
            FakeDecoder::with_insns(vec![insn(0x0, 4, opcode::COPY), insn(0x6, 2, opcode::RETURN)]);
        let mut rt = loaded_runtime(decoder, 8);
        let blocks = rt.perform_lift().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].address(), 0x0);
        assert_eq!(blocks[1].address(), 0x6);
    }

    #[test]
    fn blocks_come_back_in_increasing_address_order() {
        let decoder = FakeDecoder::with_insns(vec![
            insn(0x0, 2, opcode::COPY),
            insn(0x2, 2, opcode::COPY),
            insn(0x4, 2, opcode::RETURN),
        ]);
        let mut rt = loaded_runtime(decoder, 6);
        let blocks = rt.perform_lift().unwrap();
        let addrs: Vec<u64> = blocks.iter().map(ILBlock::address).collect();
        assert_eq!(addrs, vec![0x0, 0x2, 0x4]);
        assert!(blocks.last().unwrap().summary().ret());
    }

    #[test]
    fn cursor_advances_past_undecodable_regions_by_alignment() {
        let decoder = FakeDecoder::with_insns(vec![insn(0x8, 2, opcode::RETURN)]);
        let mut rt = loaded_runtime(decoder, 16);
        let blocks = rt.perform_lift().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].address(), 0x8);
    }

    #[test]
    fn unresolvable_register_reference_skips_the_block_and_continues() {
        // Register space with an offset the (empty) register map has no entry for.
        let bad_register = RawVarnode {
            space: "register".into(),
            offset: 0x999,
            size: 4,
        };
        let decoder = FakeDecoder::with_insns(vec![
            insn_with_input(0x0, 2, opcode::COPY, bad_register),
            insn(0x2, 2, opcode::RETURN),
        ]);
        let mut rt = loaded_runtime(decoder, 4);
        let blocks = rt.perform_lift().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].address(), 0x2);
    }

    #[test]
    fn unsupported_address_space_aborts_the_pass() {
        let join_varnode = RawVarnode {
            space: "join".into(),
            offset: 0,
            size: 4,
        };
        let decoder =
            FakeDecoder::with_insns(vec![insn_with_input(0x0, 2, opcode::COPY, join_varnode)]);
        let mut rt = loaded_runtime(decoder, 4);
        assert!(matches!(rt.perform_lift(), Err(Error::BadVarSpace { .. })));
    }
}
