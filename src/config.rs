//! In-process stand-in for the out-of-scope CLI front end.
//!
//! `LiftConfig` carries the same knobs the consumer's `--base-address`,
//! `--sla`, `--pspec`, `--alignment`, `--bin`, and positional input path
//! flags would set, so the pipeline can be driven directly by library
//! callers instead of reimplementing option parsing here.

use std::path::PathBuf;

use crate::target::ContextPair;

/// Which on-disk form the input bytes are read from (the CLI's positional
/// path vs. its `--bin` dump flag, modelled as data instead of a flag).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// A flat binary image, wrapped as a single region at base `0`.
    RawFile(PathBuf),
    /// A JSON region dump, as produced by the extraction script.
    Dump(PathBuf),
}

/// Configuration handed to [`crate::runtime::Runtime::load_input`] (to build
/// and load a target from `input` in one step) or to
/// [`crate::runtime::Runtime::load_target`] alongside a caller-built
/// [`crate::target::Target`].
#[derive(Clone, Debug)]
pub struct LiftConfig {
    load_base: u64,
    alignment: u64,
    context_pairs: Vec<ContextPair>,
    sla_path: PathBuf,
    pspec_path: Option<PathBuf>,
    input: Option<InputSource>,
}

impl LiftConfig {
    pub fn new(sla_path: impl Into<PathBuf>) -> Self {
        LiftConfig {
            load_base: 0,
            alignment: 2,
            context_pairs: Vec::new(),
            sla_path: sla_path.into(),
            pspec_path: None,
            input: None,
        }
    }

    pub fn with_load_base(mut self, load_base: u64) -> Self {
        self.load_base = load_base;
        self
    }

    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment.max(1);
        self
    }

    pub fn with_context_pairs(mut self, pairs: Vec<ContextPair>) -> Self {
        self.context_pairs = pairs;
        self
    }

    pub fn with_pspec_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pspec_path = Some(path.into());
        self
    }

    /// Reads the target's bytes from a flat binary image, the equivalent of
    /// the CLI's positional input path.
    pub fn with_raw_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(InputSource::RawFile(path.into()));
        self
    }

    /// Reads the target's bytes from a JSON region dump, the equivalent of
    /// the CLI's `--bin` flag.
    pub fn with_dump_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(InputSource::Dump(path.into()));
        self
    }

    pub fn load_base(&self) -> u64 {
        self.load_base
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn context_pairs(&self) -> &[ContextPair] {
        &self.context_pairs
    }

    pub fn sla_path(&self) -> &std::path::Path {
        &self.sla_path
    }

    pub fn pspec_path(&self) -> Option<&std::path::Path> {
        self.pspec_path.as_deref()
    }

    pub fn input(&self) -> Option<&InputSource> {
        self.input.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_config_has_no_input_source() {
        let config = LiftConfig::new("spec.sla");
        assert!(config.input().is_none());
    }

    #[test]
    fn with_raw_file_records_the_input_source() {
        let config = LiftConfig::new("spec.sla").with_raw_file("image.bin");
        assert_eq!(
            config.input(),
            Some(&InputSource::RawFile(PathBuf::from("image.bin")))
        );
    }
}
