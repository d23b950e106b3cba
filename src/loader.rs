//! Deserialises region dumps and processor-spec context pairs (design 4.J).

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::region::MemoryRegion;
use crate::target::ContextPair;

/// Inputs larger than this are rejected outright rather than read in full,
/// matching the design's stated cap on dump and raw-file sizes.
const MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Deserialize)]
struct DumpRegion {
    name: String,
    base_address: u64,
    data: String,
}

/// Wraps an entire file as a single region at base `0`, named after its
/// path. Used for flat binary images with no region metadata of their own.
pub fn raw_file_to_regions(path: &Path) -> Result<Vec<MemoryRegion>> {
    let meta = fs::metadata(path).map_err(|source| Error::UnableToLoadFile {
        path: path.to_owned(),
        source,
    })?;
    if meta.len() > MAX_INPUT_BYTES {
        return Err(Error::MalformedDump(format!(
            "{} exceeds the 50 MiB input cap",
            path.display()
        )));
    }
    let data = fs::read(path).map_err(|source| Error::UnableToLoadFile {
        path: path.to_owned(),
        source,
    })?;
    let name = path.display().to_string();
    Ok(vec![MemoryRegion::new(name, 0, data)])
}

/// Parses a JSON array of `{name, base_address, data}` objects, where `data`
/// is an even-length ASCII hex string, into one [`MemoryRegion`] per object.
pub fn dump_to_regions(path: &Path) -> Result<Vec<MemoryRegion>> {
    let meta = fs::metadata(path).map_err(|source| Error::UnableToLoadFile {
        path: path.to_owned(),
        source,
    })?;
    if meta.len() > MAX_INPUT_BYTES {
        return Err(Error::MalformedDump(format!(
            "{} exceeds the 50 MiB input cap",
            path.display()
        )));
    }
    let text = fs::read_to_string(path).map_err(|source| Error::UnableToLoadFile {
        path: path.to_owned(),
        source,
    })?;
    let entries: Vec<DumpRegion> = serde_json::from_str(&text)
        .map_err(|e| Error::MalformedDump(format!("invalid region dump JSON: {e}")))?;

    entries
        .into_iter()
        .map(|entry| {
            let bytes = decode_hex(&entry.data)?;
            Ok(MemoryRegion::new(entry.name, entry.base_address, bytes))
        })
        .collect()
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(Error::MalformedDump(format!(
            "hex data has odd length {}",
            s.len()
        )));
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for pair in bytes.chunks_exact(2) {
        let hi = hex_nibble(pair[0])?;
        let lo = hex_nibble(pair[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_nibble(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(Error::MalformedDump(format!(
            "non-hex character {:?} in region data",
            c as char
        ))),
    }
}

/// Parses `<processor_spec><context_data><context_set><set name=".." val=".."/>`
/// entries out of a `.pspec` XML document.
///
/// Sets missing either attribute are skipped. A `val` that fails to parse as
/// base-10 defaults to `0` with a logged warning rather than aborting the
/// whole spec, matching the design's recovery policy for `BadContextVariable`.
pub fn context_pairs_from_spec(path: &Path) -> Result<Vec<ContextPair>> {
    let text = fs::read_to_string(path).map_err(|source| Error::UnableToLoadFile {
        path: path.to_owned(),
        source,
    })?;
    let doc = roxmltree::Document::parse(&text)
        .map_err(|e| Error::InvalidPspec(format!("{}: {e}", path.display())))?;

    let mut pairs = Vec::new();
    for set in doc
        .descendants()
        .filter(|n| n.has_tag_name("context_set"))
        .flat_map(|n| n.children())
        .filter(|n| n.has_tag_name("set"))
    {
        let (Some(name), Some(val)) = (set.attribute("name"), set.attribute("val")) else {
            continue;
        };
        let value = val.parse::<u64>().unwrap_or_else(|_| {
            warn!(name, val, "context set value is not base-10; defaulting to 0");
            0
        });
        pairs.push((name.to_owned(), value));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn dump_round_trips_hex_data() {
        let json = r#"[{"name": "fn_a", "base_address": 4096, "data": "DEADBEEF"}]"#;
        let f = write_temp(json);
        let regions = dump_to_regions(f.path()).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].name(), "fn_a");
        assert_eq!(regions[0].base(), 4096);
        assert_eq!(regions[0].data(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn dump_rejects_odd_length_hex() {
        let json = r#"[{"name": "x", "base_address": 0, "data": "ABC"}]"#;
        let f = write_temp(json);
        assert!(dump_to_regions(f.path()).is_err());
    }

    #[test]
    fn dump_rejects_non_hex_chars() {
        let json = r#"[{"name": "x", "base_address": 0, "data": "ZZ"}]"#;
        let f = write_temp(json);
        assert!(dump_to_regions(f.path()).is_err());
    }

    #[test]
    fn context_pairs_parses_sets_and_skips_incomplete_ones() {
        let xml = r#"
            <processor_spec>
              <context_data>
                <context_set>
                  <set name="addrsize" val="2"/>
                  <set name="nowval"/>
                  <set val="7"/>
                </context_set>
              </context_data>
            </processor_spec>
        "#;
        let f = write_temp(xml);
        let pairs = context_pairs_from_spec(f.path()).unwrap();
        assert_eq!(pairs, vec![("addrsize".to_owned(), 2)]);
    }

    #[test]
    fn context_pairs_defaults_unparsable_val_to_zero() {
        let xml = r#"
            <processor_spec>
              <context_data>
                <context_set>
                  <set name="weird" val="not-a-number"/>
                </context_set>
              </context_data>
            </processor_spec>
        "#;
        let f = write_temp(xml);
        let pairs = context_pairs_from_spec(f.path()).unwrap();
        assert_eq!(pairs, vec![("weird".to_owned(), 0)]);
    }
}
