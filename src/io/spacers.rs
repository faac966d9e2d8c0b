//! Per-host CRISPR spacer cache and CRISPRCasFinder result parsing.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::Result;
use crate::util::dna;

/// Spacer length bounds accepted from CRISPRCasFinder output.
pub const MIN_SPACER_LEN: usize = 20;
pub const MAX_SPACER_LEN: usize = 80;

/// The three cache states are reported to callers as-is; none of them is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpacerLoad {
    /// No cache entry for this host.
    Absent,
    /// Entry exists but holds no spacers.
    Empty,
    Populated(Vec<String>),
}

pub trait SpacerCache: Sync {
    fn load(&self, host: &str) -> Result<SpacerLoad>;
}

/// One `<host>.txt` per host under `root`, one spacer per line.
#[derive(Debug, Clone)]
pub struct DirSpacerCache {
    root: PathBuf,
}

impl DirSpacerCache {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, host: &str) -> PathBuf {
        self.root.join(format!("{}.txt", host))
    }
}

impl SpacerCache for DirSpacerCache {
    fn load(&self, host: &str) -> Result<SpacerLoad> {
        let path = self.path_for(host);
        if !path.exists() {
            log::debug!("no spacer cache at {}", path.display());
            return Ok(SpacerLoad::Absent);
        }
        let text = std::fs::read_to_string(&path)?;
        let spacers: Vec<String> = text
            .lines()
            .map(|l| l.trim().to_ascii_uppercase())
            .filter(|l| !l.is_empty())
            .collect();
        if spacers.is_empty() {
            Ok(SpacerLoad::Empty)
        } else {
            Ok(SpacerLoad::Populated(spacers))
        }
    }
}

fn accept_spacer(seq: &str) -> Option<String> {
    let s = seq.trim().to_ascii_uppercase();
    let ok_len = (MIN_SPACER_LEN..=MAX_SPACER_LEN).contains(&s.len());
    (ok_len && s.bytes().all(dna::is_acgt)).then_some(s)
}

fn walk(v: &Value, out: &mut BTreeSet<String>) {
    match v {
        Value::Object(map) => {
            let is_spacer = map.get("Type").and_then(Value::as_str) == Some("Spacer");
            if is_spacer {
                if let Some(s) = map.get("Sequence").and_then(Value::as_str).and_then(accept_spacer) {
                    out.insert(s);
                }
            }
            for child in map.values() {
                walk(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, out);
            }
        }
        _ => {}
    }
}

/// Collect every `{"Type": "Spacer", "Sequence": ...}` object anywhere in a
/// CRISPRCasFinder `result.json` tree. Deduplicated and sorted.
pub fn extract_spacers(result: &Value) -> Vec<String> {
    let mut out = BTreeSet::new();
    walk(result, &mut out);
    out.into_iter().collect()
}

pub fn extract_spacers_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    Ok(extract_spacers(&value))
}

/// Write `<root>/<host>.txt`; an empty list produces an empty file, i.e. `SpacerLoad::Empty`.
pub fn write_spacers<P: AsRef<Path>>(root: P, host: &str, spacers: &[String]) -> Result<PathBuf> {
    let root = root.as_ref();
    std::fs::create_dir_all(root)?;
    let path = root.join(format!("{}.txt", host));
    let mut w = std::io::BufWriter::new(std::fs::File::create(&path)?);
    for s in spacers {
        writeln!(w, "{}", s)?;
    }
    w.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("phage_finder_spacers_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn cache_tri_state() {
        let root = scratch_dir("tri");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("Empty_host.txt"), "\n  \n").unwrap();
        std::fs::write(root.join("Escherichia_coli.txt"), "acgtacgtacgtacgtacgt\n\n  TTTTGGGGCCCCAAAATTTT \n").unwrap();

        let cache = DirSpacerCache::new(&root);
        assert_eq!(cache.load("Nobody").unwrap(), SpacerLoad::Absent);
        assert_eq!(cache.load("Empty_host").unwrap(), SpacerLoad::Empty);
        assert_eq!(
            cache.load("Escherichia_coli").unwrap(),
            SpacerLoad::Populated(vec![
                "ACGTACGTACGTACGTACGT".to_string(),
                "TTTTGGGGCCCCAAAATTTT".to_string(),
            ])
        );
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn extraction_filters_and_dedups() {
        let doc = json!({
            "Sequences": [{
                "Crisprs": [{
                    "Regions": [
                        {"Type": "LeftFLANK", "Sequence": "ACGTACGTACGTACGTACGTACGT"},
                        {"Type": "Spacer", "Sequence": " ttttggggccccaaaattttgg "},
                        {"Type": "Spacer", "Sequence": "TTTTGGGGCCCCAAAATTTTGG"},
                        {"Type": "Spacer", "Sequence": "ACGT"},
                        {"Type": "Spacer", "Sequence": "ACGTNACGTACGTACGTACGTA"},
                        {"Type": "Spacer", "Sequence": "AAAAACCCCCGGGGGTTTTTA"}
                    ]
                }]
            }]
        });
        let spacers = extract_spacers(&doc);
        assert_eq!(spacers, vec!["AAAAACCCCCGGGGGTTTTTA", "TTTTGGGGCCCCAAAATTTTGG"]);
    }

    #[test]
    fn written_spacers_load_back() {
        let root = scratch_dir("write");
        let spacers = vec!["ACGTACGTACGTACGTACGT".to_string()];
        let path = write_spacers(&root, "Proteus_mirabilis", &spacers).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ACGTACGTACGTACGTACGT\n");

        write_spacers(&root, "Nothing_found", &[]).unwrap();
        let cache = DirSpacerCache::new(&root);
        assert_eq!(cache.load("Proteus_mirabilis").unwrap(), SpacerLoad::Populated(spacers));
        assert_eq!(cache.load("Nothing_found").unwrap(), SpacerLoad::Empty);
        std::fs::remove_dir_all(&root).ok();
    }
}
