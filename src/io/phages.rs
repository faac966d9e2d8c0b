//! Phage genome lookup by FASTA record id.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::fasta::FastaReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhageLookup {
    /// Uppercased genome sequence.
    Found(Vec<u8>),
    NotFound,
}

pub trait PhageSequenceStore: Sync {
    fn lookup(&self, phage_id: &str) -> Result<PhageLookup>;
}

/// Streams a multi-FASTA file on every lookup; nothing is kept between calls.
#[derive(Debug, Clone)]
pub struct FastaPhageStore {
    path: PathBuf,
}

impl FastaPhageStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl PhageSequenceStore for FastaPhageStore {
    fn lookup(&self, phage_id: &str) -> Result<PhageLookup> {
        let mut reader = FastaReader::open(&self.path)?;
        Ok(match reader.find_record(phage_id)? {
            Some(rec) => PhageLookup::Found(rec.seq),
            None => PhageLookup::NotFound,
        })
    }
}

/// Preloaded genomes keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct MemoryPhageStore {
    genomes: HashMap<String, Vec<u8>>,
}

impl MemoryPhageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, phage_id: impl Into<String>, seq: &[u8]) {
        self.genomes.insert(phage_id.into(), seq.to_ascii_uppercase());
    }

    /// Load only the requested ids in a single pass over the FASTA.
    /// First record wins when ids repeat, as with `FastaPhageStore`.
    pub fn from_fasta_ids<P: AsRef<Path>>(path: P, ids: &[String]) -> Result<Self> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut store = Self::new();
        let mut reader = FastaReader::open(path.as_ref())?;
        while store.genomes.len() < wanted.len() {
            let rec = match reader.next_record()? {
                Some(rec) => rec,
                None => break,
            };
            if wanted.contains(rec.id.as_str()) {
                store.genomes.entry(rec.id).or_insert(rec.seq);
            }
        }
        log::info!("loaded {} of {} requested phage genomes", store.genomes.len(), wanted.len());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }
}

impl PhageSequenceStore for MemoryPhageStore {
    fn lookup(&self, phage_id: &str) -> Result<PhageLookup> {
        Ok(match self.genomes.get(phage_id) {
            Some(seq) => PhageLookup::Found(seq.clone()),
            None => PhageLookup::NotFound,
        })
    }
}
