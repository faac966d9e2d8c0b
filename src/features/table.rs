use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::kmer::GenomeFeatureVector;
use crate::error::Result;

/// 表的实体类型，决定 CSV 中 id 列的名字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Bacteria,
    Phage,
}

impl EntityKind {
    pub fn id_column(self) -> &'static str {
        match self {
            EntityKind::Bacteria => "species",
            EntityKind::Phage => "phage_id",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub source: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: String,
    pub record: Option<String>,
    pub genome_length: usize,
    pub gc_percent: f64,
    /// 与 `FeatureTable::columns` 一一对应
    pub values: Vec<f64>,
}

/// 一组共享同一 k-mer 词表的特征行。
/// 词表为表内所有行出现过的 k-mer 的并集；某行没出现的 k-mer 记为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub kind: EntityKind,
    /// k-mer 名（不带 `kmer_` 前缀，大写）
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
    pub meta: SnapshotMeta,
}

impl FeatureTable {
    pub fn new(kind: EntityKind, columns: Vec<String>, rows: Vec<FeatureRow>) -> Self {
        Self { kind, columns, rows, meta: SnapshotMeta::default() }
    }

    pub fn from_vectors(kind: EntityKind, vectors: Vec<GenomeFeatureVector>) -> Self {
        let vocab: BTreeSet<&str> = vectors
            .iter()
            .flat_map(|v| v.kmers.keys().map(String::as_str))
            .collect();
        let columns: Vec<String> = vocab.into_iter().map(str::to_string).collect();

        let rows = vectors
            .iter()
            .map(|v| FeatureRow {
                id: v.id.clone(),
                record: v.record.clone(),
                genome_length: v.genome_length,
                gc_percent: v.gc_percent,
                values: columns.iter().map(|c| v.frequency(c)).collect(),
            })
            .collect();

        Self::new(kind, columns, rows)
    }

    pub fn set_meta(&mut self, meta: SnapshotMeta) {
        self.meta = meta;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.id.clone()).collect()
    }

    pub fn column_index(&self, kmer: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == kmer)
    }

    /// 按给定列名投影出行向量（行优先），缺失的列取 0
    pub fn project(&self, columns: &[String]) -> Vec<Vec<f64>> {
        let idx: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        self.rows
            .iter()
            .map(|row| {
                idx.iter()
                    .map(|i| i.map(|i| row.values[i]).unwrap_or(0.0))
                    .collect()
            })
            .collect()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = std::fs::File::create(path)?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let table: Self = bincode::deserialize_from(std::io::BufReader::new(f))?;
        Ok(table)
    }
}

/// 两张表共有的 k-mer 列（排序后返回）
pub fn common_columns(a: &FeatureTable, b: &FeatureTable) -> Vec<String> {
    let left: BTreeSet<&String> = a.columns.iter().collect();
    let right: BTreeSet<&String> = b.columns.iter().collect();
    left.intersection(&right).map(|s| (*s).clone()).collect()
}
