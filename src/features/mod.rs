//! 基因组组成特征：k-mer 频率向量、特征表及其二进制快照。

pub mod extract;
pub mod kmer;
pub mod table;

pub use extract::{extract_bacteria, extract_phages};
pub use kmer::{kmer_frequencies, GenomeFeatureVector, DEFAULT_K};
pub use table::{common_columns, EntityKind, FeatureRow, FeatureTable, SnapshotMeta};
