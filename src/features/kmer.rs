use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{validate_kmer_size, Result};
use crate::util::dna;

/// 组成特征使用的 k-mer 长度
pub const DEFAULT_K: usize = 4;

/// 2-bit 编码允许的最大 k（4^k 个计数槽）
pub const MAX_K: usize = 12;

#[inline]
fn base_code(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// 将编码还原为 k-mer 字符串
pub fn decode_kmer(mut code: usize, k: usize) -> String {
    let mut out = vec![b'A'; k];
    for slot in out.iter_mut().rev() {
        *slot = dna::BASES[code & 3];
        code >>= 2;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// 滚动窗口统计 k-mer 出现次数。
/// 任何含非 ACGT 碱基的窗口都被跳过：遇到非法碱基时重置窗口长度。
/// 返回 (按编码索引的计数, 有效窗口总数)；k 越界时返回 `Validation`。
pub fn kmer_counts(seq: &[u8], k: usize) -> Result<(Vec<u64>, u64)> {
    let k = validate_kmer_size(k)?;
    let mut counts = vec![0u64; 1 << (2 * k)];
    let mask = (1usize << (2 * k)) - 1;
    let mut code = 0usize;
    let mut run = 0usize;
    let mut total = 0u64;

    for &b in seq {
        match base_code(b) {
            Some(c) => {
                code = ((code << 2) | c) & mask;
                run += 1;
                if run >= k {
                    counts[code] += 1;
                    total += 1;
                }
            }
            None => run = 0,
        }
    }
    Ok((counts, total))
}

/// k-mer 频率（只保留出现过的 k-mer）。无有效窗口时返回空表。
pub fn kmer_frequencies(seq: &[u8], k: usize) -> Result<BTreeMap<String, f64>> {
    let (counts, total) = kmer_counts(seq, k)?;
    let mut out = BTreeMap::new();
    if total == 0 {
        return Ok(out);
    }
    for (code, &c) in counts.iter().enumerate() {
        if c > 0 {
            out.insert(decode_kmer(code, k), c as f64 / total as f64);
        }
    }
    Ok(out)
}

/// 单个基因组的组成特征向量，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeFeatureVector {
    /// 物种名（细菌）或 FASTA 记录 id（噬菌体）
    pub id: String,
    /// 细菌表中每条 FASTA 记录单独一行，记录 id 存在这里
    pub record: Option<String>,
    pub genome_length: usize,
    pub gc_percent: f64,
    pub kmers: BTreeMap<String, f64>,
}

impl GenomeFeatureVector {
    pub fn from_sequence(id: impl Into<String>, record: Option<String>, seq: &[u8], k: usize) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            record,
            genome_length: seq.len(),
            gc_percent: dna::gc_percent(seq),
            kmers: kmer_frequencies(seq, k)?,
        })
    }

    pub fn frequency(&self, kmer: &str) -> f64 {
        self.kmers.get(kmer).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinderError;

    #[test]
    fn decode_round_trips_all_4mers() {
        assert_eq!(decode_kmer(0, 4), "AAAA");
        assert_eq!(decode_kmer(255, 4), "TTTT");
        assert_eq!(decode_kmer(0b00_01_10_11, 4), "ACGT");
    }

    #[test]
    fn frequencies_sum_to_one() {
        let seq = b"ACGTTGCAACGGTTACGATCGATCGGGCTA";
        let f = kmer_frequencies(seq, DEFAULT_K).unwrap();
        let sum: f64 = f.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(f.values().all(|&v| v > 0.0));
    }

    #[test]
    fn ambiguous_windows_are_skipped() {
        // ACGTN ACGT: only the two windows ACGT are valid
        let (counts, total) = kmer_counts(b"ACGTNACGT", 4).unwrap();
        assert_eq!(total, 2);
        assert_eq!(counts[0b00_01_10_11], 2);

        let f = kmer_frequencies(b"acgtNacgt", 4).unwrap();
        assert_eq!(f.len(), 1);
        assert!((f["ACGT"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn too_short_or_all_n_yields_empty() {
        assert!(kmer_frequencies(b"ACG", 4).unwrap().is_empty());
        assert!(kmer_frequencies(b"NNNNNNNN", 4).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_k_is_rejected() {
        assert!(matches!(kmer_counts(b"ACGT", 0), Err(FinderError::Validation(_))));
        assert!(matches!(kmer_frequencies(b"ACGT", MAX_K + 1), Err(FinderError::Validation(_))));
        assert!(GenomeFeatureVector::from_sequence("x", None, b"ACGT", 0).is_err());
    }

    #[test]
    fn feature_vector_metadata() {
        let v = GenomeFeatureVector::from_sequence("Escherichia_coli", Some("NZ_1".into()), b"GGCCAATT", 4).unwrap();
        assert_eq!(v.genome_length, 8);
        assert!((v.gc_percent - 50.0).abs() < 1e-12);
        assert_eq!(v.kmers.len(), 5);
        assert!((v.frequency("GGCC") - 0.2).abs() < 1e-12);
        assert_eq!(v.frequency("TTTT"), 0.0);
    }
}
