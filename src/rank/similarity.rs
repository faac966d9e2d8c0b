use rayon::prelude::*;

use crate::error::{FinderError, Result};
use crate::features::{common_columns, FeatureTable};

/// 归一化时加到范数上的小量，避免全零行除零
pub const NORM_EPS: f64 = 1e-12;

/// 行向量 L2 归一化（范数加 eps）；全零行保持为零向量
pub fn l2_normalize(v: &[f64]) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt() + NORM_EPS;
    v.iter().map(|x| x / norm).collect()
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// 两个向量的余弦相似度，任一向量全零时为 0
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    dot(&l2_normalize(a), &l2_normalize(b))
}

/// 细菌 × 噬菌体的稠密余弦相似度矩阵（行优先），构建后只读
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    pub bacteria: Vec<String>,
    pub phages: Vec<String>,
    /// 参与计算的 k-mer 列（两张表的交集）
    pub kmers: Vec<String>,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// 只使用两张表共有的 k-mer 列；交集为空时无法构建矩阵
    pub fn build(bacteria: &FeatureTable, phages: &FeatureTable) -> Result<Self> {
        let kmers = common_columns(bacteria, phages);
        if kmers.is_empty() {
            return Err(FinderError::DegenerateInput(
                "no common k-mer columns between bacteria and phage feature tables".to_string(),
            ));
        }

        let b_norm: Vec<Vec<f64>> = bacteria.project(&kmers).iter().map(|r| l2_normalize(r)).collect();
        let p_norm: Vec<Vec<f64>> = phages.project(&kmers).iter().map(|r| l2_normalize(r)).collect();

        let scores: Vec<f64> = b_norm
            .par_iter()
            .flat_map_iter(|b| p_norm.iter().map(move |p| dot(b, p)))
            .collect();

        log::info!(
            "similarity matrix built: {} bacteria x {} phages over {} shared k-mers",
            b_norm.len(),
            p_norm.len(),
            kmers.len()
        );

        Ok(Self {
            bacteria: bacteria.ids(),
            phages: phages.ids(),
            kmers,
            scores,
        })
    }

    pub fn n_bacteria(&self) -> usize {
        self.bacteria.len()
    }

    pub fn n_phages(&self) -> usize {
        self.phages.len()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.phages.len();
        &self.scores[i * n..(i + 1) * n]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.phages.len() + j]
    }

    /// 第一条 id 等于 `host` 的细菌行
    pub fn bacteria_index(&self, host: &str) -> Option<usize> {
        self.bacteria.iter().position(|b| b == host)
    }
}
