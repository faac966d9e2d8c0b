use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::assoc::HostVirusIndex;
use super::similarity::SimilarityMatrix;
use crate::error::{FinderError, Result};

/// 排名结果中的一项（rank 从 1 开始）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub phage_id: String,
    pub similarity: f64,
}

/// 持久化的排名记录：每个细菌行的前 K 个候选
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub bacteria: String,
    pub rank: usize,
    pub phage_id: String,
    pub similarity: f64,
}

/// 候选集合的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// 由已知宿主-病毒关联过滤得到
    Associated,
    /// 无关联或关联未命中任何噬菌体 id，退回全体噬菌体
    AllPhages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidateList {
    pub bacteria: String,
    pub source: CandidateSource,
    pub candidates: Vec<RankedCandidate>,
}

/// 病毒名（忽略大小写）作为子串出现在噬菌体 id 中即视为命中
pub fn filter_candidates<'a, I>(virus_names: I, phage_ids: &[String]) -> Vec<usize>
where
    I: IntoIterator<Item = &'a String>,
{
    let names: Vec<String> = virus_names.into_iter().map(|v| v.to_lowercase()).collect();
    if names.is_empty() {
        return Vec::new();
    }
    phage_ids
        .iter()
        .enumerate()
        .filter(|(_, pid)| {
            let pid = pid.to_lowercase();
            names.iter().any(|v| pid.contains(v.as_str()))
        })
        .map(|(j, _)| j)
        .collect()
}

/// 按分数降序选前 `top_k` 个；稳定排序，同分保持候选原顺序
pub fn select_top_k(scores: &[f64], candidates: &[usize], top_k: usize) -> Vec<usize> {
    let mut idxs = candidates.to_vec();
    idxs.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    idxs.truncate(top_k);
    idxs
}

/// 相似度矩阵 + 宿主关联索引。两者构建后只读，可在线程间共享。
pub struct SimilarityRanker {
    matrix: SimilarityMatrix,
    index: HostVirusIndex,
}

impl SimilarityRanker {
    pub fn new(matrix: SimilarityMatrix, index: HostVirusIndex) -> Self {
        Self { matrix, index }
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn index(&self) -> &HostVirusIndex {
        &self.index
    }

    /// 宿主的候选噬菌体下标及其来源
    pub fn candidates_for(&self, host: &str) -> (Vec<usize>, CandidateSource) {
        let viruses = self.index.resolve(host);
        let filtered = filter_candidates(viruses, &self.matrix.phages);
        if filtered.is_empty() {
            if viruses.is_empty() {
                log::debug!("{}: no known associated viruses, ranking all phages", host);
            } else {
                log::warn!(
                    "{}: {} associated viruses match no phage id, ranking all phages",
                    host,
                    viruses.len()
                );
            }
            ((0..self.matrix.n_phages()).collect(), CandidateSource::AllPhages)
        } else {
            (filtered, CandidateSource::Associated)
        }
    }

    fn rank_row(&self, row: usize, top_k: usize) -> RankedCandidateList {
        let host = &self.matrix.bacteria[row];
        let scores = self.matrix.row(row);
        let (candidates, source) = self.candidates_for(host);
        let top = select_top_k(scores, &candidates, top_k);

        RankedCandidateList {
            bacteria: host.clone(),
            source,
            candidates: top
                .into_iter()
                .enumerate()
                .map(|(i, j)| RankedCandidate {
                    rank: i + 1,
                    phage_id: self.matrix.phages[j].clone(),
                    similarity: scores[j],
                })
                .collect(),
        }
    }

    /// 单个宿主的前 `top_k` 个候选；同名多行时取第一行
    pub fn rank(&self, host: &str, top_k: usize) -> Result<RankedCandidateList> {
        if top_k == 0 {
            return Err(FinderError::Validation("top_k must be positive".to_string()));
        }
        let row = self
            .matrix
            .bacteria_index(host)
            .ok_or_else(|| FinderError::not_found("bacteria", host))?;
        Ok(self.rank_row(row, top_k))
    }

    /// 对每个细菌行排名，输出顺序与行顺序一致
    pub fn rank_all(&self, top_k: usize) -> Result<Vec<RankingRecord>> {
        if top_k == 0 {
            return Err(FinderError::Validation("top_k must be positive".to_string()));
        }
        let lists: Vec<RankedCandidateList> = (0..self.matrix.n_bacteria())
            .into_par_iter()
            .map(|row| self.rank_row(row, top_k))
            .collect();

        let records: Vec<RankingRecord> = lists
            .into_iter()
            .flat_map(|list| {
                let bacteria = list.bacteria;
                list.candidates.into_iter().map(move |c| RankingRecord {
                    bacteria: bacteria.clone(),
                    rank: c.rank,
                    phage_id: c.phage_id,
                    similarity: c.similarity,
                })
            })
            .collect();
        log::info!(
            "ranked {} bacteria rows, {} records (top_k = {})",
            self.matrix.n_bacteria(),
            records.len(),
            top_k
        );
        Ok(records)
    }
}
