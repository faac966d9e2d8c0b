use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::matcher::count_spacer_hits;
use crate::error::{validate_max_mismatches, FinderError, Result};
use crate::io::phages::{PhageLookup, PhageSequenceStore};
use crate::io::spacers::{SpacerCache, SpacerLoad};

/// 批量检查的整体状态，对应 spacer 缓存的三种情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// 该宿主没有缓存条目：无从检查
    NoCache,
    /// 有缓存条目但没有 spacer：无从检查
    NoSpacers,
    /// 已检查（可能 0 命中）
    Ok,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub phage_id: String,
    pub spacer_count: usize,
    pub hit_count: usize,
    #[serde(rename = "match")]
    pub is_match: bool,
}

/// 批量结果中的一项：成功的匹配结果，或单个噬菌体的失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Checked(MatchResult),
    Failed { phage_id: String, error: String },
}

impl BatchEntry {
    pub fn phage_id(&self) -> &str {
        match self {
            BatchEntry::Checked(r) => &r.phage_id,
            BatchEntry::Failed { phage_id, .. } => phage_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub bacteria: String,
    pub status: CheckStatus,
    pub max_mismatches: usize,
    pub spacer_count: usize,
    pub results: Vec<BatchEntry>,
}

/// 逗号分隔的噬菌体 id，去掉空白项
pub fn parse_phage_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 单个噬菌体：取序列并统计命中；序列不存在时返回 NotFound
pub fn match_phage<S>(spacers: &[String], store: &S, phage_id: &str, max_mismatches: usize) -> Result<MatchResult>
where
    S: PhageSequenceStore + ?Sized,
{
    let genome = match store.lookup(phage_id)? {
        PhageLookup::Found(seq) => seq,
        PhageLookup::NotFound => return Err(FinderError::not_found("phage", phage_id)),
    };
    let hits = count_spacer_hits(spacers, &genome, max_mismatches);
    log::debug!(
        "{}: {}/{} spacers hit ({} bp, <= {} mismatches)",
        phage_id,
        hits.hit_count,
        hits.spacer_count,
        genome.len(),
        max_mismatches
    );
    Ok(MatchResult {
        phage_id: phage_id.to_string(),
        spacer_count: hits.spacer_count,
        hit_count: hits.hit_count,
        is_match: hits.is_match(),
    })
}

/// 对一个宿主批量检查多个噬菌体。
/// 错配上限先校验；缓存缺失/为空时直接返回对应状态；
/// 单个噬菌体的失败记录为失败项，不影响其他噬菌体。结果顺序与请求顺序一致。
pub fn check_batch<C, S>(
    cache: &C,
    store: &S,
    host: &str,
    phage_ids: &[String],
    max_mismatches: i64,
) -> Result<BatchReport>
where
    C: SpacerCache + ?Sized,
    S: PhageSequenceStore + ?Sized,
{
    let max_mm = validate_max_mismatches(max_mismatches)?;

    let spacers = match cache.load(host)? {
        SpacerLoad::Absent => {
            log::info!("{}: no spacer cache", host);
            return Ok(BatchReport {
                bacteria: host.to_string(),
                status: CheckStatus::NoCache,
                max_mismatches: max_mm,
                spacer_count: 0,
                results: Vec::new(),
            });
        }
        SpacerLoad::Empty => {
            log::info!("{}: spacer cache is empty", host);
            return Ok(BatchReport {
                bacteria: host.to_string(),
                status: CheckStatus::NoSpacers,
                max_mismatches: max_mm,
                spacer_count: 0,
                results: Vec::new(),
            });
        }
        SpacerLoad::Populated(s) => s,
    };

    let results: Vec<BatchEntry> = phage_ids
        .par_iter()
        .map(|id| match match_phage(&spacers, store, id, max_mm) {
            Ok(r) => BatchEntry::Checked(r),
            Err(e) => {
                log::debug!("{}: {}", id, e);
                BatchEntry::Failed {
                    phage_id: id.clone(),
                    error: e.to_string(),
                }
            }
        })
        .collect();

    let failed: Vec<&str> = results
        .iter()
        .filter(|e| matches!(e, BatchEntry::Failed { .. }))
        .map(BatchEntry::phage_id)
        .collect();
    if !failed.is_empty() {
        log::warn!("{}: {} of {} phages not checked: {}", host, failed.len(), results.len(), failed.join(","));
    }

    Ok(BatchReport {
        bacteria: host.to_string(),
        status: CheckStatus::Ok,
        max_mismatches: max_mm,
        spacer_count: spacers.len(),
        results,
    })
}
