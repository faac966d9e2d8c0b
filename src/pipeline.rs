use std::path::Path;

use crate::config::FinderConfig;
use crate::crispr::{check_batch, BatchReport};
use crate::error::{validate_max_mismatches, validate_top_k, FinderError, Result};
use crate::features::{EntityKind, FeatureTable};
use crate::io::associations::{filter_associations, load_associations, load_host_list, save_associations, AssociationRow};
use crate::io::features::load_feature_table;
use crate::io::phages::{FastaPhageStore, MemoryPhageStore};
use crate::io::ranking::save_ranking;
use crate::io::spacers::DirSpacerCache;
use crate::rank::{HostVirusIndex, RankedCandidateList, RankingRecord, SimilarityMatrix, SimilarityRanker};

/// CSV 或 `.fvs` 快照，按扩展名区分；实体类型必须与用途一致
fn load_table(path: &Path, kind: EntityKind) -> Result<FeatureTable> {
    let table = load_feature_table(path)?;
    if table.kind != kind {
        return Err(FinderError::Validation(format!(
            "'{}' holds {:?} features, expected {:?}",
            path.display(),
            table.kind,
            kind
        )));
    }
    Ok(table)
}

/// 从特征表与关联表构建排名器（一次快照，构建后只读）
pub fn load_ranker<P, Q, R>(bacteria_features: P, phage_features: Q, associations: R) -> Result<SimilarityRanker>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let bacteria = load_table(bacteria_features.as_ref(), EntityKind::Bacteria)?;
    let phages = load_table(phage_features.as_ref(), EntityKind::Phage)?;
    log::info!(
        "feature tables: {} bacteria rows / {} k-mers, {} phage rows / {} k-mers",
        bacteria.len(),
        bacteria.columns.len(),
        phages.len(),
        phages.columns.len()
    );

    let matrix = SimilarityMatrix::build(&bacteria, &phages)?;
    let rows = load_associations(associations)?;
    let index = HostVirusIndex::build(&rows);
    log::info!("association index: {} hosts from {} rows", index.n_hosts(), rows.len());

    Ok(SimilarityRanker::new(matrix, index))
}

pub fn ranker_from_config(cfg: &FinderConfig) -> Result<SimilarityRanker> {
    load_ranker(&cfg.bacteria_features, &cfg.phage_features, &cfg.associations)
}

/// 从 Virus–Host DB 导出中筛出宿主在名单内的关联，去重后写入 `out`
pub fn filter_host_associations<P, Q, R>(virushostdb: P, host_list: Q, out: R) -> Result<Vec<AssociationRow>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let rows = load_associations(virushostdb)?;
    let hosts = load_host_list(host_list)?;
    let kept = filter_associations(&rows, &hosts);
    log::info!("{} of {} association rows match {} hosts", kept.len(), rows.len(), hosts.len());
    save_associations(&kept, out)?;
    Ok(kept)
}

/// 全部宿主排名并整体覆盖写入输出文件
pub fn run_ranking(cfg: &FinderConfig, top_k: i64) -> Result<Vec<RankingRecord>> {
    let top_k = validate_top_k(top_k)?;
    let ranker = ranker_from_config(cfg)?;
    let records = ranker.rank_all(top_k)?;
    save_ranking(&records, &cfg.ranking_out)?;
    log::info!("ranking written to {}", cfg.ranking_out.display());
    Ok(records)
}

pub fn predict(cfg: &FinderConfig, host: &str, top_k: i64) -> Result<RankedCandidateList> {
    let top_k = validate_top_k(top_k)?;
    ranker_from_config(cfg)?.rank(host, top_k)
}

/// 单个 id 直接流式查 FASTA；多个 id 时先一次读入所需序列。
/// FASTA 不存在时退回流式查找，让每个 id 各自报告失败。
pub fn crispr_check(cfg: &FinderConfig, host: &str, phage_ids: &[String], max_mismatches: i64) -> Result<BatchReport> {
    validate_max_mismatches(max_mismatches)?;
    let cache = DirSpacerCache::new(&cfg.crispr_cache_dir);
    if phage_ids.len() > 1 && cfg.phage_fasta.is_file() {
        let store = MemoryPhageStore::from_fasta_ids(&cfg.phage_fasta, phage_ids)?;
        check_batch(&cache, &store, host, phage_ids, max_mismatches)
    } else {
        let store = FastaPhageStore::new(&cfg.phage_fasta);
        check_batch(&cache, &store, host, phage_ids, max_mismatches)
    }
}
