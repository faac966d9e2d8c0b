use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};

/// 所有路径与默认参数都显式地放在这里传递，不读取进程级全局状态。
/// 默认布局与数据目录约定一致：`data/` 下的特征表、关联表、spacer 缓存与排名输出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub bacteria_features: PathBuf,
    pub phage_features: PathBuf,
    pub associations: PathBuf,
    pub crispr_cache_dir: PathBuf,
    pub phage_fasta: PathBuf,
    pub ranking_out: PathBuf,
    pub top_k: i64,
    pub max_mismatches: i64,
    pub kmer_size: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl FinderConfig {
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let d = data_dir.as_ref();
        Self {
            bacteria_features: d.join("bacteria_genome_features.csv"),
            phage_features: d.join("phage_genome_features.csv"),
            associations: d.join("uti_phage_host_interactions.csv"),
            crispr_cache_dir: d.join("crispr_cache"),
            phage_fasta: PathBuf::from("phage_genomes/phages_200/ncbi_dataset/data/genomic.fna"),
            ranking_out: d.join("bacteria_phage_top10.csv"),
            top_k: 10,
            max_mismatches: 2,
            kmer_size: crate::features::DEFAULT_K,
        }
    }

    /// 从 JSON 文件读取；未出现的字段取默认值
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let fh = std::fs::File::open(path).map_err(|e| {
            FinderError::Parse(format!("cannot open config '{}': {}", path.display(), e))
        })?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(fh))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let fh = std::fs::File::create(path)?;
        let mut w = std::io::BufWriter::new(fh);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        crate::error::validate_top_k(self.top_k)?;
        crate::error::validate_max_mismatches(self.max_mismatches)?;
        crate::error::validate_kmer_size(self.kmer_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_data_layout() {
        let c = FinderConfig::default();
        assert_eq!(c.bacteria_features, PathBuf::from("data/bacteria_genome_features.csv"));
        assert_eq!(c.crispr_cache_dir, PathBuf::from("data/crispr_cache"));
        assert_eq!(c.top_k, 10);
        assert_eq!(c.max_mismatches, 2);
        assert_eq!(c.kmer_size, 4);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let path = std::env::temp_dir().join(format!("phage_finder_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"top_k": 5, "crispr_cache_dir": "/srv/cache"}"#).unwrap();
        let c = FinderConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(c.top_k, 5);
        assert_eq!(c.crispr_cache_dir, PathBuf::from("/srv/cache"));
        assert_eq!(c.max_mismatches, 2);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = std::env::temp_dir().join(format!("phage_finder_cfg_bad_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_mismatches": -1}"#).unwrap();
        let err = FinderConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, FinderError::Validation(_)));

        let c = FinderConfig { kmer_size: 0, ..FinderConfig::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn dump_then_load() {
        let path = std::env::temp_dir().join(format!("phage_finder_cfg_dump_{}.json", std::process::id()));
        let c = FinderConfig::with_data_dir("/tmp/run1");
        c.dump(&path).unwrap();
        let back = FinderConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, c);
    }
}
