//! # phage-finder
//!
//! 为细菌宿主寻找候选噬菌体：按基因组组成相似度排名，并用宿主的 CRISPR spacer 独立验证。
//!
//! 本 crate 包括：
//!
//! - **特征提取**：从 FASTA 基因组计算 4-mer 频率向量、基因组长度与 GC 含量
//! - **相似度排名**：共有 k-mer 上的余弦相似度矩阵，按已知宿主-病毒关联过滤后取 top-K
//! - **CRISPR 匹配**：种子锚定 + Hamming 距离验证的近似子串搜索
//! - **数据接口**：特征表 / 关联表 CSV、spacer 缓存目录、噬菌体 FASTA 序列库
//!
//! ## 快速示例
//!
//! ```rust
//! use phage_finder::crispr;
//!
//! let spacers = ["ACGTACGTACGTACGTACGT"];
//! let mut genome = b"GCT".repeat(40);
//! genome.extend_from_slice(b"ACGTACGTACGTACGTACGT");
//! genome.extend_from_slice(&b"GCT".repeat(40));
//!
//! let hits = crispr::count_spacer_hits(&spacers, &genome, 2);
//! assert_eq!((hits.spacer_count, hits.hit_count), (1, 1));
//! assert!(hits.is_match());
//! ```
//!
//! ## 模块说明
//!
//! - [`features`] — k-mer 频率向量、特征表及其二进制快照
//! - [`rank`] — 相似度矩阵、宿主-病毒关联索引、top-K 排名
//! - [`crispr`] — spacer 匹配与批量检查
//! - [`io`] — FASTA、CSV、spacer 缓存、噬菌体序列库
//! - [`pipeline`] — 按 [`config::FinderConfig`] 串起各步骤
//! - [`util`] — DNA 序列工具函数

pub mod config;
pub mod crispr;
pub mod error;
pub mod features;
pub mod io;
pub mod pipeline;
pub mod rank;
pub mod util;

pub use error::{FinderError, Result};
