//! CRISPR spacer 匹配：种子锚定的近似子串搜索（仅替换，不含插入/缺失）。

pub mod check;
pub mod matcher;

pub use check::{check_batch, match_phage, parse_phage_ids, BatchEntry, BatchReport, CheckStatus, MatchResult};
pub use matcher::{count_spacer_hits, seed_len_for, spacer_matches, SpacerHits};
