//! 相似度排名：k-mer 组成向量 → 余弦相似度 → 按宿主关联过滤的 top-K。

pub mod assoc;
pub mod ranker;
pub mod similarity;

pub use assoc::HostVirusIndex;
pub use ranker::{
    filter_candidates, select_top_k, CandidateSource, RankedCandidate, RankedCandidateList,
    RankingRecord, SimilarityRanker,
};
pub use similarity::{cosine, SimilarityMatrix};
