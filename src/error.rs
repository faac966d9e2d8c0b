use thiserror::Error;

/// 库内统一错误类型
#[derive(Error, Debug)]
pub enum FinderError {
    /// 参数非法（负的错配上限、非正的 top-K 等），在任何计算之前报出
    #[error("invalid argument: {0}")]
    Validation(String),

    /// 输入退化，无法构建相似度矩阵（例如 k-mer 交集为空）
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// 请求的实体不存在
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl FinderError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        FinderError::NotFound { kind, id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FinderError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;

/// 校验 top-K：必须为正数
pub fn validate_top_k(top_k: i64) -> Result<usize> {
    if top_k <= 0 {
        return Err(FinderError::Validation(format!(
            "top_k must be positive, got {}",
            top_k
        )));
    }
    Ok(top_k as usize)
}

/// 校验错配上限：不能为负
pub fn validate_max_mismatches(max_mismatches: i64) -> Result<usize> {
    if max_mismatches < 0 {
        return Err(FinderError::Validation(format!(
            "max_mismatches must be >= 0, got {}",
            max_mismatches
        )));
    }
    Ok(max_mismatches as usize)
}

/// 校验 k-mer 长度：1..=MAX_K（2-bit 编码的计数槽上限）
pub fn validate_kmer_size(k: usize) -> Result<usize> {
    let max = crate::features::kmer::MAX_K;
    if k == 0 || k > max {
        return Err(FinderError::Validation(format!(
            "kmer_size must be in 1..={}, got {}",
            max, k
        )));
    }
    Ok(k)
}
