/// 四种确定碱基，k-mer 词表只由它们组成
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[inline]
pub fn is_acgt(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// GC 含量（百分比），分母为完整序列长度（含 N），空序列返回 0
pub fn gc_percent(seq: &[u8]) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq
        .iter()
        .filter(|&&b| matches!(b.to_ascii_uppercase(), b'G' | b'C'))
        .count();
    gc as f64 / seq.len() as f64 * 100.0
}

/// 等长序列的 Hamming 距离；超过 `limit` 后提前返回 `limit + 1`
#[inline]
pub fn hamming_within(a: &[u8], b: &[u8], limit: usize) -> usize {
    debug_assert_eq!(a.len(), b.len());
    let mut mm = 0usize;
    for (x, y) in a.iter().zip(b) {
        if x != y {
            mm += 1;
            if mm > limit {
                return mm;
            }
        }
    }
    mm
}
