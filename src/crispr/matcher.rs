use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::util::dna;

/// 默认种子长度
pub const DEFAULT_SEED_LEN: usize = 12;
/// 短 spacer 收缩种子时的下限
pub const MIN_SEED_LEN: usize = 8;

/// spacer 与基因组比较的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacerHits {
    pub spacer_count: usize,
    pub hit_count: usize,
}

impl SpacerHits {
    pub fn is_match(&self) -> bool {
        self.hit_count > 0
    }
}

/// 有效种子长度：spacer 短于 12 时取 max(8, L/2)，且不超过 spacer 本身
pub fn seed_len_for(spacer_len: usize) -> usize {
    let seed = if spacer_len < DEFAULT_SEED_LEN {
        MIN_SEED_LEN.max(spacer_len / 2)
    } else {
        DEFAULT_SEED_LEN
    };
    seed.min(spacer_len)
}

/// 种子锚定 + Hamming 验证。
/// 序列须已转为大写。按 p+1 逐位推进查找种子，重叠出现也都会被当作锚点验证；
/// 第一个错配数 <= `max_mismatches` 的窗口即判定命中。
pub fn spacer_matches(spacer: &[u8], genome: &[u8], max_mismatches: usize) -> bool {
    let l = spacer.len();
    if l == 0 || l > genome.len() {
        return false;
    }

    let seed = &spacer[..seed_len_for(l)];
    let finder = memmem::Finder::new(seed);
    let mut start = 0usize;

    while let Some(rel) = finder.find(&genome[start..]) {
        let pos = start + rel;
        if pos + l > genome.len() {
            // 之后的锚点窗口只会更靠后，同样放不下
            return false;
        }
        if dna::hamming_within(spacer, &genome[pos..pos + l], max_mismatches) <= max_mismatches {
            return true;
        }
        start = pos + 1;
    }
    false
}

/// 统计一组 spacer 中在基因组里近似出现的个数。
/// spacer 与基因组都先转为大写。
pub fn count_spacer_hits<S: AsRef<[u8]>>(spacers: &[S], genome: &[u8], max_mismatches: usize) -> SpacerHits {
    if spacers.is_empty() {
        return SpacerHits::default();
    }
    let genome = genome.to_ascii_uppercase();
    let hit_count = spacers
        .iter()
        .filter(|s| {
            let s = s.as_ref().to_ascii_uppercase();
            spacer_matches(&s, &genome, max_mismatches)
        })
        .count();
    SpacerHits {
        spacer_count: spacers.len(),
        hit_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 伪随机基因组（LCG），只含 A/C/G/T
    fn make_genome(len: usize, seed: u32) -> Vec<u8> {
        let mut x = seed;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                dna::BASES[(x >> 16) as usize % 4]
            })
            .collect()
    }

    #[test]
    fn seed_length_rule() {
        assert_eq!(seed_len_for(30), 12);
        assert_eq!(seed_len_for(12), 12);
        assert_eq!(seed_len_for(11), 8);
        assert_eq!(seed_len_for(10), 8);
        assert_eq!(seed_len_for(8), 8);
        // 比下限还短：种子就是整个 spacer
        assert_eq!(seed_len_for(5), 5);
        assert_eq!(seed_len_for(0), 0);
    }

    #[test]
    fn empty_spacer_never_matches() {
        assert!(!spacer_matches(b"", b"ACGT", 3));
    }

    #[test]
    fn exact_copy_matches_with_zero_mismatches() {
        let genome = make_genome(2_000, 7);
        let spacer = genome[700..732].to_vec();
        assert!(spacer_matches(&spacer, &genome, 0));
    }

    #[test]
    fn one_substitution_too_many_breaks_the_match() {
        let mut genome = make_genome(1_000, 11);
        let spacer: Vec<u8> = b"GATTACAGATTACAGATTACAGATTACA".to_vec();
        genome[400..400 + spacer.len()].copy_from_slice(&spacer);

        let m = 2;
        assert!(spacer_matches(&spacer, &genome, m));

        // 在种子之外的窗口内引入 m+1 个替换
        for off in [15usize, 20, 25] {
            let b = &mut genome[400 + off];
            *b = if *b == b'A' { b'C' } else { b'A' };
        }
        assert!(!spacer_matches(&spacer, &genome, m));
        assert!(spacer_matches(&spacer, &genome, m + 1));
    }

    #[test]
    fn overlapping_seed_occurrences_are_all_tried() {
        // 种子 AAAAAAAAAAAA 在 poly-A 区段每个位置都出现；只有从偏移 6 开始的窗口满足 0 错配
        let spacer = b"AAAAAAAAAAAAAAAC";
        let genome = b"GGGAAAAAAAAAAAAAAAAAACGG";
        // 不重叠查找只会尝试偏移 3 和 15，逐位推进才能到达 6
        assert!(spacer_matches(spacer, genome, 0));
    }

    #[test]
    fn window_running_past_the_end_is_skipped() {
        let spacer = b"ACGTACGTACGTACGTACGT";
        let genome = b"TTTTTTTTACGTACGTACGTACG";
        assert!(!spacer_matches(spacer, genome, 5));
    }

    #[test]
    fn counts_are_case_insensitive() {
        let genome = b"ttttacgtacgtacgtacgtacgtTTTT";
        let hits = count_spacer_hits(&["acgtacgtacgtacgtacgt", "GGGGGGGGGGGGGGGGGGGG"], genome, 0);
        assert_eq!(hits, SpacerHits { spacer_count: 2, hit_count: 1 });
        assert!(hits.is_match());
    }

    #[test]
    fn empty_spacer_set_is_zero() {
        let hits = count_spacer_hits::<String>(&[], b"ACGT", 2);
        assert_eq!(hits, SpacerHits { spacer_count: 0, hit_count: 0 });
        assert!(!hits.is_match());
    }

    #[test]
    fn spacer_embedded_in_unrelated_flanks() {
        let spacer = "ACGTACGTACGTACGTACGT";
        // 1000 个无关碱基，spacer 插在偏移 100 处；侧翼没有 A，不会产生额外锚点
        let flank: Vec<u8> = b"GCT".iter().cycle().take(500).copied().collect();
        let mut genome = flank[..100].to_vec();
        genome.extend_from_slice(spacer.as_bytes());
        genome.extend_from_slice(&flank[100..]);
        genome.extend_from_slice(&flank);

        let hits = count_spacer_hits(&[spacer], &genome, 2);
        assert_eq!(hits.spacer_count, 1);
        assert_eq!(hits.hit_count, 1);
        assert!(hits.is_match());
    }
}
