use std::collections::{BTreeMap, BTreeSet};

use crate::io::associations::AssociationRow;

/// 宿主名 → 已知感染该宿主的病毒名集合（去重、有序）。
/// 只做精确字符串查找；名字变形（下划线转空格）由调用方负责。
#[derive(Debug, Clone, Default)]
pub struct HostVirusIndex {
    by_host: BTreeMap<String, BTreeSet<String>>,
    empty: BTreeSet<String>,
}

impl HostVirusIndex {
    /// 病毒名或宿主名为空的行被忽略
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a AssociationRow>,
    {
        let mut by_host: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in rows {
            if row.virus_name.is_empty() || row.host_name.is_empty() {
                continue;
            }
            by_host
                .entry(row.host_name.clone())
                .or_default()
                .insert(row.virus_name.clone());
        }
        Self { by_host, empty: BTreeSet::new() }
    }

    pub fn lookup(&self, host: &str) -> &BTreeSet<String> {
        self.by_host.get(host).unwrap_or(&self.empty)
    }

    /// 依次尝试 (a) 下划线替换为空格 (b) 原始字符串，返回第一个非空集合
    pub fn resolve(&self, host: &str) -> &BTreeSet<String> {
        let spaced = self.lookup(&host.replace('_', " "));
        if !spaced.is_empty() {
            return spaced;
        }
        self.lookup(host)
    }

    pub fn n_hosts(&self) -> usize {
        self.by_host.len()
    }
}
