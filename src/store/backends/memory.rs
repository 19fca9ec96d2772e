use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use crate::errors::Result;
use crate::models::RangeMember;
use crate::store::traits::RangeStore;

/// 有序集合：按 score 排序，member 唯一
#[derive(Debug, Default)]
struct SortedSet {
    by_score: BTreeMap<u32, BTreeSet<RangeMember>>,
    scores: HashMap<RangeMember, u32>,
}

impl SortedSet {
    fn insert(&mut self, score: u32, member: RangeMember) {
        if let Some(old) = self.scores.insert(member.clone(), score)
            && old != score
            && let Some(bucket) = self.by_score.get_mut(&old)
        {
            bucket.remove(&member);
            if bucket.is_empty() {
                self.by_score.remove(&old);
            }
        }
        self.by_score.entry(score).or_default().insert(member);
    }

    /// 同分时返回该 score 下排序最大的成员
    fn floor(&self, score: u32) -> Option<&RangeMember> {
        self.by_score
            .range(..=score)
            .next_back()
            .and_then(|(_, bucket)| bucket.iter().next_back())
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}

/// 进程内存储
///
/// 每个 key 独立加锁，不同分类的重建互不阻塞。
#[derive(Default)]
pub struct MemoryRangeStore {
    sets: DashMap<String, SortedSet>,
    dicts: DashMap<String, HashMap<String, String>>,
    counters: DashMap<String, i64>,
}

impl MemoryRangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 有序集合成员数（测试与诊断用）
    pub fn range_len(&self, set: &str) -> usize {
        self.sets.get(set).map(|s| s.len()).unwrap_or(0)
    }

    /// 字典条目数（测试与诊断用）
    pub fn dict_len(&self, dict: &str) -> usize {
        self.dicts.get(dict).map(|d| d.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RangeStore for MemoryRangeStore {
    async fn add_ranges(&self, set: &str, entries: &[(u32, RangeMember)]) -> Result<()> {
        let mut sorted = self.sets.entry(set.to_string()).or_default();
        for (score, member) in entries {
            sorted.insert(*score, member.clone());
        }
        trace!("MemoryRangeStore: added {} members to {}", entries.len(), set);
        Ok(())
    }

    async fn floor(&self, set: &str, score: u32) -> Result<Option<RangeMember>> {
        Ok(self
            .sets
            .get(set)
            .and_then(|sorted| sorted.floor(score).cloned()))
    }

    async fn set_fields(&self, dict: &str, fields: &[(String, String)]) -> Result<()> {
        let mut map = self.dicts.entry(dict.to_string()).or_default();
        for (field, value) in fields {
            map.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn get_field(&self, dict: &str, field: &str) -> Result<Option<String>> {
        Ok(self.dicts.get(dict).and_then(|map| map.get(field).cloned()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.sets.remove(key);
        self.dicts.remove(key);
        self.counters.remove(key);
        trace!("MemoryRangeStore: deleted key {}", key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut counter = self.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn counter(&self, key: &str) -> Result<i64> {
        Ok(self.counters.get(key).map(|c| *c).unwrap_or(0))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
