use async_trait::async_trait;

use crate::errors::Result;
use crate::models::RangeMember;

/// 区间索引存储
///
/// 两类结构：
/// - 有序集合（score = IPv4 起始地址，member = `RangeMember`）
/// - 字符串字典（field → value）
///
/// 单次读写由后端保证隔离；“删除后重建”整体不是原子的，
/// 读者可能短暂看到空的或只写了一部分的索引。
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// 批量写入有序集合；member 已存在时更新其 score
    async fn add_ranges(&self, set: &str, entries: &[(u32, RangeMember)]) -> Result<()>;

    /// 返回 score ≤ `score` 的成员中 score 最大的一个
    async fn floor(&self, set: &str, score: u32) -> Result<Option<RangeMember>>;

    /// 批量写入字典
    async fn set_fields(&self, dict: &str, fields: &[(String, String)]) -> Result<()>;

    async fn get_field(&self, dict: &str, field: &str) -> Result<Option<String>>;

    /// 删除整个 key（有序集合、字典或计数器）
    async fn delete(&self, key: &str) -> Result<()>;

    /// 计数器自增，返回新值
    async fn incr(&self, key: &str) -> Result<i64>;

    /// 读取计数器，不存在时为 0
    async fn counter(&self, key: &str) -> Result<i64>;

    /// 后端名称（用于日志和健康检查）
    fn name(&self) -> &'static str;
}
