use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error, trace};

use crate::config::RedisConfig;
use crate::errors::{Result, WeblocationError};
use crate::models::RangeMember;
use crate::store::traits::RangeStore;

/// Redis 存储：有序集合 + Hash
///
/// member 以 JSON 编码的 `RangeMember` 存储，读取时反序列化，
/// 不依赖字符串拼接再拆分。
pub struct RedisRangeStore {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
    batch_size: usize,
}

impl RedisRangeStore {
    /// 创建客户端并用 PING 验证连接
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.clone()).map_err(|e| {
            WeblocationError::store_connection(format!(
                "Failed to create Redis client for {}: {}",
                config.url, e
            ))
        })?;

        let store = Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
            batch_size: config.batch_size.max(1),
        };

        let mut conn = store.get_connection().await.map_err(|e| {
            error!(
                "Failed to connect to Redis server: {}. Check Redis server status and URL: {}",
                e, config.url
            );
            WeblocationError::store_connection(format!("Redis connection failed: {e}"))
        })?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await.map_err(|e| {
            WeblocationError::store_connection(format!("Redis ping failed: {e}"))
        })?;
        debug!(
            "RedisRangeStore connected ({}), prefix: '{}'",
            pong, store.key_prefix
        );

        Ok(store)
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        match self.get_connection().await {
            Ok(c) => Ok(c),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    /// 命令失败时重置连接，下一次调用重新建立
    async fn check<T>(&self, op: &str, result: redis::RedisResult<T>) -> Result<T> {
        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("Redis {} failed: {}", op, e);
                if e.is_connection_dropped() || e.is_io_error() {
                    self.reset_connection().await;
                }
                Err(e.into())
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn encode_member(member: &RangeMember) -> Result<String> {
        Ok(serde_json::to_string(member)?)
    }

    fn decode_member(data: &str) -> Result<RangeMember> {
        serde_json::from_str(data).map_err(|e| {
            WeblocationError::serialization(format!("Invalid range member '{}': {}", data, e))
        })
    }
}

#[async_trait]
impl RangeStore for RedisRangeStore {
    async fn add_ranges(&self, set: &str, entries: &[(u32, RangeMember)]) -> Result<()> {
        let key = self.make_key(set);
        let mut conn = self.conn().await?;

        for chunk in entries.chunks(self.batch_size) {
            let items = chunk
                .iter()
                .map(|(score, member)| Ok((*score, Self::encode_member(member)?)))
                .collect::<Result<Vec<(u32, String)>>>()?;
            let result = conn.zadd_multiple::<_, _, _, ()>(&key, &items).await;
            self.check("ZADD", result).await?;
        }
        trace!("Added {} members to {}", entries.len(), key);
        Ok(())
    }

    async fn floor(&self, set: &str, score: u32) -> Result<Option<RangeMember>> {
        let key = self.make_key(set);
        let mut conn = self.conn().await?;

        let result = conn
            .zrevrangebyscore_limit::<_, _, _, Vec<String>>(&key, score, "-inf", 0, 1)
            .await;
        let members = self.check("ZREVRANGEBYSCORE", result).await?;

        members.first().map(|m| Self::decode_member(m)).transpose()
    }

    async fn set_fields(&self, dict: &str, fields: &[(String, String)]) -> Result<()> {
        let key = self.make_key(dict);
        let mut conn = self.conn().await?;

        for chunk in fields.chunks(self.batch_size) {
            let result = conn.hset_multiple::<_, _, _, ()>(&key, chunk).await;
            self.check("HSET", result).await?;
        }
        trace!("Set {} fields on {}", fields.len(), key);
        Ok(())
    }

    async fn get_field(&self, dict: &str, field: &str) -> Result<Option<String>> {
        let key = self.make_key(dict);
        let mut conn = self.conn().await?;

        let result = conn.hget::<_, _, Option<String>>(&key, field).await;
        self.check("HGET", result).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = self.make_key(key);
        let mut conn = self.conn().await?;

        let result = conn.del::<_, i64>(&key).await;
        let deleted = self.check("DEL", result).await?;
        trace!("DEL {} -> {}", key, deleted);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let key = self.make_key(key);
        let mut conn = self.conn().await?;

        let result = conn.incr::<_, _, i64>(&key, 1).await;
        self.check("INCR", result).await
    }

    async fn counter(&self, key: &str) -> Result<i64> {
        let key = self.make_key(key);
        let mut conn = self.conn().await?;

        let result = conn.get::<_, Option<i64>>(&key).await;
        Ok(self.check("GET", result).await?.unwrap_or(0))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
