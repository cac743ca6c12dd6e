//! 内存存储
//!
//! 使用 DashMap 保存 JSON 文档，记录插入序号，列表按插入顺序返回，
//! 与真实后台按创建时间排序的列表接口行为一致。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

/// 通用 JSON 文档存储
///
/// clone 共享同一份底层数据。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<DashMap<String, (u64, Value)>>,
    seq: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或更新数据
    ///
    /// 更新时保留原有序号，列表位置不变。
    pub fn upsert(&self, id: &str, value: Value) {
        let mut entry = self
            .data
            .entry(id.to_string())
            .or_insert_with(|| (self.seq.fetch_add(1, Ordering::SeqCst), Value::Null));
        entry.1 = value;
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.data.get(id).map(|v| v.1.clone())
    }

    pub fn remove(&self, id: &str) -> Option<Value> {
        self.data.remove(id).map(|(_, (_, v))| v)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    /// 按插入顺序列出所有数据
    pub fn list(&self) -> Vec<Value> {
        let mut items: Vec<(u64, Value)> = self
            .data
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, v)| v).collect()
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }
}
