//! 本地资源集合
//!
//! 集合只能通过 `reduce` 更新。`Upserted` 携带服务端返回的完整实体，
//! 按 id 整体替换已有条目，不存在时追加到末尾。

use serde::Serialize;

use crate::resource::Resource;

/// 集合变更
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    /// 整体加载，替换全部条目
    Loaded(Vec<T>),
    /// 新增或更新后的服务端实体
    Upserted(T),
    /// 按 id 删除
    Removed(String),
}

/// 纯函数 reducer
pub fn reduce<T: Resource>(mut items: Vec<T>, change: Change<T>) -> Vec<T> {
    match change {
        Change::Loaded(loaded) => loaded,
        Change::Upserted(entity) => {
            match items.iter_mut().find(|item| item.id() == entity.id()) {
                Some(existing) => *existing = entity,
                None => items.push(entity),
            }
            items
        }
        Change::Removed(id) => {
            items.retain(|item| item.id() != id);
            items
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// 从完整列表中切出第 `page` 页（从 1 开始）
    ///
    /// 页码小于 1 按第 1 页处理；超出末页返回空页。
    pub fn slice(all: &[T], page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let total = all.len();
        if page_size == 0 {
            return Self {
                items: Vec::new(),
                total,
                page,
                page_size,
                total_pages: 0,
            };
        }

        let items = all
            .iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        Self {
            items,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
        }
    }
}

/// 本地缓存的资源集合
#[derive(Debug, Clone)]
pub struct ResourceCollection<T> {
    items: Vec<T>,
    loaded: bool,
}

impl<T> Default for ResourceCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
        }
    }
}

impl<T: Resource> ResourceCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, change: Change<T>) {
        if matches!(change, Change::Loaded(_)) {
            self.loaded = true;
        }
        self.items = reduce(std::mem::take(&mut self.items), change);
    }

    /// 是否至少完整加载过一次
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self, page: usize, page_size: usize) -> Page<T> {
        Page::slice(&self.items, page, page_size)
    }
}
