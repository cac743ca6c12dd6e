//! 资源管理器
//!
//! 组合远程接口与本地集合。每次写操作成功后，用服务端返回的实体更新本地集合；
//! 任何失败都不修改本地集合。

use std::sync::Arc;

use parking_lot::RwLock;
use ruleta_shared::error::{Result, RuletaError};
use tracing::{info, warn};
use validator::Validate;

use crate::api::{ResourceApi, RestResourceApi};
use crate::collection::{Change, Page, ResourceCollection};
use crate::resource::Resource;

/// 单一资源的管理器
pub struct ResourceManager<T, Api = RestResourceApi<T>> {
    api: Arc<Api>,
    collection: RwLock<ResourceCollection<T>>,
}

impl<T, Api> ResourceManager<T, Api>
where
    T: Resource,
    Api: ResourceApi<T>,
{
    pub fn new(api: Arc<Api>) -> Self {
        Self {
            api,
            collection: RwLock::new(ResourceCollection::new()),
        }
    }

    /// 从服务端重新加载全部条目，返回条目数
    pub async fn refresh(&self) -> Result<usize> {
        let items = self.api.list().await?;
        let count = items.len();
        self.collection.write().apply(Change::Loaded(items));

        info!(resource = T::NAME, count, "资源列表已刷新");
        Ok(count)
    }

    /// 从服务端获取单个条目并更新本地缓存
    pub async fn fetch(&self, id: &str) -> Result<T> {
        match self.api.get(id).await {
            Ok(entity) => {
                self.collection.write().apply(Change::Upserted(entity.clone()));
                Ok(entity)
            }
            Err(RuletaError::NotFound { entity, id }) => {
                // 服务端已不存在，本地缓存同步移除
                self.collection.write().apply(Change::Removed(id.clone()));
                Err(RuletaError::NotFound { entity, id })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create(&self, draft: &T::Draft) -> Result<T> {
        validate(draft)?;
        let created = self.api.create(draft).await?;
        self.collection
            .write()
            .apply(Change::Upserted(created.clone()));

        info!(resource = T::NAME, id = created.id(), "资源已创建");
        Ok(created)
    }

    pub async fn update(&self, id: &str, draft: &T::Draft) -> Result<T> {
        validate(draft)?;
        let updated = self.api.update(id, draft).await?;
        {
            let mut collection = self.collection.write();
            if updated.id() != id {
                // 以服务端返回为准，旧 id 的条目不再存在
                warn!(resource = T::NAME, requested = id, returned = updated.id(), "更新响应的 id 与请求不一致");
                collection.apply(Change::Removed(id.to_string()));
            }
            collection.apply(Change::Upserted(updated.clone()));
        }

        info!(resource = T::NAME, id, "资源已更新");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete(id).await?;
        self.collection
            .write()
            .apply(Change::Removed(id.to_string()));

        info!(resource = T::NAME, id, "资源已删除");
        Ok(())
    }

    // ==================== 本地查询 ====================

    pub fn items(&self) -> Vec<T> {
        self.collection.read().items().to_vec()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.collection.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.collection.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.read().is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.collection.read().is_loaded()
    }

    /// 本地分页，页码从 1 开始
    pub fn page(&self, page: usize, page_size: usize) -> Page<T> {
        self.collection.read().page(page, page_size)
    }
}

fn validate<D: Validate>(draft: &D) -> Result<()> {
    draft
        .validate()
        .map_err(|e| RuletaError::Validation(e.to_string()))
}
