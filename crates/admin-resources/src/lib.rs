//! 电商后台资源管理
//!
//! 为分类、商品、媒体、评价、销售单提供统一的增删改查管理器。
//! 本地缓存只通过 `collection::reduce` 更新：成功响应中的服务端实体按 id 整体替换本地条目，
//! 从不合并部分字段。
//!
//! # 主要模块
//!
//! - `resource`: `Resource` trait，描述资源路径与草稿类型
//! - `models`: 各资源实体与草稿
//! - `collection`: 本地集合与纯函数 reducer
//! - `api`: 远程接口抽象与 reqwest 实现
//! - `manager`: 组合远程接口与本地集合的管理器

pub mod api;
pub mod collection;
pub mod manager;
pub mod models;
pub mod resource;

pub use api::{ResourceApi, RestResourceApi};
pub use collection::{Change, Page, ResourceCollection, reduce};
pub use manager::ResourceManager;
pub use resource::Resource;
