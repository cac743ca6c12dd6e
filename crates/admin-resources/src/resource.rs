//! 资源抽象

use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

/// 后台资源
///
/// 每种资源对应一个 REST 集合路径，创建与更新使用同一种草稿类型，
/// 草稿在发出请求前先经过 `validator` 校验。
pub trait Resource: Clone + Send + Sync + DeserializeOwned + 'static {
    /// 集合路径，如 `/categories`
    const PATH: &'static str;
    /// 资源名称，用于日志、指标与错误信息
    const NAME: &'static str;

    type Draft: Serialize + Validate + Send + Sync;

    fn id(&self) -> &str;
}
