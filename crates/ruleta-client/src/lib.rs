//! 折扣转盘远程服务客户端
//!
//! 封装生成折扣码与查询用户折扣码两个远程端点，统一超时、重试与错误分类。
//! 该层只负责请求/响应，不持有也不修改任何共享状态。

pub mod client;
pub mod models;

pub use client::{HttpRuletaClient, RuletaService};
pub use models::{CodeListing, CodeStatus, DiscountCode, IssuedCode};
