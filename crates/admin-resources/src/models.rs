//! 后台资源实体与草稿
//!
//! 实体字段与后台接口一致（camelCase）；`id`、`createdAt`、`updatedAt` 由服务端分配。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::resource::Resource;

// ==================== 分类 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1-50个字符之间"))]
    pub name: String,
    #[validate(length(max = 500, message = "分类描述不能超过500个字符"))]
    pub description: Option<String>,
}

impl Resource for Category {
    const PATH: &'static str = "/categories";
    const NAME: &'static str = "categories";
    type Draft = CategoryDraft;

    fn id(&self) -> &str {
        &self.id
    }
}

// ==================== 商品 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 100, message = "商品名称长度必须在1-100个字符之间"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "价格不能为负数"))]
    pub price: f64,
    pub stock: u32,
    pub category_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Resource for Product {
    const PATH: &'static str = "/products";
    const NAME: &'static str = "products";
    type Draft = ProductDraft;

    fn id(&self) -> &str {
        &self.id
    }
}

// ==================== 媒体 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    pub url: String,
    pub file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MediaDraft {
    #[validate(url(message = "媒体地址必须是合法的 URL"))]
    pub url: String,
    #[validate(length(min = 1, max = 255, message = "文件名长度必须在1-255个字符之间"))]
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
}

impl Resource for Media {
    const PATH: &'static str = "/media";
    const NAME: &'static str = "media";
    type Draft = MediaDraft;

    fn id(&self) -> &str {
        &self.id
    }
}

// ==================== 评价 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    #[validate(length(min = 1, message = "评价必须关联商品"))]
    pub product_id: String,
    #[validate(length(min = 1, max = 50, message = "作者名称长度必须在1-50个字符之间"))]
    pub author: String,
    #[validate(range(min = 1, max = 5, message = "评分必须在1-5之间"))]
    pub rating: u8,
    #[validate(length(max = 1000, message = "评价内容不能超过1000个字符"))]
    pub comment: Option<String>,
}

impl Resource for Review {
    const PATH: &'static str = "/reviews";
    const NAME: &'static str = "reviews";
    type Draft = ReviewDraft;

    fn id(&self) -> &str {
        &self.id
    }
}

// ==================== 销售单 ====================

/// 物流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl TrackingStatus {
    /// 是否为终态
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[validate(length(min = 1, message = "销售明细必须关联商品"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "数量至少为1"))]
    pub quantity: u32,
    #[validate(range(min = 0.0, message = "单价不能为负数"))]
    pub unit_price: f64,
}

impl SaleItem {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    pub total: f64,
    #[serde(default)]
    pub tracking_status: TrackingStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    #[validate(length(min = 1, max = 100, message = "客户名称长度必须在1-100个字符之间"))]
    pub customer_name: String,
    #[validate(email(message = "客户邮箱格式不正确"))]
    pub customer_email: String,
    #[validate(length(min = 1, message = "销售单至少包含一条明细"), nested)]
    pub items: Vec<SaleItem>,
    pub total: f64,
    #[serde(default)]
    pub tracking_status: TrackingStatus,
    pub tracking_number: Option<String>,
}

impl SaleDraft {
    /// 按明细计算总价的草稿
    pub fn from_items(
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        items: Vec<SaleItem>,
    ) -> Self {
        let total = items.iter().map(SaleItem::subtotal).sum();
        Self {
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            items,
            total,
            tracking_status: TrackingStatus::Pending,
            tracking_number: None,
        }
    }
}

impl Resource for Sale {
    const PATH: &'static str = "/sales";
    const NAME: &'static str = "sales";
    type Draft = SaleDraft;

    fn id(&self) -> &str {
        &self.id
    }
}

fn default_true() -> bool {
    true
}
