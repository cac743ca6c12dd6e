//! 折扣码数据模型与接口报文
//!
//! 字段命名与远程接口保持一致（camelCase），状态字段由服务端权威维护，
//! 客户端只持有某次查询时的只读副本。

use chrono::{DateTime, Utc};
use ruleta_shared::error::{Result, RuletaError};
use serde::{Deserialize, Serialize};

/// 折扣码状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    /// 可用
    #[default]
    Active,
    /// 已使用
    Used,
    /// 已过期
    Expired,
}

/// 折扣码
///
/// `name`、`discount_label`、颜色字段仅用于展示，逻辑上视为不透明数据。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "discount", alias = "discountLabel", default)]
    pub discount_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default)]
    pub status: CodeStatus,
    /// 仅用于展示，客户端不据此计算过期
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl DiscountCode {
    pub fn is_active(&self) -> bool {
        self.status == CodeStatus::Active
    }
}

/// 生成接口的成功结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: DiscountCode,
    /// 服务端轮换后的新 token
    pub rotated_token: Option<String>,
}

/// 用户折扣码列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListing {
    pub codes: Vec<DiscountCode>,
    pub active_count: u32,
    /// 服务端声明的可用码上限
    pub max_active_allowed: u32,
    pub rotated_token: Option<String>,
}

impl CodeListing {
    /// 是否还能再领取新码
    pub fn has_capacity(&self) -> bool {
        self.active_count < self.max_active_allowed
    }

    /// 当前可用的折扣码
    pub fn active_codes(&self) -> impl Iterator<Item = &DiscountCode> {
        self.codes.iter().filter(|c| c.is_active())
    }
}

// ============================================================================
// 接口报文
// ============================================================================

/// `POST /clients/ruleta/generate` 响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub code: Option<DiscountCode>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl GenerateResponse {
    pub fn into_issued(self) -> Result<IssuedCode> {
        if !self.success {
            return Err(RuletaError::ServerRejected {
                message: self.message,
            });
        }

        let code = self
            .code
            .ok_or_else(|| RuletaError::InvalidResponse("生成响应缺少 code 字段".to_string()))?;

        Ok(IssuedCode {
            code,
            rotated_token: non_empty(self.token),
        })
    }
}

/// `GET /clients/ruleta/codes` 响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesResponse {
    pub success: bool,
    #[serde(default)]
    pub codes: Vec<DiscountCode>,
    #[serde(default)]
    pub active_codes: Option<u32>,
    #[serde(default)]
    pub max_active_allowed: Option<u32>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CodesResponse {
    pub fn into_listing(self) -> Result<CodeListing> {
        if !self.success {
            return Err(RuletaError::ServerRejected {
                message: self.message,
            });
        }

        // 没有上限就无法做领取前检查，不能默认放行
        let max_active_allowed = self.max_active_allowed.ok_or_else(|| {
            RuletaError::InvalidResponse("列表响应缺少 maxActiveAllowed 字段".to_string())
        })?;

        let active_count = self
            .active_codes
            .unwrap_or_else(|| self.codes.iter().filter(|c| c.is_active()).count() as u32);

        Ok(CodeListing {
            codes: self.codes,
            active_count,
            max_active_allowed,
            rotated_token: non_empty(self.token),
        })
    }
}

/// 失败响应体（4xx/5xx 时尽力解析）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        non_empty(self.message).or_else(|| non_empty(self.error))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_generate_response() {
        let body = json!({
            "success": true,
            "code": {
                "code": "ABC123",
                "name": "Verano 2025",
                "discount": "25% OFF",
                "color": "#FF6B6B",
                "textColor": "#FFFFFF",
                "expiresAt": "2025-12-31T23:59:59Z"
            },
            "token": "rotated-token"
        });

        let resp: GenerateResponse = serde_json::from_value(body).unwrap();
        let issued = resp.into_issued().unwrap();

        assert_eq!(issued.code.code, "ABC123");
        assert_eq!(issued.code.name, "Verano 2025");
        assert_eq!(issued.code.discount_label, "25% OFF");
        assert_eq!(issued.code.text_color.as_deref(), Some("#FFFFFF"));
        assert_eq!(issued.code.status, CodeStatus::Active);
        assert!(issued.code.expires_at.is_some());
        assert_eq!(issued.rotated_token.as_deref(), Some("rotated-token"));
    }

    #[test]
    fn test_generate_unsuccessful_is_rejection() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "success": false,
            "message": "Límite de códigos alcanzado"
        }))
        .unwrap();

        assert_eq!(
            resp.into_issued().unwrap_err(),
            RuletaError::rejected("Límite de códigos alcanzado")
        );
    }

    #[test]
    fn test_generate_without_code_is_invalid() {
        let resp: GenerateResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(matches!(
            resp.into_issued(),
            Err(RuletaError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_blank_rotated_token_is_ignored() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "success": true,
            "code": { "code": "X1" },
            "token": ""
        }))
        .unwrap();
        assert_eq!(resp.into_issued().unwrap().rotated_token, None);
    }

    #[test]
    fn test_parse_codes_response() {
        let resp: CodesResponse = serde_json::from_value(json!({
            "success": true,
            "codes": [
                { "code": "A1", "name": "n", "discount": "10%", "status": "active" },
                { "code": "B2", "name": "n", "discountLabel": "5%", "status": "used" },
                { "code": "C3", "name": "n", "discount": "15%", "status": "expired" }
            ],
            "activeCodes": 1,
            "maxActiveAllowed": 10
        }))
        .unwrap();

        let listing = resp.into_listing().unwrap();
        assert_eq!(listing.codes.len(), 3);
        assert_eq!(listing.codes[1].discount_label, "5%");
        assert_eq!(listing.active_count, 1);
        assert_eq!(listing.max_active_allowed, 10);
        assert!(listing.has_capacity());
        assert_eq!(listing.active_codes().count(), 1);
    }

    #[test]
    fn test_listing_at_ceiling_has_no_capacity() {
        let listing = CodeListing {
            codes: vec![],
            active_count: 10,
            max_active_allowed: 10,
            rotated_token: None,
        };
        assert!(!listing.has_capacity());
    }

    #[test]
    fn test_missing_active_count_is_derived() {
        let resp: CodesResponse = serde_json::from_value(json!({
            "success": true,
            "codes": [
                { "code": "A1", "status": "active" },
                { "code": "A2", "status": "active" },
                { "code": "B1", "status": "used" }
            ],
            "maxActiveAllowed": 3
        }))
        .unwrap();

        assert_eq!(resp.into_listing().unwrap().active_count, 2);
    }

    #[test]
    fn test_missing_ceiling_is_invalid() {
        let resp: CodesResponse =
            serde_json::from_value(json!({ "success": true, "codes": [] })).unwrap();
        assert!(matches!(
            resp.into_listing(),
            Err(RuletaError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_value(json!({ "error": "token inválido" })).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("token inválido"));

        let body: ErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
