//! 预览码目录
//!
//! 转盘转动期间需要一个看起来合理的结果用于展示。预览码从静态模板中随机挑选，
//! 只用于展示，不代表服务端签发的任何权益。

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use ruleta_client::{CodeStatus, DiscountCode};

/// 预览码前缀，便于与真实折扣码区分
pub const PREVIEW_PREFIX: &str = "PREV-";

const TOKEN_LEN: usize = 6;
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 展示模板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTemplate {
    pub name: &'static str,
    pub discount_label: &'static str,
    pub color: &'static str,
    pub text_color: &'static str,
}

const TEMPLATES: [PreviewTemplate; 8] = [
    PreviewTemplate {
        name: "Verano 2025",
        discount_label: "25% OFF",
        color: "#FF6B6B",
        text_color: "#FFFFFF",
    },
    PreviewTemplate {
        name: "Envío gratis",
        discount_label: "FREE SHIPPING",
        color: "#4ECDC4",
        text_color: "#1A1A1A",
    },
    PreviewTemplate {
        name: "Descuento flash",
        discount_label: "10% OFF",
        color: "#FFE66D",
        text_color: "#1A1A1A",
    },
    PreviewTemplate {
        name: "Cliente VIP",
        discount_label: "30% OFF",
        color: "#6C5CE7",
        text_color: "#FFFFFF",
    },
    PreviewTemplate {
        name: "Bienvenida",
        discount_label: "15% OFF",
        color: "#00B894",
        text_color: "#FFFFFF",
    },
    PreviewTemplate {
        name: "Fin de semana",
        discount_label: "20% OFF",
        color: "#E17055",
        text_color: "#FFFFFF",
    },
    PreviewTemplate {
        name: "2x1",
        discount_label: "2x1",
        color: "#0984E3",
        text_color: "#FFFFFF",
    },
    PreviewTemplate {
        name: "Sorpresa",
        discount_label: "5% OFF",
        color: "#FD79A8",
        text_color: "#1A1A1A",
    },
];

/// 预览码生成器
#[derive(Debug, Clone)]
pub struct PreviewCatalog {
    rng: StdRng,
}

impl Default for PreviewCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewCatalog {
    /// 使用系统随机源初始化
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// 固定种子，结果可复现
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn templates() -> &'static [PreviewTemplate] {
        &TEMPLATES
    }

    pub fn is_preview_code(code: &str) -> bool {
        code.starts_with(PREVIEW_PREFIX)
    }

    /// 生成一个预览码
    pub fn next_preview(&mut self) -> DiscountCode {
        let template = *TEMPLATES.choose(&mut self.rng).unwrap_or(&TEMPLATES[0]);
        let token: String = (0..TOKEN_LEN)
            .map(|_| TOKEN_ALPHABET[self.rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect();

        DiscountCode {
            code: format!("{PREVIEW_PREFIX}{token}"),
            name: template.name.to_string(),
            discount_label: template.discount_label.to_string(),
            color: Some(template.color.to_string()),
            text_color: Some(template.text_color.to_string()),
            status: CodeStatus::Active,
            expires_at: None,
        }
    }
}
