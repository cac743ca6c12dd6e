//! Mock 服务状态
//!
//! 保存 token 与用户的映射、每个用户的折扣码、后台资源数据，以及故障注入开关。

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::MemoryStore;

/// 后台管理支持的资源路径
pub const ADMIN_RESOURCES: [&str; 5] = ["categories", "products", "media", "reviews", "sales"];

/// 转盘奖项模板：名称、折扣文案、背景色、文字色
const PRIZES: [(&str, &str, &str, &str); 6] = [
    ("Verano 2025", "25% OFF", "#FF6B6B", "#FFFFFF"),
    ("Envío gratis", "FREE SHIPPING", "#4ECDC4", "#1A1A1A"),
    ("Descuento flash", "10% OFF", "#FFE66D", "#1A1A1A"),
    ("Cliente VIP", "30% OFF", "#6C5CE7", "#FFFFFF"),
    ("Bienvenida", "15% OFF", "#00B894", "#FFFFFF"),
    ("Fin de semana", "20% OFF", "#E17055", "#FFFFFF"),
];

/// Mock 服务配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 每个用户同时可持有的可用折扣码上限
    pub max_active: u32,
    /// 每次成功调用后是否下发新 token（旧 token 仍然有效）
    pub rotate_tokens: bool,
    /// 新码有效期
    pub code_validity: chrono::Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            max_active: 10,
            rotate_tokens: true,
            code_validity: chrono::Duration::days(30),
        }
    }
}

/// 模拟折扣码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockCode {
    pub code: String,
    pub name: String,
    pub discount: String,
    pub color: String,
    pub text_color: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

impl MockCode {
    /// 随机生成一个可用折扣码
    pub fn random(validity: chrono::Duration) -> Self {
        let mut rng = rand::rng();
        let (name, discount, color, text_color) = *PRIZES.choose(&mut rng).unwrap_or(&PRIZES[0]);

        Self {
            code: random_code(&mut rng),
            name: name.to_string(),
            discount: discount.to_string(),
            color: color.to_string(),
            text_color: text_color.to_string(),
            status: "active".to_string(),
            expires_at: Utc::now() + validity,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

fn random_code(rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    (0..8)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// 故障注入设置
#[derive(Debug, Default)]
struct Faults {
    /// 接下来多少次转盘请求直接失败
    fail_next: u32,
    fail_status: u16,
    /// 只作用于生成接口的故障
    generate_fail_next: u32,
    generate_fail_status: u16,
    /// 每次转盘请求的额外延迟
    delay: Duration,
}

/// 注入故障时的行为
#[derive(Debug, Clone, Copy)]
pub struct InjectedFault {
    pub status: u16,
}

/// Mock 服务全局状态
pub struct MockBackendState {
    pub config: MockConfig,
    /// token -> user_id
    tokens: DashMap<String, String>,
    /// user_id -> 折扣码列表（按生成顺序）
    codes: DashMap<String, Vec<MockCode>>,
    faults: Mutex<Faults>,
    generate_calls: AtomicU32,
    codes_calls: AtomicU32,
    /// 资源路径 -> 存储
    admin: DashMap<&'static str, MemoryStore>,
}

impl MockBackendState {
    pub fn new(config: MockConfig) -> Self {
        let admin = DashMap::new();
        for resource in ADMIN_RESOURCES {
            admin.insert(resource, MemoryStore::new());
        }

        Self {
            config,
            tokens: DashMap::new(),
            codes: DashMap::new(),
            faults: Mutex::new(Faults::default()),
            generate_calls: AtomicU32::new(0),
            codes_calls: AtomicU32::new(0),
            admin,
        }
    }

    // ==================== 用户与 token ====================

    pub fn register_user(&self, token: &str, user_id: &str) {
        self.tokens.insert(token.to_string(), user_id.to_string());
    }

    pub fn user_for_token(&self, token: &str) -> Option<String> {
        self.tokens.get(token).map(|u| u.value().clone())
    }

    /// 为用户签发新 token；关闭轮换时返回 None
    pub fn rotate_token(&self, user_id: &str) -> Option<String> {
        if !self.config.rotate_tokens {
            return None;
        }
        let token = format!("tok-{}", Uuid::new_v4().simple());
        self.register_user(&token, user_id);
        Some(token)
    }

    // ==================== 折扣码 ====================

    pub fn codes_for(&self, user_id: &str) -> Vec<MockCode> {
        self.codes
            .get(user_id)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    pub fn active_count(&self, user_id: &str) -> u32 {
        self.codes
            .get(user_id)
            .map(|c| c.iter().filter(|code| code.is_active()).count() as u32)
            .unwrap_or(0)
    }

    /// 为用户生成新码；已达上限时返回 None
    pub fn issue_code(&self, user_id: &str) -> Option<MockCode> {
        let mut entry = self.codes.entry(user_id.to_string()).or_default();
        let active = entry.iter().filter(|c| c.is_active()).count() as u32;
        if active >= self.config.max_active {
            return None;
        }

        let code = MockCode::random(self.config.code_validity);
        entry.push(code.clone());
        Some(code)
    }

    /// 直接写入折扣码（测试数据准备）
    pub fn seed_code(&self, user_id: &str, code: MockCode) {
        self.codes.entry(user_id.to_string()).or_default().push(code);
    }

    /// 修改折扣码状态，返回是否找到
    pub fn set_code_status(&self, user_id: &str, code: &str, status: &str) -> bool {
        let Some(mut codes) = self.codes.get_mut(user_id) else {
            return false;
        };
        match codes.iter_mut().find(|c| c.code == code) {
            Some(found) => {
                found.status = status.to_string();
                true
            }
            None => false,
        }
    }

    // ==================== 故障注入 ====================

    /// 让接下来 `count` 次转盘请求返回指定状态码
    pub fn fail_next(&self, count: u32, status: u16) {
        let mut faults = self.faults.lock();
        faults.fail_next = count;
        faults.fail_status = status;
    }

    /// 只让接下来 `count` 次生成请求返回指定状态码，查询接口不受影响
    pub fn fail_next_generate(&self, count: u32, status: u16) {
        let mut faults = self.faults.lock();
        faults.generate_fail_next = count;
        faults.generate_fail_status = status;
    }

    /// 为每次转盘请求增加固定延迟
    pub fn set_delay(&self, delay: Duration) {
        self.faults.lock().delay = delay;
    }

    pub(crate) fn delay(&self) -> Duration {
        self.faults.lock().delay
    }

    /// 消耗一次故障配额
    pub(crate) fn take_fault(&self, generate: bool) -> Option<InjectedFault> {
        let mut faults = self.faults.lock();
        if generate && faults.generate_fail_next > 0 {
            faults.generate_fail_next -= 1;
            return Some(InjectedFault {
                status: faults.generate_fail_status,
            });
        }
        if faults.fail_next == 0 {
            return None;
        }
        faults.fail_next -= 1;
        Some(InjectedFault {
            status: faults.fail_status,
        })
    }

    // ==================== 调用计数 ====================

    pub(crate) fn count_generate(&self) {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count_codes(&self) {
        self.codes_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn codes_calls(&self) -> u32 {
        self.codes_calls.load(Ordering::SeqCst)
    }

    // ==================== 后台资源 ====================

    pub fn admin_store(&self, resource: &str) -> Option<MemoryStore> {
        self.admin.get(resource).map(|s| s.value().clone())
    }
}

impl Default for MockBackendState {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}
