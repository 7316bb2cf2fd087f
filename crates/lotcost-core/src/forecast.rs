//! 庫存預測模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StockType;

/// 緊急程度
///
/// 依序比較：`Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UrgencyLevel::Low => "LOW",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::High => "HIGH",
            UrgencyLevel::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// 預計缺貨天數
///
/// 沒有用量時缺貨日無法定義，以 `NoUsage` 表示，與「0 天」區分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockOutEstimate {
    Days(Decimal),
    NoUsage,
}

impl StockOutEstimate {
    /// 取得天數（無用量時為 None）
    pub fn days(&self) -> Option<Decimal> {
        match self {
            StockOutEstimate::Days(days) => Some(*days),
            StockOutEstimate::NoUsage => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, StockOutEstimate::NoUsage)
    }
}

/// 庫存預測（每個庫存品項一筆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockForecast {
    /// 庫存品項ID（upsert 鍵值）
    pub stock_item_id: Uuid,

    /// 品名
    pub stock_item_name: String,

    /// 貨源類型
    pub stock_type: StockType,

    /// 現有庫存
    pub current_stock: Decimal,

    /// 平均日用量
    pub average_daily_usage: Decimal,

    /// 平均週用量
    pub average_weekly_usage: Decimal,

    /// 平均月用量
    pub average_monthly_usage: Decimal,

    /// 預計缺貨天數
    pub days_until_stock_out: StockOutEstimate,

    /// 緊急程度
    pub urgency_level: UrgencyLevel,

    /// 建議訂購量
    pub recommended_order_quantity: Decimal,

    /// 預估訂購成本（單位成本無法定義時為 None）
    pub estimated_order_cost: Option<Decimal>,

    /// 最後計算時間
    pub last_calculated: DateTime<Utc>,
}

impl StockForecast {
    /// 檢查是否早於保留期限
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_calculated < cutoff
    }

    /// 檢查是否需要下單
    pub fn needs_order(&self) -> bool {
        self.recommended_order_quantity > Decimal::ZERO
    }

    /// 訂購成本（未定義視為 0）
    pub fn order_cost_or_zero(&self) -> Decimal {
        self.estimated_order_cost.unwrap_or(Decimal::ZERO)
    }
}
