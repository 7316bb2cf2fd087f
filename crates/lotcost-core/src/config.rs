//! 預測配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CostingError, Result};

/// 視窗、覆蓋與保留天數的上限（約 100 年）
pub const MAX_DAYS: u32 = 36_500;

/// 庫存預測參數配置
///
/// 緊急程度門檻由提前期與各段緩衝天數累加而成：
/// - `critical = lead_time_days + safety_stock_days`
/// - `high = critical + high_margin_days`
/// - `medium = high + medium_margin_days`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// 採購提前期（天）
    pub lead_time_days: u32,

    /// 安全庫存天數
    pub safety_stock_days: u32,

    /// HIGH 等級額外緩衝天數
    pub high_margin_days: u32,

    /// MEDIUM 等級額外緩衝天數
    pub medium_margin_days: u32,

    /// 建議訂購量要覆蓋的天數
    pub target_coverage_days: u32,

    /// 計算平均用量的歷史視窗（天）
    pub usage_window_days: u32,

    /// 預測保留天數（超過即可清除）
    pub retention_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lead_time_days: 14,
            safety_stock_days: 7,
            high_margin_days: 7,
            medium_margin_days: 14,
            target_coverage_days: 60,
            usage_window_days: 30,
            retention_days: 90,
        }
    }
}

impl ForecastConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 載入配置（負數在反序列化時即被拒絕）
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CostingError::InvalidConfig(format!("無法解析預測配置: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置提前期
    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    /// 建構器模式：設置安全庫存天數
    pub fn with_safety_stock_days(mut self, days: u32) -> Self {
        self.safety_stock_days = days;
        self
    }

    /// 建構器模式：設置 HIGH / MEDIUM 緩衝天數
    pub fn with_margins(mut self, high_margin_days: u32, medium_margin_days: u32) -> Self {
        self.high_margin_days = high_margin_days;
        self.medium_margin_days = medium_margin_days;
        self
    }

    /// 建構器模式：設置覆蓋天數
    pub fn with_target_coverage_days(mut self, days: u32) -> Self {
        self.target_coverage_days = days;
        self
    }

    /// 建構器模式：設置用量視窗
    pub fn with_usage_window_days(mut self, days: u32) -> Self {
        self.usage_window_days = days;
        self
    }

    /// 建構器模式：設置保留天數
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// 檢查配置是否合法
    ///
    /// 覆蓋、視窗與保留天數必須介於 1 到 [`MAX_DAYS`]。
    pub fn validate(&self) -> Result<()> {
        let bounded = [
            ("target_coverage_days", self.target_coverage_days),
            ("usage_window_days", self.usage_window_days),
            ("retention_days", self.retention_days),
        ];
        for (field, days) in bounded {
            if days == 0 || days > MAX_DAYS {
                return Err(CostingError::InvalidConfig(format!(
                    "{} 必須介於 1 到 {}: {}",
                    field, MAX_DAYS, days
                )));
            }
        }

        self.lead_time_days
            .checked_add(self.safety_stock_days)
            .and_then(|days| days.checked_add(self.high_margin_days))
            .and_then(|days| days.checked_add(self.medium_margin_days))
            .ok_or_else(|| CostingError::InvalidConfig("緊急程度門檻天數溢出".to_string()))?;

        Ok(())
    }

    /// CRITICAL 門檻（天）
    pub fn critical_threshold_days(&self) -> Decimal {
        Decimal::from(self.lead_time_days) + Decimal::from(self.safety_stock_days)
    }

    /// HIGH 門檻（天）
    pub fn high_threshold_days(&self) -> Decimal {
        self.critical_threshold_days() + Decimal::from(self.high_margin_days)
    }

    /// MEDIUM 門檻（天）
    pub fn medium_threshold_days(&self) -> Decimal {
        self.high_threshold_days() + Decimal::from(self.medium_margin_days)
    }
}
