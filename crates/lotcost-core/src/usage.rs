//! 歷史用量模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 單日用量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// 日期
    pub date: NaiveDate,

    /// 當日用量
    pub quantity: Decimal,
}

impl DailyUsage {
    pub fn new(date: NaiveDate, quantity: Decimal) -> Self {
        Self { date, quantity }
    }

    /// 檢查是否落在 [from, to] 區間內
    pub fn is_within(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.date >= from && self.date <= to
    }
}
