//! 庫存預測計算

use chrono::{DateTime, Duration, NaiveDate, Utc};
use lotcost_core::{
    DailyUsage, ForecastConfig, StockForecast, StockItem, StockOutEstimate, UrgencyLevel,
};
use rayon::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::valuation::ValuationCalculator;

const DAYS_PER_WEEK: u32 = 7;
const DAYS_PER_MONTH: u32 = 30;

/// 庫存預測計算器
#[derive(Debug, Clone)]
pub struct StockForecastCalculator {
    config: ForecastConfig,
}

impl StockForecastCalculator {
    /// 創建新的預測計算器（配置不合法時拒絕）
    pub fn new(config: ForecastConfig) -> lotcost_core::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 獲取配置引用
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// 計算單一品項的預測
    pub fn forecast(
        &self,
        item: &StockItem,
        history: &[DailyUsage],
        now: DateTime<Utc>,
    ) -> StockForecast {
        let as_of = now.date_naive();
        let current_stock = item.quantity();
        let average_daily_usage = self.average_daily_usage(history, as_of);
        let days_until_stock_out = Self::days_until_stock_out(current_stock, average_daily_usage);
        let urgency_level = self.classify(days_until_stock_out);
        let recommended_order_quantity =
            self.recommended_order_quantity(average_daily_usage, current_stock);

        let estimated_order_cost = if recommended_order_quantity.is_zero() {
            Some(Decimal::ZERO)
        } else {
            ValuationCalculator::final_price(item).map(|price| price * recommended_order_quantity)
        };

        tracing::debug!(
            "品項 {} 預測：日用量 {}，缺貨天數 {:?}，等級 {}",
            item.name(),
            average_daily_usage,
            days_until_stock_out,
            urgency_level
        );

        StockForecast {
            stock_item_id: item.id(),
            stock_item_name: item.name().to_string(),
            stock_type: item.stock_type(),
            current_stock,
            average_daily_usage,
            average_weekly_usage: average_daily_usage * Decimal::from(DAYS_PER_WEEK),
            average_monthly_usage: average_daily_usage * Decimal::from(DAYS_PER_MONTH),
            days_until_stock_out,
            urgency_level,
            recommended_order_quantity,
            estimated_order_cost,
            last_calculated: now,
        }
    }

    /// 批量計算（並行）
    pub fn forecast_batch(
        &self,
        inputs: &[(StockItem, Vec<DailyUsage>)],
        now: DateTime<Utc>,
    ) -> Vec<StockForecast> {
        inputs
            .par_iter()
            .map(|(item, history)| self.forecast(item, history, now))
            .collect()
    }

    /// 用量視窗 [from, as_of]
    pub fn usage_window(&self, as_of: NaiveDate) -> (NaiveDate, NaiveDate) {
        let span = Duration::days(i64::from(self.config.usage_window_days) - 1);
        let from = as_of.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
        (from, as_of)
    }

    /// 平均日用量
    ///
    /// 視窗內總用量除以觀察天數；觀察天數從視窗內第一筆記錄算起，
    /// 最多為視窗長度，新品項不會因歷史不足而被低估。
    pub fn average_daily_usage(&self, history: &[DailyUsage], as_of: NaiveDate) -> Decimal {
        let (from, to) = self.usage_window(as_of);
        let in_window: Vec<&DailyUsage> = history
            .iter()
            .filter(|usage| usage.is_within(from, to))
            .collect();

        let Some(first_date) = in_window.iter().map(|usage| usage.date).min() else {
            return Decimal::ZERO;
        };

        let observed_days = ((as_of - first_date).num_days() + 1)
            .min(i64::from(self.config.usage_window_days));
        let total: Decimal = in_window.iter().map(|usage| usage.quantity).sum();

        total / Decimal::from(observed_days)
    }

    /// 預計缺貨天數，無用量時為 `NoUsage`
    pub fn days_until_stock_out(
        current_stock: Decimal,
        average_daily_usage: Decimal,
    ) -> StockOutEstimate {
        if average_daily_usage <= Decimal::ZERO {
            return StockOutEstimate::NoUsage;
        }
        let days = (current_stock / average_daily_usage)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        StockOutEstimate::Days(days)
    }

    /// 依缺貨天數分級
    pub fn classify(&self, estimate: StockOutEstimate) -> UrgencyLevel {
        let Some(days) = estimate.days() else {
            return UrgencyLevel::Low;
        };

        if days < self.config.critical_threshold_days() {
            UrgencyLevel::Critical
        } else if days < self.config.high_threshold_days() {
            UrgencyLevel::High
        } else if days < self.config.medium_threshold_days() {
            UrgencyLevel::Medium
        } else {
            UrgencyLevel::Low
        }
    }

    /// 建議訂購量：覆蓋天數所需用量 − 現有庫存，至少為 0，無條件進位到整數
    pub fn recommended_order_quantity(
        &self,
        average_daily_usage: Decimal,
        current_stock: Decimal,
    ) -> Decimal {
        let target = average_daily_usage * Decimal::from(self.config.target_coverage_days);
        let shortfall = target - current_stock;
        if shortfall > Decimal::ZERO {
            shortfall.ceil()
        } else {
            Decimal::ZERO
        }
    }
}
