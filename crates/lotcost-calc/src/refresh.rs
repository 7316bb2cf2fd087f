//! 預測重算與維護

use chrono::{DateTime, Duration, Utc};
use lotcost_core::{CostingError, ForecastConfig, StockForecast, UrgencyLevel};
use uuid::Uuid;

use crate::forecasting::StockForecastCalculator;
use crate::ports::{ForecastStore, StockItemSource, UsageHistorySource};
use crate::recommendation::{OrderRecommendation, OrderRecommendationAggregator};

/// 單一品項重算失敗
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshFailure {
    pub stock_item_id: Uuid,
    pub reason: String,
}

/// 重算結果
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// 成功重算的品項
    pub refreshed: Vec<Uuid>,

    /// 重算失敗的品項
    pub failures: Vec<RefreshFailure>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl RefreshReport {
    fn empty() -> Self {
        Self {
            refreshed: Vec::new(),
            failures: Vec::new(),
            calculation_time_ms: None,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// 預測重算器
pub struct ForecastRefresher {
    calculator: StockForecastCalculator,
}

impl ForecastRefresher {
    /// 創建新的預測重算器
    pub fn new(config: ForecastConfig) -> lotcost_core::Result<Self> {
        Ok(Self {
            calculator: StockForecastCalculator::new(config)?,
        })
    }

    /// 獲取計算器引用
    pub fn calculator(&self) -> &StockForecastCalculator {
        &self.calculator
    }

    /// 重算指定品項的預測並寫回
    ///
    /// 單一品項失敗只記錄警告，不影響其他品項。
    pub fn refresh<S, U, F>(
        &self,
        stock_item_ids: &[Uuid],
        stock: &S,
        usage: &U,
        store: &F,
        now: DateTime<Utc>,
    ) -> RefreshReport
    where
        S: StockItemSource + ?Sized,
        U: UsageHistorySource + ?Sized,
        F: ForecastStore + ?Sized,
    {
        tracing::info!("開始預測重算：品項 {} 筆", stock_item_ids.len());
        let start_time = std::time::Instant::now();

        let mut report = RefreshReport::empty();
        for &id in stock_item_ids {
            match self.refresh_one(id, stock, usage, store, now) {
                Ok(_) => report.refreshed.push(id),
                Err(e) => {
                    tracing::warn!("品項 {} 預測重算失敗: {}", id, e);
                    report.failures.push(RefreshFailure {
                        stock_item_id: id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.calculation_time_ms = Some(start_time.elapsed().as_millis());
        tracing::info!(
            "預測重算完成，耗時 {:?}，成功 {} 筆，失敗 {} 筆",
            start_time.elapsed(),
            report.refreshed.len(),
            report.failures.len()
        );

        report
    }

    /// 重算單一品項
    pub fn refresh_one<S, U, F>(
        &self,
        stock_item_id: Uuid,
        stock: &S,
        usage: &U,
        store: &F,
        now: DateTime<Utc>,
    ) -> lotcost_core::Result<StockForecast>
    where
        S: StockItemSource + ?Sized,
        U: UsageHistorySource + ?Sized,
        F: ForecastStore + ?Sized,
    {
        let item = stock
            .find_stock_item(stock_item_id)?
            .ok_or(CostingError::StockItemNotFound(stock_item_id))?;

        let (from, to) = self.calculator.usage_window(now.date_naive());
        let history = usage.daily_usage(stock_item_id, from, to)?;
        let forecast = self.calculator.forecast(&item, &history, now);

        if let Some(previous) = store.find_forecast(stock_item_id)? {
            if previous.urgency_level != forecast.urgency_level {
                tracing::info!(
                    "品項 {} 緊急程度變更: {} → {}",
                    forecast.stock_item_name,
                    previous.urgency_level,
                    forecast.urgency_level
                );
            }
        }

        store.upsert_forecast(forecast.clone())?;
        Ok(forecast)
    }

    /// 保留期限：早於此時間的預測可清除
    pub fn retention_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let retention = Duration::days(i64::from(self.calculator.config().retention_days));
        now.checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// 清除過期預測，回傳清除筆數
    pub fn purge_stale<F>(&self, store: &F, now: DateTime<Utc>) -> lotcost_core::Result<usize>
    where
        F: ForecastStore + ?Sized,
    {
        let cutoff = self.retention_cutoff(now);
        let purged = store.delete_calculated_before(cutoff)?;
        tracing::info!("清除 {} 筆早於 {} 的預測", purged, cutoff);
        Ok(purged)
    }

    /// 緊急品項（CRITICAL / HIGH），依緊急程度排序
    pub fn urgent_forecasts<F>(store: &F) -> lotcost_core::Result<Vec<StockForecast>>
    where
        F: ForecastStore + ?Sized,
    {
        let mut urgent: Vec<StockForecast> = store
            .list_forecasts()?
            .into_iter()
            .filter(|f| f.urgency_level >= UrgencyLevel::High)
            .collect();
        urgent.sort_by(|a, b| b.urgency_level.cmp(&a.urgency_level));
        Ok(urgent)
    }

    /// 即將需要訂購的品項（MEDIUM）
    pub fn soon_to_order_forecasts<F>(store: &F) -> lotcost_core::Result<Vec<StockForecast>>
    where
        F: ForecastStore + ?Sized,
    {
        Ok(store
            .list_forecasts()?
            .into_iter()
            .filter(|f| f.urgency_level == UrgencyLevel::Medium)
            .collect())
    }

    /// 依目前保存的預測產生採購建議
    pub fn recommend<F>(store: &F) -> lotcost_core::Result<OrderRecommendation>
    where
        F: ForecastStore + ?Sized,
    {
        let urgent = Self::urgent_forecasts(store)?;
        let soon = Self::soon_to_order_forecasts(store)?;
        Ok(OrderRecommendationAggregator::aggregate(&urgent, &soon))
    }
}
