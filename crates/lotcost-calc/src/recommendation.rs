//! 採購建議彙總

use lotcost_core::{StockForecast, StockType, UrgencyLevel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 採購建議優先級
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PriorityLevel::Medium => "MEDIUM",
            PriorityLevel::High => "HIGH",
            PriorityLevel::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// 依貨源分組的建議
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTypeGroup {
    pub stock_type: StockType,
    pub item_count: usize,
    pub subtotal: Decimal,
    pub items: Vec<StockForecast>,
}

impl StockTypeGroup {
    fn new(stock_type: StockType) -> Self {
        Self {
            stock_type,
            item_count: 0,
            subtotal: Decimal::ZERO,
            items: Vec::new(),
        }
    }

    fn push(&mut self, forecast: StockForecast) {
        self.item_count += 1;
        self.subtotal += forecast.order_cost_or_zero();
        self.items.push(forecast);
    }
}

/// 採購建議報表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecommendation {
    pub priority_level: PriorityLevel,
    pub total_items_to_order: usize,
    pub total_order_cost: Decimal,
    pub urgent_items: Vec<StockForecast>,
    pub soon_items: Vec<StockForecast>,
    pub china: StockTypeGroup,
    pub thai: StockTypeGroup,
}

impl OrderRecommendation {
    /// 依貨源取得分組
    pub fn group(&self, stock_type: StockType) -> &StockTypeGroup {
        match stock_type {
            StockType::China => &self.china,
            StockType::Thai => &self.thai,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_items_to_order == 0
    }
}

/// 採購建議彙總器
pub struct OrderRecommendationAggregator;

impl OrderRecommendationAggregator {
    /// 合併緊急與即將需要訂購的清單
    ///
    /// 分組時先緊急後即將，組內保持輸入順序。
    pub fn aggregate(urgent: &[StockForecast], soon: &[StockForecast]) -> OrderRecommendation {
        let priority_level = Self::priority_level(urgent);

        let mut china = StockTypeGroup::new(StockType::China);
        let mut thai = StockTypeGroup::new(StockType::Thai);
        for forecast in urgent.iter().chain(soon.iter()) {
            match forecast.stock_type {
                StockType::China => china.push(forecast.clone()),
                StockType::Thai => thai.push(forecast.clone()),
            }
        }

        let total_order_cost = china.subtotal + thai.subtotal;

        tracing::info!(
            "採購建議：緊急 {} 筆，即將 {} 筆，總成本 {}，優先級 {}",
            urgent.len(),
            soon.len(),
            total_order_cost,
            priority_level
        );

        OrderRecommendation {
            priority_level,
            total_items_to_order: urgent.len() + soon.len(),
            total_order_cost,
            urgent_items: urgent.to_vec(),
            soon_items: soon.to_vec(),
            china,
            thai,
        }
    }

    /// 從全部預測中挑出需要訂購的品項再彙總
    ///
    /// CRITICAL / HIGH 視為緊急，MEDIUM 視為即將需要訂購。
    pub fn from_forecasts(forecasts: &[StockForecast]) -> OrderRecommendation {
        let (urgent, soon) = Self::split_by_urgency(forecasts);
        Self::aggregate(&urgent, &soon)
    }

    /// 依緊急程度拆分（保持原順序），LOW 不列入
    pub fn split_by_urgency(
        forecasts: &[StockForecast],
    ) -> (Vec<StockForecast>, Vec<StockForecast>) {
        let urgent = forecasts
            .iter()
            .filter(|f| f.urgency_level >= UrgencyLevel::High)
            .cloned()
            .collect();
        let soon = forecasts
            .iter()
            .filter(|f| f.urgency_level == UrgencyLevel::Medium)
            .cloned()
            .collect();
        (urgent, soon)
    }

    /// 優先級：有 CRITICAL → CRITICAL；有緊急品項 → HIGH；否則 MEDIUM
    pub fn priority_level(urgent: &[StockForecast]) -> PriorityLevel {
        if urgent
            .iter()
            .any(|f| f.urgency_level == UrgencyLevel::Critical)
        {
            PriorityLevel::Critical
        } else if !urgent.is_empty() {
            PriorityLevel::High
        } else {
            PriorityLevel::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lotcost_core::StockOutEstimate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn forecast(
        name: &str,
        stock_type: StockType,
        urgency_level: UrgencyLevel,
        cost: Option<Decimal>,
    ) -> StockForecast {
        StockForecast {
            stock_item_id: Uuid::new_v4(),
            stock_item_name: name.to_string(),
            stock_type,
            current_stock: dec!(10),
            average_daily_usage: dec!(1),
            average_weekly_usage: dec!(7),
            average_monthly_usage: dec!(30),
            days_until_stock_out: StockOutEstimate::Days(dec!(10)),
            urgency_level,
            recommended_order_quantity: dec!(5),
            estimated_order_cost: cost,
            last_calculated: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_critical_priority() {
        let urgent = vec![forecast("A", StockType::China, UrgencyLevel::Critical, Some(dec!(50)))];
        let soon = vec![forecast("B", StockType::Thai, UrgencyLevel::Medium, Some(dec!(30)))];

        let report = OrderRecommendationAggregator::aggregate(&urgent, &soon);

        assert_eq!(report.total_order_cost, dec!(80));
        assert_eq!(report.priority_level, PriorityLevel::Critical);
        assert_eq!(report.priority_level.to_string(), "CRITICAL");
        assert_eq!(report.total_items_to_order, 2);
    }

    #[test]
    fn test_high_and_medium_priority() {
        let urgent = vec![forecast("A", StockType::China, UrgencyLevel::High, Some(dec!(50)))];
        assert_eq!(
            OrderRecommendationAggregator::aggregate(&urgent, &[]).priority_level,
            PriorityLevel::High
        );

        let soon = vec![forecast("B", StockType::Thai, UrgencyLevel::Medium, Some(dec!(30)))];
        let report = OrderRecommendationAggregator::aggregate(&[], &soon);
        assert_eq!(report.priority_level, PriorityLevel::Medium);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_missing_cost_counts_as_zero() {
        let urgent = vec![
            forecast("A", StockType::China, UrgencyLevel::High, None),
            forecast("B", StockType::China, UrgencyLevel::High, Some(dec!(12.5))),
        ];
        let report = OrderRecommendationAggregator::aggregate(&urgent, &[]);
        assert_eq!(report.total_order_cost, dec!(12.5));
        assert_eq!(report.china.subtotal, dec!(12.5));
    }

    #[test]
    fn test_stable_partition_by_stock_type() {
        let urgent = vec![
            forecast("C1", StockType::China, UrgencyLevel::Critical, Some(dec!(10))),
            forecast("T1", StockType::Thai, UrgencyLevel::High, Some(dec!(20))),
            forecast("C2", StockType::China, UrgencyLevel::High, Some(dec!(30))),
        ];
        let soon = vec![
            forecast("T2", StockType::Thai, UrgencyLevel::Medium, Some(dec!(40))),
            forecast("C3", StockType::China, UrgencyLevel::Medium, None),
        ];

        let report = OrderRecommendationAggregator::aggregate(&urgent, &soon);

        let china: Vec<_> = report.china.items.iter().map(|f| f.stock_item_name.as_str()).collect();
        let thai: Vec<_> = report.thai.items.iter().map(|f| f.stock_item_name.as_str()).collect();
        assert_eq!(china, vec!["C1", "C2", "C3"]);
        assert_eq!(thai, vec!["T1", "T2"]);
        assert_eq!(report.group(StockType::China).item_count, 3);
        assert_eq!(report.group(StockType::China).subtotal, dec!(40));
        assert_eq!(report.group(StockType::Thai).item_count, 2);
        assert_eq!(report.group(StockType::Thai).subtotal, dec!(60));
        assert_eq!(report.total_order_cost, dec!(100));
    }

    #[test]
    fn test_from_forecasts_skips_low() {
        let forecasts = vec![
            forecast("A", StockType::Thai, UrgencyLevel::Low, Some(dec!(99))),
            forecast("B", StockType::Thai, UrgencyLevel::Medium, Some(dec!(1))),
            forecast("C", StockType::China, UrgencyLevel::High, Some(dec!(2))),
        ];

        let report = OrderRecommendationAggregator::from_forecasts(&forecasts);
        assert_eq!(report.urgent_items.len(), 1);
        assert_eq!(report.soon_items.len(), 1);
        assert_eq!(report.total_order_cost, dec!(3));
        assert_eq!(report.priority_level, PriorityLevel::High);
    }

    #[test]
    fn test_empty_inputs() {
        let report = OrderRecommendationAggregator::aggregate(&[], &[]);
        assert!(report.is_empty());
        assert_eq!(report.total_order_cost, Decimal::ZERO);
        assert_eq!(report.priority_level, PriorityLevel::Medium);
    }
}
