//! # Lotcost Calculation Engine
//!
//! 成本彙總與庫存預測計算引擎

pub mod forecasting;
pub mod mapper;
pub mod memory;
pub mod orders;
pub mod ports;
pub mod product_cost;
pub mod recommendation;
pub mod refresh;
pub mod valuation;

// Re-export 主要類型
pub use forecasting::StockForecastCalculator;
pub use mapper::StockItemDto;
pub use memory::InMemoryStore;
pub use orders::{OrderBuilder, OrderPlan, StockDeduction};
pub use ports::{
    ForecastStore, OrderSnapshotSink, StockItemSource, StockLedger, UsageHistorySource,
};
pub use product_cost::{
    IngredientCostLine, IngredientStatus, ProductCostCalculator, ProductCostReport,
};
pub use recommendation::{
    OrderRecommendation, OrderRecommendationAggregator, PriorityLevel, StockTypeGroup,
};
pub use refresh::{ForecastRefresher, RefreshFailure, RefreshReport};
pub use valuation::{LotSummary, StockValuation, ValuationCalculator};

use rust_decimal::{Decimal, RoundingStrategy};

/// 金額四捨五入到 2 位小數（僅供顯示）
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 百分比四捨五入到 4 位小數
pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}
