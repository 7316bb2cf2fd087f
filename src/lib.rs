//! # Lotcost
//!
//! 庫存批次成本、產品成本彙總與庫存預測引擎
//!
//! - [`model`]：資料模型、配置與錯誤類型
//! - [`calc`]：估值、成本彙總、預測與採購建議計算

pub use lotcost_calc as calc;
pub use lotcost_core as model;

pub use lotcost_calc::{
    ForecastRefresher, InMemoryStore, OrderBuilder, OrderRecommendationAggregator,
    ProductCostCalculator, StockForecastCalculator, ValuationCalculator,
};
pub use lotcost_core::{CostingError, ForecastConfig, Result};
