//! # Lotcost Core
//!
//! 核心資料模型與類型定義

pub mod config;
pub mod forecast;
pub mod order;
pub mod product;
pub mod stock;
pub mod usage;

// Re-export 主要類型
pub use config::{ForecastConfig, MAX_DAYS};
pub use forecast::{StockForecast, StockOutEstimate, UrgencyLevel};
pub use order::{Order, OrderItem, OrderStatus};
pub use product::{Product, ProductIngredient};
pub use stock::{ChinaStockItem, StockItem, StockLot, StockType, ThaiStockItem};
pub use usage::DailyUsage;

use rust_decimal::Decimal;
use uuid::Uuid;

/// 成本計算錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum CostingError {
    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("無效的庫存品項 {id}: {reason}")]
    InvalidStockItem { id: Uuid, reason: String },

    #[error("無效的產品 {id}: {reason}")]
    InvalidProduct { id: Uuid, reason: String },

    #[error("找不到庫存品項: {0}")]
    StockItemNotFound(Uuid),

    #[error("庫存不足：品項 {stock_item_id} 需要 {requested}, 可用 {available}")]
    InsufficientStock {
        stock_item_id: Uuid,
        requested: Decimal,
        available: Decimal,
    },

    #[error("資料存取錯誤: {0}")]
    Repository(String),

    #[error("計算錯誤: {0}")]
    CalculationError(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CostingError>;
