//! 庫存估值（到岸成本）

use lotcost_core::{ChinaStockItem, StockItem, StockLot, StockType, ThaiStockItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 單一品項估值結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockValuation {
    /// 品項ID
    pub stock_item_id: Uuid,

    /// 貨源類型
    pub stock_type: StockType,

    /// 到岸總成本（未含緩衝）
    pub landed_total: Decimal,

    /// 緩衝金額
    pub buffer_amount: Decimal,

    /// 總成本（含緩衝）
    pub total_cost: Decimal,

    /// 每單位到岸成本（數量為 0 時無法定義）
    pub final_price: Option<Decimal>,
}

impl StockValuation {
    /// 單位成本是否可用
    pub fn is_priced(&self) -> bool {
        self.final_price.is_some()
    }
}

/// 批次估值彙總
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSummary {
    pub lot_id: Uuid,
    pub lot_number: String,
    pub item_count: usize,
    pub china_item_count: usize,
    pub thai_item_count: usize,
    pub total_quantity: Decimal,
    pub grand_total_value: Decimal,
    pub valuations: Vec<StockValuation>,
}

/// 估值計算器
pub struct ValuationCalculator;

impl ValuationCalculator {
    /// 計算品項估值
    ///
    /// 以進貨數量為基準，銷售扣減庫存後單位成本不變。
    pub fn valuate(item: &StockItem) -> StockValuation {
        let landed_total = match item {
            StockItem::China(china) => Self::china_landed_total(china),
            StockItem::Thai(thai) => Self::thai_landed_total(thai),
        };

        let total_cost = Self::apply_buffer(landed_total, item.buffer_percentage());

        StockValuation {
            stock_item_id: item.id(),
            stock_type: item.stock_type(),
            landed_total,
            buffer_amount: total_cost - landed_total,
            total_cost,
            final_price: Self::per_unit(total_cost, item.purchased_quantity()),
        }
    }

    /// 每單位到岸成本（含緩衝）
    pub fn final_price(item: &StockItem) -> Option<Decimal> {
        Self::valuate(item).final_price
    }

    /// 中國品項人民幣總額：單價 × 進貨數量 + 境內運費
    pub fn china_total_yuan(item: &ChinaStockItem) -> Decimal {
        item.unit_price_yuan * item.purchased_quantity + item.shipping_within_china_yuan
    }

    /// 中國品項泰銖到岸總額：人民幣總額 × 匯率 + 國際運費
    pub fn china_landed_total(item: &ChinaStockItem) -> Decimal {
        Self::china_total_yuan(item) * item.exchange_rate + item.shipping_china_to_thai_bath
    }

    /// 泰國品項到岸總額：進貨總價 + 運費
    pub fn thai_landed_total(item: &ThaiStockItem) -> Decimal {
        item.price_total + item.shipping_cost
    }

    /// 泰國品項含運費單價（未含緩衝）
    pub fn thai_price_per_unit_with_shipping(item: &ThaiStockItem) -> Option<Decimal> {
        Self::per_unit(Self::thai_landed_total(item), item.purchased_quantity)
    }

    /// 套用緩衝百分比：total × (1 + buffer / 100)
    ///
    /// 每次估值都從原始欄位重新計算，緩衝只會套用一次。
    pub fn apply_buffer(total: Decimal, buffer_percentage: Option<Decimal>) -> Decimal {
        match buffer_percentage {
            Some(buffer) => total * (Decimal::ONE + buffer / Decimal::ONE_HUNDRED),
            None => total,
        }
    }

    /// 批次彙總
    pub fn summarize_lot(lot: &StockLot) -> LotSummary {
        let valuations: Vec<StockValuation> = lot.items.iter().map(Self::valuate).collect();
        let grand_total_value = valuations.iter().map(|v| v.total_cost).sum();
        let china_item_count = valuations
            .iter()
            .filter(|v| v.stock_type == StockType::China)
            .count();

        tracing::debug!(
            "批次 {} 估值：{} 個品項，總值 {}",
            lot.lot_number,
            valuations.len(),
            grand_total_value
        );

        LotSummary {
            lot_id: lot.id,
            lot_number: lot.lot_number.clone(),
            item_count: valuations.len(),
            china_item_count,
            thai_item_count: valuations.len() - china_item_count,
            total_quantity: lot.total_quantity(),
            grand_total_value,
            valuations,
        }
    }

    fn per_unit(total: Decimal, quantity: Decimal) -> Option<Decimal> {
        if quantity <= Decimal::ZERO {
            return None;
        }
        total.checked_div(quantity)
    }
}
