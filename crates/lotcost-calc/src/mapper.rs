//! 庫存品項 DTO 轉換

use lotcost_core::{ChinaStockItem, CostingError, StockItem, StockType, ThaiStockItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::valuation::ValuationCalculator;

/// 庫存品項對外資料格式（扁平結構，附帶估值結果）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItemDto {
    pub id: Uuid,
    pub lot_id: Option<Uuid>,
    pub name: String,
    pub stock_type: StockType,
    pub purchased_quantity: Decimal,
    pub quantity: Decimal,
    pub buffer_percentage: Option<Decimal>,

    // 中國品項欄位
    pub unit_price_yuan: Option<Decimal>,
    pub shipping_within_china_yuan: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub shipping_china_to_thai_bath: Option<Decimal>,
    pub total_yuan: Option<Decimal>,

    // 泰國品項欄位
    pub price_total: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub price_per_unit_with_shipping: Option<Decimal>,

    // 估值（唯讀）
    pub total_cost: Decimal,
    pub final_price: Option<Decimal>,
}

impl From<&StockItem> for StockItemDto {
    fn from(item: &StockItem) -> Self {
        let valuation = ValuationCalculator::valuate(item);
        let mut dto = StockItemDto {
            id: item.id(),
            lot_id: item.lot_id(),
            name: item.name().to_string(),
            stock_type: item.stock_type(),
            purchased_quantity: item.purchased_quantity(),
            quantity: item.quantity(),
            buffer_percentage: item.buffer_percentage(),
            unit_price_yuan: None,
            shipping_within_china_yuan: None,
            exchange_rate: None,
            shipping_china_to_thai_bath: None,
            total_yuan: None,
            price_total: None,
            shipping_cost: None,
            price_per_unit_with_shipping: None,
            total_cost: valuation.total_cost,
            final_price: valuation.final_price,
        };

        match item {
            StockItem::China(china) => {
                dto.unit_price_yuan = Some(china.unit_price_yuan);
                dto.shipping_within_china_yuan = Some(china.shipping_within_china_yuan);
                dto.exchange_rate = Some(china.exchange_rate);
                dto.shipping_china_to_thai_bath = Some(china.shipping_china_to_thai_bath);
                dto.total_yuan = Some(ValuationCalculator::china_total_yuan(china));
            }
            StockItem::Thai(thai) => {
                dto.price_total = Some(thai.price_total);
                dto.shipping_cost = Some(thai.shipping_cost);
                dto.price_per_unit_with_shipping =
                    ValuationCalculator::thai_price_per_unit_with_shipping(thai);
            }
        }

        dto
    }
}

impl TryFrom<StockItemDto> for StockItem {
    type Error = CostingError;

    /// 只讀取原始進貨欄位，估值欄位一律忽略並在下次估值時重新計算
    fn try_from(dto: StockItemDto) -> Result<Self, Self::Error> {
        let id = dto.id;
        let required = |value: Option<Decimal>, field: &str| {
            value.ok_or_else(|| CostingError::InvalidStockItem {
                id,
                reason: format!("缺少欄位 {}", field),
            })
        };

        let item = match dto.stock_type {
            StockType::China => StockItem::China(ChinaStockItem {
                id,
                lot_id: dto.lot_id,
                name: dto.name,
                unit_price_yuan: required(dto.unit_price_yuan, "unit_price_yuan")?,
                purchased_quantity: dto.purchased_quantity,
                quantity: dto.quantity,
                shipping_within_china_yuan: dto.shipping_within_china_yuan.unwrap_or_default(),
                exchange_rate: required(dto.exchange_rate, "exchange_rate")?,
                shipping_china_to_thai_bath: dto.shipping_china_to_thai_bath.unwrap_or_default(),
                buffer_percentage: dto.buffer_percentage,
            }),
            StockType::Thai => StockItem::Thai(ThaiStockItem {
                id,
                lot_id: dto.lot_id,
                name: dto.name,
                price_total: required(dto.price_total, "price_total")?,
                purchased_quantity: dto.purchased_quantity,
                quantity: dto.quantity,
                shipping_cost: dto.shipping_cost.unwrap_or_default(),
                buffer_percentage: dto.buffer_percentage,
            }),
        };

        item.validate()?;
        Ok(item)
    }
}
