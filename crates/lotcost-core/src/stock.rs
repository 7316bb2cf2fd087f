//! 庫存批次與庫存品項模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CostingError, Result};

/// 貨源類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockType {
    /// 中國進口（人民幣計價）
    China,
    /// 泰國本地採購（泰銖計價）
    Thai,
}

impl std::fmt::Display for StockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockType::China => write!(f, "CHINA"),
            StockType::Thai => write!(f, "THAI"),
        }
    }
}

/// 中國進口品項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChinaStockItem {
    /// 品項ID
    pub id: Uuid,

    /// 所屬批次
    pub lot_id: Option<Uuid>,

    /// 品名
    pub name: String,

    /// 單價（人民幣）
    pub unit_price_yuan: Decimal,

    /// 進貨數量（估值基準，扣減庫存不影響）
    pub purchased_quantity: Decimal,

    /// 現有庫存
    pub quantity: Decimal,

    /// 中國境內運費（人民幣）
    pub shipping_within_china_yuan: Decimal,

    /// 匯率（人民幣 → 泰銖）
    pub exchange_rate: Decimal,

    /// 中國到泰國運費（泰銖）
    pub shipping_china_to_thai_bath: Decimal,

    /// 緩衝百分比（None 表示不啟用）
    pub buffer_percentage: Option<Decimal>,
}

impl ChinaStockItem {
    /// 創建新的中國進口品項（現有庫存等於進貨數量）
    pub fn new(
        name: String,
        unit_price_yuan: Decimal,
        quantity: Decimal,
        exchange_rate: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_id: None,
            name,
            unit_price_yuan,
            purchased_quantity: quantity,
            quantity,
            shipping_within_china_yuan: Decimal::ZERO,
            exchange_rate,
            shipping_china_to_thai_bath: Decimal::ZERO,
            buffer_percentage: None,
        }
    }

    /// 建構器模式：設置中國境內運費
    pub fn with_shipping_within_china(mut self, yuan: Decimal) -> Self {
        self.shipping_within_china_yuan = yuan;
        self
    }

    /// 建構器模式：設置中國到泰國運費
    pub fn with_shipping_to_thailand(mut self, bath: Decimal) -> Self {
        self.shipping_china_to_thai_bath = bath;
        self
    }

    /// 建構器模式：啟用緩衝百分比
    pub fn with_buffer_percentage(mut self, percentage: Decimal) -> Self {
        self.buffer_percentage = Some(percentage);
        self
    }

    /// 建構器模式：設置所屬批次
    pub fn with_lot_id(mut self, lot_id: Uuid) -> Self {
        self.lot_id = Some(lot_id);
        self
    }

    /// 建構器模式：設置現有庫存（載入已部分售出的品項）
    pub fn with_on_hand(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }
}

/// 泰國本地品項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThaiStockItem {
    /// 品項ID
    pub id: Uuid,

    /// 所屬批次
    pub lot_id: Option<Uuid>,

    /// 品名
    pub name: String,

    /// 整批進貨總價（泰銖）
    pub price_total: Decimal,

    /// 進貨數量（估值基準，扣減庫存不影響）
    pub purchased_quantity: Decimal,

    /// 現有庫存
    pub quantity: Decimal,

    /// 運費（泰銖）
    pub shipping_cost: Decimal,

    /// 緩衝百分比（None 表示不啟用）
    pub buffer_percentage: Option<Decimal>,
}

impl ThaiStockItem {
    /// 創建新的泰國本地品項（現有庫存等於進貨數量）
    pub fn new(name: String, price_total: Decimal, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_id: None,
            name,
            price_total,
            purchased_quantity: quantity,
            quantity,
            shipping_cost: Decimal::ZERO,
            buffer_percentage: None,
        }
    }

    /// 建構器模式：設置運費
    pub fn with_shipping_cost(mut self, cost: Decimal) -> Self {
        self.shipping_cost = cost;
        self
    }

    /// 建構器模式：啟用緩衝百分比
    pub fn with_buffer_percentage(mut self, percentage: Decimal) -> Self {
        self.buffer_percentage = Some(percentage);
        self
    }

    /// 建構器模式：設置所屬批次
    pub fn with_lot_id(mut self, lot_id: Uuid) -> Self {
        self.lot_id = Some(lot_id);
        self
    }

    /// 建構器模式：設置現有庫存（載入已部分售出的品項）
    pub fn with_on_hand(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }
}

/// 庫存品項（依貨源區分）
///
/// 貨源在載入資料時決定一次，之後所有估值都透過 `match` 分派。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stock_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockItem {
    China(ChinaStockItem),
    Thai(ThaiStockItem),
}

impl StockItem {
    pub fn id(&self) -> Uuid {
        match self {
            StockItem::China(item) => item.id,
            StockItem::Thai(item) => item.id,
        }
    }

    pub fn lot_id(&self) -> Option<Uuid> {
        match self {
            StockItem::China(item) => item.lot_id,
            StockItem::Thai(item) => item.lot_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StockItem::China(item) => &item.name,
            StockItem::Thai(item) => &item.name,
        }
    }

    /// 現有庫存
    pub fn quantity(&self) -> Decimal {
        match self {
            StockItem::China(item) => item.quantity,
            StockItem::Thai(item) => item.quantity,
        }
    }

    /// 進貨數量
    pub fn purchased_quantity(&self) -> Decimal {
        match self {
            StockItem::China(item) => item.purchased_quantity,
            StockItem::Thai(item) => item.purchased_quantity,
        }
    }

    pub fn buffer_percentage(&self) -> Option<Decimal> {
        match self {
            StockItem::China(item) => item.buffer_percentage,
            StockItem::Thai(item) => item.buffer_percentage,
        }
    }

    pub fn stock_type(&self) -> StockType {
        match self {
            StockItem::China(_) => StockType::China,
            StockItem::Thai(_) => StockType::Thai,
        }
    }

    fn quantity_mut(&mut self) -> &mut Decimal {
        match self {
            StockItem::China(item) => &mut item.quantity,
            StockItem::Thai(item) => &mut item.quantity,
        }
    }

    /// 檢查品項資料是否合法
    ///
    /// 數量、價格、運費與匯率不得為負；緩衝百分比必須介於 0 到 100。
    pub fn validate(&self) -> Result<()> {
        let id = self.id();
        let mut fields = vec![
            ("quantity", self.quantity()),
            ("purchased_quantity", self.purchased_quantity()),
        ];
        match self {
            StockItem::China(item) => {
                fields.push(("unit_price_yuan", item.unit_price_yuan));
                fields.push(("shipping_within_china_yuan", item.shipping_within_china_yuan));
                fields.push(("exchange_rate", item.exchange_rate));
                fields.push(("shipping_china_to_thai_bath", item.shipping_china_to_thai_bath));
            }
            StockItem::Thai(item) => {
                fields.push(("price_total", item.price_total));
                fields.push(("shipping_cost", item.shipping_cost));
            }
        }

        for (field, value) in fields {
            if value < Decimal::ZERO {
                return Err(CostingError::InvalidStockItem {
                    id,
                    reason: format!("{} 不可為負數: {}", field, value),
                });
            }
        }

        if let Some(buffer) = self.buffer_percentage() {
            if buffer < Decimal::ZERO || buffer > Decimal::ONE_HUNDRED {
                return Err(CostingError::InvalidStockItem {
                    id,
                    reason: format!("緩衝百分比必須介於 0 到 100: {}", buffer),
                });
            }
        }

        Ok(())
    }

    /// 扣減庫存，回傳剩餘數量
    pub fn deduct(&mut self, quantity: Decimal) -> Result<Decimal> {
        ensure_non_negative("扣減", quantity)?;
        let id = self.id();
        let available = self.quantity();
        if quantity > available {
            return Err(CostingError::InsufficientStock {
                stock_item_id: id,
                requested: quantity,
                available,
            });
        }
        let remaining = available - quantity;
        *self.quantity_mut() = remaining;
        Ok(remaining)
    }

    /// 補回庫存（例如取消訂單），回傳補回後數量
    pub fn restock(&mut self, quantity: Decimal) -> Result<Decimal> {
        ensure_non_negative("補回", quantity)?;
        let restocked = self.quantity() + quantity;
        *self.quantity_mut() = restocked;
        Ok(restocked)
    }
}

fn ensure_non_negative(action: &str, quantity: Decimal) -> Result<()> {
    if quantity < Decimal::ZERO {
        return Err(CostingError::CalculationError(format!(
            "{}數量不可為負數: {}",
            action, quantity
        )));
    }
    Ok(())
}

impl From<ChinaStockItem> for StockItem {
    fn from(item: ChinaStockItem) -> Self {
        StockItem::China(item)
    }
}

impl From<ThaiStockItem> for StockItem {
    fn from(item: ThaiStockItem) -> Self {
        StockItem::Thai(item)
    }
}

/// 庫存批次（同一批進口的品項）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLot {
    /// 批次ID
    pub id: Uuid,

    /// 批號
    pub lot_number: String,

    /// 進口日期
    pub import_date: NaiveDate,

    /// 到貨日期
    pub arrival_date: Option<NaiveDate>,

    /// 批次內品項（批次刪除時一併刪除）
    pub items: Vec<StockItem>,
}

impl StockLot {
    /// 創建新的庫存批次
    pub fn new(lot_number: String, import_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_number,
            import_date,
            arrival_date: None,
            items: Vec::new(),
        }
    }

    /// 建構器模式：設置到貨日期
    pub fn with_arrival_date(mut self, date: NaiveDate) -> Self {
        self.arrival_date = Some(date);
        self
    }

    /// 加入品項，並把品項掛到此批次
    pub fn add_item(&mut self, mut item: StockItem) {
        match &mut item {
            StockItem::China(china) => china.lot_id = Some(self.id),
            StockItem::Thai(thai) => thai.lot_id = Some(self.id),
        }
        self.items.push(item);
    }

    /// 移除品項
    pub fn remove_item(&mut self, item_id: Uuid) -> Option<StockItem> {
        let index = self.items.iter().position(|item| item.id() == item_id)?;
        Some(self.items.remove(index))
    }

    /// 品項筆數
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// 所有品項的數量合計
    pub fn total_quantity(&self) -> Decimal {
        self.items.iter().map(StockItem::quantity).sum()
    }

    /// 檢查是否已到貨
    pub fn has_arrived(&self) -> bool {
        self.arrival_date.is_some()
    }

    /// 運輸天數
    pub fn transit_days(&self) -> Option<i64> {
        self.arrival_date
            .map(|arrival| (arrival - self.import_date).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_china_item() {
        let item = ChinaStockItem::new("SHOE-001".to_string(), dec!(45), dec!(100), dec!(5.2))
            .with_shipping_within_china(dec!(120))
            .with_shipping_to_thailand(dec!(800))
            .with_buffer_percentage(dec!(5));

        let item = StockItem::from(item);
        assert_eq!(item.name(), "SHOE-001");
        assert_eq!(item.quantity(), dec!(100));
        assert_eq!(item.stock_type(), StockType::China);
        assert_eq!(item.buffer_percentage(), Some(dec!(5)));
        assert!(item.validate().is_ok());
    }

    #[rstest]
    #[case::buffer_above_hundred(Some(dec!(120)), true)]
    #[case::negative_buffer(Some(dec!(-1)), true)]
    #[case::full_buffer(Some(dec!(100)), false)]
    #[case::no_buffer(None, false)]
    fn test_validate_buffer(#[case] buffer: Option<Decimal>, #[case] rejected: bool) {
        let mut item = ThaiStockItem::new("BOX-001".to_string(), dec!(500), dec!(10));
        item.buffer_percentage = buffer;
        let result = StockItem::from(item).validate();
        assert_eq!(
            matches!(result, Err(CostingError::InvalidStockItem { .. })),
            rejected
        );
    }

    #[rstest]
    #[case::negative_on_hand(dec!(10), dec!(-3))]
    #[case::negative_purchase(dec!(-3), dec!(0))]
    fn test_validate_rejects_negative_quantity(
        #[case] purchased: Decimal,
        #[case] on_hand: Decimal,
    ) {
        let item: StockItem =
            ChinaStockItem::new("SHOE-002".to_string(), dec!(45), purchased, dec!(5.2))
                .with_on_hand(on_hand)
                .into();
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_deduct_and_restock() {
        let mut item: StockItem =
            ThaiStockItem::new("LACE-001".to_string(), dec!(200), dec!(50)).into();

        assert_eq!(item.deduct(dec!(20)).unwrap(), dec!(30));
        assert!(matches!(
            item.deduct(dec!(31)),
            Err(CostingError::InsufficientStock { .. })
        ));
        assert_eq!(item.quantity(), dec!(30));

        assert_eq!(item.restock(dec!(5)).unwrap(), dec!(35));
        assert_eq!(item.quantity(), dec!(35));
        // 進貨數量不隨庫存變動
        assert_eq!(item.purchased_quantity(), dec!(50));
    }

    #[test]
    fn test_negative_movements_rejected() {
        let mut item: StockItem =
            ThaiStockItem::new("LACE-002".to_string(), dec!(200), dec!(5)).into();

        assert!(matches!(
            item.restock(dec!(-6)),
            Err(CostingError::CalculationError(_))
        ));
        assert!(item.deduct(dec!(-1)).is_err());
        assert_eq!(item.quantity(), dec!(5));
    }

    #[test]
    fn test_lot_owns_items() {
        let mut lot = StockLot::new(
            "LOT-2025-01".to_string(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        )
        .with_arrival_date(NaiveDate::from_ymd_opt(2025, 1, 24).unwrap());

        let china: StockItem =
            ChinaStockItem::new("SHOE-003".to_string(), dec!(40), dec!(60), dec!(5)).into();
        let thai: StockItem =
            ThaiStockItem::new("BOX-003".to_string(), dec!(300), dec!(40)).into();
        let thai_id = thai.id();

        lot.add_item(china);
        lot.add_item(thai);

        assert_eq!(lot.item_count(), 2);
        assert_eq!(lot.total_quantity(), dec!(100));
        assert!(lot.items.iter().all(|item| item.lot_id() == Some(lot.id)));
        assert_eq!(lot.transit_days(), Some(14));

        let removed = lot.remove_item(thai_id).unwrap();
        assert_eq!(removed.id(), thai_id);
        assert_eq!(lot.item_count(), 1);
    }

    #[test]
    fn test_serde_tag() {
        let item: StockItem =
            ThaiStockItem::new("BOX-004".to_string(), dec!(300), dec!(40)).into();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["stock_type"], "THAI");
    }
}
