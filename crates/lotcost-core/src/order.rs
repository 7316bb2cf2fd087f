//! 訂單模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 訂單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 待確認
    Pending,
    /// 已確認（已扣庫存）
    Confirmed,
    /// 已出貨
    Fulfilled,
    /// 已取消
    Cancelled,
}

/// 訂單明細
///
/// 建立時即保存售價與成本快照，之後成本變動不影響歷史毛利。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// 明細ID
    pub id: Uuid,

    /// 產品ID
    pub product_id: Uuid,

    /// 產品名稱
    pub product_name: String,

    /// 數量
    pub quantity: Decimal,

    /// 單位售價（快照）
    pub unit_price: Decimal,

    /// 單位成本（快照）
    pub unit_cost: Decimal,

    /// 售價小計
    pub total_price: Decimal,

    /// 成本小計
    pub total_cost: Decimal,

    /// 毛利
    pub profit: Decimal,
}

impl OrderItem {
    /// 依售價與成本快照創建明細
    pub fn new(
        product_id: Uuid,
        product_name: String,
        quantity: Decimal,
        unit_price: Decimal,
        unit_cost: Decimal,
    ) -> Self {
        let total_price = quantity * unit_price;
        let total_cost = quantity * unit_cost;
        Self {
            id: Uuid::new_v4(),
            product_id,
            product_name,
            quantity,
            unit_price,
            unit_cost,
            total_price,
            total_cost,
            profit: total_price - total_cost,
        }
    }
}

/// 訂單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 訂單ID
    pub id: Uuid,

    /// 訂單號
    pub order_number: String,

    /// 下單日期
    pub order_date: NaiveDate,

    /// 狀態
    pub status: OrderStatus,

    /// 訂單明細
    pub items: Vec<OrderItem>,
}

impl Order {
    /// 創建新的訂單
    pub fn new(order_number: String, order_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number,
            order_date,
            status: OrderStatus::Pending,
            items: Vec::new(),
        }
    }

    /// 添加明細
    pub fn add_item(&mut self, item: OrderItem) {
        self.items.push(item);
    }

    /// 訂單總金額
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// 訂單總成本
    pub fn total_cost(&self) -> Decimal {
        self.items.iter().map(|item| item.total_cost).sum()
    }

    /// 訂單總毛利
    pub fn total_profit(&self) -> Decimal {
        self.items.iter().map(|item| item.profit).sum()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_item_snapshot() {
        let item = OrderItem::new(
            Uuid::new_v4(),
            "Sneaker".to_string(),
            dec!(3),
            dec!(890),
            dec!(412.5),
        );

        assert_eq!(item.total_price, dec!(2670));
        assert_eq!(item.total_cost, dec!(1237.5));
        assert_eq!(item.profit, dec!(1432.5));
    }

    #[test]
    fn test_order_totals() {
        let mut order = Order::new(
            "SO-0001".to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        order.add_item(OrderItem::new(
            Uuid::new_v4(),
            "A".to_string(),
            dec!(2),
            dec!(100),
            dec!(60),
        ));
        order.add_item(OrderItem::new(
            Uuid::new_v4(),
            "B".to_string(),
            dec!(1),
            dec!(50),
            dec!(70),
        ));

        assert!(order.is_pending());
        assert_eq!(order.total_amount(), dec!(250));
        assert_eq!(order.total_cost(), dec!(190));
        assert_eq!(order.total_profit(), dec!(60));
    }
}
