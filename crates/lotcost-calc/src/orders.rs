//! 訂單建立與庫存扣減

use chrono::NaiveDate;
use lotcost_core::{CostingError, Order, OrderItem, OrderStatus, Product};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ports::{OrderSnapshotSink, StockItemSource, StockLedger};
use crate::product_cost::ProductCostCalculator;

/// 單一庫存品項的扣減量
#[derive(Debug, Clone, PartialEq)]
pub struct StockDeduction {
    pub stock_item_id: Uuid,
    pub quantity: Decimal,
}

/// 待執行的訂單：明細快照 + 扣減清單
#[derive(Debug, Clone)]
pub struct OrderPlan {
    pub order: Order,
    pub deductions: Vec<StockDeduction>,
}

impl OrderPlan {
    /// 扣減庫存並保存明細快照
    ///
    /// 任一品項扣減失敗或明細保存失敗時，已扣減的品項會補回，訂單維持待確認。
    pub fn confirm<L, K>(&mut self, ledger: &L, sink: &K) -> lotcost_core::Result<()>
    where
        L: StockLedger + ?Sized,
        K: OrderSnapshotSink + ?Sized,
    {
        if !self.order.is_pending() {
            return Err(CostingError::Other(format!(
                "訂單 {} 不是待確認狀態",
                self.order.order_number
            )));
        }

        let mut applied: Vec<&StockDeduction> = Vec::new();
        for deduction in &self.deductions {
            if let Err(e) = ledger.deduct(deduction.stock_item_id, deduction.quantity) {
                tracing::warn!(
                    "訂單 {} 扣減品項 {} 失敗，回滾 {} 筆: {}",
                    self.order.order_number,
                    deduction.stock_item_id,
                    applied.len(),
                    e
                );
                roll_back(ledger, &applied, &self.order.order_number);
                return Err(e);
            }
            applied.push(deduction);
        }

        if let Err(e) = sink.save_order_items(self.order.id, &self.order.items) {
            tracing::warn!(
                "訂單 {} 保存明細失敗，回滾 {} 筆: {}",
                self.order.order_number,
                applied.len(),
                e
            );
            roll_back(ledger, &applied, &self.order.order_number);
            return Err(e);
        }

        self.order.status = OrderStatus::Confirmed;

        tracing::info!(
            "訂單 {} 已確認：明細 {} 筆，扣減 {} 筆",
            self.order.order_number,
            self.order.items.len(),
            self.deductions.len()
        );
        Ok(())
    }
}

/// 依相反順序補回已扣減的品項；單筆補回失敗只記錄，其餘照常補回
fn roll_back<L>(ledger: &L, applied: &[&StockDeduction], order_number: &str)
where
    L: StockLedger + ?Sized,
{
    for done in applied.iter().rev() {
        if let Err(e) = ledger.restock(done.stock_item_id, done.quantity) {
            tracing::error!(
                "訂單 {} 回滾品項 {}（數量 {}）失敗: {}",
                order_number,
                done.stock_item_id,
                done.quantity,
                e
            );
        }
    }
}

/// 訂單建構器
pub struct OrderBuilder {
    order: Order,
    deductions: Vec<StockDeduction>,
}

impl OrderBuilder {
    /// 創建新的訂單建構器
    pub fn new(order_number: String, order_date: NaiveDate) -> Self {
        Self {
            order: Order::new(order_number, order_date),
            deductions: Vec::new(),
        }
    }

    /// 加入產品，以目前成本建立快照，回傳加入的明細
    ///
    /// `unit_price` 為 None 時使用產品售價；產品有未計價原料時拒絕建立。
    pub fn add_product<S>(
        &mut self,
        product: &Product,
        quantity: Decimal,
        unit_price: Option<Decimal>,
        stock: &S,
    ) -> lotcost_core::Result<OrderItem>
    where
        S: StockItemSource + ?Sized,
    {
        if quantity <= Decimal::ZERO {
            return Err(CostingError::InvalidProduct {
                id: product.id,
                reason: format!("訂購數量必須大於 0: {}", quantity),
            });
        }

        let report = ProductCostCalculator::calculate(product, stock)?;
        if !report.is_complete() {
            return Err(CostingError::CalculationError(format!(
                "產品 {} 有 {} 項原料無法計價",
                product.name,
                report.flagged_ingredients().count()
            )));
        }

        for deduction in deduction_plan(product, quantity) {
            merge_deduction(&mut self.deductions, deduction);
        }

        let item = OrderItem::new(
            product.id,
            product.name.clone(),
            quantity,
            unit_price.unwrap_or(product.selling_price),
            report.total_material_cost,
        );
        self.order.add_item(item.clone());
        Ok(item)
    }

    /// 完成建構
    pub fn build(self) -> OrderPlan {
        OrderPlan {
            order: self.order,
            deductions: self.deductions,
        }
    }
}

/// 計算產品訂購量對應的庫存扣減（同一品項合併，保持首次出現順序）
pub fn deduction_plan(product: &Product, quantity: Decimal) -> Vec<StockDeduction> {
    let mut deductions = Vec::new();
    for ingredient in &product.ingredients {
        merge_deduction(
            &mut deductions,
            StockDeduction {
                stock_item_id: ingredient.stock_item_id,
                quantity: ingredient.required_quantity * quantity,
            },
        );
    }
    deductions
}

fn merge_deduction(deductions: &mut Vec<StockDeduction>, deduction: StockDeduction) {
    match deductions
        .iter_mut()
        .find(|existing| existing.stock_item_id == deduction.stock_item_id)
    {
        Some(existing) => existing.quantity += deduction.quantity,
        None => deductions.push(deduction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::valuation::ValuationCalculator;
    use lotcost_core::{ProductIngredient, StockItem, ThaiStockItem};
    use rust_decimal_macros::dec;

    /// 明細保存一律失敗
    struct RejectingSink;

    impl OrderSnapshotSink for RejectingSink {
        fn save_order_items(&self, _: Uuid, _: &[OrderItem]) -> lotcost_core::Result<()> {
            Err(CostingError::Repository("明細寫入失敗".to_string()))
        }
    }

    /// 指定品項無法補回的帳本
    struct BrokenRestock<'a> {
        store: &'a InMemoryStore,
        broken: Uuid,
    }

    impl StockLedger for BrokenRestock<'_> {
        fn deduct(&self, stock_item_id: Uuid, quantity: Decimal) -> lotcost_core::Result<Decimal> {
            self.store.deduct(stock_item_id, quantity)
        }

        fn restock(&self, stock_item_id: Uuid, quantity: Decimal) -> lotcost_core::Result<Decimal> {
            if stock_item_id == self.broken {
                return Err(CostingError::Repository("補回失敗".to_string()));
            }
            self.store.restock(stock_item_id, quantity)
        }
    }

    fn setup() -> (InMemoryStore, StockItem, StockItem) {
        let store = InMemoryStore::new();
        // 每米 40、每條 5
        let leather: StockItem =
            ThaiStockItem::new("LEATHER".to_string(), dec!(4000), dec!(100)).into();
        let lace: StockItem = ThaiStockItem::new("LACE".to_string(), dec!(50), dec!(10)).into();
        store.insert_stock_item(leather.clone()).unwrap();
        store.insert_stock_item(lace.clone()).unwrap();
        (store, leather, lace)
    }

    fn sneaker(leather: &StockItem, lace: &StockItem) -> Product {
        Product::new("Sneaker".to_string(), dec!(150))
            .with_ingredient(ProductIngredient::new(leather.id(), dec!(2), "m".to_string()))
            .with_ingredient(ProductIngredient::new(lace.id(), dec!(2), "pcs".to_string()))
    }

    fn on_hand(store: &InMemoryStore, item: &StockItem) -> Decimal {
        store.find_stock_item(item.id()).unwrap().unwrap().quantity()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    #[test]
    fn test_deduction_plan_merges_same_stock_item() {
        let shared = Uuid::new_v4();
        let product = Product::new("Double".to_string(), dec!(10))
            .with_ingredient(ProductIngredient::new(shared, dec!(1), "pcs".to_string()))
            .with_ingredient(ProductIngredient::new(Uuid::new_v4(), dec!(3), "pcs".to_string()))
            .with_ingredient(ProductIngredient::new(shared, dec!(0.5), "pcs".to_string()));

        let plan = deduction_plan(&product, dec!(4));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].stock_item_id, shared);
        assert_eq!(plan[0].quantity, dec!(6));
        assert_eq!(plan[1].quantity, dec!(12));
    }

    #[test]
    fn test_snapshot_and_confirm() {
        let (store, leather, lace) = setup();
        let product = sneaker(&leather, &lace);

        let mut builder = OrderBuilder::new("SO-0001".to_string(), date());
        let item = builder.add_product(&product, dec!(3), None, &store).unwrap();
        assert_eq!(item.unit_cost, dec!(90));
        assert_eq!(item.total_price, dec!(450));
        assert_eq!(item.profit, dec!(180));

        let mut plan = builder.build();
        plan.confirm(&store, &store).unwrap();

        assert_eq!(plan.order.status, OrderStatus::Confirmed);
        assert_eq!(on_hand(&store, &leather), dec!(94));
        assert_eq!(on_hand(&store, &lace), dec!(4));
        assert_eq!(store.order_items(plan.order.id).unwrap(), plan.order.items);
    }

    #[test]
    fn test_unit_cost_unchanged_after_confirm() {
        let store = InMemoryStore::new();
        let boxes: StockItem = ThaiStockItem::new("BOX".to_string(), dec!(1000), dec!(100)).into();
        store.insert_stock_item(boxes.clone()).unwrap();
        let product = Product::new("Boxed".to_string(), dec!(20))
            .with_ingredient(ProductIngredient::new(boxes.id(), dec!(1), "pcs".to_string()));

        let mut builder = OrderBuilder::new("SO-0010".to_string(), date());
        builder.add_product(&product, dec!(90), None, &store).unwrap();
        builder.build().confirm(&store, &store).unwrap();

        let remaining = store.find_stock_item(boxes.id()).unwrap().unwrap();
        assert_eq!(remaining.quantity(), dec!(10));
        assert_eq!(ValuationCalculator::final_price(&remaining), Some(dec!(10)));

        let mut next = OrderBuilder::new("SO-0011".to_string(), date());
        let item = next.add_product(&product, dec!(10), None, &store).unwrap();
        assert_eq!(item.unit_cost, dec!(10));
        next.build().confirm(&store, &store).unwrap();

        // 售完後仍可計價
        let sold_out = store.find_stock_item(boxes.id()).unwrap().unwrap();
        assert_eq!(sold_out.quantity(), Decimal::ZERO);
        assert_eq!(ValuationCalculator::final_price(&sold_out), Some(dec!(10)));
    }

    #[test]
    fn test_snapshot_is_immune_to_later_cost_changes() {
        let (store, leather, lace) = setup();
        let product = sneaker(&leather, &lace);

        let mut builder = OrderBuilder::new("SO-0002".to_string(), date());
        builder.add_product(&product, dec!(1), Some(dec!(120)), &store).unwrap();
        let mut plan = builder.build();
        plan.confirm(&store, &store).unwrap();

        // 皮革重新進貨，單價上漲
        let repriced: StockItem = ThaiStockItem {
            id: leather.id(),
            ..ThaiStockItem::new("LEATHER".to_string(), dec!(9000), dec!(100))
        }
        .into();
        store.insert_stock_item(repriced).unwrap();

        let saved = store.order_items(plan.order.id).unwrap();
        assert_eq!(saved[0].unit_cost, dec!(90));
        assert_eq!(saved[0].profit, dec!(30));
    }

    #[test]
    fn test_confirm_rolls_back_on_insufficient_stock() {
        let (store, leather, lace) = setup();
        let product = sneaker(&leather, &lace);

        // 鞋帶只有 10 條，訂 6 雙需要 12 條
        let mut builder = OrderBuilder::new("SO-0003".to_string(), date());
        builder.add_product(&product, dec!(6), None, &store).unwrap();
        let mut plan = builder.build();

        let result = plan.confirm(&store, &store);
        assert!(matches!(result, Err(CostingError::InsufficientStock { .. })));
        assert!(plan.order.is_pending());
        assert_eq!(on_hand(&store, &leather), dec!(100));
        assert_eq!(on_hand(&store, &lace), dec!(10));
        assert!(store.order_items(plan.order.id).unwrap().is_empty());
    }

    #[test]
    fn test_confirm_rolls_back_when_snapshot_save_fails() {
        let (store, leather, lace) = setup();
        let product = sneaker(&leather, &lace);

        let mut builder = OrderBuilder::new("SO-0006".to_string(), date());
        builder.add_product(&product, dec!(3), None, &store).unwrap();
        let mut plan = builder.build();

        let result = plan.confirm(&store, &RejectingSink);
        assert!(matches!(result, Err(CostingError::Repository(_))));
        assert!(plan.order.is_pending());
        assert_eq!(on_hand(&store, &leather), dec!(100));
        assert_eq!(on_hand(&store, &lace), dec!(10));

        // 重試只扣減一次
        plan.confirm(&store, &store).unwrap();
        assert_eq!(on_hand(&store, &leather), dec!(94));
        assert_eq!(on_hand(&store, &lace), dec!(4));
    }

    #[test]
    fn test_rollback_continues_past_failed_restock() {
        let (store, leather, lace) = setup();
        let sole: StockItem = ThaiStockItem::new("SOLE".to_string(), dec!(20), dec!(1)).into();
        store.insert_stock_item(sole.clone()).unwrap();
        let product = sneaker(&leather, &lace)
            .with_ingredient(ProductIngredient::new(sole.id(), dec!(2), "pcs".to_string()));

        let mut builder = OrderBuilder::new("SO-0007".to_string(), date());
        builder.add_product(&product, dec!(1), None, &store).unwrap();
        let mut plan = builder.build();

        // 鞋底不足；回滾時鞋帶補回失敗，皮革仍須補回
        let ledger = BrokenRestock {
            store: &store,
            broken: lace.id(),
        };
        let result = plan.confirm(&ledger, &store);

        assert!(matches!(result, Err(CostingError::InsufficientStock { .. })));
        assert!(plan.order.is_pending());
        assert_eq!(on_hand(&store, &leather), dec!(100));
        assert_eq!(on_hand(&store, &lace), dec!(8));
        assert_eq!(on_hand(&store, &sole), dec!(1));
    }

    #[test]
    fn test_rejects_unpriced_product() {
        let (store, leather, _) = setup();
        let product = Product::new("Ghost".to_string(), dec!(10))
            .with_ingredient(ProductIngredient::new(leather.id(), dec!(1), "m".to_string()))
            .with_ingredient(ProductIngredient::new(Uuid::new_v4(), dec!(1), "pcs".to_string()));

        let mut builder = OrderBuilder::new("SO-0004".to_string(), date());
        assert!(matches!(
            builder.add_product(&product, dec!(1), None, &store),
            Err(CostingError::CalculationError(_))
        ));
        assert!(builder.build().deductions.is_empty());
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let (store, leather, lace) = setup();
        let mut builder = OrderBuilder::new("SO-0005".to_string(), date());
        assert!(builder
            .add_product(&sneaker(&leather, &lace), Decimal::ZERO, None, &store)
            .is_err());
    }
}
