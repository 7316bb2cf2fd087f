//! 外部協作介面
//!
//! 持久層不在本引擎範圍內，計算時一律透過這些 trait 注入。

use chrono::{DateTime, NaiveDate, Utc};
use lotcost_core::{DailyUsage, OrderItem, Result, StockForecast, StockItem};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// 讀取庫存品項
pub trait StockItemSource {
    fn find_stock_item(&self, id: Uuid) -> Result<Option<StockItem>>;
}

/// 讀取歷史用量
pub trait UsageHistorySource {
    /// 取得 [from, to] 區間的每日用量
    fn daily_usage(
        &self,
        stock_item_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyUsage>>;
}

/// 預測記錄存取（以庫存品項ID為鍵）
pub trait ForecastStore {
    fn find_forecast(&self, stock_item_id: Uuid) -> Result<Option<StockForecast>>;

    /// 新增或覆蓋同一品項的預測
    fn upsert_forecast(&self, forecast: StockForecast) -> Result<()>;

    fn list_forecasts(&self) -> Result<Vec<StockForecast>>;

    /// 刪除最後計算時間早於 cutoff 的預測，回傳刪除筆數
    fn delete_calculated_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// 保存訂單明細快照
pub trait OrderSnapshotSink {
    fn save_order_items(&self, order_id: Uuid, items: &[OrderItem]) -> Result<()>;
}

/// 扣減庫存
///
/// 實作必須以單一庫存品項ID為範圍加鎖：同一品項的並行扣減請求，
/// 其「讀取 → 修改 → 寫回」必須嚴格序列化，不得超賣。
/// 不同品項之間可並行。
pub trait StockLedger {
    /// 扣減數量，回傳剩餘數量
    fn deduct(&self, stock_item_id: Uuid, quantity: Decimal) -> Result<Decimal>;

    /// 補回數量（取消或回滾），回傳補回後數量
    fn restock(&self, stock_item_id: Uuid, quantity: Decimal) -> Result<Decimal>;
}

impl StockItemSource for HashMap<Uuid, StockItem> {
    fn find_stock_item(&self, id: Uuid) -> Result<Option<StockItem>> {
        Ok(self.get(&id).cloned())
    }
}

impl StockItemSource for [StockItem] {
    fn find_stock_item(&self, id: Uuid) -> Result<Option<StockItem>> {
        Ok(self.iter().find(|item| item.id() == id).cloned())
    }
}

impl StockItemSource for lotcost_core::StockLot {
    fn find_stock_item(&self, id: Uuid) -> Result<Option<StockItem>> {
        self.items.as_slice().find_stock_item(id)
    }
}
