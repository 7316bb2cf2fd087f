//! 記憶體內資料存取實作

use chrono::{DateTime, NaiveDate, Utc};
use lotcost_core::{
    CostingError, DailyUsage, OrderItem, Result, StockForecast, StockItem, StockLot,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

use crate::ports::{
    ForecastStore, OrderSnapshotSink, StockItemSource, StockLedger, UsageHistorySource,
};

fn poisoned<T>(_: PoisonError<T>) -> CostingError {
    CostingError::Repository("鎖已中毒".to_string())
}

/// 記憶體內資料存取
///
/// 每個庫存品項各自持有一把 `Mutex`，扣減時只鎖定該品項。
#[derive(Default)]
pub struct InMemoryStore {
    stock: RwLock<HashMap<Uuid, Arc<Mutex<StockItem>>>>,
    usage: RwLock<HashMap<Uuid, Vec<DailyUsage>>>,
    forecasts: RwLock<HashMap<Uuid, StockForecast>>,
    order_items: RwLock<HashMap<Uuid, Vec<OrderItem>>>,
}

impl InMemoryStore {
    /// 創建空的資料存取
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增或覆蓋庫存品項（先檢查資料合法性）
    pub fn insert_stock_item(&self, item: StockItem) -> Result<()> {
        item.validate()?;
        self.stock
            .write()
            .map_err(poisoned)?
            .insert(item.id(), Arc::new(Mutex::new(item)));
        Ok(())
    }

    /// 匯入整個批次
    pub fn insert_lot(&self, lot: &StockLot) -> Result<()> {
        for item in &lot.items {
            self.insert_stock_item(item.clone())?;
        }
        Ok(())
    }

    /// 刪除庫存品項
    pub fn remove_stock_item(&self, id: Uuid) -> Result<Option<StockItem>> {
        let removed = self.stock.write().map_err(poisoned)?.remove(&id);
        match removed {
            Some(entry) => {
                let item = entry.lock().map_err(poisoned)?.clone();
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// 所有庫存品項ID
    pub fn stock_item_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.stock.read().map_err(poisoned)?.keys().copied().collect())
    }

    /// 記錄單日用量（同日累加）
    pub fn record_usage(&self, stock_item_id: Uuid, usage: DailyUsage) -> Result<()> {
        let mut all = self.usage.write().map_err(poisoned)?;
        let series = all.entry(stock_item_id).or_default();
        match series.iter_mut().find(|existing| existing.date == usage.date) {
            Some(existing) => existing.quantity += usage.quantity,
            None => series.push(usage),
        }
        Ok(())
    }

    /// 取得訂單明細快照
    pub fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        Ok(self
            .order_items
            .read()
            .map_err(poisoned)?
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    fn stock_entry(&self, id: Uuid) -> Result<Arc<Mutex<StockItem>>> {
        self.stock
            .read()
            .map_err(poisoned)?
            .get(&id)
            .cloned()
            .ok_or(CostingError::StockItemNotFound(id))
    }
}

impl StockItemSource for InMemoryStore {
    fn find_stock_item(&self, id: Uuid) -> Result<Option<StockItem>> {
        let entry = self.stock.read().map_err(poisoned)?.get(&id).cloned();
        match entry {
            Some(entry) => {
                let item = entry.lock().map_err(poisoned)?.clone();
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

impl UsageHistorySource for InMemoryStore {
    fn daily_usage(
        &self,
        stock_item_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyUsage>> {
        let all = self.usage.read().map_err(poisoned)?;
        let mut series: Vec<DailyUsage> = all
            .get(&stock_item_id)
            .map(|series| {
                series
                    .iter()
                    .filter(|usage| usage.is_within(from, to))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        series.sort_by_key(|usage| usage.date);
        Ok(series)
    }
}

impl ForecastStore for InMemoryStore {
    fn find_forecast(&self, stock_item_id: Uuid) -> Result<Option<StockForecast>> {
        Ok(self
            .forecasts
            .read()
            .map_err(poisoned)?
            .get(&stock_item_id)
            .cloned())
    }

    fn upsert_forecast(&self, forecast: StockForecast) -> Result<()> {
        self.forecasts
            .write()
            .map_err(poisoned)?
            .insert(forecast.stock_item_id, forecast);
        Ok(())
    }

    fn list_forecasts(&self) -> Result<Vec<StockForecast>> {
        let mut forecasts: Vec<StockForecast> =
            self.forecasts.read().map_err(poisoned)?.values().cloned().collect();
        forecasts.sort_by(|a, b| a.stock_item_name.cmp(&b.stock_item_name));
        Ok(forecasts)
    }

    fn delete_calculated_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut forecasts = self.forecasts.write().map_err(poisoned)?;
        let before = forecasts.len();
        forecasts.retain(|_, forecast| !forecast.is_stale(cutoff));
        Ok(before - forecasts.len())
    }
}

impl OrderSnapshotSink for InMemoryStore {
    fn save_order_items(&self, order_id: Uuid, items: &[OrderItem]) -> Result<()> {
        self.order_items
            .write()
            .map_err(poisoned)?
            .insert(order_id, items.to_vec());
        Ok(())
    }
}

impl StockLedger for InMemoryStore {
    fn deduct(&self, stock_item_id: Uuid, quantity: Decimal) -> Result<Decimal> {
        let entry = self.stock_entry(stock_item_id)?;
        let mut item = entry.lock().map_err(poisoned)?;
        item.deduct(quantity)
    }

    fn restock(&self, stock_item_id: Uuid, quantity: Decimal) -> Result<Decimal> {
        let entry = self.stock_entry(stock_item_id)?;
        let mut item = entry.lock().map_err(poisoned)?;
        item.restock(quantity)
    }
}
