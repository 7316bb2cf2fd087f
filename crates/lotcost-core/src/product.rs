//! 產品與原料組成模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CostingError, Result};

/// 產品原料（引用一個庫存品項，但不擁有它）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductIngredient {
    /// 原料ID
    pub id: Uuid,

    /// 引用的庫存品項
    pub stock_item_id: Uuid,

    /// 每單位產品所需數量
    pub required_quantity: Decimal,

    /// 單位（如 pcs、m、g）
    pub unit: String,
}

impl ProductIngredient {
    /// 創建新的產品原料
    pub fn new(stock_item_id: Uuid, required_quantity: Decimal, unit: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            stock_item_id,
            required_quantity,
            unit,
        }
    }
}

/// 產品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 產品ID
    pub id: Uuid,

    /// 品名
    pub name: String,

    /// 售價
    pub selling_price: Decimal,

    /// 原料清單
    pub ingredients: Vec<ProductIngredient>,
}

impl Product {
    /// 創建新的產品
    pub fn new(name: String, selling_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            selling_price,
            ingredients: Vec::new(),
        }
    }

    /// 建構器模式：加入原料
    pub fn with_ingredient(mut self, ingredient: ProductIngredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    /// 加入原料
    pub fn add_ingredient(&mut self, ingredient: ProductIngredient) {
        self.ingredients.push(ingredient);
    }

    /// 移除原料
    pub fn remove_ingredient(&mut self, ingredient_id: Uuid) -> Option<ProductIngredient> {
        let index = self
            .ingredients
            .iter()
            .position(|ingredient| ingredient.id == ingredient_id)?;
        Some(self.ingredients.remove(index))
    }

    /// 檢查是否使用指定庫存品項
    pub fn uses_stock_item(&self, stock_item_id: Uuid) -> bool {
        self.ingredients
            .iter()
            .any(|ingredient| ingredient.stock_item_id == stock_item_id)
    }

    /// 檢查產品資料是否合法
    pub fn validate(&self) -> Result<()> {
        if self.selling_price < Decimal::ZERO {
            return Err(CostingError::InvalidProduct {
                id: self.id,
                reason: format!("售價不可為負數: {}", self.selling_price),
            });
        }

        if let Some(ingredient) = self
            .ingredients
            .iter()
            .find(|ingredient| ingredient.required_quantity < Decimal::ZERO)
        {
            return Err(CostingError::InvalidProduct {
                id: self.id,
                reason: format!(
                    "原料 {} 所需數量不可為負數: {}",
                    ingredient.id, ingredient.required_quantity
                ),
            });
        }

        Ok(())
    }
}
