//! 產品成本彙總

use lotcost_core::{Product, ProductIngredient, StockType};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::StockItemSource;
use crate::valuation::ValuationCalculator;

/// 原料計價狀態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngredientStatus {
    /// 已計價
    Priced,
    /// 找不到引用的庫存品項
    MissingStockItem,
    /// 庫存品項進貨數量為 0，單位成本無法定義
    UndefinedUnitCost,
    /// 讀取庫存品項失敗
    LookupFailed(String),
}

/// 原料成本明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientCostLine {
    pub ingredient_id: Uuid,
    pub stock_item_id: Uuid,
    pub stock_item_name: Option<String>,
    pub stock_type: Option<StockType>,
    pub required_quantity: Decimal,
    pub unit: String,

    /// 單位成本（取自庫存品項的到岸單價）
    pub cost_per_unit: Option<Decimal>,

    /// 所需數量 × 單位成本；未計價時為 0
    pub total_cost: Decimal,

    /// 佔總材料成本百分比
    pub cost_percentage: Decimal,

    pub status: IngredientStatus,
}

impl IngredientCostLine {
    pub fn is_flagged(&self) -> bool {
        self.status != IngredientStatus::Priced
    }
}

/// 產品成本報表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCostReport {
    pub product_id: Uuid,
    pub product_name: String,
    pub selling_price: Decimal,
    pub total_material_cost: Decimal,

    /// 售價 − 材料成本（可為負）
    pub gross_profit: Decimal,

    /// 以材料成本為基準的毛利率
    pub profit_margin_percentage: Decimal,

    pub ingredients: Vec<IngredientCostLine>,
}

impl ProductCostReport {
    /// 所有原料皆已計價
    pub fn is_complete(&self) -> bool {
        self.ingredients.iter().all(|line| !line.is_flagged())
    }

    /// 未計價的原料
    pub fn flagged_ingredients(&self) -> impl Iterator<Item = &IngredientCostLine> {
        self.ingredients.iter().filter(|line| line.is_flagged())
    }

    /// 是否虧本銷售
    pub fn is_loss(&self) -> bool {
        self.gross_profit < Decimal::ZERO
    }
}

/// 產品成本計算器
pub struct ProductCostCalculator;

impl ProductCostCalculator {
    /// 計算單一產品的成本報表
    ///
    /// 找不到的庫存品項只會標記在對應原料上，不會中斷整份報表。
    pub fn calculate<S>(product: &Product, stock: &S) -> lotcost_core::Result<ProductCostReport>
    where
        S: StockItemSource + ?Sized,
    {
        product.validate()?;

        let mut lines: Vec<IngredientCostLine> = product
            .ingredients
            .iter()
            .map(|ingredient| Self::price_ingredient(ingredient, stock))
            .collect();

        let total_material_cost: Decimal = lines.iter().map(|line| line.total_cost).sum();
        for line in &mut lines {
            line.cost_percentage = Self::cost_percentage(line.total_cost, total_material_cost);
        }

        for line in lines.iter().filter(|line| line.is_flagged()) {
            tracing::warn!(
                "產品 {} 的原料 {} 未計價: {:?}",
                product.name,
                line.ingredient_id,
                line.status
            );
        }

        let gross_profit = product.selling_price - total_material_cost;

        Ok(ProductCostReport {
            product_id: product.id,
            product_name: product.name.clone(),
            selling_price: product.selling_price,
            total_material_cost,
            gross_profit,
            profit_margin_percentage: Self::profit_margin_percentage(
                product.selling_price,
                total_material_cost,
            ),
            ingredients: lines,
        })
    }

    /// 批量計算（並行），單一產品失敗不影響其他產品
    pub fn calculate_batch<S>(
        products: &[Product],
        stock: &S,
    ) -> Vec<lotcost_core::Result<ProductCostReport>>
    where
        S: StockItemSource + Sync + ?Sized,
    {
        tracing::info!("開始產品成本計算：產品 {} 筆", products.len());
        let start_time = std::time::Instant::now();

        let results: Vec<_> = products
            .par_iter()
            .map(|product| Self::calculate(product, stock))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            "產品成本計算完成，耗時 {:?}，失敗 {} 筆",
            start_time.elapsed(),
            failed
        );

        results
    }

    /// 毛利率
    ///
    /// - 材料成本 > 0：(毛利 / 材料成本) × 100，四捨五入到 4 位小數
    /// - 材料成本為 0 且售價 > 0：100
    /// - 其他：0
    pub fn profit_margin_percentage(
        selling_price: Decimal,
        total_material_cost: Decimal,
    ) -> Decimal {
        if total_material_cost > Decimal::ZERO {
            let gross_profit = selling_price - total_material_cost;
            crate::round_percentage(gross_profit / total_material_cost * Decimal::ONE_HUNDRED)
        } else if selling_price > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    /// 原料成本佔比
    pub fn cost_percentage(line_total: Decimal, total_material_cost: Decimal) -> Decimal {
        if total_material_cost > Decimal::ZERO {
            crate::round_percentage(line_total / total_material_cost * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        }
    }

    fn price_ingredient<S>(ingredient: &ProductIngredient, stock: &S) -> IngredientCostLine
    where
        S: StockItemSource + ?Sized,
    {
        let mut line = IngredientCostLine {
            ingredient_id: ingredient.id,
            stock_item_id: ingredient.stock_item_id,
            stock_item_name: None,
            stock_type: None,
            required_quantity: ingredient.required_quantity,
            unit: ingredient.unit.clone(),
            cost_per_unit: None,
            total_cost: Decimal::ZERO,
            cost_percentage: Decimal::ZERO,
            status: IngredientStatus::Priced,
        };

        match stock.find_stock_item(ingredient.stock_item_id) {
            Ok(Some(item)) => {
                line.stock_item_name = Some(item.name().to_string());
                line.stock_type = Some(item.stock_type());
                match ValuationCalculator::final_price(&item) {
                    Some(cost_per_unit) => {
                        line.cost_per_unit = Some(cost_per_unit);
                        line.total_cost = ingredient.required_quantity * cost_per_unit;
                    }
                    None => line.status = IngredientStatus::UndefinedUnitCost,
                }
            }
            Ok(None) => line.status = IngredientStatus::MissingStockItem,
            Err(e) => line.status = IngredientStatus::LookupFailed(e.to_string()),
        }

        line
    }
}
