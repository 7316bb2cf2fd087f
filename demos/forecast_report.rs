//! 批次成本與庫存預測示例

use chrono::{Duration, NaiveDate, Utc};
use lotcost::calc::{round_money, ForecastStore};
use lotcost::model::{
    ChinaStockItem, DailyUsage, ForecastConfig, Product, ProductIngredient, StockItem, StockLot,
    ThaiStockItem,
};
use lotcost::{
    ForecastRefresher, InMemoryStore, OrderBuilder, ProductCostCalculator, ValuationCalculator,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== 批次成本與庫存預測示例 ===\n");

    // 建立批次
    let shoe: StockItem = ChinaStockItem::new(
        "SHOE-RUNNER".to_string(),
        Decimal::from(30),
        Decimal::from(200),
        Decimal::from(5),
    )
    .with_shipping_within_china(Decimal::from(200))
    .with_shipping_to_thailand(Decimal::from(1000))
    .with_buffer_percentage(Decimal::from(5))
    .into();
    let boxes: StockItem =
        ThaiStockItem::new("BOX-STD".to_string(), Decimal::from(1000), Decimal::from(100))
            .with_shipping_cost(Decimal::from(100))
            .into();

    let today = Utc::now().date_naive();
    let import_date = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap_or(today);
    let mut lot = StockLot::new("LOT-2025-08".to_string(), import_date).with_arrival_date(today);
    lot.add_item(shoe);
    lot.add_item(boxes);

    let summary = ValuationCalculator::summarize_lot(&lot);
    println!(
        "批次 {}：{} 項，總值 {}",
        summary.lot_number,
        summary.item_count,
        round_money(summary.grand_total_value)
    );
    for valuation in &summary.valuations {
        println!(
            "  - {} [{}] 總成本 {}，單價 {}",
            valuation.stock_item_id,
            valuation.stock_type,
            round_money(valuation.total_cost),
            valuation.final_price.map(round_money).map_or("-".to_string(), |p| p.to_string())
        );
    }

    let store = InMemoryStore::new();
    store.insert_lot(&lot)?;
    let shoe_id = lot.items[0].id();
    let box_id = lot.items[1].id();

    // 產品成本
    let product = Product::new("Runner Box Set".to_string(), Decimal::from(250))
        .with_ingredient(ProductIngredient::new(shoe_id, Decimal::ONE, "pair".to_string()))
        .with_ingredient(ProductIngredient::new(box_id, Decimal::ONE, "pcs".to_string()));
    let report = ProductCostCalculator::calculate(&product, &store)?;
    println!(
        "\n產品 {}：材料成本 {}，毛利 {}，毛利率 {}%",
        report.product_name,
        round_money(report.total_material_cost),
        round_money(report.gross_profit),
        report.profit_margin_percentage
    );
    for line in &report.ingredients {
        println!(
            "  - {} × {} {}：{}（{}%）",
            line.stock_item_name.as_deref().unwrap_or("?"),
            line.required_quantity,
            line.unit,
            round_money(line.total_cost),
            line.cost_percentage
        );
    }

    // 模擬過去 30 天的用量
    for offset in 0..30 {
        let date = today - Duration::days(offset);
        store.record_usage(shoe_id, DailyUsage::new(date, Decimal::from(6)))?;
        store.record_usage(box_id, DailyUsage::new(date, Decimal::from(1)))?;
    }

    // 下單並扣減庫存
    let mut builder = OrderBuilder::new("SO-DEMO-001".to_string(), today);
    builder.add_product(&product, Decimal::from(20), None, &store)?;
    let mut plan = builder.build();
    plan.confirm(&store, &store)?;
    println!(
        "\n訂單 {}：金額 {}，成本 {}，利潤 {}",
        plan.order.order_number,
        round_money(plan.order.total_amount()),
        round_money(plan.order.total_cost()),
        round_money(plan.order.total_profit())
    );

    // 預測重算
    let refresher = ForecastRefresher::new(ForecastConfig::default())?;
    let refresh = refresher.refresh(&store.stock_item_ids()?, &store, &store, &store, Utc::now());
    println!("\n預測重算：成功 {} 筆", refresh.refreshed.len());

    for forecast in store.list_forecasts()? {
        println!(
            "  - {}：庫存 {}，日用量 {}，可用 {} 天，{}",
            forecast.stock_item_name,
            forecast.current_stock,
            forecast.average_daily_usage.round_dp(2),
            forecast
                .days_until_stock_out
                .days()
                .map_or("∞".to_string(), |d| d.to_string()),
            forecast.urgency_level
        );
    }

    let recommendation = ForecastRefresher::recommend(&store)?;
    println!(
        "\n採購建議：{} 項，預估金額 {}，優先級 {}",
        recommendation.total_items_to_order,
        round_money(recommendation.total_order_cost),
        recommendation.priority_level
    );

    Ok(())
}
