// Small dev utility: create a supply chain dataset with a handful of deterministic SKUs.
//
// Usage:
//   cargo run --bin seed_sample_dataset -- [db_path] [table_name]
//
// db_path defaults to the same location scm-recommender reads without --db.
// Existing rows in the table are replaced.

use anyhow::{bail, Context, Result};
use rusqlite::params;
use scm_recommender::config::{default_db_path, DEFAULT_TABLE_NAME};
use scm_recommender::db::{create_dataset_table, open_sqlite_connection};
use scm_recommender::repository::query::is_plain_identifier;
use std::path::Path;

// (SKU, 产品类型, 价格, 可售数, 销量, 收入, 库存, 提前期, 供应商, 运输方式)
const SAMPLE_ROWS: [(&str, &str, f64, i64, i64, f64, i64, i64, &str, &str); 12] = [
    ("SKU0", "haircare", 69.81, 55, 802, 8661.0, 58, 7, "Supplier 3", "Road"),
    ("SKU1", "skincare", 14.84, 95, 736, 7460.9, 53, 30, "Supplier 3", "Road"),
    ("SKU2", "haircare", 11.32, 34, 8, 9577.75, 1, 10, "Supplier 1", "Air"),
    ("SKU3", "skincare", 61.16, 68, 83, 7766.84, 23, 13, "Supplier 5", "Rail"),
    ("SKU4", "skincare", 4.81, 26, 871, 2686.51, 5, 3, "Supplier 1", "Air"),
    ("SKU5", "haircare", 1.7, 87, 147, 2828.35, 90, 27, "Supplier 4", "Road"),
    ("SKU6", "skincare", 4.08, 48, 65, 7823.48, 11, 15, "Supplier 3", "Sea"),
    ("SKU7", "cosmetics", 42.96, 59, 426, 8496.1, 93, 17, "Supplier 4", "Road"),
    ("SKU8", "cosmetics", 68.72, 78, 150, 7517.36, 5, 10, "Supplier 4", "Sea"),
    ("SKU9", "skincare", 64.02, 35, 980, 4971.15, 14, 27, "Supplier 2", "Rail"),
    // 库存为 0，评分时会被跳过
    ("SKU10", "skincare", 15.71, 11, 996, 2330.97, 0, 15, "Supplier 1", "Air"),
    // 无销量，评分时会被跳过
    ("SKU11", "skincare", 90.64, 95, 0, 6099.94, 46, 23, "Supplier 5", "Road"),
];

fn resolve_db_path(arg: Option<String>) -> String {
    arg.unwrap_or_else(default_db_path)
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let db_path = resolve_db_path(args.next());
    let table_name = args
        .next()
        .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());

    if !is_plain_identifier(&table_name) {
        bail!("invalid table name: {}", table_name);
    }
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut conn = open_sqlite_connection(&db_path)?;
    create_dataset_table(&conn, &table_name)?;

    let tx = conn.transaction()?;
    tx.execute(&format!("DELETE FROM \"{}\"", table_name), [])?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" (
                SKU, Product_type, Price, Availability, Number_of_products_sold,
                Revenue_generated, Customer_demographics, Stock_levels, Lead_times,
                Order_quantities, Shipping_times, Shipping_carriers, Shipping_costs,
                Supplier_name, Location, Lead_time, Production_volumes,
                Manufacturing_lead_time, Manufacturing_costs, Inspection_results,
                Defect_rates, Transportation_modes, Routes, Costs
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'Unknown', ?7, ?8, 50, 4, 'Carrier B', 5.0,
                      ?9, 'Mumbai', ?8, 500, 14, 40.0, 'Pending', 1.5, ?10, 'Route A', 500.0)",
            table_name
        ))?;
        for (sku, product_type, price, availability, sold, revenue, stock, lead, supplier, mode) in
            SAMPLE_ROWS
        {
            stmt.execute(params![
                sku,
                product_type,
                price,
                availability,
                sold,
                revenue,
                stock,
                lead,
                supplier,
                mode
            ])?;
        }
    }
    tx.commit()?;

    println!(
        "seeded {} rows into {} ({})",
        SAMPLE_ROWS.len(),
        table_name,
        db_path
    );
    Ok(())
}
