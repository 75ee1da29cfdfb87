// ==========================================
// SCM 推荐系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 数据集只读打开，从连接层面杜绝写回
// - 统一 busy_timeout，避免外部进程写库时偶发 busy 错误
// ==========================================

use rusqlite::{Connection, OpenFlags};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 打开只读连接
///
/// 说明：
/// - SQLITE_OPEN_READ_ONLY：任何写语句在执行期都会失败
/// - 不带 SQLITE_OPEN_CREATE：文件不存在时直接报错，而不是建出空库
pub fn open_readonly_connection(db_path: &str, busy_timeout_ms: u64) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(db_path, flags)?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(conn)
}

/// 打开读写连接（仅用于样例数据生成与测试建库）
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(conn)
}

/// 判断表是否存在
pub fn table_exists(conn: &Connection, table_name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// 数据集固定列定义（列名, SQLite 类型），顺序与原始 CSV 一致
pub const DATASET_COLUMNS: [(&str, &str); 24] = [
    ("Product_type", "TEXT"),
    ("SKU", "TEXT"),
    ("Price", "REAL"),
    ("Availability", "INTEGER"),
    ("Number_of_products_sold", "INTEGER"),
    ("Revenue_generated", "REAL"),
    ("Customer_demographics", "TEXT"),
    ("Stock_levels", "INTEGER"),
    ("Lead_times", "INTEGER"),
    ("Order_quantities", "INTEGER"),
    ("Shipping_times", "INTEGER"),
    ("Shipping_carriers", "TEXT"),
    ("Shipping_costs", "REAL"),
    ("Supplier_name", "TEXT"),
    ("Location", "TEXT"),
    ("Lead_time", "INTEGER"),
    ("Production_volumes", "INTEGER"),
    ("Manufacturing_lead_time", "INTEGER"),
    ("Manufacturing_costs", "REAL"),
    ("Inspection_results", "TEXT"),
    ("Defect_rates", "REAL"),
    ("Transportation_modes", "TEXT"),
    ("Routes", "TEXT"),
    ("Costs", "REAL"),
];

/// 建立数据集表（仅用于样例数据生成与测试建库）
///
/// 表名由调用方保证为普通标识符
pub fn create_dataset_table(conn: &Connection, table_name: &str) -> rusqlite::Result<()> {
    let columns = DATASET_COLUMNS
        .iter()
        .map(|(name, ty)| format!("\"{}\" {}", name, ty))
        .collect::<Vec<_>>()
        .join(",\n    ");
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" (\n    {}\n);",
        table_name, columns
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readonly_connection_rejects_writes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        {
            let conn = open_sqlite_connection(&path).unwrap();
            create_dataset_table(&conn, "supply_chain_data").unwrap();
            assert!(table_exists(&conn, "supply_chain_data").unwrap());
        }

        let ro = open_readonly_connection(&path, DEFAULT_BUSY_TIMEOUT_MS).unwrap();
        let err = ro
            .execute("DELETE FROM supply_chain_data", [])
            .unwrap_err();
        assert_eq!(err.sqlite_error_code(), Some(rusqlite::ErrorCode::ReadOnly));
    }

    #[test]
    fn test_dataset_columns_cover_record_contract() {
        use crate::domain::sku::columns;

        let mut schema: Vec<&str> = DATASET_COLUMNS.iter().map(|(name, _)| *name).collect();
        let mut contract: Vec<&str> = columns::REQUIRED
            .iter()
            .chain(columns::PASS_THROUGH.iter())
            .copied()
            .collect();
        schema.sort_unstable();
        contract.sort_unstable();
        assert_eq!(schema, contract);
    }

    #[test]
    fn test_readonly_connection_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.sqlite");
        assert!(open_readonly_connection(missing.to_str().unwrap(), 100).is_err());
    }
}
