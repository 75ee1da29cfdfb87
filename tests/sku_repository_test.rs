// ==========================================
// SkuRepository 集成测试
// ==========================================
// 覆盖: 结构化过滤 / 原始只读 SQL / 写语句拦截 / 列校验 / 连接错误
// ==========================================


use rusqlite::Connection;
use scm_recommender::domain::columns;
use scm_recommender::repository::{RepositoryError, SkuFilter, SkuQuery, SkuRepository, SkuSource};
use test_helpers::{count_rows, create_dataset_with, create_test_dataset, TestSku, TEST_TABLE};

fn sample_rows() -> Vec<TestSku> {
    vec![
        TestSku::new("SKU3", 83, 23, 13, 7766.84),
        TestSku::new("SKU0", 802, 58, 7, 8661.0).product_type("haircare"),
        TestSku::new("SKU2", 8, 1, 10, 9577.75).product_type("haircare"),
        TestSku::new("SKU1", 736, 53, 30, 7460.9),
        TestSku::new("SKU7", 426, 93, 17, 8496.1).product_type("cosmetics"),
    ]
}

fn skus(records: &[scm_recommender::SkuRecord]) -> Vec<&str> {
    records.iter().map(|r| r.sku.as_str()).collect()
}

// ==========================================
// 结构化过滤
// ==========================================

#[test]
fn test_filter_all_orders_by_sku() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo.find_by_filter(&SkuFilter::all()).unwrap();

    assert_eq!(skus(&records), vec!["SKU0", "SKU1", "SKU2", "SKU3", "SKU7"]);
    let sku0 = &records[0];
    assert_eq!(sku0.product_type, "haircare");
    assert_eq!(sku0.units_sold, 802);
    assert_eq!(sku0.stock_level, 58);
    assert_eq!(sku0.lead_time_days, 7.0);
    assert_eq!(sku0.revenue, 8661.0);
}

#[test]
fn test_filter_by_product_type_and_min_units() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo
        .find_by_filter(&SkuFilter::all().product_type("haircare").min_units_sold(100))
        .unwrap();
    assert_eq!(skus(&records), vec!["SKU0"]);

    let records = repo
        .find_by_filter(&SkuFilter::all().sku("SKU7").sku("SKU3").sku("MISSING"))
        .unwrap();
    assert_eq!(skus(&records), vec!["SKU3", "SKU7"]);

    let records = repo.find_by_filter(&SkuFilter::all().limit(2)).unwrap();
    assert_eq!(skus(&records), vec!["SKU0", "SKU1"]);
}

#[test]
fn test_filter_values_are_bound_not_interpolated() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo
        .find_by_filter(&SkuFilter::all().product_type("x' OR '1'='1"))
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(count_rows(&db_path).unwrap(), 5);
}

#[test]
fn test_pass_through_columns_are_kept() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo.find_by_filter(&SkuFilter::all().sku("SKU1")).unwrap();
    let record = &records[0];

    assert_eq!(record.pass_through("Supplier_name").unwrap(), "Supplier 1");
    assert_eq!(record.pass_through("Order_quantities").unwrap(), 40);
    assert_eq!(record.pass_through("Defect_rates").unwrap(), 0.8);
    assert!(record.pass_through("Stock_levels").is_none());
}

#[test]
fn test_every_pass_through_column_lands_in_extra() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo.find_by_filter(&SkuFilter::all()).unwrap();

    for record in &records {
        let keys: Vec<&str> = record.extra.keys().map(String::as_str).collect();
        let mut expected = columns::PASS_THROUGH.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected, "{}", record.sku);
        for required in columns::REQUIRED {
            assert!(record.pass_through(required).is_none());
        }
    }
}

// ==========================================
// 原始 SQL
// ==========================================

#[test]
fn test_raw_select() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo
        .fetch(&SkuQuery::Sql(format!(
            "-- low stock\nSELECT * FROM {} WHERE Stock_levels < 30 ORDER BY SKU DESC",
            TEST_TABLE
        )))
        .unwrap();

    assert_eq!(skus(&records), vec!["SKU3", "SKU2"]);
}

#[test]
fn test_raw_select_accepts_integral_reals() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo
        .find_by_sql(&format!(
            "SELECT sku, product_type, Price, Availability, Number_of_products_sold,
                    Revenue_generated, CAST(Stock_levels AS REAL) AS Stock_levels, Lead_times
             FROM {} WHERE SKU = 'SKU0'",
            TEST_TABLE
        ))
        .unwrap();

    assert_eq!(records[0].stock_level, 58);
    assert!(records[0].extra.is_empty());
}

#[test]
fn test_raw_select_empty_result() {
    let (_file, db_path) = create_test_dataset().unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let records = repo
        .find_by_sql(&format!("SELECT * FROM {}", TEST_TABLE))
        .unwrap();
    assert!(records.is_empty());
}

// ==========================================
// 只读约束
// ==========================================

#[test]
fn test_mutating_statements_are_rejected() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let statements = [
        format!("DELETE FROM {}", TEST_TABLE),
        format!("UPDATE {} SET Stock_levels = 0", TEST_TABLE),
        format!("DROP TABLE {}", TEST_TABLE),
        format!("WITH doomed AS (SELECT SKU FROM {t}) DELETE FROM {t}", t = TEST_TABLE),
    ];

    for sql in &statements {
        let err = repo.find_by_sql(sql).unwrap_err();
        assert!(
            matches!(err, RepositoryError::UnsupportedOperation(_)),
            "{} => {:?}",
            sql,
            err
        );
        assert!(!err.is_query_error());
    }

    assert_eq!(count_rows(&db_path).unwrap(), 5);
}

// ==========================================
// 结构与连接错误
// ==========================================

#[test]
fn test_missing_required_column() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let err = repo
        .find_by_sql(&format!("SELECT SKU, Product_type FROM {}", TEST_TABLE))
        .unwrap_err();

    match err {
        RepositoryError::MissingColumn { column } => assert_eq!(column, "Price"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_column_type_mismatch() {
    let (_file, db_path) = create_dataset_with(&sample_rows()).unwrap();
    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            &format!("UPDATE {} SET Stock_levels = 'n/a' WHERE SKU = 'SKU2'", TEST_TABLE),
            [],
        )
        .unwrap();
    }
    let repo = SkuRepository::new(&db_path, TEST_TABLE).unwrap();

    let err = repo.find_by_filter(&SkuFilter::all()).unwrap_err();

    match err {
        RepositoryError::ColumnTypeMismatch { column, row, .. } => {
            assert_eq!(column, "Stock_levels");
            assert_eq!(row, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_missing_table_is_query_error() {
    let (_file, db_path) = create_test_dataset().unwrap();
    let repo = SkuRepository::new(&db_path, "no_such_table").unwrap();

    let err = repo.find_by_filter(&SkuFilter::all()).unwrap_err();
    assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));
    assert!(err.is_query_error());
}

#[test]
fn test_missing_file_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.sqlite");
    let repo = SkuRepository::new(missing.to_str().unwrap(), TEST_TABLE).unwrap();

    let err = repo.find_by_filter(&SkuFilter::all()).unwrap_err();
    assert!(matches!(err, RepositoryError::DatabaseConnectionError(_)));
    assert!(!missing.exists());
}

#[test]
fn test_invalid_table_name() {
    let err = SkuRepository::new("unused.sqlite", "skus; DROP TABLE x").unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidTableName(_)));
}
