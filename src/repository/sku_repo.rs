// ==========================================
// SCM 推荐系统 - SKU 数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责只读数据访问
// 约束: 每次调用独立打开连接，任何退出路径上都会释放
// ==========================================

use crate::config::PipelineConfig;
use crate::db::{open_readonly_connection, DEFAULT_BUSY_TIMEOUT_MS};
use crate::domain::sku::{columns, SkuRecord};
use crate::perf::{install_sql_profile, SqlProfile};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::query::{build_filter_sql, check_read_only_prefix, validate_table_name, SkuFilter, SkuQuery};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Row};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

// ==========================================
// SkuSource - SKU 数据来源 Trait
// ==========================================
/// 编排器依赖的数据访问接口
///
/// 实现者: SkuRepository（SQLite 数据集）；测试中可替换为内存实现
pub trait SkuSource: Send + Sync {
    /// 执行只读查询，返回按查询顺序排列的 SKU 记录
    ///
    /// # 返回
    /// - Ok(Vec): 可能为空
    /// - Err: 查询错误（对整次运行致命）
    fn fetch(&self, query: &SkuQuery) -> RepositoryResult<Vec<SkuRecord>>;
}

// ==========================================
// SkuRepository - SKU 仓储
// ==========================================
#[derive(Debug, Clone)]
pub struct SkuRepository {
    db_path: String,
    table_name: String,
    busy_timeout_ms: u64,
    sql_profile: SqlProfile,
}

impl SkuRepository {
    /// 创建仓储实例（不立即打开连接）
    ///
    /// # 参数
    /// - db_path: 数据集文件路径
    /// - table_name: SKU 表名（普通标识符）
    pub fn new(db_path: &str, table_name: &str) -> RepositoryResult<Self> {
        validate_table_name(table_name)?;
        Ok(Self {
            db_path: db_path.to_string(),
            table_name: table_name.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            sql_profile: SqlProfile::disabled(),
        })
    }

    /// 按流水线配置创建
    pub fn from_config(config: &PipelineConfig) -> RepositoryResult<Self> {
        let mut repo = Self::new(&config.db_path, &config.table_name)?;
        repo.busy_timeout_ms = config.busy_timeout_ms;
        repo.sql_profile = SqlProfile {
            enabled: config.sql_profile,
            slow_ms: config.slow_sql_ms,
        };
        Ok(repo)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// 按结构化过滤条件查询
    pub fn find_by_filter(&self, filter: &SkuFilter) -> RepositoryResult<Vec<SkuRecord>> {
        let (sql, params) = build_filter_sql(&self.table_name, filter)?;
        self.run_query(&sql, &params)
    }

    /// 执行原始只读 SQL
    pub fn find_by_sql(&self, sql: &str) -> RepositoryResult<Vec<SkuRecord>> {
        check_read_only_prefix(sql)?;
        self.run_query(sql, &[])
    }

    #[instrument(skip(self, params), fields(db_path = %self.db_path))]
    fn run_query(&self, sql: &str, params: &[Value]) -> RepositoryResult<Vec<SkuRecord>> {
        let mut conn = open_readonly_connection(&self.db_path, self.busy_timeout_ms)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", self.db_path, e)))?;
        install_sql_profile(&mut conn, self.sql_profile);

        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(RepositoryError::UnsupportedOperation(
                "语句会修改数据集".to_string(),
            ));
        }

        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let mapper = RowMapper::new(&column_names)?;

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(mapper.map_row(row, records.len())?);
        }

        debug!(rows = records.len(), "SKU 查询完成");
        Ok(records)
    }
}

impl SkuSource for SkuRepository {
    fn fetch(&self, query: &SkuQuery) -> RepositoryResult<Vec<SkuRecord>> {
        match query {
            SkuQuery::Filter(filter) => self.find_by_filter(filter),
            SkuQuery::Sql(sql) => self.find_by_sql(sql),
        }
    }
}

// ==========================================
// RowMapper - 行到 SkuRecord 的映射
// ==========================================
// 列名大小写不敏感；必需列缺失在取第一行之前就报错
struct RowMapper {
    sku: usize,
    product_type: usize,
    price: usize,
    availability: usize,
    units_sold: usize,
    revenue: usize,
    stock_level: usize,
    lead_time_days: usize,
    extra: Vec<(usize, String)>,
}

impl RowMapper {
    fn new(column_names: &[String]) -> RepositoryResult<Self> {
        let index: HashMap<String, usize> = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();

        let find = |column: &str| -> RepositoryResult<usize> {
            index
                .get(&column.to_lowercase())
                .copied()
                .ok_or_else(|| RepositoryError::MissingColumn {
                    column: column.to_string(),
                })
        };

        let required: Vec<String> = columns::REQUIRED.iter().map(|c| c.to_lowercase()).collect();
        let extra = column_names
            .iter()
            .enumerate()
            .filter(|(_, name)| !required.contains(&name.to_lowercase()))
            .map(|(i, name)| (i, name.clone()))
            .collect();

        Ok(Self {
            sku: find(columns::SKU)?,
            product_type: find(columns::PRODUCT_TYPE)?,
            price: find(columns::PRICE)?,
            availability: find(columns::AVAILABILITY)?,
            units_sold: find(columns::UNITS_SOLD)?,
            revenue: find(columns::REVENUE)?,
            stock_level: find(columns::STOCK_LEVEL)?,
            lead_time_days: find(columns::LEAD_TIME_DAYS)?,
            extra,
        })
    }

    fn map_row(&self, row: &Row<'_>, row_no: usize) -> RepositoryResult<SkuRecord> {
        let mut extra = BTreeMap::new();
        for (idx, name) in &self.extra {
            extra.insert(name.clone(), to_json(row.get_ref(*idx)?));
        }

        Ok(SkuRecord {
            sku: read_text(row, self.sku, columns::SKU, row_no)?,
            product_type: read_text(row, self.product_type, columns::PRODUCT_TYPE, row_no)?,
            price: read_real(row, self.price, columns::PRICE, row_no)?,
            availability: read_integer(row, self.availability, columns::AVAILABILITY, row_no)?,
            units_sold: read_integer(row, self.units_sold, columns::UNITS_SOLD, row_no)?,
            revenue: read_real(row, self.revenue, columns::REVENUE, row_no)?,
            stock_level: read_integer(row, self.stock_level, columns::STOCK_LEVEL, row_no)?,
            lead_time_days: read_real(row, self.lead_time_days, columns::LEAD_TIME_DAYS, row_no)?,
            extra,
        })
    }
}

fn mismatch(column: &str, row_no: usize, message: String) -> RepositoryError {
    RepositoryError::ColumnTypeMismatch {
        column: column.to_string(),
        row: row_no,
        message,
    }
}

fn describe(value: ValueRef<'_>) -> &'static str {
    match value {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "REAL",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

fn read_text(row: &Row<'_>, idx: usize, column: &str, row_no: usize) -> RepositoryResult<String> {
    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map_err(|e| mismatch(column, row_no, format!("非 UTF-8 文本: {}", e))),
        // 数值型 SKU 编号按文本处理
        ValueRef::Integer(i) => Ok(i.to_string()),
        other => Err(mismatch(column, row_no, format!("期望 TEXT，实际 {}", describe(other)))),
    }
}

fn read_real(row: &Row<'_>, idx: usize, column: &str, row_no: usize) -> RepositoryResult<f64> {
    match row.get_ref(idx)? {
        ValueRef::Real(f) => Ok(f),
        ValueRef::Integer(i) => Ok(i as f64),
        other => Err(mismatch(column, row_no, format!("期望数值，实际 {}", describe(other)))),
    }
}

fn read_integer(row: &Row<'_>, idx: usize, column: &str, row_no: usize) -> RepositoryResult<i64> {
    match row.get_ref(idx)? {
        ValueRef::Integer(i) => Ok(i),
        // CSV 导入的整数列常被存为 REAL，仅接受整值
        ValueRef::Real(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Ok(f as i64)
        }
        ValueRef::Real(f) => Err(mismatch(column, row_no, format!("期望整数，实际 {}", f))),
        other => Err(mismatch(column, row_no, format!("期望整数，实际 {}", describe(other)))),
    }
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => serde_json::Value::from(bytes.to_vec()),
    }
}
