// ==========================================
// SCM 推荐系统 - 查询表达式
// ==========================================
// 职责: SKU 查询的两种形态（结构化过滤 / 原始只读 SQL）与 SQL 构建
// 约束: 过滤值一律走参数绑定，表名只允许普通标识符
// ==========================================

use crate::domain::sku::columns;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// 结构化过滤条件（全部为可选，空过滤器 = 全表）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuFilter {
    /// 产品类型（精确匹配）
    pub product_type: Option<String>,
    /// 指定 SKU 列表（空 = 不限制）
    #[serde(default)]
    pub skus: Vec<String>,
    /// 最低销量
    pub min_units_sold: Option<i64>,
    /// 最多返回条数
    pub limit: Option<usize>,
}

impl SkuFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn product_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }

    pub fn sku(mut self, sku: &str) -> Self {
        self.skus.push(sku.to_string());
        self
    }

    pub fn min_units_sold(mut self, min: i64) -> Self {
        self.min_units_sold = Some(min);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// SKU 查询表达式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuQuery {
    /// 结构化过滤（参数化 SELECT）
    Filter(SkuFilter),
    /// 原始只读 SQL（SELECT / WITH）
    Sql(String),
}

impl Default for SkuQuery {
    fn default() -> Self {
        SkuQuery::Filter(SkuFilter::default())
    }
}

impl From<SkuFilter> for SkuQuery {
    fn from(filter: SkuFilter) -> Self {
        SkuQuery::Filter(filter)
    }
}

/// 判断是否为普通 SQL 标识符: [A-Za-z_][A-Za-z0-9_]*
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 校验表名
pub fn validate_table_name(table_name: &str) -> RepositoryResult<()> {
    if is_plain_identifier(table_name) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidTableName(table_name.to_string()))
    }
}

/// 去掉开头的空白与 SQL 注释
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(pos) => after[pos + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(pos) => after[pos + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest;
        }
    }
}

/// 原始 SQL 的首关键字检查
///
/// 只接受 SELECT / WITH 开头的语句；执行前仍需由 SQLite 判定语句只读
/// （`WITH ... DELETE` 之类在 prepare 之后拦截）。
pub fn check_read_only_prefix(sql: &str) -> RepositoryResult<()> {
    let body = strip_leading_comments(sql);
    if body.is_empty() {
        return Err(RepositoryError::DatabaseQueryError("查询语句为空".to_string()));
    }

    let keyword: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();

    match keyword.as_str() {
        "SELECT" | "WITH" => Ok(()),
        "" => Err(RepositoryError::DatabaseQueryError(format!(
            "无法识别的查询语句: {}",
            body.chars().take(40).collect::<String>()
        ))),
        other => Err(RepositoryError::UnsupportedOperation(format!(
            "仅允许 SELECT/WITH 查询，实际为 {}",
            other
        ))),
    }
}

/// 构建结构化过滤 SQL 及其绑定参数
///
/// # 返回
/// - (sql, params): 参数按 `?` 出现顺序排列
pub fn build_filter_sql(table_name: &str, filter: &SkuFilter) -> RepositoryResult<(String, Vec<Value>)> {
    validate_table_name(table_name)?;

    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(product_type) = &filter.product_type {
        conditions.push(format!("\"{}\" = ?", columns::PRODUCT_TYPE));
        params.push(Value::Text(product_type.clone()));
    }

    if !filter.skus.is_empty() {
        let placeholders = vec!["?"; filter.skus.len()].join(", ");
        conditions.push(format!("\"{}\" IN ({})", columns::SKU, placeholders));
        params.extend(filter.skus.iter().cloned().map(Value::Text));
    }

    if let Some(min) = filter.min_units_sold {
        conditions.push(format!("\"{}\" >= ?", columns::UNITS_SOLD));
        params.push(Value::Integer(min));
    }

    let mut sql = format!("SELECT * FROM \"{}\"", table_name);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY \"{}\" ASC", columns::SKU));

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit.min(i64::MAX as usize) as i64));
    }

    Ok((sql, params))
}
