// ==========================================
// SCM 推荐系统 - 性能观测
// ==========================================
// 职责:
// - SQL 语句计数 + 慢查询日志（rusqlite trace/profile 钩子）
// - 阶段耗时统计（StageTimer）
// 开关: PipelineConfig.sql_profile / slow_sql_ms
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// 钩子是裸函数指针，阈值只能走全局
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static SQL_COUNT: Cell<u64> = Cell::new(0);
    static SLOW_SQL_COUNT: Cell<u64> = Cell::new(0);
}

/// SQL 观测参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlProfile {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl SqlProfile {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            slow_ms: 0,
        }
    }
}

/// 在连接上安装 trace/profile 钩子
///
/// 关闭时显式清理钩子，避免复用连接残留回调
pub fn install_sql_profile(conn: &mut Connection, profile: SqlProfile) {
    if !profile.enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_SQL_THRESHOLD_MS.store(profile.slow_ms, Ordering::Relaxed);
    conn.trace(Some(on_sql_trace));
    conn.profile(Some(on_sql_profile));
}

fn on_sql_trace(_sql: &str) {
    SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

fn on_sql_profile(sql: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %shorten_sql(sql, 400),
        "慢查询"
    );
    SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

fn shorten_sql(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}…", head)
}

/// 阶段计时 Guard：drop 时输出耗时 + 本线程 SQL 数 + 慢 SQL 数
///
/// ```ignore
/// let _timer = scm_recommender::perf::StageTimer::new("pipeline.fetch");
/// ```
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
            slow_sql_start: SLOW_SQL_COUNT.with(|c| c.get()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let sql_count = SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.sql_start);
        let slow_sql_count = SLOW_SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.slow_sql_start);

        tracing::debug!(
            target: "perf",
            stage = self.stage,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            sql_count,
            slow_sql_count,
            "阶段完成"
        );
    }
}
