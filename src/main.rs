// ==========================================
// SCM 推荐系统 - 命令行入口
// ==========================================
// 用法:
//   scm-recommender [--db PATH] [--table NAME] [--product-type T] [--sku S]...
//                   [--min-units N] [--limit N] [--sql "SELECT ..."]
//                   [--top N] [--min-level LEVEL] [--output PATH]
//                   [--brief-csv PATH] [--skipped-json PATH]
// 命令行参数覆盖环境变量 / .env 配置
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use scm_recommender::config::PipelineConfig;
use scm_recommender::report::{write_brief_csv, write_report_text, write_skipped_json};
use scm_recommender::{logging, PipelineOrchestrator, PriorityLevel, SkuFilter, SkuQuery};
use std::path::PathBuf;

const USAGE: &str = "\
用法: scm-recommender [选项]

数据集:
  --db PATH              SQLite 数据集路径
  --table NAME           SKU 表名
查询:
  --product-type T       按产品类型过滤
  --sku S                指定 SKU（可重复）
  --min-units N          最低销量
  --limit N              最多读取条数
  --sql \"SELECT ...\"     原始只读 SQL（与过滤参数互斥）
简报:
  --top N                简报最多保留条数
  --min-level LEVEL      简报最低等级 (LOW/MEDIUM/HIGH/CRITICAL)
输出:
  --output PATH          报告文本路径
  --brief-csv PATH       导出排序简报 CSV
  --skipped-json PATH    导出跳过清单 JSON
  -h, --help             显示帮助";

#[derive(Debug, Default)]
struct CliArgs {
    db_path: Option<String>,
    table: Option<String>,
    filter: SkuFilter,
    sql: Option<String>,
    top: Option<usize>,
    min_level: Option<PriorityLevel>,
    output: Option<PathBuf>,
    brief_csv: Option<PathBuf>,
    skipped_json: Option<PathBuf>,
    help: bool,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut cli = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("参数 {} 缺少取值", flag))
            };
            match flag.as_str() {
                "--db" => cli.db_path = Some(value()?),
                "--table" => cli.table = Some(value()?),
                "--product-type" => cli.filter.product_type = Some(value()?),
                "--sku" => cli.filter.skus.push(value()?),
                "--min-units" => {
                    cli.filter.min_units_sold =
                        Some(value()?.parse().context("--min-units 必须为整数")?)
                }
                "--limit" => {
                    cli.filter.limit = Some(value()?.parse().context("--limit 必须为非负整数")?)
                }
                "--sql" => cli.sql = Some(value()?),
                "--top" => cli.top = Some(value()?.parse().context("--top 必须为非负整数")?),
                "--min-level" => {
                    cli.min_level = Some(value()?.parse::<PriorityLevel>().map_err(|e| anyhow!(e))?)
                }
                "--output" => cli.output = Some(PathBuf::from(value()?)),
                "--brief-csv" => cli.brief_csv = Some(PathBuf::from(value()?)),
                "--skipped-json" => cli.skipped_json = Some(PathBuf::from(value()?)),
                "-h" | "--help" => cli.help = true,
                other => bail!("未知参数: {}\n\n{}", other, USAGE),
            }
        }

        if cli.sql.is_some() && cli.filter != SkuFilter::default() {
            bail!("--sql 不能与过滤参数同时使用");
        }
        Ok(cli)
    }

    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(ref db) = self.db_path {
            config.db_path = db.clone();
        }
        if let Some(ref table) = self.table {
            config.table_name = table.clone();
        }
        if self.top.is_some() {
            config.brief_limit = self.top;
        }
        if self.min_level.is_some() {
            config.min_priority_level = self.min_level;
        }
        if let Some(ref output) = self.output {
            config.report.output_path = output.clone();
        }
    }

    fn query(&self) -> SkuQuery {
        match self.sql {
            Some(ref sql) => SkuQuery::Sql(sql.clone()),
            None => SkuQuery::Filter(self.filter.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse(std::env::args().skip(1))?;
    if cli.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = PipelineConfig::from_env().context("加载配置失败")?;
    cli.apply(&mut config);
    logging::init(config.log_format);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", scm_recommender::APP_NAME, scm_recommender::VERSION);
    tracing::info!("==================================================");
    tracing::info!(db_path = %config.db_path, table = %config.table_name, "使用数据集");

    let output_path = config.report.output_path.clone();
    let orchestrator = PipelineOrchestrator::from_config(config).context("初始化流水线失败")?;
    let outcome = orchestrator.run(cli.query()).await?;

    write_report_text(&output_path, &outcome.report)
        .with_context(|| format!("写入报告失败: {}", output_path.display()))?;
    tracing::info!(path = %output_path.display(), "报告已写出");

    if let Some(ref path) = cli.brief_csv {
        write_brief_csv(path, &outcome.brief)
            .with_context(|| format!("写入简报 CSV 失败: {}", path.display()))?;
    }
    if let Some(ref path) = cli.skipped_json {
        write_skipped_json(path, &outcome.skipped)
            .with_context(|| format!("写入跳过清单失败: {}", path.display()))?;
    }

    println!("run_id={}", outcome.run_id);
    println!(
        "included={} skipped={}",
        outcome.brief.summary.included, outcome.brief.summary.skipped
    );
    for skipped in &outcome.skipped {
        println!("skipped\t{}\t{}\t{}", skipped.sku, skipped.kind, skipped.message);
    }
    Ok(())
}
