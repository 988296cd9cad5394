// ==========================================
// 遊技ホール台データ分析 - 命令行主入口
// ==========================================
// 用法:
//   hall-telemetry <hall_id> <YYYY-MM-DD> [key=value ...]
//
// key=value 为分析参数 (display_days=7,14 sort=diff_7 order=desc difference_min=0 ...)
// 数据库路径: 环境变量 HALL_TELEMETRY_DB_PATH, 否则为用户数据目录
// 结果以 JSON 输出到标准输出
// ==========================================

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use hall_telemetry::app::{get_default_db_path, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    hall_telemetry::logging::init();

    tracing::info!("{} v{}", hall_telemetry::APP_NAME, hall_telemetry::VERSION);

    let mut args = std::env::args().skip(1);
    let hall_id: i64 = args
        .next()
        .ok_or_else(|| anyhow!("缺少参数 hall_id (用法: hall-telemetry <hall_id> <YYYY-MM-DD> [key=value ...])"))?
        .trim()
        .parse()
        .context("hall_id 必须为整数")?;
    let date = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("日期格式错误: {}", raw))?,
        None => chrono::Local::now().date_naive(),
    };

    let mut params = HashMap::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("参数格式应为 key=value: {}", arg);
        };
        params.insert(key.trim().to_string(), value.trim().to_string());
    }

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;

    let analysis = state
        .machine_data_api
        .analyze_day(hall_id, date, &params)
        .await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
