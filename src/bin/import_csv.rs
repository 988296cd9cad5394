// ==========================================
// 遊技ホール台データ分析 - CSV 批量导入
// ==========================================
// 用法:
//   import_csv <csv_dir> <hall_code[,hall_code...]> <start YYYY-MM-DD> [end YYYY-MM-DD]
//
// 文件命名: <csv_dir>/<YYYY-MM-DD>-<hall_code>.csv
// 单元 (店铺 x 日期) 顺序执行, 单元之间等待 import_delay_ms
// ==========================================

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use hall_telemetry::app::{get_default_db_path, AppState};
use hall_telemetry::importer::{CsvDaySource, ImportUnit, MachineDataImporter};

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("日期格式错误: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    hall_telemetry::logging::init();

    let usage = "用法: import_csv <csv_dir> <hall_code[,hall_code...]> <start> [end]";
    let mut args = std::env::args().skip(1);
    let dir = args.next().ok_or_else(|| anyhow!(usage))?;
    let codes = args
        .next()
        .ok_or_else(|| anyhow!(usage))?
        .split(',')
        .map(|s| s.trim().parse::<i64>().with_context(|| format!("店铺代码错误: {}", s)))
        .collect::<Result<Vec<_>>>()?;
    let start = parse_date(&args.next().ok_or_else(|| anyhow!(usage))?)?;
    let end = match args.next() {
        Some(raw) => parse_date(&raw)?,
        None => start,
    };
    if start > end {
        anyhow::bail!("开始日期 {} 晚于结束日期 {}", start, end);
    }

    let units: Vec<ImportUnit> = codes
        .iter()
        .flat_map(|&hall_code| {
            start
                .iter_days()
                .take_while(move |d| *d <= end)
                .map(move |date| ImportUnit { hall_code, date })
        })
        .collect();

    let state = AppState::new(get_default_db_path())?;
    let importer = MachineDataImporter::new(
        Arc::clone(&state.hall_repo),
        Arc::clone(&state.record_repo),
        CsvDaySource::new(dir),
        Arc::clone(&state.config_manager),
    );

    let report = importer.batch_import(units).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.error_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
