// ==========================================
// 遊技ホール台データ分析 - 汇总结果
// ==========================================
// 派生数据,每次请求重新计算,永不落库
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DailySummary - 单日汇总 (趋势展示用)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub machine_count: usize,
    pub total_difference: i64,
    pub avg_difference: i64,
    pub avg_game_count: i64,
    pub win_count: usize,
    pub win_rate: f64, // 百分比,保留 1 位小数
}

// ==========================================
// FilteredSummary - 筛选结果汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSummary {
    pub count: usize,
    pub avg_game_count: i64,
    pub avg_difference: i64,
    pub win_count: usize,
    pub win_rate: f64,
}

// ==========================================
// ModelStats - 机种别统计
// ==========================================
// rank: 按平均差枚降序的名次 (1 起)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub rank: usize,
    pub machine_name: String,
    pub machine_count: usize,
    pub total_difference: i64,
    pub avg_difference: i64,
    pub avg_game_count: i64,
    pub win_count: usize,
    pub win_rate: f64,
}

// ==========================================
// DateOverview - 店铺日期一览的单行
// ==========================================
// summary 为 None 表示该日无数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateOverview {
    pub date: NaiveDate,
    pub summary: Option<DailySummary>,
    pub date_memo: Option<String>,
}
