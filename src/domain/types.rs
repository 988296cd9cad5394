// ==========================================
// 遊技ホール台データ分析 - 领域类型定义
// ==========================================
// 职责: 指标/筛选模式/排序键/日期选择器等值类型
// 红线: 参数化排序键在边界处解析一次,引擎内不做字符串解析
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 聚合指标 (Metric)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    GameCount,       // G数
    DifferenceCount, // 差枚
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::GameCount => write!(f, "game_count"),
            Metric::DifferenceCount => write!(f, "difference_count"),
        }
    }
}

// ==========================================
// 机种名检索模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSearchMode {
    #[default]
    Include, // 包含
    Exclude, // 排除
}

impl NameSearchMode {
    /// 从请求参数解析 (未知值按 include 处理)
    pub fn parse(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("exclude") => NameSearchMode::Exclude,
            _ => NameSearchMode::Include,
        }
    }
}

// ==========================================
// 排序方向
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// 仅 "desc" 视为降序
    pub fn parse(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

// ==========================================
// 排序键 (SortKey)
// ==========================================
// 窗口键带显式的天数载荷: "diff_7" → WindowDifference(7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "key", content = "days", rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    MachineNumber,
    MachineName,
    GameCount,
    DifferenceCount,
    BbCount,
    RbCount,
    ArtCount,
    WindowDifference(u32),
    WindowGameCount(u32),
}

impl SortKey {
    /// 解析排序参数
    ///
    /// 规则:
    /// - 固定列名: machine_number / machine_name / game_count / difference_count / bb_count / rb_count / art_count
    /// - 窗口键: diff_<N> / game_count_<N>
    /// - 其他 → MachineNumber
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token {
            "machine_number" => return SortKey::MachineNumber,
            "machine_name" => return SortKey::MachineName,
            "game_count" => return SortKey::GameCount,
            "difference_count" => return SortKey::DifferenceCount,
            "bb_count" => return SortKey::BbCount,
            "rb_count" => return SortKey::RbCount,
            "art_count" => return SortKey::ArtCount,
            _ => {}
        }

        if let Some(days) = token.strip_prefix("diff_").and_then(parse_days) {
            return SortKey::WindowDifference(days);
        }
        if let Some(days) = token.strip_prefix("game_count_").and_then(parse_days) {
            return SortKey::WindowGameCount(days);
        }

        SortKey::MachineNumber
    }

    /// 窗口键对应的 (指标, 天数)
    pub fn window(&self) -> Option<(Metric, u32)> {
        match *self {
            SortKey::WindowDifference(days) => Some((Metric::DifferenceCount, days)),
            SortKey::WindowGameCount(days) => Some((Metric::GameCount, days)),
            _ => None,
        }
    }
}

fn parse_days(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ==========================================
// 日号预设 (Day-of-month preset)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfMonthPreset {
    Day7, // 7/17/27
    Day1, // 1/11/21/31
    Day8, // 8/18/28
}

impl DayOfMonthPreset {
    pub fn days(&self) -> &'static [u32] {
        match self {
            DayOfMonthPreset::Day7 => &[7, 17, 27],
            DayOfMonthPreset::Day1 => &[1, 11, 21, 31],
            DayOfMonthPreset::Day8 => &[8, 18, 28],
        }
    }
}

// ==========================================
// 日次汇总日期选择器
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateSelector {
    /// 截止参考日的最近 N 天 (含两端: [end-N, end])
    Window { days: u32 },
    /// 日号预设,仅取有数据的日期
    DayOfMonth { preset: DayOfMonthPreset },
    /// 显式日期列表
    Custom { dates: Vec<NaiveDate> },
}

impl Default for DateSelector {
    fn default() -> Self {
        DateSelector::Window { days: 7 }
    }
}

impl DateSelector {
    /// 从请求参数解析
    ///
    /// - "day_7" / "day_1" / "day_8" → 日号预设
    /// - "custom" + 日期列表 → 显式日期 (无法解析的日期被忽略; 列表为空时回退到默认窗口)
    /// - 数字 → 窗口天数
    /// - 其他 → 默认 7 天窗口
    pub fn parse(token: Option<&str>, custom_dates: &[String]) -> Self {
        match token.map(str::trim) {
            Some("day_7") => DateSelector::DayOfMonth { preset: DayOfMonthPreset::Day7 },
            Some("day_1") => DateSelector::DayOfMonth { preset: DayOfMonthPreset::Day1 },
            Some("day_8") => DateSelector::DayOfMonth { preset: DayOfMonthPreset::Day8 },
            Some("custom") => {
                let dates: Vec<NaiveDate> = custom_dates
                    .iter()
                    .filter_map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                    .collect();
                if dates.is_empty() {
                    DateSelector::default()
                } else {
                    DateSelector::Custom { dates }
                }
            }
            Some(other) => match parse_days(other) {
                Some(days) => DateSelector::Window { days },
                None => DateSelector::default(),
            },
            None => DateSelector::default(),
        }
    }
}
