// ==========================================
// 遊技ホール台データ分析 - 筛选条件
// ==========================================
// 红线: 缺失或非数字的参数视为"未设置",对应阶段为空操作,绝不当作 0
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::types::NameSearchMode;

/// 可接受的排名取值上限
pub const MAX_ACCEPTED_RANK: u8 = 5;

// ==========================================
// IntRange - 闭区间 [min, max],两端独立可选
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRange {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// 两端均未设置
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

// ==========================================
// PastWindowRange - 过去 N 天合计的区间条件
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastWindowRange {
    pub window_days: Option<u32>,
    pub range: IntRange,
}

impl PastWindowRange {
    /// 窗口与至少一端都设置时才生效
    pub fn active_window(&self) -> Option<u32> {
        match self.window_days {
            Some(days) if !self.range.is_unbounded() => Some(days),
            _ => None,
        }
    }
}

// ==========================================
// RankCondition - 排名集合条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCondition {
    pub window_days: Option<u32>,
    pub accepted_ranks: BTreeSet<u8>,
}

impl RankCondition {
    pub fn active_window(&self) -> Option<u32> {
        match self.window_days {
            Some(days) if !self.accepted_ranks.is_empty() => Some(days),
            _ => None,
        }
    }
}

// ==========================================
// FilterCriteria - 筛选条件全集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    // ===== 机种名 =====
    pub name: Option<String>,
    pub name_search: Option<String>,
    pub name_search_mode: NameSearchMode,

    // ===== 当日数值 =====
    pub game_count: IntRange,
    pub difference: IntRange,
    pub bonus_count: IntRange, // BB 数

    // ===== 过去窗口 =====
    pub past_difference: PastWindowRange,
    pub past_game_count: PastWindowRange,

    // ===== 同机种台数 =====
    pub model_count: IntRange,

    // ===== 排名 =====
    pub rank: RankCondition,
}

impl FilterCriteria {
    /// 从请求参数构造
    ///
    /// 键名: name, name_search, name_search_mode,
    /// game_count_min/max, difference_min/max, bonus_count_min/max,
    /// past_difference_days + past_difference_min/max,
    /// past_game_count_days + past_game_count_min/max,
    /// model_count_min/max, rank_days + accepted_ranks (逗号分隔)
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).map(String::as_str);
        let int = |key: &str| parse_int_param(get(key));
        let range = |prefix: &str| {
            IntRange::new(int(&format!("{}_min", prefix)), int(&format!("{}_max", prefix)))
        };

        Self {
            name: non_blank(get("name")),
            name_search: non_blank(get("name_search")),
            name_search_mode: NameSearchMode::parse(get("name_search_mode")),
            game_count: range("game_count"),
            difference: range("difference"),
            bonus_count: range("bonus_count"),
            past_difference: PastWindowRange {
                window_days: parse_days_param(get("past_difference_days")),
                range: range("past_difference"),
            },
            past_game_count: PastWindowRange {
                window_days: parse_days_param(get("past_game_count_days")),
                range: range("past_game_count"),
            },
            model_count: range("model_count"),
            rank: RankCondition {
                window_days: parse_days_param(get("rank_days")),
                accepted_ranks: parse_rank_list(get("accepted_ranks")),
            },
        }
    }

    /// 筛选所需的差枚窗口天数 (过去差枚 + 排名)
    pub fn required_difference_windows(&self) -> BTreeSet<u32> {
        self.past_difference
            .active_window()
            .into_iter()
            .chain(self.rank.active_window())
            .collect()
    }

    /// 筛选所需的 G 数窗口天数
    pub fn required_game_count_windows(&self) -> BTreeSet<u32> {
        self.past_game_count.active_window().into_iter().collect()
    }
}

/// 解析整数参数; 空白或非数字 → None
pub fn parse_int_param(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
}

/// 解析天数参数; 负数同样视为未设置
pub fn parse_days_param(raw: Option<&str>) -> Option<u32> {
    parse_int_param(raw).and_then(|v| u32::try_from(v).ok())
}

/// 解析排名列表 "1,2,5"; 超出 1..=5 的值丢弃
pub fn parse_rank_list(raw: Option<&str>) -> BTreeSet<u8> {
    raw.unwrap_or("")
        .split(',')
        .filter_map(|s| s.trim().parse::<u8>().ok())
        .filter(|r| (1..=MAX_ACCEPTED_RANK).contains(r))
        .collect()
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_int_range_contains() {
        let r = IntRange::new(Some(0), None);
        assert!(r.contains(0));
        assert!(r.contains(100));
        assert!(!r.contains(-1));
        assert!(IntRange::default().contains(i64::MIN));
    }

    #[test]
    fn test_non_numeric_params_are_absent() {
        let c = FilterCriteria::from_params(&params(&[
            ("difference_min", "abc"),
            ("difference_max", ""),
            ("game_count_min", " 3000 "),
        ]));
        assert!(c.difference.is_unbounded());
        assert_eq!(c.game_count.min, Some(3000));
    }

    #[test]
    fn test_past_window_requires_bound() {
        let c = FilterCriteria::from_params(&params(&[("past_difference_days", "7")]));
        assert_eq!(c.past_difference.window_days, Some(7));
        assert_eq!(c.past_difference.active_window(), None);
        assert!(c.required_difference_windows().is_empty());
    }

    #[test]
    fn test_rank_list_parsing() {
        let c = FilterCriteria::from_params(&params(&[
            ("rank_days", "14"),
            ("accepted_ranks", "1, 2,9,x"),
        ]));
        assert_eq!(c.rank.accepted_ranks.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(c.rank.active_window(), Some(14));
        assert!(c.required_difference_windows().contains(&14));
    }

    #[test]
    fn test_blank_name_is_absent() {
        let c = FilterCriteria::from_params(&params(&[("name", "  "), ("name_search_mode", "exclude")]));
        assert!(c.name.is_none());
        assert_eq!(c.name_search_mode, NameSearchMode::Exclude);
    }
}
