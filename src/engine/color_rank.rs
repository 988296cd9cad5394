// ==========================================
// 遊技ホール台データ分析 - worst 排名着色映射
// ==========================================
// 职责: 固定配置 (过去 7 日差枚) 的 窗口聚合 + 机种内排名
// 输出: 台号 → 名次,供布局图/导出着色
// ==========================================
// 机种名分组取自请求日的记录; 请求日无数据时取之前最近的有数据日
// ==========================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::types::Metric;
use crate::engine::history::HallHistory;
use crate::engine::rank::{ModelRanker, RankTable};
use crate::engine::window::{WindowAggregator, WindowSumMap};

/// 默认着色窗口 (天)
pub const DEFAULT_COLOR_WINDOW_DAYS: u32 = 7;

// ==========================================
// ColorRanks - 着色所需的合计与排名
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColorRanks {
    pub window_days: u32,
    pub difference: WindowSumMap,
    pub ranks: RankTable,
}

// ==========================================
// WorstRankColorMapper
// ==========================================
pub struct WorstRankColorMapper {
    aggregator: WindowAggregator,
    ranker: ModelRanker,
}

impl WorstRankColorMapper {
    pub fn new() -> Self {
        Self {
            aggregator: WindowAggregator::new(),
            ranker: ModelRanker::new(),
        }
    }

    /// 台号 → worst 名次
    pub fn color_ranks(&self, history: &HallHistory, date: NaiveDate, window_days: u32) -> RankTable {
        self.compute(history, date, window_days).ranks
    }

    /// 计算窗口合计与排名
    #[instrument(skip(self, history))]
    pub fn compute(&self, history: &HallHistory, date: NaiveDate, window_days: u32) -> ColorRanks {
        let difference =
            self.aggregator
                .aggregate(history, date, window_days, Metric::DifferenceCount);

        let names_date = if history.has_records_on(date) {
            Some(date)
        } else {
            history.latest_date_before(date)
        };
        let daily = names_date.map(|d| history.records_on(d)).unwrap_or(&[]);
        debug!(names_date = ?names_date, machines = daily.len(), "着色机种名来源");

        let ranks = self.ranker.rank_by_model(daily, &difference);
        ColorRanks {
            window_days,
            difference,
            ranks,
        }
    }
}

impl Default for WorstRankColorMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{day, record};

    fn history() -> HallHistory {
        let mut records = Vec::new();
        for d in 1..=7 {
            records.push(record(day(d), 1, "A", 0, -100));
            records.push(record(day(d), 2, "A", 0, 50));
            records.push(record(day(d), 3, "A", 0, -300));
            records.push(record(day(d), 9, "B", 0, 10));
        }
        HallHistory::from_records(records)
    }

    #[test]
    fn test_seven_day_worst_ranks() {
        let mut all = Vec::new();
        for d in 1..=8 {
            all.push(record(day(d), 1, "A", 0, -100));
            all.push(record(day(d), 2, "A", 0, 50));
            all.push(record(day(d), 3, "A", 0, -300));
        }
        let history = HallHistory::from_records(all);
        let ranks = WorstRankColorMapper::new().color_ranks(&history, day(8), DEFAULT_COLOR_WINDOW_DAYS);
        assert_eq!(ranks.get(3), Some(1));
        assert_eq!(ranks.get(1), Some(2));
        assert_eq!(ranks.get(2), Some(3));
    }

    #[test]
    fn test_names_fall_back_to_latest_earlier_date() {
        // day8 无数据 → 机种名取 day7
        let out = WorstRankColorMapper::new().compute(&history(), day(8), 7);
        assert_eq!(out.difference.get(3), Some(-2100));
        assert_eq!(out.ranks.get(3), Some(1));
        assert_eq!(out.ranks.get(9), Some(1));
    }

    #[test]
    fn test_no_data_at_all_is_empty() {
        let out = WorstRankColorMapper::new().compute(&HallHistory::default(), day(8), 7);
        assert!(out.ranks.is_empty());
        assert!(out.difference.is_empty());
    }
}
