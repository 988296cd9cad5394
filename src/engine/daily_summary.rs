// ==========================================
// 遊技ホール台データ分析 - 日次汇总构建器
// ==========================================
// 职责: 对一组目标日期,逐日重跑筛选管道并生成汇总 (新日期在前)
// 红线: 窗口合计与排名以"该日期"为参考日重新推导,不沿用主参考日
// 红线: 排名阶段对前序阶段的幸存台重新排名
// 红线: 无原始记录的日期、筛选后为空的日期均跳过,不输出零值汇总
// ==========================================

use chrono::{Days, NaiveDate};
use tracing::{debug, instrument};

use crate::domain::filter::FilterCriteria;
use crate::domain::summary::DailySummary;
use crate::domain::types::DateSelector;
use crate::engine::filter::{FilterPipeline, RankBasis};
use crate::engine::history::HallHistory;
use crate::engine::stats::summarize_day;
use crate::engine::window::WindowTables;

// ==========================================
// DailySummaryBuilder - 日次汇总构建器
// ==========================================
pub struct DailySummaryBuilder {
    // 无状态引擎
}

impl DailySummaryBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析目标日期 (降序)
    ///
    /// - Window{N}: [end-N, end] 内有数据的日期 (起点越界时截到日期下限)
    /// - DayOfMonth: 日号命中预设、不晚于 end 且有数据的日期
    /// - Custom: 显式日期去重后降序
    pub fn target_dates(
        &self,
        history: &HallHistory,
        reference_end: NaiveDate,
        selector: &DateSelector,
    ) -> Vec<NaiveDate> {
        match selector {
            DateSelector::Window { days } => {
                let start = reference_end
                    .checked_sub_days(Days::new(u64::from(*days)))
                    .unwrap_or(NaiveDate::MIN);
                history.dates_between_desc(start, reference_end)
            }
            DateSelector::DayOfMonth { preset } => {
                history.dates_with_day_of_month(preset.days(), reference_end)
            }
            DateSelector::Custom { dates } => {
                let mut dates = dates.clone();
                dates.sort_unstable_by(|a, b| b.cmp(a));
                dates.dedup();
                dates
            }
        }
    }

    /// 构建日次汇总列表 (新日期在前)
    #[instrument(skip(self, history, criteria))]
    pub fn build(
        &self,
        history: &HallHistory,
        reference_end: NaiveDate,
        selector: &DateSelector,
        criteria: &FilterCriteria,
    ) -> Vec<DailySummary> {
        let difference_days = criteria.required_difference_windows();
        let game_count_days = criteria.required_game_count_windows();

        let mut summaries = Vec::new();
        for date in self.target_dates(history, reference_end, selector) {
            let daily = history.records_on(date);
            if daily.is_empty() {
                continue;
            }

            let tables =
                WindowTables::compute(history, date, daily, &difference_days, &game_count_days);
            let filtered = FilterPipeline::new(criteria, &tables)
                .with_rank_basis(RankBasis::Survivors)
                .run(daily);

            match summarize_day(date, &filtered) {
                Some(summary) => summaries.push(summary),
                None => debug!(date = %date, "筛选后无记录, 跳过该日"),
            }
        }
        summaries
    }
}

impl Default for DailySummaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::{IntRange, PastWindowRange, RankCondition};
    use crate::domain::types::DayOfMonthPreset;
    use crate::engine::test_support::{day, record};

    #[test]
    fn test_day_of_month_preset_scenario() {
        let history = HallHistory::from_records(vec![
            record(day(7), 1, "A", 1000, 100),
            record(day(17), 1, "A", 2000, -100),
            record(day(22), 1, "A", 3000, 300),
        ]);
        let selector = DateSelector::DayOfMonth { preset: DayOfMonthPreset::Day7 };
        let out = DailySummaryBuilder::new().build(
            &history,
            day(20),
            &selector,
            &FilterCriteria::default(),
        );
        let dates: Vec<NaiveDate> = out.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(17), day(7)]);
    }

    #[test]
    fn test_window_selector_skips_empty_dates() {
        let history = HallHistory::from_records(vec![
            record(day(10), 1, "A", 1000, 100),
            record(day(8), 1, "A", 1000, 100),
        ]);
        let builder = DailySummaryBuilder::new();
        let selector = DateSelector::Window { days: 3 };
        assert_eq!(
            builder.target_dates(&history, day(10), &selector),
            vec![day(10), day(8)]
        );
        let out = builder.build(&history, day(10), &selector, &FilterCriteria::default());
        let dates: Vec<NaiveDate> = out.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(10), day(8)]);
    }

    #[test]
    fn test_huge_window_selects_only_recorded_dates() {
        let history = HallHistory::from_records(vec![
            record(day(2), 1, "A", 1000, 100),
            record(day(9), 1, "A", 1000, 100),
            record(day(12), 1, "A", 1000, 100),
        ]);
        let builder = DailySummaryBuilder::new();

        let wide = DateSelector::Window { days: 90_000_000 };
        assert_eq!(builder.target_dates(&history, day(10), &wide), vec![day(9), day(2)]);

        let max = DateSelector::Window { days: u32::MAX };
        assert_eq!(builder.target_dates(&history, day(10), &max), vec![day(9), day(2)]);
        let out = builder.build(&history, day(10), &max, &FilterCriteria::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_rank_stage_ranks_survivors_of_earlier_stages() {
        // day1 合计: 台1 -900, 台2 -100, 台3 500
        let history = HallHistory::from_records(vec![
            record(day(1), 1, "A", 1000, -900),
            record(day(1), 2, "A", 1000, -100),
            record(day(1), 3, "A", 1000, 500),
            record(day(2), 1, "A", 1000, -10),
            record(day(2), 2, "A", 1000, 10),
            record(day(2), 3, "A", 1000, 10),
        ]);
        let criteria = FilterCriteria {
            difference: IntRange::new(Some(0), None),
            rank: RankCondition {
                window_days: Some(1),
                accepted_ranks: [1].into_iter().collect(),
            },
            ..Default::default()
        };
        let out = DailySummaryBuilder::new().build(
            &history,
            day(2),
            &DateSelector::Custom { dates: vec![day(2)] },
            &criteria,
        );
        // 台1 被差枚条件淘汰后, 台2 在幸存台中为 1 位
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, day(2));
        assert_eq!(out[0].machine_count, 1);
        assert_eq!(out[0].total_difference, 10);
    }

    #[test]
    fn test_custom_dates_sorted_desc() {
        let builder = DailySummaryBuilder::new();
        let selector = DateSelector::Custom { dates: vec![day(3), day(9), day(3), day(5)] };
        assert_eq!(
            builder.target_dates(&HallHistory::default(), day(1), &selector),
            vec![day(9), day(5), day(3)]
        );
    }

    #[test]
    fn test_skips_date_emptied_by_filter() {
        let history = HallHistory::from_records(vec![
            record(day(5), 1, "A", 1000, -100),
            record(day(6), 1, "A", 1000, 100),
        ]);
        let criteria = FilterCriteria {
            difference: IntRange::new(Some(0), None),
            ..Default::default()
        };
        let out = DailySummaryBuilder::new().build(
            &history,
            day(6),
            &DateSelector::Window { days: 1 },
            &criteria,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, day(6));
    }

    #[test]
    fn test_windows_rederived_per_target_date() {
        // 台 1: day4 差枚 -5000, 其余为 0
        let history = HallHistory::from_records(vec![
            record(day(4), 1, "A", 0, -5000),
            record(day(5), 1, "A", 100, 0),
            record(day(8), 1, "A", 100, 0),
        ]);
        let criteria = FilterCriteria {
            past_difference: PastWindowRange {
                window_days: Some(1),
                range: IntRange::new(None, Some(-1000)),
            },
            ..Default::default()
        };
        let out = DailySummaryBuilder::new().build(
            &history,
            day(8),
            &DateSelector::Window { days: 5 },
            &criteria,
        );
        // 仅 day5 的前一日 (day4) 满足条件
        let dates: Vec<NaiveDate> = out.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(5)]);
    }
}
