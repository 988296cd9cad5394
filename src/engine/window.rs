// ==========================================
// 遊技ホール台データ分析 - 窗口聚合器
// ==========================================
// 职责: 按台号合计参考日前 N 天 [ref-N, ref-1] 的指标
// 红线: 纯函数,无缓存,不回写; 窗口内无记录的台号不产生条目
// ==========================================

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use crate::domain::machine::MachineRecord;
use crate::domain::types::Metric;
use crate::engine::history::HallHistory;
use crate::engine::rank::{ModelRanker, RankTable};

// ==========================================
// WindowSumMap - 台号 → 窗口合计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WindowSumMap(BTreeMap<i32, i64>);

impl WindowSumMap {
    /// 条目存在时返回合计
    pub fn get(&self, machine_number: i32) -> Option<i64> {
        self.0.get(&machine_number).copied()
    }

    /// 缺失视为 0 (用于区间筛选与排序)
    pub fn get_or_zero(&self, machine_number: i32) -> i64 {
        self.get(machine_number).unwrap_or(0)
    }

    pub fn contains(&self, machine_number: i32) -> bool {
        self.0.contains_key(&machine_number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(i32, i64)> for WindowSumMap {
    fn from_iter<I: IntoIterator<Item = (i32, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ==========================================
// WindowAggregator - 窗口聚合器
// ==========================================
pub struct WindowAggregator {
    // 无状态引擎
}

impl WindowAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 窗口的日期区间 [ref-N, ref-1]; N=0 时为 None
    ///
    /// 起点越过日期下限时截到 `NaiveDate::MIN`
    pub fn window_range(reference_date: NaiveDate, window_days: u32) -> Option<(NaiveDate, NaiveDate)> {
        if window_days == 0 {
            return None;
        }
        let end = reference_date.checked_sub_days(Days::new(1))?;
        let start = reference_date
            .checked_sub_days(Days::new(u64::from(window_days)))
            .unwrap_or(NaiveDate::MIN);
        Some((start, end))
    }

    /// 按台号合计窗口内的指标
    #[instrument(skip(self, history))]
    pub fn aggregate(
        &self,
        history: &HallHistory,
        reference_date: NaiveDate,
        window_days: u32,
        metric: Metric,
    ) -> WindowSumMap {
        let Some((start, end)) = Self::window_range(reference_date, window_days) else {
            return WindowSumMap::default();
        };

        let sums = sum_by_machine(history.records_between(start, end), metric);
        debug!(start = %start, end = %end, machines = sums.len(), "窗口聚合完成");
        sums
    }
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_by_machine<'a>(
    records: impl Iterator<Item = &'a MachineRecord>,
    metric: Metric,
) -> WindowSumMap {
    let mut sums: BTreeMap<i32, i64> = BTreeMap::new();
    for r in records {
        *sums.entry(r.machine_number).or_insert(0) += r.metric(metric);
    }
    WindowSumMap(sums)
}

// ==========================================
// WindowTables - 单次请求内的窗口合计/排名表
// ==========================================
// 以 (窗口天数, 指标) 为键,在同一请求内只计算一次
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowTables {
    pub difference: BTreeMap<u32, WindowSumMap>,
    pub game_count: BTreeMap<u32, WindowSumMap>,
    pub difference_ranks: BTreeMap<u32, RankTable>,
    pub game_count_ranks: BTreeMap<u32, RankTable>,
}

impl WindowTables {
    /// 计算给定窗口集合的合计与排名
    ///
    /// # 参数
    /// - `daily_records`: 参考日的台列表 (排名分组依据)
    /// - `difference_days` / `game_count_days`: 需要的窗口天数
    #[instrument(skip(history, daily_records), fields(machines = daily_records.len()))]
    pub fn compute(
        history: &HallHistory,
        reference_date: NaiveDate,
        daily_records: &[MachineRecord],
        difference_days: &BTreeSet<u32>,
        game_count_days: &BTreeSet<u32>,
    ) -> Self {
        let aggregator = WindowAggregator::new();
        let ranker = ModelRanker::new();
        let mut tables = Self::default();

        for &days in difference_days {
            let sums = aggregator.aggregate(history, reference_date, days, Metric::DifferenceCount);
            tables.difference_ranks.insert(days, ranker.rank_by_model(daily_records, &sums));
            tables.difference.insert(days, sums);
        }
        for &days in game_count_days {
            let sums = aggregator.aggregate(history, reference_date, days, Metric::GameCount);
            tables.game_count_ranks.insert(days, ranker.rank_by_model(daily_records, &sums));
            tables.game_count.insert(days, sums);
        }

        tables
    }

    /// 指标+天数对应的合计表
    pub fn sums(&self, metric: Metric, days: u32) -> Option<&WindowSumMap> {
        match metric {
            Metric::DifferenceCount => self.difference.get(&days),
            Metric::GameCount => self.game_count.get(&days),
        }
    }

    /// 指标+天数对应的排名表
    pub fn ranks(&self, metric: Metric, days: u32) -> Option<&RankTable> {
        match metric {
            Metric::DifferenceCount => self.difference_ranks.get(&days),
            Metric::GameCount => self.game_count_ranks.get(&days),
        }
    }
}
