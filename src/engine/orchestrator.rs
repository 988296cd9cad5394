// ==========================================
// 遊技ホール台データ分析 - 单日分析编排器
// ==========================================
// 用途: 协调 参考日解析 → 窗口表 → 筛选 → 排序 → 汇总 → 着色排名 的执行顺序
// 红线: 参考日在请求开始时决定一次,显式传给各步骤
// 红线: 同一请求内每个 (窗口天数, 指标) 只计算一次
// ==========================================

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

use crate::domain::filter::FilterCriteria;
use crate::domain::machine::MachineRecord;
use crate::domain::summary::{DailySummary, FilteredSummary, ModelStats};
use crate::domain::types::{DateSelector, Metric, SortDirection, SortKey};
use crate::engine::color_rank::{ColorRanks, WorstRankColorMapper, DEFAULT_COLOR_WINDOW_DAYS};
use crate::engine::daily_summary::DailySummaryBuilder;
use crate::engine::filter::FilterPipeline;
use crate::engine::history::HallHistory;
use crate::engine::reference::ResolvedDay;
use crate::engine::sort::SortEngine;
use crate::engine::stats::{filtered_summary, model_stats};
use crate::engine::window::WindowTables;

// ==========================================
// DayAnalysisRequest - 单日分析请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAnalysisRequest {
    pub date: NaiveDate,
    pub display_days: Vec<u32>,
    pub show_difference: bool,
    pub show_games: bool,
    pub criteria: FilterCriteria,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub summary_selector: DateSelector,
    pub color_window_days: u32,
}

impl DayAnalysisRequest {
    /// 默认请求: 显示 7 日差枚,台号升序,7 日汇总
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            display_days: vec![7],
            show_difference: true,
            show_games: false,
            criteria: FilterCriteria::default(),
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
            summary_selector: DateSelector::default(),
            color_window_days: DEFAULT_COLOR_WINDOW_DAYS,
        }
    }

    /// 去重升序的显示窗口 (0 天的窗口丢弃)
    pub fn normalized_display_days(&self) -> Vec<u32> {
        self.display_days
            .iter()
            .copied()
            .filter(|d| *d > 0)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 本次请求需要的差枚窗口: 显示 + 筛选 + 排序键
    fn difference_windows(&self) -> BTreeSet<u32> {
        let mut days = self.criteria.required_difference_windows();
        if self.show_difference {
            days.extend(self.normalized_display_days());
        }
        if let Some((Metric::DifferenceCount, n)) = self.sort_key.window() {
            days.insert(n);
        }
        days
    }

    /// 本次请求需要的 G 数窗口
    fn game_count_windows(&self) -> BTreeSet<u32> {
        let mut days = self.criteria.required_game_count_windows();
        if self.show_games {
            days.extend(self.normalized_display_days());
        }
        if let Some((Metric::GameCount, n)) = self.sort_key.window() {
            days.insert(n);
        }
        days
    }
}

// ==========================================
// DayAnalysis - 单日分析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAnalysis {
    pub date: NaiveDate,
    pub data_exists: bool,
    pub reference_date: Option<NaiveDate>,
    pub display_days: Vec<u32>,

    /// 筛选+排序后的台列表
    pub records: Vec<MachineRecord>,
    /// 未筛选的当日台列表 (布局图使用)
    pub all_records: Vec<MachineRecord>,

    pub tables: WindowTables,
    pub daily_summaries: Vec<DailySummary>,
    pub model_stats: Vec<ModelStats>,
    pub filtered_summary: Option<FilteredSummary>,
    pub machine_names: Vec<String>,
    pub color_ranks: ColorRanks,
}

// ==========================================
// DayAnalyzer - 单日分析编排器
// ==========================================
pub struct DayAnalyzer {
    sorter: SortEngine,
    summaries: DailySummaryBuilder,
    colors: WorstRankColorMapper,
}

impl DayAnalyzer {
    pub fn new() -> Self {
        Self {
            sorter: SortEngine::new(),
            summaries: DailySummaryBuilder::new(),
            colors: WorstRankColorMapper::new(),
        }
    }

    /// 执行单日分析
    ///
    /// # 参数
    /// - history: 店铺已加载的历史数据 (至少覆盖请求需要的窗口)
    /// - request: 分析请求
    #[instrument(skip(self, history, request), fields(date = %request.date))]
    pub fn analyze(&self, history: &HallHistory, request: &DayAnalysisRequest) -> DayAnalysis {
        // ==========================================
        // 步骤1: 参考日解析
        // ==========================================
        let resolved = ResolvedDay::resolve(history, request.date);
        let machine_names = resolved
            .names_date()
            .map(|d| history.machine_names_on(d))
            .unwrap_or_default();

        // ==========================================
        // 步骤2: 窗口合计/排名表 (以请求日为参考日)
        // ==========================================
        let tables = WindowTables::compute(
            history,
            request.date,
            &resolved.records,
            &request.difference_windows(),
            &request.game_count_windows(),
        );

        // ==========================================
        // 步骤3: 筛选 + 排序
        // ==========================================
        let filtered = FilterPipeline::new(&request.criteria, &tables).run(&resolved.records);
        let summary = filtered_summary(&filtered);
        let records = self.sorter.sort(
            filtered,
            request.sort_key,
            request.sort_direction,
            &tables,
        );
        debug!(total = resolved.records.len(), shown = records.len(), "筛选排序完成");

        // ==========================================
        // 步骤4: 日次汇总 / 机种别统计 / 着色排名
        // ==========================================
        let daily_summaries = self.summaries.build(
            history,
            request.date,
            &request.summary_selector,
            &request.criteria,
        );
        let stats = model_stats(&resolved.records);
        let color_ranks = self
            .colors
            .compute(history, request.date, request.color_window_days);

        info!(
            data_exists = resolved.data_exists,
            reference_date = ?resolved.reference_date,
            shown = records.len(),
            summaries = daily_summaries.len(),
            "单日分析完成"
        );

        DayAnalysis {
            date: request.date,
            data_exists: resolved.data_exists,
            reference_date: resolved.reference_date,
            display_days: request.normalized_display_days(),
            records,
            all_records: resolved.records,
            tables,
            daily_summaries,
            model_stats: stats,
            filtered_summary: summary,
            machine_names,
            color_ranks,
        }
    }
}

impl Default for DayAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
