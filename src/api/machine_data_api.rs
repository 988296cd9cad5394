// ==========================================
// 遊技ホール台データ分析 - 台数据 API
// ==========================================
// 职责: 单日分析 (筛选/排序/窗口/汇总/着色) + 备注维护
// 边界: 请求参数在此解析一次,引擎只接收强类型请求
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::api::error::{config_error, ApiError, ApiResult};
use crate::config::{AnalysisConfigReader, ConfigManager};
use crate::domain::filter::FilterCriteria;
use crate::domain::types::{DateSelector, SortDirection, SortKey};
use crate::engine::{DayAnalysis, DayAnalysisRequest, DayAnalyzer, HallHistory};
use crate::repository::{HallRepository, MachineRecordRepository};

// ==========================================
// 请求参数键
// ==========================================
pub mod param_keys {
    pub const DISPLAY_DAYS: &str = "display_days"; // "7,14,30"
    pub const SHOW_DIFFERENCE: &str = "show_difference";
    pub const SHOW_GAMES: &str = "show_games";
    pub const SORT: &str = "sort";
    pub const ORDER: &str = "order";
    pub const SUMMARY_RANGE: &str = "summary_range";
    pub const CUSTOM_DATES: &str = "custom_dates"; // "2026-01-01,2026-01-07"
}

/// 未在请求中指定时使用的默认值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisDefaults {
    pub display_days: Vec<u32>,
    pub summary_range: String,
    pub color_window_days: u32,
}

/// 参数 → 单日分析请求
///
/// 布尔参数: "0" / "false" / "off" 为假, 缺失时差枚显示开启、G 数显示关闭
pub fn build_request(
    date: NaiveDate,
    params: &HashMap<String, String>,
    defaults: &AnalysisDefaults,
) -> DayAnalysisRequest {
    let get = |key: &str| params.get(key).map(String::as_str);

    let display_days = get(param_keys::DISPLAY_DAYS)
        .map(crate::config::config_manager::parse_days_list)
        .filter(|days| !days.is_empty())
        .unwrap_or_else(|| defaults.display_days.clone());

    let custom_dates: Vec<String> = get(param_keys::CUSTOM_DATES)
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let summary_token = get(param_keys::SUMMARY_RANGE)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(defaults.summary_range.as_str());

    DayAnalysisRequest {
        date,
        display_days,
        show_difference: parse_flag(get(param_keys::SHOW_DIFFERENCE), true),
        show_games: parse_flag(get(param_keys::SHOW_GAMES), false),
        criteria: FilterCriteria::from_params(params),
        sort_key: get(param_keys::SORT).map(SortKey::parse).unwrap_or_default(),
        sort_direction: SortDirection::parse(get(param_keys::ORDER)),
        summary_selector: DateSelector::parse(Some(summary_token), &custom_dates),
        color_window_days: defaults.color_window_days,
    }
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|s| s.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) => !matches!(v.as_str(), "0" | "false" | "off" | "no"),
    }
}

/// 备注规整: 去首尾空白, 空串视为清除
fn normalize_memo(memo: Option<&str>) -> Option<String> {
    memo.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

// ==========================================
// MachineDataApi - 台数据 API
// ==========================================
pub struct MachineDataApi {
    hall_repo: Arc<HallRepository>,
    record_repo: Arc<MachineRecordRepository>,
    config: Arc<ConfigManager>,
    analyzer: DayAnalyzer,
}

impl MachineDataApi {
    /// 创建新的 MachineDataApi 实例
    pub fn new(
        hall_repo: Arc<HallRepository>,
        record_repo: Arc<MachineRecordRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            hall_repo,
            record_repo,
            config,
            analyzer: DayAnalyzer::new(),
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 单日分析
    ///
    /// # 参数
    /// - hall_id: 店铺ID
    /// - date: 请求日 (无数据时回退到之前最近的有数据日)
    /// - params: 显示/筛选/排序/汇总参数 (键名见 param_keys 与 FilterCriteria::from_params)
    #[instrument(skip(self, params))]
    pub async fn analyze_day(
        &self,
        hall_id: i64,
        date: NaiveDate,
        params: &HashMap<String, String>,
    ) -> ApiResult<DayAnalysis> {
        self.ensure_hall(hall_id)?;

        let defaults = self.load_defaults().await?;
        let request = build_request(date, params, &defaults);

        // 自定义汇总日期可能晚于请求日, 历史需覆盖到最晚的日期
        let up_to = match &request.summary_selector {
            DateSelector::Custom { dates } => dates.iter().copied().fold(date, NaiveDate::max),
            _ => date,
        };
        let history = HallHistory::from_records(self.record_repo.find_by_hall(hall_id, up_to)?);
        debug!(hall_id, records = history.record_count(), "历史数据加载完成");

        let analysis = self.analyzer.analyze(&history, &request);
        info!(
            hall_id,
            date = %date,
            data_exists = analysis.data_exists,
            shown = analysis.records.len(),
            "单日分析完成"
        );
        Ok(analysis)
    }

    // ==========================================
    // 备注接口
    // ==========================================

    /// 更新单台备注; 空白备注视为清除
    pub fn update_machine_memo(
        &self,
        hall_id: i64,
        date: NaiveDate,
        machine_number: i32,
        memo: Option<&str>,
    ) -> ApiResult<()> {
        self.ensure_hall(hall_id)?;
        let memo = normalize_memo(memo);
        self.record_repo
            .update_machine_memo(hall_id, date, machine_number, memo.as_deref())?;
        Ok(())
    }

    /// 批量更新台备注, 返回更新的行数 (不存在的台号忽略)
    pub fn update_machine_memos(
        &self,
        hall_id: i64,
        date: NaiveDate,
        memos: &[(i32, Option<String>)],
    ) -> ApiResult<usize> {
        self.ensure_hall(hall_id)?;
        let normalized: Vec<(i32, Option<String>)> = memos
            .iter()
            .map(|(number, memo)| (*number, normalize_memo(memo.as_deref())))
            .collect();
        Ok(self.record_repo.update_machine_memos(hall_id, date, &normalized)?)
    }

    /// 更新日期备注 (写入该日全部台)
    ///
    /// 该日无数据时返回 BusinessRuleViolation
    pub fn update_date_memo(&self, hall_id: i64, date: NaiveDate, memo: Option<&str>) -> ApiResult<usize> {
        self.ensure_hall(hall_id)?;
        let memo = normalize_memo(memo);
        let updated = self.record_repo.update_date_memo(hall_id, date, memo.as_deref())?;
        if updated == 0 {
            return Err(ApiError::BusinessRuleViolation(format!(
                "{} 无台数据, 无法设置日期备注",
                date
            )));
        }
        Ok(updated)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn ensure_hall(&self, hall_id: i64) -> ApiResult<()> {
        match self.hall_repo.find_by_id(hall_id)? {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound(format!("店铺(id={})不存在", hall_id))),
        }
    }

    async fn load_defaults(&self) -> ApiResult<AnalysisDefaults> {
        Ok(AnalysisDefaults {
            display_days: self
                .config
                .get_default_display_days()
                .await
                .map_err(config_error)?,
            summary_range: self
                .config
                .get_default_summary_range()
                .await
                .map_err(config_error)?,
            color_window_days: self
                .config
                .get_color_window_days()
                .await
                .map_err(config_error)?,
        })
    }
}
