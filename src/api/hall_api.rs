// ==========================================
// 遊技ホール台データ分析 - 店铺 API
// ==========================================
// 职责: 店铺维护 + 日期一览 (每日汇总与日期备注)
// ==========================================

use std::sync::Arc;

use chrono::{Days, Months, NaiveDate};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::hall::{Hall, HallDraft};
use crate::domain::summary::DateOverview;
use crate::engine::stats::summarize_day;
use crate::engine::HallHistory;
use crate::repository::{HallRepository, MachineRecordRepository};

/// 日期一览默认向后展示的天数 (今天之后)
pub const OVERVIEW_DAYS_AHEAD: u64 = 2;

// ==========================================
// HallApi - 店铺 API
// ==========================================
pub struct HallApi {
    hall_repo: Arc<HallRepository>,
    record_repo: Arc<MachineRecordRepository>,
}

impl HallApi {
    pub fn new(hall_repo: Arc<HallRepository>, record_repo: Arc<MachineRecordRepository>) -> Self {
        Self {
            hall_repo,
            record_repo,
        }
    }

    // ==========================================
    // 维护接口
    // ==========================================

    /// 新建店铺, 返回 hall_id
    pub fn create_hall(&self, draft: &HallDraft) -> ApiResult<i64> {
        let draft = validate_draft(draft)?;
        let hall_id = self.hall_repo.create(&draft)?;
        info!(hall_id, name = %draft.name, "店铺已创建");
        Ok(hall_id)
    }

    pub fn update_hall(&self, hall_id: i64, draft: &HallDraft) -> ApiResult<()> {
        let draft = validate_draft(draft)?;
        self.hall_repo.update(hall_id, &draft)?;
        Ok(())
    }

    /// 删除店铺 (台数据与布局图级联删除)
    pub fn delete_hall(&self, hall_id: i64) -> ApiResult<()> {
        self.hall_repo.delete(hall_id)?;
        info!(hall_id, "店铺已删除");
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_hall(&self, hall_id: i64) -> ApiResult<Hall> {
        self.hall_repo
            .find_by_id(hall_id)?
            .ok_or_else(|| ApiError::NotFound(format!("店铺(id={})不存在", hall_id)))
    }

    pub fn list_halls(&self) -> ApiResult<Vec<Hall>> {
        Ok(self.hall_repo.list_all()?)
    }

    /// 日期一览 (新→旧)
    ///
    /// # 参数
    /// - start/end: 未指定时为 [today - 1个月, today + 2天]
    ///
    /// 无数据的日期也列出, summary 为 None
    pub fn date_overview(
        &self,
        hall_id: i64,
        today: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Vec<DateOverview>> {
        self.get_hall(hall_id)?;

        let start = start
            .or_else(|| today.checked_sub_months(Months::new(1)))
            .unwrap_or(today);
        let end = end
            .or_else(|| today.checked_add_days(Days::new(OVERVIEW_DAYS_AHEAD)))
            .unwrap_or(today);
        if start > end {
            return Err(ApiError::InvalidInput(format!(
                "开始日期 {} 晚于结束日期 {}",
                start, end
            )));
        }

        let history =
            HallHistory::from_records(self.record_repo.find_by_date_range(hall_id, start, end)?);

        let overview = start
            .iter_days()
            .take_while(|d| *d <= end)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|date| {
                let records = history.records_on(date);
                DateOverview {
                    date,
                    summary: summarize_day(date, records),
                    // 记录按台号升序, 与库中日期备注的取法一致
                    date_memo: records.first().and_then(|r| r.date_memo.clone()),
                }
            })
            .collect();
        Ok(overview)
    }
}

/// 店铺输入校验: 名称必填, 代码非负
fn validate_draft(draft: &HallDraft) -> ApiResult<HallDraft> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("店铺名称不能为空".to_string()));
    }
    if let Some(code) = draft.code {
        if code < 0 {
            return Err(ApiError::InvalidInput(format!("店铺代码不能为负数: {}", code)));
        }
    }
    Ok(HallDraft {
        code: draft.code,
        name: name.to_string(),
        memo: draft
            .memo
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_draft() {
        let ok = validate_draft(&HallDraft {
            code: Some(12),
            name: "  Hall A ".into(),
            memo: Some(" ".into()),
        })
        .unwrap();
        assert_eq!(ok.name, "Hall A");
        assert_eq!(ok.memo, None);

        assert!(matches!(
            validate_draft(&HallDraft::default()),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_draft(&HallDraft { code: Some(-1), name: "x".into(), memo: None }),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
