// ==========================================
// 遊技ホール台データ分析 - 参考日解析
// ==========================================
// 职责: 请求日无数据时,回退到之前最近的有数据日期
// 红线: 参考日在请求开始时决定一次,显式向下传递,不使用全局可变状态
// ==========================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::domain::machine::MachineRecord;
use crate::engine::history::HallHistory;

// ==========================================
// ResolvedDay - 解析后的当日数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDay {
    /// 请求日
    pub date: NaiveDate,
    /// 请求日是否有数据
    pub data_exists: bool,
    /// 回退使用的参考日 (data_exists=false 且存在更早数据时)
    pub reference_date: Option<NaiveDate>,
    /// 当日记录; 回退时为零值占位记录
    pub records: Vec<MachineRecord>,
}

impl ResolvedDay {
    /// 解析请求日
    ///
    /// 1) 请求日有数据 → 直接使用
    /// 2) 否则找之前最近的有数据日 → 生成零值占位记录 (台号/机种名沿用)
    /// 3) 都没有 → 空
    pub fn resolve(history: &HallHistory, date: NaiveDate) -> Self {
        let current = history.records_on(date);
        if !current.is_empty() {
            return Self {
                date,
                data_exists: true,
                reference_date: None,
                records: current.to_vec(),
            };
        }

        match history.latest_date_before(date) {
            Some(reference) => {
                info!(date = %date, reference = %reference, "请求日无数据, 使用参考日");
                let records = history
                    .records_on(reference)
                    .iter()
                    .map(|r| r.placeholder_for(date))
                    .collect();
                Self {
                    date,
                    data_exists: false,
                    reference_date: Some(reference),
                    records,
                }
            }
            None => Self {
                date,
                data_exists: false,
                reference_date: None,
                records: Vec::new(),
            },
        }
    }

    /// 提供机种名分组的日期 (请求日或参考日)
    pub fn names_date(&self) -> Option<NaiveDate> {
        if self.data_exists {
            Some(self.date)
        } else {
            self.reference_date
        }
    }
}
