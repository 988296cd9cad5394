// ==========================================
// 遊技ホール台データ分析 - 店铺历史数据快照
// ==========================================
// 职责: 把一个店铺已加载的台数据按日期索引,供引擎按日期/区间读取
// 红线: 只读快照,引擎内不做 I/O
// ==========================================

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::machine::MachineRecord;

// ==========================================
// HallHistory - 单店铺的按日索引数据
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HallHistory {
    by_date: BTreeMap<NaiveDate, Vec<MachineRecord>>,
}

impl HallHistory {
    /// 从记录集合构造; 每日内部按台号升序 (稳定)
    pub fn from_records(records: impl IntoIterator<Item = MachineRecord>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<MachineRecord>> = BTreeMap::new();
        for record in records {
            by_date.entry(record.date).or_default().push(record);
        }
        for day in by_date.values_mut() {
            day.sort_by_key(|r| r.machine_number);
        }
        Self { by_date }
    }

    /// 指定日期的记录 (无数据时为空切片)
    pub fn records_on(&self, date: NaiveDate) -> &[MachineRecord] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_records_on(&self, date: NaiveDate) -> bool {
        !self.records_on(date).is_empty()
    }

    /// 闭区间 [start, end] 内的全部记录; start > end 时为空
    pub fn records_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &MachineRecord> + '_ {
        let days: Vec<&Vec<MachineRecord>> = if start > end {
            Vec::new()
        } else {
            self.by_date.range(start..=end).map(|(_, v)| v).collect()
        };
        days.into_iter().flatten()
    }

    /// 早于 date 的最近一个有数据的日期
    pub fn latest_date_before(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.by_date
            .range(..date)
            .rev()
            .find(|(_, v)| !v.is_empty())
            .map(|(d, _)| *d)
    }

    /// 闭区间 [start, end] 内有数据的日期 (降序); start > end 时为空
    pub fn dates_between_desc(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }
        self.by_date
            .range(start..=end)
            .rev()
            .filter(|(_, v)| !v.is_empty())
            .map(|(d, _)| *d)
            .collect()
    }

    /// 日号属于 days 且不晚于 end 的有数据日期 (降序)
    pub fn dates_with_day_of_month(&self, days: &[u32], end: NaiveDate) -> Vec<NaiveDate> {
        self.by_date
            .range(..=end)
            .rev()
            .filter(|(d, v)| !v.is_empty() && days.contains(&d.day()))
            .map(|(d, _)| *d)
            .collect()
    }

    /// 指定日期出现的机种名 (去重, 升序)
    pub fn machine_names_on(&self, date: NaiveDate) -> Vec<String> {
        self.records_on(date)
            .iter()
            .map(|r| r.machine_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }
}
