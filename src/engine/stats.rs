// ==========================================
// 遊技ホール台データ分析 - 统计计算
// ==========================================
// 职责: 台数/平均差枚/平均 G 数/胜台数/胜率
// 规则: 平均值四舍五入到整数; 胜率为百分比保留 1 位小数
// ==========================================

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::machine::MachineRecord;
use crate::domain::summary::{DailySummary, FilteredSummary, ModelStats};

// ==========================================
// 基础汇总
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    count: usize,
    difference: i64,
    games: i64,
    wins: usize,
}

impl Totals {
    fn of<'a>(records: impl IntoIterator<Item = &'a MachineRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut t, r| {
            t.count += 1;
            t.difference += r.difference_count;
            t.games += r.game_count;
            if r.is_win() {
                t.wins += 1;
            }
            t
        })
    }

    fn avg_difference(&self) -> i64 {
        rounded_average(self.difference, self.count)
    }

    fn avg_games(&self) -> i64 {
        rounded_average(self.games, self.count)
    }

    fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.count)
    }
}

/// 四舍五入平均值; count=0 时为 0
pub fn rounded_average(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as i64
}

/// 胜率 (%),保留 1 位小数; total=0 时为 0
pub fn win_rate(wins: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (wins as f64 / total as f64 * 1000.0).round() / 10.0
}

/// 单日汇总; 记录为空时返回 None
pub fn summarize_day(date: NaiveDate, records: &[MachineRecord]) -> Option<DailySummary> {
    if records.is_empty() {
        return None;
    }
    let t = Totals::of(records);
    Some(DailySummary {
        date,
        machine_count: t.count,
        total_difference: t.difference,
        avg_difference: t.avg_difference(),
        avg_game_count: t.avg_games(),
        win_count: t.wins,
        win_rate: t.win_rate(),
    })
}

/// 筛选结果汇总; 记录为空时返回 None
pub fn filtered_summary(records: &[MachineRecord]) -> Option<FilteredSummary> {
    if records.is_empty() {
        return None;
    }
    let t = Totals::of(records);
    Some(FilteredSummary {
        count: t.count,
        avg_game_count: t.avg_games(),
        avg_difference: t.avg_difference(),
        win_count: t.wins,
        win_rate: t.win_rate(),
    })
}

/// 机种别统计,按平均差枚降序 (稳定: 同值按机种首次出现顺序),名次从 1 开始
pub fn model_stats(records: &[MachineRecord]) -> Vec<ModelStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&MachineRecord>> = HashMap::new();
    for r in records {
        let name = r.machine_name.as_str();
        groups
            .entry(name)
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push(r);
    }

    let mut stats: Vec<ModelStats> = order
        .into_iter()
        .map(|name| {
            let t = Totals::of(groups[name].iter().copied());
            ModelStats {
                rank: 0,
                machine_name: name.to_string(),
                machine_count: t.count,
                total_difference: t.difference,
                avg_difference: t.avg_difference(),
                avg_game_count: t.avg_games(),
                win_count: t.wins,
                win_rate: t.win_rate(),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.avg_difference.cmp(&a.avg_difference));
    for (idx, s) in stats.iter_mut().enumerate() {
        s.rank = idx + 1;
    }
    stats
}
