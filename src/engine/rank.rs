// ==========================================
// 遊技ホール台数据 - 机种内 worst 排名
// ==========================================
// 职责: 同机种名分组内,按窗口合计升序给前 5 台排名 1..5
// 红线: 不在合计表中的台号"排除"而非"排最后"
// 红线: 同值按输入顺序稳定 (先出现者名次更靠前)
// ==========================================

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

use crate::domain::machine::MachineRecord;
use crate::engine::window::WindowSumMap;

/// 每个机种分组内最多给出的名次
pub const MAX_RANK: u8 = 5;

// ==========================================
// RankTable - 台号 → 名次 (1..=5)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankTable(BTreeMap<i32, u8>);

impl RankTable {
    pub fn get(&self, machine_number: i32) -> Option<u8> {
        self.0.get(&machine_number).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, u8)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

// ==========================================
// ModelRanker - 机种内排名器
// ==========================================
pub struct ModelRanker {
    // 无状态引擎
}

impl ModelRanker {
    pub fn new() -> Self {
        Self {}
    }

    /// 按机种名分组排名
    ///
    /// 步骤:
    /// 1) 按 machine_name 分组 (分组内保持输入顺序)
    /// 2) 组内只保留在 sum_map 中有条目的台
    /// 3) 按合计升序稳定排序,前 5 台依次得到 1..5
    #[instrument(skip_all, fields(records = daily_records.len(), sums = sum_map.len()))]
    pub fn rank_by_model(&self, daily_records: &[MachineRecord], sum_map: &WindowSumMap) -> RankTable {
        let mut groups: HashMap<&str, Vec<(i32, i64)>> = HashMap::new();
        for r in daily_records {
            if let Some(total) = sum_map.get(r.machine_number) {
                groups
                    .entry(r.machine_name.as_str())
                    .or_default()
                    .push((r.machine_number, total));
            }
        }

        let mut ranks = BTreeMap::new();
        for members in groups.values_mut() {
            // sort_by_key 为稳定排序
            members.sort_by_key(|&(_, total)| total);
            for (rank, &(machine_number, _)) in (1..=MAX_RANK).zip(members.iter()) {
                ranks.insert(machine_number, rank);
            }
        }

        debug!(ranked = ranks.len(), groups = groups.len(), "机种内排名完成");
        RankTable(ranks)
    }
}

impl Default for ModelRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{day, record};

    fn sums(pairs: &[(i32, i64)]) -> WindowSumMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_six_alpha_machines_rank_top_five() {
        let totals = [-500, -300, -100, 0, 200, 400];
        // 输入顺序打乱,验证按合计而非台号排序
        let order = [5usize, 2, 0, 4, 1, 3];
        let records: Vec<_> = order
            .iter()
            .map(|&i| record(day(10), 100 + i as i32, "Alpha", 0, 0))
            .collect();
        let map = sums(
            &totals
                .iter()
                .enumerate()
                .map(|(i, &t)| (100 + i as i32, t))
                .collect::<Vec<_>>(),
        );

        let ranks = ModelRanker::new().rank_by_model(&records, &map);
        assert_eq!(ranks.get(100), Some(1)); // -500
        assert_eq!(ranks.get(101), Some(2)); // -300
        assert_eq!(ranks.get(102), Some(3)); // -100
        assert_eq!(ranks.get(103), Some(4)); // 0
        assert_eq!(ranks.get(104), Some(5)); // 200
        assert_eq!(ranks.get(105), None); // 400
    }

    #[test]
    fn test_absent_from_sum_map_is_excluded_not_last() {
        let records = vec![
            record(day(10), 1, "Beta", 0, 0),
            record(day(10), 2, "Beta", 0, 0),
        ];
        let ranks = ModelRanker::new().rank_by_model(&records, &sums(&[(2, 50)]));
        assert_eq!(ranks.get(2), Some(1));
        assert_eq!(ranks.get(1), None);
    }

    #[test]
    fn test_groups_ranked_independently() {
        let records = vec![
            record(day(10), 1, "A", 0, 0),
            record(day(10), 2, "B", 0, 0),
            record(day(10), 3, "A", 0, 0),
        ];
        let ranks = ModelRanker::new().rank_by_model(&records, &sums(&[(1, 10), (2, 999), (3, -10)]));
        assert_eq!(ranks.get(3), Some(1));
        assert_eq!(ranks.get(1), Some(2));
        assert_eq!(ranks.get(2), Some(1));
    }

    #[test]
    fn test_ties_follow_input_order() {
        let records = vec![
            record(day(10), 9, "A", 0, 0),
            record(day(10), 4, "A", 0, 0),
            record(day(10), 7, "A", 0, 0),
        ];
        let ranks = ModelRanker::new().rank_by_model(&records, &sums(&[(4, 0), (7, 0), (9, 0)]));
        assert_eq!(ranks.get(9), Some(1));
        assert_eq!(ranks.get(4), Some(2));
        assert_eq!(ranks.get(7), Some(3));
    }

    #[test]
    fn test_no_duplicate_ranks_within_group() {
        let records: Vec<_> = (1..=8).map(|n| record(day(10), n, "Gamma", 0, 0)).collect();
        let map = sums(&(1..=8).map(|n| (n, i64::from(n % 3))).collect::<Vec<_>>());
        let ranks = ModelRanker::new().rank_by_model(&records, &map);

        let mut given: Vec<u8> = ranks.iter().map(|(_, r)| r).collect();
        given.sort_unstable();
        assert_eq!(given, vec![1, 2, 3, 4, 5]);
    }
}
