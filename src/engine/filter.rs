// ==========================================
// 遊技ホール台データ分析 - 筛选管道
// ==========================================
// 职责: 按固定顺序依次应用各筛选阶段
// 输入: 台列表 + 筛选条件 + 窗口合计/排名表
// 输出: 保持相对顺序的幸存记录
// ==========================================
// 红线: 阶段顺序是可观察的契约,同机种台数阶段统计的是"前序阶段之后"剩余的台数
// 红线: 各阶段为纯函数,不修改输入
// ==========================================

use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::domain::filter::{FilterCriteria, IntRange, PastWindowRange};
use crate::domain::machine::MachineRecord;
use crate::domain::types::{Metric, NameSearchMode};
use crate::engine::rank::{ModelRanker, RankTable};
use crate::engine::window::{WindowSumMap, WindowTables};

// ==========================================
// FilterStage - 筛选阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    /// 1. 机种名完全一致
    ExactName,
    /// 2. 机种名包含/排除检索
    NameSearch,
    /// 3a. 当日 G 数区间
    GameCountRange,
    /// 3b. 当日差枚区间
    DifferenceRange,
    /// 3c. 当日 BB 数区间
    BonusCountRange,
    /// 4. 过去 N 日差枚合计区间
    PastDifference,
    /// 5. 过去 N 日 G 数合计区间
    PastGameCount,
    /// 6. 同机种台数区间 (基于当前已筛选列表)
    ModelCount,
    /// 7. 差枚 worst 排名集合
    RankSet,
}

/// 标准阶段顺序
pub const STANDARD_STAGE_ORDER: [FilterStage; 9] = [
    FilterStage::ExactName,
    FilterStage::NameSearch,
    FilterStage::GameCountRange,
    FilterStage::DifferenceRange,
    FilterStage::BonusCountRange,
    FilterStage::PastDifference,
    FilterStage::PastGameCount,
    FilterStage::ModelCount,
    FilterStage::RankSet,
];

// ==========================================
// RankBasis - 排名阶段的排名对象
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankBasis {
    /// 使用 `WindowTables` 中按当日全部台预先计算的排名
    #[default]
    FullDay,
    /// 对进入排名阶段的幸存台重新排名 (日次汇总)
    Survivors,
}

// ==========================================
// FilterPipeline - 筛选管道
// ==========================================
pub struct FilterPipeline<'a> {
    criteria: &'a FilterCriteria,
    tables: &'a WindowTables,
    stages: Vec<FilterStage>,
    rank_basis: RankBasis,
}

impl<'a> FilterPipeline<'a> {
    /// 以标准顺序构造
    ///
    /// `tables` 需包含 `criteria` 要求的窗口
    /// (见 `FilterCriteria::required_difference_windows` / `required_game_count_windows`)
    pub fn new(criteria: &'a FilterCriteria, tables: &'a WindowTables) -> Self {
        Self::with_stages(criteria, tables, STANDARD_STAGE_ORDER.to_vec())
    }

    /// 以显式阶段顺序构造
    pub fn with_stages(
        criteria: &'a FilterCriteria,
        tables: &'a WindowTables,
        stages: Vec<FilterStage>,
    ) -> Self {
        Self {
            criteria,
            tables,
            stages,
            rank_basis: RankBasis::FullDay,
        }
    }

    /// 指定排名阶段的排名对象
    pub fn with_rank_basis(mut self, basis: RankBasis) -> Self {
        self.rank_basis = basis;
        self
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// 依次执行全部阶段
    #[instrument(skip_all, fields(input = records.len()))]
    pub fn run(&self, records: &[MachineRecord]) -> Vec<MachineRecord> {
        let mut current: Vec<MachineRecord> = records.to_vec();
        for &stage in &self.stages {
            let before = current.len();
            current = self.apply_stage(stage, current);
            if current.len() != before {
                debug!(stage = ?stage, before, after = current.len(), "筛选阶段生效");
            }
        }
        current
    }

    /// 执行单个阶段; 条件未设置时原样返回
    pub fn apply_stage(&self, stage: FilterStage, records: Vec<MachineRecord>) -> Vec<MachineRecord> {
        let c = self.criteria;
        match stage {
            FilterStage::ExactName => match c.name.as_deref() {
                Some(name) => retain(records, |r| r.machine_name == name),
                None => records,
            },
            FilterStage::NameSearch => match c.name_search.as_deref() {
                Some(needle) => {
                    let include = c.name_search_mode == NameSearchMode::Include;
                    retain(records, |r| r.machine_name.contains(needle) == include)
                }
                None => records,
            },
            FilterStage::GameCountRange => range_stage(records, c.game_count, |r| r.game_count),
            FilterStage::DifferenceRange => {
                range_stage(records, c.difference, |r| r.difference_count)
            }
            FilterStage::BonusCountRange => range_stage(records, c.bonus_count, |r| r.bb_count),
            FilterStage::PastDifference => {
                self.past_window_stage(records, &c.past_difference, Metric::DifferenceCount)
            }
            FilterStage::PastGameCount => {
                self.past_window_stage(records, &c.past_game_count, Metric::GameCount)
            }
            FilterStage::ModelCount => model_count_stage(records, c.model_count),
            FilterStage::RankSet => self.rank_stage(records),
        }
    }

    fn past_window_stage(
        &self,
        records: Vec<MachineRecord>,
        condition: &PastWindowRange,
        metric: Metric,
    ) -> Vec<MachineRecord> {
        let Some(days) = condition.active_window() else {
            return records;
        };
        let empty = WindowSumMap::default();
        let sums = self.tables.sums(metric, days).unwrap_or_else(|| {
            warn!(metric = %metric, days, "窗口合计表缺失, 按全 0 处理");
            &empty
        });
        let range = condition.range;
        retain(records, |r| range.contains(sums.get_or_zero(r.machine_number)))
    }

    fn rank_stage(&self, records: Vec<MachineRecord>) -> Vec<MachineRecord> {
        let Some(days) = self.criteria.rank.active_window() else {
            return records;
        };
        let survivor_ranks: RankTable;
        let ranks = match self.rank_basis {
            RankBasis::FullDay => match self.tables.ranks(Metric::DifferenceCount, days) {
                Some(ranks) => ranks,
                None => {
                    warn!(days, "排名表缺失, 排名筛选结果为空");
                    return Vec::new();
                }
            },
            RankBasis::Survivors => {
                let empty = WindowSumMap::default();
                let sums = self
                    .tables
                    .sums(Metric::DifferenceCount, days)
                    .unwrap_or_else(|| {
                        warn!(days, "窗口合计表缺失, 按无记录处理");
                        &empty
                    });
                survivor_ranks = ModelRanker::new().rank_by_model(&records, sums);
                &survivor_ranks
            }
        };
        let accepted = &self.criteria.rank.accepted_ranks;
        retain(records, |r| {
            ranks
                .get(r.machine_number)
                .is_some_and(|rank| accepted.contains(&rank))
        })
    }
}

fn retain(
    mut records: Vec<MachineRecord>,
    keep: impl Fn(&MachineRecord) -> bool,
) -> Vec<MachineRecord> {
    records.retain(|r| keep(r));
    records
}

fn range_stage(
    records: Vec<MachineRecord>,
    range: IntRange,
    value: impl Fn(&MachineRecord) -> i64,
) -> Vec<MachineRecord> {
    if range.is_unbounded() {
        return records;
    }
    retain(records, |r| range.contains(value(r)))
}

/// 按"当前列表"中的同机种台数筛选
fn model_count_stage(records: Vec<MachineRecord>, range: IntRange) -> Vec<MachineRecord> {
    if range.is_unbounded() {
        return records;
    }
    let mut counts: HashMap<String, i64> = HashMap::new();
    for r in &records {
        *counts.entry(r.machine_name.clone()).or_insert(0) += 1;
    }
    retain(records, |r| range.contains(counts[&r.machine_name]))
}
