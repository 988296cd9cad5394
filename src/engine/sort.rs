// ==========================================
// 遊技ホール台データ分析 - 排序引擎
// ==========================================
// 职责: 按选定键与方向对台列表排序
// 红线: 稳定排序,同键记录在升序/降序下都保持输入顺序
// ==========================================

use tracing::{instrument, warn};

use crate::domain::machine::MachineRecord;
use crate::domain::types::{SortDirection, SortKey};
use crate::engine::window::{WindowSumMap, WindowTables};

// ==========================================
// SortValue - 解析后的排序值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue<'r> {
    Int(i64),
    Text(&'r str),
}

type KeyFn<'s> = Box<dyn for<'r> Fn(&'r MachineRecord) -> SortValue<'r> + 's>;

fn key_fn<'s, F>(f: F) -> KeyFn<'s>
where
    F: for<'r> Fn(&'r MachineRecord) -> SortValue<'r> + 's,
{
    Box::new(f)
}

// ==========================================
// SortEngine - 排序引擎
// ==========================================
pub struct SortEngine {
    // 无状态引擎
}

impl SortEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 排序台列表
    ///
    /// 窗口键 (diff_N / game_count_N) 从 `tables` 读取合计,缺失按 0;
    /// `tables` 中没有该窗口时整列按 0 处理 (结果等价于保持输入顺序)。
    #[instrument(skip(self, records, tables), fields(count = records.len()))]
    pub fn sort(
        &self,
        records: Vec<MachineRecord>,
        key: SortKey,
        direction: SortDirection,
        tables: &WindowTables,
    ) -> Vec<MachineRecord> {
        let empty = WindowSumMap::default();
        let window_sums = match key.window() {
            Some((metric, days)) => Some(tables.sums(metric, days).unwrap_or_else(|| {
                warn!(metric = %metric, days, "排序窗口未计算, 按 0 处理");
                &empty
            })),
            None => None,
        };

        // 键在进入排序前解析为单一取值函数
        let extract: KeyFn<'_> = match key {
            SortKey::MachineName => key_fn(|r| SortValue::Text(r.machine_name.as_str())),
            SortKey::MachineNumber => key_fn(|r| SortValue::Int(i64::from(r.machine_number))),
            SortKey::GameCount => key_fn(|r| SortValue::Int(r.game_count)),
            SortKey::DifferenceCount => key_fn(|r| SortValue::Int(r.difference_count)),
            SortKey::BbCount => key_fn(|r| SortValue::Int(r.bb_count)),
            SortKey::RbCount => key_fn(|r| SortValue::Int(r.rb_count)),
            SortKey::ArtCount => key_fn(|r| SortValue::Int(r.art_count)),
            SortKey::WindowDifference(_) | SortKey::WindowGameCount(_) => {
                let sums = window_sums.unwrap_or(&empty);
                key_fn(move |r| SortValue::Int(sums.get_or_zero(r.machine_number)))
            }
        };

        let mut keyed: Vec<(SortValue<'_>, usize)> = records
            .iter()
            .enumerate()
            .map(|(idx, r)| (extract(r), idx))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| match direction {
            SortDirection::Asc => a.cmp(b),
            SortDirection::Desc => b.cmp(a),
        });

        let order: Vec<usize> = keyed.into_iter().map(|(_, idx)| idx).collect();
        let mut slots: Vec<Option<MachineRecord>> = records.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}

impl Default for SortEngine {
    fn default() -> Self {
        Self::new()
    }
}
