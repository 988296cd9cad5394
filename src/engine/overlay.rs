// ==========================================
// 遊技ホール台データ分析 - 布局图着色叠加
// ==========================================
// 职责: 把布局图的每个单元格解析为 (类型, 当日数据, worst 名次, 背景色)
// 说明: 布局图始终显示全部台,不受筛选影响
// 说明: machine 单元格的台号是弱引用,当日无该台记录时 record 为空
// ==========================================

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::layout::{CellKey, ColorCondition, ColorSettings, HallMap, LayoutCell};
use crate::domain::machine::MachineRecord;
use crate::engine::color_rank::ColorRanks;

// ===== 背景色 =====
pub const COLOR_WORST_1: &str = "FFCCCC";
pub const COLOR_WORST_2: &str = "CCFFCC";
pub const COLOR_MACHINE: &str = "F0F0F0";
pub const COLOR_WALL: &str = "333333";
pub const COLOR_COUNTER: &str = "FFC107";
pub const COLOR_EMPTY: &str = "FFFFFF";

// ==========================================
// OverlayCell - 叠加后的单元格
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayCell {
    pub key: String,
    pub row: u32,
    pub col: u32,
    pub cell: LayoutCell,
    pub record: Option<MachineRecord>,
    pub worst_rank: Option<u8>,
    pub past_difference: Option<i64>,
    pub background: &'static str,
}

// ==========================================
// MapOverlay - 整张图的叠加结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOverlay {
    pub map_id: i64,
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    pub color_settings: ColorSettings,
    pub cells: Vec<OverlayCell>,
}

/// 构建布局图叠加 (按行优先顺序输出全部 rows x cols 单元格)
pub fn build_overlay(
    map: &HallMap,
    settings: ColorSettings,
    records: &[MachineRecord],
    color: &ColorRanks,
) -> MapOverlay {
    let by_number: HashMap<i32, &MachineRecord> =
        records.iter().map(|r| (r.machine_number, r)).collect();

    let mut cells = Vec::with_capacity((map.rows * map.cols) as usize);
    for row in 1..=map.rows {
        for col in 1..=map.cols {
            let Some(key) = CellKey::new(row, col) else {
                continue;
            };
            let cell = map.layout.get(key);
            let number = cell.machine_number();
            let worst_rank = number.and_then(|n| color.ranks.get(n));
            let past_difference = number.and_then(|n| color.difference.get(n));

            cells.push(OverlayCell {
                key: key.to_string(),
                row,
                col,
                record: number.and_then(|n| by_number.get(&n).map(|r| (*r).clone())),
                background: background_for(&cell, &settings, worst_rank, past_difference),
                worst_rank,
                past_difference,
                cell,
            });
        }
    }

    MapOverlay {
        map_id: map.map_id,
        name: map.name.clone(),
        rows: map.rows,
        cols: map.cols,
        color_settings: settings,
        cells,
    }
}

/// 单元格背景色
///
/// machine:
/// - 着色关闭 → 中性色
/// - worst_7days: 名次 1 → 红, 名次 2 → 绿 (3..5 不着色)
/// - past_7_diff: 合计 <= 红阈值 → 红, >= 绿阈值 → 绿 (窗口内无记录不着色)
pub fn background_for(
    cell: &LayoutCell,
    settings: &ColorSettings,
    worst_rank: Option<u8>,
    past_difference: Option<i64>,
) -> &'static str {
    match cell {
        LayoutCell::Empty => COLOR_EMPTY,
        LayoutCell::Wall { .. } => COLOR_WALL,
        LayoutCell::Counter { .. } => COLOR_COUNTER,
        LayoutCell::Machine { .. } if !settings.enabled => COLOR_MACHINE,
        LayoutCell::Machine { .. } => match settings.condition {
            ColorCondition::Worst7Days => match worst_rank {
                Some(1) => COLOR_WORST_1,
                Some(2) => COLOR_WORST_2,
                _ => COLOR_MACHINE,
            },
            ColorCondition::Past7Diff => match past_difference {
                Some(v) if v <= settings.threshold_red => COLOR_WORST_1,
                Some(v) if v >= settings.threshold_green => COLOR_WORST_2,
                _ => COLOR_MACHINE,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::HallLayout;
    use crate::engine::history::HallHistory;
    use crate::engine::color_rank::WorstRankColorMapper;
    use crate::engine::test_support::{day, record};

    fn map() -> HallMap {
        let mut layout = HallLayout::empty(2, 2);
        layout.set(CellKey { row: 1, col: 1 }, LayoutCell::Machine { machine_number: 1 });
        layout.set(CellKey { row: 1, col: 2 }, LayoutCell::Machine { machine_number: 2 });
        layout.set(CellKey { row: 2, col: 1 }, LayoutCell::Machine { machine_number: 77 });
        layout.set(CellKey { row: 2, col: 2 }, LayoutCell::Wall { label: None });
        HallMap {
            map_id: 1,
            hall_id: 1,
            name: "Main".to_string(),
            rows: 2,
            cols: 2,
            layout,
            color_settings: ColorSettings::default(),
        }
    }

    fn color() -> (Vec<MachineRecord>, ColorRanks) {
        let history = HallHistory::from_records(vec![
            record(day(1), 1, "A", 0, -6000),
            record(day(1), 2, "A", 0, 6000),
            record(day(2), 1, "A", 100, 10),
            record(day(2), 2, "A", 100, 20),
        ]);
        let ranks = WorstRankColorMapper::new().compute(&history, day(2), 7);
        (history.records_on(day(2)).to_vec(), ranks)
    }

    #[test]
    fn test_worst_rank_colors() {
        let (records, ranks) = color();
        let settings = ColorSettings {
            condition: ColorCondition::Worst7Days,
            ..Default::default()
        };
        let overlay = build_overlay(&map(), settings, &records, &ranks);
        assert_eq!(overlay.cells.len(), 4);
        assert_eq!(overlay.cells[0].background, COLOR_WORST_1);
        assert_eq!(overlay.cells[1].background, COLOR_WORST_2);
        // 弱引用: 77 号无记录也无排名
        assert!(overlay.cells[2].record.is_none());
        assert_eq!(overlay.cells[2].background, COLOR_MACHINE);
        assert_eq!(overlay.cells[3].background, COLOR_WALL);
    }

    #[test]
    fn test_threshold_colors_and_disabled() {
        let (records, ranks) = color();
        let overlay = build_overlay(&map(), ColorSettings::default(), &records, &ranks);
        assert_eq!(overlay.cells[0].past_difference, Some(-6000));
        assert_eq!(overlay.cells[0].background, COLOR_WORST_1);
        assert_eq!(overlay.cells[1].background, COLOR_WORST_2);

        let disabled = ColorSettings {
            enabled: false,
            ..Default::default()
        };
        let overlay = build_overlay(&map(), disabled, &records, &ranks);
        assert_eq!(overlay.cells[0].background, COLOR_MACHINE);
        assert_eq!(overlay.cells[0].key, "1_1");
    }
}
