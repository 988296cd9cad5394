// ==========================================
// 遊技ホール台データ分析 - 店铺布局图
// ==========================================
// 格式: { "<row>_<col>": {"type": "empty" | "machine" | "wall" | "counter", ...} }
// 约束: 行列均为 1 起, 范围 [1, 100]
// 说明: machine 单元格对台号是弱引用,不是外键,可能指向当日无数据的台号
// ==========================================

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

/// 行/列上限
pub const MAX_GRID_SIZE: u32 = 100;

// ==========================================
// CellKey - 单元格坐标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub row: u32,
    pub col: u32,
}

impl CellKey {
    /// 构造坐标; 越界返回 None
    pub fn new(row: u32, col: u32) -> Option<Self> {
        let in_range = |v: u32| (1..=MAX_GRID_SIZE).contains(&v);
        if in_range(row) && in_range(col) {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 解析 "<row>_<col>"
    pub fn parse(key: &str) -> Option<Self> {
        let (row, col) = key.split_once('_')?;
        Self::new(row.trim().parse().ok()?, col.trim().parse().ok()?)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row, self.col)
    }
}

// ==========================================
// LayoutCell - 单元格内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutCell {
    #[default]
    Empty,
    Machine { machine_number: i32 },
    Wall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Counter {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl LayoutCell {
    pub fn machine_number(&self) -> Option<i32> {
        match self {
            LayoutCell::Machine { machine_number } => Some(*machine_number),
            _ => None,
        }
    }
}

// ==========================================
// HallLayout - 单元格映射
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HallLayout {
    cells: BTreeMap<CellKey, LayoutCell>,
}

impl HallLayout {
    /// 生成 rows x cols 的全空布局
    pub fn empty(rows: u32, cols: u32) -> Self {
        let mut cells = BTreeMap::new();
        for row in 1..=rows.min(MAX_GRID_SIZE) {
            for col in 1..=cols.min(MAX_GRID_SIZE) {
                cells.insert(CellKey { row, col }, LayoutCell::Empty);
            }
        }
        Self { cells }
    }

    /// 宽松解析 JSON 布局
    ///
    /// - 非对象 → 空布局
    /// - 坐标非法或越界的键 → 丢弃
    /// - 内容无法识别的单元格 → 丢弃
    pub fn from_json_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let mut cells = BTreeMap::new();
        for (raw_key, raw_cell) in obj {
            let Some(key) = CellKey::parse(raw_key) else {
                warn!(key = %raw_key, "布局单元格坐标非法, 已忽略");
                continue;
            };
            match serde_json::from_value::<LayoutCell>(raw_cell.clone()) {
                Ok(cell) => {
                    cells.insert(key, cell);
                }
                Err(e) => warn!(key = %raw_key, error = %e, "布局单元格内容无法识别, 已忽略"),
            }
        }
        Self { cells }
    }

    /// 从 JSON 文本解析; 文本损坏时返回空布局
    pub fn from_json_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(v) => Self::from_json_value(&v),
            Err(e) => {
                warn!(error = %e, "布局 JSON 解析失败");
                Self::default()
            }
        }
    }

    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        for (key, cell) in &self.cells {
            // LayoutCell 序列化不会失败
            if let Ok(v) = serde_json::to_value(cell) {
                obj.insert(key.to_string(), v);
            }
        }
        Value::Object(obj)
    }

    /// 调整行列数: 范围内保留原单元格,新增位置为 Empty,超出范围的丢弃
    pub fn resized(&self, rows: u32, cols: u32) -> Self {
        let mut out = Self::empty(rows, cols);
        for (key, cell) in &self.cells {
            if key.row <= rows && key.col <= cols {
                out.cells.insert(*key, cell.clone());
            }
        }
        out
    }

    /// 读取单元格; 未定义的位置视为 Empty
    pub fn get(&self, key: CellKey) -> LayoutCell {
        self.cells.get(&key).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, key: CellKey, cell: LayoutCell) {
        self.cells.insert(key, cell);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &LayoutCell)> {
        self.cells.iter()
    }

    /// 布局上出现的全部台号 (去重, 升序)
    pub fn machine_numbers(&self) -> Vec<i32> {
        self.cells
            .values()
            .filter_map(LayoutCell::machine_number)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Serialize for HallLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HallLayout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json_value(&value))
    }
}

// ==========================================
// ColorSettings - 着色设置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorCondition {
    /// 过去 7 日差枚阈值着色
    #[serde(rename = "past_7_diff")]
    Past7Diff,
    /// 机种内 7 日差枚 worst 排名着色
    #[serde(rename = "worst_7days")]
    Worst7Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSettings {
    #[serde(default = "default_condition")]
    pub condition: ColorCondition,
    #[serde(default = "default_threshold_red")]
    pub threshold_red: i64,
    #[serde(default = "default_threshold_green")]
    pub threshold_green: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_condition() -> ColorCondition {
    ColorCondition::Past7Diff
}

fn default_threshold_red() -> i64 {
    -5000
}

fn default_threshold_green() -> i64 {
    5000
}

fn default_enabled() -> bool {
    true
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            condition: default_condition(),
            threshold_red: default_threshold_red(),
            threshold_green: default_threshold_green(),
            enabled: default_enabled(),
        }
    }
}

impl ColorSettings {
    /// 宽松解析; 缺失字段取默认值, 整体损坏时返回默认设置
    pub fn from_json_str(raw: Option<&str>) -> Self {
        raw.filter(|s| !s.trim().is_empty())
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }
}

// ==========================================
// HallMap - 店铺布局图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallMap {
    pub map_id: i64,
    pub hall_id: i64,
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    pub layout: HallLayout,
    pub color_settings: ColorSettings,
}

/// 校验行列数
pub fn validate_grid_size(rows: u32, cols: u32) -> Result<(), String> {
    if !(1..=MAX_GRID_SIZE).contains(&rows) {
        return Err(format!("rows={} 超出范围 [1, {}]", rows, MAX_GRID_SIZE));
    }
    if !(1..=MAX_GRID_SIZE).contains(&cols) {
        return Err(format!("cols={} 超出范围 [1, {}]", cols, MAX_GRID_SIZE));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_key_bounds() {
        assert_eq!(CellKey::parse("3_4"), Some(CellKey { row: 3, col: 4 }));
        assert_eq!(CellKey::parse("0_4"), None);
        assert_eq!(CellKey::parse("3_101"), None);
        assert_eq!(CellKey::parse("3-4"), None);
        assert_eq!(CellKey { row: 10, col: 2 }.to_string(), "10_2");
    }

    #[test]
    fn test_layout_parse_variants() {
        let layout = HallLayout::from_json_value(&json!({
            "1_1": {"type": "machine", "machine_number": 105},
            "1_2": {"type": "wall", "label": "■"},
            "1_3": {"type": "counter"},
            "1_4": {"type": "empty"},
            "1_5": {"type": "machine"},
            "bad": {"type": "empty"},
            "2_1": {"type": "machine", "machine_number": 101},
            "2_2": {"type": "machine", "machine_number": 105}
        }));

        assert_eq!(layout.len(), 6);
        assert_eq!(
            layout.get(CellKey { row: 1, col: 2 }),
            LayoutCell::Wall { label: Some("■".to_string()) }
        );
        assert_eq!(layout.get(CellKey { row: 9, col: 9 }), LayoutCell::Empty);
        assert_eq!(layout.machine_numbers(), vec![101, 105]);
    }

    #[test]
    fn test_layout_json_shape() {
        let mut layout = HallLayout::empty(1, 2);
        layout.set(CellKey { row: 1, col: 2 }, LayoutCell::Machine { machine_number: 7 });
        assert_eq!(
            layout.to_json_value(),
            json!({
                "1_1": {"type": "empty"},
                "1_2": {"type": "machine", "machine_number": 7}
            })
        );
    }

    #[test]
    fn test_resized_keeps_cells_in_range() {
        let mut layout = HallLayout::empty(2, 2);
        layout.set(CellKey { row: 1, col: 1 }, LayoutCell::Machine { machine_number: 1 });
        layout.set(CellKey { row: 2, col: 2 }, LayoutCell::Machine { machine_number: 2 });
        let resized = layout.resized(1, 3);
        assert_eq!(resized.len(), 3);
        assert_eq!(resized.machine_numbers(), vec![1]);
    }

    #[test]
    fn test_corrupt_layout_is_empty() {
        assert!(HallLayout::from_json_str("not json").is_empty());
        assert!(HallLayout::from_json_str("[1,2]").is_empty());
    }

    #[test]
    fn test_color_settings_defaults() {
        let s = ColorSettings::from_json_str(Some(r#"{"condition":"worst_7days"}"#));
        assert_eq!(s.condition, ColorCondition::Worst7Days);
        assert_eq!(s.threshold_red, -5000);
        assert!(s.enabled);
        assert_eq!(ColorSettings::from_json_str(Some("{")), ColorSettings::default());
    }

    #[test]
    fn test_grid_size_validation() {
        assert!(validate_grid_size(10, 20).is_ok());
        assert!(validate_grid_size(0, 20).is_err());
        assert!(validate_grid_size(10, 101).is_err());
    }
}
