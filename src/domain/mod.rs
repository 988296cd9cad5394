// ==========================================
// 遊技ホール台データ分析 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod filter;
pub mod hall;
pub mod layout;
pub mod machine;
pub mod summary;
pub mod types;

// 重导出核心类型
pub use filter::{FilterCriteria, IntRange, PastWindowRange, RankCondition};
pub use hall::{Hall, HallDraft};
pub use layout::{CellKey, ColorCondition, ColorSettings, HallLayout, HallMap, LayoutCell};
pub use machine::{MachineRecord, RawMachineRow};
pub use summary::{DailySummary, DateOverview, FilteredSummary, ModelStats};
pub use types::{DateSelector, DayOfMonthPreset, Metric, NameSearchMode, SortDirection, SortKey};
