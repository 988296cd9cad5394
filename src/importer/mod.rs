// ==========================================
// 遊技ホール台データ分析 - 导入层
// ==========================================
// 职责: 外部日数据导入,整日替换落库
// 支持: CSV 目录 (每店铺每日一个文件)
// ==========================================

// 模块声明
pub mod day_source_trait;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod machine_data_importer;

// 重导出核心类型
pub use day_source_trait::DaySource;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvDaySource, CsvParser};
pub use machine_data_importer::{
    BatchImportReport, DayImportOutcome, ImportUnit, MachineDataImporter, UnitFailure,
};
