// ==========================================
// 遊技ホール台データ分析 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行与外部调用
// ==========================================

pub mod error;
pub mod hall_api;
pub mod hall_map_api;
pub mod machine_data_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use hall_api::HallApi;
pub use hall_map_api::HallMapApi;
pub use machine_data_api::{build_request, param_keys, AnalysisDefaults, MachineDataApi};
