// ==========================================
// 遊技ホール台データ分析 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod hall_map_repo;
pub mod hall_repo;
pub mod machine_record_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use hall_map_repo::HallMapRepository;
pub use hall_repo::HallRepository;
pub use machine_record_repo::MachineRecordRepository;
