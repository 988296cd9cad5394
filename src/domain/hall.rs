// ==========================================
// 遊技ホール台データ分析 - 店铺领域模型
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Hall - 店铺
// ==========================================
// code: 外部数据源使用的店铺代码 (导入时按 code 查找)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    pub hall_id: i64,
    pub code: Option<i64>,
    pub name: String,
    pub memo: Option<String>,
}

/// 新建/更新店铺的输入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallDraft {
    pub code: Option<i64>,
    pub name: String,
    pub memo: Option<String>,
}
