// ==========================================
// 遊技ホール台データ分析 - 日数据源 Trait
// ==========================================
// 职责: 定义"取某店铺某日全部台数据"的接口（不包含实现）
// 实现者: CsvDaySource; 测试中可替换为内存数据源
// ==========================================

use crate::domain::machine::RawMachineRow;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::NaiveDate;

// ==========================================
// DaySource Trait
// ==========================================
#[async_trait]
pub trait DaySource: Send + Sync {
    /// 获取店铺某日的原始台数据
    ///
    /// # 参数
    /// - hall_code: 外部数据源的店铺代码
    /// - date: 营业日
    ///
    /// # 返回
    /// - Ok(Vec<RawMachineRow>): 原始行 (可能为空,表示该日尚无数据)
    /// - Err: 读取/解析失败
    async fn fetch_day(&self, hall_code: i64, date: NaiveDate) -> ImportResult<Vec<RawMachineRow>>;
}
