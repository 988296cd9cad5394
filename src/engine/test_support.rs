// ==========================================
// 引擎单元测试辅助函数
// ==========================================

use chrono::NaiveDate;

use crate::domain::machine::MachineRecord;

/// 2026 年 1 月的第 n 日
pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, n).unwrap()
}

/// 构造测试用台数据 (hall_id=1, BB/RB/ART 为 0)
pub fn record(
    date: NaiveDate,
    machine_number: i32,
    machine_name: &str,
    game_count: i64,
    difference_count: i64,
) -> MachineRecord {
    MachineRecord {
        hall_id: 1,
        date,
        machine_number,
        machine_name: machine_name.to_string(),
        game_count,
        difference_count,
        bb_count: 0,
        rb_count: 0,
        art_count: 0,
        date_memo: None,
        machine_memo: None,
    }
}
