// ==========================================
// 遊技ホール台数据 - 台数据领域模型
// ==========================================
// 唯一性: (hall_id, date, machine_number) 至多一条
// 生命周期: 导入时整日替换; 之后仅备注字段可修改; 聚合永不回写
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::Metric;

// ==========================================
// MachineRecord - 单台单日数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecord {
    // ===== 主键 =====
    pub hall_id: i64,
    pub date: NaiveDate,
    pub machine_number: i32,

    // ===== 机种 =====
    pub machine_name: String,

    // ===== 指标 =====
    pub game_count: i64,       // G数
    pub difference_count: i64, // 差枚
    pub bb_count: i64,
    pub rb_count: i64,
    pub art_count: i64,

    // ===== 备注 =====
    pub date_memo: Option<String>,
    pub machine_memo: Option<String>,
}

impl MachineRecord {
    /// 读取指定指标的值
    pub fn metric(&self, metric: Metric) -> i64 {
        match metric {
            Metric::GameCount => self.game_count,
            Metric::DifferenceCount => self.difference_count,
        }
    }

    /// 是否为正收支 (差枚 > 0)
    pub fn is_win(&self) -> bool {
        self.difference_count > 0
    }

    /// 以参考日数据为模板,生成目标日的零值占位记录
    ///
    /// 台号/机种名沿用参考日,所有计数归零,备注为空。
    pub fn placeholder_for(&self, date: NaiveDate) -> Self {
        Self {
            hall_id: self.hall_id,
            date,
            machine_number: self.machine_number,
            machine_name: self.machine_name.clone(),
            game_count: 0,
            difference_count: 0,
            bb_count: 0,
            rb_count: 0,
            art_count: 0,
            date_memo: None,
            machine_memo: None,
        }
    }
}

// ==========================================
// RawMachineRow - 导入源的原始行
// ==========================================
// 导入协作方的输出契约: 尚未绑定店铺/日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMachineRow {
    pub machine_name: String,
    pub machine_number: i32,
    pub game_count: i64,
    pub difference_count: i64,
    pub bb_count: i64,
    pub rb_count: i64,
    pub art_count: i64,
}

impl RawMachineRow {
    /// 绑定店铺与日期,生成待落库记录
    pub fn into_record(self, hall_id: i64, date: NaiveDate) -> MachineRecord {
        MachineRecord {
            hall_id,
            date,
            machine_number: self.machine_number,
            machine_name: self.machine_name,
            game_count: self.game_count,
            difference_count: self.difference_count,
            bb_count: self.bb_count,
            rb_count: self.rb_count,
            art_count: self.art_count,
            date_memo: None,
            machine_memo: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MachineRecord {
        MachineRecord {
            hall_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            machine_number: 101,
            machine_name: "Alpha".to_string(),
            game_count: 5200,
            difference_count: -800,
            bb_count: 12,
            rb_count: 9,
            art_count: 0,
            date_memo: Some("event".to_string()),
            machine_memo: Some("watch".to_string()),
        }
    }

    #[test]
    fn test_metric_accessor() {
        let r = sample();
        assert_eq!(r.metric(Metric::GameCount), 5200);
        assert_eq!(r.metric(Metric::DifferenceCount), -800);
        assert!(!r.is_win());
    }

    #[test]
    fn test_placeholder_zeroes_counts() {
        let next = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let p = sample().placeholder_for(next);
        assert_eq!(p.date, next);
        assert_eq!(p.machine_number, 101);
        assert_eq!(p.machine_name, "Alpha");
        assert_eq!(p.game_count, 0);
        assert_eq!(p.difference_count, 0);
        assert_eq!(p.bb_count, 0);
        assert!(p.machine_memo.is_none());
    }
}
