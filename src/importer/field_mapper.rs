// ==========================================
// 遊技ホール台データ分析 - 字段映射器
// ==========================================
// 职责: 源列 → RawMachineRow 映射 + 数值转换
// 规则: 数值可带 "+" 号与千位分隔符 ","; 空白计数视为 0; 台号/机种名必填
// ==========================================

use crate::domain::machine::RawMachineRow;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

/// 标准列名
pub mod columns {
    pub const MACHINE_NAME: &str = "machine_name";
    pub const MACHINE_NUMBER: &str = "machine_number";
    pub const GAME_COUNT: &str = "game_count";
    pub const DIFFERENCE_COUNT: &str = "difference_count";
    pub const BB_COUNT: &str = "bb_count";
    pub const RB_COUNT: &str = "rb_count";
    pub const ART_COUNT: &str = "art_count";

    pub const REQUIRED: [&str; 2] = [MACHINE_NAME, MACHINE_NUMBER];
}

pub struct FieldMapper;

impl FieldMapper {
    /// 校验表头包含必需列
    pub fn check_headers(&self, headers: &[String]) -> ImportResult<()> {
        for required in columns::REQUIRED {
            if !headers.iter().any(|h| h == required) {
                return Err(ImportError::MissingColumn(required.to_string()));
            }
        }
        Ok(())
    }

    /// 映射一行
    ///
    /// # 参数
    /// - row: 列名 → 原始值
    /// - row_number: 数据行号 (1 起,不含表头)
    pub fn map_to_raw_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawMachineRow> {
        let machine_name = row
            .get(columns::MACHINE_NAME)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ImportError::TypeConversionError {
                row: row_number,
                field: columns::MACHINE_NAME.to_string(),
                message: "机种名为空".to_string(),
            })?;

        let machine_number = self
            .parse_count(row, columns::MACHINE_NUMBER, row_number)?
            .ok_or_else(|| ImportError::TypeConversionError {
                row: row_number,
                field: columns::MACHINE_NUMBER.to_string(),
                message: "台号为空".to_string(),
            })?;
        let machine_number =
            i32::try_from(machine_number).map_err(|_| ImportError::TypeConversionError {
                row: row_number,
                field: columns::MACHINE_NUMBER.to_string(),
                message: format!("台号超出范围: {}", machine_number),
            })?;

        let count = |field: &str| -> ImportResult<i64> {
            Ok(self.parse_count(row, field, row_number)?.unwrap_or(0))
        };

        Ok(RawMachineRow {
            machine_name,
            machine_number,
            game_count: count(columns::GAME_COUNT)?,
            difference_count: count(columns::DIFFERENCE_COUNT)?,
            bb_count: count(columns::BB_COUNT)?,
            rb_count: count(columns::RB_COUNT)?,
            art_count: count(columns::ART_COUNT)?,
        })
    }

    /// 解析整数列; 列缺失或空白 → None
    fn parse_count(
        &self,
        row: &HashMap<String, String>,
        field: &str,
        row_number: usize,
    ) -> ImportResult<Option<i64>> {
        let Some(raw) = row.get(field) else {
            return Ok(None);
        };
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ',' && *c != '+')
            .collect();
        if cleaned.is_empty() {
            return Ok(None);
        }
        cleaned
            .parse::<i64>()
            .map(Some)
            .map_err(|e| ImportError::TypeConversionError {
                row: row_number,
                field: field.to_string(),
                message: format!("{} ({})", e, raw),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_signs_and_separators() {
        let mapped = FieldMapper
            .map_to_raw_row(
                &row(&[
                    ("machine_name", " Alpha "),
                    ("machine_number", "105"),
                    ("game_count", "7,210"),
                    ("difference_count", "+1,250"),
                    ("bb_count", ""),
                    ("rb_count", "3"),
                ]),
                1,
            )
            .unwrap();
        assert_eq!(mapped.machine_name, "Alpha");
        assert_eq!(mapped.machine_number, 105);
        assert_eq!(mapped.game_count, 7210);
        assert_eq!(mapped.difference_count, 1250);
        assert_eq!(mapped.bb_count, 0);
        assert_eq!(mapped.art_count, 0);
    }

    #[test]
    fn test_negative_difference_and_bad_number() {
        let ok = FieldMapper
            .map_to_raw_row(
                &row(&[("machine_name", "A"), ("machine_number", "1"), ("difference_count", "-2,400")]),
                1,
            )
            .unwrap();
        assert_eq!(ok.difference_count, -2400);

        let err = FieldMapper
            .map_to_raw_row(&row(&[("machine_name", "A"), ("machine_number", "x1")]), 4)
            .unwrap_err();
        assert!(matches!(err, ImportError::TypeConversionError { row: 4, .. }));
    }

    #[test]
    fn test_missing_required_header() {
        let headers = vec!["machine_name".to_string(), "game_count".to_string()];
        assert!(matches!(
            FieldMapper.check_headers(&headers),
            Err(ImportError::MissingColumn(c)) if c == "machine_number"
        ));
    }
}
