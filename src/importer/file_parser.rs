// ==========================================
// 遊技ホール台データ分析 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv),首行为表头
// 文件命名: <dir>/<YYYY-MM-DD>-<hall_code>.csv
// ==========================================

use crate::domain::machine::RawMachineRow;
use crate::importer::day_source_trait::DaySource;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 读取 CSV 为 (表头, 行映射列表)
    pub fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> ImportResult<(Vec<String>, Vec<HashMap<String, String>>)> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 打开 CSV 文件
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok((headers, records))
    }
}

// ==========================================
// CsvDaySource - 目录中的每日 CSV 文件
// ==========================================
pub struct CsvDaySource {
    dir: PathBuf,
    parser: CsvParser,
    mapper: FieldMapper,
}

impl CsvDaySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            parser: CsvParser,
            mapper: FieldMapper,
        }
    }

    /// 某店铺某日对应的文件路径
    pub fn file_path(&self, hall_code: i64, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}-{}.csv", date.format("%Y-%m-%d"), hall_code))
    }

    /// 同步读取并映射 (供 async 实现与测试复用)
    pub fn read_day(&self, hall_code: i64, date: NaiveDate) -> ImportResult<Vec<RawMachineRow>> {
        let path = self.file_path(hall_code, date);
        let (headers, rows) = self.parser.parse_to_raw_records(&path)?;
        if rows.is_empty() {
            debug!(path = %path.display(), "CSV 无数据行");
            return Ok(Vec::new());
        }
        self.mapper.check_headers(&headers)?;

        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.mapper.map_to_raw_row(row, idx + 1))
            .collect()
    }
}

#[async_trait]
impl DaySource for CsvDaySource {
    async fn fetch_day(&self, hall_code: i64, date: NaiveDate) -> ImportResult<Vec<RawMachineRow>> {
        self.read_day(hall_code, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, body: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_read_day_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "2026-01-05-12.csv",
            "machine_name,machine_number,game_count,difference_count,bb_count,rb_count,art_count\n\
             Alpha,101,\"5,120\",+800,12,3,0\n\
             ,,,,,,\n\
             Beta,102,900,-1200,1,0,0\n",
        );
        let source = CsvDaySource::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let rows = source.read_day(12, date).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].game_count, 5120);
        assert_eq!(rows[0].difference_count, 800);
        assert_eq!(rows[1].difference_count, -1200);
    }

    #[test]
    fn test_header_only_file_is_empty_and_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "2026-01-06-12.csv", "machine_name,machine_number\n");
        let source = CsvDaySource::new(dir.path());

        let d6 = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        assert!(source.read_day(12, d6).unwrap().is_empty());

        let d7 = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        assert!(matches!(source.read_day(12, d7), Err(ImportError::FileNotFound(_))));
    }
}
