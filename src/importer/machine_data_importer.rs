// ==========================================
// 遊技ホール台データ分析 - 台数据导入器
// ==========================================
// 职责: 日数据源 → 整日替换落库
// 流程: 店铺解析 (按 code) → 取数 → 绑定店铺/日期 → 事务替换
// ==========================================
// 批量: (店铺, 日期) 单元严格顺序执行,单元之间固定等待
// 批量: 单元失败只记录,不重试,不影响后续单元
// ==========================================

use crate::config::{config_keys, AnalysisConfigReader};
use crate::importer::day_source_trait::DaySource;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{HallRepository, MachineRecordRepository};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 导入单元与结果
// ==========================================

/// 一个导入单元: 店铺代码 + 营业日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportUnit {
    pub hall_code: i64,
    pub date: NaiveDate,
}

/// 单日导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayImportOutcome {
    pub hall_id: i64,
    pub hall_code: i64,
    pub date: NaiveDate,
    /// 写入的台数 (0 表示数据源无数据,已有数据保持不变)
    pub imported: usize,
}

/// 失败单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: ImportUnit,
    pub message: String,
}

/// 批量导入报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchImportReport {
    pub batch_id: String,
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub imported_records: usize,
    pub failures: Vec<UnitFailure>,
}

// ==========================================
// MachineDataImporter - 台数据导入器
// ==========================================
pub struct MachineDataImporter<S, C>
where
    S: DaySource,
    C: AnalysisConfigReader,
{
    // 数据访问层
    hall_repo: Arc<HallRepository>,
    record_repo: Arc<MachineRecordRepository>,

    // 数据源
    source: S,

    // 配置读取器
    config: Arc<C>,
}

impl<S, C> MachineDataImporter<S, C>
where
    S: DaySource,
    C: AnalysisConfigReader,
{
    /// 创建新的导入器实例
    pub fn new(
        hall_repo: Arc<HallRepository>,
        record_repo: Arc<MachineRecordRepository>,
        source: S,
        config: Arc<C>,
    ) -> Self {
        Self {
            hall_repo,
            record_repo,
            source,
            config,
        }
    }

    /// 导入单个 (店铺, 日期)
    ///
    /// # 返回
    /// - Ok(DayImportOutcome): imported=0 时数据源无数据,库中原有数据不变
    /// - Err: 店铺不存在 / 数据源失败 / 落库失败
    #[instrument(skip(self))]
    pub async fn import_day(&self, hall_code: i64, date: NaiveDate) -> ImportResult<DayImportOutcome> {
        let hall = self
            .hall_repo
            .find_by_code(hall_code)?
            .ok_or(ImportError::HallNotFound(hall_code))?;

        let rows = self.source.fetch_day(hall_code, date).await?;
        if rows.is_empty() {
            info!(hall_id = hall.hall_id, date = %date, "数据源无数据, 跳过替换");
            return Ok(DayImportOutcome {
                hall_id: hall.hall_id,
                hall_code,
                date,
                imported: 0,
            });
        }

        let records: Vec<_> = rows
            .into_iter()
            .map(|row| row.into_record(hall.hall_id, date))
            .collect();
        let imported = self.record_repo.replace_day(hall.hall_id, date, &records)?;

        info!(hall_id = hall.hall_id, date = %date, imported, "单日导入完成");
        Ok(DayImportOutcome {
            hall_id: hall.hall_id,
            hall_code,
            date,
            imported,
        })
    }

    /// 批量导入 (顺序执行, 单元间等待 import_delay_ms)
    ///
    /// # 返回
    /// - Ok(BatchImportReport): 成功/失败计数与失败明细
    /// - Err: 仅配置读取失败
    #[instrument(skip(self, units), fields(batch_id = tracing::field::Empty, total = units.len()))]
    pub async fn batch_import(&self, units: Vec<ImportUnit>) -> ImportResult<BatchImportReport> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let delay_ms = self
            .config
            .get_import_delay_ms()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: config_keys::IMPORT_DELAY_MS.to_string(),
                message: e.to_string(),
            })?;
        let delay = Duration::from_millis(delay_ms);

        info!(batch_id = %batch_id, total = units.len(), delay_ms, "开始批量导入");

        let mut report = BatchImportReport {
            batch_id,
            total: units.len(),
            success_count: 0,
            error_count: 0,
            imported_records: 0,
            failures: Vec::new(),
        };

        for (idx, unit) in units.into_iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.import_day(unit.hall_code, unit.date).await {
                Ok(outcome) => {
                    report.success_count += 1;
                    report.imported_records += outcome.imported;
                }
                Err(e) => {
                    error!(hall_code = unit.hall_code, date = %unit.date, error = %e, "导入单元失败");
                    report.error_count += 1;
                    report.failures.push(UnitFailure {
                        unit,
                        message: e.to_string(),
                    });
                }
            }
        }

        if report.error_count > 0 {
            warn!(
                batch_id = %report.batch_id,
                success = report.success_count,
                errors = report.error_count,
                "批量导入部分失败"
            );
        } else {
            info!(batch_id = %report.batch_id, success = report.success_count, "批量导入完成");
        }
        Ok(report)
    }
}
