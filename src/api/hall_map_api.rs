// ==========================================
// 遊技ホール台データ分析 - 布局图 API
// ==========================================
// 职责: 布局图维护 (新建/改名改尺寸/复制/删除/布局/着色设置) + 单日叠加着色
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::api::error::{config_error, ApiError, ApiResult};
use crate::config::{AnalysisConfigReader, ConfigManager};
use crate::domain::layout::{validate_grid_size, ColorSettings, HallLayout, HallMap};
use crate::engine::{build_overlay, HallHistory, MapOverlay, ResolvedDay, WorstRankColorMapper};
use crate::repository::{HallMapRepository, HallRepository, MachineRecordRepository};

// ==========================================
// HallMapApi - 布局图 API
// ==========================================
pub struct HallMapApi {
    hall_repo: Arc<HallRepository>,
    map_repo: Arc<HallMapRepository>,
    record_repo: Arc<MachineRecordRepository>,
    config: Arc<ConfigManager>,
    colors: WorstRankColorMapper,
}

impl HallMapApi {
    pub fn new(
        hall_repo: Arc<HallRepository>,
        map_repo: Arc<HallMapRepository>,
        record_repo: Arc<MachineRecordRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            hall_repo,
            map_repo,
            record_repo,
            config,
            colors: WorstRankColorMapper::new(),
        }
    }

    // ==========================================
    // 维护接口
    // ==========================================

    /// 新建布局图 (全部单元格为 empty, 着色设置取配置默认值)
    pub async fn create_map(&self, hall_id: i64, name: &str, rows: u32, cols: u32) -> ApiResult<i64> {
        if self.hall_repo.find_by_id(hall_id)?.is_none() {
            return Err(ApiError::NotFound(format!("店铺(id={})不存在", hall_id)));
        }
        let name = validate_name(name)?;
        validate_grid_size(rows, cols).map_err(ApiError::InvalidInput)?;

        let settings = self
            .config
            .get_default_color_settings()
            .await
            .map_err(config_error)?;

        let map_id = self.map_repo.create(hall_id, &name, rows, cols)?;
        self.map_repo.update_color_settings(map_id, &settings)?;
        info!(hall_id, map_id, rows, cols, "布局图已创建");
        Ok(map_id)
    }

    /// 改名 + 改尺寸; 超出新尺寸的单元格丢弃
    pub fn rename_resize(&self, map_id: i64, name: &str, rows: u32, cols: u32) -> ApiResult<()> {
        let name = validate_name(name)?;
        validate_grid_size(rows, cols).map_err(ApiError::InvalidInput)?;
        self.map_repo.rename_resize(map_id, &name, rows, cols)?;
        Ok(())
    }

    /// 保存布局 (JSON 文本)
    ///
    /// 无法识别的单元格按 empty 处理; 解析后为空的布局拒绝保存
    pub fn save_layout(&self, map_id: i64, layout_json: &str) -> ApiResult<()> {
        let map = self.get_map(map_id)?;
        let parsed = HallLayout::from_json_str(layout_json);
        if parsed.is_empty() {
            return Err(ApiError::ValidationError("布局数据为空, 拒绝保存".to_string()));
        }
        self.map_repo
            .update_layout(map_id, &parsed.resized(map.rows, map.cols))?;
        Ok(())
    }

    pub fn update_color_settings(&self, map_id: i64, settings: &ColorSettings) -> ApiResult<()> {
        if settings.threshold_red > settings.threshold_green {
            return Err(ApiError::InvalidInput(format!(
                "红色阈值 {} 大于绿色阈值 {}",
                settings.threshold_red, settings.threshold_green
            )));
        }
        self.map_repo.update_color_settings(map_id, settings)?;
        Ok(())
    }

    /// 复制布局图, 返回新 map_id
    pub fn duplicate_map(&self, map_id: i64) -> ApiResult<i64> {
        let new_id = self.map_repo.duplicate(map_id)?;
        info!(map_id, new_id, "布局图已复制");
        Ok(new_id)
    }

    pub fn delete_map(&self, map_id: i64) -> ApiResult<()> {
        self.map_repo.delete(map_id)?;
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_map(&self, map_id: i64) -> ApiResult<HallMap> {
        self.map_repo
            .find_by_id(map_id)?
            .ok_or_else(|| ApiError::NotFound(format!("布局图(id={})不存在", map_id)))
    }

    pub fn list_maps(&self, hall_id: i64) -> ApiResult<Vec<HallMap>> {
        Ok(self.map_repo.list_by_hall(hall_id)?)
    }

    /// 布局图中出现的台号 (升序)
    pub fn machine_numbers(&self, map_id: i64) -> ApiResult<Vec<i32>> {
        Ok(self.get_map(map_id)?.layout.machine_numbers())
    }

    /// 单日叠加: 布局 + 当日台数据 + 着色
    ///
    /// 当日无数据时沿用参考日的台号/机种 (零值占位)
    #[instrument(skip(self))]
    pub async fn overlay(&self, map_id: i64, date: NaiveDate) -> ApiResult<MapOverlay> {
        let map = self.get_map(map_id)?;
        let window_days = self
            .config
            .get_color_window_days()
            .await
            .map_err(config_error)?;

        let history = HallHistory::from_records(self.record_repo.find_by_hall(map.hall_id, date)?);
        let resolved = ResolvedDay::resolve(&history, date);
        let color = self.colors.compute(&history, date, window_days);

        Ok(build_overlay(&map, map.color_settings, &resolved.records, &color))
    }
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("布局图名称不能为空".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(" 1F ").unwrap(), "1F");
        assert!(matches!(validate_name("  "), Err(ApiError::InvalidInput(_))));
    }
}
