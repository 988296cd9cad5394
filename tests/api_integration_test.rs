// ==========================================
// API 集成测试
// ==========================================
// 测试目标: AppState 组装后的店铺/台数据/布局图 API
// ==========================================


use std::collections::HashMap;

use hall_telemetry::api::ApiError;
use hall_telemetry::app::AppState;
use hall_telemetry::config::config_keys;
use hall_telemetry::domain::{ColorCondition, ColorSettings, HallDraft, LayoutCell};
use hall_telemetry::engine::overlay::{COLOR_EMPTY, COLOR_MACHINE, COLOR_WALL, COLOR_WORST_1, COLOR_WORST_2};
use hall_telemetry::logging;
use test_helpers::{create_test_db, day, insert_test_config, seed_day};

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 店铺 + 5 日数据 (1..=5 日, 台 1..=4)
fn seeded_state() -> (tempfile::NamedTempFile, AppState, i64) {
    let (tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path.clone()).unwrap();
    let hall_id = state
        .hall_api
        .create_hall(&HallDraft {
            code: Some(12),
            name: "Hall".into(),
            memo: None,
        })
        .unwrap();
    for d in 1..=5 {
        let n = i64::from(d);
        seed_day(
            &db_path,
            hall_id,
            day(d),
            &[
                (1, "Alpha", 1000 * n, -100 * n),
                (2, "Alpha", 2000, 50 * n),
                (3, "Alpha", 3000, -300),
                (4, "Beta", 4000, 400),
            ],
        );
    }
    (tmp, state, hall_id)
}

#[tokio::test]
async fn test_analyze_day_with_filters_and_sort() {
    logging::init_test();
    let (_tmp, state, hall_id) = seeded_state();

    let analysis = state
        .machine_data_api
        .analyze_day(
            hall_id,
            day(5),
            &params(&[
                ("name", "Alpha"),
                ("sort", "diff_3"),
                ("order", "asc"),
                ("display_days", "3"),
                ("summary_range", "2"),
            ]),
        )
        .await
        .unwrap();

    assert!(analysis.data_exists);
    // 3 日窗口 [2, 4]: 台1 = -900, 台2 = 450, 台3 = -900 (稳定排序: 台1在前)
    let order: Vec<i32> = analysis.records.iter().map(|r| r.machine_number).collect();
    assert_eq!(order, vec![1, 3, 2]);
    assert_eq!(analysis.all_records.len(), 4);
    assert_eq!(analysis.machine_names, vec!["Alpha".to_string(), "Beta".to_string()]);
    assert_eq!(analysis.display_days, vec![3]);
    assert!(analysis.tables.difference.contains_key(&3));

    // 汇总: [3, 5] 三天, 均只统计 Alpha
    let dates: Vec<_> = analysis.daily_summaries.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![day(5), day(4), day(3)]);
    assert!(analysis.daily_summaries.iter().all(|s| s.machine_count == 3));

    let summary = analysis.filtered_summary.unwrap();
    assert_eq!(summary.count, 3);
    assert_eq!(summary.avg_game_count, (5000 + 2000 + 3000) / 3);
}

#[tokio::test]
async fn test_analyze_day_falls_back_and_uses_config_defaults() {
    let (tmp, state, hall_id) = seeded_state();
    insert_test_config(tmp.path().to_str().unwrap(), config_keys::DEFAULT_DISPLAY_DAYS, "3,7").unwrap();

    let analysis = state
        .machine_data_api
        .analyze_day(hall_id, day(6), &HashMap::new())
        .await
        .unwrap();
    assert!(!analysis.data_exists);
    assert_eq!(analysis.reference_date, Some(day(5)));
    assert_eq!(analysis.display_days, vec![3, 7]);
    assert!(analysis.records.iter().all(|r| r.difference_count == 0));

    let missing = state
        .machine_data_api
        .analyze_day(999, day(6), &HashMap::new())
        .await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_memos_and_date_overview() {
    let (_tmp, state, hall_id) = seeded_state();
    let api = &state.machine_data_api;

    api.update_machine_memo(hall_id, day(5), 1, Some(" watch ")).unwrap();
    assert_eq!(
        api.update_machine_memos(hall_id, day(5), &[(2, Some("a".into())), (3, Some(" ".into()))])
            .unwrap(),
        2
    );
    assert_eq!(api.update_date_memo(hall_id, day(4), Some("event")).unwrap(), 4);
    assert!(matches!(
        api.update_date_memo(hall_id, day(20), Some("x")),
        Err(ApiError::BusinessRuleViolation(_))
    ));

    let overview = state
        .hall_api
        .date_overview(hall_id, day(5), Some(day(3)), Some(day(6)))
        .unwrap();
    let dates: Vec<_> = overview.iter().map(|o| o.date).collect();
    assert_eq!(dates, vec![day(6), day(5), day(4), day(3)]);
    assert!(overview[0].summary.is_none());
    assert_eq!(overview[1].summary.as_ref().unwrap().machine_count, 4);
    assert_eq!(overview[2].date_memo.as_deref(), Some("event"));

    let analysis = api.analyze_day(hall_id, day(5), &HashMap::new()).await.unwrap();
    let memos: Vec<Option<&str>> = analysis
        .all_records
        .iter()
        .map(|r| r.machine_memo.as_deref())
        .collect();
    assert_eq!(memos, vec![Some("watch"), Some("a"), None, None]);

    // 默认区间: 一个月前到两天后
    let default_range = state.hall_api.date_overview(hall_id, day(20), None, None).unwrap();
    assert_eq!(default_range.first().unwrap().date, day(22));
    assert_eq!(
        default_range.last().unwrap().date,
        chrono::NaiveDate::from_ymd_opt(2025, 12, 20).unwrap()
    );
}

#[tokio::test]
async fn test_hall_map_overlay_colors() {
    let (_tmp, state, hall_id) = seeded_state();
    let maps = &state.hall_map_api;

    assert!(matches!(
        maps.create_map(hall_id, "1F", 0, 5).await,
        Err(ApiError::InvalidInput(_))
    ));
    let map_id = maps.create_map(hall_id, "1F", 2, 3).await.unwrap();
    maps.save_layout(
        map_id,
        r#"{
            "1_1": {"type": "machine", "machine_number": 1},
            "1_2": {"type": "machine", "machine_number": 3},
            "1_3": {"type": "machine", "machine_number": 2},
            "2_1": {"type": "wall", "label": "W"},
            "9_9": {"type": "machine", "machine_number": 4}
        }"#,
    )
    .unwrap();
    assert!(matches!(maps.save_layout(map_id, "not json"), Err(ApiError::ValidationError(_))));
    assert_eq!(maps.machine_numbers(map_id).unwrap(), vec![1, 2, 3]);

    maps.update_color_settings(
        map_id,
        &ColorSettings {
            condition: ColorCondition::Worst7Days,
            ..ColorSettings::default()
        },
    )
    .unwrap();

    // 7 日窗口 [1, 4] (截至 5 日前一天): 台1 = -1000, 台3 = -1200, 台2 = 500
    let overlay = maps.overlay(map_id, day(5)).await.unwrap();
    assert_eq!(overlay.cells.len(), 6);
    let cell = |key: &str| overlay.cells.iter().find(|c| c.key == key).unwrap();
    assert_eq!(cell("1_2").worst_rank, Some(1));
    assert_eq!(cell("1_2").background, COLOR_WORST_1);
    assert_eq!(cell("1_1").background, COLOR_WORST_2);
    assert_eq!(cell("1_3").worst_rank, Some(3));
    assert_eq!(cell("1_3").background, COLOR_MACHINE);
    assert_eq!(cell("1_1").record.as_ref().unwrap().game_count, 5000);
    assert_eq!(cell("2_1").background, COLOR_WALL);
    assert!(matches!(cell("2_1").cell, LayoutCell::Wall { .. }));
    assert_eq!(cell("2_2").background, COLOR_EMPTY);

    let copy = maps.duplicate_map(map_id).unwrap();
    assert_eq!(maps.get_map(copy).unwrap().name, "1F copy");
    maps.delete_map(copy).unwrap();
    assert_eq!(maps.list_maps(hall_id).unwrap().len(), 1);
}

#[test]
fn test_hall_api_validation_and_delete() {
    let (_tmp, state, hall_id) = seeded_state();

    assert!(matches!(
        state.hall_api.create_hall(&HallDraft::default()),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        state.hall_api.create_hall(&HallDraft {
            code: Some(12),
            name: "Dup".into(),
            memo: None,
        }),
        Err(ApiError::BusinessRuleViolation(_))
    ));

    state.hall_api.delete_hall(hall_id).unwrap();
    assert!(matches!(state.hall_api.get_hall(hall_id), Err(ApiError::NotFound(_))));
}
