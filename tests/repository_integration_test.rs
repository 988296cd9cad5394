// ==========================================
// Repository 集成测试
// ==========================================
// 测试目标: 店铺/台数据/布局图仓储在真实 SQLite 文件上的行为
// ==========================================


use hall_telemetry::domain::{ColorCondition, ColorSettings, HallDraft, HallLayout, LayoutCell};
use hall_telemetry::domain::layout::CellKey;
use hall_telemetry::repository::{
    HallMapRepository, HallRepository, MachineRecordRepository, RepositoryError,
};
use test_helpers::{create_test_db, day, record, seed_day, seed_hall};

#[test]
fn test_hall_crud_and_unique_code() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = HallRepository::new(&db_path).unwrap();

    let id = repo
        .create(&HallDraft {
            code: Some(100),
            name: "Hall A".into(),
            memo: None,
        })
        .unwrap();
    assert_eq!(repo.find_by_code(100).unwrap().unwrap().hall_id, id);

    let dup = repo.create(&HallDraft {
        code: Some(100),
        name: "Hall B".into(),
        memo: None,
    });
    assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));

    repo.update(
        id,
        &HallDraft {
            code: Some(101),
            name: "Hall A2".into(),
            memo: Some("2F".into()),
        },
    )
    .unwrap();
    let hall = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(hall.name, "Hall A2");
    assert_eq!(hall.memo.as_deref(), Some("2F"));

    assert!(matches!(
        repo.update(999, &HallDraft::default()),
        Err(RepositoryError::NotFound { .. })
    ));
    assert_eq!(repo.list_all().unwrap().len(), 1);
}

#[test]
fn test_replace_day_replaces_whole_day() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let hall_id = seed_hall(&db_path, 12, "Hall");
    seed_day(
        &db_path,
        hall_id,
        day(5),
        &[(101, "Alpha", 1000, 100), (102, "Alpha", 2000, -200), (103, "Beta", 500, 50)],
    );
    seed_day(&db_path, hall_id, day(5), &[(101, "Alpha", 3000, 300)]);

    let repo = MachineRecordRepository::new(&db_path).unwrap();
    let rows = repo.find_by_date(hall_id, day(5)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].game_count, 3000);

    // 绑定到其他日期的记录拒绝写入, 原数据保留
    let wrong = vec![record(hall_id, day(6), 101, "Alpha", 1, 1)];
    assert!(matches!(
        repo.replace_day(hall_id, day(5), &wrong),
        Err(RepositoryError::ValidationError(_))
    ));
    assert_eq!(repo.find_by_date(hall_id, day(5)).unwrap().len(), 1);
}

#[test]
fn test_history_queries() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let hall_id = seed_hall(&db_path, 12, "Hall");
    for d in [2, 4, 7] {
        seed_day(&db_path, hall_id, day(d), &[(2, "Alpha", 100, 10), (1, "Beta", 100, -10)]);
    }
    let repo = MachineRecordRepository::new(&db_path).unwrap();

    let history = repo.find_by_hall(hall_id, day(4)).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].date, day(2));
    assert_eq!(history[0].machine_number, 1);

    assert_eq!(repo.find_latest_date_before(hall_id, day(7)).unwrap(), Some(day(4)));
    assert_eq!(repo.find_latest_date_before(hall_id, day(2)).unwrap(), None);
    assert_eq!(
        repo.distinct_dates(hall_id, day(1), day(31)).unwrap(),
        vec![day(7), day(4), day(2)]
    );
    assert_eq!(repo.find_by_date_range(hall_id, day(3), day(7)).unwrap().len(), 4);
}

#[test]
fn test_memo_updates() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let hall_id = seed_hall(&db_path, 12, "Hall");
    seed_day(&db_path, hall_id, day(5), &[(101, "Alpha", 1000, 100), (102, "Beta", 1000, 0)]);
    let repo = MachineRecordRepository::new(&db_path).unwrap();

    repo.update_machine_memo(hall_id, day(5), 101, Some("hot")).unwrap();
    assert!(matches!(
        repo.update_machine_memo(hall_id, day(5), 999, Some("x")),
        Err(RepositoryError::NotFound { .. })
    ));

    let updated = repo
        .update_machine_memos(
            hall_id,
            day(5),
            &[(102, Some("cold".into())), (999, Some("ignored".into()))],
        )
        .unwrap();
    assert_eq!(updated, 1);

    assert_eq!(repo.update_date_memo(hall_id, day(5), Some("event")).unwrap(), 2);
    assert_eq!(repo.find_date_memo(hall_id, day(5)).unwrap().as_deref(), Some("event"));
    assert_eq!(repo.find_date_memo(hall_id, day(6)).unwrap(), None);

    let rows = repo.find_by_date(hall_id, day(5)).unwrap();
    assert_eq!(rows[0].machine_memo.as_deref(), Some("hot"));
    assert_eq!(rows[1].machine_memo.as_deref(), Some("cold"));
}

#[test]
fn test_delete_hall_cascades() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let hall_id = seed_hall(&db_path, 12, "Hall");
    seed_day(&db_path, hall_id, day(5), &[(101, "Alpha", 1000, 100)]);
    let maps = HallMapRepository::new(&db_path).unwrap();
    maps.create(hall_id, "1F", 5, 5).unwrap();

    HallRepository::new(&db_path).unwrap().delete(hall_id).unwrap();

    let records = MachineRecordRepository::new(&db_path).unwrap();
    assert!(records.find_by_date(hall_id, day(5)).unwrap().is_empty());
    assert!(maps.list_by_hall(hall_id).unwrap().is_empty());
}

#[test]
fn test_hall_map_lifecycle() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let hall_id = seed_hall(&db_path, 12, "Hall");
    let repo = HallMapRepository::new(&db_path).unwrap();

    let map_id = repo.create(hall_id, "1F", 3, 4).unwrap();
    let map = repo.find_by_id(map_id).unwrap().unwrap();
    assert_eq!(map.layout.len(), 12);
    assert_eq!(map.color_settings, ColorSettings::default());

    let mut layout = map.layout.clone();
    layout.set(CellKey::new(1, 1).unwrap(), LayoutCell::Machine { machine_number: 101 });
    layout.set(CellKey::new(3, 4).unwrap(), LayoutCell::Wall { label: Some("W".into()) });
    repo.update_layout(map_id, &layout).unwrap();
    assert!(matches!(
        repo.update_layout(map_id, &HallLayout::default()),
        Err(RepositoryError::ValidationError(_))
    ));

    let settings = ColorSettings {
        condition: ColorCondition::Worst7Days,
        ..ColorSettings::default()
    };
    repo.update_color_settings(map_id, &settings).unwrap();

    // 缩小后 (3,4) 被丢弃, (1,1) 保留
    repo.rename_resize(map_id, "1F main", 2, 2).unwrap();
    let map = repo.find_by_id(map_id).unwrap().unwrap();
    assert_eq!(map.name, "1F main");
    assert_eq!((map.rows, map.cols), (2, 2));
    assert_eq!(map.layout.len(), 4);
    assert_eq!(map.layout.machine_numbers(), vec![101]);
    assert_eq!(map.color_settings.condition, ColorCondition::Worst7Days);

    let copy1 = repo.duplicate(map_id).unwrap();
    let copy2 = repo.duplicate(map_id).unwrap();
    assert_eq!(repo.find_by_id(copy1).unwrap().unwrap().name, "1F main copy");
    assert_eq!(repo.find_by_id(copy2).unwrap().unwrap().name, "1F main copy 2");
    assert_eq!(repo.list_by_hall(hall_id).unwrap().len(), 3);

    repo.delete(copy1).unwrap();
    assert!(matches!(repo.delete(copy1), Err(RepositoryError::NotFound { .. })));
}
