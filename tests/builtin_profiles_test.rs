// ==========================================
// 内置导入配置集成测试
// ==========================================
// 测试目标: geopoll / rapidpro / kobo 三种来源的真实表头导入
// ==========================================


use chrono::{TimeZone, Utc};
use feedback_dashboard::config::{builtin_profiles, seed_builtin_profiles};
use feedback_dashboard::{logging, TermRef};
use std::io::Cursor;
use test_helpers::{build_workbook, text_workbook, Cell, TestEnv};

fn seeded_env() -> TestEnv {
    let env = TestEnv::new();
    seed_builtin_profiles(&env.profiles).unwrap();
    env
}

#[test]
fn test_geopoll_import() {
    logging::init_test();
    let env = seeded_env();

    let file = text_workbook(&[
        &["Province", "CreatedDate", "AgeGroup", "QuestIO"],
        &["Lofa", "05/01/15", "15-24", "What is the cuse of Ebola?"],
        &["Bong", "05/02/15", "25-34", "Is Ebola real?"],
    ]);

    let outcome = env
        .importer()
        .store_spreadsheet("geopoll", Cursor::new(file))
        .unwrap();
    assert_eq!((outcome.num_saved, outcome.num_skipped), (2, 0));

    let items = env.items.list_items().unwrap();
    let first = items
        .iter()
        .find(|i| i.body == "What is the cuse of Ebola?")
        .unwrap();

    assert_eq!(first.timestamp, Some(Utc.with_ymd_and_hms(2015, 5, 1, 0, 0, 0).unwrap()));
    assert_eq!(first.terms, vec![TermRef::new("tags", "Lofa")]);
    // AgeGroup 列被忽略
    assert_eq!(first.age, "");
}

#[test]
fn test_rapidpro_import_applies_static_taxonomies() {
    logging::init_test();
    let env = seeded_env();

    let file = text_workbook(&[
        &[
            "Phone",
            "Name",
            "Groups",
            "Last Seen",
            "Rumors (Text) - DEY Say sample flow",
            "Channel",
            "Region",
        ],
        &[
            "+231 77 000 0000",
            "Someone",
            "DEY Say",
            "01/15/15 11:03:00",
            "Ebola is carried by birds",
            "Lonestar",
            "Montserrado",
        ],
    ]);

    let outcome = env
        .importer()
        .store_spreadsheet("rapidpro", Cursor::new(file))
        .unwrap();
    assert_eq!(outcome.num_saved, 1);

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(item.body, "Ebola is carried by birds");
    assert_eq!(item.network_provider, "Lonestar");
    assert_eq!(
        item.timestamp,
        Some(Utc.with_ymd_and_hms(2015, 1, 15, 11, 3, 0).unwrap())
    );
    assert_eq!(
        item.terms,
        vec![
            TermRef::new("contexts", "Ebola-Liberia"),
            TermRef::new("countries", "Liberia"),
            TermRef::new("data-origins", "Rapidpro Spreadsheet"),
            TermRef::new("item-types", "rumor"),
            TermRef::new("tags", "Montserrado"),
        ]
    );
}

#[test]
fn test_rapidpro_native_date_cells() {
    logging::init_test();
    let env = seeded_env();

    let rows = vec![
        vec![
            Cell::from("Last Seen"),
            Cell::from("Rumors (Text) - DEY Say sample flow"),
        ],
        vec![
            Cell::Date { year: 2015, month: 1, day: 15, hour: 11, minute: 3, second: 0 },
            Cell::from("Ebola is carried by birds"),
        ],
    ];

    env.importer()
        .store_spreadsheet("rapidpro", Cursor::new(build_workbook(&rows)))
        .unwrap();

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(
        item.timestamp,
        Some(Utc.with_ymd_and_hms(2015, 1, 15, 11, 3, 0).unwrap())
    );
}

#[test]
fn test_kobo_import() {
    logging::init_test();
    let env = seeded_env();

    let file = text_workbook(&[
        &[
            "start",
            "end",
            "What is the feedback or rumour?",
            "What is the feedback or rumour translation?",
            "gender",
            "Location",
        ],
        &[
            "2015-06-04T17:28:07.000+01:00",
            "2015-06-04T17:30:00.000+01:00",
            "Ebola no dey again",
            "There is no more Ebola",
            "female",
            "Monrovia",
        ],
    ]);

    env.importer()
        .store_spreadsheet("kobo", Cursor::new(file))
        .unwrap();

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(item.body, "Ebola no dey again");
    assert_eq!(item.translation, "There is no more Ebola");
    assert_eq!(item.location, "Monrovia");
    assert_eq!(item.terms, vec![TermRef::new("tags", "female")]);
    assert_eq!(
        item.timestamp,
        Some(Utc.with_ymd_and_hms(2015, 6, 4, 16, 28, 7).unwrap())
    );
}

#[test]
fn test_builtin_profiles_round_trip_through_store() {
    logging::init_test();
    let env = seeded_env();

    for profile in builtin_profiles().unwrap() {
        let stored = env.importer().get_profile(&profile.label).unwrap();
        assert_eq!(stored, profile);
    }
}
