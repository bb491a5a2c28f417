// ==========================================
// SheetImporter 集成测试
// ==========================================
// 测试目标: 上传 xlsx → 解析 → 落库 → 打标 的完整流程
// ==========================================


use chrono::{TimeZone, Utc};
use feedback_dashboard::domain::{ColumnKind, TermRef};
use feedback_dashboard::importer::ImportError;
use feedback_dashboard::{logging, ColumnSpec, ImportOutcome, SheetProfile};
use std::io::Cursor;
use test_helpers::{build_workbook, count_rows, text_workbook, Cell, TestEnv};

fn message_profile() -> SheetProfile {
    SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Province", "location"),
        ColumnSpec::text("Message", "body"),
    ])
}

#[test]
fn test_store_spreadsheet_basic() {
    logging::init_test();
    let env = TestEnv::new().with_profile(&message_profile());

    let file = text_workbook(&[
        &["London", "Short message"],
        &["Paris", "Another message"],
    ]);

    let outcome = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap();

    assert_eq!(outcome, ImportOutcome { num_saved: 2, num_skipped: 0 });

    let items = env.items.list_items().unwrap();
    assert_eq!(items.len(), 2);
    let mut bodies: Vec<&str> = items.iter().map(|i| i.body.as_str()).collect();
    bodies.sort();
    assert_eq!(bodies, vec!["Another message", "Short message"]);
}

#[test]
fn test_reimport_skips_duplicates() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::date("Date", "timestamp", "%d.%m.%Y"),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[
        &["First", "1.5.2015"],
        &["Second", "2.5.2015"],
        &["Third", "3.5.2015"],
    ]);

    let first = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file.clone()))
        .unwrap();
    assert_eq!((first.num_saved, first.num_skipped), (3, 0));

    let second = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap();
    assert_eq!((second.num_saved, second.num_skipped), (0, 3));
    assert_eq!(
        second.notice(),
        "Upload successful! 0 entries have been added. 3 duplicate entries were skipped."
    );

    assert_eq!(count_rows(&env.db_path, "feedback_item"), 3);
}

#[test]
fn test_blank_rows_are_skipped() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::integer("Age", "age"),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    // 第 2 行全空,第 4 行年龄非法 → 报错行号必须是 4
    let file = text_workbook(&[
        &["one", "5"],
        &["", ""],
        &["three", "7"],
        &["four", "old"],
    ]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert_eq!(err.row_number(), Some(4));
    assert!(err.to_string().ends_with("in row 4 "));
}

#[test]
fn test_trailing_blank_rows_ignored() {
    logging::init_test();
    let env = TestEnv::new().with_profile(&message_profile());

    let rows = vec![
        vec![Cell::from("Lofa"), Cell::from("message")],
        vec![Cell::Blank, Cell::Blank],
        // 只有一个空字符串单元格的行
        vec![Cell::Text(String::new())],
    ];

    let outcome = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(build_workbook(&rows)))
        .unwrap();

    assert_eq!(outcome.num_saved, 1);
}

#[test]
fn test_header_reorders_and_tolerates_extra_columns() {
    logging::init_test();
    let env = TestEnv::new().with_profile(&message_profile().with_header(true));

    let file = text_workbook(&[
        &["Message", "Province", "Extra1", "Extra2"],
        &["Short message", "London", "x", "y"],
    ]);

    let outcome = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap();
    assert_eq!(outcome.num_saved, 1);

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(item.body, "Short message");
    assert_eq!(item.location, "London");
}

#[test]
fn test_unknown_header_column_fails() {
    logging::init_test();
    let env = TestEnv::new().with_profile(&message_profile().with_header(true));

    let file = text_workbook(&[&["Message", "Unknown"], &["Short message", "London"]]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert_eq!(err.to_string(), "Unknown column: Unknown");
    assert_eq!(err.row_number(), None);
    assert_eq!(count_rows(&env.db_path, "feedback_item"), 0);
}

#[test]
fn test_unknown_header_reports_cell_text() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test")
        .with_columns(vec![
            ColumnSpec::text("Message", "body"),
            ColumnSpec::integer("Age", "age"),
        ])
        .with_header(true);
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[&[" Mesage ", "Age"], &["hello", "5"]]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert_eq!(err.to_string(), "Unknown column:  Mesage ");
}

#[test]
fn test_fractional_number_in_integer_column_is_truncated() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::integer("Age", "age"),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    let rows = vec![vec![Cell::from("hello"), Cell::from(5.5)]];

    let outcome = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(build_workbook(&rows)))
        .unwrap();

    assert_eq!(outcome.num_saved, 1);
    assert_eq!(env.items.list_items().unwrap()[0].age, "5");
}

#[test]
fn test_row_error_aborts_whole_batch() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::integer("Age", "age"),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[&["valid", "30"], &["invalid", "thirty"]]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert!(matches!(err, ImportError::Row { row: 2, .. }));
    assert!(err
        .to_string()
        .ends_with("Can not process value 'thirty' of type 'integer' in row 2 "));
    assert_eq!(count_rows(&env.db_path, "feedback_item"), 0);
}

#[test]
fn test_date_scenario_with_header() {
    logging::init_test();
    let profile = SheetProfile::new("geopoll-like", "Geopoll")
        .with_columns(vec![
            ColumnSpec::date("CreatedDate", "timestamp", "%m/%d/%y"),
            ColumnSpec::text("QuestIO", "body"),
        ])
        .with_header(true);
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[
        &["CreatedDate", "QuestIO"],
        &["05/01/15", "What is the cuse of Ebola?"],
    ]);

    let outcome = env
        .importer()
        .store_spreadsheet("geopoll-like", Cursor::new(file))
        .unwrap();
    assert_eq!(outcome.num_saved, 1);

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(item.body, "What is the cuse of Ebola?");
    assert_eq!(item.timestamp, Some(Utc.with_ymd_and_hms(2015, 5, 1, 0, 0, 0).unwrap()));
}

#[test]
fn test_native_date_cells() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::new("Date", "timestamp", ColumnKind::Date { date_format: None }),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    let rows = vec![vec![
        Cell::from("native"),
        Cell::Date { year: 2015, month: 1, day: 5, hour: 10, minute: 30, second: 0 },
    ]];

    env.importer()
        .store_spreadsheet("test-label", Cursor::new(build_workbook(&rows)))
        .unwrap();

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(item.timestamp, Some(Utc.with_ymd_and_hms(2015, 1, 5, 10, 30, 0).unwrap()));
}

#[test]
fn test_numeric_cell_in_text_column() {
    logging::init_test();
    let env = TestEnv::new().with_profile(&message_profile());

    let rows = vec![vec![Cell::from("Lofa"), Cell::from(8737.0)]];

    env.importer()
        .store_spreadsheet("test-label", Cursor::new(build_workbook(&rows)))
        .unwrap();

    assert_eq!(env.items.list_items().unwrap()[0].body, "8737");
}

#[test]
fn test_multiple_terms_from_one_cell() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::taxonomy("Tags", "tags"),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[&["Short message", "Tag 1, Tag 2"]]);

    env.importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap();

    let item = &env.items.list_items().unwrap()[0];
    assert_eq!(
        item.terms,
        vec![TermRef::new("tags", "Tag 1"), TermRef::new("tags", "Tag 2")]
    );
}

#[test]
fn test_static_taxonomies_applied_to_every_item() {
    logging::init_test();
    let profile = message_profile()
        .with_taxonomy("item-types", "question")
        .with_taxonomy("countries", "Liberia");
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[&["Lofa", "one"], &["Bong", "two"]]);

    env.importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap();

    for item in env.items.list_items().unwrap() {
        assert_eq!(
            item.terms,
            vec![
                TermRef::new("countries", "Liberia"),
                TermRef::new("item-types", "question"),
            ]
        );
    }
}

#[test]
fn test_validation_error_reports_column_and_value() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test")
        .with_columns(vec![
            ColumnSpec::text("Message", "body"),
            ColumnSpec::text("Contributor", "contributor"),
        ])
        .with_header(true);
    let env = TestEnv::new().with_profile(&profile);

    let long = "x".repeat(191);
    let file = text_workbook(&[
        &["Message", "Contributor"],
        &["fine", "someone"],
        &["too long", long.as_str()],
    ]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "There was a problem with row 3 of the spreadsheet:\n\
             Column: 'Contributor' (contributor)\n\
             Error (max_length): 'Ensure this field has no more than 190 characters.'\n\n\
             Value: {}",
            long
        )
    );

    // 已落库的前序行不回滚
    assert_eq!(count_rows(&env.db_path, "feedback_item"), 1);
}

#[test]
fn test_term_error_reports_taxonomy_and_name() {
    logging::init_test();
    let profile = message_profile().with_taxonomy("item-types", "concern");
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[&["Lofa", "message"]]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "There was a problem with row 1 of the spreadsheet:\n\
         Error: Term matching query does not exist.\n\
         Taxonomy: item-types\n\
         Name: concern\n"
    );
}

#[test]
fn test_unknown_profile() {
    logging::init_test();
    let env = TestEnv::new();

    let err = env
        .importer()
        .store_spreadsheet("unknownlabel", Cursor::new(text_workbook(&[&["x"]])))
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "Misconfigured service. Source \"unknownlabel\" does not exist"
    );
}

#[test]
fn test_unsupported_profile_format() {
    logging::init_test();
    let mut profile = message_profile();
    profile.format = Some("csv".to_string());
    let env = TestEnv::new().with_profile(&profile);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(b"a,b\n".to_vec()))
        .unwrap_err();

    assert_eq!(err.to_string(), "Unsupported file format: csv");
}

#[test]
fn test_file_that_is_not_excel() {
    logging::init_test();
    let env = TestEnv::new().with_profile(&message_profile());

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(b"this is not a workbook".to_vec()))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Expected excel file. Received file in an unrecognized format."
    );
}

#[test]
fn test_missing_date_format_is_configuration_error() {
    logging::init_test();
    let profile = SheetProfile::new("test-label", "Test").with_columns(vec![
        ColumnSpec::text("Message", "body"),
        ColumnSpec::new("Date", "timestamp", ColumnKind::Date { date_format: None }),
    ]);
    let env = TestEnv::new().with_profile(&profile);

    let file = text_workbook(&[&["message", "1.5.2015"]]);

    let err = env
        .importer()
        .store_spreadsheet("test-label", Cursor::new(file))
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "Date format not specified for 'timestamp' ");
}
