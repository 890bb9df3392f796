//! Integration tests for the synthesis pipeline.
//!
//! These tests run the whole path: specification text is parsed into table
//! groups, rows are fetched from an in-memory source, and the rendered
//! transactional block is checked end to end.

use rowsync_core::row::Row;
use rowsync_core::source::MemoryFetcher;
use rowsync_core::value::{ColumnValue, DeclaredType, Temporal};
use rowsync_sqlgen::{parse_spec_text, Diagnostic, Synthesizer};

use chrono::NaiveDate;

fn script_row(id: i64, status: &str, body: Option<&str>) -> Row {
    let body_value = match body {
        Some(text) => ColumnValue::LargeText(text.into()),
        None => ColumnValue::Null,
    };
    Row::new()
        .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(id))
        .with_column("STATUS", DeclaredType::Text, ColumnValue::text(status))
        .with_column(
            "UPDATED_ON",
            DeclaredType::Date,
            ColumnValue::Temporal(Temporal::Date(
                NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            )),
        )
        .with_column("BODY", DeclaredType::LargeText, body_value)
}

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new().table(
        "SCWEB_SCRIPTS",
        vec![
            script_row(1, "OLD", Some("select * from dual")),
            script_row(2, "NEW", None),
        ],
    )
}

#[tokio::test]
async fn whole_row_replace_renders_complete_block() {
    let groups = parse_spec_text("SCWEB_SCRIPTS\nID=1\n").unwrap();
    let out = Synthesizer::new()
        .synthesize_group(&fetcher(), &groups[0])
        .await
        .unwrap();

    assert!(out.diagnostics.is_empty());
    let expected = "\
DECLARE
    v_clob1 CLOB;
    v_clob2 CLOB;
    v_clob3 CLOB;
BEGIN
    v_clob1 := 'select * from dual';
    DELETE FROM SCWEB_SCRIPTS WHERE ID = '1';
    INSERT INTO SCWEB_SCRIPTS (ID, STATUS, UPDATED_ON, BODY) VALUES (1, 'OLD', TO_DATE('2024-05-20', 'YYYY-MM-DD'), v_clob1);

    COMMIT;
END;
/";
    assert_eq!(out.block.render(), expected);
}

#[tokio::test]
async fn null_large_text_inlines_null_without_scratch_use() {
    let groups = parse_spec_text("SCWEB_SCRIPTS\nID=2\n").unwrap();
    let out = Synthesizer::new()
        .synthesize_group(&fetcher(), &groups[0])
        .await
        .unwrap();

    let sql = out.block.render();
    assert!(sql.contains("VALUES (2, 'NEW', TO_DATE('2024-05-20', 'YYYY-MM-DD'), NULL);"));
    assert!(!sql.contains(":="));
}

#[tokio::test]
async fn field_updates_are_emitted_per_field_in_order() {
    let groups = parse_spec_text("SCWEB_SCRIPTS\nID=1, STATUS, BODY\n").unwrap();
    let out = Synthesizer::new()
        .synthesize_group(&fetcher(), &groups[0])
        .await
        .unwrap();

    let sql = out.block.render();
    let status_pos = sql.find("UPDATE SCWEB_SCRIPTS SET STATUS = 'OLD' WHERE ID = '1';");
    let assign_pos = sql.find("v_clob1 := 'select * from dual';");
    let body_pos = sql.find("UPDATE SCWEB_SCRIPTS SET BODY = v_clob1 WHERE ID = '1';");

    // STATUS update first, then the scratch assignment, then the BODY
    // update that consumes it.
    assert!(status_pos.unwrap() < assign_pos.unwrap());
    assert!(assign_pos.unwrap() < body_pos.unwrap());
}

#[tokio::test]
async fn mixed_good_and_bad_specs_keep_processing() {
    let text = "SCWEB_SCRIPTS\nID=99\nID=1, STATUS\nSTATUS, BODY\n";
    let groups = parse_spec_text(text).unwrap();
    let out = Synthesizer::new()
        .synthesize_group(&fetcher(), &groups[0])
        .await
        .unwrap();

    assert_eq!(out.diagnostics.len(), 2);
    assert!(matches!(out.diagnostics[0], Diagnostic::NotFound { .. }));
    assert!(matches!(out.diagnostics[1], Diagnostic::EmptyKey { .. }));
    assert_eq!(out.block.statement_count(), 1);
}

#[tokio::test]
async fn composite_key_guards_every_statement() {
    let row = Row::new()
        .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(1))
        .with_column("PRIVILEGE_ID", DeclaredType::Numeric, ColumnValue::integer(2))
        .with_column("STATUS", DeclaredType::Text, ColumnValue::text("A"));
    let fetcher = MemoryFetcher::new().table("SCWEB_SCRIPTS", vec![row]);

    let groups = parse_spec_text("SCWEB_SCRIPTS\nID=1, PRIVILEGE_ID=2, STATUS\n").unwrap();
    let out = Synthesizer::new()
        .synthesize_group(&fetcher, &groups[0])
        .await
        .unwrap();

    let sql = out.block.render();
    assert!(sql.contains(
        "UPDATE SCWEB_SCRIPTS SET STATUS = 'A' WHERE ID = '1' AND PRIVILEGE_ID = '2';"
    ));
}

#[tokio::test]
async fn multiple_groups_are_independent() {
    let fetcher = MemoryFetcher::new()
        .table("A_TABLE", vec![script_row(1, "X", Some("a"))])
        .table("B_TABLE", vec![script_row(1, "Y", Some("b"))]);

    let groups = parse_spec_text("A_TABLE\nID=1\n\nB_TABLE\nID=1\n").unwrap();
    assert_eq!(groups.len(), 2);

    let synthesizer = Synthesizer::new();
    let a = synthesizer.synthesize_group(&fetcher, &groups[0]).await.unwrap();
    let b = synthesizer.synthesize_group(&fetcher, &groups[1]).await.unwrap();

    // Each group gets its own scratch cursor.
    assert!(a.block.render().contains("v_clob1 := 'a';"));
    assert!(b.block.render().contains("v_clob1 := 'b';"));
}
