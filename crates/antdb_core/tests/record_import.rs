use antdb_core::db::open_db_in_memory;
use antdb_core::{ImportBatch, ImportBatchRunner, ImportPhase, RawRow};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn species_row(scientific: &str, japanese: &str, synonyms: &str) -> RawRow {
    RawRow::from_pairs([
        ("scientific_name", scientific),
        ("japanese_name", japanese),
        ("synonyms", synonyms),
    ])
}

fn research_row(title: &str) -> RawRow {
    RawRow::from_pairs([("title", title), ("author", "Yamada"), ("year", "2019")])
}

fn record_row(species: &str, site: &str, abundance: &str) -> RawRow {
    let mut row = RawRow::from_pairs([
        ("research_title", "Ant fauna of Mt. Takao"),
        ("site_name", site),
        ("species_name", species),
        ("method", "pitfall trap"),
        ("unit", "worker"),
    ]);
    if !abundance.is_empty() {
        row.set("abundance", abundance);
    }
    row
}

fn base_batch() -> ImportBatch {
    ImportBatch {
        species: vec![species_row(
            "Formica japonica",
            "クロヤマアリ",
            "クロヤマ",
        )],
        research: vec![research_row("Ant fauna of Mt. Takao")],
        records: Vec::new(),
    }
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn full_batch_runs_all_three_phases_in_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    batch
        .records
        .push(record_row("クロヤマ", "trailhead", "12"));

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.success_count, 3);
    assert_eq!(report.failure_count, 0);
    assert!(report.failures.is_empty());

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM species;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM research;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM survey_sites;"), 1);
    assert_eq!(
        count(&conn, "SELECT MAX(abundance) FROM occurrences;"),
        12
    );
}

#[test]
fn record_defaults_apply_for_optional_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    batch.records.push(RawRow::from_pairs([
        ("research_title", "Ant fauna of Mt. Takao"),
        ("site_name", "trailhead"),
        ("species_name", "Formica japonica"),
    ]));

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.failure_count, 0);

    let (unit, abundance): (String, i64) = conn
        .query_row(
            "SELECT unit, abundance FROM occurrences;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(unit, "worker");
    assert_eq!(abundance, 1);
    // The sentinel method dimension row is created on demand.
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM methods WHERE name = 'unspecified';"
        ),
        1
    );
}

#[test]
fn one_bad_row_never_aborts_the_batch() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    batch.records = vec![
        record_row("クロヤマ", "site 1", "1"),
        record_row("Formica japonica", "site 2", "2"),
        record_row("Lasius nobody", "site 3", "3"),
        record_row("クロヤマアリ", "site 4", "4"),
        record_row("FORMICA JAPONICA", "site 5", "5"),
    ];

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    // 2 seed rows + 4 good record rows.
    assert_eq!(report.success_count, 6);
    assert_eq!(report.failure_count, 1);

    let failure = &report.failures[0];
    assert_eq!(failure.phase, ImportPhase::Records);
    assert_eq!(failure.row_index, 2);
    assert!(failure.message.contains("Lasius nobody"));
    assert_eq!(failure.raw.get("site_name"), Some("site 3"));

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM occurrences;"), 4);
}

#[test]
fn failed_row_rolls_back_every_effect_it_started() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    // Site upsert happens before species resolution fails; the rollback
    // must remove the site row again.
    batch
        .records
        .push(record_row("Lasius nobody", "orphan site", "1"));

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.failure_count, 1);
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM survey_sites WHERE site_name = 'orphan site';"
        ),
        0
    );
}

#[test]
fn unresolved_reference_fails_the_row_with_a_clear_message() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    let mut row = record_row("Formica japonica", "trailhead", "1");
    row.set("research_title", "Unknown proceedings");
    batch.records.push(row);

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.failure_count, 1);
    assert!(report.failures[0].message.contains("research not found"));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM occurrences;"), 0);
}

#[test]
fn duplicate_observations_merge_instead_of_duplicating() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    batch.records = vec![
        record_row("クロヤマ", "site A", "15"),
        record_row("Formica japonica", "site A", "8"),
    ];

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.failure_count, 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM survey_sites;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM occurrences;"), 1);
    assert_eq!(count(&conn, "SELECT MAX(abundance) FROM occurrences;"), 23);
}

#[test]
fn reimporting_a_known_reference_is_a_success_without_duplicates() {
    let mut conn = open_db_in_memory().unwrap();
    let batch = base_batch();
    ImportBatchRunner::new(&mut conn).run(&batch).unwrap();

    let again = ImportBatch {
        research: vec![research_row("ANT FAUNA OF MT. TAKAO")],
        ..ImportBatch::default()
    };
    let report = ImportBatchRunner::new(&mut conn).run(&again).unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM research;"), 1);
}

#[test]
fn validation_failures_are_row_local() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    batch.records = vec![
        record_row("クロヤマ", "site A", "many"),
        record_row("クロヤマ", "site A", "-4"),
        record_row("クロヤマ", "site A", "2"),
    ];

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.failure_count, 2);
    assert!(report.failures[0].message.contains("non-numeric"));
    assert!(report.failures[1].message.contains("non-negative"));
    assert_eq!(count(&conn, "SELECT MAX(abundance) FROM occurrences;"), 2);
}

#[test]
fn missing_required_fields_fail_their_phase_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let batch = ImportBatch {
        species: vec![RawRow::from_pairs([("scientific_name", "Formica japonica")])],
        research: vec![RawRow::from_pairs([("title", "No author given")])],
        records: Vec::new(),
    };

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    assert_eq!(report.success_count, 0);
    assert_eq!(report.failure_count, 2);
    assert!(report.failures[0].message.contains("japanese_name"));
    assert!(report.failures[1].message.contains("author"));
}

#[test]
fn cancellation_stops_before_the_next_row() {
    let mut conn = open_db_in_memory().unwrap();
    let cancel = Arc::new(AtomicBool::new(true));
    let batch = base_batch();

    let report = ImportBatchRunner::new(&mut conn)
        .with_cancel_flag(Arc::clone(&cancel))
        .run(&batch)
        .unwrap();
    assert_eq!(report.success_count, 0);
    assert_eq!(report.failure_count, 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM species;"), 0);

    cancel.store(false, Ordering::Relaxed);
    let report = ImportBatchRunner::new(&mut conn)
        .with_cancel_flag(cancel)
        .run(&batch)
        .unwrap();
    assert_eq!(report.success_count, 2);
}

#[test]
fn error_log_entries_serialize_with_the_raw_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut batch = base_batch();
    batch
        .records
        .push(record_row("Lasius nobody", "site 3", "1"));

    let report = ImportBatchRunner::new(&mut conn).run(&batch).unwrap();
    let json = serde_json::to_value(&report.failures[0]).unwrap();
    assert_eq!(json["phase"], "records");
    assert_eq!(json["row_index"], 0);
    assert_eq!(json["raw"]["site_name"], "site 3");
}
