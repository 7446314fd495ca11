use antdb_core::db::open_db_in_memory;
use antdb_core::{
    NewSpecies, RepoError, SpeciesAttributes, SpeciesRepository, SqliteSpeciesRepository,
    ValidationError,
};
use rusqlite::Connection;

#[test]
fn every_registered_label_resolves_to_the_same_species() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    let species_id = repo
        .register(
            &NewSpecies::new("Formica japonica", "クロヤマアリ")
                .with_synonyms(vec!["クロヤマ".to_string()]),
        )
        .unwrap();

    for label in [
        "クロヤマ",
        "Formica japonica",
        "クロヤマアリ",
        "FORMICA JAPONICA",
        "  formica   japonica ",
    ] {
        assert_eq!(
            repo.resolve(label).unwrap(),
            Some(species_id),
            "label `{label}` should resolve"
        );
    }
}

#[test]
fn unknown_label_resolves_to_none_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    assert_eq!(repo.resolve("Camponotus nobody").unwrap(), None);
    assert_eq!(repo.resolve("   ").unwrap(), None);
}

#[test]
fn register_is_idempotent_for_the_same_scientific_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    let first = repo
        .register(&NewSpecies::new("Formica japonica", "クロヤマアリ"))
        .unwrap();
    let second = repo
        .register(&NewSpecies::new("FORMICA  JAPONICA", "クロヤマアリ"))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(count_rows(&conn, "species"), 1);
}

#[test]
fn reregistration_merges_new_aliases_into_existing_species() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    let species_id = repo
        .register(&NewSpecies::new("Formica japonica", "クロヤマアリ"))
        .unwrap();
    repo.register(
        &NewSpecies::new("Formica japonica", "クロヤマアリ")
            .with_synonyms(vec!["black field ant".to_string()]),
    )
    .unwrap();

    assert_eq!(
        repo.resolve("Black Field Ant").unwrap(),
        Some(species_id)
    );
}

#[test]
fn alias_collision_across_species_is_silently_skipped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    let first = repo
        .register(
            &NewSpecies::new("Formica japonica", "クロヤマアリ")
                .with_synonyms(vec!["yama ant".to_string()]),
        )
        .unwrap();
    let second = repo
        .register(
            &NewSpecies::new("Camponotus japonicus", "クロオオアリ")
                .with_synonyms(vec!["Yama Ant".to_string()]),
        )
        .unwrap();
    assert_ne!(first, second);

    // The first registrant keeps the colliding alias.
    assert_eq!(repo.resolve("yama ant").unwrap(), Some(first));
    let alias_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM species_synonyms WHERE name_normalized = 'yama ant';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(alias_rows, 1);
}

#[test]
fn register_rejects_empty_names() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    let err = repo
        .register(&NewSpecies::new("  ", "クロヤマアリ"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyName { .. })
    ));

    let err = repo
        .register(&NewSpecies::new("Formica japonica", "\u{3000}"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyName { .. })
    ));
}

#[test]
fn descriptive_attributes_are_persisted_on_creation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSpeciesRepository::new(&conn);

    repo.register(
        &NewSpecies::new("Formica japonica", "クロヤマアリ").with_attributes(SpeciesAttributes {
            subfamily: Some("Formicinae".to_string()),
            body_len_mm: Some(5.5),
            red_list: None,
        }),
    )
    .unwrap();

    let (subfamily, body_len_mm): (String, f64) = conn
        .query_row(
            "SELECT subfamily, body_len_mm FROM species WHERE scientific_name = 'Formica japonica';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(subfamily, "Formicinae");
    assert_eq!(body_len_mm, 5.5);
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
