use entitykit_core::db::migrations::latest_version;
use entitykit_core::db::open_db_in_memory;
use entitykit_core::{
    CrudService, EntityService, LifecycleError, PersistedEntity, Person, RepoError, Repository,
    SqliteRepository, Stamped, Team,
};
use rusqlite::Connection;
use std::thread::sleep;
use std::time::Duration;
use uuid::Uuid;

#[test]
fn create_update_delete_walkthrough() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let created = people.create(Person::new("jim")).unwrap();
    assert_eq!(created.id(), Some(1));
    assert!(Uuid::parse_str(created.external_id().unwrap()).is_ok());
    let t0 = created.created_at().unwrap();
    assert_eq!(created.modified_at(), Some(t0));

    let mut renamed = created.clone();
    renamed.name = "JOE".to_string();
    sleep(Duration::from_millis(2));
    let updated = people.update(renamed).unwrap();

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.external_id(), created.external_id());
    assert_eq!(updated.created_at(), Some(t0));
    assert!(updated.modified_at().unwrap() >= t0);
    assert_eq!(updated.name, "JOE");

    let loaded = people.read_by_id(1).unwrap();
    assert_eq!(loaded, updated);

    people.delete(&updated).unwrap();
    let err = people.read_by_id(1).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "person", id: 1 }));
    assert!(err.is_not_found());
    assert!(people.read_all().unwrap().is_empty());
}

#[test]
fn create_returns_fully_populated_entity() {
    let conn = open_db_in_memory().unwrap();
    let teams = CrudService::new(SqliteRepository::<Team>::try_new(&conn).unwrap());

    let team = teams.create(Team::new("platform")).unwrap();
    assert!(team.id().is_some());
    assert!(team.external_id().is_some());
    assert!(team.created_at().is_some());
    assert!(team.modified_at().is_some());
}

#[test]
fn read_all_returns_entities_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    for name in ["ann", "bob", "cy"] {
        people.create(Person::new(name)).unwrap();
    }

    let names: Vec<_> = people
        .read_all()
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect();
    assert_eq!(names, ["ann", "bob", "cy"]);
}

#[test]
fn repeated_updates_keep_external_id_and_created_at() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let created = people.create(Person::new("jim")).unwrap();
    let mut current = created.clone();
    for round in 0..3 {
        current.name = format!("jim-{round}");
        let previous_modified = current.modified_at().unwrap();
        current = people.update(current).unwrap();
        assert!(current.modified_at().unwrap() >= previous_modified);
    }

    let stored = people.read_by_id(created.id().unwrap()).unwrap();
    assert_eq!(stored.external_id(), created.external_id());
    assert_eq!(stored.created_at(), created.created_at());
    assert_eq!(stored.name, "jim-2");
}

#[test]
fn update_with_blank_metadata_keeps_stored_identity() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let created = people.create(Person::new("jim")).unwrap();
    let mut detached = Person::new("JOE");
    detached.set_id(created.id().unwrap());
    sleep(Duration::from_millis(2));

    let updated = people.update(detached).unwrap();
    assert_eq!(updated.external_id(), created.external_id());
    assert_eq!(updated.created_at(), created.created_at());
    assert!(updated.modified_at().unwrap() >= created.created_at().unwrap());

    let stored = people.read_by_id(created.id().unwrap()).unwrap();
    assert_eq!(stored, updated);
    assert_eq!(stored.name, "JOE");
}

#[test]
fn update_ignores_caller_supplied_created_at() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let created = people.create(Person::new("jim")).unwrap();
    let mut edited = created.clone();
    edited.set_created_at(1);
    edited.set_external_id("11111111-2222-4333-8444-555555555555".to_string());

    let updated = people.update(edited).unwrap();
    assert_eq!(updated.created_at(), created.created_at());
    assert_eq!(updated.external_id(), created.external_id());

    let stored = people.read_by_id(created.id().unwrap()).unwrap();
    assert_eq!(stored.created_at(), created.created_at());
    assert_eq!(stored.external_id(), created.external_id());
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let err = people.create(Person::new("   ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(people.read_all().unwrap().is_empty());

    let mut created = people.create(Person::new("jim")).unwrap();
    created.name.clear();
    let err = people.update(created).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(people.read_by_id(1).unwrap().name, "jim");
}

#[test]
fn update_requires_a_persisted_entity() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let err = people.update(Person::new("ghost")).unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted("person")));
    assert!(people.read_all().unwrap().is_empty());
}

#[test]
fn update_of_deleted_row_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let created = people.create(Person::new("jim")).unwrap();
    people.delete(&created).unwrap();

    let err = people.update(created).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 1, .. }));
}

#[test]
fn delete_missing_or_unsaved_entity_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let err = people.delete(&Person::new("never saved")).unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted("person")));
    assert!(err.is_not_found());

    let created = people.create(Person::new("jim")).unwrap();
    people.delete(&created).unwrap();
    let err = people.delete(&created).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 1, .. }));
}

#[test]
fn raw_repository_rejects_unstamped_entities() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Person>::try_new(&conn).unwrap();

    let err = repo.save(Person::new("jim")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Lifecycle(LifecycleError::MissingExternalId { entity: "person" })
    ));
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn stamped_repository_can_be_used_without_the_service() {
    let conn = open_db_in_memory().unwrap();
    let repo = Stamped::new(SqliteRepository::<Person>::try_new(&conn).unwrap());

    let saved = repo.save(Person::new("jim")).unwrap();
    assert_eq!(repo.find_by_id(saved.id().unwrap()).unwrap(), Some(saved));
    assert_eq!(repo.find_by_id(99).unwrap(), None::<Person>);
}

#[test]
fn storage_constraint_failures_surface_as_db_errors() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());
    conn.execute_batch(
        "CREATE TRIGGER person_reject_bob BEFORE INSERT ON person
         WHEN NEW.name = 'bob'
         BEGIN SELECT RAISE(ABORT, 'bob is not allowed'); END;",
    )
    .unwrap();

    let err = people.create(Person::new("bob")).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(err.to_string().contains("bob is not allowed"));
}

#[test]
fn corrupted_rows_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn).unwrap());
    people.create(Person::new("jim")).unwrap();

    conn.execute("UPDATE person SET modified_ts = created_ts - 1;", [])
        .unwrap();

    let err = people.read_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteRepository::<Person>::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_entity_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRepository::<Person>::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("person"))
    ));
}

#[test]
fn repository_rejects_table_missing_identity_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE person (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL,
            created_ts INTEGER NOT NULL,
            name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRepository::<Person>::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "person",
            column: "modified_ts"
        })
    ));
}
