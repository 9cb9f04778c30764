use super::*;
use tm_core::MigrationName;
use tm_version::VersionError;

const FIRST: &str = "20240101000000_create_users";
const SECOND: &str = "20240101000001_add_email";

fn registered(names: &[&str]) -> Session {
    let session = Session::in_memory().unwrap();
    let client = VersionClient::new(&session);
    client.initialize().unwrap();
    for name in names {
        client
            .register_migration(&MigrationName::parse(name).unwrap())
            .unwrap();
    }
    session
}

fn current(session: &Session) -> i64 {
    VersionClient::new(session).current_version().unwrap()
}

fn table_exists(session: &Session, table: &str) -> bool {
    session
        .query_row(
            "SELECT COUNT(*) > 0 FROM information_schema.tables WHERE table_name = ?",
            duckdb::params![table],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn test_apply_and_revert_move_pointer_with_schema() {
    let session = registered(&[FIRST]);
    let applier = Applier::new(&session);

    assert_eq!(
        applier
            .apply(FIRST, "CREATE TABLE users (id INTEGER);")
            .unwrap(),
        1
    );
    assert_eq!(current(&session), 1);
    assert!(table_exists(&session, "users"));

    assert_eq!(applier.revert(FIRST, "DROP TABLE users;").unwrap(), 0);
    assert_eq!(current(&session), 0);
    assert!(!table_exists(&session, "users"));
}

#[test]
fn test_failing_sql_rolls_back_version_and_schema() {
    let session = registered(&[FIRST]);
    let applier = Applier::new(&session);

    let err = applier
        .apply(
            FIRST,
            "CREATE TABLE users (id INTEGER); INSERT INTO nowhere VALUES (1);",
        )
        .unwrap_err();

    match &err {
        EngineError::Execution {
            migration,
            direction,
            version,
            target,
            ..
        } => {
            assert_eq!(migration, FIRST);
            assert_eq!(*direction, Direction::Up);
            assert_eq!((*version, *target), (0, 1));
        }
        other => panic!("expected execution error, got {other}"),
    }
    assert_eq!(current(&session), 0);
    assert!(!table_exists(&session, "users"));
    assert!(VersionClient::new(&session).history(10).unwrap().is_empty());
}

#[test]
fn test_out_of_order_apply_is_versioning_error() {
    let session = registered(&[FIRST, SECOND]);
    let err = Applier::new(&session)
        .apply(SECOND, "CREATE TABLE t (id INTEGER);")
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Versioning {
            version: Some(0),
            source: VersionError::OutOfOrder { .. },
            ..
        }
    ));
    assert!(!table_exists(&session, "t"));
}

#[test]
fn test_uninitialized_database_reports_missing_version() {
    let session = Session::in_memory().unwrap();
    let err = Applier::new(&session).apply(FIRST, "SELECT 1;").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Versioning {
            version: None,
            source: VersionError::Uninitialized,
            ..
        }
    ));
}

#[test]
fn test_empty_body_only_moves_pointer() {
    let session = registered(&[FIRST]);
    assert_eq!(Applier::new(&session).apply(FIRST, "  \n").unwrap(), 1);
    assert_eq!(current(&session), 1);
}
