use super::*;
use tempfile::TempDir;

fn name(raw: &str) -> MigrationName {
    MigrationName::parse(raw).unwrap()
}

fn layout() -> (TempDir, MigrationLayout) {
    let dir = TempDir::new().unwrap();
    let layout = MigrationLayout::new(dir.path().join("migrations"));
    (dir, layout)
}

#[test]
fn test_missing_root_has_no_entries() {
    let (_dir, layout) = layout();
    assert!(layout.entries().unwrap().is_empty());
}

#[test]
fn test_create_writes_all_files() {
    let (_dir, layout) = layout();
    let n = name("20240101000000_create_users");
    let dir = layout.create(&n, "// entry").unwrap();

    assert_eq!(dir, layout.root().join("20240101000000_create_users"));
    assert_eq!(std::fs::read_to_string(dir.join(UP_SQL)).unwrap(), "");
    assert_eq!(std::fs::read_to_string(dir.join(DOWN_SQL)).unwrap(), "");
    assert_eq!(
        std::fs::read_to_string(dir.join(ENTRY_FILE)).unwrap(),
        "// entry"
    );
}

#[test]
fn test_create_keeps_existing_files() {
    let (_dir, layout) = layout();
    let n = name("20240101000000_create_users");
    let dir = layout.create(&n, "// entry").unwrap();
    std::fs::write(dir.join(UP_SQL), "CREATE TABLE users (id INTEGER);").unwrap();

    layout.create(&n, "// other").unwrap();
    assert_eq!(
        layout.read_sql(&n, Direction::Up).unwrap(),
        "CREATE TABLE users (id INTEGER);"
    );
    assert_eq!(
        std::fs::read_to_string(dir.join(ENTRY_FILE)).unwrap(),
        "// entry"
    );
}

#[test]
fn test_entries_sorted_and_filtered() {
    let (_dir, layout) = layout();
    layout.create(&name("20240102000000_b"), "").unwrap();
    layout.create(&name("20240101000000_a"), "").unwrap();
    std::fs::create_dir_all(layout.root().join("notes")).unwrap();
    std::fs::create_dir_all(layout.root().join("००००००००००००००_x")).unwrap();
    std::fs::write(layout.root().join("README.md"), "hi").unwrap();

    let entries = layout.entries().unwrap();
    assert_eq!(
        entries,
        vec![name("20240101000000_a"), name("20240102000000_b")]
    );
}

#[test]
fn test_label_conflict_and_resolve() {
    let (_dir, layout) = layout();
    let n = name("20240101000000_create_users");
    layout.create(&n, "").unwrap();

    assert_eq!(layout.find_label_conflict("create_users").unwrap(), Some(n.clone()));
    assert_eq!(layout.find_label_conflict("create").unwrap(), None);
    assert_eq!(layout.resolve("create_users").unwrap(), Some(n.clone()));
    assert_eq!(
        layout.resolve("20240101000000_create_users").unwrap(),
        Some(n)
    );
    assert_eq!(layout.resolve("ghost").unwrap(), None);
}

#[test]
fn test_delete_and_discard() {
    let (_dir, layout) = layout();
    let n = name("20240101000000_a");
    layout.create(&n, "").unwrap();
    layout.delete(&n).unwrap();
    assert!(!layout.dir_for(&n).exists());

    assert!(matches!(
        layout.delete(&n),
        Err(EngineError::Filesystem { .. })
    ));
    // Discarding something already gone is silent
    layout.discard(&n);
}

#[test]
fn test_read_sql_missing_file_is_filesystem_error() {
    let (_dir, layout) = layout();
    let err = layout
        .read_sql(&name("20240101000000_a"), Direction::Down)
        .unwrap_err();
    assert!(err.to_string().starts_with("[T008]"));
}

#[test]
fn test_resolve_root_empty_uses_current_dir() {
    let layout = MigrationLayout::resolve_root(Path::new("")).unwrap();
    assert_eq!(layout.root(), std::env::current_dir().unwrap());
}
