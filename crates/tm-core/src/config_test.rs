use super::*;
use std::fs;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.migrations_dir, "migrations");
    assert_eq!(config.execution, ExecutionMode::InProcess);
    assert_eq!(config.runner.package, "tidemark-runner");
    assert!(config.runner.engine_dependency.starts_with("tm-engine = "));
}

#[test]
fn test_default_engine_dependency_points_at_workspace_sources() {
    let dependency = RunnerConfig::default().engine_dependency;
    assert!(dependency.starts_with("tm-engine = { path = "));

    let engine = engine_source_dir();
    assert!(engine.join("Cargo.toml").is_file());
    assert!(dependency.contains(&format!("{:?}", engine.display().to_string())));
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
migrations_dir: db/migrations
database: "duckdb://warehouse.duckdb"
execution: runner
runner:
  package: my-runner
  engine_dependency: 'tm-engine = { path = "../tm-engine" }'
  cargo: /usr/local/bin/cargo
  work_dir: target/runner
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.migrations_dir, "db/migrations");
    assert_eq!(config.database.as_deref(), Some("duckdb://warehouse.duckdb"));
    assert_eq!(config.execution, ExecutionMode::Runner);
    assert_eq!(config.runner.package, "my-runner");
    assert_eq!(config.runner.cargo, "/usr/local/bin/cargo");

    let root = PathBuf::from("/tmp/project");
    assert_eq!(
        config.migrations_dir_absolute(&root),
        root.join("db/migrations")
    );
    assert_eq!(
        config.runner_work_dir_absolute(&root),
        Some(root.join("target/runner"))
    );
}

#[test]
fn test_unknown_fields_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("migration_dir: typo");
    assert!(result.is_err());
}

#[test]
fn test_load_from_dir_without_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_from_dir_reads_yaml_extension() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yaml"), "migrations_dir: sql\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations_dir, "sql");
}

#[test]
fn test_load_rejects_empty_migrations_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yml"), "migrations_dir: ''\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
fn test_load_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yml"), "execution: sometimes\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("[C003]"));
}
