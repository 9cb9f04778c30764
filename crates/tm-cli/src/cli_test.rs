use super::*;
use clap::{CommandFactory, Parser};

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_up_parses_version_and_flags() {
    let cli = Cli::try_parse_from(["tm", "up", "--version", "3", "--runner", "-m", "app-runner"])
        .unwrap();
    match cli.command {
        Commands::Up(args) => {
            assert_eq!(args.version, Some(3));
            assert!(args.runner);
            assert!(!args.gen_only);
            assert_eq!(args.module.as_deref(), Some("app-runner"));
        }
        other => panic!("expected up, got {other:?}"),
    }
}

#[test]
fn test_version_is_optional_at_parse_time() {
    let cli = Cli::try_parse_from(["tm", "down"]).unwrap();
    match cli.command {
        Commands::Down(args) => assert_eq!(args.version, None),
        other => panic!("expected down, got {other:?}"),
    }
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from([
        "tm",
        "add",
        "--name",
        "create_users",
        "--db",
        "duckdb://dev.duckdb",
        "-v",
    ])
    .unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.db.as_deref(), Some("duckdb://dev.duckdb"));
    assert_eq!(cli.global.project_dir, ".");
    match cli.command {
        Commands::Add(args) => assert_eq!(args.name.as_deref(), Some("create_users")),
        other => panic!("expected add, got {other:?}"),
    }
}

#[test]
fn test_status_defaults() {
    let cli = Cli::try_parse_from(["tm", "status"]).unwrap();
    match cli.command {
        Commands::Status(args) => {
            assert!(!args.json);
            assert_eq!(args.history, 10);
        }
        other => panic!("expected status, got {other:?}"),
    }
}

#[test]
fn test_unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["tm", "migrate"]).is_err());
}
