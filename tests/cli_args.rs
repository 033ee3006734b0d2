//! CLI argument parsing tests.

use std::path::PathBuf;

use clap::Parser;
use systemlink::cli::{Cli, Command, FeedsCommand, PlatformArg, ProductsCommand};
use systemlink::{Platform, ProductOrderBy, ProductValuesField};

#[test]
fn test_cli_parses_whoami() {
    let cli = Cli::parse_from(["systemlink", "whoami"]);

    assert!(!cli.json);
    assert!(!cli.verbose);
    assert!(matches!(cli.command, Command::Whoami));
}

#[test]
fn test_cli_parses_products_get() {
    let cli = Cli::parse_from(["systemlink", "products", "get", "5e30934193cac8046851acb2"]);

    match cli.command {
        Command::Products(ProductsCommand::Get { id }) => {
            assert_eq!(id, "5e30934193cac8046851acb2");
        }
        other => panic!("Expected products get, got {other:?}"),
    }
}

#[test]
fn test_cli_parses_products_query() {
    let cli = Cli::parse_from([
        "systemlink",
        "products",
        "query",
        "--filter",
        "family == @0 && name == @1",
        "--sub",
        "cRIO",
        "--sub",
        "cRIO-9030",
        "--take",
        "50",
        "--order-by",
        "part_number",
        "--descending",
        "--all",
    ]);

    match cli.command {
        Command::Products(ProductsCommand::Query {
            filter,
            substitutions,
            take,
            order_by,
            descending,
            continuation_token,
            all,
        }) => {
            assert_eq!(filter.as_deref(), Some("family == @0 && name == @1"));
            assert_eq!(substitutions, vec!["cRIO", "cRIO-9030"]);
            assert_eq!(take, Some(50));
            assert_eq!(order_by, Some(ProductOrderBy::PartNumber));
            assert!(descending);
            assert!(continuation_token.is_none());
            assert!(all);
        }
        other => panic!("Expected products query, got {other:?}"),
    }
}

#[test]
fn test_cli_query_accepts_wire_order_name() {
    let cli = Cli::parse_from(["systemlink", "products", "query", "--order-by", "UPDATED_AT"]);

    match cli.command {
        Command::Products(ProductsCommand::Query { order_by, .. }) => {
            assert_eq!(order_by, Some(ProductOrderBy::UpdatedAt));
        }
        other => panic!("Expected products query, got {other:?}"),
    }
}

#[test]
fn test_cli_rejects_unknown_order_field() {
    let result = Cli::try_parse_from(["systemlink", "products", "query", "--order-by", "color"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_parses_products_delete() {
    let cli = Cli::parse_from(["systemlink", "products", "delete", "a", "b"]);

    match cli.command {
        Command::Products(ProductsCommand::Delete { ids }) => {
            assert_eq!(ids, vec!["a", "b"]);
        }
        other => panic!("Expected products delete, got {other:?}"),
    }
}

#[test]
fn test_cli_delete_requires_ids() {
    let result = Cli::try_parse_from(["systemlink", "products", "delete"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_parses_products_values() {
    let cli = Cli::parse_from(["systemlink", "products", "values", "family", "--starts-with", "c"]);

    match cli.command {
        Command::Products(ProductsCommand::Values { field, starts_with }) => {
            assert_eq!(field, ProductValuesField::Family);
            assert_eq!(starts_with.as_deref(), Some("c"));
        }
        other => panic!("Expected products values, got {other:?}"),
    }
}

#[test]
fn test_cli_parses_feeds_list() {
    let cli = Cli::parse_from(["systemlink", "feeds", "list", "--platform", "linux"]);

    match cli.command {
        Command::Feeds(FeedsCommand::List { platform, workspace }) => {
            assert_eq!(platform, Some(PlatformArg::NiLinuxRt));
            assert_eq!(platform.map(Platform::from), Some(Platform::NiLinuxRt));
            assert!(workspace.is_none());
        }
        other => panic!("Expected feeds list, got {other:?}"),
    }
}

#[test]
fn test_cli_parses_feeds_upload() {
    let cli = Cli::parse_from([
        "systemlink",
        "feeds",
        "upload",
        "--feed",
        "Tools",
        "--workspace",
        "Lab",
        "--overwrite",
        "a.nipkg",
        "b.ipk",
    ]);

    match cli.command {
        Command::Feeds(FeedsCommand::Upload {
            feed,
            workspace,
            overwrite,
            paths,
        }) => {
            assert_eq!(feed, "Tools");
            assert_eq!(workspace.as_deref(), Some("Lab"));
            assert!(overwrite);
            assert_eq!(paths, vec![PathBuf::from("a.nipkg"), PathBuf::from("b.ipk")]);
        }
        other => panic!("Expected feeds upload, got {other:?}"),
    }
}

#[test]
fn test_cli_upload_requires_feed() {
    let result = Cli::try_parse_from(["systemlink", "feeds", "upload", "a.nipkg"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_global_flags_after_subcommand() {
    let cli = Cli::parse_from(["systemlink", "products", "get", "p1", "--json", "-v"]);

    assert!(cli.json);
    assert!(cli.verbose);
}
