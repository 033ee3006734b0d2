//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! `systemlink` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{Platform, ProductOrderBy, ProductValuesField};

/// SystemLink command-line interface.
#[derive(Parser, Debug)]
#[command(name = "systemlink", about = "SystemLink API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Log requests to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the user, org and workspaces behind the API key.
    Whoami,

    /// Work with test monitor products.
    #[command(subcommand)]
    Products(ProductsCommand),

    /// Work with package feeds.
    #[command(subcommand)]
    Feeds(FeedsCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProductsCommand {
    /// Get a single product by ID.
    Get {
        /// The product ID.
        id: String,
    },

    /// Query products with a filter.
    Query {
        /// Filter expression, e.g. "family == @0".
        #[arg(long)]
        filter: Option<String>,

        /// Value for the next @N placeholder. Repeat in order.
        #[arg(long = "sub", value_name = "VALUE")]
        substitutions: Vec<String>,

        /// Number of products per page.
        #[arg(long)]
        take: Option<i64>,

        /// Field to order by.
        #[arg(long, value_parser = parse_order_by)]
        order_by: Option<ProductOrderBy>,

        /// Reverse the ordering.
        #[arg(long)]
        descending: bool,

        /// Continue from a token printed by an earlier page.
        #[arg(long)]
        continuation_token: Option<String>,

        /// Follow continuation tokens and print every page.
        #[arg(long)]
        all: bool,
    },

    /// Delete products by ID.
    Delete {
        /// IDs of the products to delete.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List the distinct values of a product field.
    Values {
        /// Field whose values are listed.
        #[arg(value_parser = parse_values_field)]
        field: ProductValuesField,

        /// Only values starting with this prefix.
        #[arg(long)]
        starts_with: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FeedsCommand {
    /// List feeds.
    List {
        #[arg(long)]
        platform: Option<PlatformArg>,

        /// Workspace ID.
        #[arg(long)]
        workspace: Option<String>,
    },

    /// Upload package files into a feed, creating it if needed.
    Upload {
        /// Feed name.
        #[arg(long)]
        feed: String,

        /// Workspace name.
        #[arg(long)]
        workspace: Option<String>,

        /// Replace packages that already exist.
        #[arg(long)]
        overwrite: bool,

        /// Package files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// Feed platforms accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformArg {
    Windows,
    #[value(alias = "linux")]
    NiLinuxRt,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::NiLinuxRt => Platform::NiLinuxRt,
        }
    }
}

fn parse_order_by(s: &str) -> Result<ProductOrderBy, String> {
    s.parse().map_err(|e: crate::SystemLinkError| e.to_string())
}

fn parse_values_field(s: &str) -> Result<ProductValuesField, String> {
    s.parse().map_err(|e: crate::SystemLinkError| e.to_string())
}
