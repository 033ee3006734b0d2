//! SystemLink API CLI binary.
//!
//! A command-line interface for interacting with the SystemLink APIs.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use systemlink::cli::{Cli, Command, FeedsCommand, ProductsCommand};
use systemlink::{
    Feed, FeedQuery, Get, Page, PrettyPrint, Product, ProductQuery, ProductValuesQuery,
    SystemLinkClient, UploadOptions,
};
use tabled::{Table, Tabled};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let client = match SystemLinkClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!(
                "Hint: Set SYSTEMLINK_API_KEY (and SYSTEMLINK_SERVER_URI) environment variables"
            );
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &SystemLinkClient, cli: Cli) -> systemlink::Result<()> {
    match cli.command {
        Command::Whoami => {
            let info = systemlink::authenticate(client).await?;
            output_single(&info, cli.json)
        }
        Command::Products(command) => handle_products(client, command, cli.json).await,
        Command::Feeds(command) => handle_feeds(client, command, cli.json).await,
    }
}

async fn handle_products(
    client: &SystemLinkClient,
    command: ProductsCommand,
    json: bool,
) -> systemlink::Result<()> {
    match command {
        ProductsCommand::Get { id } => {
            let product = Product::get(client, id).await?;
            output_single(&product, json)?;
        }
        ProductsCommand::Query {
            filter,
            substitutions,
            take,
            order_by,
            descending,
            continuation_token,
            all,
        } => {
            let mut builder = ProductQuery::builder()
                .substitutions(substitutions)
                .descending(descending)
                .return_count(true);
            if let Some(filter) = filter {
                builder = builder.filter(filter);
            }
            if let Some(take) = take {
                builder = builder.take(take);
            }
            if let Some(order_by) = order_by {
                builder = builder.order_by(order_by);
            }
            if let Some(token) = continuation_token {
                builder = builder.continuation_token(token);
            }
            let query = builder.build()?;

            if all {
                let products = systemlink::query_products(client, query).await?;
                output_list(&products, json, |p| ProductRow::from(p))?;
            } else {
                let page = systemlink::query_products_page(client, &query).await?;
                output_page(&page, json, |p| ProductRow::from(p))?;
            }
        }
        ProductsCommand::Delete { ids } => {
            let result = if ids.len() == 1 {
                systemlink::delete_product(client, &ids[0]).await?;
                systemlink::DeleteResponse {
                    ids,
                    ..Default::default()
                }
            } else {
                systemlink::delete_products(client, ids).await?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Deleted {} product(s)", result.ids.len());
                if let Some(ref failed) = result.failed {
                    println!("Failed: {}", failed.join(", "));
                }
            }
        }
        ProductsCommand::Values { field, starts_with } => {
            let mut query = ProductValuesQuery::new(field);
            if let Some(prefix) = starts_with {
                query = query.starts_with(prefix);
            }
            let values = systemlink::query_product_values(client, &query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                for value in values {
                    println!("{value}");
                }
            }
        }
    }
    Ok(())
}

async fn handle_feeds(
    client: &SystemLinkClient,
    command: FeedsCommand,
    json: bool,
) -> systemlink::Result<()> {
    match command {
        FeedsCommand::List {
            platform,
            workspace,
        } => {
            let query = FeedQuery {
                platform: platform.map(Into::into),
                workspace,
            };
            let feeds = systemlink::query_feeds(client, &query).await?;
            output_list(&feeds, json, |f| FeedRow::from(f))?;
        }
        FeedsCommand::Upload {
            feed,
            workspace,
            overwrite,
            paths,
        } => {
            let options = UploadOptions {
                feed_name: feed,
                workspace,
                overwrite,
            };
            let report = systemlink::upload_packages(client, &options, &paths).await?;

            if json {
                #[derive(Serialize)]
                struct ReportJson<'a> {
                    uploaded: &'a [String],
                    failed: Vec<(String, &'a str)>,
                }
                let failed = report
                    .failed
                    .iter()
                    .map(|(p, e)| (p.display().to_string(), e.as_str()))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ReportJson {
                        uploaded: &report.uploaded,
                        failed,
                    })?
                );
            } else {
                for name in &report.uploaded {
                    println!("uploaded  {name}");
                }
                for (path, error) in &report.failed {
                    println!("failed    {}: {error}", path.display());
                }
            }

            if !report.is_complete_success() {
                return Err(systemlink::SystemLinkError::Validation(format!(
                    "{} package(s) failed to upload",
                    report.failed.len()
                )));
            }
        }
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> systemlink::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_list<T, R, F>(items: &[T], json: bool, to_row: F) -> systemlink::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn output_page<T, R, F>(page: &Page<T>, json: bool, to_row: F) -> systemlink::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
    } else {
        let rows: Vec<R> = page.items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        match (&page.continuation_token, page.total_count) {
            (Some(token), Some(total)) => println!(
                "\n{} of {} total (next: --continuation-token {})",
                page.len(),
                total,
                token
            ),
            (Some(token), None) => {
                println!("\nMore available (next: --continuation-token {})", token)
            }
            (None, Some(total)) => println!("\n{} of {} total (end)", page.len(), total),
            (None, None) => println!("\n(end)"),
        }
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct ProductRow {
    id: String,
    #[tabled(rename = "part number")]
    part_number: String,
    name: String,
    family: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id().unwrap_or_default().to_string(),
            part_number: p.part_number().unwrap_or_default().to_string(),
            name: p.name.as_deref().unwrap_or_default().to_string(),
            family: p.family.as_deref().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Tabled)]
struct FeedRow {
    id: String,
    name: String,
    platform: String,
    workspace: String,
}

impl From<&Feed> for FeedRow {
    fn from(f: &Feed) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            platform: f.platform.to_string(),
            workspace: f.workspace.clone().unwrap_or_default(),
        }
    }
}
