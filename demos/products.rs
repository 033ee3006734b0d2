//! Walk the product catalog and show who the API key belongs to.
//!
//! Run with:
//! ```
//! SYSTEMLINK_API_KEY=your-key cargo run --example products -- cRIO
//! ```

use systemlink::{
    authenticate, fetch_pages, query_product_values, Get, Product, ProductField, ProductQuery,
    ProductValuesField, ProductValuesQuery, QueryProducts, SystemLinkClient,
};

#[tokio::main]
async fn main() -> systemlink::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    let family = std::env::args().nth(1).unwrap_or_else(|| "cRIO".to_string());

    println!("Creating SystemLink client...");
    let client = SystemLinkClient::from_env()?;
    println!("Connected to: {}", client.base_url());

    let info = authenticate(&client).await?;
    if let Some(name) = info.user.as_ref().and_then(|u| u.display_name()) {
        println!("Signed in as {name}");
    }

    println!("\n--- Product families ---");
    let families =
        query_product_values(&client, &ProductValuesQuery::new(ProductValuesField::Family)).await?;
    for name in &families {
        println!("  - {name}");
    }

    println!("\n--- Products in '{family}' (10 per page) ---");
    let query = ProductQuery::builder()
        .filter("family == @0")
        .substitution(family.as_str())
        .project(ProductField::Id)
        .project(ProductField::PartNumber)
        .project(ProductField::Name)
        .take(10)
        .return_count(true)
        .build()?;

    let source = QueryProducts::new(&client);
    let mut pages = fetch_pages(&source, query);
    let mut first_id = None;
    while let Some(page) = pages.next_page().await {
        let page = page?;
        for product in &page {
            println!(
                "  - {} {}",
                product.part_number().unwrap_or("-"),
                product.name.as_deref().unwrap_or("")
            );
            if first_id.is_none() {
                first_id = product.id().map(str::to_string);
            }
        }
    }
    println!(
        "{} page(s), {} product(s) in total",
        pages.pages_fetched(),
        pages.total_count().unwrap_or(0)
    );

    if let Some(id) = first_id {
        println!("\n--- Full record of the first product ---");
        let product = Product::get(&client, id).await?;
        println!("{}", serde_json::to_string_pretty(&product)?);
    }

    Ok(())
}
