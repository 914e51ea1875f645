mod products;

use catalog_core::SortOrder;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Browse and edit the product catalog")]
struct Cli {
    /// Base URL of the catalog API
    #[arg(
        long,
        env = "CATALOG_API_URL",
        default_value = "http://localhost:5100",
        global = true
    )]
    api_url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the home screen, optionally searching and scrolling further
    Browse {
        /// Search term (name, description, image or exact price)
        #[arg(long)]
        search: Option<String>,
        /// Sort by price
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortOrder>,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        image: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update fields of an existing product
    Update {
        /// Product id
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
}

fn parse_sort(raw: &str) -> Result<SortOrder, String> {
    SortOrder::parse(raw).ok_or_else(|| format!("expected 'asc' or 'desc', got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("catalog-cli: pass a subcommand (see --help)");
        return Ok(());
    };

    let client = catalog_client::CatalogClient::new(&cli.api_url, cli.timeout_secs)?;
    let store = catalog_client::ClientStore::new(client);

    match command {
        Commands::Browse {
            search,
            sort,
            pages,
        } => products::run_browse(store, search, sort, pages).await?,
        Commands::Create {
            name,
            price,
            image,
            description,
        } => products::run_create(&store, name, price, image, description).await?,
        Commands::Update {
            id,
            name,
            price,
            image,
            description,
        } => products::run_update(&store, &id, name, price, image, description).await?,
        Commands::Delete { id } => products::run_delete(&store, &id).await?,
    }

    Ok(())
}
