use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use shopmatch::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Find products by text or photo, look up orders, answer FAQs
#[derive(Parser, Debug)]
#[command(name = "shopmatch")]
#[command(about = "Product matching for a shopping assistant", long_about = None)]
struct Args {
    /// Engine configuration (JSON); defaults apply to anything omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Product catalog CSV
    #[arg(long, global = true, default_value = "products.csv")]
    catalog: PathBuf,

    /// Order table CSV
    #[arg(long, global = true)]
    orders: Option<PathBuf>,

    /// Directory of stored product images
    #[arg(long, global = true, default_value = "images")]
    images: PathBuf,

    /// FAQ replies JSON
    #[arg(long, global = true)]
    faq: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ranked text search with category recommendations
    Search { query: String },
    /// Search by example image
    ImageSearch { image: PathBuf },
    /// Products in a category, best reviewed first
    Recommend { category: String },
    /// Look up an order by number
    OrderStatus { order_no: String },
    /// Canned reply for a known question
    Faq { question: String },
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting shopmatch v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match &args.command {
        Command::Search { query } => {
            let assistant = load_assistant(&args, &config)?;
            print_outcome(assistant.search_by_text(query))
        }
        Command::ImageSearch { image } => {
            let assistant = load_assistant(&args, &config)?;
            let bytes = std::fs::read(image).with_context(|| format!("cannot read {:?}", image))?;
            print_outcome(assistant.search_by_image_bytes(&bytes))
        }
        Command::Recommend { category } => {
            let assistant = load_assistant(&args, &config)?;
            print_json(&assistant.recommend(category))
        }
        Command::OrderStatus { order_no } => {
            let path = args.orders.as_ref().context("--orders is required for order-status")?;
            let orders = OrderBook::from_csv_path(path)?;
            match orders.find(order_no)? {
                Some(order) => print_json(order),
                None => print_json(&Message { message: "Order not found" }),
            }
        }
        Command::Faq { question } => {
            let path = args.faq.as_ref().context("--faq is required for faq")?;
            let replies = IntentReplies::from_json_path(path)?;
            let reply = replies
                .reply(question)?
                .unwrap_or("I'm sorry, I don't understand that. Can you rephrase?");
            print_json(&Message { message: reply })
        }
    }
}

fn load_assistant(args: &Args, config: &EngineConfig) -> anyhow::Result<Assistant> {
    let catalog = Catalog::from_csv_path(&args.catalog)
        .with_context(|| format!("cannot load catalog {:?}", args.catalog))?;
    let provider = Arc::new(DirectoryImageProvider::new(&args.images));
    Ok(Assistant::new(catalog, provider, config)?)
}

/// Print results, or the "nothing found" message; other errors propagate
fn print_outcome<T: Serialize>(outcome: Result<T>) -> anyhow::Result<()> {
    match outcome {
        Ok(found) => print_json(&found),
        Err(e) if e.is_empty_result() => print_json(&Message { message: &e.to_string() }),
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
