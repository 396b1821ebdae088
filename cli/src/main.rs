use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::Context;
use catalog_core::{ChannelNotifier, Level, Notification, ProductForm, ProductId, ProductStore, TransportConfig};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

mod view;

const INCOMPLETE_FORM: &str = "Please fill in all fields";

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Browse and edit the product catalog")]
struct Cli {
    /// API origin.
    #[arg(long, env = "CATALOG_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Request timeout in seconds. No timeout when omitted.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all products.
    List,
    /// Show one product.
    Get { id: ProductId },
    /// Add a product.
    Create(CreateArgs),
    /// Edit a product. Omitted fields keep their current value.
    Update(UpdateArgs),
    /// Delete a product.
    Delete { id: ProductId },
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    image: String,
}

impl CreateArgs {
    fn into_form(self) -> ProductForm {
        ProductForm::new(self.name, self.price, self.image)
    }
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: ProductId,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    image: Option<String>,
}

impl UpdateArgs {
    fn apply(self, mut form: ProductForm) -> ProductForm {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(price) = self.price {
            form.price = price;
        }
        if let Some(image) = self.image {
            form.image = image;
        }
        form
    }
}

/// Print queued notifications; true if any reported a failure.
fn drain(notes: &mut UnboundedReceiver<Notification>) -> bool {
    let mut failed = false;
    while let Ok(note) = notes.try_recv() {
        failed |= note.level == Level::Error;
        match note.level {
            Level::Success => println!("{}", view::notification(&note)),
            Level::Error => eprintln!("{}", view::notification(&note)),
        }
    }
    failed
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (notifier, mut notes) = ChannelNotifier::new();
    let config = TransportConfig {
        timeout: cli.timeout_secs.map(Duration::from_secs),
        ..TransportConfig::default()
    };
    let store = ProductStore::connect(&cli.base_url, config, Arc::new(notifier))
        .context("failed to build HTTP client")?;

    let failed = match cli.command {
        Command::List => {
            store.list_products().await;
            let state = store.state();
            match view::error_banner(&state) {
                Some(banner) => {
                    eprintln!("{banner}");
                    true
                }
                None => {
                    print!("{}", view::product_table(&state.products));
                    false
                }
            }
        }
        Command::Get { id } => {
            store.fetch_product(id).await;
            let state = store.state();
            match (&state.current_product, view::error_banner(&state)) {
                (Some(product), None) => {
                    print!("{}", view::product_detail(product));
                    false
                }
                (_, banner) => {
                    eprintln!("{}", banner.unwrap_or_else(|| "Product not found".to_string()));
                    true
                }
            }
        }
        Command::Create(args) => {
            let form = args.into_form();
            if !form.is_complete() {
                eprintln!("{}", view::notification(&Notification::error(INCOMPLETE_FORM)));
                return Ok(ExitCode::FAILURE);
            }
            store.set_form_data(form);
            store.create_product().await;
            let failed = drain(&mut notes);
            if !failed {
                print!("{}", view::product_table(&store.state().products));
            }
            failed
        }
        Command::Update(args) => {
            let id = args.id;
            store.fetch_product(id).await;
            let state = store.state();
            if let Some(banner) = view::error_banner(&state) {
                eprintln!("{banner}");
                return Ok(ExitCode::FAILURE);
            }
            store.set_form_data(args.apply(state.form_data));
            store.update_product(id).await;
            let failed = drain(&mut notes);
            if let (false, Some(product)) = (failed, store.state().current_product) {
                print!("{}", view::product_detail(&product));
            }
            failed
        }
        Command::Delete { id } => {
            store.delete_product(id).await;
            drain(&mut notes)
        }
    };

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    run(Cli::parse()).await
}
