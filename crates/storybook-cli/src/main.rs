//! Storybook CLI: browse the catalog, personalize a book and manage the cart.
//!
//! Set STOREFRONT_API_URL (or API_URL). With STOREFRONT_ACCESS_TOKEN set, requests
//! are authenticated; otherwise a guest session is used.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use storybook_api_client::StorefrontApi;
use storybook_cli::{init_tracing, is_remote, load_photo, Storefront};
use storybook_core::models::{AgeRange, CatalogFilters, Gender, IdealFor};
use storybook_core::{AppError, ErrorMetadata};
use storybook_query::QueryKey;
use storybook_storage::load_pending_personalization;
use storybook_wizard::{CartService, Catalog, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "storybook", about = "Personalized storybook storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog books
    Books {
        /// Search text
        #[arg(long)]
        search: Option<String>,
        /// boy, girl or unisex
        #[arg(long)]
        ideal_for: Option<IdealFor>,
        /// Age range, e.g. 3-5
        #[arg(long)]
        age: Option<AgeRange>,
        /// Language code
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Restore filters from a shared listing query (e.g. "q=space&age=3-5")
        #[arg(long, conflicts_with_all = ["search", "ideal_for", "age", "lang"])]
        url: Option<String>,
        /// Read search text from stdin, one line per keystroke burst
        #[arg(long, conflicts_with = "search")]
        watch: bool,
    },
    /// Show a book by slug
    Book { slug: String },
    /// Personalize a book and add it to the cart
    Personalize {
        /// Book slug
        slug: String,
        /// Child's first name
        #[arg(long)]
        name: String,
        /// Child's age (0-18)
        #[arg(long, allow_hyphen_values = true)]
        age: i64,
        /// male, female or other
        #[arg(long)]
        gender: Gender,
        /// Language code
        #[arg(long)]
        lang: String,
        /// Photo file path or http(s) URL
        #[arg(long)]
        photo: String,
    },
    /// Show a saved personalization draft
    Draft { id: String },
    /// Show the cart, or change it
    Cart {
        #[command(subcommand)]
        sub: Option<CartCommands>,
    },
    /// Show the personalization saved for guest checkout
    Pending,
}

#[derive(Subcommand)]
enum CartCommands {
    /// Remove a cart item
    Remove { item_id: String },
    /// Change the quantity of a cart item
    Update { item_id: String, quantity: u32 },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Surface the user-facing message, keep the detail in the logs.
fn user_error(err: AppError) -> anyhow::Error {
    tracing::debug!(error = %err, code = err.error_code(), "Command failed");
    match err.suggested_action() {
        Some(action) => anyhow::anyhow!("{} ({})", err.client_message(), action),
        None => anyhow::anyhow!(err.client_message()),
    }
}

async fn watch_books(catalog: Catalog) -> anyhow::Result<()> {
    let (tx, rx) = tokio::sync::mpsc::channel(32);
    let mut results = catalog.watch_search(rx);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = results.recv().await {
        match result {
            Ok(page) => print_json(&page)?,
            Err(err) => eprintln!("{}", user_error(err)),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let storefront = Storefront::connect()
        .await
        .context("Failed to set up storefront client. Check STOREFRONT_API_URL")?;

    match cli.command {
        Commands::Books {
            search,
            ideal_for,
            age,
            lang,
            page,
            url,
            watch,
        } => {
            let filters = match url {
                Some(query) => CatalogFilters::from_url_query(&query),
                None => {
                    let mut filters = CatalogFilters::default();
                    filters.set_search(search);
                    filters.set_ideal_for(ideal_for);
                    filters.set_age_range(age);
                    filters.set_language(lang);
                    filters.set_page(page);
                    filters
                }
            };
            let catalog = Catalog::with_filters(
                storefront.api.clone(),
                storefront.queries.clone(),
                filters,
            )
            .with_search_debounce(storefront.config.search_debounce);
            if watch {
                return watch_books(catalog).await;
            }
            let books = catalog.load().await.map_err(user_error)?;
            print_json(&serde_json::json!({
                "query": catalog.url_query(),
                "totalPages": books.total_pages(),
                "page": books,
            }))?;
        }
        Commands::Book { slug } => {
            let book = storefront.api.get_book(&slug).await.map_err(user_error)?;
            print_json(&book)?;
        }
        Commands::Personalize {
            slug,
            name,
            age,
            gender,
            lang,
            photo,
        } => {
            let wizard = storefront.wizard();
            wizard.enter_book(&slug).await.map_err(user_error)?;
            wizard
                .edit_form(|form| {
                    form.child_first_name = name;
                    form.child_age = Some(age);
                    form.gender = Some(gender);
                    form.language_code = Some(lang);
                })
                .map_err(user_error)?;

            if is_remote(&photo) {
                wizard.select_photo_url(&photo).map_err(user_error)?;
            } else {
                let upload = load_photo(&PathBuf::from(&photo)).await?;
                wizard.select_photo(upload).await.map_err(user_error)?;
            }

            let outcome = wizard.submit_child_info().await.map_err(user_error)?;
            let saved = match &outcome {
                SubmitOutcome::Persisted { draft_id } => serde_json::json!({ "draftId": draft_id }),
                SubmitOutcome::SavedAsGuest => serde_json::json!({ "savedForGuest": true }),
                SubmitOutcome::Unpersisted { message } => {
                    tracing::warn!(message = %message, "Personalization not saved yet, will retry at add to cart");
                    serde_json::json!({ "warning": message })
                }
            };

            let route = wizard.add_to_cart().await.map_err(user_error)?;
            print_json(&serde_json::json!({
                "personalization": saved,
                "next": route.path(),
            }))?;
        }
        Commands::Draft { id } => {
            let api = storefront.api.clone();
            let key = QueryKey::personalization(&id);
            let draft = storefront
                .queries
                .fetch(key, move || async move { api.get_personalization(&id).await })
                .await
                .map_err(user_error)?;
            print_json(&draft)?;
        }
        Commands::Cart { sub } => {
            let cart = CartService::new(storefront.api.clone(), storefront.queries.clone());
            match sub {
                None => {
                    let current = cart.cart().await.map_err(user_error)?;
                    print_json(&serde_json::json!({
                        "itemCount": current.item_count(),
                        "cart": current,
                    }))?;
                }
                Some(CartCommands::Remove { item_id }) => {
                    cart.remove_item(&item_id).await.map_err(user_error)?;
                    print_json(&serde_json::json!({
                        "success": true,
                        "message": format!("Cart item {} removed", item_id),
                    }))?;
                }
                Some(CartCommands::Update { item_id, quantity }) => {
                    let item = cart
                        .update_quantity(&item_id, quantity)
                        .await
                        .map_err(user_error)?;
                    print_json(&item)?;
                }
            }
        }
        Commands::Pending => {
            let pending = load_pending_personalization(storefront.guest_store.as_ref())
                .await
                .map_err(|e| user_error(e.into()))?;
            print_json(&pending)?;
        }
    }

    Ok(())
}
