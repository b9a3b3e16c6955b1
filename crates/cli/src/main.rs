//! Slaash CLI - database migrations, user management and Shopify store tools.
//!
//! # Usage
//!
//! ```bash
//! # Run dashboard database migrations
//! slaash-cli migrate
//!
//! # Create a dashboard user for store 1
//! slaash-cli user create -e staff@acme.test -f Ada -l Lovelace -s 1 -a staff -p 'correct horse battery'
//!
//! # Inspect a connected store
//! slaash-cli shop -s 1 products --limit 10
//! slaash-cli shop -s 1 price-rules
//!
//! # Upload the storefront script to the published theme
//! slaash-cli shop -s acme.myshopify.com push-script ./dist/global-slaash.js
//!
//! # Schedule a campaign and add a product to it
//! slaash-cli campaign -s 1 create --discount 15 --days 7 --active
//! slaash-cli campaign -s 1 add-product 12 --product-id 42 --title 'Ceramic Mug' --discount 15 --price 2400
//!
//! # Shoppers recorded for a store
//! slaash-cli buyer -s 1 list
//! ```
//!
//! Every `-s/--store` argument takes a store id or a shop domain.
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create a dashboard user with a password
//! - `shop` - Read and manage a connected store through the Admin API
//! - `campaign` - Create and inspect campaigns and their products
//! - `buyer` - Record and list buyers

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "slaash-cli")]
#[command(author, version, about = "Slaash dashboard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage dashboard users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Shopify tools for one connected store
    Shop {
        /// Store id or shop domain
        #[arg(short, long)]
        store: String,

        #[command(subcommand)]
        action: ShopAction,
    },
    /// Campaigns of one store
    Campaign {
        /// Store id or shop domain
        #[arg(short, long)]
        store: String,

        #[command(subcommand)]
        action: CampaignAction,
    },
    /// Buyers of one store
    Buyer {
        /// Store id or shop domain
        #[arg(short, long)]
        store: String,

        #[command(subcommand)]
        action: BuyerAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new dashboard user
    Create {
        /// Email address (login name)
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        first_name: String,

        #[arg(short, long)]
        last_name: String,

        /// Store the user belongs to
        #[arg(short, long)]
        store: i32,

        /// Access level (`owner`, `admin`, `staff`)
        #[arg(short, long, default_value = "staff")]
        access_level: String,

        /// Initial password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
pub enum ShopAction {
    /// List products
    Products {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// List recent orders
    Orders {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// List customers
    Customers {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Orders placed by one customer
    CustomerOrders { customer_id: i64 },
    /// List abandoned checkouts
    AbandonedCheckouts {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// List price rules
    PriceRules {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// List the discount codes of a price rule
    DiscountCodes { price_rule_id: i64 },
    /// Delete a discount code
    DeleteDiscountCode {
        price_rule_id: i64,
        discount_code_id: i64,
    },
    /// List webhook subscriptions
    Webhooks,
    /// Subscribe an address to a webhook topic
    RegisterWebhook {
        /// e.g. `orders/create`
        topic: String,
        address: String,
    },
    /// Upload the storefront script to the published theme
    PushScript { path: PathBuf },
}

#[derive(Subcommand)]
pub enum CampaignAction {
    /// List campaigns, newest first
    List,
    /// Create a campaign starting now
    Create {
        /// Discount percentage
        #[arg(long)]
        discount: i32,

        /// Length in days
        #[arg(long, default_value_t = 7)]
        days: i64,

        /// Mark the campaign active
        #[arg(long)]
        active: bool,
    },
    /// Add a product to a campaign
    AddProduct {
        campaign_id: i32,

        /// Shopify product id
        #[arg(long)]
        product_id: i64,

        #[arg(long)]
        title: String,

        /// Deal discount percentage
        #[arg(long)]
        discount: i32,

        /// Price in the store currency's minor unit
        #[arg(long)]
        price: i64,

        /// Local price rule id backing the deal
        #[arg(long)]
        price_rule: Option<i32>,
    },
    /// List the products of a campaign
    Products { campaign_id: i32 },
}

#[derive(Subcommand)]
pub enum BuyerAction {
    /// List buyers, most recent first
    List,
    /// Record a shopper seen on a product
    Record {
        /// Storefront device id
        #[arg(long)]
        anonymous_id: String,

        /// Shopify product id
        #[arg(long)]
        product_id: i64,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        got_deal: bool,

        #[arg(long)]
        clicked_deal: bool,

        /// Campaign product the deal came from
        #[arg(long)]
        campaign_product: Option<i32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                first_name,
                last_name,
                store,
                access_level,
                password,
            } => {
                commands::user::create(&commands::user::CreateUser {
                    email,
                    first_name,
                    last_name,
                    store_id: store,
                    access_level,
                    password,
                })
                .await?;
            }
        },
        Commands::Shop { store, action } => commands::shop::run(&store, action).await?,
        Commands::Campaign { store, action } => commands::campaign::run(&store, action).await?,
        Commands::Buyer { store, action } => commands::buyer::run(&store, action).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_store_accepts_domain() {
        let cli = Cli::try_parse_from(["slaash-cli", "shop", "-s", "acme.myshopify.com", "webhooks"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Shop { ref store, action: ShopAction::Webhooks } if store == "acme.myshopify.com"
        ));
    }

    #[test]
    fn test_campaign_add_product_args() {
        let cli = Cli::try_parse_from([
            "slaash-cli",
            "campaign",
            "--store",
            "1",
            "add-product",
            "12",
            "--product-id",
            "42",
            "--title",
            "Ceramic Mug",
            "--discount",
            "15",
            "--price",
            "2400",
        ])
        .unwrap();
        let Commands::Campaign { store, action } = cli.command else {
            panic!("expected campaign command");
        };
        assert_eq!(store, "1");
        assert!(matches!(
            action,
            CampaignAction::AddProduct {
                campaign_id: 12,
                product_id: 42,
                discount: 15,
                price: 2400,
                price_rule: None,
                ..
            }
        ));
    }

    #[test]
    fn test_campaign_create_defaults() {
        let cli =
            Cli::try_parse_from(["slaash-cli", "campaign", "-s", "1", "create", "--discount", "20"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Campaign {
                action: CampaignAction::Create {
                    discount: 20,
                    days: 7,
                    active: false
                },
                ..
            }
        ));
    }

    #[test]
    fn test_buyer_record_flags() {
        let cli = Cli::try_parse_from([
            "slaash-cli",
            "buyer",
            "-s",
            "acme.myshopify.com",
            "record",
            "--anonymous-id",
            "dev-1",
            "--product-id",
            "42",
            "--got-deal",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Buyer {
                action: BuyerAction::Record {
                    got_deal: true,
                    clicked_deal: false,
                    email: None,
                    ..
                },
                ..
            }
        ));
    }
}
