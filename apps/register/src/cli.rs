//! # Terminal Front End
//!
//! Startup flags for the `tillquest` binary and the line grammar of its
//! register prompt.
//!
//! ```text
//! tillquest --db shop.db --channel channel.db
//!
//! TillQuest Shop> add 123 "Jump Rope" 4.50 10
//! TillQuest Shop> cart-add 123 2
//! TillQuest Shop> checkout
//! TillQuest Shop> pay {"request_id":"...", ...}
//! ```
//!
//! Every reply is the command's response rendered as pretty JSON, or an
//! `[ERROR_CODE] message` line.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use tillquest_core::{Money, PersonaKind, SalesWindow};
use tillquest_db::KvStore;

use crate::commands::{cart, inventory, payment, progress, sales, system, wallet};
use crate::error::ApiError;
use crate::state::ShopState;

// =============================================================================
// Startup Arguments
// =============================================================================

/// TillQuest register
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "tillquest", version, about = "A play cash register for young shopkeepers")]
pub struct Args {
    /// Config file (default: platform config dir/config.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Shop database file, or :memory:
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Payment channel database shared with another register
    #[arg(long)]
    pub channel: Option<PathBuf>,
}

// =============================================================================
// Prompt Grammar
// =============================================================================

/// One line typed at the register prompt.
#[derive(Debug, Parser)]
#[command(name = "tillquest", no_binary_name = true, disable_version_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PersonaArg {
    Seller,
    Buyer,
}

impl From<PersonaArg> for PersonaKind {
    fn from(arg: PersonaArg) -> Self {
        match arg {
            PersonaArg::Seller => PersonaKind::Seller,
            PersonaArg::Buyer => PersonaKind::Buyer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    // ---- inventory ----------------------------------------------------------
    /// Look up a barcode
    Scan { barcode: String },

    /// Create or replace an item
    Add {
        barcode: String,
        name: String,
        price: Money,
        #[arg(default_value_t = 1)]
        quantity: i64,
    },

    /// Add stock to an item
    Restock { barcode: String, amount: i64 },

    /// Remove an item from the inventory
    RemoveItem { barcode: String },

    /// List the inventory
    Items,

    /// Empty the inventory
    ClearInventory,

    // ---- cart ---------------------------------------------------------------
    /// Show the cart
    Cart,

    /// Put an item in the cart
    CartAdd { barcode: String, quantity: Option<i64> },

    /// Set a line's quantity (0 removes it)
    CartSet { barcode: String, quantity: i64 },

    /// Take a line out of the cart
    CartRemove { barcode: String },

    /// Empty the cart
    CartClear,

    /// Finalize the cart into a sale
    Checkout,

    // ---- sales --------------------------------------------------------------
    /// List sales: today, week, month or all (default)
    Sales {
        #[arg(default_value = "all")]
        window: SalesWindow,
    },

    /// Sales count and revenue for a window
    Summary {
        #[arg(default_value = "today")]
        window: SalesWindow,
    },

    /// Show one sale
    Sale { id: String },

    /// Delete one sale (stock is not restored)
    DeleteSale { id: String },

    /// Delete every sale
    ClearSales,

    // ---- wallet -------------------------------------------------------------
    /// Show the active persona and wallet
    Wallet {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Create a persona
    Persona { kind: PersonaArg, name: String },

    /// Drop the active persona
    Switch,

    /// Top up the wallet
    Load { amount: Money },

    /// Add money to the wallet
    Credit { amount: Money, description: String },

    /// Take money from the wallet
    Debit { amount: Money, description: String },

    /// Zero the wallet and clear its history
    ResetWallet,

    // ---- payment ------------------------------------------------------------
    /// Seller: ask for a payment
    Request {
        amount: Money,
        #[arg(long, default_value = "manual")]
        sale: String,
    },

    /// Show the request on the channel
    Payment,

    /// Buyer: pay a request payload (the rest of the line)
    Pay {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        payload: Vec<String>,
    },

    /// Seller: collect a completed payment
    Check,

    /// Seller: record a payment taken by hand
    Confirm { amount: Option<Money> },

    /// Drop the request on the channel
    Cancel,

    // ---- progress -----------------------------------------------------------
    /// Show level, coins and achievements
    Progress,

    /// List themes
    Themes,

    /// Buy a theme with coins
    Unlock { theme: String },

    /// Switch to an unlocked theme
    Theme { theme: String },

    /// Design a free custom theme and switch to it
    AddTheme { name: String },

    /// Start the game profile over
    ResetProgress,

    // ---- system -------------------------------------------------------------
    /// Wipe everything
    ResetAll,

    /// Leave the register
    #[command(alias = "exit")]
    Quit,
}

/// Splits a prompt line into words.
///
/// A word that starts with a quote runs to the matching quote, so
/// `"Jump Rope"` is one word. Quotes inside a word are kept as typed, which
/// leaves JSON payloads intact.
pub fn split_args(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = line.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        if c == '"' || c == '\'' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == c {
                    break;
                }
                word.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
        }
        words.push(word);
    }

    words
}

// =============================================================================
// Dispatch
// =============================================================================

fn render<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

fn done() -> Result<String, ApiError> {
    render(&json!({ "ok": true }))
}

/// Runs one command against the shop and renders its response.
///
/// `Quit` is the caller's business and renders as nothing.
pub async fn dispatch<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    command: Command,
) -> Result<String, ApiError> {
    match command {
        Command::Scan { barcode } => render(&inventory::scan(state, &barcode).await?),
        Command::Add {
            barcode,
            name,
            price,
            quantity,
        } => render(&inventory::add_item(state, &barcode, &name, price, quantity).await?),
        Command::Restock { barcode, amount } => {
            render(&inventory::restock(state, &barcode, amount).await?)
        }
        Command::RemoveItem { barcode } => render(&inventory::remove_item(state, &barcode).await?),
        Command::Items => render(&inventory::list_items(state).await?),
        Command::ClearInventory => {
            inventory::clear_inventory(state).await?;
            done()
        }

        Command::Cart => render(&cart::get_cart(state).await),
        Command::CartAdd { barcode, quantity } => {
            render(&cart::add_to_cart(state, &barcode, quantity).await?)
        }
        Command::CartSet { barcode, quantity } => {
            render(&cart::set_quantity(state, &barcode, quantity).await?)
        }
        Command::CartRemove { barcode } => render(&cart::remove_from_cart(state, &barcode).await?),
        Command::CartClear => render(&cart::clear_cart(state).await),
        Command::Checkout => render(&cart::checkout(state).await?),

        Command::Sales { window } => render(&sales::list_sales(state, window).await),
        Command::Summary { window } => render(&sales::sales_summary(state, window).await),
        Command::Sale { id } => render(&sales::get_sale(state, &id).await?),
        Command::DeleteSale { id } => render(&sales::delete_sale(state, &id).await?),
        Command::ClearSales => {
            sales::clear_sales(state).await?;
            done()
        }

        Command::Wallet { limit } => render(&wallet::get_wallet(state, limit).await),
        Command::Persona { kind, name } => {
            render(&wallet::create_persona(state, kind.into(), &name).await?)
        }
        Command::Switch => render(&wallet::switch_persona(state).await?),
        Command::Load { amount } => render(&wallet::load_money(state, amount).await?),
        Command::Credit {
            amount,
            description,
        } => render(&wallet::credit(state, amount, &description).await?),
        Command::Debit {
            amount,
            description,
        } => render(&wallet::debit(state, amount, &description).await?),
        Command::ResetWallet => {
            wallet::reset_wallet(state).await?;
            done()
        }

        Command::Request { amount, sale } => {
            render(&payment::request_payment(state, amount, &sale).await?)
        }
        Command::Payment => render(&payment::current_payment(state).await?),
        Command::Pay { payload } => render(&payment::pay(state, &payload.join(" ")).await?),
        Command::Check => render(&payment::check_payment(state).await?),
        Command::Confirm { amount } => render(&payment::confirm_payment(state, amount).await?),
        Command::Cancel => render(&payment::cancel_payment(state).await?),

        Command::Progress => render(&progress::get_progress(state).await),
        Command::Themes => render(&progress::list_themes(state).await),
        Command::Unlock { theme } => render(&progress::unlock_theme(state, &theme).await?),
        Command::Theme { theme } => render(&progress::select_theme(state, &theme).await?),
        Command::AddTheme { name } => render(&progress::add_custom_theme(state, &name).await?),
        Command::ResetProgress => render(&progress::reset_progress(state).await?),

        Command::ResetAll => {
            system::reset_everything(state).await?;
            done()
        }

        Command::Quit => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tillquest_db::MemoryKvStore;

    fn parse(line: &str) -> Command {
        Line::try_parse_from(split_args(line)).unwrap().command
    }

    #[test]
    fn test_split_args() {
        assert_eq!(
            split_args(r#"  add 123 "Jump Rope"  4.50 "#),
            vec!["add", "123", "Jump Rope", "4.50"]
        );
        assert_eq!(
            split_args(r#"pay {"seller_name":"Sam Smith"}"#),
            vec!["pay", r#"{"seller_name":"Sam"#, r#"Smith"}"#]
        );
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(
            parse(r#"add 123 "Jump Rope" 4.50 10"#),
            Command::Add {
                barcode: "123".to_string(),
                name: "Jump Rope".to_string(),
                price: Money::from_cents(450),
                quantity: 10,
            }
        );
        assert_eq!(
            parse("cart-add 123"),
            Command::CartAdd {
                barcode: "123".to_string(),
                quantity: None,
            }
        );
        assert_eq!(
            parse("sales"),
            Command::Sales {
                window: SalesWindow::AllTime
            }
        );
        assert_eq!(
            parse("sales week"),
            Command::Sales {
                window: SalesWindow::ThisWeek
            }
        );
        assert_eq!(
            parse(r#"add-theme "Robot Shop""#),
            Command::AddTheme {
                name: "Robot Shop".to_string()
            }
        );
        assert_eq!(parse("exit"), Command::Quit);
        assert!(Line::try_parse_from(split_args("load lots")).is_err());
        assert!(Line::try_parse_from(split_args("fly")).is_err());
    }

    #[tokio::test]
    async fn test_dispatch_round() {
        let state =
            ShopState::open(MemoryKvStore::new(), MemoryKvStore::new(), Money::from_major(100))
                .await
                .unwrap();

        dispatch(&state, parse(r#"add 123 "Jump Rope" 4.50 10"#))
            .await
            .unwrap();
        dispatch(&state, parse("cart-add 123 2")).await.unwrap();
        let out = dispatch(&state, parse("checkout")).await.unwrap();
        assert!(out.contains("\"total\": 900"));

        let out = dispatch(&state, parse("scan 999")).await.unwrap();
        assert!(out.contains("\"item\": null"));

        let err = dispatch(&state, parse("cart-add 999 1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_pay_joins_payload_words() {
        let channel = MemoryKvStore::new();
        let seller = ShopState::open(MemoryKvStore::new(), channel.clone(), Money::from_major(100))
            .await
            .unwrap();
        let buyer = ShopState::open(MemoryKvStore::new(), channel, Money::from_major(100))
            .await
            .unwrap();

        dispatch(&seller, parse(r#"persona seller "Sam Smith""#))
            .await
            .unwrap();
        dispatch(&buyer, parse("persona buyer Bea")).await.unwrap();

        let request = payment::request_payment(&seller, Money::from_major(3), "sale-1")
            .await
            .unwrap();
        dispatch(&buyer, parse(&format!("pay {}", request.payload)))
            .await
            .unwrap();

        let settled = payment::check_payment(&seller).await.unwrap();
        assert!(settled.settled);
    }
}
