//! Read-only administrative reporting over the relay store.
//!
//! Consolidates the diagnostic queries operators need (who is registered,
//! which mappings are live, what is pending, what came in) into one CLI
//! instead of scattered one-off scripts.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context as _, eyre};

use relay_backend::domain::ports::{
    HandshakeRepository, MappingRepository, OrderRepository, RestaurantRepository,
};
use relay_backend::domain::RestaurantUid;
use relay_backend::outbound::persistence::{
    DbPool, DieselHandshakeRepository, DieselMappingRepository, DieselOrderRepository,
    DieselRestaurantRepository, PoolConfig,
};
use relay_backend::settings::RelaySettings;
use ortho_config::OrthoConfig;

/// `admin-report` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "admin-report",
    about = "Read-only reporting over the relay's restaurants, mappings, handshakes, and orders",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `RELAY_DATABASE_URL` or
    /// `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    report: Report,
}

#[derive(Debug, Clone, Subcommand)]
enum Report {
    /// All registrations, newest first.
    Restaurants,
    /// Active website-to-restaurant mappings.
    Mappings,
    /// Pending handshake requests for one restaurant.
    Handshakes {
        /// The restaurant uid to poll as.
        #[arg(long = "restaurant-uid", value_name = "uuid")]
        restaurant_uid: RestaurantUid,
    },
    /// Recent orders for one restaurant, newest first.
    Orders {
        /// The restaurant uid to report on.
        #[arg(long = "restaurant-uid", value_name = "uuid")]
        restaurant_uid: RestaurantUid,
        /// Cap on the number of rows printed.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main())
}

async fn async_main() -> color_eyre::Result<()> {
    let args = CliArgs::parse();
    let database_url = resolve_database_url(args.database_url)?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|err| eyre!("create database pool: {err}"))?;

    let mut out = io::stdout().lock();
    match args.report {
        Report::Restaurants => report_restaurants(&pool, &mut out).await,
        Report::Mappings => report_mappings(&pool, &mut out).await,
        Report::Handshakes { restaurant_uid } => {
            report_handshakes(&pool, restaurant_uid, &mut out).await
        }
        Report::Orders {
            restaurant_uid,
            limit,
        } => report_orders(&pool, restaurant_uid, limit, &mut out).await,
    }
}

fn resolve_database_url(flag: Option<String>) -> color_eyre::Result<String> {
    if let Some(url) = flag {
        return Ok(url);
    }
    let settings = RelaySettings::load().wrap_err("load relay settings")?;
    settings
        .resolve_database_url()
        .map_err(|err| eyre!("{err}"))
}

async fn report_restaurants(pool: &DbPool, out: &mut impl Write) -> color_eyre::Result<()> {
    let repo = DieselRestaurantRepository::new(pool.clone());
    let restaurants = repo.list().await.map_err(|err| eyre!("{err}"))?;
    writeln!(out, "{} registration(s)", restaurants.len())?;
    for restaurant in restaurants {
        writeln!(
            out,
            "{}  website_id={}  active={}  {}  {}",
            restaurant.uid,
            restaurant.website_restaurant_id,
            restaurant.is_active,
            restaurant.name,
            restaurant.callback_url,
        )?;
    }
    Ok(())
}

async fn report_mappings(pool: &DbPool, out: &mut impl Write) -> color_eyre::Result<()> {
    let repo = DieselMappingRepository::new(pool.clone());
    let mappings = repo.list_active().await.map_err(|err| eyre!("{err}"))?;
    writeln!(out, "{} active mapping(s)", mappings.len())?;
    for mapping in mappings {
        writeln!(
            out,
            "website_id={}  ->  {}  last_handshake={}  via_handshake={}",
            mapping.website_restaurant_id,
            mapping.restaurant_uid,
            mapping.last_handshake_at.to_rfc3339(),
            mapping
                .handshake_request_id
                .map_or_else(|| "backfill".to_owned(), |id| id.to_string()),
        )?;
    }
    Ok(())
}

async fn report_handshakes(
    pool: &DbPool,
    restaurant_uid: RestaurantUid,
    out: &mut impl Write,
) -> color_eyre::Result<()> {
    let repo = DieselHandshakeRepository::new(pool.clone());
    let requests = repo
        .list_pending_for_restaurant(&restaurant_uid)
        .await
        .map_err(|err| eyre!("{err}"))?;
    writeln!(out, "{} stored-pending request(s)", requests.len())?;
    for request in requests {
        writeln!(
            out,
            "{}  website_id={}  domain={}  expires_at={}",
            request.id,
            request.website_restaurant_id,
            request.website_domain,
            request.expires_at.to_rfc3339(),
        )?;
    }
    Ok(())
}

async fn report_orders(
    pool: &DbPool,
    restaurant_uid: RestaurantUid,
    limit: i64,
    out: &mut impl Write,
) -> color_eyre::Result<()> {
    let repo = DieselOrderRepository::new(pool.clone());
    let orders = repo
        .list_for_restaurant(&restaurant_uid, limit)
        .await
        .map_err(|err| eyre!("{err}"))?;
    writeln!(out, "{} order(s)", orders.len())?;
    for order in orders {
        writeln!(
            out,
            "{}  #{}  {}  {}  from_website={}  at={}",
            order.id,
            order.order_number,
            order.money.display_with_currency(),
            order.status,
            order.website_restaurant_id,
            order.created_at.to_rfc3339(),
        )?;
    }
    Ok(())
}
