//! Exchange Core - Binary Entry Point
//!
//! Opens the configured markets, runs a short scripted session against the
//! first one and prints the resulting book.
//!
//! ```bash
//! RUST_LOG=debug cargo run -- exchange.toml
//! ```

use std::env;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use exchange_core::exchange::{ChannelNotifier, LoggingSettlement};
use exchange_core::types::price::{from_fixed_trimmed, to_fixed};
use exchange_core::{BookSnapshot, Exchange, ExchangeConfig, PlaceOrderRequest, Side};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => ExchangeConfig::from_file(&path).with_context(|| format!("loading config from {path}"))?,
        None => ExchangeConfig::default(),
    };

    let (notifier, changes) = ChannelNotifier::bounded(config.notify_capacity);
    let exchange = Arc::new(Exchange::from_config(
        &config,
        Arc::new(LoggingSettlement),
        Arc::new(notifier),
    )?);

    // Broadcaster: reads the latest snapshot for every signalled market.
    // Holds a weak handle so dropping the exchange closes the channel.
    let broadcaster = {
        let exchange = Arc::downgrade(&exchange);
        thread::spawn(move || {
            for market in changes {
                let Some(exchange) = exchange.upgrade() else { break };
                if let Ok(book) = exchange.book(&market) {
                    info!(%market, orders = book.order_count(), digest = %book.digest_hex(), "book changed");
                }
            }
        })
    };

    let market = config
        .markets
        .first()
        .map(|m| m.symbol.clone())
        .context("no markets configured")?;
    let px = |s: &str| to_fixed(s).with_context(|| format!("bad fixed-point literal {s}"));

    exchange.place_order(PlaceOrderRequest::limit(market.clone(), 1, Side::Sell, px("2001.5")?, px("1.5")?))?;
    exchange.place_order(PlaceOrderRequest::limit(market.clone(), 2, Side::Sell, px("2002")?, px("3")?))?;
    exchange.place_order(PlaceOrderRequest::limit(market.clone(), 3, Side::Buy, px("1999")?, px("2")?))?;
    let resting = exchange.place_order(PlaceOrderRequest::limit(market.clone(), 4, Side::Buy, px("1998.25")?, px("4")?))?;

    let sweep = exchange.place_order(PlaceOrderRequest::market(market.clone(), 5, Side::Buy, px("2.5")?))?;
    info!(order_id = sweep.order_id, fills = sweep.matches.len(), "market buy executed");

    if let Err(err) = exchange.place_order(PlaceOrderRequest::market(market.clone(), 6, Side::Sell, px("100")?)) {
        info!(%err, "oversized market sell rejected");
    }

    exchange.cancel_order(resting.order_id)?;

    let book = exchange.book(&market)?;
    print_book(market.as_str(), &book);

    // Closing the exchange drops the last sender and ends the broadcaster
    drop(exchange);
    broadcaster
        .join()
        .map_err(|_| anyhow::anyhow!("broadcaster thread panicked"))?;

    Ok(())
}

fn print_book(market: &str, book: &BookSnapshot) {
    println!("===========================================");
    println!("  {market}");
    println!("===========================================");
    for level in book.asks.iter().rev() {
        println!("  ASK {:>16} x {:<12} ({} orders)", from_fixed_trimmed(level.price), from_fixed_trimmed(level.volume), level.orders.len());
    }
    println!("  ---");
    for level in &book.bids {
        println!("  BID {:>16} x {:<12} ({} orders)", from_fixed_trimmed(level.price), from_fixed_trimmed(level.volume), level.orders.len());
    }
    println!();
    println!("  bid volume: {}", from_fixed_trimmed(book.bid_volume));
    println!("  ask volume: {}", from_fixed_trimmed(book.ask_volume));
    println!("  digest:     {}", book.digest_hex());
}
