mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::info;

use friday_core::{config, Config, UserId, UserProfile};
use friday_ordering::gate::GateState;
use friday_ordering::summary::summarize;
use friday_ordering::window::{END_KEY, START_KEY};
use friday_ordering::{AuditLog, MemoryStore, OrderService, OrderingStatus, RecurrenceClock, SettingsSource, WindowConfig};

use crate::cli::{CliArgs, Command, SourceArgs, StatusArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let args = CliArgs::parse();

    match args.command {
        Command::Status(status) => print_status(&config, &status).await?,
        Command::Watch { source, interval } => {
            let secs = interval.unwrap_or(config.clock.poll_interval_secs).max(1);
            let service = build_service(&config, &source).await?;
            watch(&service, Duration::from_secs(secs)).await?;
        }
        Command::CheckWindow { start, end } => {
            let window = WindowConfig::parse(&start, &end).context("invalid ordering window")?;
            println!("ok: {window}");
        }
        Command::Summary { orders, users, at, phone } => {
            let source = SourceArgs { start: None, end: None, orders: Some(orders) };
            let service = build_service(&config, &source).await?;
            let users: Vec<UserProfile> = match users {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            let phone = phone.or_else(|| config.dispatch.contact_phone.clone());
            print_summary(
                &service,
                &config.dispatch.restaurant,
                phone.as_deref(),
                &users,
                at.unwrap_or_else(Utc::now),
            )
            .await?;
        }
    }

    Ok(())
}

/// Service over an in-memory store seeded from flags and the orders file.
async fn build_service(config: &Config, source: &SourceArgs) -> Result<OrderService<MemoryStore>> {
    let orders = match &source.orders {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let store = MemoryStore::with_orders(orders);
    seed_window(&store, source).await?;

    let audit = AuditLog::with_max_entries(config.audit.max_entries);
    Ok(OrderService::new(
        store,
        RecurrenceClock::friday(config.clock.tz()),
        Arc::new(audit),
    ))
}

async fn seed_window(store: &MemoryStore, source: &SourceArgs) -> Result<()> {
    if let Some(start) = &source.start {
        store.put_setting(START_KEY, start).await?;
    }
    if let Some(end) = &source.end {
        store.put_setting(END_KEY, end).await?;
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("{path} is not a JSON array of the expected records"))
}

async fn print_status(config: &Config, args: &StatusArgs) -> Result<()> {
    let service = build_service(config, &args.source).await?;
    let now = args.at.unwrap_or_else(Utc::now);
    let user = args.user.as_deref().map(UserId::new);
    let status = service.status(user.as_ref(), now).await;

    if args.json {
        let report = status_report(service.clock(), now, &status)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(service.clock(), now, &status);
    }
    Ok(())
}

async fn watch(service: &OrderService<MemoryStore>, every: Duration) -> Result<()> {
    info!(interval_secs = every.as_secs(), "watching ordering window");
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let status = service.status(None, now).await;
                print_report(service.clock(), now, &status);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping");
                return Ok(());
            }
        }
    }
}

fn refusal(status: &OrderingStatus) -> Option<String> {
    GateState::new(status.window_open, status.cycle_locked)
        .check()
        .err()
        .map(|e| e.to_string())
}

/// The status snapshot plus the local evaluation time and the refusal reason.
fn status_report(clock: &RecurrenceClock, now: DateTime<Utc>, status: &OrderingStatus) -> Result<serde_json::Value> {
    let mut report = serde_json::to_value(status)?;
    report["now"] = serde_json::json!(clock.local(now).to_rfc3339());
    report["refusal"] = serde_json::json!(refusal(status));
    Ok(report)
}

fn print_report(clock: &RecurrenceClock, now: DateTime<Utc>, status: &OrderingStatus) {
    println!("now:          {}", clock.local(now).to_rfc3339());
    println!("cycle:        {}", status.cycle);
    println!(
        "window:       {} ({})",
        status.window,
        if status.window_open { "open" } else { "closed" }
    );
    println!("locked:       {}", status.cycle_locked);
    match refusal(status) {
        Some(reason) => println!("ordering:     refused ({reason})"),
        None => println!("ordering:     allowed"),
    }
    if let Some(order) = &status.existing_order {
        println!("your order:   {}: {}", order.item, order.variant);
    }
    println!("next window:  in {}", status.countdown);
}

async fn print_summary(
    service: &OrderService<MemoryStore>,
    restaurant: &str,
    phone: Option<&str>,
    users: &[UserProfile],
    now: DateTime<Utc>,
) -> Result<()> {
    let (cycle, orders) = service.cycle_orders(now).await?;

    println!("cycle {cycle}: {} orders", orders.len());
    for line in summarize(&orders) {
        println!("  {:>3} x {}", line.count, line.label());
    }

    if !users.is_empty() {
        let missing = service.missing_members(users, now).await?;
        println!("{} members have not ordered", missing.len());
        for user in missing {
            println!("  - {} <{}>", user.name, user.email);
        }
    }

    match service.prepare_dispatch(restaurant, phone, now).await {
        Ok(dispatch) => {
            println!("ready to send");
            println!();
            println!("{}", dispatch.text);
        }
        Err(e) => println!("not ready: {e}"),
    }
    Ok(())
}
