//! # Fake package scan with a live progress region
//!
//! Demonstrates:
//! - Producers publishing task events with shared progress monitors
//! - The update-available banner
//! - Final report printed after the live region is gone
//! - Ctrl-C handling (`cancel_on_signal`)
//!
//! Run with `FAIL=1` to see the fatal-error path, and with
//! `RUST_LOG=etui=debug` to see the dispatcher's own logs.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use etui::{Bus, Dispatcher, Event, Progress, Terminal, UiConfig, WorkerError};

/// Pretends to index `total` files, reporting through the monitor.
async fn index(bus: Bus, name: &'static str, total: u64, step: Duration) {
    let progress = Progress::new(total);
    bus.publish(Event::task_started(name, progress.clone()));
    for stage in ["reading", "parsing", "cataloging"] {
        progress.set_stage(stage);
        for _ in 0..total / 3 {
            tokio::time::sleep(step).await;
            progress.add(1);
        }
    }
    progress.complete();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cfg = UiConfig {
        cancel_on_signal: true,
        ..UiConfig::for_app("pipeline")
    };
    let (bus, events) = Bus::channel();
    let (errors_tx, errors) = mpsc::channel::<WorkerError>(1);
    let fail = std::env::var_os("FAIL").is_some();

    let producer = {
        let bus = bus.clone();
        tokio::spawn(async move {
            bus.publish(Event::update_available("0.4.1", "0.5.0"));
            tokio::join!(
                index(bus.clone(), "rootfs", 60, Duration::from_millis(40)),
                index(bus.clone(), "layers", 30, Duration::from_millis(70)),
            );

            if fail {
                let _ = errors_tx.send("registry unreachable".into()).await;
                return;
            }

            // Walk with unknown total.
            let walk = Progress::new(0);
            bus.publish(Event::task_started("walk", walk.clone()));
            for _ in 0..25 {
                tokio::time::sleep(Duration::from_millis(30)).await;
                walk.add(57);
            }
            walk.complete();

            bus.publish(Event::finished("scanned 90 files, found 1425 packages"));
        })
    };

    let ui = Dispatcher::new(cfg);
    let terminal = Terminal::stderr();
    let res = ui.run(&terminal, errors, events, CancellationToken::new()).await;

    producer.abort();
    drop(bus);

    if let Err(e) = res {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}
