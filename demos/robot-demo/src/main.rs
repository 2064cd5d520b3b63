//!
//! A simulated robot built on the notifier dispatcher.
//!
//! The keypad manager debounces a bouncy key, the battery manager watches a
//! draining cell and the display manager shows what both of them report.
//! None of them know about each other: they only post and receive notifiers
//! through the dispatcher, which the dispatch pump keeps moving.
//!
//! ```sh
//! cargo run -p robot-demo -- [robot.toml]
//! RUST_LOG=notifier=trace,robot_demo=debug cargo run -p robot-demo
//! ```
//!

#![deny(missing_docs)]

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::unbounded;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notifier_core::Executor;
use notifier_executors::ThreadedExecutor;
use notifier_managers::{DispatchPump, ErrorReporter};
use notifier_pubsub::Dispatcher;

pub mod config;
use config::RobotConfig;

pub mod keypad;
use keypad::{KeypadManager, SimulatedKey};

pub mod battery;
use battery::{BatteryManager, SimulatedCell};

pub mod display;
use display::DisplayManager;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifier=debug,robot_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RobotConfig::load(&path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => RobotConfig::default(),
    };
    info!(?config, "Starting robot");

    let dispatcher = Arc::new(Dispatcher::new(config.dispatcher));

    let keypad = KeypadManager::new(
        &config.keypad,
        dispatcher.clone(),
        Box::new(SimulatedKey::new(
            StdRng::from_entropy(),
            config.keypad.bounce,
            config.keypad.long_press_scans.saturating_mul(2),
        )),
    );
    let battery = BatteryManager::new(
        &config.battery,
        dispatcher.clone(),
        Box::new(SimulatedCell::new(StdRng::from_entropy(), &config.battery)),
    );
    let display = DisplayManager::new(&config.display, dispatcher.clone());
    let pump = DispatchPump::new(dispatcher.clone(), u128::from(config.pump.period_us));
    let mut reporter = ErrorReporter::new(
        dispatcher.clone(),
        u128::from(config.pump.report_period_us),
    );

    // The display is the subscriber most likely to fall behind
    if let Some(subscriber) = display.subscriber() {
        reporter.watch("display", subscriber);
    }

    let (tx, rx) = unbounded();
    ctrlc::set_handler(move || {
        // The executor may already be gone
        let _ = tx.send(true);
    })
    .context("Error setting Ctrl-C handler")?;

    let mut executor = ThreadedExecutor::new_with(
        rx,
        vec![
            Box::new(pump),
            Box::new(keypad),
            Box::new(battery),
            Box::new(display),
            Box::new(reporter),
        ],
    );

    match config.run_for_ms {
        Some(ms) => executor.update_for_ms(u128::from(ms)),
        None => executor.update_loop(),
    }

    let stats = dispatcher.stats();
    info!(
        publishers = stats.publishers,
        subscribers = stats.subscribers,
        errors = stats.errors,
        "Robot stopped"
    );
    Ok(())
}
