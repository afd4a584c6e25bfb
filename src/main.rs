use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use synthetic_events::{
    dispatch, kinds, DispatchConfig, DispatchRequest, EventPool, InstanceHandle, Listener,
    NativeEvent, PoolConfig, SyntheticEvent,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One recorded native event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplayEntry {
    kind: String,
    #[serde(default)]
    dispatch_config: DispatchConfig,
    event: Value,
    /// Owners of the listeners to run, in traversal order.
    #[serde(default = "default_instances")]
    instances: Vec<u64>,
    #[serde(default)]
    prevent_default: bool,
    #[serde(default)]
    stop_propagation: bool,
}

fn default_instances() -> Vec<u64> {
    vec![1]
}

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: event-replay <events.json>");
        std::process::exit(2);
    };

    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let config = PoolConfig::from_env().unwrap_or_else(|err| {
        eprintln!("Failed to load pool configuration: {err}. Using defaults.");
        PoolConfig::default()
    });

    if let Err(err) = replay(Path::new(&path), config) {
        eprintln!("Replay failed: {err:#}");
        std::process::exit(1);
    }
}

fn replay(path: &Path, config: PoolConfig) -> Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries: Vec<ReplayEntry> =
        serde_json::from_str(&contents).context("failed to parse replay file")?;

    let mut pool = EventPool::new(config);
    for (index, entry) in entries.into_iter().enumerate() {
        let interface = kinds::by_name(&entry.kind)
            .ok_or_else(|| anyhow!("entry {index}: unknown event kind `{}`", entry.kind))?;

        let listeners: Vec<(Listener, InstanceHandle)> = entry
            .instances
            .iter()
            .map(|&owner| {
                let listener = printer(entry.prevent_default, entry.stop_propagation);
                (listener, InstanceHandle(owner))
            })
            .collect();

        let request = DispatchRequest::new(interface, NativeEvent::from_value(entry.event))
            .with_dispatch_config(entry.dispatch_config);
        let outcome = dispatch(&mut pool, request, &listeners)
            .with_context(|| format!("entry {index}: dispatch failed"))?;

        info!(
            entry = index,
            kind = %entry.kind,
            listeners_run = outcome.listeners_run,
            default_prevented = outcome.default_prevented,
            propagation_stopped = outcome.propagation_stopped,
            "dispatched"
        );
    }

    let stats = serde_json::to_string(&pool.stats())?;
    info!(%stats, "replay finished");
    Ok(())
}

/// Prints the normalized event, then applies the requested flags.
fn printer(prevent_default: bool, stop_propagation: bool) -> Listener {
    Rc::new(move |event: &mut SyntheticEvent| -> Result<()> {
        println!("{}", serde_json::to_string(&event.to_json()?)?);
        if prevent_default {
            event.prevent_default();
        }
        if stop_propagation {
            event.stop_propagation();
        }
        Ok(())
    })
}
