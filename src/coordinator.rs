// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process wiring: one store, one bus connection, two bridges.
//!
//! ```text
//!             ┌──────────────── MqttBus ────────────────┐
//!  inbound →  │ ingestion task → TopicStore (Arc)       │  → outbound
//!             └───────────────┬──────────────┬──────────┘
//!                  CommandChannel        CloudFeed
//!                  (TCP server)          (periodic loop)
//! ```
//!
//! Each task runs until it fails or shutdown is requested. A failing task
//! is logged and the others keep running.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};

use crate::cloud::CloudFeed;
use crate::command::CommandChannel;
use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::protocol::{DryRunPublisher, Publisher};
use crate::store::TopicStore;

/// The running home coordinator.
#[derive(Debug)]
pub struct Coordinator {
    config: CoordinatorConfig,
    dry_run: bool,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration.
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Keeps ingesting from the broker but only logs outbound messages.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Connects, starts every task and waits for Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the listen address cannot be bound or the broker
    /// cannot be reached at startup.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Cannot listen for Ctrl-C");
            }
        })
        .await
    }

    /// Like [`run`](Self::run), but stops when `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns error if the listen address cannot be bound or the broker
    /// cannot be reached at startup.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let store = Arc::new(TopicStore::new(self.config.home_name.clone()));

        let listener = TcpListener::bind(self.config.listen_addr()?).await?;
        let (bus, ingestion) = self.config.bus_builder().build(Arc::clone(&store)).await?;

        let ingestion_abort = ingestion.abort_handle();
        let mut tasks = JoinSet::new();
        tasks.spawn(watch("bus ingestion", ingestion));

        if self.dry_run {
            tracing::warn!("Dry run: outbound messages are logged, not published");
            self.spawn_bridges(&mut tasks, &store, DryRunPublisher, listener);
        } else {
            self.spawn_bridges(&mut tasks, &store, bus.clone(), listener);
        }

        tracing::info!(home = %store.name(), "Coordinator running");
        supervise(&mut tasks, shutdown).await;

        tasks.abort_all();
        ingestion_abort.abort();
        if let Err(e) = bus.disconnect().await {
            tracing::debug!(error = %e, "Disconnect after shutdown failed");
        }
        Ok(())
    }

    fn spawn_bridges<P>(
        &self,
        tasks: &mut JoinSet<&'static str>,
        store: &Arc<TopicStore>,
        publisher: P,
        listener: TcpListener,
    ) where
        P: Publisher + Clone + 'static,
    {
        let channel = Arc::new(
            CommandChannel::new(Arc::clone(store), publisher.clone())
                .with_actuators(self.config.actuators.clone())
                .with_limits(self.config.channel_limits()),
        );
        tasks.spawn(async move {
            if let Err(e) = channel.serve(listener).await {
                tracing::error!(error = %e, "Command channel stopped");
            }
            "command channel"
        });

        if self.config.cloud_feed.enabled {
            let feed = CloudFeed::new(Arc::clone(store), publisher, self.config.cloud_mapping())
                .with_schedule(self.config.feed_schedule())
                .with_sensor_category(self.config.cloud_feed.sensor_category.clone());
            tasks.spawn(async move {
                feed.run().await;
                "cloud feed"
            });
        } else {
            tracing::info!("Cloud feed disabled");
        }
    }
}

/// Waits for a spawned task and reports how it ended.
async fn watch(name: &'static str, handle: JoinHandle<()>) -> &'static str {
    match handle.await {
        Ok(()) => {}
        Err(e) if e.is_panic() => tracing::error!(task = name, error = %e, "Task panicked"),
        Err(e) => tracing::debug!(task = name, error = %e, "Task cancelled"),
    }
    name
}

/// Logs tasks as they end until `shutdown` completes or none are left.
async fn supervise(tasks: &mut JoinSet<&'static str>, shutdown: impl Future<Output = ()>) {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Shutting down");
                return;
            }
            finished = tasks.join_next() => match finished {
                Some(Ok(name)) => tracing::warn!(task = name, "Task ended"),
                Some(Err(e)) => tracing::error!(error = %e, "Task panicked or was cancelled"),
                None => {
                    tracing::error!("Every task has ended");
                    return;
                }
            },
        }
    }
}
