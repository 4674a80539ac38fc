//! Hosted Service Host - drives registered hosted services through start and stop.
//!
//! Phase order: **instantiate → start → wait → stop**. Services start in
//! registration order (or all at once when the collection's host options ask
//! for a concurrent start) and stop in reverse order.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::collection::{HostOptions, ServiceCollection};
use crate::contracts::HostedService;
use crate::key::TypeKey;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("start failed for hosted service '{service}'")]
    Start {
        service: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

struct Running {
    key: TypeKey,
    service: Arc<dyn HostedService>,
}

pub struct HostedServiceHost {
    services: Vec<Running>,
    options: HostOptions,
    cancel: CancellationToken,
    /// Indices into `services` that started successfully, in start order.
    started: Mutex<Vec<usize>>,
}

impl HostedServiceHost {
    /// Instantiate every hosted service registered in `collection`.
    pub fn new(collection: &ServiceCollection, cancel: CancellationToken) -> Self {
        let services = collection
            .hosted_services()
            .iter()
            .map(|d| Running {
                key: d.implementation,
                service: (d.factory)(),
            })
            .collect();

        Self {
            services,
            options: collection.host_options(),
            cancel,
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// START phase. The first failure aborts the phase; services that did
    /// start are still stopped by [`stop`](Self::stop).
    pub async fn start(&self) -> Result<(), HostError> {
        tracing::info!(
            services = self.services.len(),
            concurrent = self.options.start_concurrently,
            "Phase: start"
        );

        if self.options.start_concurrently {
            let results = join_all(self.services.iter().map(|r| {
                tracing::debug!(service = r.key.name(), "Starting hosted service");
                r.service.start(self.cancel.clone())
            }))
            .await;

            let mut first_err = None;
            for (idx, result) in results.into_iter().enumerate() {
                match result {
                    Ok(()) => self.started.lock().push(idx),
                    Err(source) => {
                        tracing::error!(
                            service = self.services[idx].key.name(),
                            error = %source,
                            "Hosted service failed to start"
                        );
                        if first_err.is_none() {
                            first_err = Some(HostError::Start {
                                service: self.services[idx].key.name(),
                                source,
                            });
                        }
                    }
                }
            }
            return first_err.map_or(Ok(()), Err);
        }

        for (idx, r) in self.services.iter().enumerate() {
            tracing::debug!(service = r.key.name(), "Starting hosted service");
            r.service
                .start(self.cancel.clone())
                .await
                .map_err(|source| HostError::Start {
                    service: r.key.name(),
                    source,
                })?;
            self.started.lock().push(idx);
        }
        Ok(())
    }

    /// STOP phase: stop started services in reverse order.
    ///
    /// Errors are logged but do not fail the shutdown process.
    pub async fn stop(&self) {
        tracing::info!("Phase: stop");

        let started = std::mem::take(&mut *self.started.lock());
        for idx in started.into_iter().rev() {
            let r = &self.services[idx];
            if let Err(err) = r.service.stop(self.cancel.clone()).await {
                tracing::warn!(service = r.key.name(), error = %err, "Failed to stop hosted service");
            }
        }
    }

    /// Full cycle: start → wait for cancellation → stop.
    pub async fn run(&self) -> Result<(), HostError> {
        if let Err(err) = self.start().await {
            self.stop().await;
            return Err(err);
        }
        self.cancel.cancelled().await;
        self.stop().await;
        Ok(())
    }
}
