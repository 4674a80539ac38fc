use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use svckit::{hosted_service, service, Dispose, HostedService};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Marker-registered service injected into the demo controller.
#[derive(Debug, Default)]
#[service]
pub struct TestServiceAttributeService;

impl TestServiceAttributeService {
    pub fn print(&self) -> &'static str {
        "testCamelCaseAttribute"
    }
}

const TICK: Duration = Duration::from_secs(5);

struct Ticker {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

/// Logs a heartbeat every five seconds while the host runs.
#[derive(Default)]
#[hosted_service(implements = [dyn HostedService, dyn Dispose])]
pub struct TestHostService {
    ticker: Mutex<Option<Ticker>>,
}

impl TestHostService {
    pub fn is_running(&self) -> bool {
        self.ticker.lock().is_some()
    }
}

#[async_trait]
impl HostedService for TestHostService {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            tracing::info!("TestHostService is already running");
            return Ok(());
        }

        let stop = cancel.child_token();
        let token = stop.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => tracing::info!("TestHostService is working"),
                }
            }
        });
        *ticker = Some(Ticker { stop, handle });

        tracing::info!("TestHostService has started");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let running = self.ticker.lock().take();
        let Some(ticker) = running else {
            tracing::info!("TestHostService is not running");
            return Ok(());
        };
        ticker.stop.cancel();
        ticker.handle.await?;
        tracing::info!("TestHostService has stopped");
        Ok(())
    }
}

impl Dispose for TestHostService {
    fn dispose(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.stop.cancel();
        }
    }
}
