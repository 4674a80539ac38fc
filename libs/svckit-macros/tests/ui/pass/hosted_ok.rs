// Hosted services, standalone and combined with a service marker
use svckit::{hosted_service, service, HostedService};
use tokio_util::sync::CancellationToken;

pub struct Ticker {
    period_secs: u64,
}

impl Ticker {
    pub fn new(period_secs: u64) -> Self {
        Self { period_secs }
    }
}

#[async_trait::async_trait]
impl HostedService for Ticker {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let _ = self.period_secs;
        Ok(())
    }
    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
}

#[hosted_service(run_immediately, ctor = TickerHost(Ticker::new(5)))]
pub struct TickerHost(Ticker);

#[async_trait::async_trait]
impl HostedService for TickerHost {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.0.start(cancel).await
    }
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.0.stop(cancel).await
    }
}

#[derive(Default)]
#[service(lifetime = transient, hosted(run_immediately = false), implements = [dyn HostedService])]
pub struct Poller;

#[async_trait::async_trait]
impl HostedService for Poller {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
}

fn main() {}
