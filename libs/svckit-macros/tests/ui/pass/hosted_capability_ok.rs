// Hosted by declared capability only: no hosted marker, factory from ctor
use svckit::{injectable, HostedService};
use tokio_util::sync::CancellationToken;

pub struct Poller {
    interval_ms: u64,
}

#[injectable(
    implements = [dyn HostedService + Send + Sync],
    ctor = PollerHost(Poller { interval_ms: 250 })
)]
pub struct PollerHost(Poller);

#[async_trait::async_trait]
impl HostedService for PollerHost {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let _ = self.0.interval_ms;
        Ok(())
    }
    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
}

fn main() {}
