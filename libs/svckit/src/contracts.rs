use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Background service started by the host after registration completes.
///
/// Declaring `dyn HostedService` among a type's capabilities is enough for
/// the hosted-service strategy to pick it up; `#[hosted_service]` does the
/// same without the capability.
#[async_trait]
pub trait HostedService: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// Framework-owned synchronous disposal capability.
///
/// Never used as a registration key by the interface fan-out.
pub trait Dispose: Send + Sync {
    fn dispose(&self);
}

/// Framework-owned asynchronous disposal capability.
#[async_trait]
pub trait AsyncDispose: Send + Sync {
    async fn dispose_async(&self);
}
