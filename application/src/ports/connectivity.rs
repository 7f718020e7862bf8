//! Backend reachability probe

use async_trait::async_trait;

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// `true` when the backend answers its health check
    async fn is_reachable(&self) -> bool;
}
