//! Object-safe view of a running service, so services over different sources
//! can be held together.

use async_trait::async_trait;

use crate::error::HarvestResult;
use crate::service::HarvestService;
use crate::traits::source::Source;

#[async_trait]
pub trait Harvester: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> HarvestResult<()>;

    async fn stop(&self);

    async fn join(&self);

    async fn is_active(&self) -> bool;
}

#[async_trait]
impl<S: Source> Harvester for HarvestService<S> {
    fn name(&self) -> &str {
        HarvestService::name(self)
    }

    async fn start(&self) -> HarvestResult<()> {
        HarvestService::start(self).await
    }

    async fn stop(&self) {
        HarvestService::stop(self).await
    }

    async fn join(&self) {
        HarvestService::join(self).await
    }

    async fn is_active(&self) -> bool {
        HarvestService::is_active(self).await
    }
}
