use std::sync::Arc;

use log::warn;

use crate::models::cloud_provider::{NetworkId, ProviderError, SubnetId};
use crate::services::cloud_compute::CloudCompute;

/// Outcome of a placement lookup. Callers only see `found()`, which folds an
/// empty listing and a failed listing into the same `None`.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFoundEmpty,
    NotFoundError(ProviderError),
}

impl<T> Lookup<T> {
    fn from_listing(listing: Result<Vec<T>, ProviderError>) -> Self {
        match listing {
            Ok(items) => match items.into_iter().next() {
                Some(item) => Lookup::Found(item),
                None => Lookup::NotFoundEmpty,
            },
            Err(err) => Lookup::NotFoundError(err),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(item) => Some(item),
            Lookup::NotFoundEmpty | Lookup::NotFoundError(_) => None,
        }
    }
}

pub struct NetworkResolver {
    compute: Arc<dyn CloudCompute>,
}

impl NetworkResolver {
    pub fn new(compute: Arc<dyn CloudCompute>) -> Self {
        Self { compute }
    }

    pub async fn lookup_default_network(&self) -> Lookup<NetworkId> {
        let lookup = Lookup::from_listing(self.compute.default_networks().await);
        if let Lookup::NotFoundError(err) = &lookup {
            warn!("Default VPC lookup failed: {}", err);
        }
        lookup
    }

    pub async fn lookup_subnet(&self, network_id: &str) -> Lookup<SubnetId> {
        let lookup = Lookup::from_listing(self.compute.subnets(network_id).await);
        if let Lookup::NotFoundError(err) = &lookup {
            warn!("Subnet lookup for {} failed: {}", network_id, err);
        }
        lookup
    }

    pub async fn resolve_default_network(&self) -> Option<NetworkId> {
        self.lookup_default_network().await.found()
    }

    pub async fn resolve_subnet(&self, network_id: &str) -> Option<SubnetId> {
        self.lookup_subnet(network_id).await.found()
    }
}
