// ABOUTME: Lookup and aggregation queries over the datacenter × service map.
// ABOUTME: All queries are read-only; absence is a normal result, never an error.

use super::{DatacenterConfig, DeploymentConfig, ServiceConfig};
use std::collections::BTreeSet;

impl DeploymentConfig {
    /// Find a service in any datacenter.
    ///
    /// Datacenters are searched in ascending name order, so when the service
    /// exists in several of them the lowest-named datacenter's entry wins. Use
    /// [`find_for_dc`](Self::find_for_dc) when the datacenter matters.
    pub fn find(&self, service: &str) -> Option<&ServiceConfig> {
        self.datacenters
            .values()
            .find_map(|dc| dc.service(service))
    }

    /// Find a service within one datacenter.
    pub fn find_for_dc(&self, service: &str, dc: &str) -> Option<&ServiceConfig> {
        self.datacenters.get(dc)?.service(service)
    }

    /// Distinct service names across all datacenters.
    pub fn service_names(&self) -> BTreeSet<&str> {
        self.datacenters
            .values()
            .flat_map(|dc| dc.services.keys())
            .map(|name| name.as_str())
            .collect()
    }

    /// Names of the datacenters that offer `service`, in ascending order.
    pub fn find_datacenters(&self, service: &str) -> Vec<&str> {
        self.datacenters
            .iter()
            .filter(|(_, dc)| dc.has_service(service))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn datacenter(&self, dc: &str) -> Option<&DatacenterConfig> {
        self.datacenters.get(dc)
    }

    /// Datacenters participating in cross-dc queries.
    pub fn federated_dcs(&self) -> impl Iterator<Item = &str> {
        self.federated_dcs.split_whitespace()
    }

    pub fn is_federated(&self, dc: &str) -> bool {
        self.federated_dcs().any(|name| name == dc)
    }
}
