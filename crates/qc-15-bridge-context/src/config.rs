//! # Bridge Context Configuration
//!
//! Per-domain deployment addresses and finalization settings. The context is
//! built explicitly from one of these; there are no process-wide presets.

use primitive_types::H160;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{
    invariant_replica_remote, invariant_unique_domains, BridgeError, BridgeResult, Domain,
    DomainId,
};

/// Default confirmations awaited per transaction.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Default finalization timeout in seconds.
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 300;

/// Replica of a remote home deployed on the local domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Remote domain whose home is replicated.
    pub domain: DomainId,
    /// Replica address on the local domain.
    pub address: H160,
}

/// Bridge deployment on a domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bridge router address.
    pub router: H160,
    /// Native-asset helper address, if deployed.
    #[serde(default)]
    pub native_helper: Option<H160>,
}

/// Deployment of the protocol on one domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain id.
    pub id: DomainId,
    /// Domain name.
    pub name: String,
    /// Home contract address.
    pub home: H160,
    /// Replicas of other domains' homes.
    #[serde(default)]
    pub replicas: Vec<ReplicaConfig>,
    /// Bridge deployment, if any.
    #[serde(default)]
    pub bridge: Option<BridgeConfig>,
    /// Confirmations awaited for transactions on this domain.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

fn default_confirmations() -> u64 {
    DEFAULT_CONFIRMATIONS
}

fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

impl DomainConfig {
    /// Domain this entry describes.
    pub fn domain(&self) -> Domain {
        Domain::new(self.id, self.name.clone())
    }
}

/// Bridge context configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeContextConfig {
    /// Environment label (e.g. "mainnet", "staging"), for logging.
    pub environment: String,
    /// Finalization timeout in seconds.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    /// Domains in registration order.
    pub domains: Vec<DomainConfig>,
}

impl BridgeContextConfig {
    /// Create a config from a domain list.
    pub fn new(environment: impl Into<String>, domains: Vec<DomainConfig>) -> Self {
        Self {
            environment: environment.into(),
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            domains,
        }
    }

    /// Two domains, "alpha" (1) and "beta" (2), each with a bridge and a
    /// replica of the other's home. Only alpha has a native helper.
    pub fn for_testing() -> Self {
        let alpha = DomainConfig {
            id: 1,
            name: "alpha".to_string(),
            home: H160::from_low_u64_be(0x1001),
            replicas: vec![ReplicaConfig {
                domain: 2,
                address: H160::from_low_u64_be(0x1002),
            }],
            bridge: Some(BridgeConfig {
                router: H160::from_low_u64_be(0x1100),
                native_helper: Some(H160::from_low_u64_be(0x1200)),
            }),
            confirmations: 1,
        };
        let beta = DomainConfig {
            id: 2,
            name: "beta".to_string(),
            home: H160::from_low_u64_be(0x2001),
            replicas: vec![ReplicaConfig {
                domain: 1,
                address: H160::from_low_u64_be(0x2002),
            }],
            bridge: Some(BridgeConfig {
                router: H160::from_low_u64_be(0x2100),
                native_helper: None,
            }),
            confirmations: 1,
        };
        Self {
            environment: "test".to_string(),
            receipt_timeout_secs: 5,
            domains: vec![alpha, beta],
        }
    }

    /// Configured domains.
    pub fn domain_list(&self) -> Vec<Domain> {
        self.domains.iter().map(DomainConfig::domain).collect()
    }

    /// Config entry for a domain id.
    pub fn domain_config(&self, id: DomainId) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.id == id)
    }

    /// Reject duplicate domains, self-replicas, duplicate replicas and zero
    /// confirmations.
    pub fn validate(&self) -> BridgeResult<()> {
        invariant_unique_domains(&self.domain_list())?;
        if self.receipt_timeout_secs == 0 {
            return Err(BridgeError::InvalidConfig(
                "receipt_timeout_secs must be non-zero".to_string(),
            ));
        }
        for domain in &self.domains {
            if domain.confirmations == 0 {
                return Err(BridgeError::InvalidConfig(format!(
                    "domain {} requires at least one confirmation",
                    domain.name
                )));
            }
            let mut remotes = HashSet::new();
            for replica in &domain.replicas {
                invariant_replica_remote(domain.id, replica.domain)?;
                if !remotes.insert(replica.domain) {
                    return Err(BridgeError::InvalidConfig(format!(
                        "domain {} lists two replicas of {}",
                        domain.name, replica.domain
                    )));
                }
            }
        }
        Ok(())
    }
}
