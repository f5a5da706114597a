//! # Token Resolver
//!
//! Canonical identity lookups across domains.
//!
//! Lookups are keyed by canonical 32-byte ids; addresses are narrowed to the
//! chain's native width only when a contract is called.

use async_trait::async_trait;
use futures::future::try_join_all;
use primitive_types::H160;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::context::BridgeContext;
use super::contracts::{Representation, ResolvedTokenInfo};
use crate::algorithms::canonize;
use crate::domain::{
    invariant_canonical_round_trip, BridgeError, BridgeResult, DomainId, DomainRef,
    TokenIdentifier,
};
use crate::ports::{
    BoundContract, ConnectionRegistry, ContractDirectoryApi, ContractFactory, TokenResolverApi,
};

impl<R: ConnectionRegistry, F: ContractFactory> BridgeContext<R, F> {
    async fn representation_on(
        &self,
        domain: DomainId,
        token: &TokenIdentifier,
    ) -> BridgeResult<Option<Representation>> {
        let bridge = match self.get_bridge(domain.into()) {
            Some(bridge) => bridge,
            None => {
                debug!("[qc-15] Domain {} has no bridge, skipping {}", domain, token);
                return Ok(None);
            }
        };

        let address = bridge
            .router()
            .get_local_address(token.domain, token.id)
            .await
            .map_err(|e| BridgeError::chain(domain, "get_local_address", e))?;
        if address.is_zero() {
            return Ok(None);
        }

        let connection = bridge.connection().cloned();
        Ok(Some(self.factory().token(domain, address, connection)))
    }
}

#[async_trait]
impl<R: ConnectionRegistry, F: ContractFactory> TokenResolverApi for BridgeContext<R, F> {
    async fn resolve_representation(
        &self,
        domain: DomainRef,
        token: &TokenIdentifier,
    ) -> BridgeResult<Option<Representation>> {
        let domain = self.resolve_domain(domain)?;
        self.resolve_domain(token.domain)?;
        self.representation_on(domain, token).await
    }

    async fn resolve_representations(
        &self,
        token: &TokenIdentifier,
    ) -> BridgeResult<ResolvedTokenInfo> {
        self.resolve_domain(token.domain)?;

        let queries = self.registry().domain_ids().into_iter().map(|domain| async move {
            let representation = self.representation_on(domain, token).await.map_err(|e| {
                warn!("[qc-15] Representation query for {} on domain {} failed: {}", token, domain, e);
                BridgeError::DomainQueryFailed {
                    domain,
                    source: Box::new(e),
                }
            })?;
            Ok::<_, BridgeError>(representation.map(|r| (domain, r)))
        });

        let representations: HashMap<DomainId, Representation> =
            try_join_all(queries).await?.into_iter().flatten().collect();
        debug!(
            "[qc-15] Token {} has {} representations",
            token,
            representations.len()
        );
        Ok(ResolvedTokenInfo::new(*token, representations))
    }

    async fn resolve_canonical_identifier(
        &self,
        domain: DomainRef,
        address: H160,
    ) -> BridgeResult<Option<TokenIdentifier>> {
        let domain = self.resolve_domain(domain)?;
        let router = self.must_get_bridge(domain.into())?.router();

        let (canonical_domain, id) = router
            .representation_to_canonical(address)
            .await
            .map_err(|e| BridgeError::chain(domain, "representation_to_canonical", e))?;
        if canonical_domain != 0 {
            return Ok(Some(TokenIdentifier::new(canonical_domain, id)));
        }

        // not a representation; check if it is a token native to this domain
        let id = canonize(address);
        let local = router
            .get_local_address(domain, id)
            .await
            .map_err(|e| BridgeError::chain(domain, "get_local_address", e))?;
        if local.is_zero() {
            return Ok(None);
        }
        Ok(Some(TokenIdentifier::new(domain, id)))
    }

    async fn resolve_canonical_token(
        &self,
        domain: DomainRef,
        address: H160,
    ) -> BridgeResult<Representation> {
        let id = self.resolve_domain(domain)?;
        let token = self
            .resolve_canonical_identifier(id.into(), address)
            .await?
            .ok_or(BridgeError::TokenNotFound {
                domain: id,
                address,
            })?;

        let canonical = self
            .resolve_representation(token.domain.into(), &token)
            .await?
            .ok_or_else(|| {
                BridgeError::InternalConsistency(format!(
                    "canonical token {} has no address on its own domain",
                    token
                ))
            })?;

        if !invariant_canonical_round_trip(token.domain, canonical.address(), &token) {
            // canonical ids may be wider than a local address; log and continue
            warn!(
                "[qc-15] Canonical token {} resolved to {:?}, which does not canonize back",
                token,
                canonical.address()
            );
        }
        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedger, InMemoryRegistry};
    use crate::config::BridgeContextConfig;
    use crate::domain::Domain;
    use primitive_types::H256;
    use std::sync::Arc;

    type TestContext = BridgeContext<InMemoryRegistry, InMemoryLedger>;

    async fn connected() -> (TestContext, InMemoryLedger) {
        let config = BridgeContextConfig::for_testing();
        let ledger = InMemoryLedger::from_config(&config);
        let registry = Arc::new(InMemoryRegistry::new());
        let mut context = BridgeContext::from_config(config, registry, ledger.clone()).unwrap();
        context
            .register_provider("alpha".into(), ledger.provider("alpha-rpc"))
            .unwrap();
        context
            .register_provider("beta".into(), ledger.provider("beta-rpc"))
            .unwrap();
        (context, ledger)
    }

    fn example_token() -> TokenIdentifier {
        TokenIdentifier::new(1, H256::from_low_u64_be(1))
    }

    #[tokio::test]
    async fn test_example_representation_on_beta() {
        let (context, ledger) = connected().await;
        let beef = H160::from_low_u64_be(0xbeef);
        ledger.deploy_representation(2, example_token(), beef);

        let canonical = context
            .resolve_canonical_identifier(2u32.into(), beef)
            .await
            .unwrap();
        assert_eq!(canonical, Some(example_token()));

        let representation = context
            .resolve_representation("beta".into(), &example_token())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(representation.address(), beef);
        assert_eq!(representation.domain(), 2);
        let bound = representation.connection().unwrap();
        assert_eq!(bound.provider().endpoint(), "beta-rpc");
    }

    #[tokio::test]
    async fn test_no_representation_is_none() {
        let (context, _) = connected().await;
        let result = context
            .resolve_representation(2u32.into(), &example_token())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_round_trip_on_canonical_domain() {
        let (context, ledger) = connected().await;
        let address = H160::from_low_u64_be(0xaaaa);
        let token = ledger.register_canonical_token(1, address);

        let resolved = context
            .resolve_canonical_identifier("alpha".into(), address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved, token);
        assert!(invariant_canonical_round_trip(1, address, &resolved));

        let canonical = context
            .resolve_canonical_token("beta".into(), address)
            .await;
        assert!(matches!(canonical, Err(BridgeError::TokenNotFound { domain: 2, .. })));

        let canonical = context
            .resolve_canonical_token("alpha".into(), address)
            .await
            .unwrap();
        assert_eq!(canonical.address(), address);
    }

    #[tokio::test]
    async fn test_canonical_token_from_representation() {
        let (context, ledger) = connected().await;
        let address = H160::from_low_u64_be(0xaaaa);
        let token = ledger.register_canonical_token(1, address);
        let beef = H160::from_low_u64_be(0xbeef);
        ledger.deploy_representation(2, token, beef);

        let canonical = context
            .resolve_canonical_token("beta".into(), beef)
            .await
            .unwrap();
        assert_eq!(canonical.domain(), 1);
        assert_eq!(canonical.address(), address);
    }

    #[tokio::test]
    async fn test_unknown_address_is_none() {
        let (context, _) = connected().await;
        let result = context
            .resolve_canonical_identifier(1u32.into(), H160::repeat_byte(0x33))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fan_out_skips_domains_without_representation() {
        let (context, ledger) = connected().await;
        context
            .registry()
            .register_domain(Domain::new(3, "gamma"))
            .unwrap();
        let address = H160::from_low_u64_be(0xaaaa);
        let token = ledger.register_canonical_token(1, address);
        ledger.deploy_representation(2, token, H160::from_low_u64_be(0xbeef));

        let info = context.resolve_representations(&token).await.unwrap();
        assert_eq!(info.token, token);
        assert_eq!(info.domains(), vec![1, 2]);
        assert!(info.get(3).is_none());
        assert_eq!(info.get(1).unwrap().address(), address);
    }

    #[tokio::test]
    async fn test_fan_out_fails_on_domain_error() {
        let (context, ledger) = connected().await;
        let token = ledger.register_canonical_token(1, H160::from_low_u64_be(0xaaaa));
        ledger.set_failing(2, true);

        let result = context.resolve_representations(&token).await;
        match result {
            Err(BridgeError::DomainQueryFailed { domain, source }) => {
                assert_eq!(domain, 2);
                assert!(matches!(*source, BridgeError::Chain { domain: 2, .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconnected_domain_is_an_error() {
        let config = BridgeContextConfig::for_testing();
        let ledger = InMemoryLedger::from_config(&config);
        let context =
            BridgeContext::from_config(config, Arc::new(InMemoryRegistry::new()), ledger).unwrap();
        let result = context
            .resolve_representation(1u32.into(), &example_token())
            .await;
        assert!(matches!(
            result,
            Err(BridgeError::Chain {
                source: crate::domain::ChainError::NotConnected,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unknown_domain() {
        let (context, _) = connected().await;
        assert!(matches!(
            context
                .resolve_representation("gamma".into(), &example_token())
                .await,
            Err(BridgeError::UnknownDomain(_))
        ));
        assert!(matches!(
            context
                .resolve_canonical_identifier("gamma".into(), H160::zero())
                .await,
            Err(BridgeError::UnknownDomain(_))
        ));
    }
}
