//! # Bridge Flows
//!
//! End-to-end flows over three domains:
//!
//! 1. **Resolution**: canonical ids resolve to representations on every domain
//!    and back
//! 2. **Transfers**: approve-then-send out and back, native sends, delivery
//!    tracking
//! 3. **Rebinding**: signer rotation and direct registry mutation

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use primitive_types::{H160, U256};

    use qc_15_bridge_context::adapters::TxKind;
    use qc_15_bridge_context::{
        canonize, BoundContract, BridgeError, ConnectionRegistry, ContractDirectoryApi,
        MessageStatus, NativeTransferRequest, TokenResolverApi, TransferApi, TransferMessage,
        TransferRequest, TxOverrides,
    };
    use qc_15_bridge_context::config::DEFAULT_CONFIRMATIONS;

    use crate::integration::fixtures::{config, World, ALPHA, BETA, GAMMA};

    fn owner() -> H160 {
        H160::repeat_byte(0x11)
    }

    fn recipient() -> H160 {
        H160::repeat_byte(0x22)
    }

    // =============================================================================
    // CONFIGURATION
    // =============================================================================

    #[test]
    fn test_config_defaults_applied() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.domain_config(ALPHA).unwrap().confirmations, 2);
        assert_eq!(
            config.domain_config(BETA).unwrap().confirmations,
            DEFAULT_CONFIRMATIONS
        );
        let gamma = config.domain_config(GAMMA).unwrap();
        assert!(gamma.bridge.as_ref().unwrap().native_helper.is_none());
    }

    #[test]
    fn test_domains_registered_by_name_and_id() {
        let world = World::connected();
        assert_eq!(world.registry.resolve_domain(&"gamma".into()).unwrap(), GAMMA);
        assert_eq!(world.context.domain(BETA).unwrap().name, "beta");
        assert_eq!(world.context.domains(), vec![ALPHA, BETA, GAMMA]);
    }

    // =============================================================================
    // RESOLUTION
    // =============================================================================

    #[tokio::test]
    async fn test_fan_out_returns_exactly_represented_domains() {
        let world = World::connected();
        let (token, address, representation) = world.deploy_alpha_token(owner(), 0);

        let info = world.context.resolve_representations(&token).await.unwrap();
        assert_eq!(info.domains(), vec![ALPHA, BETA]);
        assert!(info.get(GAMMA).is_none());
        assert_eq!(info.get(ALPHA).unwrap().address(), address);
        assert_eq!(info.get(BETA).unwrap().address(), representation);
        assert_eq!(
            info.get(BETA)
                .unwrap()
                .connection()
                .unwrap()
                .provider()
                .endpoint(),
            "beta-rpc"
        );
    }

    #[tokio::test]
    async fn test_fan_out_names_failing_domain() {
        let world = World::connected();
        let (token, _, _) = world.deploy_alpha_token(owner(), 0);
        world.ledger.set_failing(GAMMA, true);

        match world.context.resolve_representations(&token).await {
            Err(BridgeError::DomainQueryFailed { domain, .. }) => assert_eq!(domain, GAMMA),
            other => panic!("expected DomainQueryFailed, got {:?}", other),
        }

        world.ledger.set_failing(GAMMA, false);
        assert_eq!(
            world
                .context
                .resolve_representations(&token)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_every_address_resolves_to_same_canonical_id() {
        let world = World::connected();
        let (token, address, representation) = world.deploy_alpha_token(owner(), 0);

        let lookups = vec![
            world
                .context
                .resolve_canonical_identifier("alpha".into(), address),
            world
                .context
                .resolve_canonical_identifier(BETA.into(), representation),
        ];
        for resolved in join_all(lookups).await {
            assert_eq!(resolved.unwrap(), Some(token));
        }

        let canonical = world
            .context
            .resolve_canonical_token("beta".into(), representation)
            .await
            .unwrap();
        assert_eq!(canonical.domain(), ALPHA);
        assert_eq!(canonical.address(), address);
    }

    #[tokio::test]
    async fn test_unknown_address_not_found() {
        let world = World::connected();
        let result = world
            .context
            .resolve_canonical_token("gamma".into(), H160::repeat_byte(0x99))
            .await;
        assert!(matches!(
            result,
            Err(BridgeError::TokenNotFound { domain: GAMMA, .. })
        ));
    }

    // =============================================================================
    // TRANSFERS
    // =============================================================================

    async fn send_out(world: &World, amount: u64) -> TransferMessage {
        let (token, _, _) = world.deploy_alpha_token(owner(), 1_000);
        let request = TransferRequest::new("alpha", "beta", token, U256::from(amount), recipient())
            .with_overrides(TxOverrides {
                gas_limit: Some(U256::from(300_000u64)),
                ..Default::default()
            });
        world.context.send(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_transfer_out_and_delivery() {
        let mut world = World::connected();
        world.sign_as("alpha", owner());
        let message = send_out(&world, 250).await;

        let kinds: Vec<_> = world
            .ledger
            .submitted()
            .into_iter()
            .map(|tx| tx.kind)
            .collect();
        assert!(matches!(kinds[0], TxKind::Approve { .. }));
        assert!(matches!(kinds[1], TxKind::Send { destination: BETA, .. }));
        assert_eq!(kinds.len(), 2);

        assert_eq!(message.origin(), ALPHA);
        assert_eq!(message.destination(), BETA);
        assert_eq!(message.amount(), U256::from(250u64));
        assert_eq!(message.action.to, canonize(recipient()));
        assert_eq!(
            message.message.recipient,
            canonize(H160::from_low_u64_be(0xb100))
        );
        assert!(message.receipt.status);

        assert_eq!(
            world.context.message_status(&message).await.unwrap(),
            MessageStatus::None
        );
        world
            .ledger
            .set_message_status(BETA, ALPHA, message.leaf(), MessageStatus::Proven);
        assert!(!world.context.delivered(&message).await.unwrap());
        world
            .ledger
            .set_message_status(BETA, ALPHA, message.leaf(), MessageStatus::Processed);
        assert!(world.context.delivered(&message).await.unwrap());
    }

    #[tokio::test]
    async fn test_transfer_back_uses_canonical_identity() {
        let mut world = World::connected();
        world.sign_as("beta", owner());
        let (token, _, representation) = world.deploy_alpha_token(owner(), 0);
        world
            .ledger
            .mint(BETA, representation, owner(), U256::from(40u64));

        let request = TransferRequest::new(BETA, ALPHA, token, U256::from(40u64), recipient());
        let message = world.context.send(request).await.unwrap();
        assert_eq!(message.origin(), BETA);
        assert_eq!(message.token(), token);
        assert_eq!(
            world.ledger.balance(BETA, representation, owner()),
            U256::zero()
        );
    }

    #[tokio::test]
    async fn test_message_survives_serialization() {
        let mut world = World::connected();
        world.sign_as("alpha", owner());
        let message = send_out(&world, 5).await;

        let json = serde_json::to_string(&message).unwrap();
        let restored: TransferMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, message);
        assert_eq!(restored.leaf(), message.leaf());
    }

    #[tokio::test]
    async fn test_native_transfer_to_gamma() {
        let mut world = World::connected();
        world.sign_as("alpha", owner());
        let wrapped = H160::from_low_u64_be(0xe7e7);
        let native = world.ledger.register_native_token(ALPHA, wrapped);
        world.ledger.fund_native(ALPHA, owner(), U256::from(1_000u64));

        let request = NativeTransferRequest::new("alpha", "gamma", U256::from(300u64), recipient());
        let message = world.context.send_native(request).await.unwrap();
        assert_eq!(message.destination(), GAMMA);
        assert_eq!(message.token(), native);

        // gamma holds a replica of alpha, so delivery can be tracked
        assert_eq!(
            world.context.message_status(&message).await.unwrap(),
            MessageStatus::None
        );
    }

    #[tokio::test]
    async fn test_native_transfer_underfunded_reverts() {
        let mut world = World::connected();
        world.sign_as("alpha", owner());
        world
            .ledger
            .register_native_token(ALPHA, H160::from_low_u64_be(0xe7e7));

        let request = NativeTransferRequest::new("alpha", "beta", U256::from(1u64), recipient());
        assert!(matches!(
            world.context.send_native(request).await,
            Err(BridgeError::Chain {
                domain: ALPHA,
                operation: "send_native",
                ..
            })
        ));
        assert!(world.ledger.submitted().is_empty());
    }

    // =============================================================================
    // REBINDING
    // =============================================================================

    #[tokio::test]
    async fn test_signer_rotation_changes_sender() {
        let mut world = World::connected();
        let (token, address, _) = world.deploy_alpha_token(owner(), 100);
        let second = H160::repeat_byte(0x33);
        world.ledger.mint(ALPHA, address, second, U256::from(100u64));

        world.sign_as("alpha", owner());
        let request = TransferRequest::new("alpha", "beta", token, U256::from(10u64), recipient());
        world.context.send(request.clone()).await.unwrap();

        world.sign_as("alpha", second);
        world.context.send(request.clone()).await.unwrap();

        let senders: Vec<H160> = world.ledger.submitted().iter().map(|tx| tx.from).collect();
        assert_eq!(senders, vec![owner(), owner(), second, second]);

        world.context.clear_signers().unwrap();
        assert!(matches!(
            world.context.send(request).await,
            Err(BridgeError::NoSigner(ALPHA))
        ));
        assert_eq!(world.ledger.submitted().len(), 4);
    }

    #[tokio::test]
    async fn test_shared_registry_mutation_then_rebind() {
        let mut world = World::connected();
        world
            .registry
            .register_provider(GAMMA, world.ledger.provider("gamma-rpc-2"));
        assert!(!world.context.binding_is_current("gamma").unwrap());
        assert!(world.context.binding_is_current("alpha").unwrap());

        world.context.rebind_all().unwrap();
        for domain in world.context.domains() {
            assert!(world.context.binding_is_current(domain).unwrap());
        }
        let core = world.context.must_get_core("gamma".into()).unwrap();
        assert_eq!(
            core.connection().unwrap().provider().endpoint(),
            "gamma-rpc-2"
        );
    }

    #[tokio::test]
    async fn test_missing_replica_blocks_status_lookup() {
        let mut world = World::connected();
        world.sign_as("beta", owner());
        let (token, _, representation) = world.deploy_alpha_token(owner(), 0);
        world
            .ledger
            .mint(BETA, representation, owner(), U256::from(1u64));

        // beta -> gamma is sendable, but gamma holds no replica of beta
        let request = TransferRequest::new(BETA, GAMMA, token, U256::from(1u64), recipient());
        let message = world.context.send(request).await.unwrap();
        assert!(matches!(
            world.context.message_status(&message).await,
            Err(BridgeError::MissingReplica {
                home: BETA,
                remote: GAMMA
            })
        ));
    }
}
