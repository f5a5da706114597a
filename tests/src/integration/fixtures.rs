//! Shared test world: three domains loaded from JSON, an in-memory ledger
//! deployed from the same config, and providers registered for each domain.

use primitive_types::{H160, U256};
use std::sync::{Arc, Once};

use qc_15_bridge_context::{
    BridgeContext, BridgeContextConfig, ContractDirectoryApi, InMemoryLedger, InMemoryRegistry,
    LocalSigner, TokenIdentifier,
};

/// Context type used by every flow.
pub type TestContext = BridgeContext<InMemoryRegistry, InMemoryLedger>;

/// alpha (1000) and beta (2000) are bridged to each other; gamma (3000) runs
/// a bridge but nothing is deployed on it.
pub const CONFIG_JSON: &str = r#"{
    "environment": "integration",
    "receipt_timeout_secs": 10,
    "domains": [
        {
            "id": 1000,
            "name": "alpha",
            "home": "0x000000000000000000000000000000000000a001",
            "replicas": [
                { "domain": 2000, "address": "0x000000000000000000000000000000000000a002" },
                { "domain": 3000, "address": "0x000000000000000000000000000000000000a003" }
            ],
            "bridge": {
                "router": "0x000000000000000000000000000000000000a100",
                "native_helper": "0x000000000000000000000000000000000000a200"
            },
            "confirmations": 2
        },
        {
            "id": 2000,
            "name": "beta",
            "home": "0x000000000000000000000000000000000000b001",
            "replicas": [
                { "domain": 1000, "address": "0x000000000000000000000000000000000000b002" }
            ],
            "bridge": { "router": "0x000000000000000000000000000000000000b100" }
        },
        {
            "id": 3000,
            "name": "gamma",
            "home": "0x000000000000000000000000000000000000c001",
            "replicas": [
                { "domain": 1000, "address": "0x000000000000000000000000000000000000c002" }
            ],
            "bridge": { "router": "0x000000000000000000000000000000000000c100" }
        }
    ]
}"#;

/// Domain ids used in [`CONFIG_JSON`].
pub const ALPHA: u32 = 1000;
/// Domain ids used in [`CONFIG_JSON`].
pub const BETA: u32 = 2000;
/// Domain ids used in [`CONFIG_JSON`].
pub const GAMMA: u32 = 3000;

static TRACING: Once = Once::new();

/// Install a `RUST_LOG`-filtered subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Parsed integration config.
pub fn config() -> BridgeContextConfig {
    serde_json::from_str(CONFIG_JSON).expect("integration config parses")
}

/// Everything a flow needs.
pub struct World {
    /// Context under test.
    pub context: TestContext,
    /// Simulated chains.
    pub ledger: InMemoryLedger,
    /// Registry shared with the context.
    pub registry: Arc<InMemoryRegistry>,
}

impl World {
    /// Build the world with a provider registered on every domain and no
    /// signers.
    pub fn connected() -> Self {
        init_tracing();
        let config = config();
        let ledger = InMemoryLedger::from_config(&config);
        let registry = Arc::new(InMemoryRegistry::new());
        let mut context = BridgeContext::from_config(config, registry.clone(), ledger.clone())
            .expect("context builds");
        for (name, endpoint) in [("alpha", "alpha-rpc"), ("beta", "beta-rpc"), ("gamma", "gamma-rpc")]
        {
            context
                .register_provider(name.into(), ledger.provider(endpoint))
                .expect("provider registers");
        }
        Self {
            context,
            ledger,
            registry,
        }
    }

    /// Register `address` as the signer of `domain`.
    pub fn sign_as(&mut self, domain: &str, address: H160) {
        self.context
            .register_signer(domain.into(), Arc::new(LocalSigner::new(address)))
            .expect("signer registers");
    }

    /// Deploy a token canonical on alpha, funded for `owner`, and its
    /// representation on beta.
    pub fn deploy_alpha_token(&self, owner: H160, funds: u64) -> (TokenIdentifier, H160, H160) {
        let address = H160::from_low_u64_be(0xa7a7);
        let token = self.ledger.register_canonical_token(ALPHA, address);
        let representation = H160::from_low_u64_be(0xbeef);
        self.ledger.deploy_representation(BETA, token, representation);
        self.ledger.mint(ALPHA, address, owner, U256::from(funds));
        (token, address, representation)
    }
}
