use alloy_primitives::{
    Address,
    U256,
    address,
};
use std::time::Duration;

/// Chain id of the HyperEVM network every deployment must target.
pub const REQUIRED_CHAIN_ID: u64 = 12121;

/// Factory contract that receives the fee and deploys the bytecode.
pub const DEPLOYER_ADDRESS: Address = address!("0x29Dc8d4ccE7CF167439bC88e401bD1b7A5f076FD");

/// 0.003 HYPE expressed in wei.
pub const DEPLOYMENT_FEE_WEI: U256 = U256::from_limbs([3_000_000_000_000_000, 0, 0, 0]);

pub const NATIVE_SYMBOL: &str = "HYPE";
pub const NATIVE_DECIMALS: u32 = 18;
pub const DISPLAY_DECIMALS: u32 = 4;

pub const EXPLORER_TX_URL: &str = "https://www.hyperscan.com/tx/";

/// Upper bound on how long the splash screen waits for the host ready signal.
pub const SPLASH_TIMEOUT: Duration = Duration::from_millis(1500);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

pub const PENDING_ADDRESS_LABEL: &str = "Pending...";

// Static figures shown in the deployment information panel.
pub const ESTIMATED_GAS: &str = "180,000";
pub const ESTIMATED_COST: &str = "0.0018";
pub const ESTIMATED_REMAINDER: &str = "0.0012";
pub const MAX_COST: &str = "0.003";

/// Runtime bytecode of the storage contract deployed through the factory.
pub const PREDEFINED_BYTECODE: &str = "0x6080604052348015600e575f5ffd5b506101268061001c5f395ff3fe6080604052348015600e575f5ffd5b50600436106030575f3560e01c80633fa4f24514603457806360fe47b114604e575b5f5ffd5b603a6066565b60405160459190608a565b60405180910390f35b606460048036038101906060919060ca565b606b565b005b5f5481565b805f8190555050565b5f819050919050565b6084816074565b82525050565b5f602082019050609b5f830184607d565b92915050565b5f5ffd5b60ac816074565b811460b5575f5ffd5b50565b5f8135905060c48160a5565b92915050565b5f6020828403121560dc5760db60a1565b5b5f60e78482850160b8565b9150509291505056fea26469706673582212206dba4cc3b7cf7194f080fb70fd7cc0f7dd233c112fc2407044943b89a267706864736f6c634300081e0033";
