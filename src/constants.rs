use crate::types::DeadlinePolicy;

pub const DEFAULT_ZERO_EX_API_URL: &str = "https://api.0x.org";
pub const ZERO_EX_API_VERSION: &str = "v2";

pub const MAINNET_CHAIN_ID: u64 = 1;
pub const MAINNET_USDC_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const MAINNET_WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

pub const DEFAULT_SELL_AMOUNT: &str = "0.1";
pub const DEFAULT_AFFILIATE_FEE_BPS: u32 = 100;
pub const MAX_BPS: u32 = 10_000;

/// 0.3% pool, expressed in hundredths of a basis point as the router expects.
pub const POOL_FEE_TIER: u32 = 3000;

/// The deployed contract passes `block.timestamp` as the router deadline,
/// which the router can never observe as expired. Kept for parity with it.
pub const LEGACY_DEADLINE_POLICY: DeadlinePolicy = DeadlinePolicy::CurrentBlockTimestamp;
