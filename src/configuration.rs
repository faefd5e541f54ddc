use ethers::types::{Address, U256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DEFAULT_AFFILIATE_FEE_BPS, DEFAULT_SELL_AMOUNT, DEFAULT_ZERO_EX_API_URL, MAINNET_CHAIN_ID,
    MAINNET_USDC_ADDRESS, MAINNET_WETH_ADDRESS, MAX_BPS,
};
use crate::types::RunMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("required environment variables not set: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidVariable { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfiguration {
    pub address: Address,
    pub min_output_amount: U256,
    pub receiver: Option<Address>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Hex-encoded secp256k1 key, without `0x` prefix.
    pub private_key: String,
    pub zero_ex_api_key: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub zero_ex_api_url: String,
    pub sell_token: Address,
    pub buy_token: Address,
    /// Human-readable amount, scaled by the sell token's decimals at runtime.
    pub sell_amount: String,
    pub affiliate_fee_bps: u32,
    pub fee_recipient: Option<Address>,
    pub collect_trade_surplus: bool,
    pub run_mode: RunMode,
    pub settlement: Option<SettlementConfiguration>,
}

// keys stay out of logs
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("private_key", &"<redacted>")
            .field("zero_ex_api_key", &"<redacted>")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("zero_ex_api_url", &self.zero_ex_api_url)
            .field("sell_token", &self.sell_token)
            .field("buy_token", &self.buy_token)
            .field("sell_amount", &self.sell_amount)
            .field("affiliate_fee_bps", &self.affiliate_fee_bps)
            .field("fee_recipient", &self.fee_recipient)
            .field("collect_trade_surplus", &self.collect_trade_surplus)
            .field("run_mode", &self.run_mode)
            .field("settlement", &self.settlement)
            .finish()
    }
}

impl Configuration {
    pub fn get_from_environment() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Every missing
    /// required key is reported in one error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let variables = Variables { lookup };

        let run_mode = match variables.optional("RUN_MODE").as_deref() {
            None | Some("quote") => RunMode::Quote,
            Some("settle") => RunMode::Settle,
            Some(other) => {
                return Err(invalid("RUN_MODE", format!("unknown mode {:?}", other)));
            }
        };

        let mut missing = Vec::new();
        let private_key = variables.required("PRIVATE_KEY", &mut missing);
        let zero_ex_api_key = variables.required("ZERO_EX_API_KEY", &mut missing);
        let rpc_url = variables.required("RPC_URL", &mut missing);
        let settlement_address = match run_mode {
            RunMode::Settle => variables.required("SETTLEMENT_ADDRESS", &mut missing),
            RunMode::Quote => variables.optional("SETTLEMENT_ADDRESS"),
        };

        let (private_key, zero_ex_api_key, rpc_url) = match (private_key, zero_ex_api_key, rpc_url)
        {
            (Some(private_key), Some(api_key), Some(rpc_url)) if missing.is_empty() => {
                (private_key, api_key, rpc_url)
            }
            _ => return Err(ConfigurationError::MissingVariables(missing)),
        };

        let settlement = match settlement_address {
            Some(address) => Some(SettlementConfiguration {
                address: parse_value("SETTLEMENT_ADDRESS", &address)?,
                min_output_amount: variables
                    .optional("MIN_OUTPUT_AMOUNT")
                    .map(|amount| {
                        U256::from_dec_str(&amount)
                            .map_err(|err| invalid("MIN_OUTPUT_AMOUNT", format!("{:?}", err)))
                    })
                    .transpose()?
                    .unwrap_or_default(),
                receiver: variables.parsed("RECEIVER")?,
            }),
            None => None,
        };

        let affiliate_fee_bps = variables
            .parsed::<u32>("AFFILIATE_FEE_BPS")?
            .unwrap_or(DEFAULT_AFFILIATE_FEE_BPS);
        if affiliate_fee_bps > MAX_BPS {
            return Err(invalid(
                "AFFILIATE_FEE_BPS",
                format!("{} exceeds {}", affiliate_fee_bps, MAX_BPS),
            ));
        }

        Ok(Self {
            private_key: normalize_private_key(&private_key)?,
            zero_ex_api_key,
            rpc_url,
            chain_id: variables
                .parsed("CHAIN_ID")?
                .unwrap_or(MAINNET_CHAIN_ID),
            zero_ex_api_url: variables
                .optional("ZERO_EX_API_URL")
                .unwrap_or_else(|| DEFAULT_ZERO_EX_API_URL.to_string()),
            sell_token: parse_value(
                "SELL_TOKEN",
                &variables
                    .optional("SELL_TOKEN")
                    .unwrap_or_else(|| MAINNET_USDC_ADDRESS.to_string()),
            )?,
            buy_token: parse_value(
                "BUY_TOKEN",
                &variables
                    .optional("BUY_TOKEN")
                    .unwrap_or_else(|| MAINNET_WETH_ADDRESS.to_string()),
            )?,
            sell_amount: variables
                .optional("SELL_AMOUNT")
                .unwrap_or_else(|| DEFAULT_SELL_AMOUNT.to_string()),
            affiliate_fee_bps,
            fee_recipient: variables.parsed("FEE_RECIPIENT")?,
            collect_trade_surplus: variables
                .parsed("COLLECT_TRADE_SURPLUS")?
                .unwrap_or(true),
            run_mode,
            settlement,
        })
    }
}

struct Variables<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Variables<F> {
    /// Trimmed value of `key`; blank counts as unset.
    fn value(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn optional(&self, key: &str) -> Option<String> {
        let value = self.value(key);
        if value.is_none() {
            debug!("environment variable {} not set but it wasn't required", key);
        }
        value
    }

    fn required(&self, key: &str, missing: &mut Vec<String>) -> Option<String> {
        let value = self.value(key);
        if value.is_none() {
            debug!("required environment variable {} not set", key);
            missing.push(key.to_string());
        }
        value
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: FromStr,
        T::Err: fmt::Debug,
    {
        self.optional(key)
            .map(|value| parse_value(key, &value))
            .transpose()
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: fmt::Debug,
{
    value
        .parse::<T>()
        .map_err(|err| invalid(key, format!("{:?} ({:?})", value, err)))
}

fn invalid(key: &str, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidVariable {
        key: key.to_string(),
        reason,
    }
}

fn normalize_private_key(value: &str) -> Result<String, ConfigurationError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped)
        .map_err(|err| invalid("PRIVATE_KEY", format!("not hex: {}", err)))?;
    if bytes.len() != 32 {
        return Err(invalid(
            "PRIVATE_KEY",
            format!("expected 32 bytes, got {}", bytes.len()),
        ));
    }
    Ok(hex::encode(bytes))
}
