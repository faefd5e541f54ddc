use crate::configuration::Configuration;
use crate::contracts::{ISwapSettlement, IERC20};
use crate::types::SwapRequest;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// The signing account the quote flow acts as.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    async fn decimals(&self, token: Address) -> Result<u8>;

    /// Approve `spender` to move `amount` of `token`, waiting for the receipt.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash>;
}

pub struct EthereumClient {
    inner_client: Arc<SignerClient>,
}

impl EthereumClient {
    pub fn new(config: &Configuration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .with_context(|| format!("invalid RPC url {}", config.rpc_url))?;
        let wallet = config
            .private_key
            .parse::<LocalWallet>()
            .context("unable to load signing key")?
            .with_chain_id(config.chain_id);

        Ok(Self {
            inner_client: Arc::new(SignerMiddleware::new(provider, wallet)),
        })
    }

    pub async fn get_latest_block_timestamp(&self) -> Result<u64> {
        let timestamp = self
            .inner_client
            .get_block(BlockNumber::Latest)
            .await?
            .ok_or(anyhow!("Error fetching latest block."))?
            .timestamp;

        anyhow::ensure!(timestamp <= U256::from(u64::MAX), "block timestamp overflows u64");
        Ok(timestamp.as_u64())
    }

    /// Submit `request` through a deployed settlement contract, approving it
    /// for the input amount first. A revert surfaces as an error carrying the
    /// node's message.
    pub async fn exchange_via_settlement(
        &self,
        settlement_address: Address,
        request: &SwapRequest,
    ) -> Result<TransactionReceipt> {
        let settlement = ISwapSettlement::new(settlement_address, Arc::clone(&self.inner_client));

        let router = settlement.swap_router().call().await?;
        let pool_fee = settlement.pool_fee().call().await?;
        info!(
            "settlement {:?} routes through {:?} at fee tier {}",
            settlement_address, router, pool_fee
        );

        self.approve(request.input_token, settlement_address, request.input_amount)
            .await
            .context("unable to approve settlement contract")?;

        let call = settlement.exchange(
            request.input_token,
            request.output_token,
            request.input_amount,
            request.min_output_amount,
            request.receiver,
        );
        let pending = call.send().await.context("exchange reverted")?;
        let receipt = pending
            .await?
            .ok_or(anyhow!("exchange transaction was dropped"))?;

        ensure_succeeded(&receipt, "exchange")?;
        info!("exchange settled in {:?}", receipt.transaction_hash);

        Ok(receipt)
    }
}

#[async_trait]
impl Wallet for EthereumClient {
    fn address(&self) -> Address {
        self.inner_client.address()
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let token = IERC20::new(token, Arc::clone(&self.inner_client));
        Ok(token.decimals().call().await?)
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash> {
        let token = IERC20::new(token, Arc::clone(&self.inner_client));
        let call = token.approve(spender, amount);

        let pending = call.send().await?;
        debug!("approval submitted in {:?}", *pending);
        let receipt = pending
            .await?
            .ok_or(anyhow!("approval transaction was dropped"))?;

        ensure_succeeded(&receipt, "approval")?;
        Ok(receipt.transaction_hash)
    }
}

fn ensure_succeeded(receipt: &TransactionReceipt, what: &str) -> Result<()> {
    match receipt.status {
        Some(status) if status.is_zero() => Err(anyhow!(
            "{} transaction {:?} reverted",
            what,
            receipt.transaction_hash
        )),
        _ => Ok(()),
    }
}
