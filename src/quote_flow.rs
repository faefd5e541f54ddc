//! Sequential quote script: list venues, look up decimals, fetch an
//! indicative price, approve the spender if the price asks for it, fetch a
//! firm quote with the same parameters and report derived metrics.
//!
//! Every step awaits the previous one. A failed approval is logged and
//! skipped; any other failure aborts the run.

use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use ethers::utils::parse_units;
use tracing::{error, info};

use crate::configuration::Configuration;
use crate::ethereum_client::Wallet;
use crate::metrics::QuoteMetrics;
use crate::zero_ex_api_client::{PriceParams, QuoteResponse, SwapApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    NotRequired,
    Approved { spender: Address },
    Failed { spender: Address, reason: String },
}

#[derive(Debug)]
pub struct QuoteReport {
    pub sources: Vec<String>,
    pub params: PriceParams,
    pub approval: ApprovalOutcome,
    pub quote: QuoteResponse,
    pub metrics: QuoteMetrics,
}

pub fn price_params(config: &Configuration, taker: Address, sell_amount: U256) -> PriceParams {
    PriceParams {
        chain_id: config.chain_id,
        sell_token: config.sell_token,
        buy_token: config.buy_token,
        sell_amount,
        taker,
        swap_fee_recipient: config.fee_recipient.unwrap_or(taker),
        swap_fee_bps: config.affiliate_fee_bps,
        swap_fee_token: config.buy_token,
        trade_surplus_recipient: config.collect_trade_surplus.then_some(taker),
    }
}

/// Scale the configured human-readable sell amount by the token's decimals.
pub fn sell_amount_in_base_units(config: &Configuration, decimals: u8) -> Result<U256> {
    let amount: U256 = parse_units(config.sell_amount.as_str(), u32::from(decimals))
        .with_context(|| format!("invalid sell amount {}", config.sell_amount))?
        .into();
    anyhow::ensure!(!amount.is_zero(), "sell amount must be positive");
    Ok(amount)
}

pub async fn run<A: SwapApi, W: Wallet>(
    config: &Configuration,
    api: &A,
    wallet: &W,
) -> Result<QuoteReport> {
    let sources = api
        .get_sources(config.chain_id)
        .await
        .context("unable to list liquidity sources")?;
    info!("liquidity sources on chain {}: {:?}", config.chain_id, sources);

    let decimals = wallet
        .decimals(config.sell_token)
        .await
        .context("unable to look up sell token decimals")?;
    let sell_amount = sell_amount_in_base_units(config, decimals)?;

    let params = price_params(config, wallet.address(), sell_amount);

    let price = api
        .get_price(&params)
        .await
        .context("unable to fetch indicative price")?;
    anyhow::ensure!(
        price.liquidity_available,
        "no liquidity available for {:?} -> {:?}",
        params.sell_token,
        params.buy_token
    );
    info!(
        "indicative price: buy {} for sell {}",
        price.buy_amount()?,
        price.sell_amount()?
    );

    let approval = match &price.issues.allowance {
        None => ApprovalOutcome::NotRequired,
        Some(issue) => {
            info!(
                "allowance of {} is insufficient, approving {:?} for {}",
                issue.actual, issue.spender, params.sell_amount
            );
            match wallet
                .approve(params.sell_token, issue.spender, params.sell_amount)
                .await
            {
                Ok(tx_hash) => {
                    info!("approved {:?} in {:?}", issue.spender, tx_hash);
                    ApprovalOutcome::Approved {
                        spender: issue.spender,
                    }
                }
                Err(err) => {
                    error!("approval for {:?} failed: {:?}", issue.spender, err);
                    ApprovalOutcome::Failed {
                        spender: issue.spender,
                        reason: format!("{:#}", err),
                    }
                }
            }
        }
    };

    let quote = api
        .get_quote(&params)
        .await
        .context("unable to fetch firm quote")?;
    let quoted_buy_amount = quote.price.buy_amount()?;
    if let Some(transaction) = &quote.transaction {
        info!(
            "firm quote: buy {} via {:?} (gas {:?})",
            quoted_buy_amount, transaction.to, transaction.gas
        );
    }

    let metrics = QuoteMetrics::from_response(&quote.price)?;
    info!("quote metrics\n{}", metrics);

    Ok(QuoteReport {
        sources,
        params,
        approval,
        quote,
        metrics,
    })
}
