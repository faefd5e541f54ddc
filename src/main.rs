use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use swap_settlement::configuration::Configuration;
use swap_settlement::constants::LEGACY_DEADLINE_POLICY;
use swap_settlement::ethereum_client::{EthereumClient, Wallet};
use swap_settlement::quote_flow;
use swap_settlement::types::{BlockContext, RunMode, SwapRequest};
use swap_settlement::zero_ex_api_client::ZeroExApiClient;

/// Either run the quote script against the 0x Swap API, or, with
/// `RUN_MODE=settle`, push one swap through a deployed settlement contract.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("=== SWAP SETTLEMENT STARTING ===");

    let config = match Configuration::get_from_environment() {
        Ok(config) => config,
        Err(err) => {
            error!("configuration error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    info!("configuration: {:?}", config);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("ERROR: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Configuration) -> Result<()> {
    let ethereum_client = EthereumClient::new(config)?;

    match config.run_mode {
        RunMode::Quote => {
            let api_client = ZeroExApiClient::new(config)?;
            let report = quote_flow::run(config, &api_client, &ethereum_client).await?;
            info!(
                "quote complete: {} sources listed, approval {:?}",
                report.sources.len(),
                report.approval
            );
        }
        RunMode::Settle => {
            let settlement = config
                .settlement
                .as_ref()
                .ok_or(anyhow::anyhow!("settle mode without a settlement address"))?;

            let sell_amount = quote_flow::sell_amount_in_base_units(
                config,
                ethereum_client.decimals(config.sell_token).await?,
            )?;
            let taker = ethereum_client.address();
            let request = SwapRequest {
                input_token: config.sell_token,
                output_token: config.buy_token,
                input_amount: sell_amount,
                min_output_amount: settlement.min_output_amount,
                receiver: settlement.receiver.unwrap_or(taker),
            };

            let block = BlockContext {
                timestamp: ethereum_client.get_latest_block_timestamp().await?,
            };
            info!(
                "submitting {:?}; router deadline will be {} ({:?})",
                request,
                LEGACY_DEADLINE_POLICY.deadline(&block),
                LEGACY_DEADLINE_POLICY
            );

            ethereum_client
                .exchange_via_settlement(settlement.address, &request)
                .await?;
        }
    }

    Ok(())
}
