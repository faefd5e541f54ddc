//! Exact-input single-hop settlement.
//!
//! Custodies a caller's input tokens, delegates execution to a configured
//! router and enforces the caller's minimum output. Every step runs inside
//! [`transaction::atomically`], so a revert at any point (including the
//! final output check, which happens after the router has already moved
//! tokens) leaves no balance or allowance change behind.

use ethers::types::{Address, U256};
use tracing::{info, warn};

pub mod error;
pub mod ledger;
pub mod router;
pub mod transaction;

pub use error::{RouterError, SettlementError};
pub use ledger::{InMemoryLedger, TokenLedger};
pub use router::SwapRouter;

use crate::constants::{LEGACY_DEADLINE_POLICY, POOL_FEE_TIER};
use crate::types::{BlockContext, DeadlinePolicy, ExactInputSingleParams, SwapRequest};

#[derive(Debug, Clone)]
pub struct SwapSettlement<R> {
    address: Address,
    router: R,
    fee_tier: u32,
    deadline_policy: DeadlinePolicy,
}

impl<R: SwapRouter + Clone> SwapSettlement<R> {
    pub fn new(address: Address, router: R) -> Self {
        Self {
            address,
            router,
            fee_tier: POOL_FEE_TIER,
            deadline_policy: LEGACY_DEADLINE_POLICY,
        }
    }

    pub fn with_deadline_policy(mut self, deadline_policy: DeadlinePolicy) -> Self {
        self.deadline_policy = deadline_policy;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn deadline_policy(&self) -> DeadlinePolicy {
        self.deadline_policy
    }

    /// Encode a request for the router's exact-input single-hop call. The
    /// router gets no minimum of its own; the check happens after it returns.
    pub fn router_call_parameters(
        &self,
        block: &BlockContext,
        request: &SwapRequest,
    ) -> ExactInputSingleParams {
        ExactInputSingleParams {
            token_in: request.input_token,
            token_out: request.output_token,
            fee: self.fee_tier,
            recipient: request.receiver,
            deadline: self.deadline_policy.deadline(block),
            amount_in: request.input_amount,
            amount_out_minimum: U256::zero(),
            sqrt_price_limit_x96: U256::zero(),
        }
    }

    /// Swap `request.input_amount` of the caller's input token for at least
    /// `request.min_output_amount` of the output token, paid to
    /// `request.receiver`. Returns the realized output.
    pub fn exchange<L: TokenLedger + Clone>(
        &mut self,
        ledger: &mut L,
        block: &BlockContext,
        caller: Address,
        request: &SwapRequest,
    ) -> Result<U256, SettlementError> {
        let params = self.router_call_parameters(block, request);
        let settlement = self.address;

        let result = transaction::atomically(ledger, &mut self.router, |ledger, router| {
            if request.input_amount.is_zero() {
                return Err(SettlementError::InvalidAmount);
            }

            if !ledger.transfer_from(
                request.input_token,
                settlement,
                caller,
                settlement,
                request.input_amount,
            ) {
                return Err(SettlementError::TransferFailed);
            }

            if !ledger.approve(
                request.input_token,
                settlement,
                router.address(),
                request.input_amount,
            ) {
                return Err(SettlementError::ApprovalFailed);
            }

            let output = router.exact_input_single(ledger, settlement, &params)?;

            if output < request.min_output_amount {
                return Err(SettlementError::InsufficientOutput {
                    minimum: request.min_output_amount,
                    actual: output,
                });
            }

            Ok(output)
        });

        match &result {
            Ok(output) => info!(
                "settled swap of {} {:?} for {} {:?} to {:?}",
                request.input_amount,
                request.input_token,
                output,
                request.output_token,
                request.receiver
            ),
            Err(err) => warn!("exchange reverted: {} ({:?})", err.reason(), err),
        }

        result
    }
}
