use ethers::types::{Address, U256};

use super::error::RouterError;
use super::ledger::TokenLedger;
use crate::types::{ExactInputParams, ExactInputSingleParams};

/// Call surface of an externally deployed swap router. Pricing and
/// liquidity routing live behind this trait and are not modelled here.
pub trait SwapRouter {
    fn address(&self) -> Address;

    /// Pull `amount_in` of `token_in` from `sender` and deliver the output to
    /// `params.recipient`, returning the realized output amount.
    fn exact_input_single<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        sender: Address,
        params: &ExactInputSingleParams,
    ) -> Result<U256, RouterError>;

    fn exact_input<L: TokenLedger>(
        &mut self,
        _ledger: &mut L,
        _sender: Address,
        _params: &ExactInputParams,
    ) -> Result<U256, RouterError> {
        Err(RouterError::Unsupported("exactInput"))
    }
}
