use ethers::types::{Address, Bytes, U256};

/// One caller-initiated swap, alive for the duration of a single `exchange`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SwapRequest {
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: U256,
    pub min_output_amount: U256,
    pub receiver: Address,
}

/// Router-side encoding of a [`SwapRequest`] for an exact-input single-hop swap.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExactInputSingleParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub sqrt_price_limit_x96: U256,
}

/// Multi-hop variant. Declared on the router capability, never built by the
/// settlement.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExactInputParams {
    pub path: Bytes,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeadlinePolicy {
    /// Deadline equals the block timestamp of the executing call.
    CurrentBlockTimestamp,
    SecondsFromNow(u64),
}

impl DeadlinePolicy {
    pub fn deadline(&self, block: &BlockContext) -> u64 {
        match self {
            DeadlinePolicy::CurrentBlockTimestamp => block.timestamp,
            DeadlinePolicy::SecondsFromNow(secs) => block.timestamp.saturating_add(*secs),
        }
    }
}

/// Execution environment visible to a settlement call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BlockContext {
    pub timestamp: u64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RunMode {
    Quote,
    Settle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_policies() {
        let block = BlockContext { timestamp: 1_700_000_000 };

        assert_eq!(
            DeadlinePolicy::CurrentBlockTimestamp.deadline(&block),
            1_700_000_000
        );
        assert_eq!(
            DeadlinePolicy::SecondsFromNow(600).deadline(&block),
            1_700_000_600
        );
        assert_eq!(
            DeadlinePolicy::SecondsFromNow(u64::MAX).deadline(&block),
            u64::MAX
        );
    }
}
