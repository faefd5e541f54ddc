pub mod configuration;
pub mod constants;
pub mod contracts;
pub mod ethereum_client;
pub mod metrics;
pub mod quote_flow;
pub mod settlement;
pub mod types;
pub mod zero_ex_api_client;
