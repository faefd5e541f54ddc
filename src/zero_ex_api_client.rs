use crate::configuration::Configuration;
use crate::constants::ZERO_EX_API_VERSION;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const SOURCES_PATH: &str = "sources";
const PRICE_PATH: &str = "swap/allowance-holder/price";
const QUOTE_PATH: &str = "swap/allowance-holder/quote";

/// Query shared by the indicative price and the firm quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceParams {
    pub chain_id: u64,
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: U256,
    pub taker: Address,
    pub swap_fee_recipient: Address,
    pub swap_fee_bps: u32,
    pub swap_fee_token: Address,
    pub trade_surplus_recipient: Option<Address>,
}

impl PriceParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("chainId", self.chain_id.to_string()),
            ("sellToken", format!("{:?}", self.sell_token)),
            ("buyToken", format!("{:?}", self.buy_token)),
            ("sellAmount", self.sell_amount.to_string()),
            ("taker", format!("{:?}", self.taker)),
            ("swapFeeRecipient", format!("{:?}", self.swap_fee_recipient)),
            ("swapFeeBps", self.swap_fee_bps.to_string()),
            ("swapFeeToken", format!("{:?}", self.swap_fee_token)),
        ];
        if let Some(recipient) = self.trade_surplus_recipient {
            pairs.push(("tradeSurplusRecipient", format!("{:?}", recipient)));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub liquidity_available: bool,
    #[serde(default)]
    pub buy_amount: Option<String>,
    #[serde(default)]
    pub sell_amount: Option<String>,
    #[serde(default)]
    pub min_buy_amount: Option<String>,
    #[serde(default)]
    pub issues: Issues,
    #[serde(default)]
    pub route: Route,
    #[serde(default)]
    pub fees: Fees,
    #[serde(default)]
    pub token_metadata: Option<TokenMetadata>,
    #[serde(default)]
    pub trade_surplus: Option<String>,
    #[serde(default)]
    pub total_network_fee: Option<String>,
}

impl PriceResponse {
    pub fn buy_amount(&self) -> Result<U256> {
        required_amount(self.buy_amount.as_deref(), "buyAmount")
    }

    pub fn sell_amount(&self) -> Result<U256> {
        required_amount(self.sell_amount.as_deref(), "sellAmount")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub price: PriceResponse,
    #[serde(default)]
    pub transaction: Option<QuoteTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issues {
    #[serde(default)]
    pub allowance: Option<AllowanceIssue>,
    #[serde(default)]
    pub balance: Option<BalanceIssue>,
    #[serde(default)]
    pub simulation_incomplete: bool,
}

/// Present when the taker has not approved `spender` for the sell amount.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AllowanceIssue {
    pub actual: String,
    pub spender: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceIssue {
    pub token: Address,
    pub actual: String,
    pub expected: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub tokens: Vec<RouteToken>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub from: Address,
    pub to: Address,
    pub source: String,
    pub proportion_bps: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteToken {
    pub address: Address,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fees {
    #[serde(default)]
    pub integrator_fee: Option<Fee>,
    #[serde(default)]
    pub zero_ex_fee: Option<Fee>,
    #[serde(default)]
    pub gas_fee: Option<Fee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fee {
    pub amount: String,
    pub token: Address,
    #[serde(rename = "type")]
    pub fee_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub buy_token: TokenTaxes,
    pub sell_token: TokenTaxes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTaxes {
    #[serde(default)]
    pub buy_tax_bps: Option<String>,
    #[serde(default)]
    pub sell_tax_bps: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTransaction {
    pub to: Address,
    pub data: Bytes,
    #[serde(default)]
    pub gas: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// The aggregation endpoints the quote flow depends on.
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn get_sources(&self, chain_id: u64) -> Result<Vec<String>>;

    async fn get_price(&self, params: &PriceParams) -> Result<PriceResponse>;

    async fn get_quote(&self, params: &PriceParams) -> Result<QuoteResponse>;
}

pub struct ZeroExApiClient {
    base_url: Url,
    api_key: String,
    http_client: reqwest::Client,
}

impl ZeroExApiClient {
    pub fn new(config: &Configuration) -> Result<Self> {
        let mut base_url = config.zero_ex_api_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            base_url: Url::parse(&base_url)
                .with_context(|| format!("invalid 0x API url {}", config.zero_ex_api_url))?,
            api_key: config.zero_ex_api_key.clone(),
            http_client: reqwest::Client::new(),
        })
    }

    fn endpoint_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint_url(path, query)?;

        let response = self
            .http_client
            .get(url)
            .header("Content-Type", "application/json")
            .header("0x-api-key", &self.api_key)
            .header("0x-version", ZERO_EX_API_VERSION)
            .send()
            .await?;

        match response.error_for_status_ref() {
            Ok(_) => {
                let body = response.text().await?;
                debug!("GET {} returned: {}", path, body);
                serde_json::from_str(&body)
                    .with_context(|| format!("unable to parse response from {}", path))
            }
            Err(err) => {
                debug!("GET {} failed with body: {:?}", path, response.text().await?);
                Err(anyhow!(err))
            }
        }
    }
}

#[async_trait]
impl SwapApi for ZeroExApiClient {
    async fn get_sources(&self, chain_id: u64) -> Result<Vec<String>> {
        let response: SourcesResponse = self
            .get_json(SOURCES_PATH, &[("chainId", chain_id.to_string())])
            .await?;
        Ok(response.sources)
    }

    async fn get_price(&self, params: &PriceParams) -> Result<PriceResponse> {
        self.get_json(PRICE_PATH, &params.query_pairs()).await
    }

    async fn get_quote(&self, params: &PriceParams) -> Result<QuoteResponse> {
        self.get_json(QUOTE_PATH, &params.query_pairs()).await
    }
}

/// Parse a decimal-string integer as returned by the API.
pub fn parse_amount(amount: &str) -> Result<U256> {
    if amount.is_empty() {
        return Err(anyhow!("empty amount"));
    }
    U256::from_dec_str(amount).map_err(|err| anyhow!("invalid amount {:?}: {:?}", amount, err))
}

fn required_amount(amount: Option<&str>, field: &str) -> Result<U256> {
    let amount = amount.with_context(|| format!("response is missing `{}`", field))?;
    parse_amount(amount).with_context(|| format!("unable to parse `{}`", field))
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub const PRICE_WITH_ALLOWANCE_ISSUE: &str = r#"{
        "blockNumber": "21000000",
        "buyAmount": "38251967082928",
        "buyToken": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        "fees": {
            "integratorFee": {
                "amount": "386383505888",
                "token": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                "type": "volume"
            },
            "zeroExFee": null,
            "gasFee": null
        },
        "issues": {
            "allowance": {
                "actual": "0",
                "spender": "0x0000000000001ff3684f28c67538d4d072c22734"
            },
            "balance": null,
            "simulationIncomplete": false,
            "invalidSourcesPassed": []
        },
        "liquidityAvailable": true,
        "minBuyAmount": "37869447412098",
        "route": {
            "fills": [
                {
                    "from": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                    "to": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                    "source": "Uniswap_V3",
                    "proportionBps": "7000"
                },
                {
                    "from": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                    "to": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                    "source": "Curve",
                    "proportionBps": "3000"
                }
            ],
            "tokens": [
                {"address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "symbol": "USDC"},
                {"address": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "symbol": "WETH"}
            ]
        },
        "sellAmount": "100000",
        "sellToken": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
        "tokenMetadata": {
            "buyToken": {"buyTaxBps": "0", "sellTaxBps": "0"},
            "sellToken": {"buyTaxBps": "150", "sellTaxBps": "250"}
        },
        "totalNetworkFee": "1215000000000",
        "tradeSurplus": "1200",
        "zid": "0x111111111111111111111111"
    }"#;

    #[test]
    fn test_parse_price_response() {
        let price: PriceResponse =
            serde_json::from_str(PRICE_WITH_ALLOWANCE_ISSUE).expect("failed to parse");

        assert!(price.liquidity_available);
        assert_eq!(price.buy_amount().unwrap(), U256::from(38_251_967_082_928u64));
        let allowance = price.issues.allowance.expect("allowance issue missing");
        assert_eq!(
            allowance.spender,
            "0x0000000000001ff3684f28c67538d4d072c22734"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(price.route.fills.len(), 2);
        assert_eq!(price.route.fills[0].source, "Uniswap_V3");
        assert_eq!(
            price.fees.integrator_fee.map(|fee| fee.fee_type),
            Some("volume".to_string())
        );
        assert_eq!(
            price.token_metadata.unwrap().sell_token.sell_tax_bps,
            Some("250".to_string())
        );
        assert_eq!(price.trade_surplus, Some("1200".to_string()));
    }

    #[test]
    fn test_parse_no_liquidity_response() {
        let price: PriceResponse =
            serde_json::from_str(r#"{"liquidityAvailable": false, "zid": "0x1"}"#)
                .expect("failed to parse");

        assert!(!price.liquidity_available);
        assert!(price.issues.allowance.is_none());
        assert!(price.route.fills.is_empty());
    }

    #[test]
    fn test_missing_or_empty_amounts_are_errors() {
        let price: PriceResponse =
            serde_json::from_str(r#"{"liquidityAvailable": true}"#).expect("failed to parse");

        assert_eq!(price.buy_amount, None);
        let err = price.buy_amount().unwrap_err();
        assert!(format!("{:#}", err).contains("missing `buyAmount`"));
        assert!(price.sell_amount().is_err());

        let price: PriceResponse =
            serde_json::from_str(r#"{"liquidityAvailable": true, "buyAmount": ""}"#)
                .expect("failed to parse");
        assert!(price.buy_amount().is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_parse_quote_with_transaction() {
        let body = r#"{
            "liquidityAvailable": true,
            "buyAmount": "10",
            "sellAmount": "20",
            "issues": {"allowance": null, "balance": null, "simulationIncomplete": false},
            "transaction": {
                "to": "0x0000000000001ff3684f28c67538d4d072c22734",
                "data": "0x1fff991f",
                "gas": "288079",
                "gasPrice": "4837860000",
                "value": "0"
            }
        }"#;

        let quote: QuoteResponse = serde_json::from_str(body).expect("failed to parse");

        assert_eq!(quote.price.buy_amount.as_deref(), Some("10"));
        assert_eq!(quote.price.sell_amount().unwrap(), U256::from(20));
        let transaction = quote.transaction.expect("transaction missing");
        assert_eq!(transaction.gas.as_deref(), Some("288079"));
        assert_eq!(transaction.data.to_vec(), vec![0x1f, 0xff, 0x99, 0x1f]);
    }

    #[test]
    fn test_query_pairs_include_fee_and_surplus_parameters() {
        let taker = Address::random();
        let params = PriceParams {
            chain_id: 1,
            sell_token: Address::random(),
            buy_token: Address::random(),
            sell_amount: 100_000.into(),
            taker,
            swap_fee_recipient: taker,
            swap_fee_bps: 100,
            swap_fee_token: Address::random(),
            trade_surplus_recipient: Some(taker),
        };

        let pairs = params.query_pairs();

        assert!(pairs.contains(&("sellAmount", "100000".to_string())));
        assert!(pairs.contains(&("swapFeeBps", "100".to_string())));
        assert!(pairs.contains(&("tradeSurplusRecipient", format!("{:?}", taker))));

        let without_surplus = PriceParams {
            trade_surplus_recipient: None,
            ..params
        };
        assert!(without_surplus
            .query_pairs()
            .iter()
            .all(|(key, _)| *key != "tradeSurplusRecipient"));
    }

    #[test]
    fn test_endpoint_url() {
        let client = ZeroExApiClient {
            base_url: Url::parse("https://api.0x.org/").unwrap(),
            api_key: "key".to_string(),
            http_client: reqwest::Client::new(),
        };

        let url = client
            .endpoint_url(PRICE_PATH, &[("chainId", "1".to_string())])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.0x.org/swap/allowance-holder/price?chainId=1"
        );
    }
}
