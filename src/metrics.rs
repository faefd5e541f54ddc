//! Metrics derived from an aggregation API price or quote response.
//!
//! Fee, surplus, tax and source fields are optional in the API. A field
//! that is absent is reported as such rather than treated as an error;
//! a field that is present but malformed is an error.

use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use std::fmt;

use crate::constants::MAX_BPS;
use crate::zero_ex_api_client::{parse_amount, PriceResponse, Route, TokenMetadata};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceShare {
    pub source: String,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenTaxPercentages {
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxSummary {
    pub buy_token: TokenTaxPercentages,
    pub sell_token: TokenTaxPercentages,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffiliateFee {
    pub amount: U256,
    pub token: Address,
    /// Fee as a share of the quoted buy amount. `None` when the buy amount is zero.
    pub percent_of_buy_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteMetrics {
    pub sources: Vec<SourceShare>,
    pub taxes: Option<TaxSummary>,
    pub affiliate_fee: Option<AffiliateFee>,
    pub trade_surplus: Option<U256>,
}

impl QuoteMetrics {
    pub fn from_response(response: &PriceResponse) -> Result<Self> {
        Ok(Self {
            sources: liquidity_breakdown(&response.route)?,
            taxes: tax_summary(response.token_metadata.as_ref())?,
            affiliate_fee: affiliate_fee(response)?,
            trade_surplus: response
                .trade_surplus
                .as_deref()
                .map(parse_amount)
                .transpose()
                .context("unable to parse `tradeSurplus`")?,
        })
    }
}

pub fn bps_to_percent(bps: u32) -> f64 {
    f64::from(bps) / 100.0
}

fn parse_bps(value: &str) -> Result<u32> {
    let bps = value
        .parse::<u32>()
        .with_context(|| format!("invalid basis points {:?}", value))?;
    anyhow::ensure!(bps <= MAX_BPS, "basis points {} exceed {}", bps, MAX_BPS);
    Ok(bps)
}

pub fn liquidity_breakdown(route: &Route) -> Result<Vec<SourceShare>> {
    route
        .fills
        .iter()
        .map(|fill| {
            Ok(SourceShare {
                source: fill.source.clone(),
                percent: bps_to_percent(parse_bps(&fill.proportion_bps)?),
            })
        })
        .collect()
}

pub fn tax_summary(metadata: Option<&TokenMetadata>) -> Result<Option<TaxSummary>> {
    let metadata = match metadata {
        Some(metadata) => metadata,
        None => return Ok(None),
    };

    let percent = |bps: &Option<String>| -> Result<Option<f64>> {
        bps.as_deref()
            .map(|bps| parse_bps(bps).map(bps_to_percent))
            .transpose()
    };

    Ok(Some(TaxSummary {
        buy_token: TokenTaxPercentages {
            buy_tax: percent(&metadata.buy_token.buy_tax_bps)?,
            sell_tax: percent(&metadata.buy_token.sell_tax_bps)?,
        },
        sell_token: TokenTaxPercentages {
            buy_tax: percent(&metadata.sell_token.buy_tax_bps)?,
            sell_tax: percent(&metadata.sell_token.sell_tax_bps)?,
        },
    }))
}

pub fn affiliate_fee(response: &PriceResponse) -> Result<Option<AffiliateFee>> {
    let fee = match &response.fees.integrator_fee {
        Some(fee) => fee,
        None => return Ok(None),
    };

    let amount = parse_amount(&fee.amount).context("unable to parse integrator fee amount")?;
    let buy_amount = response.buy_amount()?;

    let percent_of_buy_amount = if buy_amount.is_zero() {
        None
    } else {
        let ratio_bps = amount
            .checked_mul(U256::from(MAX_BPS))
            .context("integrator fee overflows")?
            / buy_amount;
        Some(ratio_bps.min(U256::from(u32::MAX)).as_u32() as f64 / 100.0)
    };

    Ok(Some(AffiliateFee {
        amount,
        token: fee.token,
        percent_of_buy_amount,
    }))
}

fn write_percent(f: &mut fmt::Formatter<'_>, label: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(value) => writeln!(f, "  {}: {:.2}%", label, value),
        None => writeln!(f, "  {}: not reported", label),
    }
}

impl fmt::Display for QuoteMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "liquidity sources:")?;
        if self.sources.is_empty() {
            writeln!(f, "  none reported")?;
        }
        for share in &self.sources {
            writeln!(f, "  {}: {:.2}%", share.source, share.percent)?;
        }

        match &self.taxes {
            Some(taxes) => {
                writeln!(f, "token taxes:")?;
                write_percent(f, "buy token buy tax", taxes.buy_token.buy_tax)?;
                write_percent(f, "buy token sell tax", taxes.buy_token.sell_tax)?;
                write_percent(f, "sell token buy tax", taxes.sell_token.buy_tax)?;
                write_percent(f, "sell token sell tax", taxes.sell_token.sell_tax)?;
            }
            None => writeln!(f, "token taxes: not reported")?,
        }

        match &self.affiliate_fee {
            Some(fee) => {
                writeln!(f, "affiliate fee: {} of {:?}", fee.amount, fee.token)?;
                write_percent(f, "share of buy amount", fee.percent_of_buy_amount)?;
            }
            None => writeln!(f, "affiliate fee: not reported")?,
        }

        match &self.trade_surplus {
            Some(surplus) => write!(f, "trade surplus: {}", surplus),
            None => write!(f, "trade surplus: not reported"),
        }
    }
}
