pub mod binance_p2p;
pub mod binance_spot;
pub mod cg;
pub mod error;
pub mod reply;
pub mod settings;
pub mod strategy;

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

/// Label reported when no fiat source produced a price.
pub const NO_DATA: &str = "No data";

/// A source of the stablecoin price in fiat (USDT in RUB by default).
///
/// Implementations swallow their own transport and parsing errors: a failure is
/// logged and reported as `None` so the caller can move on to the next source.
#[async_trait]
pub trait FiatPriceAPI {
    fn source(&self) -> PriceSource;

    async fn get_fiat_price(&self) -> Option<Decimal>;
}

/// A source of the crypto asset price in the stablecoin (TON in USDT by default).
#[async_trait]
pub trait AssetPriceAPI {
    async fn get_asset_price(&self) -> Option<Decimal>;
}

pub trait NamedAPI {
    fn get_name(&self) -> String;
}

pub trait NamedFiatPriceAPI: NamedAPI + FiatPriceAPI + Send + Sync {}
impl<T: NamedAPI + FiatPriceAPI + Send + Sync> NamedFiatPriceAPI for T {}

pub trait NamedAssetPriceAPI: NamedAPI + AssetPriceAPI + Send + Sync {}
impl<T: NamedAPI + AssetPriceAPI + Send + Sync> NamedAssetPriceAPI for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    P2P,
    Spot,
    ExternalAggregator,
}

impl PriceSource {
    pub fn label(&self) -> &'static str {
        match self {
            PriceSource::P2P => "P2P Binance",
            PriceSource::Spot => "Spot Binance",
            PriceSource::ExternalAggregator => "CoinGecko",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub value: Decimal,
    pub source: PriceSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossRate {
    /// Price of one unit of the crypto asset in fiat.
    pub asset_in_fiat: Decimal,
    pub fiat_per_stable: Decimal,
    pub asset_per_stable: Decimal,
    /// Where the fiat leg came from. The asset leg is always the spot ticker.
    pub source: PriceSource,
}

impl CrossRate {
    /// `None` when the product of the legs does not fit in a `Decimal`.
    pub fn from_legs(fiat: PriceQuote, asset_per_stable: Decimal) -> Option<Self> {
        Some(Self {
            asset_in_fiat: asset_per_stable.checked_mul(fiat.value)?,
            fiat_per_stable: fiat.value,
            asset_per_stable,
            source: fiat.source,
        })
    }

    pub fn convert(&self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.asset_per_stable)?
            .checked_mul(self.fiat_per_stable)
    }
}

/// Reads a decimal out of a JSON value that may be either a string or a number.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
