use crate::{
    decimal_from_json,
    error::{read_json, Result, SourceError},
    settings::Settings,
    AssetPriceAPI, FiatPriceAPI, NamedAPI, PriceSource,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

/// Binance reports an unlisted trading pair with this error code.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Binance spot ticker. Serves both the fiat fallback leg (`USDTRUB`) and the
/// asset leg (`TONUSDT`).
pub struct BinanceSpotAPI {
    client: Client,
    url: String,
    fiat_symbol: String,
    asset_symbol: String,
}

impl BinanceSpotAPI {
    pub fn build(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(settings.timeout()).build()?,
            url: settings.spot_url.clone(),
            fiat_symbol: settings.fiat_symbol(),
            asset_symbol: settings.asset_symbol(),
        })
    }

    pub async fn get_ticker(&self, symbol: &str) -> Result<Decimal> {
        let res = self
            .client
            .get(&self.url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;
        if res.status() == StatusCode::BAD_REQUEST {
            let body = read_json(res).await?;
            if body["code"].as_i64() == Some(INVALID_SYMBOL_CODE) {
                return Err(SourceError::UnknownSymbol(symbol.to_owned()));
            }
            return Err(SourceError::MalformedResponse(format!(
                "ticker {} rejected: {}",
                symbol, body
            )));
        }
        let res = read_json(res.error_for_status()?).await?;
        debug!("Binance ticker {} response {:?}", symbol, res);
        match decimal_from_json(&res["price"]) {
            Some(price) if price > Decimal::ZERO => Ok(price),
            _ => Err(SourceError::MalformedResponse(format!(
                "Cannot parse {} ticker price {}",
                symbol, res["price"]
            ))),
        }
    }
}

#[async_trait]
impl FiatPriceAPI for BinanceSpotAPI {
    fn source(&self) -> PriceSource {
        PriceSource::Spot
    }

    async fn get_fiat_price(&self) -> Option<Decimal> {
        match self.get_ticker(&self.fiat_symbol).await {
            Ok(price) => {
                info!("Binance Spot {} price: {}", self.fiat_symbol, price);
                Some(price.round_dp(2))
            }
            Err(e) => {
                warn!("Binance Spot {} error: {}", self.fiat_symbol, e);
                None
            }
        }
    }
}

#[async_trait]
impl AssetPriceAPI for BinanceSpotAPI {
    async fn get_asset_price(&self) -> Option<Decimal> {
        match self.get_ticker(&self.asset_symbol).await {
            Ok(price) => {
                info!("Binance Spot {} price: {}", self.asset_symbol, price);
                Some(price)
            }
            Err(e) => {
                warn!("Binance Spot {} error: {}", self.asset_symbol, e);
                None
            }
        }
    }
}

impl NamedAPI for BinanceSpotAPI {
    fn get_name(&self) -> String {
        "Binance Spot".to_owned()
    }
}
