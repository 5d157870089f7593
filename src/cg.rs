use crate::{
    decimal_from_json,
    error::{read_json, Result, SourceError},
    settings::Settings,
    FiatPriceAPI, NamedAPI, PriceSource,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use rust_decimal::Decimal;

/// Last resort for the fiat leg: CoinGecko's `simple/price` endpoint.
pub struct CoinGeckoAPI {
    client: Client,
    url: String,
    id: String,
    vs_currency: String,
}

impl CoinGeckoAPI {
    pub fn build(settings: &Settings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(settings.timeout())
                .build()?,
            url: settings.coingecko_url.clone(),
            id: settings.coingecko_id.clone(),
            vs_currency: settings.fiat.to_lowercase(),
        })
    }

    /// Raw aggregator value, no rounding applied.
    pub async fn get_price(&self) -> Result<Decimal> {
        let res = self
            .client
            .get(&self.url)
            .query(&[
                ("ids", self.id.as_str()),
                ("vs_currencies", self.vs_currency.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let res = read_json(res).await?;
        debug!("CoinGecko response {:?}", res);
        let entry = &res[self.id.as_str()][self.vs_currency.as_str()];
        if entry.is_null() {
            return Err(SourceError::MalformedResponse(format!(
                "missing {}.{} in CoinGecko response",
                self.id, self.vs_currency
            )));
        }
        match decimal_from_json(entry) {
            Some(price) if price > Decimal::ZERO => Ok(price),
            _ => Err(SourceError::MalformedResponse(format!(
                "Cannot parse CoinGecko price {}",
                entry
            ))),
        }
    }
}

#[async_trait]
impl FiatPriceAPI for CoinGeckoAPI {
    fn source(&self) -> PriceSource {
        PriceSource::ExternalAggregator
    }

    async fn get_fiat_price(&self) -> Option<Decimal> {
        match self.get_price().await {
            Ok(price) => {
                info!("CoinGecko price: {}", price);
                Some(price)
            }
            Err(e) => {
                warn!("CoinGecko error: {}", e);
                None
            }
        }
    }
}

impl NamedAPI for CoinGeckoAPI {
    fn get_name(&self) -> String {
        "CoinGecko".to_owned()
    }
}
