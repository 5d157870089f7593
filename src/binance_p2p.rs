use crate::{
    decimal_from_json,
    error::{read_json, Result, SourceError},
    settings::Settings,
    FiatPriceAPI, NamedAPI, PriceSource,
};
use async_trait::async_trait;
use itertools::Itertools;
use log::{debug, info, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// One sell offer from the P2P order book.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub price: Decimal,
    pub available_volume: Decimal,
    pub payment_methods: Vec<String>,
}

impl Listing {
    /// Parses the `adv` object of a search result entry.
    pub fn from_adv(adv: &Value) -> Result<Self> {
        let field = |name: &str| {
            decimal_from_json(&adv[name]).ok_or_else(|| {
                SourceError::MalformedResponse(format!("listing {} is {}", name, adv[name]))
            })
        };
        let payment_methods = adv["tradeMethods"]
            .as_array()
            .ok_or_else(|| SourceError::MalformedResponse("listing has no tradeMethods".into()))?
            .iter()
            .map(|method| {
                method["identifier"]
                    .as_str()
                    .or_else(|| method["tradeMethodName"].as_str())
                    .unwrap_or("unknown")
                    .to_owned()
            })
            .collect();
        Ok(Self {
            price: field("price")?,
            available_volume: field("surplusAmount")?,
            payment_methods,
        })
    }

    /// Only offers with a positive price, volume left to trade and at least one
    /// payment method count towards the average.
    pub fn is_eligible(&self) -> bool {
        self.price > Decimal::ZERO
            && self.available_volume > Decimal::ZERO
            && !self.payment_methods.is_empty()
    }
}

/// Mean of the `top_n` cheapest eligible prices, rounded to 2 decimal places.
/// Returns `None` when no listing is eligible or the prices overflow a `Decimal`.
pub fn representative_price(listings: &[Listing], top_n: usize) -> Option<Decimal> {
    let cheapest = listings
        .iter()
        .filter(|l| l.is_eligible())
        .map(|l| l.price)
        .sorted()
        .take(top_n.max(1))
        .collect_vec();
    if cheapest.is_empty() {
        return None;
    }
    let sum = cheapest
        .iter()
        .try_fold(Decimal::ZERO, |acc, price| acc.checked_add(*price))?;
    Some((sum / Decimal::from(cheapest.len())).round_dp(2))
}

/// Binance P2P order-book search, reduced to a single stablecoin price.
pub struct BinanceP2PAPI {
    client: Client,
    url: String,
    asset: String,
    fiat: String,
    rows: u32,
    top_n: usize,
}

impl BinanceP2PAPI {
    pub fn build(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(settings.timeout()).build()?,
            url: settings.p2p_url.clone(),
            asset: settings.stable_asset.to_uppercase(),
            fiat: settings.fiat.to_uppercase(),
            rows: settings.p2p_rows,
            top_n: settings.p2p_top_n,
        })
    }

    pub async fn get_listings(&self) -> Result<Vec<Listing>> {
        let body = json!({
            "asset": self.asset,
            "fiat": self.fiat,
            "tradeType": "BUY",
            "page": 1,
            "rows": self.rows,
            "payTypes": [],
            "countries": [],
            "proMerchantAds": false,
            "publisherType": null,
            "transAmount": "",
        });
        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let res = read_json(res).await?;

        if res["success"].as_bool() != Some(true) {
            return Err(SourceError::NoEligibleData("search was not successful".into()));
        }
        let ads = match res["data"].as_array() {
            Some(ads) if !ads.is_empty() => ads,
            _ => return Err(SourceError::NoEligibleData("no offers found".into())),
        };

        Ok(ads
            .iter()
            .filter_map(|ad| match Listing::from_adv(&ad["adv"]) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    debug!("Skipping P2P offer: {}", e);
                    None
                }
            })
            .collect())
    }

    pub async fn get_price(&self) -> Result<Decimal> {
        let listings = self.get_listings().await?;
        let eligible = listings.iter().filter(|l| l.is_eligible()).count();
        let price = representative_price(&listings, self.top_n)
            .ok_or_else(|| SourceError::NoEligibleData("no valid offers found".into()))?;
        info!("Binance P2P: found {} offers, average price: {}", eligible, price);
        Ok(price)
    }
}

#[async_trait]
impl FiatPriceAPI for BinanceP2PAPI {
    fn source(&self) -> PriceSource {
        PriceSource::P2P
    }

    async fn get_fiat_price(&self) -> Option<Decimal> {
        self.get_price()
            .await
            .map_err(|e| warn!("Binance P2P error: {}", e))
            .ok()
    }
}

impl NamedAPI for BinanceP2PAPI {
    fn get_name(&self) -> String {
        "Binance P2P".to_owned()
    }
}
