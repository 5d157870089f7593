use crate::{
    binance_p2p::BinanceP2PAPI, binance_spot::BinanceSpotAPI, cg::CoinGeckoAPI,
    settings::Settings, CrossRate, NamedAssetPriceAPI, NamedFiatPriceAPI, PriceQuote, NO_DATA,
};
use anyhow::Result;
use futures::future;
use itertools::Itertools;
use log::{info, warn};
use std::sync::Arc;

/// Resolves the fiat price of the stablecoin through an ordered fallback chain
/// and combines it with the asset leg into a cross rate.
pub struct PriceResolver {
    fiat_apis: Vec<Arc<dyn NamedFiatPriceAPI>>,
    asset_api: Arc<dyn NamedAssetPriceAPI>,
}

impl PriceResolver {
    /// `fiat_apis` are tried in the given order.
    pub fn new(
        fiat_apis: Vec<Arc<dyn NamedFiatPriceAPI>>,
        asset_api: Arc<dyn NamedAssetPriceAPI>,
    ) -> Self {
        Self {
            fiat_apis,
            asset_api,
        }
    }

    /// P2P, then spot, then CoinGecko. The spot client also serves the asset leg.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let spot = Arc::new(BinanceSpotAPI::build(settings)?);
        let fiat_apis: Vec<Arc<dyn NamedFiatPriceAPI>> = vec![
            Arc::new(BinanceP2PAPI::build(settings)?),
            spot.clone(),
            Arc::new(CoinGeckoAPI::build(settings)?),
        ];
        Ok(Self::new(fiat_apis, spot))
    }

    pub fn chain_description(&self) -> String {
        self.fiat_apis.iter().map(|api| api.get_name()).join(" -> ")
    }

    /// First source to return a price wins; later sources are not queried.
    pub async fn resolve_fiat_price(&self) -> Option<PriceQuote> {
        for api in &self.fiat_apis {
            if let Some(value) = api.get_fiat_price().await {
                let quote = PriceQuote {
                    value,
                    source: api.source(),
                };
                info!("Fiat price {} from {}", quote.value, quote.source);
                return Some(quote);
            }
            warn!("{} returned no price, trying next source", api.get_name());
        }
        warn!("All fiat sources failed: {}", NO_DATA);
        None
    }

    /// Both legs are required; a missing one yields `None`, never a partial rate.
    pub async fn resolve_cross_rate(&self) -> Option<CrossRate> {
        let (fiat, asset) = future::join(
            self.resolve_fiat_price(),
            self.asset_api.get_asset_price(),
        )
        .await;
        match (fiat, asset) {
            (Some(fiat), Some(asset)) => {
                let rate = CrossRate::from_legs(fiat, asset);
                if rate.is_none() {
                    warn!("Cross rate overflowed for asset price {}", asset);
                }
                rate
            }
            (None, _) => None,
            (Some(_), None) => {
                warn!("{} returned no asset price", self.asset_api.get_name());
                None
            }
        }
    }
}
