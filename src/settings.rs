use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub p2p_url: String,
    pub spot_url: String,
    pub coingecko_url: String,
    /// Stablecoin both legs meet in.
    pub stable_asset: String,
    pub fiat: String,
    pub crypto_asset: String,
    /// CoinGecko id of `stable_asset`.
    pub coingecko_id: String,
    pub p2p_rows: u32,
    /// How many of the cheapest P2P offers are averaged.
    pub p2p_top_n: usize,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            p2p_url: "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search".to_owned(),
            spot_url: "https://api.binance.com/api/v3/ticker/price".to_owned(),
            coingecko_url: "https://api.coingecko.com/api/v3/simple/price".to_owned(),
            stable_asset: "USDT".to_owned(),
            fiat: "RUB".to_owned(),
            crypto_asset: "TON".to_owned(),
            coingecko_id: "tether".to_owned(),
            p2p_rows: 20,
            p2p_top_n: 5,
            timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Defaults, then `tonratebot.toml` if present, then `TONRATE_*` variables.
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name("tonratebot").required(false))
            .add_source(Environment::with_prefix("TONRATE").try_parsing(true))
            .build()
            .context("Building configuration")?
            .try_deserialize()
            .context("Parsing configuration")
    }

    /// Ticker symbol of the stablecoin priced in fiat, e.g. `USDTRUB`.
    pub fn fiat_symbol(&self) -> String {
        format!(
            "{}{}",
            self.stable_asset.to_uppercase(),
            self.fiat.to_uppercase()
        )
    }

    /// Ticker symbol of the crypto asset priced in the stablecoin, e.g. `TONUSDT`.
    pub fn asset_symbol(&self) -> String {
        format!(
            "{}{}",
            self.crypto_asset.to_uppercase(),
            self.stable_asset.to_uppercase()
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
