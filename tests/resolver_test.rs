mod common;

use async_trait::async_trait;
use mockito::{Matcher, Server};
use rust_decimal::Decimal;
use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tonratebot::{
    settings::Settings, strategy::PriceResolver, AssetPriceAPI, CrossRate, FiatPriceAPI,
    NamedAPI, NamedFiatPriceAPI, PriceQuote, PriceSource,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct StubAPI {
    source: PriceSource,
    price: Option<Decimal>,
    calls: AtomicUsize,
}

impl StubAPI {
    fn new(source: PriceSource, price: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            source,
            price: price.map(dec),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FiatPriceAPI for StubAPI {
    fn source(&self) -> PriceSource {
        self.source
    }

    async fn get_fiat_price(&self) -> Option<Decimal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.price
    }
}

#[async_trait]
impl AssetPriceAPI for StubAPI {
    async fn get_asset_price(&self) -> Option<Decimal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.price
    }
}

impl NamedAPI for StubAPI {
    fn get_name(&self) -> String {
        format!("stub {}", self.source)
    }
}

struct Chain {
    p2p: Arc<StubAPI>,
    spot: Arc<StubAPI>,
    cg: Arc<StubAPI>,
    asset: Arc<StubAPI>,
}

impl Chain {
    fn new(p2p: Option<&str>, spot: Option<&str>, cg: Option<&str>, asset: Option<&str>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            p2p: StubAPI::new(PriceSource::P2P, p2p),
            spot: StubAPI::new(PriceSource::Spot, spot),
            cg: StubAPI::new(PriceSource::ExternalAggregator, cg),
            asset: StubAPI::new(PriceSource::Spot, asset),
        }
    }

    fn resolver(&self) -> PriceResolver {
        let fiat_apis: Vec<Arc<dyn NamedFiatPriceAPI>> =
            vec![self.p2p.clone(), self.spot.clone(), self.cg.clone()];
        PriceResolver::new(fiat_apis, self.asset.clone())
    }

    fn calls(&self) -> [usize; 3] {
        [self.p2p.calls(), self.spot.calls(), self.cg.calls()]
    }
}

#[tokio::test]
async fn p2p_success_short_circuits() {
    let chain = Chain::new(Some("95.25"), Some("96.12"), Some("97"), None);
    let quote = chain.resolver().resolve_fiat_price().await;
    assert_eq!(
        quote,
        Some(PriceQuote {
            value: dec("95.25"),
            source: PriceSource::P2P
        })
    );
    assert_eq!(chain.calls(), [1, 0, 0]);
}

#[tokio::test]
async fn falls_back_to_spot() {
    let chain = Chain::new(None, Some("96.12"), Some("97"), None);
    let quote = chain.resolver().resolve_fiat_price().await.unwrap();
    assert_eq!(quote.value, dec("96.12"));
    assert_eq!(quote.source.label(), "Spot Binance");
    assert_eq!(chain.calls(), [1, 1, 0]);
}

#[tokio::test]
async fn falls_back_to_coingecko() {
    let chain = Chain::new(None, None, Some("97.5"), None);
    let quote = chain.resolver().resolve_fiat_price().await.unwrap();
    assert_eq!(quote.value, dec("97.5"));
    assert_eq!(quote.source.label(), "CoinGecko");
    assert_eq!(chain.calls(), [1, 1, 1]);
}

#[tokio::test]
async fn all_fiat_sources_fail() {
    let chain = Chain::new(None, None, None, Some("3.2"));
    let resolver = chain.resolver();
    assert_eq!(resolver.resolve_fiat_price().await, None);
    assert_eq!(chain.calls(), [1, 1, 1]);
    assert_eq!(resolver.resolve_cross_rate().await, None);
}

#[tokio::test]
async fn cross_rate_multiplies_legs() {
    let chain = Chain::new(Some("95.25"), Some("96.12"), None, Some("3.2"));
    let rate = chain.resolver().resolve_cross_rate().await.unwrap();
    assert_eq!(rate.asset_in_fiat, dec("304.8"));
    assert_eq!(rate.fiat_per_stable, dec("95.25"));
    assert_eq!(rate.asset_per_stable, dec("3.2"));
    assert_eq!(rate.source, PriceSource::P2P);
    assert_eq!(rate.convert(dec("2")), Some(dec("609.6")));
    assert_eq!(chain.calls(), [1, 0, 0]);
    assert_eq!(chain.asset.calls(), 1);
}

#[tokio::test]
async fn missing_asset_leg_fails_cross_rate() {
    let chain = Chain::new(Some("95.25"), None, None, None);
    assert_eq!(chain.resolver().resolve_cross_rate().await, None);
    assert_eq!(chain.asset.calls(), 1);
}

#[tokio::test]
async fn overflowing_cross_rate_fails() {
    let chain = Chain::new(
        Some("95"),
        None,
        None,
        Some("79228162514264337593543950335"),
    );
    assert_eq!(chain.resolver().resolve_cross_rate().await, None);
    assert_eq!(chain.calls(), [1, 0, 0]);
    assert_eq!(chain.asset.calls(), 1);
}

#[test]
fn overflowing_legs_are_rejected() {
    let fiat = PriceQuote {
        value: dec("95"),
        source: PriceSource::P2P,
    };
    assert_eq!(CrossRate::from_legs(fiat.clone(), Decimal::MAX), None);

    let rate = CrossRate::from_legs(fiat, dec("3.2")).unwrap();
    assert_eq!(rate.asset_in_fiat, dec("304"));
    assert_eq!(rate.convert(Decimal::MAX), None);
}

#[tokio::test]
async fn p2p_timeout_falls_back_to_spot() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (stalled_url, stalled) = common::stalled_server().await;
    let mut server = Server::new_async().await;
    let usdt_rub = server
        .mock("GET", "/ticker")
        .match_query(Matcher::UrlEncoded("symbol".into(), "USDTRUB".into()))
        .with_status(200)
        .with_body(r#"{"symbol":"USDTRUB","price":"96.123"}"#)
        .create_async()
        .await;
    let cg = server
        .mock("GET", "/cg")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let settings = Settings {
        p2p_url: format!("{}/p2p", stalled_url),
        spot_url: format!("{}/ticker", server.url()),
        coingecko_url: format!("{}/cg", server.url()),
        timeout_secs: 1,
        ..Settings::default()
    };
    let resolver = PriceResolver::from_settings(&settings).unwrap();
    let quote = resolver.resolve_fiat_price().await.unwrap();
    assert_eq!(quote.value, dec("96.12"));
    assert_eq!(quote.source, PriceSource::Spot);

    usdt_rub.assert_async().await;
    cg.assert_async().await;
    stalled.abort();
}

#[tokio::test]
async fn resolves_against_http_sources() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let p2p = server
        .mock("POST", "/p2p")
        .with_status(500)
        .create_async()
        .await;
    let usdt_rub = server
        .mock("GET", "/ticker")
        .match_query(Matcher::UrlEncoded("symbol".into(), "USDTRUB".into()))
        .with_status(200)
        .with_body(r#"{"symbol":"USDTRUB","price":"96.123"}"#)
        .create_async()
        .await;
    let ton_usdt = server
        .mock("GET", "/ticker")
        .match_query(Matcher::UrlEncoded("symbol".into(), "TONUSDT".into()))
        .with_status(200)
        .with_body(r#"{"symbol":"TONUSDT","price":"3.2"}"#)
        .create_async()
        .await;
    let cg = server
        .mock("GET", "/cg")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let settings = Settings {
        p2p_url: format!("{}/p2p", server.url()),
        spot_url: format!("{}/ticker", server.url()),
        coingecko_url: format!("{}/cg", server.url()),
        ..Settings::default()
    };
    let resolver = PriceResolver::from_settings(&settings).unwrap();
    assert_eq!(
        resolver.chain_description(),
        "Binance P2P -> Binance Spot -> CoinGecko"
    );

    let rate = resolver.resolve_cross_rate().await.unwrap();
    assert_eq!(rate.fiat_per_stable, dec("96.12"));
    assert_eq!(rate.source.label(), "Spot Binance");
    assert_eq!(rate.asset_in_fiat, dec("307.584"));

    p2p.assert_async().await;
    usdt_rub.assert_async().await;
    ton_usdt.assert_async().await;
    cg.assert_async().await;
}
