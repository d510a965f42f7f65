//! eBay Browse API listing source.
//!
//! Client-credentials OAuth (token cached per client), then two Browse searches
//! per part restricted to used, fixed-price items in the part's category.
//! Results are de-duplicated by `itemId`; shipping comes from the first
//! shipping option. Items whose price can't be parsed, or whose total exceeds
//! the configured maximum, are dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::domain::{PartQuery, RawListing, VehicleInfo};

use super::provider::{search_queries, ListingSource, MarketplaceError};

const OAUTH_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";
/// Used condition, Buy It Now only.
const SEARCH_FILTER: &str = "conditionIds:{3000},buyingOptions:{FIXED_PRICE}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EbayEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl EbayEnvironment {
    pub fn api_base(self) -> &'static str {
        match self {
            EbayEnvironment::Sandbox => "https://api.sandbox.ebay.com",
            EbayEnvironment::Production => "https://api.ebay.com",
        }
    }
}

impl FromStr for EbayEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SANDBOX" => Ok(EbayEnvironment::Sandbox),
            "PRODUCTION" => Ok(EbayEnvironment::Production),
            other => Err(format!("unknown eBay environment '{other}'")),
        }
    }
}

/// Search settings (`[marketplace]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceSettings {
    /// Listings whose price + shipping exceeds this are ignored.
    pub max_total_price: f64,
    pub result_limit: u32,
    pub timeout_secs: u64,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            max_total_price: 5000.0,
            result_limit: 200,
            timeout_secs: 10,
        }
    }
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
}

/// One entry of a Browse `item_summary/search` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub price: Option<Amount>,
    #[serde(default)]
    pub shipping_options: Vec<ShippingOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    /// eBay sends amounts as strings; numbers are accepted too.
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub shipping_cost: Option<Amount>,
}

impl Amount {
    fn parse(&self) -> Option<f64> {
        let v = match self.value.as_ref()? {
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            serde_json::Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        (v.is_finite() && v >= 0.0).then_some(v)
    }
}

impl ItemSummary {
    /// `None` when the price (or a present shipping cost) doesn't parse.
    pub fn to_listing(&self) -> Option<RawListing> {
        let price = self.price.as_ref()?.parse()?;
        let shipping = match self
            .shipping_options
            .first()
            .and_then(|o| o.shipping_cost.as_ref())
        {
            Some(cost) if cost.value.is_some() => cost.parse()?,
            _ => 0.0,
        };
        let mut listing = RawListing::new(self.title.clone(), price, shipping);
        if let Some(id) = &self.item_id {
            listing = listing.with_item_id(id.clone());
        }
        Some(listing)
    }
}

/// Parse a Browse search body into item summaries.
pub fn parse_search_body(body: &str) -> Result<Vec<ItemSummary>, MarketplaceError> {
    let resp: SearchResponse = serde_json::from_str(body)
        .map_err(|e| MarketplaceError::ResponseFormatChanged(format!("search JSON: {e}")))?;
    Ok(resp.item_summaries)
}

/// Merge result batches, keeping the first occurrence of each `itemId`.
pub fn dedupe_items(batches: Vec<Vec<ItemSummary>>) -> Vec<ItemSummary> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for item in batches.into_iter().flatten() {
        let key = item
            .item_id
            .clone()
            .unwrap_or_else(|| format!("unknown_{}", seen.len()));
        if seen.insert(key) {
            merged.push(item);
        }
    }
    merged
}

/// Convert items to listings, dropping unparseable and over-limit ones.
pub fn listings_from_items(items: &[ItemSummary], max_total_price: f64) -> Vec<RawListing> {
    items
        .iter()
        .filter_map(ItemSummary::to_listing)
        .filter(|l| l.total() <= max_total_price)
        .collect()
}

// ── Client ──

pub struct EbayClient {
    http: reqwest::blocking::Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    settings: MarketplaceSettings,
    token: Mutex<Option<String>>,
}

impl EbayClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        environment: EbayEnvironment,
        settings: MarketplaceSettings,
    ) -> Result<Self, MarketplaceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| MarketplaceError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: environment.api_base().to_string(),
            settings,
            token: Mutex::new(None),
        })
    }

    /// Fails with `MissingCredentials` before any network call.
    pub fn from_credentials(
        credentials: &Credentials,
        settings: MarketplaceSettings,
    ) -> Result<Self, MarketplaceError> {
        let (id, secret) = credentials
            .require_ebay()
            .map_err(|e| MarketplaceError::MissingCredentials(e.to_string()))?;
        Self::new(id, secret, credentials.ebay_environment, settings)
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    fn access_token(&self) -> Result<String, MarketplaceError> {
        let mut cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let resp = self
            .http
            .post(format!("{}/identity/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", OAUTH_SCOPE)])
            .send()
            .map_err(|e| MarketplaceError::Authentication(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(MarketplaceError::Authentication(format!("HTTP {status}: {body}")));
        }

        let token = resp
            .json::<TokenResponse>()
            .map_err(|e| MarketplaceError::Authentication(format!("token response: {e}")))?
            .access_token
            .ok_or_else(|| MarketplaceError::Authentication("no access_token in response".into()))?;

        info!(api = %self.api_base, "marketplace token acquired");
        *cached = Some(token.clone());
        Ok(token)
    }

    fn forget_token(&self) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn run_query(
        &self,
        token: &str,
        query: &str,
        category_id: &str,
    ) -> Result<Vec<ItemSummary>, MarketplaceError> {
        let limit = self.settings.result_limit.to_string();
        let resp = self
            .http
            .get(format!("{}/buy/browse/v1/item_summary/search", self.api_base))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("category_ids", category_id),
                ("filter", SEARCH_FILTER),
                ("sort", "price"),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| MarketplaceError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.forget_token();
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(MarketplaceError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| MarketplaceError::Network(e.to_string()))?;
        parse_search_body(&body)
    }
}

impl ListingSource for EbayClient {
    fn name(&self) -> &str {
        "ebay-browse"
    }

    fn search(
        &self,
        vehicle: &VehicleInfo,
        part: &PartQuery,
    ) -> Result<Vec<RawListing>, MarketplaceError> {
        let mut token = self.access_token()?;
        let queries = search_queries(vehicle, part);

        let mut batches = Vec::with_capacity(queries.len());
        let mut last_error = None;
        for query in &queries {
            let mut result = self.run_query(&token, query, &part.category_id);
            if matches!(result, Err(MarketplaceError::Http { status: 401, .. })) {
                // The stale token is already dropped; log in again and retry once.
                info!(%query, "marketplace token rejected; re-authenticating");
                token = self.access_token()?;
                result = self.run_query(&token, query, &part.category_id);
            }
            match result {
                Ok(items) => {
                    debug!(%query, found = items.len(), "search query");
                    batches.push(items);
                }
                Err(e) => {
                    warn!(%query, error = %e, "search query failed");
                    last_error = Some(e);
                }
            }
        }

        if batches.is_empty() {
            return Err(MarketplaceError::AllQueriesFailed {
                queries: queries.len(),
                last: last_error.map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        let items = dedupe_items(batches);
        let listings = listings_from_items(&items, self.settings.max_total_price);
        info!(
            part = %part.name,
            unique = items.len(),
            kept = listings.len(),
            "marketplace search complete"
        );
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"total": 3, "itemSummaries": [
        {"itemId": "v1|111|0", "title": "12 Ford F150 5.0 Engine Motor",
         "price": {"value": "1200.00", "currency": "USD"},
         "shippingOptions": [{"shippingCost": {"value": "150.00", "currency": "USD"}}]},
        {"itemId": "v1|222|0", "title": "Engine local pickup",
         "price": {"value": "900.00", "currency": "USD"}},
        {"itemId": "v1|333|0", "title": "Broken price",
         "price": {"value": "call", "currency": "USD"}},
        {"itemId": "v1|444|0", "title": "Crate engine",
         "price": {"value": 5200, "currency": "USD"}}
    ]}"#;

    #[test]
    fn parses_prices_and_first_shipping_option() {
        let items = parse_search_body(BODY).unwrap();
        assert_eq!(items.len(), 4);
        let listings = listings_from_items(&items, 5000.0);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].total(), 1350.0);
        assert_eq!(listings[0].item_id.as_deref(), Some("v1|111|0"));
        assert_eq!(listings[1].shipping, 0.0);
    }

    #[test]
    fn over_limit_items_dropped() {
        let items = parse_search_body(BODY).unwrap();
        let all = listings_from_items(&items, 10_000.0);
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|l| l.price == 5200.0));
    }

    #[test]
    fn empty_response_is_empty_list() {
        assert!(parse_search_body(r#"{"total": 0}"#).unwrap().is_empty());
        assert!(parse_search_body("not json").is_err());
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let first = parse_search_body(BODY).unwrap();
        let second = parse_search_body(BODY).unwrap();
        let merged = dedupe_items(vec![first, second]);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn unparseable_shipping_drops_item() {
        let body = r#"{"itemSummaries": [
            {"itemId": "a", "title": "x", "price": {"value": "10"},
             "shippingOptions": [{"shippingCost": {"value": "n/a"}}]}
        ]}"#;
        let items = parse_search_body(body).unwrap();
        assert!(listings_from_items(&items, 5000.0).is_empty());
    }

    #[test]
    fn environment_parsing() {
        assert_eq!(
            "production".parse::<EbayEnvironment>().unwrap(),
            EbayEnvironment::Production
        );
        assert_eq!(EbayEnvironment::default().api_base(), "https://api.sandbox.ebay.com");
        assert!("staging".parse::<EbayEnvironment>().is_err());
    }

    #[test]
    fn missing_credentials_fail_before_network() {
        let creds = Credentials::default();
        let err = EbayClient::from_credentials(&creds, MarketplaceSettings::default())
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }

    // ── Local marketplace stub ──

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ONE_ITEM: &str = r#"{"total": 1, "itemSummaries": [
        {"itemId": "v1|1|0", "title": "Engine motor", "price": {"value": "1000.00"}}
    ]}"#;

    /// Serves tokens "t1", "t2", ... and answers searches with one item,
    /// or 401 when `rejects` says the bearer token is no longer valid.
    struct StubMarket {
        base: String,
        tokens_issued: Arc<AtomicUsize>,
        search_tokens: Arc<Mutex<Vec<String>>>,
    }

    fn spawn_stub(rejects: fn(&str) -> bool) -> StubMarket {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let tokens_issued = Arc::new(AtomicUsize::new(0));
        let search_tokens = Arc::new(Mutex::new(Vec::new()));
        let issued = Arc::clone(&tokens_issued);
        let seen = Arc::clone(&search_tokens);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve_one(stream, &issued, &seen, rejects);
            }
        });
        StubMarket {
            base,
            tokens_issued,
            search_tokens,
        }
    }

    fn serve_one(
        mut stream: TcpStream,
        issued: &AtomicUsize,
        seen: &Mutex<Vec<String>>,
        rejects: fn(&str) -> bool,
    ) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut bearer = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim();
                if name.eq_ignore_ascii_case("authorization") {
                    bearer = value.trim_start_matches("Bearer ").to_string();
                } else if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap();
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();

        let (status, payload) = if request_line.contains("/identity/v1/oauth2/token") {
            let n = issued.fetch_add(1, Ordering::SeqCst) + 1;
            ("200 OK", format!(r#"{{"access_token": "t{n}"}}"#))
        } else {
            seen.lock().unwrap().push(bearer.clone());
            if rejects(&bearer) {
                ("401 Unauthorized", "{}".to_string())
            } else {
                ("200 OK", ONE_ITEM.to_string())
            }
        };
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        )
        .unwrap();
    }

    fn stub_client(stub: &StubMarket) -> EbayClient {
        EbayClient::new(
            "id",
            "secret",
            EbayEnvironment::Sandbox,
            MarketplaceSettings::default(),
        )
        .unwrap()
        .with_api_base(stub.base.clone())
    }

    #[test]
    fn expired_token_is_refreshed_within_one_part() {
        let stub = spawn_stub(|token| token == "t1");
        let client = stub_client(&stub);
        let vehicle = VehicleInfo::new("2012", "Ford", "F-150");

        let listings = client
            .search(&vehicle, &PartQuery::new("engine", "33615"))
            .unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(stub.tokens_issued.load(Ordering::SeqCst), 2);
        assert_eq!(*stub.search_tokens.lock().unwrap(), vec!["t1", "t2", "t2"]);
    }

    #[test]
    fn valid_token_is_shared_across_parts() {
        let stub = spawn_stub(|_| false);
        let client = stub_client(&stub);
        let vehicle = VehicleInfo::new("2012", "Ford", "F-150");

        for part in [PartQuery::new("engine", "33615"), PartQuery::new("alternator", "33555")] {
            assert_eq!(client.search(&vehicle, &part).unwrap().len(), 1);
        }
        assert_eq!(stub.tokens_issued.load(Ordering::SeqCst), 1);
        assert_eq!(stub.search_tokens.lock().unwrap().len(), 4);
    }

    #[test]
    fn persistent_rejection_retries_each_query_once() {
        let stub = spawn_stub(|_| true);
        let client = stub_client(&stub);
        let vehicle = VehicleInfo::new("2012", "Ford", "F-150");

        let err = client
            .search(&vehicle, &PartQuery::new("engine", "33615"))
            .unwrap_err();

        assert!(matches!(err, MarketplaceError::AllQueriesFailed { queries: 2, .. }));
        assert!(!err.is_fatal());
        assert_eq!(stub.tokens_issued.load(Ordering::SeqCst), 3);
        assert_eq!(stub.search_tokens.lock().unwrap().len(), 4);
    }
}
