//! Provider routing for outbound API requests.
//!
//! Widgets store the URL the user typed. Before fetching, the URL is matched
//! against a small table of known finance providers and the configured API key
//! is injected, either as a query parameter or as a request header. Nothing here
//! performs network I/O.

use url::Url;

use crate::config::{ApiKeyName, ApiKeys};
use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiAuth {
    QueryParam(&'static str),
    Header(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: &'static str,
    pub host_pattern: &'static str,
    pub auth: ApiAuth,
    pub key: ApiKeyName,
}

pub const PROVIDERS: [ProviderConfig; 4] = [
    ProviderConfig {
        name: "twelve-data",
        host_pattern: "api.twelvedata.com",
        auth: ApiAuth::QueryParam("apikey"),
        key: ApiKeyName::TwelveData,
    },
    ProviderConfig {
        name: "alpha-vantage",
        host_pattern: "alphavantage.co",
        auth: ApiAuth::QueryParam("apikey"),
        key: ApiKeyName::AlphaVantage,
    },
    ProviderConfig {
        name: "finnhub",
        host_pattern: "finnhub.io",
        auth: ApiAuth::QueryParam("token"),
        key: ApiKeyName::Finnhub,
    },
    ProviderConfig {
        name: "indian-api",
        host_pattern: "stock.indianapi.in",
        auth: ApiAuth::Header("X-Api-Key"),
        key: ApiKeyName::IndianApi,
    },
];

// Keys shorter than this, or containing "demo", are placeholders and get replaced
const MIN_REAL_KEY_LEN: usize = 10;

/// A request ready to be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRequest {
    pub requested_url: String, // as typed by the user, before key injection
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub provider: Option<&'static str>,
    pub key_applied: bool, // a configured key went into the URL or a header
}

/// Find the provider whose host pattern appears in `url` (case-insensitive).
pub fn detect_provider(url: &str) -> Option<&'static ProviderConfig> {
    let lowered = url.to_ascii_lowercase();
    PROVIDERS.iter().find(|p| lowered.contains(p.host_pattern))
}

/// Rewrite `url` for its provider and collect the headers to send.
///
/// Query-parameter providers get the configured key when the URL has none, or
/// has a placeholder key; a real key already in the URL is kept. Header
/// providers keep the URL untouched. Every URL that is not header-authenticated
/// must be absolute and parseable.
pub fn route_request(url: &str, keys: &ApiKeys) -> EngineResult<RoutedRequest> {
    let provider = detect_provider(url);
    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];

    let mut key_applied = false;

    let routed_url = match provider {
        Some(ProviderConfig { auth: ApiAuth::Header(header), key, .. }) => {
            if let Some(api_key) = keys.get(*key) {
                headers.push((header.to_string(), api_key.to_string()));
                key_applied = true;
            }
            url.to_string()
        }
        Some(ProviderConfig { auth: ApiAuth::QueryParam(param), key, name, .. }) => {
            let routed = match keys.get(*key) {
                Some(api_key) => inject_query_key(url, param, api_key).unwrap_or_else(|| url.to_string()),
                None => {
                    tracing::debug!(provider = *name, "No API key configured, forwarding URL unchanged");
                    url.to_string()
                }
            };
            Url::parse(&routed)?;
            key_applied = routed != url;
            routed
        }
        None => {
            Url::parse(url)?;
            url.to_string()
        }
    };

    Ok(RoutedRequest {
        requested_url: url.to_string(),
        url: routed_url,
        headers,
        provider: provider.map(|p| p.name),
        key_applied,
    })
}

// None when the URL cannot be parsed; the caller then forwards it as typed.
fn inject_query_key(url: &str, param: &str, api_key: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;

    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    let existing = pairs.iter().find(|(k, _)| k == param).map(|(_, v)| v.as_str());
    let keep_existing = matches!(existing, Some(k) if !k.is_empty() && !is_placeholder_key(k));
    if keep_existing {
        return Some(url.to_string());
    }

    // Replace the first occurrence in place, drop any duplicates, append if absent
    let mut replaced = false;
    let mut rewritten: Vec<(String, String)> = Vec::with_capacity(pairs.len() + 1);
    for (k, v) in pairs {
        if k == param {
            if !replaced {
                rewritten.push((k, api_key.to_string()));
                replaced = true;
            }
        } else {
            rewritten.push((k, v));
        }
    }
    if !replaced {
        rewritten.push((param.to_string(), api_key.to_string()));
    }

    parsed.query_pairs_mut().clear().extend_pairs(rewritten);
    Some(parsed.to_string())
}

fn is_placeholder_key(key: &str) -> bool {
    key.contains("demo") || key.len() < MIN_REAL_KEY_LEN
}

/// User-facing explanation for a failed upstream status.
pub fn describe_http_status(status: u16) -> String {
    match status {
        401 => "Unauthorized (401). The API requires authentication.".to_string(),
        403 => "Access denied (403). The API may require authentication or API keys.".to_string(),
        404 => "The API endpoint was not found (404). Please verify the URL.".to_string(),
        500 => "The API server encountered an internal error (500).".to_string(),
        503 => "The API service is temporarily unavailable (503). Please try again later.".to_string(),
        other => format!("The API returned an error ({})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ApiKeys {
        let mut keys = ApiKeys::default();
        keys.set(ApiKeyName::AlphaVantage, "AV_REAL_KEY_0001");
        keys.set(ApiKeyName::Finnhub, "FH_REAL_KEY_0001");
        keys.set(ApiKeyName::IndianApi, "IN_REAL_KEY_0001");
        keys
    }

    #[test]
    fn test_detect_provider_is_case_insensitive() {
        assert_eq!(detect_provider("https://API.TwelveData.com/time_series").map(|p| p.name), Some("twelve-data"));
        assert_eq!(detect_provider("https://www.alphavantage.co/query").map(|p| p.name), Some("alpha-vantage"));
        assert_eq!(detect_provider("https://example.com/prices"), None);
    }

    #[test]
    fn test_missing_key_is_added() {
        let routed = route_request("https://finnhub.io/api/v1/stock/candle?symbol=AAPL&resolution=D", &keys()).unwrap();
        assert_eq!(routed.url, "https://finnhub.io/api/v1/stock/candle?symbol=AAPL&resolution=D&token=FH_REAL_KEY_0001");
        assert_eq!(routed.provider, Some("finnhub"));
        assert_eq!(routed.requested_url, "https://finnhub.io/api/v1/stock/candle?symbol=AAPL&resolution=D");
        assert!(routed.key_applied);
    }

    #[test]
    fn test_demo_key_is_replaced_in_place() {
        let routed = route_request(
            "https://www.alphavantage.co/query?function=TIME_SERIES_DAILY&apikey=demo&symbol=IBM",
            &keys(),
        )
        .unwrap();
        assert_eq!(
            routed.url,
            "https://www.alphavantage.co/query?function=TIME_SERIES_DAILY&apikey=AV_REAL_KEY_0001&symbol=IBM"
        );
    }

    #[test]
    fn test_real_key_in_url_is_kept() {
        let url = "https://www.alphavantage.co/query?function=TIME_SERIES_DAILY&symbol=IBM&apikey=USERSUPPLIEDKEY42";
        let routed = route_request(url, &keys()).unwrap();
        assert_eq!(routed.url, url);
        assert!(!routed.key_applied);
    }

    #[test]
    fn test_unconfigured_key_leaves_url_alone() {
        let url = "https://api.twelvedata.com/time_series?symbol=AAPL&interval=1day";
        let routed = route_request(url, &keys()).unwrap();
        assert_eq!(routed.url, url);
        assert!(!routed.key_applied);
    }

    #[test]
    fn test_header_provider_gets_header() {
        let routed = route_request("https://stock.indianapi.in/stock?name=RELIANCE", &keys()).unwrap();
        assert_eq!(routed.url, "https://stock.indianapi.in/stock?name=RELIANCE");
        assert!(routed.headers.contains(&("X-Api-Key".to_string(), "IN_REAL_KEY_0001".to_string())));
        assert!(routed.headers.contains(&("Accept".to_string(), "application/json".to_string())));
        assert!(routed.key_applied);

        let routed = route_request("https://stock.indianapi.in/stock?name=TCS", &ApiKeys::default()).unwrap();
        assert!(!routed.key_applied);
        assert_eq!(routed.headers.len(), 1);
    }

    #[test]
    fn test_unparseable_url_is_rejected() {
        let err = route_request("not a url", &keys()).unwrap_err();
        assert_eq!(err.kind(), "invalid_url");

        // Header-authenticated providers are forwarded as typed
        assert!(route_request("stock.indianapi.in/stock?name=TCS", &keys()).is_ok());
    }

    #[test]
    fn test_describe_http_status() {
        assert!(describe_http_status(404).contains("not found"));
        assert_eq!(describe_http_status(418), "The API returned an error (418)");
    }
}
