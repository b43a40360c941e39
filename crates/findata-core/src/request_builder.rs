//! Translation of a validated tool request into an outbound HTTP call.

use std::fmt::{Debug, Formatter};

use crate::config::ApiKey;
use crate::http_client::{HttpMethod, HttpRequest};
use crate::registry::tool_definition;
use crate::schema::ValidatedRequest;

/// Header carrying the upstream credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Fully resolved upstream request for one tool call.
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters in the tool's declared parameter order.
    pub query: Vec<(String, String)>,
    auth_header: (&'static str, ApiKey),
}

impl OutboundCall {
    /// Full URL with an encoded query string. Contains no credential.
    pub fn url_with_query(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.url, query)
    }

    pub fn to_http_request(&self, timeout_ms: u64) -> HttpRequest {
        HttpRequest::new(self.method, self.url_with_query())
            .with_header(self.auth_header.0, self.auth_header.1.expose())
            .with_timeout_ms(timeout_ms)
    }
}

impl Debug for OutboundCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundCall")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("auth_header", &self.auth_header.0)
            .finish()
    }
}

/// Build the upstream call for a validated request. Total over validated input.
pub fn build(request: &ValidatedRequest, base_url: &str, api_key: &ApiKey) -> OutboundCall {
    let definition = tool_definition(request.tool());
    let query = request
        .values()
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.to_query_value()))
        .collect();

    OutboundCall {
        method: HttpMethod::Get,
        url: format!("{}{}", base_url.trim_end_matches('/'), definition.path),
        query,
        auth_header: (API_KEY_HEADER, api_key.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::registry::ToolId;
    use crate::schema::validate;

    fn validated(tool: ToolId, args: Value) -> ValidatedRequest {
        let Value::Object(map) = args else {
            panic!("test arguments must be an object");
        };
        validate(tool_definition(tool), &map).expect("valid arguments")
    }

    fn key() -> ApiKey {
        ApiKey::new("key-abc").expect("valid key")
    }

    #[test]
    fn historical_prices_query_follows_declared_order() {
        let request = validated(
            ToolId::GetPrices,
            json!({
                "start_date": "2024-01-01",
                "end_date": "2024-03-31",
                "ticker": "nvda",
                "interval": "week",
            }),
        );
        let call = build(&request, "https://api.financialdatasets.ai", &key());

        assert_eq!(call.url, "https://api.financialdatasets.ai/prices/");
        assert_eq!(
            call.url_with_query(),
            concat!(
                "https://api.financialdatasets.ai/prices/?ticker=NVDA&interval=week",
                "&interval_multiplier=1&start_date=2024-01-01&end_date=2024-03-31",
            )
        );
    }

    #[test]
    fn credential_travels_only_in_header() {
        let request = validated(ToolId::GetCurrentPrice, json!({ "ticker": "AAPL" }));
        let call = build(&request, "https://api.financialdatasets.ai/", &key());
        let http = call.to_http_request(5_000);

        assert!(!http.url.contains("key-abc"));
        assert!(!format!("{call:?}").contains("key-abc"));
        assert_eq!(http.headers.get("x-api-key").map(String::as_str), Some("key-abc"));
        assert_eq!(http.timeout_ms, 5_000);
        assert_eq!(http.url, "https://api.financialdatasets.ai/prices/snapshot/?ticker=AAPL");
    }

    #[test]
    fn ticker_case_does_not_change_query() {
        let lower = build(
            &validated(ToolId::GetCurrentPrice, json!({ "ticker": "aapl" })),
            "https://api.financialdatasets.ai",
            &key(),
        );
        let upper = build(
            &validated(ToolId::GetCurrentPrice, json!({ "ticker": "AAPL" })),
            "https://api.financialdatasets.ai",
            &key(),
        );
        assert_eq!(lower.query, upper.query);
    }

    #[test]
    fn optional_parameters_without_default_are_omitted() {
        let request = validated(ToolId::GetNews, json!({ "ticker": "TSLA" }));
        let call = build(&request, "https://api.financialdatasets.ai", &key());
        assert_eq!(
            call.query,
            vec![
                (String::from("ticker"), String::from("TSLA")),
                (String::from("limit"), String::from("10")),
            ]
        );
    }

    #[test]
    fn statement_tools_default_period_and_limit() {
        let args: Map<String, Value> = Map::from_iter([(String::from("ticker"), json!("googl"))]);
        let request = validate(tool_definition(ToolId::GetCashFlowStatements), &args)
            .expect("valid arguments");
        let call = build(&request, "https://api.financialdatasets.ai", &key());

        assert_eq!(
            call.url_with_query(),
            concat!(
                "https://api.financialdatasets.ai/financials/cash-flow-statements/",
                "?ticker=GOOGL&period=annual&limit=4",
            )
        );
    }
}
