//! Classification of upstream outcomes and reshaping of successful payloads.

use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::http_client::{HttpErrorKind, HttpResponse};
use crate::registry::{ResponseShape, ToolDefinition};
use crate::transport::TransportFailure;
use crate::{
    CalendarDate, ErrorKind, PriceBar, PriceSeries, PriceSnapshot, Ticker, ToolError, ToolResult,
};

/// Turn a transport outcome into the tool's result.
///
/// `ticker` is the validated ticker of the request; it names the subject in
/// not-found messages and fills in series whose payload omits it.
pub fn normalize(
    tool: &ToolDefinition,
    ticker: &Ticker,
    outcome: Result<HttpResponse, TransportFailure>,
) -> ToolResult {
    let result = match outcome {
        Ok(response) if response.is_success() => reshape(tool, ticker, &response.body),
        Ok(response) => Err(classify_status(&response)),
        Err(TransportFailure::Status { response, attempts }) => {
            let error = classify_status(&response);
            Err(ToolError::new(
                error.kind(),
                format!("{} after {attempts} attempt(s)", error.message()),
            )
            .with_retry_after(error.retry_after()))
        }
        Err(TransportFailure::Network { error, attempts }) => {
            let what = match error.kind() {
                HttpErrorKind::Timeout => "upstream timed out",
                HttpErrorKind::Connect => "could not connect to upstream",
                HttpErrorKind::Other => "upstream request failed",
            };
            Err(ToolError::new(
                ErrorKind::UpstreamUnavailable,
                format!("{what} after {attempts} attempt(s): {}", error.message()),
            ))
        }
    };

    ToolResult::from(result.map_err(|error| {
        let error = error.scoped(tool.name());
        warn!(
            tool = tool.name(),
            kind = %error.kind(),
            "tool call failed: {}",
            error.message()
        );
        error
    }))
}

fn classify_status(response: &HttpResponse) -> ToolError {
    let status = response.status;
    let message = match upstream_detail(&response.body) {
        Some(detail) => format!("upstream responded with HTTP {status}: {detail}"),
        None => format!("upstream responded with HTTP {status}"),
    };

    match status {
        401 | 403 => ToolError::new(ErrorKind::AuthenticationError, message),
        404 => ToolError::new(ErrorKind::NotFound, message),
        429 => ToolError::rate_limited(message, response.retry_after_secs()),
        400..=499 => ToolError::new(ErrorKind::InvalidArgument, message),
        _ => ToolError::new(ErrorKind::UpstreamUnavailable, message),
    }
}

/// Pulls `error`/`message` strings out of an upstream error body.
fn upstream_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    let parts: Vec<&str> = ["error", "message", "detail"]
        .iter()
        .filter_map(|field| object.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(": "))
    }
}

fn reshape(tool: &ToolDefinition, ticker: &Ticker, body: &str) -> Result<Value, ToolError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| malformed(format!("response body is not JSON: {err}")))?;
    let Value::Object(mut root) = value else {
        return Err(malformed("response body is not a JSON object"));
    };

    let key = tool.response_key;
    let section = match root.remove(key) {
        None | Some(Value::Null) => return Err(not_found(tool, ticker)),
        Some(section) => section,
    };

    match tool.shape {
        ResponseShape::Collection => {
            collection(tool, ticker, section).map(|items| keyed(key, items))
        }
        ResponseShape::Snapshot => {
            let snapshot = snapshot(tool, ticker, section)?;
            serde_json::to_value(snapshot)
                .map(|snapshot| keyed(key, snapshot))
                .map_err(|err| malformed(format!("could not encode snapshot: {err}")))
        }
        ResponseShape::PriceSeries => {
            let series_ticker = match root.get("ticker").and_then(Value::as_str) {
                Some(raw) => Ticker::parse(raw)
                    .map_err(|err| malformed(format!("invalid ticker in payload: {err}")))?,
                None => ticker.clone(),
            };
            let series = price_series(tool, ticker, series_ticker, section)?;
            serde_json::to_value(series)
                .map_err(|err| malformed(format!("could not encode price series: {err}")))
        }
    }
}

fn keyed(key: &str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(key.to_owned(), value);
    Value::Object(object)
}

fn collection(tool: &ToolDefinition, ticker: &Ticker, section: Value) -> Result<Value, ToolError> {
    let Value::Array(items) = section else {
        return Err(malformed(format!("'{}' is not an array", tool.response_key)));
    };
    if items.is_empty() {
        return Err(not_found(tool, ticker));
    }
    if let Some(index) = items.iter().position(|item| !item.is_object()) {
        return Err(malformed(format!(
            "'{}' entry {index} is not an object",
            tool.response_key
        )));
    }
    Ok(Value::Array(items))
}

fn snapshot(
    tool: &ToolDefinition,
    ticker: &Ticker,
    section: Value,
) -> Result<PriceSnapshot, ToolError> {
    let Value::Object(record) = section else {
        return Err(malformed("'snapshot' is not an object"));
    };
    if record.is_empty() {
        return Err(not_found(tool, ticker));
    }

    let price = required_number(&record, "price").map_err(malformed)?;
    let time = timestamp(&record)
        .map_err(malformed)?
        .ok_or_else(|| malformed("snapshot has no timestamp"))?;
    let snapshot_ticker = match record.get("ticker").and_then(Value::as_str) {
        Some(raw) => Ticker::parse(raw)
            .map_err(|err| malformed(format!("invalid ticker in payload: {err}")))?,
        None => ticker.clone(),
    };

    PriceSnapshot::new(
        snapshot_ticker,
        price,
        optional_number(&record, "day_change").map_err(malformed)?,
        optional_number(&record, "day_change_percent").map_err(malformed)?,
        time,
    )
    .map_err(|err| malformed(format!("invalid snapshot: {err}")))
}

fn price_series(
    tool: &ToolDefinition,
    ticker: &Ticker,
    series_ticker: Ticker,
    section: Value,
) -> Result<PriceSeries, ToolError> {
    let Value::Array(records) = section else {
        return Err(malformed("'prices' is not an array"));
    };
    if records.is_empty() {
        return Err(not_found(tool, ticker));
    }

    let bars = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            price_bar(record).map_err(|detail| malformed(format!("price record {index}: {detail}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceSeries::sorted(series_ticker, bars))
}

fn price_bar(record: &Value) -> Result<PriceBar, String> {
    let Value::Object(record) = record else {
        return Err(String::from("not an object"));
    };

    let time = match timestamp(record)? {
        Some(time) => time,
        None => record
            .get("date")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| String::from("record has no time or date"))?,
    };
    let date = CalendarDate::parse_prefix(&time).map_err(|err| format!("unreadable date: {err}"))?;

    PriceBar::new(
        date,
        time,
        required_number(record, "open")?,
        required_number(record, "high")?,
        required_number(record, "low")?,
        required_number(record, "close")?,
        volume(record)?,
    )
    .map_err(|err| err.to_string())
}

/// `time` string, or `time_milliseconds` rendered as RFC 3339.
fn timestamp(record: &Map<String, Value>) -> Result<Option<String>, String> {
    if let Some(time) = record.get("time").and_then(Value::as_str) {
        return Ok(Some(time.to_owned()));
    }
    let Some(millis) = record.get("time_milliseconds").and_then(Value::as_i64) else {
        return Ok(None);
    };

    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .map(Some)
        .ok_or_else(|| format!("time_milliseconds {millis} is out of range"))
}

fn required_number(record: &Map<String, Value>, field: &str) -> Result<f64, String> {
    optional_number(record, field)?.ok_or_else(|| format!("missing numeric field '{field}'"))
}

fn optional_number(record: &Map<String, Value>, field: &str) -> Result<Option<f64>, String> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(_) => Err(format!("field '{field}' is not a number")),
    }
}

fn volume(record: &Map<String, Value>) -> Result<u64, String> {
    let Some(Value::Number(number)) = record.get("volume") else {
        return Err(String::from("missing numeric field 'volume'"));
    };
    if let Some(volume) = number.as_u64() {
        return Ok(volume);
    }
    match number.as_f64() {
        Some(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            Ok(value as u64)
        }
        _ => Err(format!("volume {number} is not a non-negative integer")),
    }
}

fn subject(tool: &ToolDefinition) -> String {
    match tool.shape {
        ResponseShape::Snapshot => String::from("current price"),
        ResponseShape::Collection | ResponseShape::PriceSeries => {
            tool.response_key.replace('_', " ")
        }
    }
}

fn not_found(tool: &ToolDefinition, ticker: &Ticker) -> ToolError {
    ToolError::new(
        ErrorKind::NotFound,
        format!("no {} found for {ticker}", subject(tool)),
    )
}

fn malformed(detail: impl Into<String>) -> ToolError {
    ToolError::new(
        ErrorKind::MalformedResponse,
        format!("malformed upstream response: {}", detail.into()),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http_client::HttpError;
    use crate::registry::{tool_definition, ToolId};

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").expect("valid ticker")
    }

    fn run(tool: ToolId, outcome: Result<HttpResponse, TransportFailure>) -> ToolResult {
        normalize(tool_definition(tool), &aapl(), outcome)
    }

    fn ok(body: Value) -> Result<HttpResponse, TransportFailure> {
        Ok(HttpResponse::ok_json(body.to_string()))
    }

    #[test]
    fn statements_are_returned_under_their_key() {
        let result = run(
            ToolId::GetIncomeStatements,
            ok(json!({ "income_statements": [{ "ticker": "AAPL", "revenue": 383285000000_u64 }] })),
        );
        let payload = result.payload().expect("success");
        assert_eq!(payload["income_statements"][0]["revenue"], 383285000000_u64);
    }

    #[test]
    fn empty_collection_is_not_found() {
        let result = run(ToolId::GetNews, ok(json!({ "news": [] })));
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), "get_news: no news found for AAPL");

        let missing = run(ToolId::GetBalanceSheets, ok(json!({})));
        assert_eq!(missing.error_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn collection_of_scalars_is_malformed() {
        let result = run(ToolId::GetBalanceSheets, ok(json!({ "balance_sheets": [1, 2] })));
        assert_eq!(result.error_kind(), Some(ErrorKind::MalformedResponse));

        let not_array = run(ToolId::GetBalanceSheets, ok(json!({ "balance_sheets": "x" })));
        assert_eq!(not_array.error_kind(), Some(ErrorKind::MalformedResponse));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let result = run(
            ToolId::GetIncomeStatements,
            Ok(HttpResponse::ok_json("<html>gateway</html>")),
        );
        assert_eq!(result.error_kind(), Some(ErrorKind::MalformedResponse));
    }

    #[test]
    fn snapshot_requires_price_and_timestamp() {
        let result = run(
            ToolId::GetCurrentPrice,
            ok(json!({ "snapshot": {
                "ticker": "AAPL",
                "price": 189.5,
                "day_change": -1.25,
                "day_change_percent": -0.65,
                "time": "2024-05-01T20:00:00Z",
            } })),
        );
        let payload = result.payload().expect("success");
        assert_eq!(payload["snapshot"]["price"], 189.5);
        assert_eq!(payload["snapshot"]["time"], "2024-05-01T20:00:00Z");

        let no_price = run(
            ToolId::GetCurrentPrice,
            ok(json!({ "snapshot": { "time": "2024-05-01T20:00:00Z" } })),
        );
        assert_eq!(no_price.error_kind(), Some(ErrorKind::MalformedResponse));

        let empty = run(ToolId::GetCurrentPrice, ok(json!({ "snapshot": {} })));
        assert_eq!(empty.error_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn snapshot_accepts_millisecond_timestamp() {
        let result = run(
            ToolId::GetCurrentPrice,
            ok(json!({ "snapshot": { "price": 10, "time_milliseconds": 0 } })),
        );
        let payload = result.payload().expect("success");
        assert_eq!(payload["snapshot"]["time"], "1970-01-01T00:00:00Z");
        assert_eq!(payload["snapshot"]["ticker"], "AAPL");
    }

    fn bar(time: &str, volume: Value) -> Value {
        json!({ "open": 1, "high": 2, "low": 0.5, "close": 1.5, "volume": volume, "time": time })
    }

    #[test]
    fn price_records_are_sorted_by_date() {
        let result = run(
            ToolId::GetPrices,
            ok(json!({
                "ticker": "AAPL",
                "prices": [
                    bar("2024-01-04T05:00:00Z", json!(300)),
                    bar("2024-01-02T05:00:00Z", json!(100)),
                    bar("2024-01-03T05:00:00Z", json!(2.0e2)),
                ],
            })),
        );
        let payload = result.payload().expect("success");
        let dates: Vec<&str> = payload["prices"]
            .as_array()
            .expect("array")
            .iter()
            .map(|bar| bar["date"].as_str().expect("date"))
            .collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(payload["prices"][1]["volume"], 200);
    }

    #[test]
    fn price_record_with_text_volume_is_malformed() {
        let result = run(
            ToolId::GetPrices,
            ok(json!({ "prices": [bar("2024-01-02T05:00:00Z", json!("lots"))] })),
        );
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
        assert!(error.message().contains("price record 0"));
    }

    #[test]
    fn status_codes_map_to_kinds() {
        let cases = [
            (401, ErrorKind::AuthenticationError),
            (403, ErrorKind::AuthenticationError),
            (404, ErrorKind::NotFound),
            (400, ErrorKind::InvalidArgument),
            (422, ErrorKind::InvalidArgument),
            (501, ErrorKind::UpstreamUnavailable),
        ];
        for (status, kind) in cases {
            let result = run(ToolId::GetNews, Ok(HttpResponse::new(status, "")));
            assert_eq!(result.error_kind(), Some(kind), "status {status}");
        }
    }

    #[test]
    fn upstream_error_body_is_folded_into_message() {
        let body = json!({ "error": "Unauthorized", "message": "Invalid API key" }).to_string();
        let result = run(ToolId::GetNews, Ok(HttpResponse::new(401, body)));
        let error = result.error().expect("failure");
        assert_eq!(
            error.message(),
            "get_news: upstream responded with HTTP 401: Unauthorized: Invalid API key"
        );
    }

    #[test]
    fn exhausted_rate_limit_keeps_retry_hint() {
        let response = HttpResponse::new(429, "").with_header("Retry-After", "17");
        let result = run(
            ToolId::GetPrices,
            Err(TransportFailure::Status { response, attempts: 3 }),
        );
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::RateLimited);
        assert_eq!(error.retry_after(), Some(17));
        assert!(error.message().ends_with("after 3 attempt(s)"));
    }

    #[test]
    fn network_failures_are_upstream_unavailable() {
        let result = run(
            ToolId::GetCurrentPrice,
            Err(TransportFailure::Network {
                error: HttpError::timeout("deadline elapsed"),
                attempts: 3,
            }),
        );
        let error = result.error().expect("failure");
        assert_eq!(error.kind(), ErrorKind::UpstreamUnavailable);
        assert!(error.message().contains("timed out"));
    }
}
