//! Binance WebSocket API kline implementation.
//! Historical candles come from the `klines` request method, one page per request.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::SourceError;
use crate::fingerprint::candle::Candle;
use crate::market::kline_protocol::{KlinePage, KlineProtocol};
use crate::market::request::KlineRequest;
use crate::market::websocket_client::KlineClient;

pub const BINANCE_API_BASE_ENDPOINT: &str = "wss://ws-api.binance.com:443/ws-api/v3";
pub const BINANCE_API_FALLBACK_ENDPOINT: &str = "wss://ws-api.binance.com:9443/ws-api/v3";

/// Binance caps `klines` at 1000 rows per request.
pub const BINANCE_KLINES_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Binance-specific kline protocol.
#[derive(Debug, Clone, Default)]
pub struct BinanceKlines;

impl BinanceKlines {
    pub fn new() -> Self {
        Self
    }
}

impl KlineProtocol for BinanceKlines {
    fn endpoint(&self) -> &str {
        BINANCE_API_BASE_ENDPOINT
    }

    fn fallback_endpoint(&self) -> Option<&str> {
        Some(BINANCE_API_FALLBACK_ENDPOINT)
    }

    fn name(&self) -> &'static str {
        "Binance"
    }

    fn page_limit(&self) -> usize {
        BINANCE_KLINES_LIMIT
    }

    fn format_request(&self, id: u64, request: &KlineRequest, from: DateTime<Utc>) -> String {
        json!({
            "id": id,
            "method": "klines",
            "params": {
                "symbol": request.symbol.to_uppercase(),
                "interval": request.interval,
                "startTime": from.timestamp_millis(),
                "endTime": request.end.timestamp_millis(),
                "limit": BINANCE_KLINES_LIMIT,
            }
        })
        .to_string()
    }

    fn parse_response(&self, msg: &str) -> Result<Option<KlinePage>, SourceError> {
        let response: ApiResponse = serde_json::from_str(msg)
            .map_err(|e| SourceError::Protocol(format!("invalid JSON from Binance: {e}")))?;

        if let Some(ApiError { code, msg }) = response.error {
            return Err(SourceError::Api { code, msg });
        }

        // Anything without our numeric id is not a reply to a request
        let Some(id) = response.id.as_ref().and_then(Value::as_u64) else {
            return Ok(None);
        };
        let Some(Value::Array(rows)) = response.result else {
            return Ok(None);
        };

        let candles = rows
            .iter()
            .map(parse_kline_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(KlinePage { id, candles }))
    }
}

/// Parses one kline row:
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
fn parse_kline_row(row: &Value) -> Result<Candle, SourceError> {
    let fields = row
        .as_array()
        .filter(|fields| fields.len() >= 6)
        .ok_or_else(|| SourceError::Protocol(format!("kline row has unexpected shape: {row}")))?;

    let open_time = fields[0]
        .as_i64()
        .ok_or_else(|| {
            SourceError::Protocol(format!("kline open time is not an integer: {}", fields[0]))
        })?;

    let price = |index: usize| -> Result<f64, SourceError> {
        let value = &fields[index];
        value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| value.as_f64())
            .ok_or_else(|| {
                SourceError::Protocol(format!("kline field {index} is not numeric: {value}"))
            })
    };

    Candle::from_millis(open_time, price(1)?, price(2)?, price(3)?, price(4)?, price(5)?)
        .ok_or_else(|| SourceError::Protocol(format!("kline open time out of range: {open_time}")))
}

pub type BinanceClient = KlineClient<BinanceKlines>;

pub fn new_binance_client() -> BinanceClient {
    KlineClient::new(BinanceKlines::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> KlineRequest {
        KlineRequest::new(
            "btcusdt",
            "1m",
            DateTime::from_timestamp_millis(1655969280000).unwrap(),
            DateTime::from_timestamp_millis(1655969400000).unwrap(),
        )
    }

    #[test]
    fn test_format_request() {
        let protocol = BinanceKlines::new();
        let from = DateTime::from_timestamp_millis(1655969340000).unwrap();
        let msg = protocol.format_request(7, &request(), from);
        let value: Value = serde_json::from_str(&msg).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "klines");
        assert_eq!(value["params"]["symbol"], "BTCUSDT");
        assert_eq!(value["params"]["interval"], "1m");
        assert_eq!(value["params"]["startTime"], 1655969340000i64);
        assert_eq!(value["params"]["endTime"], 1655969400000i64);
        assert_eq!(value["params"]["limit"], 1000);
    }

    #[test]
    fn test_parse_klines_response() {
        let protocol = BinanceKlines::new();
        let msg = r#"{"id":3,"status":200,"result":[[1655969280000,"0.01086000","0.01086600","0.01083600","0.01083800","2290.53800000",1655969339999,"24.85074442",2283,"1171.64000000","12.71225884","0"],[1655969340000,"0.01083800","0.01090000","0.01083000","0.01089000","1000.00000000",1655969399999,"10.8",100,"500.0","5.4","0"]],"rateLimits":[{"rateLimitType":"REQUEST_WEIGHT","interval":"MINUTE","intervalNum":1,"limit":6000,"count":2}]}"#;

        let page = protocol.parse_response(msg).unwrap().unwrap();
        assert_eq!(page.id, 3);
        assert_eq!(page.candles.len(), 2);
        let first = &page.candles[0];
        assert_eq!(first.get_timestamp().timestamp_millis(), 1655969280000);
        assert_eq!(first.get_open(), 0.01086);
        assert_eq!(first.get_high(), 0.010866);
        assert_eq!(first.get_low(), 0.010836);
        assert_eq!(first.get_close(), 0.010838);
        assert_eq!(first.get_volume(), 2290.538);
    }

    #[test]
    fn test_parse_error_response() {
        let protocol = BinanceKlines::new();
        let msg = r#"{"id":4,"status":400,"error":{"code":-1121,"msg":"Invalid symbol."}}"#;

        match protocol.parse_response(msg) {
            Err(SourceError::Api { code, msg }) => {
                assert_eq!(code, -1121);
                assert_eq!(msg, "Invalid symbol.");
            }
            other => panic!("Expected SourceError::Api, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_non_response_frame() {
        let protocol = BinanceKlines::new();
        let msg = r#"{"e":"kline","E":1638747660000,"s":"BTCUSDT"}"#;
        assert!(protocol.parse_response(msg).unwrap().is_none());
    }

    #[test]
    fn test_parse_malformed_row() {
        let protocol = BinanceKlines::new();
        let msg = r#"{"id":5,"status":200,"result":[[1655969280000,"abc"]]}"#;
        assert!(matches!(protocol.parse_response(msg), Err(SourceError::Protocol(_))));
    }

    #[test]
    fn test_parse_invalid_json() {
        let protocol = BinanceKlines::new();
        assert!(matches!(protocol.parse_response("not json"), Err(SourceError::Protocol(_))));
    }
}
