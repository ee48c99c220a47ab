use price_fingerprints::market::{KlineProtocol, providers::BinanceKlines};
use serde_json::Value;

// Samples from the Binance WebSocket API documentation for the `klines` method.

const KLINES_REQUEST: &str = r#"{"id":"1dbbeb56-8eea-466a-8f6e-86bdcfa2fc0b","method":"klines","params":{"symbol":"BNBBTC","interval":"1h","startTime":1655969280000,"limit":1}}"#;

const KLINES_RESPONSE: &str = r#"{"id":"1dbbeb56-8eea-466a-8f6e-86bdcfa2fc0b","status":200,"result":[[1655971200000,"0.01086000","0.01086600","0.01083600","0.01083800","2290.53800000",1655974799999,"24.85074442",2283,"1171.64000000","12.71225884","0"]],"rateLimits":[{"rateLimitType":"REQUEST_WEIGHT","interval":"MINUTE","intervalNum":1,"limit":6000,"count":2}]}"#;

#[test]
fn test_binance_klines_request_sample_from_docs() {
    let value: Value =
        serde_json::from_str(KLINES_REQUEST).expect("klines request sample should be valid JSON");

    assert_eq!(value["method"], "klines");
    assert_eq!(value["params"]["symbol"], "BNBBTC");
    assert_eq!(value["params"]["interval"], "1h");
    assert_eq!(value["params"]["limit"], 1);
}

#[test]
fn test_binance_klines_response_sample_from_docs() {
    let value: Value =
        serde_json::from_str(KLINES_RESPONSE).expect("klines response sample should be valid JSON");

    assert_eq!(value["status"], 200);
    assert!(value["result"].is_array());
    assert_eq!(value["result"][0][0], 1655971200000i64);
    assert_eq!(value["result"][0][4], "0.01083800");
}

#[test]
fn test_string_ids_are_not_our_responses() {
    // Requests from this crate always carry numeric ids
    let parsed = BinanceKlines::new().parse_response(KLINES_RESPONSE).unwrap();
    assert!(parsed.is_none());
}

#[test]
fn test_numeric_id_response_parses_into_candles() {
    let msg = KLINES_RESPONSE.replace(r#""1dbbeb56-8eea-466a-8f6e-86bdcfa2fc0b""#, "42");
    let page = BinanceKlines::new()
        .parse_response(&msg)
        .unwrap()
        .expect("numeric id response should parse");

    assert_eq!(page.id, 42);
    assert_eq!(page.candles.len(), 1);
    assert_eq!(page.candles[0].get_timestamp().timestamp_millis(), 1655971200000);
    assert_eq!(page.candles[0].get_close(), 0.010838);
    assert!(page.candles[0].validate().is_ok());
}
