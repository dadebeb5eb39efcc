//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use std::sync::Mutex;

use crpt_client::{
    ApiError, ClientConfig, CodecError, CrptApi, Document, Headers, HttpMethod, HttpRequest,
    HttpResponse, JsonClient, Transport, TransportError,
};
use serde_json::Value;

/// Transport that answers with a preset response.
struct Replay(Mutex<Option<HttpResponse>>);

impl Transport for Replay {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.0.lock().unwrap().take().ok_or_else(|| TransportError::Connection {
            url: request.url().to_string(),
            reason: "no response left to replay".to_string(),
        })
    }
}

fn simulated(sim: &Value) -> HttpResponse {
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        Headers::new(),
        sim["body"].as_str().unwrap(),
    )
}

fn expected_headers(raw: &Value) -> Vec<(String, String)> {
    raw.as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn actual_headers(req: &HttpRequest) -> Vec<(String, String)> {
    req.headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();
    let client = JsonClient::new(ClientConfig::new(base_url)).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method: HttpMethod = case["method"].as_str().unwrap().parse().unwrap();
        let payload = match &case["payload"] {
            Value::Null => None,
            other => Some(other),
        };
        let expected = &case["expected_request"];

        let req = client
            .build_request(method, case["path"].as_str().unwrap(), payload)
            .unwrap();
        assert_eq!(req.method(), method, "{name}: method");
        assert_eq!(req.url().as_str(), expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(actual_headers(&req), expected_headers(&expected["headers"]), "{name}: headers");

        match req.body() {
            None => assert!(expected["body"].is_null(), "{name}: body missing"),
            Some(bytes) => {
                let body: Value = serde_json::from_slice(bytes).unwrap();
                assert_eq!(body, expected["body"], "{name}: body");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let client = JsonClient::new(ClientConfig::default()).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_status = case["expected_status"].as_u64().unwrap() as u16;
        let response = simulated(&case["simulated_response"]);
        let result = client.parse_response::<Value>(&response, expected_status);
        let expected = &case["expected_result"];

        if let Some(ok) = expected.get("ok") {
            assert_eq!(&result.unwrap(), ok, "{name}: parsed result");
            continue;
        }

        let err = result.unwrap_err();
        match expected["error"].as_str().unwrap() {
            "decode" => assert!(matches!(err, ApiError::Codec(CodecError::Decode(_))), "{name}: {err:?}"),
            "not_found" => assert!(matches!(err, ApiError::NotFound), "{name}: {err:?}"),
            "http_error" => {
                let status = expected["status"].as_u64().unwrap() as u16;
                assert!(
                    matches!(&err, ApiError::HttpError { status: s, .. } if *s == status),
                    "{name}: {err:?}"
                );
            }
            other => panic!("{name}: unknown error kind {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Create document
// ---------------------------------------------------------------------------

#[test]
fn create_document_test_vectors() {
    let raw = include_str!("../../test-vectors/create_document.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: Document = serde_json::from_value(case["input"].clone()).unwrap();
        let signature = case["signature"].as_str().unwrap();
        let token = case["auth_token"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        let api = CrptApi::with_transport(
            ClientConfig::new(base_url),
            Replay(Mutex::new(Some(simulated(&case["simulated_response"])))),
        )
        .unwrap();

        // Verify build
        let req = api.build_create_document(&input, signature, token).unwrap();
        assert_eq!(
            req.method(),
            expected_req["method"].as_str().unwrap().parse::<HttpMethod>().unwrap(),
            "{name}: method"
        );
        assert_eq!(req.url().as_str(), expected_req["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(actual_headers(&req), expected_headers(&expected_req["headers"]), "{name}: headers");

        let sent: Document = serde_json::from_slice(req.body().unwrap()).unwrap();
        assert_eq!(sent, input, "{name}: body");

        // Verify the full round-trip through the transport
        let result = api.create_document(&input, signature, token).unwrap();
        assert_eq!(result, case["expected_result"], "{name}: parsed result");
    }
}

#[test]
fn full_document_vector_serializes_losslessly() {
    let raw = include_str!("../../test-vectors/create_document.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let case = &vectors["cases"][0];

    let input: Document = serde_json::from_value(case["input"].clone()).unwrap();
    let reencoded = serde_json::to_value(&input).unwrap();
    assert_eq!(reencoded, case["input"]);
}
