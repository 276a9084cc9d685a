//! Verify request composition and response decoding against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs, the expected request, a simulated
//! response and either the expected decoded result or the expected error kind.
//! Bodies and results are compared as parsed JSON so key order never matters;
//! query pairs are compared in order because the API key must lead.

use route4me_core::test_support::StubTransport;
use route4me_core::{
    fix_geocodes, ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, NetworkClient, OptimizationData,
    Optimizations, ParameterSet, StateFilter,
};
use serde_json::{json, Map, Value};

const API_KEY: &str = "vector-key";

type Endpoint = Optimizations<StubTransport>;

fn endpoint() -> Endpoint {
    Optimizations::new(NetworkClient::new(ClientConfig::new(API_KEY), StubTransport::new()))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn error_kind(err: &ApiError) -> &'static str {
    match err {
        ApiError::NotFound => "NotFound",
        ApiError::UnexpectedResponse { .. } => "UnexpectedResponse",
        ApiError::Http { .. } => "Http",
        ApiError::Deserialization(_) => "Deserialization",
        ApiError::Serialization(_) => "Serialization",
        ApiError::Transport(_) => "Transport",
        ApiError::InvalidUrl(_) => "InvalidUrl",
        ApiError::InvalidParameter(_) => "InvalidParameter",
    }
}

fn string_pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let pair = pair.as_array().unwrap();
            (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");

    let (base, _) = req.url.split_once('?').unwrap_or((req.url.as_str(), ""));
    assert_eq!(base, expected["url"].as_str().unwrap(), "{name}: url");
    assert_eq!(req.query_pairs(), string_pairs(&expected["query"]), "{name}: query");
    assert_eq!(req.headers, string_pairs(&expected["headers"]), "{name}: headers");

    match &expected["body"] {
        Value::Null => assert_eq!(req.body, None, "{name}: body"),
        body => {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
    }
}

/// Run every case of a vector file through `call`, which performs one
/// operation and renders its result as JSON.
fn run_vectors(raw: &str, call: impl Fn(&Endpoint, &Value) -> Result<Value, ApiError>) {
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let endpoint = endpoint();
        let transport = endpoint.client().transport();

        let sim = &case["simulated_response"];
        if !sim.is_null() {
            transport.push_response(HttpResponse::new(
                sim["status"].as_u64().unwrap() as u16,
                sim["body"].as_str().unwrap(),
            ));
        }

        let result = call(&endpoint, &case["input"]);

        // Verify build
        let requests = transport.requests();
        match &case["expected_request"] {
            Value::Null => assert!(requests.is_empty(), "{name}: no request expected"),
            expected => {
                assert_eq!(requests.len(), 1, "{name}: request count");
                assert_request(name, &requests[0], expected);
            }
        }

        // Verify parse
        match case.get("expected_error").and_then(Value::as_str) {
            Some(kind) => {
                let err = result.expect_err(name);
                assert_eq!(error_kind(&err), kind, "{name}: error kind ({err})");
            }
            None => {
                let value = result.unwrap_or_else(|err| panic!("{name}: {err}"));
                assert_eq!(value, case["expected_result"], "{name}: parsed result");
            }
        }
    }
}

/// Accumulate a case's `query` and `data` the way a caller would. The set is
/// seeded with its own key, which must never reach the wire.
fn parameter_set(input: &Value) -> Option<ParameterSet> {
    if input["data"].is_null() {
        return None;
    }
    let data: OptimizationData = serde_json::from_value(input["data"].clone()).unwrap();
    let query: Map<String, Value> = input
        .get("query")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut params = ParameterSet::new("parameter-set-key");
    params.add(&query, &data.parameters).unwrap();
    for address in data.addresses {
        params.add_address(address).unwrap();
    }
    Some(params)
}

fn to_json(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap()
}

// ---------------------------------------------------------------------------
// Optimizations
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    run_vectors(include_str!("../../test-vectors/create.json"), |endpoint, input| {
        let params = parameter_set(input).unwrap();
        let callback = input["optimized_callback_url"].as_str();
        endpoint.create(&params, callback).map(to_json)
    });
}

#[test]
fn get_test_vectors() {
    run_vectors(include_str!("../../test-vectors/get.json"), |endpoint, input| {
        endpoint.get(input["id"].as_str().unwrap()).map(to_json)
    });
}

#[test]
fn list_test_vectors() {
    run_vectors(include_str!("../../test-vectors/list.json"), |endpoint, input| {
        let states: Vec<StateFilter> = input["states"]
            .as_array()
            .unwrap()
            .iter()
            .map(|state| StateFilter::from(state.as_str().unwrap()))
            .collect();
        let limit = input["limit"].as_u64().map(|n| n as u32);
        let offset = input["offset"].as_u64().map(|n| n as u32);

        let page = endpoint.list(&states, limit, offset)?;
        let ids: Vec<&str> = page.items.iter().map(|o| o.optimization_problem_id.as_str()).collect();
        Ok(json!({"total": page.total, "ids": ids}))
    });
}

#[test]
fn update_test_vectors() {
    run_vectors(include_str!("../../test-vectors/update.json"), |endpoint, input| {
        let params = parameter_set(input);
        let reoptimize = input["reoptimize"].as_bool().unwrap();
        endpoint
            .update(input["id"].as_str().unwrap(), params.as_ref(), reoptimize)
            .map(to_json)
    });
}

#[test]
fn remove_test_vectors() {
    run_vectors(include_str!("../../test-vectors/remove.json"), |endpoint, input| {
        endpoint.remove(input["id"].as_str().unwrap()).map(Value::from)
    });
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

#[test]
fn geocode_test_vectors() {
    run_vectors(include_str!("../../test-vectors/geocode.json"), |endpoint, input| {
        let addresses: Vec<Map<String, Value>> = serde_json::from_value(input["addresses"].clone()).unwrap();
        let outcome = fix_geocodes(endpoint.client(), &addresses)?;
        let errors: Vec<&str> = outcome.errors.iter().map(|d| d.destination.as_str()).collect();
        Ok(json!({"addresses": to_json(&outcome.addresses), "errors": errors}))
    });
}
