//! Optimizations endpoint.
//!
//! An optimization problem is a set of addresses plus the constraints that
//! apply to them. Solving it yields one or more routes, each a sequence of
//! addresses visited by a single vehicle and driver. The remote service owns
//! the solver; this façade only shapes the CRUD requests and decodes the
//! answers. Nothing is cached: every call goes to the server.

use serde_json::{Map, Value};

use crate::client::{NetworkClient, Transport};
use crate::enums::{OptimizationState, StateFilter};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::models::{is_truthy, Optimization, OptimizationData, PagedList};
use crate::params::ParameterSet;

pub const OPTIMIZATION_PATH: &str = "/api.v4/optimization_problem.php";
pub const OPTIMIZATION_SUBDOMAIN: &str = "www";

#[derive(Debug, Clone)]
pub struct Optimizations<T> {
    client: NetworkClient<T>,
}

impl<T: Transport> Optimizations<T> {
    pub fn new(client: NetworkClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &NetworkClient<T> {
        &self.client
    }

    /// Submit a new optimization problem.
    ///
    /// The query half of `params` rides in the query string and its
    /// `OptimizationData` is the body. The `api_key` always comes from the
    /// client configuration. When `optimized_callback_url` is set the server
    /// POSTs `{timestamp, state, optimization_problem_id}` to it once the
    /// problem is solved or has failed.
    pub fn create(&self, params: &ParameterSet, optimized_callback_url: Option<&str>) -> Result<Optimization, ApiError> {
        let mut query = request_query(params);
        if let Some(url) = optimized_callback_url {
            query.insert("optimized_callback_url".to_string(), Value::from(url));
        }
        let body = to_body(params.optimization_data())?;
        let res = self
            .client
            .post(OPTIMIZATION_PATH, OPTIMIZATION_SUBDOMAIN, Some(&query), Some(&body))?;
        decode(res)
    }

    /// Fetch one optimization. A missing problem is [`ApiError::NotFound`].
    pub fn get(&self, id: &str) -> Result<Optimization, ApiError> {
        let query = query_map([("optimization_problem_id", Value::from(id))]);
        let res = self.client.get(OPTIMIZATION_PATH, OPTIMIZATION_SUBDOMAIN, Some(&query))?;
        decode(res)
    }

    /// List the caller's optimizations, optionally filtered by state.
    ///
    /// `states` accepts typed states and text (codes, names or CSV) in any
    /// mix; an empty slice sends no filter.
    pub fn list(
        &self,
        states: &[StateFilter],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<PagedList<Optimization>, ApiError> {
        let mut qs = Map::new();
        add_limit_offset(limit, offset, &mut qs);
        let states = OptimizationState::parse_many(states)?;
        if !states.is_empty() {
            let codes: Vec<String> = states.iter().map(|state| state.code().to_string()).collect();
            qs.insert("state".to_string(), Value::from(codes.join(",")));
        }

        let res = self.client.get(OPTIMIZATION_PATH, OPTIMIZATION_SUBDOMAIN, Some(&qs))?;

        let total = res
            .get("totalRecords")
            .and_then(total_records)
            .ok_or_else(|| ApiError::Deserialization("list response has no `totalRecords`".to_string()))?;
        let items = match res.get("optimizations") {
            Some(Value::Array(items)) => items.iter().cloned().map(decode).collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ApiError::Deserialization(format!(
                    "`optimizations` is not a list: {other}"
                )))
            }
        };
        Ok(PagedList {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Change parameters or addresses of an existing problem, optionally
    /// re-running the solver. Re-running without changes is allowed.
    ///
    /// `id` and `reoptimize` take precedence over the same keys in the
    /// query half of `params`.
    pub fn update(&self, id: &str, params: Option<&ParameterSet>, reoptimize: bool) -> Result<Optimization, ApiError> {
        let mut query = params.map(request_query).unwrap_or_default();
        query.insert("optimization_problem_id".to_string(), Value::from(id));
        query.insert("reoptimize".to_string(), Value::from(flag(reoptimize)));
        let body = match params {
            Some(params) => to_body(params.optimization_data())?,
            None => Value::Object(Map::new()),
        };
        let res = self
            .client
            .put(OPTIMIZATION_PATH, OPTIMIZATION_SUBDOMAIN, Some(&query), Some(&body))?;
        decode(res)
    }

    /// Delete an optimization. Always `true` on success.
    pub fn remove(&self, id: &str) -> Result<bool, ApiError> {
        let query = query_map([("optimization_problem_id", Value::from(id))]);
        let res = self.client.delete(OPTIMIZATION_PATH, OPTIMIZATION_SUBDOMAIN, Some(&query))?;
        if !is_truthy(res.get("status")) {
            return Err(ApiError::UnexpectedResponse {
                method: HttpMethod::Delete,
                response: res,
            });
        }
        Ok(true)
    }

    /// [`update`](Self::update) with no data and `reoptimize` set.
    pub fn reoptimize(&self, id: &str) -> Result<Optimization, ApiError> {
        self.update(id, None, true)
    }
}

fn query_map<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

/// Query half of `params` without its `api_key`.
fn request_query(params: &ParameterSet) -> Map<String, Value> {
    let mut query = params.query_params().clone();
    query.remove("api_key");
    query
}

fn add_limit_offset(limit: Option<u32>, offset: Option<u32>, qs: &mut Map<String, Value>) {
    if let Some(limit) = limit {
        qs.insert("limit".to_string(), Value::from(limit));
    }
    if let Some(offset) = offset {
        qs.insert("offset".to_string(), Value::from(offset));
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn total_records(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn to_body(data: &OptimizationData) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode(value: Value) -> Result<Optimization, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::enums::{DeviceType, RoutePathOutput};
    use crate::fields::Target;
    use crate::http::HttpResponse;
    use crate::test_support::StubTransport;
    use serde_json::json;

    const ID: &str = "07372F2CF3814EC6DFFAFE92E22771AA";

    fn endpoint() -> Optimizations<StubTransport> {
        Optimizations::new(NetworkClient::new(ClientConfig::new("demo-key"), StubTransport::new()))
    }

    fn stub(endpoint: &Optimizations<StubTransport>) -> &StubTransport {
        endpoint.client().transport()
    }

    fn optimization_json(state: u8) -> Value {
        json!({
            "optimization_problem_id": ID,
            "state": state,
            "parameters": {"route_name": "Monday"},
            "addresses": [],
            "routes": []
        })
    }

    #[test]
    fn create_posts_body_and_callback() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, optimization_json(4));
        let mut params = ParameterSet::new("demo-key");
        params.set_route_name("Monday").unwrap();

        let created = endpoint.create(&params, Some("https://example.com/done")).unwrap();

        assert_eq!(created.optimization_problem_id, ID);
        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.url.starts_with("https://www.route4me.com/api.v4/optimization_problem.php?"));
        assert_eq!(
            req.query_param("optimized_callback_url").as_deref(),
            Some("https://example.com/done")
        );
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"parameters": {"route_name": "Monday"}, "addresses": []}));
    }

    #[test]
    fn create_without_callback_sends_only_the_key() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, optimization_json(1));
        endpoint.create(&ParameterSet::new("demo-key"), None).unwrap();
        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(req.query_pairs(), vec![("api_key".to_string(), "demo-key".to_string())]);
    }

    #[test]
    fn create_sends_query_routed_fields() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, optimization_json(4));
        let mut params = ParameterSet::new("other-key");
        params.set("directions", 1).unwrap();
        params.set_route_path_output(RoutePathOutput::Points).unwrap();
        params.set_device_type(DeviceType::Web, Target::Query).unwrap();
        params.set_route_name("Monday").unwrap();

        endpoint.create(&params, None).unwrap();

        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(
            req.query_pairs(),
            vec![
                ("api_key".to_string(), "demo-key".to_string()),
                ("device_type".to_string(), "web".to_string()),
                ("directions".to_string(), "1".to_string()),
                ("route_path_output".to_string(), "Points".to_string()),
            ]
        );
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"parameters": {"route_name": "Monday"}, "addresses": []}));
    }

    #[test]
    fn update_arguments_override_query_fields() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, optimization_json(4));
        let mut params = ParameterSet::new("demo-key");
        params.set("reoptimize", 1).unwrap();
        params.set_optimization_problem_id("STALE").unwrap();
        params.set("device_tracking_history", 1).unwrap();

        endpoint.update(ID, Some(&params), false).unwrap();

        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(req.query_param("optimization_problem_id").as_deref(), Some(ID));
        assert_eq!(req.query_param("reoptimize").as_deref(), Some("0"));
        assert_eq!(req.query_param("device_tracking_history").as_deref(), Some("1"));
        assert_eq!(req.query_pairs().iter().filter(|(key, _)| key == "api_key").count(), 1);
    }

    #[test]
    fn get_queries_by_id() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, optimization_json(3));
        let optimization = endpoint.get(ID).unwrap();
        assert_eq!(optimization.state(), Some(OptimizationState::Optimizing));
        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.query_param("optimization_problem_id").as_deref(), Some(ID));
    }

    #[test]
    fn get_missing_is_not_found() {
        let endpoint = endpoint();
        stub(&endpoint).push_response(HttpResponse::new(404, r#"{"errors":["Optimization not found"]}"#));
        assert!(matches!(endpoint.get(ID), Err(ApiError::NotFound)));
    }

    #[test]
    fn list_joins_state_codes() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, json!({"optimizations": [optimization_json(4)], "totalRecords": 12}));

        let page = endpoint.list(&["4".into(), "5".into()], Some(1), Some(3)).unwrap();

        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(req.query_param("state").as_deref(), Some("4,5"));
        assert_eq!(req.query_param("limit").as_deref(), Some("1"));
        assert_eq!(req.query_param("offset").as_deref(), Some("3"));
        assert_eq!(page.total, 12);
        assert_eq!(page.limit, Some(1));
        assert_eq!(page.offset, Some(3));
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn list_keeps_items_in_unknown_states() {
        let endpoint = endpoint();
        let mut newer = optimization_json(4);
        newer["state"] = json!(8);
        stub(&endpoint).push_json(200, json!({"optimizations": [optimization_json(4), newer], "totalRecords": 2}));

        let page = endpoint.list(&[], None, None).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page.items[0].state(), Some(OptimizationState::Optimized));
        assert_eq!(page.items[1].state_code, 8);
        assert_eq!(page.items[1].state(), None);
    }

    #[test]
    fn list_without_filters_omits_them() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, json!({"optimizations": [], "totalRecords": 0}));
        let page = endpoint.list(&[], None, None).unwrap();
        let req = stub(&endpoint).last_request().unwrap();
        assert!(req.query_param("state").is_none());
        assert!(req.query_param("limit").is_none());
        assert!(req.query_param("offset").is_none());
        assert!(page.is_empty());
    }

    #[test]
    fn list_accepts_mixed_state_filters() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, json!({"optimizations": [], "totalRecords": "0"}));
        endpoint
            .list(&[OptimizationState::Optimized.into(), "Error".into(), "1,2".into()], None, None)
            .unwrap();
        let req = stub(&endpoint).last_request().unwrap();
        assert_eq!(req.query_param("state").as_deref(), Some("4,5,1,2"));
    }

    #[test]
    fn list_rejects_unknown_states_before_sending() {
        let endpoint = endpoint();
        let err = endpoint.list(&["Solved".into()], None, None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(ref e) if e.field == "state"));
        assert!(stub(&endpoint).requests().is_empty());
    }

    #[test]
    fn update_serializes_reoptimize_flag() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, optimization_json(4));
        stub(&endpoint).push_json(200, optimization_json(4));

        endpoint.update(ID, None, false).unwrap();
        let first = stub(&endpoint).last_request().unwrap();
        assert_eq!(first.method, HttpMethod::Put);
        assert_eq!(first.query_param("reoptimize").as_deref(), Some("0"));
        assert_eq!(first.body.as_deref(), Some("{}"));

        endpoint.reoptimize(ID).unwrap();
        let second = stub(&endpoint).last_request().unwrap();
        assert_eq!(second.query_param("reoptimize").as_deref(), Some("1"));
        assert_eq!(second.query_param("optimization_problem_id").as_deref(), Some(ID));
    }

    #[test]
    fn remove_succeeds_on_truthy_status() {
        let endpoint = endpoint();
        stub(&endpoint).push_json(200, json!({"status": true, "removed": 1}));
        assert!(endpoint.remove(ID).unwrap());
        assert_eq!(stub(&endpoint).last_request().unwrap().method, HttpMethod::Delete);
    }

    #[test]
    fn remove_without_status_is_unexpected() {
        let endpoint = endpoint();
        let raw = json!({"status": false, "errors": ["locked"]});
        stub(&endpoint).push_json(200, raw.clone());
        let err = endpoint.remove(ID).unwrap_err();
        match err {
            ApiError::UnexpectedResponse { method, response } => {
                assert_eq!(method, HttpMethod::Delete);
                assert_eq!(response, raw);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
