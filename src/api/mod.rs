use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{ThresholdTable, compare_pension_scenario, evaluate, pension_sweep};

pub(crate) mod payload;

use payload::{
    ComparePayload, InputsPayload, SweepPayload, build_inputs, check_new_pension_value,
    check_sweep_amounts,
};

type SharedTable = Arc<ThresholdTable>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SweepResponse<'a> {
    tax_year: &'a str,
    pension_amounts: &'a [f64],
    results: Vec<crate::core::TaxComputation>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(table: SharedTable) -> Router {
    Router::new()
        .route(
            "/api/evaluate",
            get(evaluate_get_handler).post(evaluate_post_handler),
        )
        .route("/api/compare", post(compare_handler))
        .route("/api/sweep", post(sweep_handler))
        .route("/api/thresholds", get(thresholds_handler))
        .fallback(not_found_handler)
        .with_state(table)
}

pub async fn run_http_server(port: u16, table: ThresholdTable) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let tax_year = table.tax_year.clone();
    let app = router(Arc::new(table));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, tax_year = %tax_year, "take-home HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/evaluate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn evaluate_get_handler(
    State(table): State<SharedTable>,
    query: Result<Query<InputsPayload>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(payload)) => evaluate_handler_impl(&table, payload),
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

async fn evaluate_post_handler(
    State(table): State<SharedTable>,
    body: Result<Json<InputsPayload>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(payload)) => evaluate_handler_impl(&table, payload),
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

fn evaluate_handler_impl(table: &ThresholdTable, payload: InputsPayload) -> Response {
    let inputs = match build_inputs(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return bad_request(&msg),
    };
    json_response(StatusCode::OK, evaluate(&inputs, table))
}

async fn compare_handler(
    State(table): State<SharedTable>,
    body: Result<Json<ComparePayload>, JsonRejection>,
) -> Response {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let inputs = match build_inputs(payload.inputs) {
        Ok(inputs) => inputs,
        Err(msg) => return bad_request(&msg),
    };
    let new_value = match check_new_pension_value(payload.new_pension_value, inputs.pension_mode)
    {
        Ok(value) => value,
        Err(msg) => return bad_request(&msg),
    };
    json_response(
        StatusCode::OK,
        compare_pension_scenario(&inputs, new_value, &table),
    )
}

async fn sweep_handler(
    State(table): State<SharedTable>,
    body: Result<Json<SweepPayload>, JsonRejection>,
) -> Response {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let inputs = match build_inputs(payload.inputs) {
        Ok(inputs) => inputs,
        Err(msg) => return bad_request(&msg),
    };
    if let Err(msg) = check_sweep_amounts(&payload.pension_amounts) {
        return bad_request(&msg);
    }

    let response = SweepResponse {
        tax_year: &table.tax_year,
        pension_amounts: &payload.pension_amounts,
        results: pension_sweep(&inputs, &payload.pension_amounts, &table),
    };
    json_response(StatusCode::OK, response)
}

async fn thresholds_handler(State(table): State<SharedTable>) -> Response {
    json_response(StatusCode::OK, table.as_ref())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(msg: &str) -> Response {
    warn!(error = msg, "rejected request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::extract::FromRequest;
    use axum::http::{Request, Uri};
    use serde_json::Value;

    fn table() -> SharedTable {
        Arc::new(ThresholdTable::uk_2025_26())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    fn inputs_payload(json: &str) -> InputsPayload {
        serde_json::from_str(json).expect("payload should parse")
    }

    async fn json_body<T>(body: &'static str) -> Result<Json<T>, JsonRejection>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request should build");
        Json::<T>::from_request(request, &()).await
    }

    async fn assert_json_bad_request(response: Response) {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn evaluate_returns_camel_case_computation() {
        let response = evaluate_post_handler(
            State(table()),
            Ok(Json(inputs_payload(r#"{ "salary": 60000, "children": 2 }"#))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let json = body_json(response).await;
        assert_eq!(json["gross"], 60_000.0);
        assert_eq!(json["personalAllowance"], 12_570.0);
        assert!(json["incomeTax"]["bands"].is_array());
        assert!(json["contribution"]["total"].is_number());
        assert!(json["familyBenefit"]["withdrawnPercent"].is_number());
        assert!(json["savings"]["totalSaved"].is_number());
        assert!(json["marginalRateEstimates"].is_array());
    }

    #[tokio::test]
    async fn evaluate_get_accepts_query_payload() {
        let query: InputsPayload =
            serde_json::from_value(serde_json::json!({ "salary": 30000.0 })).expect("payload");
        let response = evaluate_get_handler(State(table()), Ok(Query(query))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["familyBenefit"], Value::Null);
    }

    #[tokio::test]
    async fn evaluate_rejects_negative_salary() {
        let response = evaluate_post_handler(
            State(table()),
            Ok(Json(inputs_payload(r#"{ "salary": -5 }"#))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().is_some_and(|e| e.contains("salary")));
    }

    #[tokio::test]
    async fn compare_returns_base_adjusted_and_deltas() {
        let payload: ComparePayload = serde_json::from_str(
            r#"{ "salary": 110000, "pension": 5, "pensionIsPercent": true, "newPensionValue": 10 }"#,
        )
        .expect("payload");
        let response = compare_handler(State(table()), Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["base"].is_object());
        assert!(json["adjusted"].is_object());
        assert!(json["deltas"]["allowanceRecovered"].as_f64().is_some_and(|v| v > 0.0));
    }

    #[tokio::test]
    async fn sweep_rejects_empty_amounts() {
        let payload: SweepPayload =
            serde_json::from_str(r#"{ "salary": 50000, "pensionAmounts": [] }"#).expect("payload");
        let response = sweep_handler(State(table()), Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sweep_returns_one_result_per_amount() {
        let payload: SweepPayload = serde_json::from_str(
            r#"{ "salary": 50000, "pensionAmounts": [0, 1000, 2000] }"#,
        )
        .expect("payload");
        let response = sweep_handler(State(table()), Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["taxYear"], "2025/26 (assumed)");
    }

    #[tokio::test]
    async fn thresholds_expose_active_table() {
        let response = thresholds_handler(State(table())).await;
        let json = body_json(response).await;
        assert_eq!(json["personalAllowance"], 12_570.0);
        assert_eq!(json["incomeTaxBands"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["familyBenefit"]["withdrawalPolicy"]["kind"], "linear");
    }

    #[tokio::test]
    async fn malformed_evaluate_body_is_json_bad_request() {
        let body = json_body::<InputsPayload>(r#"{ "salary": "#).await;
        assert!(body.is_err());
        assert_json_bad_request(evaluate_post_handler(State(table()), body).await).await;
    }

    #[tokio::test]
    async fn malformed_evaluate_query_is_json_bad_request() {
        let uri: Uri = "/api/evaluate?salary=lots".parse().expect("uri");
        let query = Query::<InputsPayload>::try_from_uri(&uri);
        assert!(query.is_err());
        assert_json_bad_request(evaluate_get_handler(State(table()), query).await).await;
    }

    #[tokio::test]
    async fn compare_without_new_pension_value_is_json_bad_request() {
        let body = json_body::<ComparePayload>(r#"{ "salary": 50000 }"#).await;
        assert!(body.is_err());
        assert_json_bad_request(compare_handler(State(table()), body).await).await;
    }

    #[tokio::test]
    async fn sweep_without_amounts_is_json_bad_request() {
        let body = json_body::<SweepPayload>(r#"{ "salary": 50000 }"#).await;
        assert!(body.is_err());
        assert_json_bad_request(sweep_handler(State(table()), body).await).await;
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Not found");
    }
}
