//! Request extractors whose rejections go through `AppError`.
//!
//! axum's own `Json`, `Query` and `Path` answer malformed input with a plain
//! text body. These wrappers turn the same failures into the standard
//! `{"error": {...}}` body with 400 `invalid_request`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Path segment parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::IntoResponse,
        routing::post,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::models::transaction::{AmountRequest, ReportQuery};

    async fn echo_amount(JsonBody(request): JsonBody<AmountRequest>) -> String {
        request.amount_cents.to_string()
    }

    async fn echo_report(QueryParams(query): QueryParams<ReportQuery>) -> String {
        format!("{:?}", query.start_date)
    }

    async fn echo_id(PathParam(id): PathParam<Uuid>) -> String {
        id.to_string()
    }

    fn router() -> Router {
        Router::new()
            .route("/amount", post(echo_amount))
            .route("/report", axum::routing::get(echo_report))
            .route("/loans/{id}", post(echo_id))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(request)
            .await
            .expect("response")
            .into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        (status, serde_json::from_slice(&bytes).expect("json error body"))
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn fractional_amount_is_a_validation_error() {
        let (status, body) = send(json_post("/amount", r#"{"amount_cents": 10.5}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn string_amount_is_a_validation_error() {
        let (status, body) = send(json_post("/amount", r#"{"amount_cents": "100"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn missing_content_type_is_a_validation_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/amount")
            .body(Body::from(r#"{"amount_cents": 100}"#))
            .expect("request");

        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn malformed_report_date_is_a_validation_error() {
        let request = Request::builder()
            .uri("/report?start_date=yesterday")
            .body(Body::empty())
            .expect("request");

        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn non_uuid_loan_id_is_a_validation_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/loans/42")
            .body(Body::empty())
            .expect("request");

        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn well_formed_input_passes_through() {
        let response = router()
            .oneshot(json_post("/amount", r#"{"amount_cents": 2500}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
