//! Order submission boundary.
//!
//! POSTs a JSON payload — the flattened composition as a PNG data URL
//! plus order metadata — to the storefront's order endpoint, and
//! reads back nothing more than success/failure and an order
//! identifier. Everything else about the order API (auth, payment,
//! persistence) lives outside this crate.

use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};

use kasane_engine::BaseConfig;

/// Default order endpoint, same-origin.
pub const DEFAULT_ORDER_ENDPOINT: &str = "/api/orders";

/// The JSON payload POSTed to the order endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Flattened composition as a `data:image/png;base64,...` URL.
    pub image: String,
    /// Number of stands ordered.
    pub quantity: u32,
    /// Product size code (e.g. "s", "m", "l").
    pub size_code: String,
    /// The stand base configuration, for production.
    pub base: BaseConfig,
    /// Optional customer note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderRequest {
    /// Build a single-quantity order for the default product size.
    #[must_use]
    pub fn new(image: String, base: BaseConfig) -> Self {
        Self {
            image,
            quantity: 1,
            size_code: "m".to_owned(),
            base,
            note: None,
        }
    }
}

/// What the order endpoint answers with; nothing else is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    /// Whether the order was accepted.
    pub success: bool,
    /// Identifier of the created order, when accepted.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Optional human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Errors from submitting an order.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The request payload could not be serialized.
    #[error("failed to serialize order payload: {0}")]
    Serialize(String),

    /// A network or browser API failure.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("order endpoint returned HTTP {status}")]
    Http {
        /// The HTTP status code.
        status: u16,
    },

    /// The endpoint's body was not a valid order response.
    #[error("malformed order response: {0}")]
    MalformedResponse(String),
}

fn js_error(value: JsValue) -> SubmitError {
    SubmitError::Network(format!("{value:?}"))
}

/// Parse the endpoint's response body.
///
/// # Errors
///
/// Returns [`SubmitError::MalformedResponse`] when the body is not a
/// valid [`OrderResponse`].
pub fn parse_response(body: &str) -> Result<OrderResponse, SubmitError> {
    serde_json::from_str(body).map_err(|e| SubmitError::MalformedResponse(e.to_string()))
}

/// POST an order to the endpoint and return the parsed response.
///
/// The caller decides what to do with `success == false`; this
/// function only distinguishes transport-level failures.
///
/// # Errors
///
/// Returns [`SubmitError::Serialize`] for unserializable payloads,
/// [`SubmitError::Network`] for fetch/browser failures,
/// [`SubmitError::Http`] for non-2xx statuses, and
/// [`SubmitError::MalformedResponse`] for undecodable bodies.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn submit_order(
    endpoint: &str,
    request: &OrderRequest,
) -> Result<OrderResponse, SubmitError> {
    let body = serde_json::to_string(request).map_err(|e| SubmitError::Serialize(e.to_string()))?;

    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    init.set_mode(web_sys::RequestMode::SameOrigin);
    init.set_body(&JsValue::from_str(&body));

    let req = web_sys::Request::new_with_str_and_init(endpoint, &init).map_err(js_error)?;
    req.headers()
        .set("Content-Type", "application/json")
        .map_err(js_error)?;

    let window =
        web_sys::window().ok_or_else(|| SubmitError::Network("no global window".into()))?;
    let fetched = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&req))
        .await
        .map_err(js_error)?;
    let response: web_sys::Response = fetched
        .dyn_into()
        .map_err(|_| SubmitError::Network("fetch returned a non-Response".into()))?;

    if !response.ok() {
        return Err(SubmitError::Http {
            status: response.status(),
        });
    }

    let text_promise = response.text().map_err(js_error)?;
    let text_value = wasm_bindgen_futures::JsFuture::from(text_promise)
        .await
        .map_err(js_error)?;
    let text = text_value
        .as_string()
        .ok_or_else(|| SubmitError::MalformedResponse("response body is not text".into()))?;

    parse_response(&text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_data_url_and_base() {
        let request = OrderRequest::new(
            "data:image/png;base64,AAAA".to_owned(),
            BaseConfig::default(),
        );
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"image\":\"data:image/png;base64,AAAA\""));
        assert!(json.contains("\"quantity\":1"));
        assert!(json.contains("\"shape\":\"rectangle\""));
        assert!(!json.contains("\"note\""), "absent note is omitted");
    }

    #[test]
    fn request_serde_round_trip() {
        let mut request = OrderRequest::new("data:image/png;base64,xx".to_owned(), BaseConfig::default());
        request.quantity = 3;
        request.note = Some("gift wrap".to_owned());
        let json = serde_json::to_string(&request).unwrap();
        let back: OrderRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }

    #[test]
    fn success_response_parses_with_order_id() {
        let response = parse_response(r#"{"success":true,"order_id":"ORD-123"}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.order_id.as_deref(), Some("ORD-123"));
        assert_eq!(response.message, None);
    }

    #[test]
    fn failure_response_parses_without_order_id() {
        let response =
            parse_response(r#"{"success":false,"message":"image too large"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.order_id, None);
        assert_eq!(response.message.as_deref(), Some("image too large"));
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(SubmitError::MalformedResponse(_))
        ));
    }

    #[test]
    fn error_display_carries_status() {
        assert_eq!(
            SubmitError::Http { status: 502 }.to_string(),
            "order endpoint returned HTTP 502"
        );
    }
}
