//! Web worker entry point for kasane composition passes.
//!
//! This crate compiles to a standalone WASM module that runs inside a
//! `Worker`. It receives image bytes and a `ComposeSpec` via
//! `postMessage`, calls `kasane_engine::compose`, and posts the
//! result back.
//!
//! The composed raster is sent as a raw `Uint8Array` buffer to avoid
//! the massive overhead of JSON-encoding megabytes of pixel data as
//! number arrays; errors travel as a small JSON string.
//!
//! Running the pixel passes in a worker keeps the browser's main
//! thread free for UI updates, animations, and user interaction.

use kasane_engine::{ComposeSpec, EngineError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Message protocol: the main thread sends a JS object with:
/// - `imageBytes`: `Uint8Array` containing the raw image file bytes
/// - `specJson`: `String` containing a JSON-serialized `ComposeSpec`
/// - `generation`: `f64` generation counter (passed through to the
///   response so the bridge can drop stale results)
///
/// On success the worker responds with:
/// - `generation`: `f64` matching the request generation
/// - `ok`: `true`
/// - `width`, `height`: `f64` — composed buffer dimensions
/// - `pixels`: `Uint8Array` — raw RGBA pixel data
///
/// On error the worker responds with:
/// - `generation`: `f64`
/// - `ok`: `false`
/// - `errorJson`: `String` — JSON-serialized `EngineError`
///
/// # Worker entry point
///
/// Called automatically when the WASM module is instantiated in the
/// worker context.
#[wasm_bindgen(start)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    // Get the worker global scope.
    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not running in a DedicatedWorkerGlobalScope");

    // Set up the message handler.
    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(&event);
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // leak — lives for the worker lifetime
}

/// Handle an incoming message from the main thread.
///
/// Extracts the image bytes and spec, runs the composition pass, and
/// posts the result back.
fn handle_message(event: &web_sys::MessageEvent) {
    let data = event.data();

    let generation = js_sys::Reflect::get(&data, &JsValue::from_str("generation"))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(-1.0);

    let image_bytes = match js_sys::Reflect::get(&data, &JsValue::from_str("imageBytes"))
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Uint8Array>().ok())
    {
        Some(array) => array.to_vec(),
        None => {
            post_error_message(generation, "missing imageBytes field");
            return;
        }
    };

    let Some(spec_json) = js_sys::Reflect::get(&data, &JsValue::from_str("specJson"))
        .ok()
        .and_then(|v| v.as_string())
    else {
        post_error_message(generation, "missing specJson field");
        return;
    };

    let spec: ComposeSpec = match serde_json::from_str(&spec_json) {
        Ok(spec) => spec,
        Err(e) => {
            post_error_message(generation, &format!("failed to parse spec: {e}"));
            return;
        }
    };

    // Run the composition pass (synchronous — blocks this worker
    // thread only).
    match kasane_engine::compose(&image_bytes, &spec) {
        Ok(image) => post_success_response(generation, &image),
        Err(e) => {
            let error_json = serde_json::to_string(&e)
                .unwrap_or_else(|ser_err| format!("\"serialization error: {ser_err}\""));
            post_error_json(generation, &error_json);
        }
    }
}

/// Post a successful composition result back to the main thread.
///
/// The raster is sent as a raw `Uint8Array` buffer (zero JSON
/// overhead) with its dimensions alongside.
fn post_success_response(generation: f64, image: &kasane_engine::RgbaImage) {
    let response = js_sys::Object::new();
    let set = |key: &str, val: &JsValue| {
        js_sys::Reflect::set(&response, &JsValue::from_str(key), val)
            .expect_throw("failed to set response field");
    };

    set("generation", &JsValue::from_f64(generation));
    set("ok", &JsValue::from_bool(true));
    set("width", &JsValue::from_f64(f64::from(image.width())));
    set("height", &JsValue::from_f64(f64::from(image.height())));
    set(
        "pixels",
        &js_sys::Uint8Array::from(image.as_raw().as_slice()),
    );

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not in worker scope");
    global
        .post_message(&response)
        .expect_throw("failed to postMessage");
}

/// Post a protocol-level error back to the main thread.
fn post_error_message(generation: f64, message: &str) {
    let error = EngineError::Protocol(message.to_owned());
    let error_json = serde_json::to_string(&error).unwrap_or_else(|_| "\"unknown error\"".into());
    post_error_json(generation, &error_json);
}

/// Post a pre-serialized error JSON back to the main thread.
fn post_error_json(generation: f64, error_json: &str) {
    let response = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("generation"),
        &JsValue::from_f64(generation),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("ok"),
        &JsValue::from_bool(false),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("errorJson"),
        &JsValue::from_str(error_json),
    );

    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() {
        let _ = global.post_message(&response);
    }
}
