//! Web worker communication for off-main-thread composition passes.
//!
//! [`ComposeWorker`] wraps a `web_sys::Worker` running the
//! `kasane-worker` WASM module. It sends image bytes plus a
//! serialized [`ComposeSpec`] via `postMessage` and receives the
//! composed RGBA buffer (or a serialized [`EngineError`]) back.
//!
//! Every request carries a generation number; responses tagged with a
//! different generation are ignored, so a result computed from stale
//! edits can never overwrite a newer one. [`cancel`](ComposeWorker::cancel)
//! implements cancel-on-supersede by terminating the worker outright
//! and spawning a fresh one.
//!
//! The worker is created from embedded JS + WASM blobs, so no extra
//! static files need to be served by the dev server.

use std::cell::RefCell;
use std::rc::Rc;

use kasane_engine::{ComposeSpec, EngineError, RgbaImage};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// A composition worker that runs [`kasane_engine::compose`] in a
/// dedicated web worker.
///
/// Create one at app startup and reuse it for all composition runs.
pub struct ComposeWorker {
    /// The embedded JS glue for the worker.
    worker_js: &'static str,
    /// The embedded WASM binary for the worker.
    worker_wasm: &'static [u8],
    /// The current worker instance. Replaced on cancel.
    inner: RefCell<web_sys::Worker>,
}

impl ComposeWorker {
    /// Create a new composition worker from embedded JS and WASM
    /// blobs.
    ///
    /// # Panics
    ///
    /// Panics if the worker cannot be created (e.g. in a non-browser
    /// environment).
    #[must_use]
    pub fn new(worker_js: &'static str, worker_wasm: &'static [u8]) -> Self {
        let worker = create_worker(worker_js, worker_wasm);
        Self {
            worker_js,
            worker_wasm,
            inner: RefCell::new(worker),
        }
    }

    /// Run one composition pass in the worker.
    ///
    /// The `generation` parameter is echoed in the response so stale
    /// results can be detected and dropped.
    ///
    /// # Errors
    ///
    /// Returns an `EngineError` if the spec cannot be serialized, the
    /// worker fails to respond (e.g. was terminated), or the response
    /// cannot be decoded.
    #[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
    pub async fn run(
        &self,
        image_bytes: &[u8],
        spec: &ComposeSpec,
        generation: f64,
    ) -> Result<RgbaImage, EngineError> {
        let spec_json = serde_json::to_string(spec)
            .map_err(|e| EngineError::Protocol(format!("failed to serialize spec: {e}")))?;

        // Message object: { imageBytes: Uint8Array, specJson: string, generation: f64 }
        let message = js_sys::Object::new();
        let set = |key: &str, val: &JsValue| {
            js_sys::Reflect::set(&message, &JsValue::from_str(key), val)
                .map_err(|_| EngineError::Protocol(format!("failed to set {key}")))
        };
        set("imageBytes", &js_sys::Uint8Array::from(image_bytes))?;
        set("specJson", &JsValue::from_str(&spec_json))?;
        set("generation", &JsValue::from_f64(generation))?;

        // Promise resolved by the matching worker response.
        let result = Rc::new(RefCell::new(None::<Result<RgbaImage, EngineError>>));
        let result_clone = Rc::clone(&result);

        let (promise, resolve, reject) = new_promise();

        let resolve_clone = resolve.clone();
        let onmessage = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let data = event.data();

                let resp_generation = js_sys::Reflect::get(&data, &JsValue::from_str("generation"))
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(-1.0);
                if (resp_generation - generation).abs() > f64::EPSILON {
                    // Stale response — ignore it.
                    return;
                }

                *result_clone.borrow_mut() = Some(decode_response(&data));
                resolve_clone.call0(&JsValue::NULL).ok();
            },
        );

        let onerror =
            Closure::<dyn FnMut(web_sys::ErrorEvent)>::new(move |event: web_sys::ErrorEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&event.message()));
            });

        {
            let worker = self.inner.borrow();
            worker.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
            worker.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            worker
                .post_message(&message)
                .map_err(|_| EngineError::Protocol("failed to postMessage".into()))?;
        }

        // Prevent closures from being dropped while we await.
        let _onmessage_guard = onmessage;
        let _onerror_guard = onerror;

        // Await the promise — this yields to the browser event loop.
        let await_result = wasm_bindgen_futures::JsFuture::from(promise).await;

        {
            let worker = self.inner.borrow();
            worker.set_onmessage(None);
            worker.set_onerror(None);
        }

        match await_result {
            Ok(_) => result.borrow_mut().take().unwrap_or(Err(EngineError::Protocol(
                "worker completed but no result captured".into(),
            ))),
            Err(e) => {
                let msg = e.as_string().unwrap_or_else(|| "unknown worker error".into());
                Err(EngineError::Protocol(format!("worker error: {msg}")))
            }
        }
    }

    /// Cancel any in-progress run by terminating the worker and
    /// creating a fresh one.
    ///
    /// This is instant — the worker is killed immediately regardless
    /// of what stage the pass is in.
    pub fn cancel(&self) {
        self.inner.borrow().terminate();
        let new_worker = create_worker(self.worker_js, self.worker_wasm);
        *self.inner.borrow_mut() = new_worker;
    }
}

/// Decode a worker response object into the composed buffer.
///
/// Success responses carry `{ ok: true, width, height, pixels }` with
/// raw RGBA bytes; failures carry `{ ok: false, errorJson }`.
fn decode_response(data: &JsValue) -> Result<RgbaImage, EngineError> {
    let get = |key: &str| js_sys::Reflect::get(data, &JsValue::from_str(key)).ok();

    let ok = get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if !ok {
        let error_json = get("errorJson").and_then(|v| v.as_string()).unwrap_or_default();
        return Err(serde_json::from_str::<EngineError>(&error_json).unwrap_or_else(|_| {
            EngineError::Protocol("worker reported an undecodable error".into())
        }));
    }

    let width = get("width").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = get("height").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let pixels: Option<js_sys::Uint8Array> =
        get("pixels").and_then(|v| v.dyn_into::<js_sys::Uint8Array>().ok());

    let Some(pixels) = pixels else {
        return Err(EngineError::Protocol(
            "worker response missing pixel buffer".into(),
        ));
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (w, h) = (width as u32, height as u32);
    RgbaImage::from_raw(w, h, pixels.to_vec()).ok_or(EngineError::DimensionMismatch {
        expected: kasane_engine::Dimensions {
            width: w,
            height: h,
        },
        actual: kasane_engine::Dimensions {
            width: 0,
            height: 0,
        },
    })
}

/// Create a web worker from embedded JS glue and WASM binary.
///
/// 1. Creates a Blob URL for the WASM binary
/// 2. Wraps the JS glue in a self-initializing script that loads the
///    WASM from the Blob URL
/// 3. Creates a Blob URL for the wrapper script
/// 4. Creates a Worker from the wrapper Blob URL
fn create_worker(worker_js: &str, worker_wasm: &[u8]) -> web_sys::Worker {
    // Create a Blob URL for the WASM binary.
    let wasm_array = js_sys::Uint8Array::from(worker_wasm);
    let wasm_blob_parts = js_sys::Array::new();
    wasm_blob_parts.push(&wasm_array.buffer());
    let wasm_blob_opts = web_sys::BlobPropertyBag::new();
    wasm_blob_opts.set_type("application/wasm");
    let wasm_blob = web_sys::Blob::new_with_buffer_source_sequence_and_options(
        &wasm_blob_parts,
        &wasm_blob_opts,
    )
    .expect_throw("failed to create WASM Blob");
    let wasm_url = web_sys::Url::create_object_url_with_blob(&wasm_blob)
        .expect_throw("failed to create WASM Blob URL");

    // Wrapper script: define the wasm_bindgen glue, then initialize
    // the module from the embedded blob URL.
    let wrapper_js = format!(
        r#"// Worker wrapper — loads embedded wasm_bindgen glue and WASM blob.
{worker_js}

// Initialize the WASM module from the embedded blob URL.
wasm_bindgen("{wasm_url}")
    .catch(function(e) {{ console.error("Worker WASM init failed:", e); }});
"#
    );

    let js_blob_parts = js_sys::Array::new();
    js_blob_parts.push(&JsValue::from_str(&wrapper_js));
    let js_blob_opts = web_sys::BlobPropertyBag::new();
    js_blob_opts.set_type("application/javascript");
    let js_blob = web_sys::Blob::new_with_str_sequence_and_options(&js_blob_parts, &js_blob_opts)
        .expect_throw("failed to create JS Blob");
    let js_url = web_sys::Url::create_object_url_with_blob(&js_blob)
        .expect_throw("failed to create JS Blob URL");

    let worker = web_sys::Worker::new(&js_url).expect_throw("failed to create Worker");

    // Revoke the JS URL (already fetched); keep the WASM URL alive
    // since the worker's async init may still be fetching it.
    web_sys::Url::revoke_object_url(&js_url).ok();

    worker
}

/// Create a JS Promise along with its resolve and reject functions.
fn new_promise() -> (js_sys::Promise, js_sys::Function, js_sys::Function) {
    let resolve = Rc::new(RefCell::new(None::<js_sys::Function>));
    let reject = Rc::new(RefCell::new(None::<js_sys::Function>));
    let resolve_clone = Rc::clone(&resolve);
    let reject_clone = Rc::clone(&reject);

    let promise = js_sys::Promise::new(&mut move |res, rej| {
        *resolve_clone.borrow_mut() = Some(res);
        *reject_clone.borrow_mut() = Some(rej);
    });

    let resolve_fn = resolve
        .borrow_mut()
        .take()
        .expect_throw("resolve not captured");
    let reject_fn = reject
        .borrow_mut()
        .take()
        .expect_throw("reject not captured");

    (promise, resolve_fn, reject_fn)
}
