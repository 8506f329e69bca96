//! kasane-io: Browser I/O and Dioxus component library.
//!
//! Handles upload validation, raster-to-Blob-URL encoding, data-URL
//! helpers, web worker communication, order submission, file
//! downloads, and provides reusable UI components for the kasane web
//! application.

pub mod components;
pub mod dataurl;
pub mod download;
pub mod raster;
pub mod submit;
pub mod upload;
pub mod worker;

pub use components::submit::ExportPayload;
pub use components::{FileUpload, SubmitPanel};
pub use submit::{OrderRequest, OrderResponse, SubmitError, submit_order};
pub use upload::{UploadError, validate_upload};
pub use worker::ComposeWorker;
