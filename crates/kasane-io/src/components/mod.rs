//! Reusable Dioxus components for the kasane web application.

pub mod submit;
pub mod upload;

pub use submit::SubmitPanel;
pub use upload::FileUpload;
