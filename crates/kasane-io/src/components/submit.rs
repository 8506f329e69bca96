//! Submit panel component: order submission and PNG download.

use std::rc::Rc;

use dioxus::prelude::*;

use kasane_engine::BaseConfig;

use crate::download;
use crate::submit::{DEFAULT_ORDER_ENDPOINT, OrderRequest, submit_order};

/// The flattened export a submit panel operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    /// PNG bytes of the flattened composition.
    pub png: Vec<u8>,
    /// The same composition as a PNG data URL.
    pub data_url: String,
    /// Base configuration at export time.
    pub base: BaseConfig,
}

/// Props for the [`SubmitPanel`] component.
#[derive(Props, Clone)]
pub struct SubmitPanelProps {
    /// The export to submit. `None` disables all buttons. Wrapped in
    /// `Rc` to avoid cloning megabytes of PNG on each render.
    export: Option<Rc<ExportPayload>>,
    /// Base filename (without extension) for downloads.
    filename: String,
}

impl PartialEq for SubmitPanelProps {
    fn eq(&self, other: &Self) -> bool {
        let exports_eq = match (&self.export, &other.export) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        exports_eq && self.filename == other.filename
    }
}

/// Submit panel with an order button and a PNG download button.
#[component]
pub fn SubmitPanel(props: SubmitPanelProps) -> Element {
    let has_export = props.export.is_some();
    let mut status = use_signal(|| Option::<String>::None);
    let mut submitting = use_signal(|| false);

    // Clear stale status when the export changes.
    let export_present = props.export.is_some();
    use_effect(move || {
        let _ = export_present;
        status.set(None);
    });

    let submit_click = {
        let export = props.export.clone();
        move |_| {
            let Some(export) = export.clone() else {
                return;
            };
            submitting.set(true);
            status.set(None);
            spawn(async move {
                let request =
                    OrderRequest::new(export.data_url.clone(), export.base.clone());
                match submit_order(DEFAULT_ORDER_ENDPOINT, &request).await {
                    Ok(response) if response.success => {
                        let id = response.order_id.unwrap_or_else(|| "?".to_owned());
                        status.set(Some(format!("Order placed: {id}")));
                    }
                    Ok(response) => {
                        let msg = response
                            .message
                            .unwrap_or_else(|| "order was not accepted".to_owned());
                        status.set(Some(format!("Order failed: {msg}")));
                    }
                    Err(e) => {
                        status.set(Some(format!("Order failed: {e}")));
                    }
                }
                submitting.set(false);
            });
        }
    };

    let download_click = {
        let export = props.export.clone();
        let filename = props.filename;
        move |_| {
            if let Some(ref export) = export {
                let download_name = format!("{filename}.png");
                if let Err(e) =
                    download::trigger_download_bytes(&export.png, &download_name, "image/png")
                {
                    status.set(Some(format!("Download failed: {e}")));
                }
            }
        }
    };

    rsx! {
        div { class: "submit-panel",
            h3 { class: "submit-heading", "Order" }

            if let Some(ref msg) = status() {
                p { class: "submit-status", "{msg}" }
            }

            div { class: "submit-buttons",
                button {
                    class: if has_export && !submitting() { "btn-primary" } else { "btn-disabled" },
                    disabled: !has_export || submitting(),
                    onclick: submit_click,
                    if submitting() { "Submitting..." } else { "Submit order" }
                }

                button {
                    class: if has_export { "btn-secondary" } else { "btn-disabled" },
                    disabled: !has_export,
                    onclick: download_click,
                    "Download PNG"
                }
            }
        }
    }
}
