//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

use crate::upload::validate_upload;

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called with the raw file bytes and filename after a successful
    /// upload.
    on_upload: EventHandler<(Vec<u8>, String)>,
}

/// A drag-and-drop zone with a file picker button.
///
/// Accepts PNG, JPEG, GIF, and WebP images up to 10 MB. When a file
/// is selected (via the picker or drag-and-drop), reads the bytes,
/// validates them, and fires `on_upload` with `(bytes, filename)`.
/// Rejected files surface their validation error in place.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut filename = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    // Validate, read, and forward the first file from a list.
    //
    // Shared by the file-picker (`handle_files`) and drag-and-drop
    // (`handle_drop`) paths so the validation/read/callback logic
    // lives in one place.
    let process_files = move |files: Vec<FileData>| async move {
        if let Some(file) = files.first() {
            let name = file.name();
            match file.read_bytes().await {
                Ok(bytes) => {
                    let bytes = bytes.to_vec();
                    match validate_upload(&name, &bytes) {
                        Ok(()) => {
                            filename.set(Some(name.clone()));
                            error.set(None);
                            props.on_upload.call((bytes, name));
                        }
                        Err(e) => {
                            error.set(Some(e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    error.set(Some(format!("Failed to read file: {e}")));
                }
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let border_class = if dragging() {
        "upload-zone upload-zone-active"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: "{border_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref name) = filename() {
                p { class: "upload-loaded",
                    "Loaded: {name}"
                }
            }

            if let Some(ref err) = error() {
                p { class: "upload-error",
                    "{err}"
                }
            }

            p { class: "upload-hint",
                "Drop an image here or "
            }

            label {
                class: "upload-button",
                input {
                    r#type: "file",
                    accept: ".png,.jpg,.jpeg,.gif,.webp",
                    class: "upload-input",
                    onchange: handle_files,
                }
                "Choose File"
            }

            p { class: "upload-formats",
                "PNG, JPEG, GIF, WebP — up to 10 MB"
            }
        }
    }
}
