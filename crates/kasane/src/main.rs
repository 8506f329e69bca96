use std::rc::Rc;

use dioxus::prelude::*;
use kasane_engine::{
    AdjustChannel, BasePatch, BaseShape, Editor, EngineError, FilterKind, TextStyle,
};
use kasane_io::components::submit::ExportPayload;
use kasane_io::{FileUpload, SubmitPanel, raster};

/// Inline stylesheet for the editor shell.
const APP_CSS: &str = include_str!("../assets/app.css");

fn main() {
    dioxus::launch(app);
}

/// Root application component.
///
/// Owns the [`Editor`] behind a signal and wires together the upload
/// zone, preview, edit controls, and submit panel. Preview
/// regeneration runs in a spawned task guarded by a generation
/// counter so a stale render can never overwrite a newer one.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut editor = use_signal(Editor::default);
    let mut filename = use_signal(|| String::from("kasane-stand"));
    let mut preview_url = use_signal(|| Option::<String>::None);
    let mut export = use_signal(|| Option::<Rc<ExportPayload>>::None);
    let mut error = use_signal(|| Option::<String>::None);
    let mut processing = use_signal(|| false);
    let mut generation = use_signal(|| 0u64);
    // Bumped by every edit; the preview effect subscribes to it.
    let mut edit_tick = use_signal(|| 0u64);
    let mut text_input = use_signal(String::new);

    // --- File upload handler ---
    let on_upload = move |(bytes, name): (Vec<u8>, String)| {
        // Strip extension for the export filename.
        let base_name = name
            .rsplit_once('.')
            .map_or(name.as_str(), |(base, _)| base)
            .to_owned();
        filename.set(base_name);
        export.set(None);
        match editor.with_mut(|e| e.load_image(&bytes)) {
            Ok(_) => {
                error.set(None);
                edit_tick += 1;
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    // --- Preview regeneration effect ---
    // Re-runs whenever edit_tick changes. Spawns an async task so the
    // "Rendering..." indicator paints before the synchronous pixel
    // passes block the thread.
    use_effect(move || {
        let _ = edit_tick();
        if !editor.peek().has_image() {
            return;
        }

        // Increment generation so any in-flight task from a prior
        // trigger knows it is stale and should discard its result.
        generation += 1;
        let my_generation = *generation.peek();

        processing.set(true);

        spawn(async move {
            // Yield to the browser event loop so it can paint the
            // "Rendering..." state before we block on the passes.
            gloo_timers::future::TimeoutFuture::new(0).await;

            // If another edit landed while we were queued, discard
            // this stale run silently.
            if *generation.peek() != my_generation {
                return;
            }

            let outcome = editor.peek().preview();
            match outcome {
                Ok(image) => match raster::rgba_image_to_blob_url(&image) {
                    Ok(url) => {
                        let old_url = preview_url.peek().as_deref().map(str::to_owned);
                        if let Some(old) = old_url {
                            raster::revoke_blob_url(&old);
                        }
                        preview_url.set(Some(url));
                        error.set(None);
                    }
                    Err(e) => error.set(Some(e.to_string())),
                },
                Err(e) => error.set(Some(e.to_string())),
            }

            processing.set(false);
        });
    });

    // --- Export preparation handler ---
    let prepare_export = move |_| {
        let outcome: Result<ExportPayload, EngineError> = editor.with_mut(|e| {
            let png = e.export_png()?;
            let data_url = kasane_io::dataurl::encode("image/png", &png);
            Ok(ExportPayload {
                png,
                data_url,
                base: e.base_config(),
            })
        });
        match outcome {
            Ok(payload) => {
                export.set(Some(Rc::new(payload)));
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    // --- Decoration handlers ---
    let add_text = move |_| {
        let content = text_input.peek().trim().to_owned();
        if content.is_empty() {
            return;
        }
        editor.with_mut(|e| {
            e.decorations_mut().add_text(&content, TextStyle::default());
        });
        text_input.set(String::new());
        edit_tick += 1;
    };

    let has_image = editor.read().has_image();
    let decoration_rows: Vec<(kasane_engine::DecorationId, String)> = editor
        .read()
        .decorations()
        .decorations()
        .iter()
        .map(|d| (d.id, decoration_label(d)))
        .collect();

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: APP_CSS }

        div { class: "shell",
            header { class: "header",
                h1 { class: "title", "kasane" }
                p { class: "subtitle",
                    "Custom acrylic stand editor — upload, crop, decorate, order"
                }
            }

            div { class: "content",
                // Left column: preview
                div { class: "preview-column",
                    if processing() {
                        div { class: "preview-placeholder",
                            p { class: "pulse", "Rendering..." }
                        }
                    } else if let Some(ref url) = preview_url() {
                        img { class: "preview-image", src: "{url}" }
                    } else {
                        div { class: "preview-placeholder",
                            p { "Upload an image to get started" }
                        }
                    }

                    if let Some(ref err) = error() {
                        div { class: "error-box",
                            p { "{err}" }
                        }
                    }
                }

                // Right column: controls
                div { class: "controls-column",
                    // Filters
                    section { class: "panel",
                        h3 { "Filter" }
                        div { class: "button-row",
                            for kind in FilterKind::ALL {
                                button {
                                    class: if editor.read().filter() == kind { "chip chip-active" } else { "chip" },
                                    disabled: !has_image,
                                    onclick: move |_| {
                                        editor.with_mut(|e| e.set_filter(kind));
                                        edit_tick += 1;
                                    },
                                    "{kind}"
                                }
                            }
                        }
                    }

                    // Background removal
                    section { class: "panel",
                        h3 { "Background" }
                        button {
                            class: "chip",
                            disabled: !has_image,
                            onclick: move |_| {
                                editor.with_mut(Editor::smart_remove_background);
                                edit_tick += 1;
                            },
                            "Auto cutout"
                        }
                    }

                    // Adjustments
                    section { class: "panel",
                        h3 { "Adjust" }
                        AdjustSlider {
                            label: "Brightness",
                            min: -100,
                            max: 100,
                            value: editor.read().adjustments().brightness,
                            on_change: move |v| {
                                editor.with_mut(|e| e.set_adjustment(AdjustChannel::Brightness, v));
                                edit_tick += 1;
                            },
                        }
                        AdjustSlider {
                            label: "Contrast",
                            min: -100,
                            max: 100,
                            value: editor.read().adjustments().contrast,
                            on_change: move |v| {
                                editor.with_mut(|e| e.set_adjustment(AdjustChannel::Contrast, v));
                                edit_tick += 1;
                            },
                        }
                        AdjustSlider {
                            label: "Saturation",
                            min: -100,
                            max: 100,
                            value: editor.read().adjustments().saturation,
                            on_change: move |v| {
                                editor.with_mut(|e| e.set_adjustment(AdjustChannel::Saturation, v));
                                edit_tick += 1;
                            },
                        }
                        AdjustSlider {
                            label: "Blur",
                            min: 0,
                            max: 20,
                            value: i32::try_from(editor.read().adjustments().blur).unwrap_or(0),
                            on_change: move |v| {
                                editor.with_mut(|e| e.set_adjustment(AdjustChannel::Blur, v));
                                edit_tick += 1;
                            },
                        }
                    }

                    // Rotation and scale
                    section { class: "panel",
                        h3 { "Layout" }
                        div { class: "button-row",
                            button {
                                class: "chip",
                                disabled: !has_image,
                                onclick: move |_| {
                                    editor.with_mut(Editor::rotate_ccw);
                                    edit_tick += 1;
                                },
                                "⟲ 90°"
                            }
                            button {
                                class: "chip",
                                disabled: !has_image,
                                onclick: move |_| {
                                    editor.with_mut(Editor::rotate_cw);
                                    edit_tick += 1;
                                },
                                "⟳ 90°"
                            }
                        }
                        AdjustSlider {
                            label: "Scale %",
                            min: 50,
                            max: 200,
                            value: i32::try_from(editor.read().scale_pct()).unwrap_or(100),
                            on_change: move |v: i32| {
                                editor.with_mut(|e| e.set_scale_pct(u32::try_from(v.max(0)).unwrap_or(100)));
                                edit_tick += 1;
                            },
                        }
                    }

                    // Base shape
                    section { class: "panel",
                        h3 { "Base" }
                        div { class: "button-row",
                            for shape in BaseShape::ALL {
                                button {
                                    class: if editor.read().base_config().shape == shape { "chip chip-active" } else { "chip" },
                                    onclick: move |_| {
                                        editor.with_mut(|e| e.set_base_patch(BasePatch {
                                            shape: Some(shape),
                                            ..BasePatch::default()
                                        }));
                                        edit_tick += 1;
                                    },
                                    "{shape}"
                                }
                            }
                        }
                    }

                    // Text decorations
                    section { class: "panel",
                        h3 { "Text" }
                        div { class: "text-add-row",
                            input {
                                r#type: "text",
                                placeholder: "Add a caption",
                                value: "{text_input}",
                                oninput: move |evt| text_input.set(evt.value()),
                            }
                            button { class: "chip", onclick: add_text, "Add" }
                        }
                        for (id, label) in decoration_rows {
                            div { class: "decoration-row", key: "{id}",
                                span { "{label}" }
                                button {
                                    class: "chip",
                                    onclick: move |_| {
                                        editor.with_mut(|e| {
                                            e.decorations_mut().bring_to_front(id);
                                        });
                                        edit_tick += 1;
                                    },
                                    "Front"
                                }
                                button {
                                    class: "chip chip-danger",
                                    onclick: move |_| {
                                        editor.with_mut(|e| {
                                            e.decorations_mut().remove(id);
                                        });
                                        edit_tick += 1;
                                    },
                                    "Delete"
                                }
                            }
                        }
                    }

                    // Export + submit
                    section { class: "panel",
                        button {
                            class: if has_image { "btn-primary" } else { "btn-disabled" },
                            disabled: !has_image,
                            onclick: prepare_export,
                            "Prepare export"
                        }
                        SubmitPanel {
                            export: export(),
                            filename: filename(),
                        }
                    }
                }
            }

            // Footer: upload zone
            div { class: "footer",
                FileUpload { on_upload: on_upload }
            }
        }
    }
}

/// Short list label for a decoration.
fn decoration_label(decoration: &kasane_engine::Decoration) -> String {
    match &decoration.kind {
        kasane_engine::DecorationKind::Text { content, .. } => format!("“{content}”"),
        kasane_engine::DecorationKind::Motif { category, asset, .. } => {
            format!("{category}/{asset}")
        }
    }
}

/// Props for [`AdjustSlider`].
#[derive(Props, Clone, PartialEq)]
struct AdjustSliderProps {
    label: &'static str,
    min: i32,
    max: i32,
    value: i32,
    on_change: EventHandler<i32>,
}

/// A labeled range slider emitting parsed integer values.
#[component]
fn AdjustSlider(props: AdjustSliderProps) -> Element {
    rsx! {
        div { class: "slider-row",
            label { class: "slider-label", "{props.label}" }
            input {
                r#type: "range",
                min: "{props.min}",
                max: "{props.max}",
                value: "{props.value}",
                oninput: move |evt| {
                    if let Ok(v) = evt.value().parse::<i32>() {
                        props.on_change.call(v);
                    }
                },
            }
            span { class: "slider-value", "{props.value}" }
        }
    }
}
