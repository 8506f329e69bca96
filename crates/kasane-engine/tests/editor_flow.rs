//! End-to-end editor flows through the public API only.

#![allow(clippy::unwrap_used)]

use kasane_engine::{
    AdjustChannel, BasePatch, BaseShape, CropRegion, Editor, FilterKind, Rgba, RgbaImage,
    StaticAssets, TextStyle,
};

/// Encode a synthetic image as PNG bytes.
fn png_of(image: &RgbaImage) -> Vec<u8> {
    kasane_engine::export::encode_png(image).unwrap()
}

#[test]
fn upload_edit_flatten_submit_payload() {
    // A photo-like source: red subject on a white backdrop.
    let source = RgbaImage::from_fn(200, 200, |x, y| {
        if (60..140).contains(&x) && (60..140).contains(&y) {
            image::Rgba([200, 30, 30, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });

    let mut assets = StaticAssets::new();
    assets.insert(
        "stickers",
        "star.png",
        RgbaImage::from_pixel(16, 16, image::Rgba([10, 200, 10, 255])),
    );

    let mut editor = Editor::new(Box::new(assets));
    let dims = editor.load_image(&png_of(&source)).unwrap();
    assert_eq!((dims.width, dims.height), (200, 200));

    // Knock out the backdrop, tone the subject, crop to it.
    editor.smart_remove_background();
    editor.set_filter(FilterKind::Sepia);
    editor.set_adjustment(AdjustChannel::Contrast, 15);
    editor
        .apply_crop_region(&CropRegion::new(50.0, 50.0, 100.0, 100.0))
        .unwrap();

    // Stand setup: heart base with a caption and a sticker.
    editor.set_base_patch(BasePatch {
        shape: Some(BaseShape::Heart),
        fill: Some(Rgba::opaque(250, 220, 230)),
        size_pct: Some(90.0),
        ..BasePatch::default()
    });
    editor
        .decorations_mut()
        .add_motif("stickers", "star.png", 24.0, 24.0);
    editor
        .decorations_mut()
        .add_text("Thanks!", TextStyle::default());

    let url = editor.export_data_url().unwrap();
    let payload = url.strip_prefix("data:image/png;base64,").unwrap();

    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    let flat = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(flat.dimensions(), (100, 100));

    // The subject survived crop and toning (sampled clear of the
    // sticker at the center).
    let subject = flat.get_pixel(20, 50).0;
    assert_eq!(subject[3], 255, "subject is opaque");
    assert!(subject[0] > subject[2], "sepia keeps the warm cast");

    // The sticker landed over the image center region.
    let sticker_hits = flat
        .pixels()
        .filter(|p| p.0[1] > 150 && p.0[0] < 100)
        .count();
    assert!(sticker_hits > 0, "sticker pixels present in the flatten");
}

#[test]
fn cancel_paths_leave_the_editor_untouched() {
    let mut editor = Editor::default();
    let source = RgbaImage::from_pixel(40, 40, image::Rgba([0, 80, 160, 255]));
    editor.load_image(&png_of(&source)).unwrap();

    {
        // Open both tools, wreck their sessions, then drop without apply.
        let mut mask = editor.begin_mask_session().unwrap();
        mask.commit_rectangle(0.0, 0.0, 1.0, 1.0);
        let mut crop = editor.begin_crop().unwrap();
        crop.drag(
            kasane_engine::Handle::Right,
            -100.0,
            0.0,
            kasane_engine::Dimensions {
                width: 40,
                height: 40,
            },
        );
    }

    let preview = editor.preview().unwrap();
    assert_eq!(preview.dimensions(), (40, 40));
    assert!(
        preview.pixels().all(|p| p.0 == [0, 80, 160, 255]),
        "every pixel untouched after cancelled sessions"
    );
}
