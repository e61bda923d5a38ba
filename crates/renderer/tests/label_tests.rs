//! Tests for label rendering with a real font.

use std::path::{Path, PathBuf};

use renderer::label::{LABEL_FONT_SIZE, LABEL_UPSCALE};
use renderer::{render_label, LabelFont};
use test_utils::workspace_root;

fn asset_font() -> PathBuf {
    workspace_root().join("crates/renderer/assets/DejaVuSansMono.ttf")
}

#[test]
fn test_label_patch_is_upscaled() {
    let font = LabelFont::bundled().unwrap();

    let patch = render_label(&font, "Snow @ 09:12");
    assert_eq!(patch.height() % LABEL_UPSCALE, 0);
    assert_eq!(patch.width() % LABEL_UPSCALE, 0);
    assert!(patch.height() >= LABEL_FONT_SIZE as u32 * LABEL_UPSCALE);
    assert!(patch.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn test_label_patch_is_opaque_where_glyphs_blend() {
    let font = LabelFont::bundled().unwrap();

    let patch = render_label(&font, "Rain @ 16:54");
    let translucent = patch.pixels().filter(|p| p.0[3] != 255).count();
    assert_eq!(translucent, 0);

    // Antialiased glyph edges produce intermediate greys
    assert!(patch.pixels().any(|p| p.0[0] > 0 && p.0[0] < 255));
}

#[test]
fn test_longer_text_gives_wider_patch() {
    let font = LabelFont::bundled().unwrap();

    let short = render_label(&font, "Rain @ 10:00");
    let long = render_label(&font, "Rain, Snow @ 10:00");
    assert!(long.width() > short.width());
    assert_eq!(long.height(), short.height());
}

#[test]
fn test_discover_prefers_configured_font() {
    let font_path = asset_font();
    let font = LabelFont::discover(Some(&font_path)).unwrap();
    assert_eq!(font.source(), Some(font_path.as_path()));
}

#[test]
fn test_discover_skips_missing_configured_font() {
    let font = LabelFont::discover(Some(Path::new("/nonexistent.ttf"))).unwrap();
    assert_eq!(font.source(), None);
}
