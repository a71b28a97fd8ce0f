//! Vector drawing via SVG.
//!
//! Watermarks and logo placeholders are text on shapes. Rather than
//! hand-placing glyphs, they are described as small SVG documents and
//! rasterized with `resvg`, which handles font lookup, shaping, rotation
//! and anti-aliasing.
//!
//! System fonts are loaded once per process. On hosts without any fonts
//! installed, text renders as nothing and only the shapes appear.

use super::backend::ImageError;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, LazyLock};

static FONTS: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

/// Rasterize an SVG document into a `width` × `height` RGBA image, scaling
/// the document's own size to fit.
pub fn rasterize_svg(svg: &str, width: u32, height: u32) -> Result<RgbaImage, ImageError> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTS),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| ImageError::Render(format!("invalid svg: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        ImageError::Render(format!("cannot allocate {width}x{height} pixmap"))
    })?;

    let sx = width as f32 / tree.size().width();
    let sy = height as f32 / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let mut image = RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(image)
}

/// Escape text for use inside SVG character data or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG paint attributes for `color`, e.g. `fill="#ff0000" fill-opacity="0.5"`.
pub fn paint(attribute: &str, color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    format!(
        r##"{attribute}="#{r:02x}{g:02x}{b:02x}" {attribute}-opacity="{:.3}""##,
        a as f32 / 255.0
    )
}
