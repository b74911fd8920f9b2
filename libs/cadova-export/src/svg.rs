//! # SVG Writer
//!
//! Serializes a 2D polygon set as a single-path SVG document. The Y axis
//! is flipped relative to the model coordinate system so the document
//! reads the usual way up.

use cadova_core::ModelOptions;
use cadova_kernel::PolygonSet;
use cadova_math::BoundingBox2;
use glam::DVec2;

/// Renders a polygon set as an SVG document string.
pub fn svg_document(set: &PolygonSet, options: &ModelOptions) -> String {
    let bounds = flipped_bounds(set);
    let (origin, size) = if bounds.is_empty() {
        (DVec2::ZERO, DVec2::ZERO)
    } else {
        (bounds.minimum, bounds.size())
    };

    let mut document = String::new();
    document.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    document.push('\n');
    document.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        number(origin.x),
        number(origin.y),
        number(size.x),
        number(size.y),
    ));
    document.push('\n');

    if let Some(title) = &options.metadata.title {
        document.push_str(&format!("  <title>{}</title>\n", escape(title)));
    }
    if let Some(description) = &options.metadata.description {
        document.push_str(&format!("  <desc>{}</desc>\n", escape(description)));
    }

    document.push_str(&format!("  <path fill=\"black\" d=\"{}\"/>\n", path_data(set)));
    document.push_str("</svg>\n");
    document
}

fn flipped_bounds(set: &PolygonSet) -> BoundingBox2 {
    let mut bounds = BoundingBox2::EMPTY;
    for contour in set.contours() {
        for &point in contour.points() {
            bounds = bounds.including(DVec2::new(point.x, -point.y));
        }
    }
    bounds
}

/// One `M x,y x,y ...` subpath per contour, Y negated.
fn path_data(set: &PolygonSet) -> String {
    let mut data = String::new();
    for contour in set.contours() {
        if contour.is_empty() {
            continue;
        }
        if !data.is_empty() {
            data.push(' ');
        }
        data.push('M');
        for point in contour.points() {
            data.push(' ');
            data.push_str(&format!("{},{}", number(point.x), number(-point.y)));
        }
        data.push_str(" Z");
    }
    data
}

fn number(value: f64) -> String {
    // Trim trailing zeros so documents stay stable and compact.
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadova_kernel::primitives::rectangle;

    #[test]
    fn test_viewbox_is_flipped_bounds() {
        let set = rectangle(DVec2::new(4.0, 2.0)).unwrap();
        let document = svg_document(&set, &ModelOptions::default());
        // Y flip maps 0..2 to -2..0.
        assert!(document.contains(r#"viewBox="0 -2 4 2""#), "{document}");
        assert!(document.contains(r#"fill="black""#));
    }

    #[test]
    fn test_one_subpath_per_contour() {
        let set = cadova_kernel::primitives::polygon(
            &[
                DVec2::ZERO,
                DVec2::new(4.0, 0.0),
                DVec2::new(4.0, 4.0),
                DVec2::new(0.0, 4.0),
            ],
            &[vec![
                DVec2::new(1.0, 1.0),
                DVec2::new(3.0, 1.0),
                DVec2::new(3.0, 3.0),
                DVec2::new(1.0, 3.0),
            ]],
        )
        .unwrap();
        let document = svg_document(&set, &ModelOptions::default());
        assert_eq!(document.matches('M').count(), 2);
    }

    #[test]
    fn test_metadata_elements() {
        let mut options = ModelOptions::default();
        options.metadata.title = Some("gasket <3".into());
        options.metadata.description = Some("flat seal".into());
        let set = rectangle(DVec2::ONE).unwrap();
        let document = svg_document(&set, &options);
        assert!(document.contains("<title>gasket &lt;3</title>"));
        assert!(document.contains("<desc>flat seal</desc>"));
    }
}
