//! SVG encoding of drawn surfaces.
//!
//! [`embedded_svg`] wraps a PNG snapshot; [`vector_svg`] traces the module
//! grid. Both are sized to match the surface.

use simple_xml_builder::XMLElement;

use crate::error::Result;
use crate::render::{module_corners, GridLayout, ModuleGrid, Surface};
use crate::types::{Colour, DotShape, FrameShape, RenderOptions};

use super::png::png_data_uri;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn svg_root(width: u32, height: u32) -> XMLElement {
    let mut root = XMLElement::new("svg");
    root.add_attribute("width", &width.to_string());
    root.add_attribute("height", &height.to_string());
    root.add_attribute("viewBox", &format!("0 0 {} {}", width, height));
    root.add_attribute("xmlns", SVG_NS);
    root
}

fn desc(text: &str) -> XMLElement {
    let mut desc = XMLElement::new("desc");
    desc.add_text(text);
    desc
}

/// A minimal SVG holding one `<image>` with the surface as a PNG data URI.
/// Looks identical to the PNG export but does not scale.
pub fn embedded_svg(surface: &Surface) -> Result<String> {
    let (width, height) = (surface.width(), surface.height());
    let mut root = svg_root(width, height);
    root.add_child(desc(
        "Raster snapshot of the rendered code; scaling will not add detail.",
    ));

    let mut image = XMLElement::new("image");
    image.add_attribute("href", &png_data_uri(&surface.image)?);
    image.add_attribute("width", &width.to_string());
    image.add_attribute("height", &height.to_string());
    root.add_child(image);

    Ok(root.to_string())
}

/// Trace the module grid into SVG shapes.
///
/// Returns `None` when the surface has no grid to trace or carries a logo,
/// which cannot be expressed as paths.
pub fn vector_svg(surface: &Surface) -> Option<String> {
    let grid = surface.grid.as_ref()?;
    if surface.options.logo.is_some() {
        return None;
    }
    let layout = surface.layout()?;
    let options = &surface.options;
    let (width, height) = (surface.width(), surface.height());

    let mut root = svg_root(width, height);
    root.add_child(desc("Vector trace of the code's module grid."));

    let mut background = XMLElement::new("rect");
    background.add_attribute("width", &width.to_string());
    background.add_attribute("height", &height.to_string());
    paint(&mut background, "fill", options.background_options);
    root.add_child(background);

    root.add_child(trace_modules(grid, layout, options));
    for (ox, oy) in grid.finder_origins() {
        let x = layout.offset + ox as f32 * layout.module_px;
        let y = layout.offset + oy as f32 * layout.module_px;
        root.add_child(finder_frame(options, x, y, layout.module_px));
        root.add_child(finder_dot(options, x, y, layout.module_px));
    }

    Some(root.to_string())
}

fn trace_modules(grid: &ModuleGrid, layout: GridLayout, options: &RenderOptions) -> XMLElement {
    let mut group = XMLElement::new("g");
    paint(&mut group, "fill", options.dots_options.color);

    let s = layout.module_px;
    for (mx, my) in grid.dark_modules() {
        if grid.finder_at(mx, my).is_some() {
            continue;
        }
        let x = layout.offset + mx as f32 * s;
        let y = layout.offset + my as f32 * s;
        let element = match module_corners(options.dots_options.shape, grid.neighbours(mx, my)) {
            None => circle(x + s / 2.0, y + s / 2.0, s / 2.0),
            Some(radii) if radii == [0.0; 4] => rect(x, y, s, s),
            Some(radii) => {
                let mut path = XMLElement::new("path");
                path.add_attribute("d", &rounded_rect(x, y, s, s, radii.map(|r| r * s)));
                path
            }
        };
        group.add_child(element);
    }
    group
}

fn finder_frame(options: &RenderOptions, x: f32, y: f32, s: f32) -> XMLElement {
    let colour = options.corners_square_options.color;
    match options.corners_square_options.shape {
        FrameShape::Square => {
            let d = format!(
                "{} {}",
                rounded_rect(x, y, 7.0 * s, 7.0 * s, [0.0; 4]),
                rounded_rect(x + s, y + s, 5.0 * s, 5.0 * s, [0.0; 4])
            );
            ring_path(&d, colour)
        }
        FrameShape::ExtraRounded => {
            let d = format!(
                "{} {}",
                rounded_rect(x, y, 7.0 * s, 7.0 * s, [2.5 * s; 4]),
                rounded_rect(x + s, y + s, 5.0 * s, 5.0 * s, [1.5 * s; 4])
            );
            ring_path(&d, colour)
        }
        FrameShape::Dot => {
            let mut ring = circle(x + 3.5 * s, y + 3.5 * s, 3.0 * s);
            ring.add_attribute("fill", "none");
            paint(&mut ring, "stroke", colour);
            ring.add_attribute("stroke-width", &num(s));
            ring
        }
    }
}

fn finder_dot(options: &RenderOptions, x: f32, y: f32, s: f32) -> XMLElement {
    let mut element = match options.corners_dot_options.shape {
        DotShape::Square => rect(x + 2.0 * s, y + 2.0 * s, 3.0 * s, 3.0 * s),
        DotShape::Dot => circle(x + 3.5 * s, y + 3.5 * s, 1.5 * s),
    };
    paint(&mut element, "fill", options.corners_dot_options.color);
    element
}

fn ring_path(d: &str, colour: Colour) -> XMLElement {
    let mut path = XMLElement::new("path");
    path.add_attribute("d", d);
    path.add_attribute("fill-rule", "evenodd");
    paint(&mut path, "fill", colour);
    path
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> XMLElement {
    let mut rect = XMLElement::new("rect");
    rect.add_attribute("x", &num(x));
    rect.add_attribute("y", &num(y));
    rect.add_attribute("width", &num(w));
    rect.add_attribute("height", &num(h));
    rect
}

fn circle(cx: f32, cy: f32, r: f32) -> XMLElement {
    let mut circle = XMLElement::new("circle");
    circle.add_attribute("cx", &num(cx));
    circle.add_attribute("cy", &num(cy));
    circle.add_attribute("r", &num(r));
    circle
}

/// Path data for a rectangle with per-corner radii, clockwise from top-left.
fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radii: [f32; 4]) -> String {
    let [tl, tr, br, bl] = radii;
    let arc = |r: f32, ex: f32, ey: f32| {
        if r > 0.0 {
            format!("A{r} {r} 0 0 1 {} {}", num(ex), num(ey), r = num(r))
        } else {
            format!("L{} {}", num(ex), num(ey))
        }
    };
    format!(
        "M{} {} H{} {} V{} {} H{} {} V{} {} Z",
        num(x + tl),
        num(y),
        num(x + w - tr),
        arc(tr, x + w, y + tr),
        num(y + h - br),
        arc(br, x + w - br, y + h),
        num(x + bl),
        arc(bl, x, y + h - bl),
        num(y + tl),
        arc(tl, x + tl, y),
    )
}

/// Set a paint attribute, with an opacity attribute for translucent colours.
fn paint(element: &mut XMLElement, attribute: &str, colour: Colour) {
    element.add_attribute(attribute, &colour.to_rgb_hex());
    if !colour.is_opaque() {
        element.add_attribute(&format!("{}-opacity", attribute), &num(colour.opacity()));
    }
}

/// Shortest decimal form, to three places.
fn num(value: f32) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-0" => "0".to_string(),
        t => t.to_string(),
    }
}
