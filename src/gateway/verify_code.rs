//! Captcha code issuing.
//!
//! Codes are alphanumeric and drawn as an SVG with per-glyph jitter and a few
//! noise lines. The code is stored in the session before the image leaves.

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};
use rand::{distributions::Alphanumeric, Rng};
use std::fmt::Write;

const WIDTH: u32 = 120;
const HEIGHT: u32 = 40;
const NOISE_LINES: usize = 5;

/// Random alphanumeric code of `length` characters.
pub fn generate_code(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Draw `code` as an SVG, one `<text>` element per character.
pub fn render_svg(code: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' viewBox='0 0 {w} {h}'>\
         <rect width='100%' height='100%' fill='#f4f4f4'/>",
        w = WIDTH,
        h = HEIGHT
    );

    for _ in 0..NOISE_LINES {
        let _ = write!(
            svg,
            "<line x1='{}' y1='{}' x2='{}' y2='{}' stroke='#{:06x}' stroke-width='1'/>",
            rng.gen_range(0..WIDTH),
            rng.gen_range(0..HEIGHT),
            rng.gen_range(0..WIDTH),
            rng.gen_range(0..HEIGHT),
            rng.gen_range(0x404040..0xb0b0b0u32),
        );
    }

    let step = WIDTH / (code.chars().count() as u32 + 1);
    for (i, ch) in code.chars().enumerate() {
        let x = step * (i as u32 + 1);
        let y = rng.gen_range(26..32);
        let angle: i32 = rng.gen_range(-25..=25);
        let _ = write!(
            svg,
            "<text x='{x}' y='{y}' transform='rotate({angle} {x} {y})' \
             font-family='monospace' font-size='24' text-anchor='middle' fill='#{:06x}'>{ch}</text>",
            rng.gen_range(0x101010..0x606060u32),
        );
    }

    svg.push_str("</svg>");
    svg
}

/// Uncacheable `image/svg+xml` response carrying `code`.
pub fn image_response(code: &str) -> Response {
    let mut response = Response::new(Body::from(render_svg(code)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
