//! In-test generated pages, images and gzip bodies.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use image::{ImageBuffer, ImageFormat, Rgb};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A small valid JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = ImageBuffer::from_fn(8, 8, |x, y| {
        Rgb([u8::try_from(x * 30).unwrap(), u8::try_from(y * 30).unwrap(), 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

/// Gzip-compresses `data`.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// HTML page with a slideshow listing `image_urls` in order.
pub fn slideshow_page(image_urls: &[String]) -> String {
    let entries: Vec<String> = image_urls
        .iter()
        .enumerate()
        .map(|(i, url)| format!(r#"{{"medium":"{url}?w=1200","strapline":"caption {i}"}}"#))
        .collect();
    format!(
        r#"<html><head><title>Guide</title></head><body>
<div class="slideshow js-slideshow" data-lp-initial-images='[{}]'></div>
</body></html>"#,
        entries.join(",")
    )
}

/// Mounts a page at `page_path` whose slideshow points at `image_paths` on the same server.
pub async fn mount_page(server: &MockServer, page_path: &str, image_paths: &[&str]) {
    let urls: Vec<String> = image_paths
        .iter()
        .map(|p| format!("{}{p}", server.uri()))
        .collect();
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(slideshow_page(&urls)),
        )
        .mount(server)
        .await;
}

/// Mounts a JPEG at `image_path`.
pub async fn mount_jpeg(server: &MockServer, image_path: &str) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(jpeg_bytes()),
        )
        .mount(server)
        .await;
}

/// A localhost port with nothing listening on it.
pub fn unused_local_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
