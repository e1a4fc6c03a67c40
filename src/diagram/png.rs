//! SVG to PNG conversion through a headless browser
//!
//! A converter session owns a scratch directory for the browser's input and
//! screenshot. Dropping the session removes it, so every exit path of a
//! conversion releases the browser workspace.

use std::path::Path;
use std::sync::Arc;

use log::debug;
use tempfile::TempDir;

use crate::error::{Result, Tf2d2Error};
use crate::traits::CommandExecutor;

const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 1080;
const SVG_FILE: &str = "diagram.svg";
const PNG_FILE: &str = "diagram.png";

/// Something that can start a PNG conversion session
pub trait RasterBackend {
    fn launch(&self) -> Result<Box<dyn Rasterizer + '_>>;
}

/// A live conversion session, released on drop
pub trait Rasterizer {
    fn svg_to_png(&mut self, svg: &[u8]) -> Result<Vec<u8>>;
}

/// Converter driving a Chromium-compatible browser in headless mode
pub struct HeadlessConverter {
    browser: String,
    command: Arc<dyn CommandExecutor>,
}

impl HeadlessConverter {
    pub fn new(browser: impl Into<String>, command: Arc<dyn CommandExecutor>) -> Self {
        Self {
            browser: browser.into(),
            command,
        }
    }
}

impl RasterBackend for HeadlessConverter {
    fn launch(&self) -> Result<Box<dyn Rasterizer + '_>> {
        let workspace = tempfile::Builder::new()
            .prefix("tf2d2-png")
            .tempdir()
            .map_err(|e| Tf2d2Error::io(std::env::temp_dir(), e))?;

        debug!(browser = self.browser.as_str(), workspace:? = workspace.path(); "launched png converter");

        Ok(Box::new(HeadlessSession {
            converter: self,
            workspace,
        }))
    }
}

struct HeadlessSession<'a> {
    converter: &'a HeadlessConverter,
    workspace: TempDir,
}

impl Rasterizer for HeadlessSession<'_> {
    fn svg_to_png(&mut self, svg: &[u8]) -> Result<Vec<u8>> {
        let svg_path = self.workspace.path().join(SVG_FILE);
        let png_path = self.workspace.path().join(PNG_FILE);

        std::fs::write(&svg_path, svg).map_err(|e| Tf2d2Error::io(&svg_path, e))?;

        let (width, height) = viewbox_size(svg).unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT));
        let screenshot = format!("--screenshot={}", png_path.display());
        let window = format!("--window-size={},{}", width, height);
        let url = file_url(&svg_path);
        let args = [
            "--headless",
            "--disable-gpu",
            "--hide-scrollbars",
            screenshot.as_str(),
            window.as_str(),
            url.as_str(),
        ];

        let browser = self.converter.browser.as_str();
        let output = self
            .converter
            .command
            .execute(browser, &args, self.workspace.path())
            .map_err(|e| Tf2d2Error::io(browser, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Tf2d2Error::io(
                browser,
                std::io::Error::other(format!("headless screenshot failed: {}", stderr.trim())),
            ));
        }

        std::fs::read(&png_path).map_err(|e| Tf2d2Error::io(&png_path, e))
    }
}

impl Drop for HeadlessSession<'_> {
    fn drop(&mut self) {
        debug!(workspace:? = self.workspace.path(); "released png converter");
    }
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// Width and height from the root `viewBox`, rounded up
fn viewbox_size(svg: &[u8]) -> Option<(u32, u32)> {
    let text = std::str::from_utf8(svg).ok()?;
    let start = text.find("viewBox=\"")? + "viewBox=\"".len();
    let end = start + text[start..].find('"')?;

    let values: Vec<f64> = text[start..end]
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match values.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((w.ceil() as u32, h.ceil() as u32)),
        _ => None,
    }
}
