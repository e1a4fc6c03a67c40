use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use super::assembler::DiagramSource;
use super::engine::{CompiledDiagram, DiagramEngine};
use super::png::RasterBackend;
use crate::error::{Result, Tf2d2Error};
use crate::traits::FileSystem;

const SCRIPT_EXTENSION: &str = "d2";

/// Image format selected by the output path's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    /// `png` when asked for explicitly, `svg` for anything else
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => ImageFormat::Png,
            _ => ImageFormat::Svg,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Paths written by a normal (non dry-run) write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub image: PathBuf,
    pub script: PathBuf,
    pub format: ImageFormat,
}

impl OutputFiles {
    pub fn for_path(path: &Path) -> Self {
        let format = ImageFormat::from_path(path);
        Self {
            image: path.with_extension(format.extension()),
            script: path.with_extension(SCRIPT_EXTENSION),
            format,
        }
    }
}

/// Writes a generated diagram to disk, or its script to a stream on dry-run
pub struct OutputWriter<'a> {
    fs: &'a dyn FileSystem,
    engine: &'a dyn DiagramEngine,
    raster: &'a dyn RasterBackend,
}

impl<'a> OutputWriter<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        engine: &'a dyn DiagramEngine,
        raster: &'a dyn RasterBackend,
    ) -> Self {
        Self { fs, engine, raster }
    }

    /// Write the image then the script next to it.
    ///
    /// On dry-run the script text goes to `stdout` and nothing touches the
    /// filesystem. A failed script write leaves an already written image in
    /// place.
    pub fn write(
        &self,
        source: &DiagramSource,
        compiled: &CompiledDiagram,
        path: &Path,
        dry_run: bool,
        stdout: &mut dyn Write,
    ) -> Result<Option<OutputFiles>> {
        if dry_run {
            writeln!(stdout, "{}", source).map_err(|e| Tf2d2Error::io("<stdout>", e))?;
            return Ok(None);
        }

        let files = OutputFiles::for_path(path);
        let image = self.render_image(compiled, files.format)?;

        self.fs
            .write_bytes(&files.image, &image)
            .map_err(|e| Tf2d2Error::io(&files.image, e))?;
        self.fs
            .write(&files.script, source.as_str())
            .map_err(|e| Tf2d2Error::io(&files.script, e))?;

        info!(diagram:? = files.image, script:? = files.script; "output files");

        Ok(Some(files))
    }

    fn render_image(&self, compiled: &CompiledDiagram, format: ImageFormat) -> Result<Vec<u8>> {
        let svg = self.engine.render_svg(compiled)?;

        match format {
            ImageFormat::Svg => Ok(svg),
            ImageFormat::Png => {
                let mut session = self.raster.launch()?;
                session.svg_to_png(&svg)
            }
        }
    }
}
