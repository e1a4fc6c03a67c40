use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use super::assembler::DiagramSource;
use crate::error::{Result, Tf2d2Error};
use crate::traits::CommandExecutor;

const INPUT_FILE: &str = "input.d2";

/// Layout and render settings handed to the diagram engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub layout: String,
    pub pad: u32,
    pub theme: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            layout: "dagre".to_string(),
            pad: 100,
            theme: 0,
        }
    }
}

/// Engine output after a successful compile, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDiagram {
    svg: Vec<u8>,
}

impl CompiledDiagram {
    pub fn new(svg: Vec<u8>) -> Self {
        Self { svg }
    }

    pub fn svg_bytes(&self) -> &[u8] {
        &self.svg
    }
}

/// External engine that lays out and renders d2 scripts
pub trait DiagramEngine {
    /// Verify the engine can be used before any generation runs
    fn check_available(&self) -> Result<()>;

    /// Compile d2 script text
    fn compile(&self, source: &DiagramSource, options: &EngineOptions)
    -> Result<CompiledDiagram>;

    /// Render a compiled diagram to SVG bytes
    fn render_svg(&self, compiled: &CompiledDiagram) -> Result<Vec<u8>>;
}

/// Diagram engine backed by the `d2` command line tool
pub struct D2CliEngine {
    binary: String,
    command: Arc<dyn CommandExecutor>,
}

impl D2CliEngine {
    pub fn new(binary: impl Into<String>, command: Arc<dyn CommandExecutor>) -> Self {
        Self {
            binary: binary.into(),
            command,
        }
    }

    fn compile_args<'a>(
        options: &'a EngineOptions,
        pad: &'a str,
        theme: &'a str,
        input: &'a str,
    ) -> Vec<&'a str> {
        vec![
            "--layout",
            options.layout.as_str(),
            "--pad",
            pad,
            "--theme",
            theme,
            input,
            "-",
        ]
    }
}

impl DiagramEngine for D2CliEngine {
    fn check_available(&self) -> Result<()> {
        let output = self
            .command
            .execute(&self.binary, &["--version"], Path::new("."))
            .map_err(|e| Tf2d2Error::io(&self.binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Tf2d2Error::io(
                &self.binary,
                std::io::Error::other(format!("version probe failed: {}", stderr.trim())),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!(binary = self.binary.as_str(), version = version.trim(); "using d2 engine");
        Ok(())
    }

    fn compile(
        &self,
        source: &DiagramSource,
        options: &EngineOptions,
    ) -> Result<CompiledDiagram> {
        let workspace =
            tempfile::tempdir().map_err(|e| Tf2d2Error::io(std::env::temp_dir(), e))?;
        let input = workspace.path().join(INPUT_FILE);
        std::fs::write(&input, source.as_str()).map_err(|e| Tf2d2Error::io(&input, e))?;

        let pad = options.pad.to_string();
        let theme = options.theme.to_string();
        let input_arg = input.to_string_lossy();
        let args = Self::compile_args(options, &pad, &theme, &input_arg);

        debug!(binary = self.binary.as_str(), args:? = args; "compiling d2 graph");

        let output = self
            .command
            .execute(&self.binary, &args, workspace.path())
            .map_err(|e| Tf2d2Error::Compile(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Tf2d2Error::Compile(stderr.trim().to_string()));
        }

        if output.stdout.is_empty() {
            return Err(Tf2d2Error::Compile(format!(
                "{} produced no output",
                self.binary
            )));
        }

        Ok(CompiledDiagram::new(output.stdout))
    }

    fn render_svg(&self, compiled: &CompiledDiagram) -> Result<Vec<u8>> {
        Ok(compiled.svg_bytes().to_vec())
    }
}
