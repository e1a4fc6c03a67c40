//! d2 diagram generation from a resource graph
//!
//! [`Diagram`] drives one generation: assemble the d2 script, compile it
//! through a [`DiagramEngine`], then hand the result to the [`OutputWriter`].

pub mod assembler;
pub mod engine;
pub mod png;
pub mod template;
pub mod writer;

pub use assembler::DiagramAssembler;
pub use engine::{D2CliEngine, DiagramEngine, EngineOptions};
pub use png::{HeadlessConverter, RasterBackend};
pub use writer::{OutputFiles, OutputWriter};

use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::error::{Result, Tf2d2Error};
use crate::graph::ResourceGraph;
use crate::provider::ProviderRegistry;
use crate::traits::FileSystem;

/// Lifecycle of a [`Diagram`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramState {
    Uninitialized,
    Initialized,
    Generated,
}

/// Collaborators a diagram needs to turn a graph into files
pub struct DiagramServices<'a> {
    pub registry: &'a ProviderRegistry,
    pub engine: &'a dyn DiagramEngine,
    pub raster: &'a dyn RasterBackend,
    pub fs: &'a dyn FileSystem,
}

/// Single-use diagram for one resource graph
pub struct Diagram<'a> {
    graph: ResourceGraph,
    path: PathBuf,
    options: EngineOptions,
    services: DiagramServices<'a>,
    state: DiagramState,
}

impl<'a> Diagram<'a> {
    pub fn new(
        graph: ResourceGraph,
        path: impl Into<PathBuf>,
        options: EngineOptions,
        services: DiagramServices<'a>,
    ) -> Self {
        Self {
            graph,
            path: path.into(),
            options,
            services,
            state: DiagramState::Uninitialized,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> DiagramState {
        self.state
    }

    /// Check the engine and lock in compile settings
    pub fn initialize(&mut self) -> Result<()> {
        self.services.engine.check_available()?;
        self.state = DiagramState::Initialized;

        info!(
            layout = self.options.layout.as_str(),
            pad = self.options.pad,
            theme = self.options.theme;
            "initialized d2 diagram"
        );
        Ok(())
    }

    /// Assemble, compile and write the diagram.
    ///
    /// Nothing is written unless assembly and compilation both succeed.
    pub fn generate(
        &mut self,
        dry_run: bool,
        stdout: &mut dyn Write,
    ) -> Result<Option<OutputFiles>> {
        if self.state == DiagramState::Uninitialized {
            return Err(Tf2d2Error::NotInitialized);
        }

        let assembler = DiagramAssembler::new(self.services.registry)?;
        let source = assembler.assemble(&self.graph)?;
        let compiled = self.services.engine.compile(&source, &self.options)?;
        info!("generated d2 diagram");

        let writer = OutputWriter::new(
            self.services.fs,
            self.services.engine,
            self.services.raster,
        );
        let files = writer.write(&source, &compiled, &self.path, dry_run, stdout)?;

        self.state = DiagramState::Generated;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::writer::tests::{CountingRaster, EchoEngine};
    use super::*;
    use crate::diagram::assembler::DiagramSource;
    use crate::diagram::engine::CompiledDiagram;
    use crate::graph::{Edge, Node};
    use crate::traits::MockFileSystem;
    use std::path::Path;

    struct BrokenEngine;

    impl DiagramEngine for BrokenEngine {
        fn check_available(&self) -> Result<()> {
            Ok(())
        }

        fn compile(&self, _: &DiagramSource, _: &EngineOptions) -> Result<CompiledDiagram> {
            Err(Tf2d2Error::Compile("syntax error".to_string()))
        }

        fn render_svg(&self, _: &CompiledDiagram) -> Result<Vec<u8>> {
            unreachable!("nothing compiles")
        }
    }

    struct MissingEngine;

    impl DiagramEngine for MissingEngine {
        fn check_available(&self) -> Result<()> {
            Err(Tf2d2Error::io(
                "d2",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ))
        }

        fn compile(&self, _: &DiagramSource, _: &EngineOptions) -> Result<CompiledDiagram> {
            unreachable!("never initialized")
        }

        fn render_svg(&self, _: &CompiledDiagram) -> Result<Vec<u8>> {
            unreachable!("never initialized")
        }
    }

    fn vpc_graph() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph.add_node(Node::new("aws_vpc.foo", "aws_vpc.foo", "foo", "aws_vpc"));
        graph.add_node(Node::new("aws_vpc.bar", "aws_vpc.bar", "bar", "aws_vpc"));
        graph.add_edge(Edge::new("aws_vpc.foo", "aws_vpc.bar"));
        graph
    }

    fn services<'a>(
        registry: &'a ProviderRegistry,
        engine: &'a dyn DiagramEngine,
        raster: &'a CountingRaster,
        fs: &'a MockFileSystem,
    ) -> DiagramServices<'a> {
        DiagramServices {
            registry,
            engine,
            raster,
            fs,
        }
    }

    #[test]
    fn test_generate_requires_initialize() {
        let registry = ProviderRegistry::with_defaults();
        let raster = CountingRaster::default();
        let fs = MockFileSystem::new();
        let mut diagram = Diagram::new(
            vpc_graph(),
            "out.svg",
            EngineOptions::default(),
            services(&registry, &EchoEngine, &raster, &fs),
        );

        let err = diagram.generate(false, &mut Vec::new()).unwrap_err();

        assert!(matches!(err, Tf2d2Error::NotInitialized));
        assert_eq!(diagram.state(), DiagramState::Uninitialized);
        assert!(fs.list_files().is_empty());
    }

    #[test]
    fn test_initialize_fails_when_engine_missing() {
        let registry = ProviderRegistry::with_defaults();
        let raster = CountingRaster::default();
        let fs = MockFileSystem::new();
        let mut diagram = Diagram::new(
            vpc_graph(),
            "out.svg",
            EngineOptions::default(),
            services(&registry, &MissingEngine, &raster, &fs),
        );

        let err = diagram.initialize().unwrap_err();

        assert!(matches!(err, Tf2d2Error::Io { .. }));
        assert_eq!(diagram.state(), DiagramState::Uninitialized);
    }

    #[test]
    fn test_generate_end_to_end() {
        let registry = ProviderRegistry::with_defaults();
        let raster = CountingRaster::default();
        let fs = MockFileSystem::new();
        let mut diagram = Diagram::new(
            vpc_graph(),
            "out/infra.svg",
            EngineOptions::default(),
            services(&registry, &EchoEngine, &raster, &fs),
        );

        diagram.initialize().unwrap();
        assert_eq!(diagram.state(), DiagramState::Initialized);

        let files = diagram.generate(false, &mut Vec::new()).unwrap().unwrap();
        assert_eq!(diagram.state(), DiagramState::Generated);

        assert_eq!(fs.list_files().len(), 2);
        let script = fs.get_file_contents(&files.script).unwrap();
        assert!(script.contains("aws_vpc_foo -> aws_vpc_bar"));

        let image = fs.get_file_contents(&files.image).unwrap();
        assert!(image.contains("\"foo\""));
        assert!(image.contains("\"bar\""));
        assert_eq!(files.image, Path::new("out/infra.svg"));
        assert_eq!(files.script, Path::new("out/infra.d2"));
    }

    #[test]
    fn test_dry_run_is_deterministic() {
        let registry = ProviderRegistry::with_defaults();
        let raster = CountingRaster::default();
        let fs = MockFileSystem::new();
        let mut diagram = Diagram::new(
            vpc_graph(),
            "out.svg",
            EngineOptions::default(),
            services(&registry, &EchoEngine, &raster, &fs),
        );
        diagram.initialize().unwrap();

        let mut first = Vec::new();
        let mut second = Vec::new();
        assert!(diagram.generate(true, &mut first).unwrap().is_none());
        assert!(diagram.generate(true, &mut second).unwrap().is_none());

        assert_eq!(first, second);
        assert!(first.ends_with(b"\n"));
        assert!(fs.list_files().is_empty());
    }

    #[test]
    fn test_compile_error_writes_nothing() {
        let registry = ProviderRegistry::with_defaults();
        let raster = CountingRaster::default();
        let fs = MockFileSystem::new();
        let mut diagram = Diagram::new(
            vpc_graph(),
            "out.svg",
            EngineOptions::default(),
            services(&registry, &BrokenEngine, &raster, &fs),
        );
        diagram.initialize().unwrap();

        let err = diagram.generate(false, &mut Vec::new()).unwrap_err();

        assert_eq!(err.to_string(), "error compiling d2 graph: syntax error");
        assert!(fs.list_files().is_empty());
        assert_eq!(diagram.state(), DiagramState::Initialized);
    }

    #[test]
    fn test_empty_graph_fails_before_compile() {
        let registry = ProviderRegistry::with_defaults();
        let raster = CountingRaster::default();
        let fs = MockFileSystem::new();
        let mut diagram = Diagram::new(
            ResourceGraph::new(),
            "out.svg",
            EngineOptions::default(),
            services(&registry, &BrokenEngine, &raster, &fs),
        );
        diagram.initialize().unwrap();

        let err = diagram.generate(false, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "no shapes found");
    }
}
