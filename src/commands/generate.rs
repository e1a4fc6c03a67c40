use std::io::Write;

use anyhow::{Context as AnyhowContext, Result};

use crate::config::{Config, StateSource};
use crate::context::Context;
use crate::diagram::{D2CliEngine, Diagram, DiagramServices, HeadlessConverter};
use crate::graph::{GraphOptions, StateGraphBuilder, TerraformStateGraph};
use crate::provider::ProviderRegistry;
use crate::tfcloud::{CancellationToken, StateVersionPoller, SystemClock, TfeClient};

pub struct GenerateCommand;

impl GenerateCommand {
    /// Load Terraform state, build its resource graph and write the d2 diagram
    pub fn execute(
        ctx: &Context,
        config: &Config,
        cancel: CancellationToken,
        stdout: &mut dyn Write,
    ) -> Result<()> {
        ctx.output.section("Terraform diagram");

        let state = Self::load_state(ctx, config, cancel)?;

        let graph = TerraformStateGraph
            .build(&state, &GraphOptions::default())
            .context("Failed to build resource graph from Terraform state")?;
        ctx.output
            .key_value("Resources", &graph.node_count().to_string());
        ctx.output
            .key_value("Connections", &graph.edge_count().to_string());

        let registry = ProviderRegistry::with_defaults();
        let engine = D2CliEngine::new(&config.d2_bin, ctx.command.clone());
        let raster = HeadlessConverter::new(&config.browser_bin, ctx.command.clone());

        let mut diagram = Diagram::new(
            graph,
            &config.output_file,
            config.engine.clone(),
            DiagramServices {
                registry: &registry,
                engine: &engine,
                raster: &raster,
                fs: &*ctx.fs,
            },
        );

        diagram
            .initialize()
            .context("Failed to initialize d2 diagram")?;
        let files = diagram
            .generate(config.dry_run, stdout)
            .context("Failed to generate d2 diagram")?;

        match files {
            Some(files) => {
                ctx.output
                    .key_value("Diagram", &files.image.display().to_string());
                ctx.output
                    .key_value("Script", &files.script.display().to_string());
                ctx.output.success("Diagram generated");
            }
            None => ctx.output.dimmed("Dry run: d2 script printed, no files written"),
        }

        Ok(())
    }

    fn load_state(
        ctx: &Context,
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>> {
        match config.state_source()? {
            StateSource::Local(path) => {
                ctx.output.key_value("State file", &path.display().to_string());
                ctx.fs
                    .read(&path)
                    .with_context(|| format!("Failed to read state file: {}", path.display()))
            }
            StateSource::Remote {
                organization,
                workspace,
                token,
            } => {
                ctx.output.key_value(
                    "Workspace",
                    &format!("{}/{}/{}", config.hostname, organization, workspace),
                );

                let client = TfeClient::new(Some(&config.hostname), Some(&token))?
                    .with_cancellation(cancel.clone());
                let poller = StateVersionPoller::new(&client, &SystemClock, cancel);
                poller
                    .get_state(&organization, &workspace)
                    .context("Failed to fetch remote Terraform state")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use crate::traits::{
        MockCommandExecutor, MockCommandResult, MockFileSystem, MockOutput, OutputMessage,
    };
    use clap::Parser;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    const STATE: &str = include_str!("../../tests/fixtures/simple.tfstate");
    const SVG: &str = "<svg viewBox=\"0 0 640 480\"><text>main</text><text>web</text></svg>";

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["tf2d2", "--state-file", "terraform.tfstate"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        Config::load(&cli, &MockFileSystem::new()).unwrap()
    }

    fn context(
        fs: Arc<MockFileSystem>,
        output: Arc<MockOutput>,
        outputs: Vec<MockCommandResult>,
    ) -> (Context, Arc<MockCommandExecutor>) {
        let executor = Arc::new(MockCommandExecutor::with_outputs(outputs));
        let ctx = Context::test_with(fs, output, executor.clone());
        (ctx, executor)
    }

    #[test]
    fn test_generate_writes_diagram_and_script() {
        let fs = Arc::new(MockFileSystem::new().with_file("terraform.tfstate", STATE));
        let output = Arc::new(MockOutput::new());
        let (ctx, executor) = context(
            fs.clone(),
            output.clone(),
            vec![
                MockCommandResult::success("d2", "v0.6.5"),
                MockCommandResult::success("d2", SVG),
            ],
        );
        let mut stdout = Vec::new();

        GenerateCommand::execute(
            &ctx,
            &config(&["-o", "out/infra.svg"]),
            CancellationToken::new(),
            &mut stdout,
        )
        .unwrap();

        assert!(stdout.is_empty());
        assert_eq!(
            fs.get_file_contents(Path::new("out/infra.svg")).as_deref(),
            Some(SVG)
        );

        let script = fs.get_file_contents(Path::new("out/infra.d2")).unwrap();
        assert!(script.starts_with("aws_vpc_main: \"main\" {"));
        assert!(script.contains("aws_vpc_main -> aws_subnet_private"));
        assert!(script.ends_with("aws_subnet_private -> aws_instance_web"));
        assert!(!script.contains("aws_iam_role"));
        assert!(!script.contains("ubuntu"));

        assert_eq!(executor.calls().len(), 2);
        assert!(output.contains_message(&OutputMessage::KeyValue(
            "Resources".to_string(),
            "4".to_string()
        )));
        assert!(output.has_success());
    }

    #[test]
    fn test_dry_run_prints_script_only() {
        let fs = Arc::new(MockFileSystem::new().with_file("terraform.tfstate", STATE));
        let output = Arc::new(MockOutput::new());
        let (ctx, _) = context(
            fs.clone(),
            output.clone(),
            vec![
                MockCommandResult::success("d2", "v0.6.5"),
                MockCommandResult::success("d2", SVG),
            ],
        );
        let mut stdout = Vec::new();

        GenerateCommand::execute(
            &ctx,
            &config(&["--dry-run"]),
            CancellationToken::new(),
            &mut stdout,
        )
        .unwrap();

        let printed = String::from_utf8(stdout).unwrap();
        assert!(printed.contains("aws_instance_web: \"web\""));
        assert!(printed.ends_with("aws_subnet_private -> aws_instance_web\n"));
        assert_eq!(fs.list_files(), vec![PathBuf::from("terraform.tfstate")]);
        assert!(!output.has_success());
        assert!(output.contains_message(&OutputMessage::Dimmed(
            "Dry run: d2 script printed, no files written".to_string()
        )));
    }

    #[test]
    fn test_missing_state_file() {
        let fs = Arc::new(MockFileSystem::new());
        let output = Arc::new(MockOutput::new());
        let (ctx, executor) = context(fs, output, vec![]);

        let err = GenerateCommand::execute(
            &ctx,
            &config(&[]),
            CancellationToken::new(),
            &mut Vec::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("terraform.tfstate"));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_compile_error_surfaces() {
        let fs = Arc::new(MockFileSystem::new().with_file("terraform.tfstate", STATE));
        let output = Arc::new(MockOutput::new());
        let (ctx, _) = context(
            fs.clone(),
            output,
            vec![
                MockCommandResult::success("d2", "v0.6.5"),
                MockCommandResult::failure("d2", 1, "bad layout"),
            ],
        );

        let err = GenerateCommand::execute(
            &ctx,
            &config(&["--layout", "nope"]),
            CancellationToken::new(),
            &mut Vec::new(),
        )
        .unwrap_err();

        let chain = format!("{:#}", err);
        assert!(chain.contains("error compiling d2 graph: bad layout"));
        assert_eq!(fs.list_files(), vec![PathBuf::from("terraform.tfstate")]);
    }

    #[test]
    fn test_no_source_configured() {
        let ctx = Context::test();
        let config = Config::load(&Cli::default(), &MockFileSystem::new()).unwrap();

        let err =
            GenerateCommand::execute(&ctx, &config, CancellationToken::new(), &mut Vec::new())
                .unwrap_err();
        assert!(err.to_string().contains("state file is required"));
    }
}
