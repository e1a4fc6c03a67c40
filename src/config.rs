//! Configuration layering: command-line flags and environment variables
//! override the YAML config file, which overrides built-in defaults.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::diagram::EngineOptions;
use crate::error::{Result, Tf2d2Error};
use crate::tfcloud::client::DEFAULT_HOSTNAME;
use crate::traits::FileSystem;

pub const CONFIG_FILE: &str = ".tf2d2.yaml";

/// Default config file names, in lookup order within a directory
const CONFIG_FILE_NAMES: [&str; 2] = [CONFIG_FILE, ".tf2d2.yml"];

const DEFAULT_OUTPUT_FILE: &str = "diagram.svg";
const DEFAULT_D2_BIN: &str = "d2";
const DEFAULT_BROWSER_BIN: &str = "chromium";

#[derive(Parser, Debug, Default)]
#[command(name = "tf2d2")]
#[command(about = "Generate d2 diagrams from Terraform state", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default is .tf2d2.yaml or .tf2d2.yml in the home or current directory)
    #[arg(short, long, env = "TF2D2_CONFIG")]
    pub config: Option<PathBuf>,

    /// Terraform Cloud / Enterprise hostname
    #[arg(long = "host", env = "TF_HOSTNAME")]
    pub hostname: Option<String>,

    /// Terraform organization name
    #[arg(long = "org", env = "TF_ORGANIZATION")]
    pub organization: Option<String>,

    /// Terraform workspace name
    #[arg(short, long, env = "TF_WORKSPACE")]
    pub workspace: Option<String>,

    /// Terraform API token; remote state is fetched when set
    #[arg(long, env = "TF_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to a local Terraform state file
    #[arg(long, env = "TF_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Diagram output file; use a .png extension for PNG output
    #[arg(short, long, env = "TF_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the d2 script to stdout without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// d2 layout engine
    #[arg(long)]
    pub layout: Option<String>,

    /// d2 theme id
    #[arg(long)]
    pub theme: Option<u32>,

    /// Padding around the rendered diagram, in pixels
    #[arg(long)]
    pub pad: Option<u32>,

    /// d2 executable
    #[arg(long, env = "TF2D2_D2_BIN")]
    pub d2_bin: Option<String>,

    /// Headless browser used for PNG output
    #[arg(long, env = "TF2D2_BROWSER_BIN")]
    pub browser_bin: Option<String>,
}

/// Contents of a `.tf2d2.yaml` file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub hostname: Option<String>,
    pub organization: Option<String>,
    pub workspace: Option<String>,
    pub token: Option<String>,
    pub state_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
    pub layout: Option<String>,
    pub theme: Option<u32>,
    pub pad: Option<u32>,
    pub d2_bin: Option<String>,
    pub browser_bin: Option<String>,
}

impl FileConfig {
    pub fn from_file(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| Tf2d2Error::io(path, e))?;

        serde_yaml::from_str(&content).map_err(|e| {
            Tf2d2Error::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}

/// Where Terraform state comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSource {
    Remote {
        organization: String,
        workspace: String,
        token: String,
    },
    Local(PathBuf),
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub hostname: String,
    pub organization: Option<String>,
    pub workspace: Option<String>,
    pub token: Option<String>,
    pub state_file: Option<PathBuf>,
    pub output_file: PathBuf,
    pub verbose: bool,
    pub dry_run: bool,
    pub engine: EngineOptions,
    pub d2_bin: String,
    pub browser_bin: String,
    /// Config file that was loaded, if any
    pub source_file: Option<PathBuf>,
}

impl Config {
    /// Resolve settings from the command line and the config file it points at
    pub fn load(cli: &Cli, fs: &dyn FileSystem) -> Result<Self> {
        let (file, source_file) = match &cli.config {
            Some(path) => (FileConfig::from_file(fs, path)?, Some(path.clone())),
            None => match Self::find_default(fs) {
                Some(path) => (FileConfig::from_file(fs, &path)?, Some(path)),
                None => (FileConfig::default(), None),
            },
        };

        let mut config = Self::merge(cli, file);
        config.source_file = source_file;
        Ok(config)
    }

    /// First default config file found in the home directory, then the current one
    fn find_default(fs: &dyn FileSystem) -> Option<PathBuf> {
        let directories = dirs::home_dir()
            .into_iter()
            .chain(std::iter::once(PathBuf::new()));

        directories
            .flat_map(|dir| CONFIG_FILE_NAMES.map(|name| dir.join(name)))
            .find(|path| fs.exists(path))
    }

    fn merge(cli: &Cli, file: FileConfig) -> Self {
        let defaults = EngineOptions::default();

        Self {
            hostname: cli
                .hostname
                .clone()
                .or(file.hostname)
                .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string()),
            organization: cli.organization.clone().or(file.organization),
            workspace: cli.workspace.clone().or(file.workspace),
            token: cli.token.clone().or(file.token).filter(|t| !t.is_empty()),
            state_file: cli.state_file.clone().or(file.state_file),
            output_file: cli
                .output_file
                .clone()
                .or(file.output_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            verbose: cli.verbose || file.verbose.unwrap_or(false),
            dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
            engine: EngineOptions {
                layout: cli.layout.clone().or(file.layout).unwrap_or(defaults.layout),
                pad: cli.pad.or(file.pad).unwrap_or(defaults.pad),
                theme: cli.theme.or(file.theme).unwrap_or(defaults.theme),
            },
            d2_bin: cli
                .d2_bin
                .clone()
                .or(file.d2_bin)
                .unwrap_or_else(|| DEFAULT_D2_BIN.to_string()),
            browser_bin: cli
                .browser_bin
                .clone()
                .or(file.browser_bin)
                .unwrap_or_else(|| DEFAULT_BROWSER_BIN.to_string()),
            source_file: None,
        }
    }

    /// Remote when a token is configured, otherwise a local state file
    pub fn state_source(&self) -> Result<StateSource> {
        if let Some(token) = &self.token {
            let organization = self.organization.clone().ok_or_else(|| {
                Tf2d2Error::Config("organization is required for remote state".to_string())
            })?;
            let workspace = self.workspace.clone().ok_or_else(|| {
                Tf2d2Error::Config("workspace is required for remote state".to_string())
            })?;

            return Ok(StateSource::Remote {
                organization,
                workspace,
                token: token.clone(),
            });
        }

        self.state_file
            .clone()
            .map(StateSource::Local)
            .ok_or_else(|| {
                Tf2d2Error::Config(
                    "either a Terraform API token or a state file is required".to_string(),
                )
            })
    }
}
