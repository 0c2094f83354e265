pub mod batch;
pub mod completions;
pub mod describe;
pub mod init;
pub mod patterns;
pub mod render;
pub mod validate;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::error::{QrError, Result};
use crate::export::{ExportArtifact, ExportFormat, Exporter, SvgMode};
use crate::output::{display_path, Printer};
use crate::render::{DisplayTarget, RasterRenderer};
use crate::sync::DescriptorSynchronizer;
use crate::types::{DescriptorFile, StyleDescriptor};

/// qrstyle - Styled QR codes from declarative descriptors
#[derive(Parser, Debug)]
#[command(name = "qrstyle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./qrstyle.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a descriptor and export it
    Render(render::RenderArgs),

    /// Re-export a descriptor every time it changes
    Watch(watch::WatchArgs),

    /// Export every descriptor under a directory
    Batch(batch::BatchArgs),

    /// Lint descriptor files without rendering
    Validate(validate::ValidateArgs),

    /// Print the option record a descriptor maps to, as JSON
    Describe(describe::DescribeArgs),

    /// List style patterns and the shapes they use
    Patterns(patterns::PatternsArgs),

    /// Initialize a qrstyle project (generates qrstyle.yaml)
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Which files `render`, `watch` and `batch` export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatChoice {
    #[default]
    Png,
    Svg,
    Both,
}

impl FormatChoice {
    pub fn formats(self) -> &'static [ExportFormat] {
        match self {
            FormatChoice::Png => &[ExportFormat::Png],
            FormatChoice::Svg => &[ExportFormat::Svg],
            FormatChoice::Both => &ExportFormat::ALL,
        }
    }
}

/// Load config from `--config`, or from the working directory.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let cwd = std::env::current_dir()?;
    Config::discover(explicit, &cwd)
}

/// Read a descriptor file, resolving a relative logo path against the
/// file's directory.
pub fn read_descriptor_file(path: &Path) -> Result<DescriptorFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(DescriptorFile::load(path)?.with_base_dir(dir))
}

/// Read a descriptor file and fill its omitted fields from config defaults.
pub fn load_descriptor(path: &Path, config: &Config) -> Result<StyleDescriptor> {
    read_descriptor_file(path)?.resolve(&config.defaults)
}

/// A mounted renderer plus exporter, kept alive across many descriptors.
pub struct Session {
    sync: DescriptorSynchronizer<RasterRenderer>,
    target: Arc<DisplayTarget>,
    exporter: Exporter,
    timeout: Duration,
}

impl Session {
    pub fn start(config: &Config, svg_mode: SvgMode) -> Result<Self> {
        let sync = DescriptorSynchronizer::new(RasterRenderer::new()?);
        let target = DisplayTarget::new("qrstyle");
        sync.mount(&target)?;
        Ok(Self {
            sync,
            target,
            exporter: Exporter::new(svg_mode),
            timeout: config.draw_timeout(),
        })
    }

    pub fn synchronizer(&self) -> &DescriptorSynchronizer<RasterRenderer> {
        &self.sync
    }

    pub fn target(&self) -> &Arc<DisplayTarget> {
        &self.target
    }

    /// Apply a descriptor, wait for its draw, and export it.
    pub fn render(
        &self,
        descriptor: &StyleDescriptor,
        formats: &[ExportFormat],
        id: Option<&str>,
    ) -> Result<Vec<ExportArtifact>> {
        self.sync.apply(descriptor);
        if !self.sync.wait_ready(self.timeout) {
            return Err(QrError::Build {
                message: format!(
                    "draw did not finish within {} ms",
                    self.timeout.as_millis()
                ),
                help: Some("Raise draw_timeout_ms in qrstyle.yaml".to_string()),
            });
        }
        self.exporter.export_all(&self.sync, formats, id)
    }
}

/// Write artifacts into `dir`, creating it if needed, and report each one.
pub fn write_artifacts(
    artifacts: &[ExportArtifact],
    dir: &Path,
    printer: &Printer,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| QrError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create output directory: {}", e),
    })?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = artifact.write_to(dir)?;
        printer.status(
            "Exported",
            &format!(
                "{} {}",
                printer.cyan(&display_path(&path)),
                printer.dim(&format!("({})", artifact.fidelity))
            ),
        );
        written.push(path);
    }
    Ok(written)
}
