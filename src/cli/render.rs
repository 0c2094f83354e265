//! Render command implementation.
//!
//! Loads a descriptor (or builds one from flags), lints it, draws it on a
//! fresh session and writes the requested artifacts.

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::error::{QrError, Result};
use crate::export::SvgMode;
use crate::output::{display_path, Printer};
use crate::types::{Colour, DescriptorFile, EcLevel, LogoSpec, PatternId, StyleDescriptor};
use crate::validation::{print_diagnostics, summary, validate_descriptor};

use super::{read_descriptor_file, write_artifacts, FormatChoice, Session};

/// Render a descriptor and export it
#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    /// Descriptor file (YAML or JSON)
    pub descriptor: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Which files to write
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    pub format: FormatChoice,

    /// SVG encoding (overrides config)
    #[arg(long)]
    pub svg_mode: Option<SvgMode>,

    /// Identifier interpolated into the filenames (qrcode-<id>.png)
    #[arg(long)]
    pub id: Option<String>,

    /// Output directory (overrides config)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Descriptor fields settable from the command line.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Text or URL to encode
    #[arg(long)]
    pub content: Option<String>,

    /// Canvas edge in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Foreground colour (#RRGGBB)
    #[arg(long)]
    pub fg: Option<Colour>,

    /// Background colour (#RRGGBB)
    #[arg(long)]
    pub bg: Option<Colour>,

    /// Style pattern: squares, dots, rounded, classy
    #[arg(long)]
    pub pattern: Option<PatternId>,

    /// Error-correction level: L, M, Q, H
    #[arg(long)]
    pub level: Option<EcLevel>,

    /// Logo image path or data: URI
    #[arg(long)]
    pub logo: Option<String>,
}

impl Overrides {
    /// Overlay the set flags onto a descriptor file.
    pub fn apply(&self, mut file: DescriptorFile) -> DescriptorFile {
        if let Some(content) = &self.content {
            file.content = Some(content.clone());
        }
        file.size = self.size.or(file.size);
        file.foreground = self.fg.or(file.foreground);
        file.background = self.bg.or(file.background);
        if let Some(pattern) = &self.pattern {
            file.pattern = Some(pattern.clone());
        }
        file.level = self.level.or(file.level);
        if let Some(source) = &self.logo {
            file.logo = Some(match file.logo.take() {
                Some(logo) => LogoSpec {
                    source: source.clone(),
                    ..logo
                },
                None => LogoSpec::new(
                    source.clone(),
                    crate::types::DEFAULT_LOGO_EDGE,
                    crate::types::DEFAULT_LOGO_EDGE,
                ),
            });
        }
        file
    }
}

/// Build the descriptor a render will use and lint it. Lint errors abort;
/// warnings are printed.
pub fn prepare(
    descriptor: Option<&PathBuf>,
    overrides: &Overrides,
    config: &Config,
    printer: &Printer,
) -> Result<StyleDescriptor> {
    let file = match descriptor {
        Some(path) => read_descriptor_file(path)?,
        None => DescriptorFile::default(),
    };
    let descriptor = overrides.apply(file).fill(&config.defaults);

    let lint = validate_descriptor(&descriptor);
    if !lint.is_ok() {
        print_diagnostics(&lint, printer);
    }
    if lint.has_errors() {
        return Err(QrError::Validation {
            message: format!("descriptor rejected ({})", summary(&lint)),
            help: Some("Fix the errors above, or run `qrstyle validate` for details".to_string()),
        });
    }
    Ok(descriptor)
}

pub fn run(args: RenderArgs, config: &Config, printer: &Printer) -> Result<Vec<PathBuf>> {
    let descriptor = prepare(args.descriptor.as_ref(), &args.overrides, config, printer)?;
    let label = args
        .descriptor
        .as_deref()
        .map(display_path)
        .unwrap_or_else(|| "descriptor".to_string());
    printer.status(
        "Rendering",
        &format!("{} ({}px, {})", label, descriptor.size, descriptor.pattern),
    );

    let session = Session::start(config, args.svg_mode.unwrap_or(config.svg))?;
    let artifacts = session.render(&descriptor, args.format.formats(), args.id.as_deref())?;

    let dir = args.output.unwrap_or_else(|| config.output.clone());
    write_artifacts(&artifacts, &dir, printer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DescriptorDefaults;

    #[test]
    fn test_overrides_replace_file_fields() {
        let file = DescriptorFile::parse_yaml("content: from file\nsize: 100\npattern: dots\n")
            .unwrap();
        let overrides = Overrides {
            size: Some(300),
            pattern: Some(PatternId::Classy),
            ..Default::default()
        };

        let descriptor = overrides.apply(file).fill(&DescriptorDefaults::default());

        assert_eq!(descriptor.content, "from file");
        assert_eq!(descriptor.size, 300);
        assert_eq!(descriptor.pattern, PatternId::Classy);
    }

    #[test]
    fn test_logo_override_keeps_dimensions() {
        let file = DescriptorFile::parse_yaml("logo:\n  source: a.png\n  width: 64\n  height: 64\n")
            .unwrap();
        let overrides = Overrides {
            logo: Some("b.png".to_string()),
            ..Default::default()
        };

        let logo = overrides.apply(file).logo.unwrap();
        assert_eq!(logo.source, "b.png");
        assert_eq!(logo.width, 64);
    }

    #[test]
    fn test_prepare_rejects_lint_errors() {
        let overrides = Overrides {
            content: Some("x".to_string()),
            size: Some(0),
            ..Default::default()
        };
        let result = prepare(None, &overrides, &Config::default(), &Printer::plain());
        assert!(matches!(result, Err(QrError::Validation { .. })));
    }

    #[test]
    fn test_render_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let args = RenderArgs {
            overrides: Overrides {
                content: Some("https://example.com".to_string()),
                size: Some(128),
                ..Default::default()
            },
            format: FormatChoice::Both,
            id: Some("menu".to_string()),
            output: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let written = run(args, &Config::default(), &Printer::plain()).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("qrcode-menu.png"),
                dir.path().join("qrcode-menu.svg")
            ]
        );
        let png = image::open(&written[0]).unwrap();
        assert_eq!(png.width(), 128);
    }
}
