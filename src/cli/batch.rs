//! Batch command implementation.
//!
//! Walks a directory for descriptor files and exports each through one
//! long-lived session, naming artifacts after the descriptor's file stem.

use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::WalkDir;

use crate::config::{Config, CONFIG_FILENAME};
use crate::error::{QrError, Result};
use crate::export::SvgMode;
use crate::output::{display_path, plural, Printer};
use crate::validation::{print_diagnostics, validate_descriptor};

use super::{read_descriptor_file, write_artifacts, FormatChoice, Session};

/// Export every descriptor under a directory
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory to scan for descriptors (.yaml, .yml, .json)
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Which files to write
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    pub format: FormatChoice,

    /// SVG encoding (overrides config)
    #[arg(long)]
    pub svg_mode: Option<SvgMode>,

    /// Output directory (overrides config)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn is_descriptor(path: &Path) -> bool {
    let is_data = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "yaml" | "yml" | "json"));
    is_data && path.file_name().and_then(|n| n.to_str()) != Some(CONFIG_FILENAME)
}

/// Descriptor files under `root`, sorted. The `skip` directory, compared
/// after canonicalization, is not descended into.
pub fn find_descriptors(root: &Path, skip: Option<&Path>) -> Vec<PathBuf> {
    let skip = skip.and_then(|p| p.canonicalize().ok());
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| match &skip {
            Some(skip) if entry.file_type().is_dir() => {
                entry.path().canonicalize().ok().as_ref() != Some(skip)
            }
            _ => true,
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_descriptor(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

/// Summary of a batch run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub exported: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub fn run(args: BatchArgs, config: &Config, printer: &Printer) -> Result<BatchReport> {
    let out = args.output.clone().unwrap_or_else(|| config.output.clone());
    let files = find_descriptors(&args.dir, Some(&out));
    if files.is_empty() {
        printer.warning("Skipping", &format!("no descriptors in {}", display_path(&args.dir)));
        return Ok(BatchReport::default());
    }

    let session = Session::start(config, args.svg_mode.unwrap_or(config.svg))?;
    let mut report = BatchReport::default();

    for file in files {
        match export_one(&session, &file, &args, &out, config, printer) {
            Ok(mut written) => report.exported.append(&mut written),
            Err(e) => {
                printer.error("Failed", &format!("{}: {}", display_path(&file), e));
                report.failed.push(file);
            }
        }
    }

    if report.failed.is_empty() {
        printer.status(
            "Finished",
            &plural(report.exported.len(), "artifact", "artifacts"),
        );
        Ok(report)
    } else {
        Err(QrError::Build {
            message: format!(
                "{} could not be exported",
                plural(report.failed.len(), "descriptor", "descriptors")
            ),
            help: Some("Run `qrstyle validate` on the failed files".to_string()),
        })
    }
}

fn export_one(
    session: &Session,
    file: &Path,
    args: &BatchArgs,
    out: &Path,
    config: &Config,
    printer: &Printer,
) -> Result<Vec<PathBuf>> {
    let descriptor = read_descriptor_file(file)?.fill(&config.defaults);
    let lint = validate_descriptor(&descriptor);
    if !lint.is_ok() {
        print_diagnostics(&lint, printer);
    }
    if lint.has_errors() {
        return Err(QrError::Validation {
            message: "descriptor has lint errors".to_string(),
            help: None,
        });
    }

    let id = file.file_stem().and_then(|s| s.to_str());
    printer.status("Rendering", &display_path(file));
    let artifacts = session.render(&descriptor, args.format.formats(), id)?;
    write_artifacts(&artifacts, out, printer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &Path, out: &Path) -> BatchArgs {
        BatchArgs {
            dir: dir.to_path_buf(),
            format: FormatChoice::Png,
            svg_mode: None,
            output: Some(out.to_path_buf()),
        }
    }

    #[test]
    fn test_find_descriptors_skips_config_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.yaml"), "content: a").unwrap();
        std::fs::write(dir.path().join("nested/b.json"), r#"{"content":"b"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "output: dist").unwrap();

        let found = find_descriptors(dir.path(), None);

        assert_eq!(
            found,
            vec![dir.path().join("a.yaml"), dir.path().join("nested/b.json")]
        );
    }

    #[test]
    fn test_find_descriptors_skips_output_dir_spelled_differently() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("a.yaml"), "content: a").unwrap();
        std::fs::write(dir.path().join("out/stale.yaml"), "content: b").unwrap();

        let root = dir.path().join("out").join("..");
        let found = find_descriptors(&root, Some(&dir.path().join("out")));

        assert_eq!(found, vec![root.join("a.yaml")]);
    }

    #[test]
    fn test_batch_names_artifacts_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(dir.path().join("menu.yaml"), "content: menu\nsize: 64\n").unwrap();
        std::fs::write(dir.path().join("wifi.yaml"), "content: wifi\nsize: 64\n").unwrap();

        let report = run(args(dir.path(), &out), &Config::default(), &Printer::plain()).unwrap();

        assert_eq!(
            report.exported,
            vec![out.join("qrcode-menu.png"), out.join("qrcode-wifi.png")]
        );
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(dir.path().join("bad.yaml"), "size: 0\n").unwrap();
        std::fs::write(dir.path().join("good.yaml"), "content: ok\nsize: 64\n").unwrap();

        let result = run(args(dir.path(), &out), &Config::default(), &Printer::plain());

        assert!(result.is_err());
        assert!(out.join("qrcode-good.png").exists());
    }
}
