//! Watch command implementation.
//!
//! Keeps one session alive and re-exports the descriptor every time the
//! file changes on disk. A broken edit is reported and the previous
//! artifacts stay in place until the file parses again.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use clap::Args;
use notify::{EventKind, RecursiveMode, Watcher};

use crate::config::Config;
use crate::error::{QrError, Result};
use crate::export::SvgMode;
use crate::output::{display_path, Printer};
use crate::types::StyleDescriptor;

use super::render::{prepare, Overrides};
use super::{write_artifacts, FormatChoice, Session};

/// Quiet period that groups an editor's burst of writes into one change.
const DEBOUNCE: Duration = Duration::from_millis(150);

/// Re-export a descriptor every time it changes
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Descriptor file to watch
    pub descriptor: PathBuf,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Which files to write
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    pub format: FormatChoice,

    /// SVG encoding (overrides config)
    #[arg(long)]
    pub svg_mode: Option<SvgMode>,

    /// Identifier interpolated into the filenames
    #[arg(long)]
    pub id: Option<String>,

    /// Output directory (overrides config)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// State carried between changes.
pub struct Watch<'a> {
    args: &'a WatchArgs,
    config: &'a Config,
    printer: &'a Printer,
    session: Session,
    last_good: Option<StyleDescriptor>,
}

impl<'a> Watch<'a> {
    pub fn new(args: &'a WatchArgs, config: &'a Config, printer: &'a Printer) -> Result<Self> {
        let session = Session::start(config, args.svg_mode.unwrap_or(config.svg))?;
        Ok(Self {
            args,
            config,
            printer,
            session,
            last_good: None,
        })
    }

    /// Reload the descriptor and re-export it. Returns whether anything was
    /// exported. Load, lint and export failures are printed, never returned,
    /// so the next change retries.
    pub fn refresh(&mut self) -> Result<bool> {
        let descriptor = match prepare(
            Some(&self.args.descriptor),
            &self.args.overrides,
            self.config,
            self.printer,
        ) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.printer.error("Error", &e.to_string());
                if self.last_good.is_some() {
                    self.printer
                        .warning("Keeping", "previous export until the file is fixed");
                }
                return Ok(false);
            }
        };

        if self.last_good.as_ref() == Some(&descriptor) {
            log::debug!("descriptor unchanged, skipping export");
            return Ok(false);
        }

        if let Err(e) = self.export(&descriptor) {
            self.printer.error("Error", &e.to_string());
            self.printer
                .warning("Waiting", "for the next change to retry the export");
            return Ok(false);
        }
        self.last_good = Some(descriptor);
        Ok(true)
    }

    fn export(&self, descriptor: &StyleDescriptor) -> Result<Vec<PathBuf>> {
        let artifacts =
            self.session
                .render(descriptor, self.args.format.formats(), self.args.id.as_deref())?;
        let dir = self
            .args
            .output
            .clone()
            .unwrap_or_else(|| self.config.output.clone());
        write_artifacts(&artifacts, &dir, self.printer)
    }

    pub fn last_good(&self) -> Option<&StyleDescriptor> {
        self.last_good.as_ref()
    }
}

fn touches(event: &notify::Event, file: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == file.file_name())
}

pub fn run(args: WatchArgs, config: &Config, printer: &Printer) -> Result<()> {
    let mut watch = Watch::new(&args, config, printer)?;
    watch.refresh()?;

    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(tx).map_err(|e| QrError::Build {
        message: format!("Failed to start file watcher: {}", e),
        help: None,
    })?;

    // Editors often replace the file, so watch its directory
    let dir = match args.descriptor.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| QrError::Io {
            path: dir.clone(),
            message: format!("Failed to watch: {}", e),
        })?;
    printer.info("Watching", &display_path(&args.descriptor));

    for event in rx.iter() {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                log::warn!("watch error: {}", e);
                continue;
            }
        };
        if !touches(&event, &args.descriptor) {
            continue;
        }
        // Swallow the rest of the burst
        std::thread::sleep(DEBOUNCE);
        rx.try_iter().for_each(drop);

        printer.status("Changed", &display_path(&args.descriptor));
        watch.refresh()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(path: PathBuf, output: PathBuf) -> WatchArgs {
        WatchArgs {
            descriptor: path,
            overrides: Overrides::default(),
            format: FormatChoice::Png,
            svg_mode: None,
            id: None,
            output: Some(output),
        }
    }

    #[test]
    fn test_refresh_keeps_last_good_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.yaml");
        let out = dir.path().join("out");
        std::fs::write(&path, "content: first\nsize: 64\n").unwrap();

        let args = args_for(path.clone(), out.clone());
        let config = Config::default();
        let printer = Printer::plain();
        let mut watch = Watch::new(&args, &config, &printer).unwrap();

        assert!(watch.refresh().unwrap());
        assert!(out.join("qrcode.png").exists());

        std::fs::write(&path, "content: [unterminated\n").unwrap();
        assert!(!watch.refresh().unwrap());
        assert_eq!(watch.last_good().unwrap().content, "first");

        std::fs::write(&path, "content: second\nsize: 64\n").unwrap();
        assert!(watch.refresh().unwrap());
        assert_eq!(watch.last_good().unwrap().content, "second");
    }

    #[test]
    fn test_unchanged_descriptor_is_not_re_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.yaml");
        std::fs::write(&path, "content: same\nsize: 32\n").unwrap();

        let args = args_for(path, dir.path().join("out"));
        let config = Config::default();
        let printer = Printer::plain();
        let mut watch = Watch::new(&args, &config, &printer).unwrap();

        assert!(watch.refresh().unwrap());
        assert!(!watch.refresh().unwrap());
    }

    #[test]
    fn test_failed_export_keeps_watching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.yaml");
        let out = dir.path().join("out");
        std::fs::write(&path, "content: first\nsize: 32\n").unwrap();
        std::fs::write(&out, "not a directory").unwrap();

        let args = args_for(path.clone(), out.clone());
        let config = Config::default();
        let printer = Printer::plain();
        let mut watch = Watch::new(&args, &config, &printer).unwrap();

        assert!(!watch.refresh().unwrap());
        assert!(watch.last_good().is_none());

        std::fs::remove_file(&out).unwrap();
        assert!(watch.refresh().unwrap());
        assert_eq!(watch.last_good().unwrap().content, "first");
        assert!(out.join("qrcode.png").exists());
    }

    #[test]
    fn test_touches_matches_file_name() {
        let event = notify::Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(PathBuf::from("/tmp/codes/menu.yaml"));
        assert!(touches(&event, Path::new("codes/menu.yaml")));
        assert!(!touches(&event, Path::new("codes/other.yaml")));
    }
}
