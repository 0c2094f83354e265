//! Validate command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::error::{QrError, Result};
use crate::output::{display_path, plural, Printer};
use crate::validation::{print_diagnostics, summary, validate_descriptor, ValidationResult};

use super::read_descriptor_file;

/// Lint descriptor files without rendering
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Files to validate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: ValidateArgs, config: &Config, printer: &Printer) -> Result<ValidationResult> {
    let mut total = ValidationResult::new();
    let mut unreadable = 0;

    for file in &args.files {
        let descriptor = match read_descriptor_file(file) {
            Ok(parsed) => parsed.fill(&config.defaults),
            Err(e) => {
                printer.error("Invalid", &format!("{}: {}", display_path(file), e));
                unreadable += 1;
                continue;
            }
        };

        let result = validate_descriptor(&descriptor);
        if result.is_ok() {
            printer.status("Checked", &display_path(file));
        } else {
            printer.warning("Checked", &format!("{} ({})", display_path(file), summary(&result)));
            print_diagnostics(&result, printer);
        }
        total.merge(result);
    }

    let failed = unreadable > 0 || total.has_errors() || (args.strict && !total.is_ok());
    if failed {
        return Err(QrError::Validation {
            message: format!(
                "{} failed ({}, {} unreadable)",
                plural(args.files.len(), "file", "files"),
                summary(&total),
                unreadable
            ),
            help: None,
        });
    }

    printer.status(
        "Finished",
        &format!("{} ({})", plural(args.files.len(), "file", "files"), summary(&total)),
    );
    Ok(total)
}
