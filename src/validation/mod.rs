//! Descriptor linting.
//!
//! Runs a suite of checks against a style descriptor and reports errors and
//! warnings. Used by `qrstyle validate` and before every `qrstyle render`.

mod checks;
mod diagnostic;

pub use checks::MIN_CONTRAST;
pub use diagnostic::{Diagnostic, Severity, ValidationResult};

use crate::output::{plural, Printer};
use crate::types::StyleDescriptor;

/// Run all lint checks against a descriptor.
pub fn validate_descriptor(descriptor: &StyleDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(checks::check_size(descriptor));
    result.merge(checks::check_content(descriptor));
    result.merge(checks::check_pattern(descriptor));
    result.merge(checks::check_colours(descriptor));
    result.merge(checks::check_logo(descriptor));

    result
}

/// Print diagnostics to stderr.
pub fn print_diagnostics(result: &ValidationResult, printer: &Printer) {
    for d in result.iter() {
        let label = format!("{}[{}]", d.severity, d.code);
        eprintln!("  {}: {}", printer.severity(&label, d.is_error()), d.message);
        if let Some(help) = &d.help {
            eprintln!("    {} {}", printer.dim("help:"), help);
        }
    }
}

/// One-line summary of a result, e.g. "1 error, 2 warnings".
pub fn summary(result: &ValidationResult) -> String {
    format!(
        "{}, {}",
        plural(result.error_count(), "error", "errors"),
        plural(result.warning_count(), "warning", "warnings")
    )
}
