//! Patterns command: list style patterns and their shape triples.

use clap::Args;
use serde::Serialize;

use crate::error::{QrError, Result};
use crate::types::{PatternMapper, ShapeTriple};

/// List style patterns and the shapes they use
#[derive(Args, Debug, Default)]
pub struct PatternsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Row {
    pattern: String,
    #[serde(flatten)]
    shapes: ShapeTriple,
}

/// Shape name as it appears in option records, e.g. "extra-rounded".
fn shape_name<T: Serialize>(shape: &T) -> String {
    serde_json::to_value(shape)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

pub fn table(args: &PatternsArgs) -> Result<String> {
    let rows: Vec<Row> = PatternMapper::table()
        .map(|(id, shapes)| Row {
            pattern: id.to_string(),
            shapes,
        })
        .collect();

    if args.json {
        return serde_json::to_string_pretty(&rows).map_err(|e| QrError::Encode {
            message: format!("Failed to serialize pattern table: {}", e),
        });
    }

    let mut out = format!("{:<10} {:<16} {:<14} {}\n", "PATTERN", "MODULES", "FRAME", "DOT");
    for row in &rows {
        out.push_str(&format!(
            "{:<10} {:<16} {:<14} {}\n",
            row.pattern,
            shape_name(&row.shapes.module),
            shape_name(&row.shapes.frame),
            shape_name(&row.shapes.dot)
        ));
    }
    Ok(out)
}

pub fn run(args: PatternsArgs) -> Result<()> {
    print!("{}", table(&args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_pattern() {
        let text = table(&PatternsArgs::default()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("dots"));
        assert!(lines[2].contains("square"));
        assert!(lines[3].contains("extra-rounded"));
    }

    #[test]
    fn test_json_rows() {
        let json = table(&PatternsArgs { json: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[3]["pattern"], "classy");
        assert_eq!(value[3]["module"], "classy");
        assert_eq!(value[3]["frame"], "extra-rounded");
    }
}
