//! Describe command: print the option record a descriptor maps to.

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::error::{QrError, Result};
use crate::types::RenderOptions;

use super::load_descriptor;

/// Print the option record a descriptor maps to, as JSON
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Descriptor file (YAML or JSON)
    pub descriptor: PathBuf,
}

/// The option record for a descriptor file, as pretty JSON.
pub fn describe(args: &DescribeArgs, config: &Config) -> Result<String> {
    let descriptor = load_descriptor(&args.descriptor, config)?;
    let options = RenderOptions::from_descriptor(&descriptor);
    serde_json::to_string_pretty(&options).map_err(|e| QrError::Encode {
        message: format!("Failed to serialize options: {}", e),
    })
}

pub fn run(args: DescribeArgs, config: &Config) -> Result<()> {
    println!("{}", describe(&args, config)?);
    Ok(())
}
