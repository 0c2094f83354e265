//! Style descriptors: the declarative input that drives rendering.
//!
//! A descriptor is an immutable value. Every edit produces a new descriptor
//! that replaces the previous one wholesale.
//!
//! # Example
//!
//! ```yaml
//! content: https://example.com
//! size: 256
//! foreground: "#000000"
//! background: "#FFFFFF"
//! pattern: dots
//! logo:
//!   source: logo.png
//!   width: 60
//!   height: 60
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Colour, PatternId};
use crate::error::{QrError, Result};

/// Largest accepted canvas edge, in pixels.
pub const MAX_SIZE: u32 = 4096;

/// Default canvas edge, in pixels.
pub const DEFAULT_SIZE: u32 = 256;

/// Default logo edge when a logo omits its dimensions.
pub const DEFAULT_LOGO_EDGE: u32 = 40;

/// Error-correction level handed to the symbol encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EcLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl std::str::FromStr for EcLevel {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            _ => Err(QrError::Parse {
                message: format!("Invalid error-correction level: {}", s),
                help: Some("Use one of L, M, Q, H".to_string()),
            }),
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An optional logo composited over the centre of the code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogoSpec {
    /// File path or `data:` URI of the logo image.
    pub source: String,

    /// Requested logo width in pixels.
    #[serde(default = "default_logo_edge")]
    pub width: u32,

    /// Requested logo height in pixels.
    #[serde(default = "default_logo_edge")]
    pub height: u32,

    /// Clear the modules under the logo. Unset means yes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excavate: Option<bool>,
}

fn default_logo_edge() -> u32 {
    DEFAULT_LOGO_EDGE
}

impl LogoSpec {
    pub fn new(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            excavate: None,
        }
    }

    pub fn with_excavate(mut self, excavate: bool) -> Self {
        self.excavate = Some(excavate);
        self
    }
}

/// The complete declared style of a code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleDescriptor {
    /// Text or URL to encode. May be empty while the user is typing.
    pub content: String,

    /// Canvas edge in pixels.
    pub size: u32,

    pub foreground: Colour,

    pub background: Colour,

    #[serde(default)]
    pub pattern: PatternId,

    #[serde(default)]
    pub level: EcLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoSpec>,
}

impl StyleDescriptor {
    /// Create a descriptor with black-on-white squares and no logo.
    pub fn new(content: impl Into<String>, size: u32) -> Self {
        Self {
            content: content.into(),
            size,
            foreground: Colour::BLACK,
            background: Colour::WHITE,
            pattern: PatternId::Squares,
            level: EcLevel::M,
            logo: None,
        }
    }

    pub fn with_colours(mut self, foreground: Colour, background: Colour) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn with_pattern(mut self, pattern: PatternId) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_level(mut self, level: EcLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_logo(mut self, logo: LogoSpec) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Check the structural invariants a descriptor must hold before it is applied.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(QrError::Validation {
                message: format!("size {} is out of range", self.size),
                help: Some(format!("Use a size between 1 and {}", MAX_SIZE)),
            });
        }
        Ok(())
    }
}

/// Descriptor values that fill in fields a descriptor file leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorDefaults {
    pub size: u32,
    pub foreground: Colour,
    pub background: Colour,
    pub pattern: PatternId,
    pub level: EcLevel,
}

impl Default for DescriptorDefaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            foreground: Colour::BLACK,
            background: Colour::WHITE,
            pattern: PatternId::Squares,
            level: EcLevel::M,
        }
    }
}

/// A descriptor as written in a file, where any field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DescriptorFile {
    pub content: Option<String>,
    pub size: Option<u32>,
    pub foreground: Option<Colour>,
    pub background: Option<Colour>,
    pub pattern: Option<PatternId>,
    pub level: Option<EcLevel>,
    pub logo: Option<LogoSpec>,
}

impl DescriptorFile {
    /// Load a descriptor file, choosing YAML or JSON by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| QrError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read descriptor: {}", e),
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::parse_json(&source)
        } else {
            Self::parse_yaml(&source)
        }
    }

    pub fn parse_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|e| QrError::Parse {
            message: format!("Invalid descriptor: {}", e),
            help: Some("Check the descriptor's YAML syntax".to_string()),
        })
    }

    pub fn parse_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| QrError::Parse {
            message: format!("Invalid descriptor: {}", e),
            help: Some("Check the descriptor's JSON syntax".to_string()),
        })
    }

    /// Resolve a relative logo path against `dir`, the descriptor's directory.
    /// `data:` URIs and absolute paths are left alone.
    pub fn with_base_dir(mut self, dir: &Path) -> Self {
        if let Some(logo) = self.logo.as_mut() {
            let relative = !logo.source.starts_with("data:") && Path::new(&logo.source).is_relative();
            if relative {
                logo.source = dir.join(&logo.source).to_string_lossy().into_owned();
            }
        }
        self
    }

    /// Fill omitted fields from `defaults` without validating.
    pub fn fill(self, defaults: &DescriptorDefaults) -> StyleDescriptor {
        StyleDescriptor {
            content: self.content.unwrap_or_default(),
            size: self.size.unwrap_or(defaults.size),
            foreground: self.foreground.unwrap_or(defaults.foreground),
            background: self.background.unwrap_or(defaults.background),
            pattern: self.pattern.unwrap_or_else(|| defaults.pattern.clone()),
            level: self.level.unwrap_or(defaults.level),
            logo: self.logo,
        }
    }

    /// Fill omitted fields from `defaults` and validate the result.
    pub fn resolve(self, defaults: &DescriptorDefaults) -> Result<StyleDescriptor> {
        let descriptor = self.fill(defaults);
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r##"
content: https://example.com
size: 300
foreground: "#112233"
background: "#FFFFFF"
pattern: classy
level: H
logo:
  source: logo.png
  width: 64
  height: 32
  excavate: false
"##;
        let descriptor = DescriptorFile::parse_yaml(yaml)
            .unwrap()
            .resolve(&DescriptorDefaults::default())
            .unwrap();

        assert_eq!(descriptor.content, "https://example.com");
        assert_eq!(descriptor.size, 300);
        assert_eq!(descriptor.foreground, Colour::rgb(0x11, 0x22, 0x33));
        assert_eq!(descriptor.pattern, PatternId::Classy);
        assert_eq!(descriptor.level, EcLevel::H);
        let logo = descriptor.logo.unwrap();
        assert_eq!((logo.width, logo.height), (64, 32));
        assert_eq!(logo.excavate, Some(false));
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let defaults = DescriptorDefaults {
            size: 512,
            foreground: Colour::rgb(10, 20, 30),
            ..Default::default()
        };
        let descriptor = DescriptorFile::parse_yaml("content: hello")
            .unwrap()
            .resolve(&defaults)
            .unwrap();

        assert_eq!(descriptor.size, 512);
        assert_eq!(descriptor.foreground, Colour::rgb(10, 20, 30));
        assert_eq!(descriptor.background, Colour::WHITE);
        assert_eq!(descriptor.pattern, PatternId::Squares);
        assert!(descriptor.logo.is_none());
    }

    #[test]
    fn test_logo_dimensions_default() {
        let file = DescriptorFile::parse_json(r#"{"content":"x","logo":{"source":"a.png"}}"#)
            .unwrap();
        let logo = file.logo.unwrap();
        assert_eq!((logo.width, logo.height), (40, 40));
        assert_eq!(logo.excavate, None);
    }

    #[test]
    fn test_missing_content_is_empty_not_error() {
        let descriptor = DescriptorFile::parse_yaml("size: 128")
            .unwrap()
            .resolve(&DescriptorDefaults::default())
            .unwrap();
        assert_eq!(descriptor.content, "");
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        assert!(StyleDescriptor::new("x", 0).validate().is_err());
        assert!(StyleDescriptor::new("x", MAX_SIZE + 1).validate().is_err());
        assert!(StyleDescriptor::new("x", 1).validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(DescriptorFile::parse_yaml("content: x\ncolour: red").is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("code.json");
        std::fs::write(&json, r#"{"content":"from json","pattern":"dots"}"#).unwrap();
        let yaml = dir.path().join("code.yaml");
        std::fs::write(&yaml, "content: from yaml\npattern: rounded\n").unwrap();

        let a = DescriptorFile::load(&json).unwrap();
        assert_eq!(a.content.as_deref(), Some("from json"));
        assert_eq!(a.pattern, Some(PatternId::Dots));

        let b = DescriptorFile::load(&yaml).unwrap();
        assert_eq!(b.pattern, Some(PatternId::Rounded));
    }

    #[test]
    fn test_base_dir_rebases_relative_logo() {
        let file = DescriptorFile::parse_yaml("logo:\n  source: art/logo.png\n")
            .unwrap()
            .with_base_dir(Path::new("/codes"));
        assert_eq!(
            Path::new(&file.logo.unwrap().source),
            Path::new("/codes/art/logo.png")
        );

        let inline = DescriptorFile::parse_yaml("logo:\n  source: \"data:image/png;base64,AA==\"\n")
            .unwrap()
            .with_base_dir(Path::new("/codes"));
        assert!(inline.logo.unwrap().source.starts_with("data:"));
    }

    #[test]
    fn test_ec_level_parse() {
        assert_eq!("q".parse::<EcLevel>().unwrap(), EcLevel::Q);
        assert!("X".parse::<EcLevel>().is_err());
    }
}
