//! Style patterns and the fixed pattern-to-shape table.
//!
//! A pattern is the single user-facing style knob. It resolves to three
//! independent shape axes: the data modules, the outer ring of each finder
//! pattern (the "frame"), and the 3x3 centre of each finder pattern (the
//! "dot"). The table is a fixed lookup, not a free product, so only the
//! preset combinations below are reachable from a pattern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A style pattern identifier.
///
/// Unrecognized names are kept as [`PatternId::Unknown`] instead of being
/// rejected; they resolve to the squares preset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PatternId {
    #[default]
    Squares,
    Dots,
    Rounded,
    Classy,
    Unknown(String),
}

impl PatternId {
    /// Every supported pattern, in display order.
    pub const ALL: [PatternId; 4] = [
        PatternId::Squares,
        PatternId::Dots,
        PatternId::Rounded,
        PatternId::Classy,
    ];

    /// Canonical name of the pattern.
    pub fn name(&self) -> &str {
        match self {
            PatternId::Squares => "squares",
            PatternId::Dots => "dots",
            PatternId::Rounded => "rounded",
            PatternId::Classy => "classy",
            PatternId::Unknown(name) => name,
        }
    }

    /// Whether this is one of the supported patterns.
    pub fn is_known(&self) -> bool {
        !matches!(self, PatternId::Unknown(_))
    }
}

impl FromStr for PatternId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "squares" => PatternId::Squares,
            "dots" => PatternId::Dots,
            "rounded" => PatternId::Rounded,
            "classy" => PatternId::Classy,
            _ => PatternId::Unknown(s.to_string()),
        })
    }
}

impl From<String> for PatternId {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

impl From<PatternId> for String {
    fn from(id: PatternId) -> Self {
        id.name().to_string()
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the data modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleShape {
    Square,
    Dots,
    Rounded,
    ExtraRounded,
    Classy,
    ClassyRounded,
}

/// Shape of the outer 7x7 ring of a finder pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameShape {
    Square,
    Dot,
    ExtraRounded,
}

/// Shape of the 3x3 centre of a finder pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotShape {
    Square,
    Dot,
}

/// The three shape axes a pattern resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeTriple {
    pub module: ModuleShape,
    pub frame: FrameShape,
    pub dot: DotShape,
}

impl ShapeTriple {
    pub const fn new(module: ModuleShape, frame: FrameShape, dot: DotShape) -> Self {
        Self { module, frame, dot }
    }
}

impl fmt::Display for ShapeTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "modules={:?} frame={:?} dot={:?}",
            self.module, self.frame, self.dot
        )
    }
}

const SQUARES: ShapeTriple =
    ShapeTriple::new(ModuleShape::Square, FrameShape::Square, DotShape::Square);
const DOTS: ShapeTriple = ShapeTriple::new(ModuleShape::Dots, FrameShape::Square, DotShape::Dot);
const ROUNDED: ShapeTriple =
    ShapeTriple::new(ModuleShape::Rounded, FrameShape::ExtraRounded, DotShape::Dot);
const CLASSY: ShapeTriple =
    ShapeTriple::new(ModuleShape::Classy, FrameShape::ExtraRounded, DotShape::Dot);

/// Resolves pattern identifiers to shape triples.
pub struct PatternMapper;

impl PatternMapper {
    /// Resolve a pattern to its shape triple.
    ///
    /// Total: unknown patterns resolve to the squares preset and are logged.
    pub fn resolve(pattern: &PatternId) -> ShapeTriple {
        match pattern {
            PatternId::Squares => SQUARES,
            PatternId::Dots => DOTS,
            PatternId::Rounded => ROUNDED,
            PatternId::Classy => CLASSY,
            PatternId::Unknown(name) => {
                log::warn!("unsupported pattern '{}', falling back to squares", name);
                SQUARES
            }
        }
    }

    /// The full table of supported patterns.
    pub fn table() -> impl Iterator<Item = (PatternId, ShapeTriple)> {
        PatternId::ALL
            .into_iter()
            .map(|id| {
                let triple = Self::resolve(&id);
                (id, triple)
            })
    }
}
