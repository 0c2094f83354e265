//! Drawn surfaces and the module grids they were drawn from.

use image::RgbaImage;

use super::shapes::Neighbours;
use super::FrameId;
use crate::types::RenderOptions;

/// Edge length of a finder pattern, in modules.
pub const FINDER_EDGE: usize = 7;

/// A square grid of dark/light modules produced by a symbol encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Build a grid from row-major dark flags. Returns `None` if `modules`
    /// is not `width * width` long.
    pub fn new(width: usize, modules: Vec<bool>) -> Option<Self> {
        (modules.len() == width * width).then_some(Self { width, modules })
    }

    /// Build a grid from rows of `'#'` (dark) and anything else (light).
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let width = rows.len();
        let modules: Vec<bool> = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| c == '#'))
            .collect();
        Self::new(width, modules)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at (x, y) is dark. Out-of-range coordinates are light.
    pub fn is_dark(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Which orthogonal neighbours of (x, y) are dark.
    pub fn neighbours(&self, x: usize, y: usize) -> Neighbours {
        let (x, y) = (x as isize, y as isize);
        Neighbours {
            top: self.is_dark(x, y - 1),
            right: self.is_dark(x + 1, y),
            bottom: self.is_dark(x, y + 1),
            left: self.is_dark(x - 1, y),
        }
    }

    /// Origins of the three finder patterns, or none for grids too small to hold them.
    pub fn finder_origins(&self) -> Vec<(usize, usize)> {
        if self.width < FINDER_EDGE * 2 + 1 {
            return Vec::new();
        }
        let far = self.width - FINDER_EDGE;
        vec![(0, 0), (far, 0), (0, far)]
    }

    /// Origin of the finder pattern containing (x, y), if any.
    pub fn finder_at(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        if self.width < FINDER_EDGE * 2 + 1 {
            return None;
        }
        let far = self.width - FINDER_EDGE;
        let near = |t: usize| t < FINDER_EDGE;
        let distant = |t: usize| (far..self.width).contains(&t);
        match (near(x), near(y), distant(x), distant(y)) {
            (true, true, _, _) => Some((0, 0)),
            (_, true, true, _) => Some((far, 0)),
            (true, _, _, true) => Some((0, far)),
            _ => None,
        }
    }

    /// Iterate over dark modules as (x, y).
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, &dark)| dark)
            .map(move |(i, _)| (i % self.width, i / self.width))
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&d| d).count()
    }
}

/// Module geometry of a drawn surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Pixels per module.
    pub module_px: f32,
    /// Offset of the grid's top-left corner from the canvas edge.
    pub offset: f32,
}

impl GridLayout {
    /// Fit `modules` modules into `size` pixels, centred. Whole-pixel modules
    /// are used whenever they fit.
    pub fn fit(size: u32, modules: usize) -> Self {
        let modules = modules.max(1);
        let module_px = if size as usize >= modules {
            (size as usize / modules) as f32
        } else {
            size as f32 / modules as f32
        };
        let offset = (size as f32 - module_px * modules as f32) / 2.0;
        Self { module_px, offset }
    }
}

/// A fully drawn frame.
#[derive(Debug, Clone)]
pub struct Surface {
    /// The frame this surface was drawn for.
    pub frame: FrameId,

    /// Drawn pixels.
    pub image: RgbaImage,

    /// Module grid, when the renderer exposes one.
    pub grid: Option<ModuleGrid>,

    /// Options the surface was drawn from.
    pub options: RenderOptions,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Grid geometry for this surface, if it has a module grid.
    pub fn layout(&self) -> Option<GridLayout> {
        self.grid
            .as_ref()
            .map(|grid| GridLayout::fit(self.options.width, grid.width()))
    }
}
