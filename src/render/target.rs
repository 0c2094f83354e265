//! Display targets and the canvas nodes renderers attach to them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{FrameId, Surface};

/// A drawable surface slot shared between a renderer and the targets it is
/// mounted on. Cloning yields another handle to the same slot.
#[derive(Clone, Default)]
pub struct Canvas {
    slot: Arc<Mutex<Option<Surface>>>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the drawn surface.
    pub fn publish(&self, surface: Surface) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(surface);
    }

    /// Copy of the current surface, if anything has been drawn.
    pub fn snapshot(&self) -> Option<Surface> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Frame of the current surface.
    pub fn frame(&self) -> Option<FrameId> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.frame)
    }

    /// Whether both handles point at the same slot.
    pub fn same_as(&self, other: &Canvas) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas").field("frame", &self.frame()).finish()
    }
}

/// A child node of a display target.
#[derive(Debug, Clone)]
pub enum Node {
    Canvas(Canvas),
    Text(String),
}

/// A container a renderer mounts its canvas into.
#[derive(Debug)]
pub struct DisplayTarget {
    name: String,
    nodes: Mutex<Vec<Node>>,
    torn_down: AtomicBool,
}

impl DisplayTarget {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            nodes: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn append(&self, node: Node) {
        self.nodes().push(node);
    }

    /// Remove every child node.
    pub fn clear(&self) {
        self.nodes().clear();
    }

    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// Remove a specific canvas, leaving other nodes in place.
    pub fn remove_canvas(&self, canvas: &Canvas) {
        self.nodes()
            .retain(|node| !matches!(node, Node::Canvas(c) if c.same_as(canvas)));
    }

    /// First canvas node on the target.
    pub fn find_canvas(&self) -> Option<Canvas> {
        self.nodes().iter().find_map(|node| match node {
            Node::Canvas(c) => Some(c.clone()),
            Node::Text(_) => None,
        })
    }

    /// Remove the target from display. Its children are dropped and it
    /// accepts no further mounts.
    pub fn tear_down(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.clear();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn nodes(&self) -> std::sync::MutexGuard<'_, Vec<Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
