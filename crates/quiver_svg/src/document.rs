//! SVG document arena and tree queries

use std::fmt;

use quiver_core::{Path, SimplifyOptions, SimplifyReport, Size, Transform};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tracing::debug;

use crate::config::DocumentConfig;
use crate::error::{Result, SvgError};
use crate::style::Style;

new_key_type! {
    /// Handle to a node in a [`Document`]
    pub struct NodeId;
}

/// A painted path
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub path: Path,
    pub style: Style,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Shape(Shape),
}

/// Arena entry
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) transform: Transform,
    pub(crate) opacity: f64,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            id: None,
            parent: None,
            children: Vec::new(),
            transform: Transform::IDENTITY,
            opacity: 1.0,
            kind,
        }
    }

    /// The element `id` attribute, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local transform, relative to the parent
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match &self.kind {
            NodeKind::Shape(shape) => Some(shape),
            NodeKind::Group => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }
}

/// A shape reached by walking the tree, with its ancestors composed in
#[derive(Clone, Copy, Debug)]
pub struct ShapeInstance<'a> {
    pub id: NodeId,
    pub shape: &'a Shape,
    /// Local → canvas space
    pub transform: Transform,
    /// Product of the node's and every ancestor's opacity
    pub opacity: f64,
}

/// A vector document
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. The root is
/// always a group; every other node has exactly one parent.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) root: NodeId,
    ids: FxHashMap<String, NodeId>,
    pub(crate) canvas: Option<Size>,
    pub(crate) root_transform: Transform,
    pub(crate) config: DocumentConfig,
}

impl Document {
    /// Create an empty document with the given canvas extents
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SvgError::Input(format!(
                "canvas must be finite and positive, got {width}x{height}"
            )));
        }
        Ok(Self::empty(
            Some(Size::new(width, height)),
            Transform::IDENTITY,
            DocumentConfig::default(),
        ))
    }

    pub(crate) fn empty(
        canvas: Option<Size>,
        root_transform: Transform,
        config: DocumentConfig,
    ) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Group));
        Self {
            nodes,
            root,
            ids: FxHashMap::default(),
            canvas,
            root_transform,
            config,
        }
    }

    /// Parse SVG source text
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_config(text, DocumentConfig::default())
    }

    pub fn parse_with_config(text: &str, config: DocumentConfig) -> Result<Self> {
        crate::parser::parse_document(text, config)
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Append an empty group under `parent`
    pub fn add_group(&mut self, parent: NodeId, transform: Transform) -> Result<NodeId> {
        let mut node = Node::new(NodeKind::Group);
        node.transform = transform;
        self.insert(parent, node)
    }

    /// Append a shape under `parent`
    pub fn add_shape(&mut self, parent: NodeId, path: Path, style: Style) -> Result<NodeId> {
        path.validate()
            .map_err(|e| SvgError::Input(e.to_string()))?;
        style.validate().map_err(SvgError::Input)?;
        self.insert(parent, Node::new(NodeKind::Shape(Shape { path, style })))
    }

    /// Set a node's opacity, clamped to [0, 1]
    pub fn set_opacity(&mut self, id: NodeId, opacity: f64) -> Result<()> {
        if opacity.is_nan() {
            return Err(SvgError::Input("opacity must be a number".into()));
        }
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| SvgError::Input("unknown node".into()))?;
        node.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    /// Set a node's element id, making it reachable through [`Document::node_by_id`]
    pub fn set_element_id(&mut self, id: NodeId, element_id: impl Into<String>) -> Result<()> {
        let element_id = element_id.into();
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| SvgError::Input("unknown node".into()))?;
        if let Some(old) = node.id.replace(element_id.clone()) {
            if self.ids.get(&old) == Some(&id) {
                self.ids.remove(&old);
            }
        }
        self.ids.entry(element_id).or_insert(id);
        Ok(())
    }

    pub(crate) fn insert(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        match self.nodes.get(parent) {
            Some(p) if p.is_group() => {}
            Some(_) => return Err(SvgError::Input("shapes cannot have children".into())),
            None => return Err(SvgError::Input("unknown parent node".into())),
        }
        if !node.transform.is_invertible() {
            return Err(quiver_core::GeometryError::DegenerateTransform.into());
        }
        if !(0.0..=1.0).contains(&node.opacity) {
            return Err(SvgError::Input(format!(
                "opacity must be in [0, 1], got {}",
                node.opacity
            )));
        }

        let element_id = node.id.clone();
        let id = self.nodes.insert(Node {
            parent: Some(parent),
            ..node
        });
        self.nodes[parent].children.push(id);
        // First occurrence wins, as with getElementById
        if let Some(element_id) = element_id {
            self.ids.entry(element_id).or_insert(id);
        }
        Ok(id)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Children of `id` in document order; empty for shapes and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Look up a node by its element id
    pub fn node_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.ids.get(element_id).copied()
    }

    /// Every node below the root, in document order
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: SmallVec<[NodeId; 32]> =
            self.nodes[self.root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// Root transform × every ancestor's transform × the node's own
    pub fn effective_transform(&self, id: NodeId) -> Option<Transform> {
        let mut ts = self.nodes.get(id)?.transform;
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            let node = &self.nodes[parent];
            ts = node.transform.then(&ts);
            current = node.parent;
        }
        Some(self.root_transform.then(&ts))
    }

    /// Every shape in document order, with composed transform and opacity
    pub fn shapes(&self) -> Vec<ShapeInstance<'_>> {
        let mut out = Vec::new();
        let root = &self.nodes[self.root];
        let base = self.root_transform.then(&root.transform);
        let mut stack: SmallVec<[(NodeId, Transform, f64); 32]> = root
            .children
            .iter()
            .rev()
            .map(|&id| (id, base, root.opacity))
            .collect();

        while let Some((id, parent_ts, parent_opacity)) = stack.pop() {
            let node = &self.nodes[id];
            let transform = parent_ts.then(&node.transform);
            let opacity = parent_opacity * node.opacity;
            match &node.kind {
                NodeKind::Shape(shape) => out.push(ShapeInstance {
                    id,
                    shape,
                    transform,
                    opacity,
                }),
                NodeKind::Group => stack.extend(
                    node.children
                        .iter()
                        .rev()
                        .map(|&child| (child, transform, opacity)),
                ),
            }
        }
        out
    }

    pub fn canvas(&self) -> Option<Size> {
        self.canvas
    }

    pub fn width(&self) -> Option<f64> {
        self.canvas.map(|c| c.width)
    }

    pub fn height(&self) -> Option<f64> {
        self.canvas.map(|c| c.height)
    }

    /// Maps root coordinates to canvas coordinates (viewBox and crop)
    pub fn root_transform(&self) -> Transform {
        self.root_transform
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DocumentConfig {
        &mut self.config
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Replace every cubic segment with quadratics within `tolerance`
    ///
    /// Tolerance is measured in each path's local coordinates. Nothing is
    /// modified when the tolerance is rejected.
    pub fn simplify_curves(&mut self, tolerance: f64) -> Result<SimplifyReport> {
        let options =
            SimplifyOptions::new(tolerance).with_max_depth(self.config.max_subdivision_depth);
        options
            .validate()
            .map_err(|e| SvgError::Input(e.to_string()))?;

        let mut report = SimplifyReport::default();
        let mut rewritten = Vec::new();
        for (id, node) in &self.nodes {
            if let NodeKind::Shape(shape) = &node.kind {
                if shape.path.has_cubics() {
                    let mut path = shape.path.clone();
                    report.merge(&path.simplify_cubics(&options)?);
                    rewritten.push((id, path));
                }
            }
        }

        let paths = rewritten.len();
        for (id, path) in rewritten {
            if let NodeKind::Shape(shape) = &mut self.nodes[id].kind {
                shape.path = path;
            }
        }

        debug!(
            "simplified {} cubics in {} paths into {} quadratics and {} lines (max error {})",
            report.cubics_converted,
            paths,
            report.quads_emitted,
            report.lines_emitted,
            report.max_error
        );
        Ok(report)
    }

    /// Serialize the current state as SVG text
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::writer::write_document(self, f)
    }
}
