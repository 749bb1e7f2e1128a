use crate::{
    common::{Node, NodeType},
    FontgenError,
};
use kurbo::Affine;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

fn identity() -> Affine {
    Affine::IDENTITY
}

fn is_identity(transform: &Affine) -> bool {
    *transform == Affine::IDENTITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A reference to another glyph
pub struct Component {
    /// The referenced glyph name
    pub reference: SmolStr,
    /// The transformation applied to the component
    #[serde(default = "identity", skip_serializing_if = "is_identity")]
    pub transform: Affine,
}

impl Component {
    pub fn new(reference: impl Into<SmolStr>, transform: Affine) -> Self {
        Component {
            reference: reference.into(),
            transform,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// A path in a glyph
pub struct Path {
    pub nodes: Vec<Node>,
    pub closed: bool,
}

impl Path {
    /// The path as a [`kurbo::BezPath`].
    ///
    /// A closed contour is walked from its first on-curve node all the way
    /// round, so off-curve points stored at the end of the node list feed
    /// the segment that returns to the start.
    pub fn to_kurbo(&self) -> Result<kurbo::BezPath, FontgenError> {
        let mut bez = kurbo::BezPath::new();
        let start = if self.closed {
            match self
                .nodes
                .iter()
                .position(|node| node.nodetype != NodeType::OffCurve)
            {
                Some(ix) => ix,
                None => return Ok(bez),
            }
        } else {
            0
        };
        let Some(first) = self.nodes.get(start) else {
            return Ok(bez);
        };
        bez.move_to(first.to_kurbo());

        let segment_ends = if self.closed {
            self.nodes.len()
        } else {
            self.nodes.len() - 1
        };
        let mut controls: Vec<kurbo::Point> = Vec::with_capacity(2);
        for node in self.nodes.iter().cycle().skip(start + 1).take(segment_ends) {
            let end = node.to_kurbo();
            match node.nodetype {
                NodeType::OffCurve => {
                    controls.push(end);
                    continue;
                }
                NodeType::Move | NodeType::Line if controls.is_empty() => bez.line_to(end),
                NodeType::Move | NodeType::Line => return Err(FontgenError::BadPath),
                NodeType::Curve => match controls.as_slice() {
                    [c] => bez.quad_to(*c, end),
                    [c0, c1] => bez.curve_to(*c0, *c1, end),
                    _ => return Err(FontgenError::BadPath),
                },
                NodeType::QCurve => {
                    // Consecutive controls imply an on-curve point between them
                    for pair in controls.windows(2) {
                        bez.quad_to(pair[0], pair[0].midpoint(pair[1]));
                    }
                    match controls.last() {
                        Some(c) => bez.quad_to(*c, end),
                        None => bez.line_to(end),
                    }
                }
            }
            controls.clear();
        }
        if self.closed {
            bez.close_path();
        }
        Ok(bez)
    }

    pub fn transformed(&self, transform: Affine) -> Path {
        Path {
            nodes: self
                .nodes
                .iter()
                .map(|node| node.transformed(transform))
                .collect(),
            closed: self.closed,
        }
    }
}

/// A shape in a glyph, either a component or a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shape {
    Component(Component),
    Path(Path),
}

impl Shape {
    /// Apply a transform to the shape
    pub fn apply_transform(&self, transform: Affine) -> Self {
        match self {
            Shape::Component(c) => Shape::Component(Component {
                reference: c.reference.clone(),
                transform: transform * c.transform,
            }),
            Shape::Path(p) => Shape::Path(p.transformed(transform)),
        }
    }
}

/// Interface for accepting a sequence of path commands.
pub trait OutlinePen {
    /// Emit a command to begin a new subpath at (x, y).
    fn move_to(&mut self, x: f32, y: f32);

    /// Emit a line segment from the current point to (x, y).
    fn line_to(&mut self, x: f32, y: f32);

    /// Emit a quadratic bezier segment from the current point with a control
    /// point at (cx0, cy0) and ending at (x, y).
    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32);

    /// Emit a cubic bezier segment from the current point with control
    /// points at (cx0, cy0) and (cx1, cy1) and ending at (x, y).
    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32);

    /// Emit a command to close the current subpath.
    fn close(&mut self);
}

/// A pen which builds paths
///
/// ```rust
/// use notation_fontgen::{OutlinePen, PathBuilder};
/// let mut pen = PathBuilder::new();
/// pen.move_to(0.0, 0.0);
/// pen.line_to(100.0, 0.0);
/// pen.line_to(100.0, 100.0);
/// pen.close();
/// let paths = pen.build();
/// assert_eq!(paths.len(), 1);
/// assert_eq!(paths[0].nodes.len(), 3);
/// assert!(paths[0].closed);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    paths: Vec<Path>,
    current_path: Option<Path>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Vec<Path> {
        let mut paths = self.paths;
        paths.extend(self.current_path);
        paths
    }

    fn current_path_mut(&mut self) -> &mut Path {
        self.current_path.get_or_insert_with(Path::default)
    }
}

impl OutlinePen for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if let Some(path) = self.current_path.take() {
            self.paths.push(path);
        }
        self.current_path_mut().nodes.push(Node::new_move(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current_path_mut().nodes.push(Node::new_line(x, y));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let path = self.current_path_mut();
        path.nodes.push(Node::new_offcurve(cx0, cy0));
        path.nodes.push(Node::new_qcurve(x, y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let path = self.current_path_mut();
        path.nodes.push(Node::new_offcurve(cx0, cy0));
        path.nodes.push(Node::new_offcurve(cx1, cy1));
        path.nodes.push(Node::new_curve(x, y));
    }

    fn close(&mut self) {
        let Some(path) = self.current_path.as_mut() else {
            return;
        };
        path.closed = true;
        // A closed path has no move: drop it if the contour returned to its
        // start point, otherwise it becomes a line.
        let returns_to_start = match (path.nodes.first(), path.nodes.last()) {
            (Some(first), Some(last)) if path.nodes.len() > 1 => {
                first.x == last.x && first.y == last.y
            }
            _ => false,
        };
        if returns_to_start {
            path.nodes.remove(0);
        } else if let Some(first) = path.nodes.first_mut() {
            first.nodetype = NodeType::Line;
        }
    }
}
