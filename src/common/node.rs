use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum NodeType {
    Move,
    Line,
    OffCurve,
    Curve,
    QCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub nodetype: NodeType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub smooth: bool,
}

impl Node {
    fn new(x: f32, y: f32, nodetype: NodeType) -> Self {
        Node {
            x: x as f64,
            y: y as f64,
            nodetype,
            smooth: false,
        }
    }

    pub fn new_move(x: f32, y: f32) -> Self {
        Self::new(x, y, NodeType::Move)
    }

    pub fn new_line(x: f32, y: f32) -> Self {
        Self::new(x, y, NodeType::Line)
    }

    pub fn new_offcurve(x: f32, y: f32) -> Self {
        Self::new(x, y, NodeType::OffCurve)
    }

    pub fn new_curve(x: f32, y: f32) -> Self {
        Self::new(x, y, NodeType::Curve)
    }

    pub fn new_qcurve(x: f32, y: f32) -> Self {
        Self::new(x, y, NodeType::QCurve)
    }

    pub fn to_kurbo(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    /// A copy of this node moved by `transform`
    pub fn transformed(&self, transform: kurbo::Affine) -> Self {
        let point = transform * self.to_kurbo();
        Node {
            x: point.x,
            y: point.y,
            nodetype: self.nodetype,
            smooth: self.smooth,
        }
    }
}
