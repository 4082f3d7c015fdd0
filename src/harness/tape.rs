//! Scalar reverse-mode autograd
//!
//! Values live on an append-only tape. Operands always exist before the value
//! computed from them, so walking the tape backwards from a root visits every
//! node after all of its consumers.

use serde::{Deserialize, Serialize};

/// Handle to a value on a [`Tape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Tanh,
    Relu,
    Exp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Leaf,
    Binary(BinaryOp, NodeId, NodeId),
    Pow(NodeId, f64),
    Unary(UnaryOp, NodeId),
}

impl Op {
    fn operands(&self) -> Vec<NodeId> {
        match *self {
            Op::Leaf => vec![],
            Op::Binary(_, lhs, rhs) => vec![lhs, rhs],
            Op::Pow(base, _) | Op::Unary(_, base) => vec![base],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    data: f64,
    grad: f64,
    op: Op,
}

/// An expression tape
#[derive(Debug, Default)]
pub struct Tape {
    nodes: Vec<Node>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, data: f64, op: Op) -> NodeId {
        self.nodes.push(Node { data, grad: 0.0, op });
        NodeId(self.nodes.len() - 1)
    }

    /// Records a leaf value
    pub fn leaf(&mut self, data: f64) -> NodeId {
        self.push(data, Op::Leaf)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let (a, b) = (self.data(lhs), self.data(rhs));
        let data = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a * b.powi(-1),
        };
        self.push(data, Op::Binary(op, lhs, rhs))
    }

    pub fn pow(&mut self, base: NodeId, exponent: f64) -> NodeId {
        let data = self.data(base).powf(exponent);
        self.push(data, Op::Pow(base, exponent))
    }

    pub fn unary(&mut self, op: UnaryOp, arg: NodeId) -> NodeId {
        let x = self.data(arg);
        let data = match op {
            UnaryOp::Neg => -x,
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::Relu => {
                if x < 0.0 {
                    0.0
                } else {
                    x
                }
            }
            UnaryOp::Exp => x.exp(),
        };
        self.push(data, Op::Unary(op, arg))
    }

    pub fn data(&self, id: NodeId) -> f64 {
        self.nodes[id.0].data
    }

    pub fn grad(&self, id: NodeId) -> f64 {
        self.nodes[id.0].grad
    }

    /// Back-propagates from `root`: sets its gradient to 1 and accumulates
    /// into every value it was computed from. Gradients are never reset, so
    /// repeated calls accumulate.
    pub fn backward(&mut self, root: NodeId) {
        let mut reachable = vec![false; root.0 + 1];
        reachable[root.0] = true;
        self.nodes[root.0].grad = 1.0;

        for index in (0..=root.0).rev() {
            if !reachable[index] {
                continue;
            }

            let node = self.nodes[index];
            for operand in node.op.operands() {
                reachable[operand.0] = true;
            }
            self.propagate(node);
        }
    }

    fn propagate(&mut self, node: Node) {
        let Node { data: out, grad: g, op } = node;

        match op {
            Op::Leaf => {}
            Op::Binary(BinaryOp::Add, lhs, rhs) => {
                self.accumulate(lhs, g);
                self.accumulate(rhs, g);
            }
            Op::Binary(BinaryOp::Sub, lhs, rhs) => {
                self.accumulate(lhs, g);
                self.accumulate(rhs, -g);
            }
            Op::Binary(BinaryOp::Mul, lhs, rhs) => {
                let (a, b) = (self.data(lhs), self.data(rhs));
                self.accumulate(lhs, b * g);
                self.accumulate(rhs, a * g);
            }
            Op::Binary(BinaryOp::Div, lhs, rhs) => {
                let (a, b) = (self.data(lhs), self.data(rhs));
                self.accumulate(lhs, b.powi(-1) * g);
                self.accumulate(rhs, -a * b.powi(-2) * g);
            }
            Op::Pow(base, exponent) => {
                let x = self.data(base);
                self.accumulate(base, exponent * x.powf(exponent - 1.0) * g);
            }
            Op::Unary(UnaryOp::Neg, arg) => self.accumulate(arg, -g),
            Op::Unary(UnaryOp::Tanh, arg) => self.accumulate(arg, (1.0 - out * out) * g),
            Op::Unary(UnaryOp::Relu, arg) => {
                let slope = if out > 0.0 { 1.0 } else { 0.0 };
                self.accumulate(arg, slope * g);
            }
            Op::Unary(UnaryOp::Exp, arg) => self.accumulate(arg, out * g),
        }
    }

    fn accumulate(&mut self, id: NodeId, delta: f64) {
        self.nodes[id.0].grad += delta;
    }
}
