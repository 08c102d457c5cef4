use crate::scalar::Real;
use crate::var::Var;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// Index of a node in the tape's arena.
pub type NodeId = usize;

/// The operation that produced a node, with arena indices of its
/// operands. `Leaf` marks parameters and constants: nothing flows
/// below them during the backward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op<T> {
    Leaf,
    Add(NodeId, NodeId),
    Sub(NodeId, NodeId),
    Mul(NodeId, NodeId),
    Div(NodeId, NodeId),
    Neg(NodeId),
    /// base ^ exponent, both differentiable.
    Pow(NodeId, NodeId),
    /// base ^ constant.
    Powf(NodeId, T),
    Exp(NodeId),
    Ln(NodeId),
    /// max(operand, constant); gradient passes through only above the
    /// threshold. Used for probability clipping and ReLU.
    ClampMin(NodeId, T),
}

#[derive(Debug, Clone, Copy)]
struct Node<T> {
    value: T,
    grad: T,
    op: Op<T>,
}

/// Insertion-ordered arena of scalar nodes.
///
/// The tape is a cheaply clonable handle (`Rc` internally); all clones
/// share the same arena. It is deliberately `!Send`: the training loop
/// is single-threaded and parameters are owned by exactly one
/// classifier instance.
#[derive(Debug, Clone)]
pub struct Tape<T: Real> {
    nodes: Rc<RefCell<Vec<Node<T>>>>,
}

impl<T: Real> Tape<T> {
    pub fn new() -> Self {
        Tape {
            nodes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Creates a new leaf node (parameter or constant) holding `value`.
    pub fn var(&self, value: T) -> Var<T> {
        self.push(value, Op::Leaf)
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Marks the current arena length so the transient part of a graph
    /// can be rolled back with [`Tape::truncate`].
    pub fn checkpoint(&self) -> usize {
        self.len()
    }

    /// Discards every node created after `mark`. Handles created for
    /// the discarded nodes must not be used afterwards; nodes at or
    /// below `mark` (parameters, converted inputs) stay valid.
    pub fn truncate(&self, mark: usize) {
        self.nodes.borrow_mut().truncate(mark);
    }

    /// Two handles share a tape iff they share the underlying arena.
    pub fn same_tape(&self, other: &Tape<T>) -> bool {
        Rc::ptr_eq(&self.nodes, &other.nodes)
    }

    pub(crate) fn push(&self, value: T, op: Op<T>) -> Var<T> {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(Node {
            value,
            grad: T::zero(),
            op,
        });
        Var {
            tape: self.clone(),
            id,
        }
    }

    pub(crate) fn value(&self, id: NodeId) -> T {
        self.nodes.borrow()[id].value
    }

    pub(crate) fn grad(&self, id: NodeId) -> T {
        self.nodes.borrow()[id].grad
    }

    pub(crate) fn set_value(&self, id: NodeId, value: T) {
        self.nodes.borrow_mut()[id].value = value;
    }

    pub(crate) fn set_grad(&self, id: NodeId, grad: T) {
        self.nodes.borrow_mut()[id].grad = grad;
    }

    /// Reverse sweep from `sink` down to the start of the arena,
    /// applying the chain rule per [`Op`] and *accumulating* into each
    /// operand's gradient. Reverse insertion order is a valid reverse
    /// topological order because operands always precede results.
    ///
    /// Nodes whose accumulated gradient is still zero contribute
    /// nothing downstream and are skipped.
    pub(crate) fn backward_from(&self, sink: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[sink].grad = T::one();

        let mut visited = 0usize;
        for id in (0..=sink).rev() {
            let Node { value, grad, op } = nodes[id];
            if grad == T::zero() || matches!(op, Op::Leaf) {
                continue;
            }
            visited += 1;
            match op {
                Op::Leaf => {}
                Op::Add(a, b) => {
                    nodes[a].grad += grad;
                    nodes[b].grad += grad;
                }
                Op::Sub(a, b) => {
                    nodes[a].grad += grad;
                    nodes[b].grad -= grad;
                }
                Op::Mul(a, b) => {
                    let (va, vb) = (nodes[a].value, nodes[b].value);
                    nodes[a].grad += grad * vb;
                    nodes[b].grad += grad * va;
                }
                Op::Div(a, b) => {
                    let (va, vb) = (nodes[a].value, nodes[b].value);
                    nodes[a].grad += grad / vb;
                    nodes[b].grad -= grad * va / (vb * vb);
                }
                Op::Neg(a) => {
                    nodes[a].grad -= grad;
                }
                Op::Pow(a, b) => {
                    let (va, vb) = (nodes[a].value, nodes[b].value);
                    nodes[a].grad += grad * vb * va.powf(vb - T::one());
                    // d/d(exponent) = out * ln(base), defined only for
                    // positive bases.
                    if va > T::zero() {
                        nodes[b].grad += grad * value * va.ln();
                    }
                }
                Op::Powf(a, exponent) => {
                    let va = nodes[a].value;
                    nodes[a].grad += grad * exponent * va.powf(exponent - T::one());
                }
                Op::Exp(a) => {
                    nodes[a].grad += grad * value;
                }
                Op::Ln(a) => {
                    let va = nodes[a].value;
                    nodes[a].grad += grad / va;
                }
                Op::ClampMin(a, min) => {
                    if nodes[a].value > min {
                        nodes[a].grad += grad;
                    }
                }
            }
        }
        debug!(
            "backward from node {}: {} interior nodes visited",
            sink, visited
        );
    }
}

impl<T: Real> Default for Tape<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_start_with_zero_grad() {
        let tape = Tape::new();
        let x = tape.var(4.5);
        assert_eq!(x.value(), 4.5);
        assert_eq!(x.grad(), 0.0);
        assert_eq!(tape.len(), 1);
    }

    #[test]
    fn backward_through_add_and_mul() {
        let tape = Tape::new();
        let x = tape.var(2.0);
        let y = tape.var(3.0);
        let z = &(&x + &y) * &y; // (x + y) * y
        z.backward();
        assert_eq!(z.value(), 15.0);
        assert_eq!(x.grad(), 3.0); // y
        assert_eq!(y.grad(), 8.0); // x + 2y
    }

    #[test]
    fn gradient_accumulates_across_consumers() {
        let tape = Tape::new();
        let x = tape.var(1.5);
        let doubled = &x + &x;
        doubled.backward();
        assert_eq!(x.grad(), 2.0);

        // A second backward pass keeps accumulating unless the caller
        // resets the gradient first.
        doubled.backward();
        assert_eq!(x.grad(), 4.0);
        x.zero_grad();
        assert_eq!(x.grad(), 0.0);
    }

    #[test]
    fn two_paths_sum_their_contributions() {
        let tape = Tape::new();
        let x = tape.var(0.5);
        let a = x.exp();
        let b = x.powf(2.0);
        let out = &a + &b;
        out.backward();
        // d/dx (e^x + x^2) = e^x + 2x
        let expected = 0.5f64.exp() + 1.0;
        assert!((x.grad() - expected).abs() < 1e-12);
    }

    #[test]
    fn pow_of_two_nodes_differentiates_both_operands() {
        let tape = Tape::new();
        let a = tape.var(1.7f64);
        let b = tape.var(2.3f64);
        let out = a.pow(&b);
        out.backward();
        let expected_da = 2.3 * 1.7f64.powf(1.3);
        let expected_db = 1.7f64.powf(2.3) * 1.7f64.ln();
        assert!((a.grad() - expected_da).abs() < 1e-12);
        assert!((b.grad() - expected_db).abs() < 1e-12);
    }

    #[test]
    fn clamp_min_gates_the_gradient() {
        let tape = Tape::new();
        let below = tape.var(-1.0);
        let above = tape.var(2.0);
        let out = &below.clamp_min(0.0) + &above.clamp_min(0.0);
        out.backward();
        assert_eq!(below.grad(), 0.0);
        assert_eq!(above.grad(), 1.0);
        assert_eq!(out.value(), 2.0);
    }

    #[test]
    fn ln_backward_divides_by_the_operand() {
        let tape = Tape::new();
        let x = tape.var(4.0f64);
        let out = x.ln();
        out.backward();
        assert!((x.grad() - 0.25).abs() < 1e-15);
    }

    #[test]
    fn truncate_discards_stale_interior_gradients() {
        let tape = Tape::new();
        let w = tape.var(3.0);
        let mark = tape.checkpoint();

        let squared = &w * &w;
        squared.backward();
        assert_eq!(w.grad(), 6.0);

        // Without the rollback, the squared node would survive with a
        // gradient of one and the next sweep would add its 2w again.
        tape.truncate(mark);
        let shifted = &w + &tape.var(0.0);
        w.zero_grad();
        shifted.backward();
        assert_eq!(w.grad(), 1.0);
    }

    #[test]
    fn truncate_rolls_back_transient_nodes() {
        let tape = Tape::new();
        let w = tape.var(1.0);
        let mark = tape.checkpoint();
        for _ in 0..3 {
            let transient = &w * &w;
            let _ = transient.exp();
            tape.truncate(mark);
            assert_eq!(tape.len(), mark);
        }
        // The parameter below the checkpoint survives.
        assert_eq!(w.value(), 1.0);
    }
}
