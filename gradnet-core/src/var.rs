use crate::scalar::Real;
use crate::tape::{NodeId, Op, Tape};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A differentiable scalar: one node of the computation graph.
///
/// `Var` is a cheap handle (shared tape + arena index). Cloning a `Var`
/// clones the handle, not the node — all clones read and write the same
/// value and gradient. Arithmetic between two `Var`s, or between a
/// `Var` and a plain number, records a fresh node on the tape.
///
/// Combining `Var`s that live on different tapes panics: there is no
/// meaningful graph spanning two arenas.
#[derive(Clone)]
pub struct Var<T: Real> {
    pub(crate) tape: Tape<T>,
    pub(crate) id: NodeId,
}

impl<T: Real> Var<T> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// A clone of the handle to the tape this node lives on.
    pub fn tape(&self) -> Tape<T> {
        self.tape.clone()
    }

    pub fn value(&self) -> T {
        self.tape.value(self.id)
    }

    pub fn grad(&self) -> T {
        self.tape.grad(self.id)
    }

    /// Overwrites the stored value in place. Used by the optimizer step
    /// on parameter nodes.
    pub fn set_value(&self, value: T) {
        self.tape.set_value(self.id, value);
    }

    /// Resets the accumulated gradient to zero. Must be called on every
    /// parameter before each backward pass to avoid stale accumulation.
    pub fn zero_grad(&self) {
        self.tape.set_grad(self.id, T::zero());
    }

    /// Runs the backward pass with this node as the sink: its gradient
    /// is set to one and the chain rule populates `grad` on every
    /// ancestor. Intended for true terminal (loss) nodes only — a node
    /// with downstream consumers gets no contribution from them.
    pub fn backward(&self) {
        self.tape.backward_from(self.id);
    }

    pub fn exp(&self) -> Var<T> {
        self.tape.push(self.value().exp(), Op::Exp(self.id))
    }

    pub fn ln(&self) -> Var<T> {
        self.tape.push(self.value().ln(), Op::Ln(self.id))
    }

    /// Raises to a constant exponent.
    pub fn powf(&self, exponent: T) -> Var<T> {
        self.tape
            .push(self.value().powf(exponent), Op::Powf(self.id, exponent))
    }

    /// Raises to another node's power; both operands receive gradients
    /// (the exponent only for positive bases).
    pub fn pow(&self, exponent: &Var<T>) -> Var<T> {
        self.binary(
            exponent,
            self.value().powf(exponent.value()),
            Op::Pow(self.id, exponent.id),
        )
    }

    /// max(self, min). The gradient passes through only while the value
    /// is above the threshold.
    pub fn clamp_min(&self, min: T) -> Var<T> {
        self.tape
            .push(self.value().max(min), Op::ClampMin(self.id, min))
    }

    pub fn relu(&self) -> Var<T> {
        self.clamp_min(T::zero())
    }

    fn binary(&self, rhs: &Var<T>, value: T, op: Op<T>) -> Var<T> {
        assert!(
            self.tape.same_tape(&rhs.tape),
            "cannot combine Vars from different tapes"
        );
        self.tape.push(value, op)
    }
}

macro_rules! impl_var_binop {
    ($trait:ident, $method:ident, $variant:ident, $apply:expr) => {
        impl<'a, 'b, T: Real> $trait<&'b Var<T>> for &'a Var<T> {
            type Output = Var<T>;
            fn $method(self, rhs: &'b Var<T>) -> Var<T> {
                let apply: fn(T, T) -> T = $apply;
                let value = apply(self.value(), rhs.value());
                self.binary(rhs, value, Op::$variant(self.id, rhs.id))
            }
        }

        impl<T: Real> $trait<Var<T>> for Var<T> {
            type Output = Var<T>;
            fn $method(self, rhs: Var<T>) -> Var<T> {
                (&self).$method(&rhs)
            }
        }

        impl<'a, T: Real> $trait<&'a Var<T>> for Var<T> {
            type Output = Var<T>;
            fn $method(self, rhs: &'a Var<T>) -> Var<T> {
                (&self).$method(rhs)
            }
        }

        impl<'a, T: Real> $trait<Var<T>> for &'a Var<T> {
            type Output = Var<T>;
            fn $method(self, rhs: Var<T>) -> Var<T> {
                self.$method(&rhs)
            }
        }

        impl<'a, T: Real> $trait<T> for &'a Var<T> {
            type Output = Var<T>;
            fn $method(self, rhs: T) -> Var<T> {
                let rhs = self.tape.var(rhs);
                self.$method(&rhs)
            }
        }

        impl<T: Real> $trait<T> for Var<T> {
            type Output = Var<T>;
            fn $method(self, rhs: T) -> Var<T> {
                (&self).$method(rhs)
            }
        }
    };
}

impl_var_binop!(Add, add, Add, |a, b| a + b);
impl_var_binop!(Sub, sub, Sub, |a, b| a - b);
impl_var_binop!(Mul, mul, Mul, |a, b| a * b);
impl_var_binop!(Div, div, Div, |a, b| a / b);

impl<'a, T: Real> Neg for &'a Var<T> {
    type Output = Var<T>;
    fn neg(self) -> Var<T> {
        self.tape.push(-self.value(), Op::Neg(self.id))
    }
}

impl<T: Real> Neg for Var<T> {
    type Output = Var<T>;
    fn neg(self) -> Var<T> {
        -&self
    }
}

// Comparisons look at current values only; they do not record nodes.
impl<T: Real> PartialEq for Var<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl<T: Real> PartialOrd for Var<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value().partial_cmp(&other.value())
    }
}

impl<T: Real> PartialEq<T> for Var<T> {
    fn eq(&self, other: &T) -> bool {
        self.value() == *other
    }
}

impl<T: Real> PartialOrd<T> for Var<T> {
    fn partial_cmp(&self, other: &T) -> Option<Ordering> {
        self.value().partial_cmp(other)
    }
}

impl<T: Real> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Var {{ value: {:?}, grad: {:?} }}",
            self.value(),
            self.grad()
        )
    }
}

impl<T: Real> fmt::Display for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use crate::tape::Tape;

    #[test]
    fn scalar_operands_become_leaves() {
        let tape = Tape::new();
        let x = tape.var(3.0);
        let y = &x * 2.0;
        let z = &y - 1.0;
        assert_eq!(y.value(), 6.0);
        assert_eq!(z.value(), 5.0);
        z.backward();
        assert_eq!(x.grad(), 2.0);
    }

    #[test]
    fn division_gradients() {
        let tape = Tape::new();
        let a = tape.var(6.0);
        let b = tape.var(2.0);
        let q = &a / &b;
        q.backward();
        assert_eq!(q.value(), 3.0);
        assert_eq!(a.grad(), 0.5); // 1 / b
        assert_eq!(b.grad(), -1.5); // -a / b^2
    }

    #[test]
    fn negation_and_owned_operands() {
        let tape = Tape::new();
        let a = tape.var(2.0);
        let out = -(a.clone() * a.clone());
        out.backward();
        assert_eq!(out.value(), -4.0);
        assert_eq!(a.grad(), -4.0);
    }

    #[test]
    fn exp_and_ln_round_values() {
        let tape = Tape::new();
        let x = tape.var(2.0f64);
        assert!((x.exp().value() - 2.0f64.exp()).abs() < 1e-15);
        assert!((x.ln().value() - 2.0f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn comparisons_use_values() {
        let tape = Tape::new();
        let a = tape.var(1.0);
        let b = tape.var(2.0);
        assert!(a < b);
        assert!(b >= 2.0);
        assert!(a == 1.0);
    }

    #[test]
    #[should_panic(expected = "different tapes")]
    fn mixing_tapes_panics() {
        let t1 = Tape::new();
        let t2 = Tape::new();
        let _ = &t1.var(1.0) + &t2.var(2.0);
    }
}
