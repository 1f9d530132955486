//! Tape-based reverse-mode automatic differentiation.
//!
//! Each recorded node stores its value and the local partial derivatives
//! with respect to its operands, evaluated when the node is pushed. The
//! backward sweep is then a single reverse pass of multiply-accumulate, and
//! yields the gradient with respect to every input at once.
//!
//! # Example
//! ```
//! use jsu_ad::tape::Tape;
//!
//! // x = s * sinh((z - g) / d) + l at z = 0.5
//! let mut tape = Tape::new();
//! let g = tape.var(0.0);
//! let d = tape.var(1.0);
//! let l = tape.var(2.0);
//! let s = tape.var(3.0);
//! let w = tape.f64_sub(0.5, g);
//! let w = tape.div(w, d);
//! let w = tape.sinh(w);
//! let w = tape.mul(s, w);
//! let x = tape.add(w, l);
//! tape.backward(x);
//! assert_eq!(tape.adjoint(l), 1.0);
//! assert_eq!(tape.adjoint(s), 0.5f64.sinh());
//! ```

/// Handle to a node on the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var(pub(crate) usize);

/// Recorded node: value plus local partials w.r.t. its operands.
#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { val: f64 },
    Unary { val: f64, a: usize, da: f64 },
    Binary { val: f64, a: usize, b: usize, da: f64, db: f64 },
}

impl Node {
    #[inline]
    fn val(&self) -> f64 {
        match *self {
            Node::Leaf { val } | Node::Unary { val, .. } | Node::Binary { val, .. } => val,
        }
    }
}

/// Reverse-mode AD tape.
///
/// Record inputs with [`var`](Tape::var), combine them with the arithmetic
/// and elementary functions below, then call [`backward`](Tape::backward)
/// and read gradients with [`adjoint`](Tape::adjoint).
#[derive(Debug, Default)]
pub struct Tape {
    nodes: Vec<Node>,
    adjoints: Vec<f64>,
}

impl Tape {
    /// Empty tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty tape with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: Vec::with_capacity(capacity), adjoints: Vec::with_capacity(capacity) }
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Forget every node, keeping the allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.adjoints.clear();
    }

    #[inline]
    fn push(&mut self, node: Node) -> Var {
        self.nodes.push(node);
        Var(self.nodes.len() - 1)
    }

    #[inline]
    fn unary_node(&mut self, a: Var, val: f64, da: f64) -> Var {
        self.push(Node::Unary { val, a: a.0, da })
    }

    #[inline]
    fn binary_node(&mut self, a: Var, b: Var, val: f64, da: f64, db: f64) -> Var {
        self.push(Node::Binary { val, a: a.0, b: b.0, da, db })
    }

    /// Record an input.
    #[inline]
    pub fn var(&mut self, val: f64) -> Var {
        self.push(Node::Leaf { val })
    }

    /// Record a constant. Its adjoint is computed but meaningless.
    #[inline]
    pub fn constant(&mut self, val: f64) -> Var {
        self.push(Node::Leaf { val })
    }

    /// Primal value of `v`.
    #[inline]
    pub fn val(&self, v: Var) -> f64 {
        self.nodes[v.0].val()
    }

    /// `a + b`
    #[inline]
    pub fn add(&mut self, a: Var, b: Var) -> Var {
        let val = self.val(a) + self.val(b);
        self.binary_node(a, b, val, 1.0, 1.0)
    }

    /// `a - b`
    #[inline]
    pub fn sub(&mut self, a: Var, b: Var) -> Var {
        let val = self.val(a) - self.val(b);
        self.binary_node(a, b, val, 1.0, -1.0)
    }

    /// `a * b`
    #[inline]
    pub fn mul(&mut self, a: Var, b: Var) -> Var {
        let (va, vb) = (self.val(a), self.val(b));
        self.binary_node(a, b, va * vb, vb, va)
    }

    /// `a / b`
    #[inline]
    pub fn div(&mut self, a: Var, b: Var) -> Var {
        let (va, vb) = (self.val(a), self.val(b));
        let q = va / vb;
        self.binary_node(a, b, q, 1.0 / vb, -q / vb)
    }

    /// `-a`
    #[inline]
    pub fn neg(&mut self, a: Var) -> Var {
        let val = -self.val(a);
        self.unary_node(a, val, -1.0)
    }

    /// `ln(a)`
    #[inline]
    pub fn ln(&mut self, a: Var) -> Var {
        let va = self.val(a);
        self.unary_node(a, va.ln(), 1.0 / va)
    }

    /// `exp(a)`
    #[inline]
    pub fn exp(&mut self, a: Var) -> Var {
        let e = self.val(a).exp();
        self.unary_node(a, e, e)
    }

    /// `sqrt(a)`
    #[inline]
    pub fn sqrt(&mut self, a: Var) -> Var {
        let r = self.val(a).sqrt();
        self.unary_node(a, r, 0.5 / r)
    }

    /// `sinh(a)`
    #[inline]
    pub fn sinh(&mut self, a: Var) -> Var {
        let va = self.val(a);
        self.unary_node(a, va.sinh(), va.cosh())
    }

    /// `cosh(a)`
    #[inline]
    pub fn cosh(&mut self, a: Var) -> Var {
        let va = self.val(a);
        self.unary_node(a, va.cosh(), va.sinh())
    }

    /// `asinh(a)`
    #[inline]
    pub fn asinh(&mut self, a: Var) -> Var {
        let va = self.val(a);
        self.unary_node(a, va.asinh(), 1.0 / va.mul_add(va, 1.0).sqrt())
    }

    /// `ln(1 + a)`
    #[inline]
    pub fn ln_1p(&mut self, a: Var) -> Var {
        let va = self.val(a);
        self.unary_node(a, va.ln_1p(), 1.0 / (1.0 + va))
    }

    /// `exp(a) - 1`
    #[inline]
    pub fn exp_m1(&mut self, a: Var) -> Var {
        let va = self.val(a);
        self.unary_node(a, va.exp_m1(), va.exp())
    }

    /// Record `f(a)` for a function evaluated outside the tape: `val` is
    /// `f(a)` and `deriv` is `f'(a)`.
    #[inline]
    pub fn unary(&mut self, a: Var, val: f64, deriv: f64) -> Var {
        self.unary_node(a, val, deriv)
    }

    /// Sum of `vars` (a constant zero for an empty slice).
    pub fn sum(&mut self, vars: &[Var]) -> Var {
        match vars.split_first() {
            None => self.constant(0.0),
            Some((&first, rest)) => rest.iter().fold(first, |acc, &v| self.add(acc, v)),
        }
    }

    /// `a + s`
    #[inline]
    pub fn add_f64(&mut self, a: Var, s: f64) -> Var {
        let val = self.val(a) + s;
        self.unary_node(a, val, 1.0)
    }

    /// `s - a`
    #[inline]
    pub fn f64_sub(&mut self, s: f64, a: Var) -> Var {
        let val = s - self.val(a);
        self.unary_node(a, val, -1.0)
    }

    /// `a * s`
    #[inline]
    pub fn mul_f64(&mut self, a: Var, s: f64) -> Var {
        let val = self.val(a) * s;
        self.unary_node(a, val, s)
    }

    /// Reverse sweep from `out`. Afterwards [`adjoint`](Tape::adjoint)
    /// returns `∂out/∂v` for any recorded `v`.
    pub fn backward(&mut self, out: Var) {
        self.adjoints.clear();
        self.adjoints.resize(self.nodes.len(), 0.0);
        self.adjoints[out.0] = 1.0;

        for i in (0..=out.0).rev() {
            let adj = self.adjoints[i];
            if adj == 0.0 {
                continue;
            }
            match self.nodes[i] {
                Node::Leaf { .. } => {}
                Node::Unary { a, da, .. } => self.adjoints[a] += adj * da,
                Node::Binary { a, b, da, db, .. } => {
                    self.adjoints[a] += adj * da;
                    self.adjoints[b] += adj * db;
                }
            }
        }
    }

    /// `∂out/∂v` from the last [`backward`](Tape::backward); 0 before it.
    #[inline]
    pub fn adjoint(&self, v: Var) -> f64 {
        self.adjoints.get(v.0).copied().unwrap_or(0.0)
    }
}
