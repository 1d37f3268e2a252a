//! Bounded abstract interpretation for array-index safety.
//!
//! Tracks the known inclusive ranges of loop induction variables through a
//! scope stack. An index expression classifies as a literal (exact check), a
//! bounded range (the loop's full range is checked), or unknown (the
//! validator degrades to a warning rather than a false positive).

use gamec_ir::ir::{BinOp, Expr};
use std::collections::HashMap;

/// Classification of an array index expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexClass {
    /// A compile-time constant.
    Literal(i32),
    /// A value provably within `lo..=hi` (a loop induction variable, or
    /// arithmetic on one that still folds to a range).
    Bounded { lo: i32, hi: i32 },
    /// No range can be proven.
    Unknown,
}

/// Scope stack of induction-variable ranges.
#[derive(Debug, Default)]
pub struct RangeEnv {
    scopes: Vec<HashMap<String, (i32, i32)>>,
}

impl RangeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind a loop induction variable's inclusive range in the current scope.
    pub fn bind(&mut self, name: &str, lo: i32, hi: i32) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), (lo, hi));
        }
    }

    /// Look up a bound range, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<(i32, i32)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// True when `name` is a live induction variable.
    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// Classify an index expression against the current range environment.
pub fn classify(index: &Expr, env: &RangeEnv) -> IndexClass {
    match index {
        Expr::Literal(v) => IndexClass::Literal(*v),
        Expr::Variable(name) => match env.lookup(name) {
            Some((lo, hi)) => IndexClass::Bounded { lo, hi },
            None => IndexClass::Unknown,
        },
        // Offset arithmetic on a classified value still folds to a range.
        Expr::Binary { left, op, right } => {
            let (lhs, rhs) = (classify(left, env), classify(right, env));
            combine(lhs, *op, rhs)
        }
        _ => IndexClass::Unknown,
    }
}

fn combine(lhs: IndexClass, op: BinOp, rhs: IndexClass) -> IndexClass {
    let (llo, lhi) = match lhs {
        IndexClass::Literal(v) => (v, v),
        IndexClass::Bounded { lo, hi } => (lo, hi),
        IndexClass::Unknown => return IndexClass::Unknown,
    };
    let (rlo, rhi) = match rhs {
        IndexClass::Literal(v) => (v, v),
        IndexClass::Bounded { lo, hi } => (lo, hi),
        IndexClass::Unknown => return IndexClass::Unknown,
    };
    let (lo, hi) = match op {
        BinOp::Add => (llo + rlo, lhi + rhi),
        BinOp::Sub => (llo - rhi, lhi - rlo),
        // Interval multiplication only where signs keep it monotone; a
        // negative bound falls back to the full corner set.
        BinOp::Mul => {
            let corners = [llo * rlo, llo * rhi, lhi * rlo, lhi * rhi];
            (
                *corners.iter().min().unwrap_or(&0),
                *corners.iter().max().unwrap_or(&0),
            )
        }
        _ => return IndexClass::Unknown,
    };
    if lo == hi {
        IndexClass::Literal(lo)
    } else {
        IndexClass::Bounded { lo, hi }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamec_ir::ir::Expr;

    #[test]
    fn test_literal_index() {
        let env = RangeEnv::new();
        assert_eq!(classify(&Expr::literal(10), &env), IndexClass::Literal(10));
    }

    #[test]
    fn test_bound_loop_variable() {
        let mut env = RangeEnv::new();
        env.push_scope();
        env.bind("i", 0, 7);
        assert_eq!(
            classify(&Expr::var("i"), &env),
            IndexClass::Bounded { lo: 0, hi: 7 }
        );
        env.pop_scope();
        assert_eq!(classify(&Expr::var("i"), &env), IndexClass::Unknown);
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut env = RangeEnv::new();
        env.push_scope();
        env.bind("i", 0, 3);
        env.push_scope();
        env.bind("i", 2, 9);
        assert_eq!(env.lookup("i"), Some((2, 9)));
        env.pop_scope();
        assert_eq!(env.lookup("i"), Some((0, 3)));
    }

    #[test]
    fn test_offset_arithmetic_folds() {
        let mut env = RangeEnv::new();
        env.push_scope();
        env.bind("i", 0, 7);
        let idx = Expr::binary(Expr::var("i"), BinOp::Add, Expr::literal(1));
        assert_eq!(classify(&idx, &env), IndexClass::Bounded { lo: 1, hi: 8 });
    }

    #[test]
    fn test_unknown_variable_stays_unknown() {
        let env = RangeEnv::new();
        let idx = Expr::binary(Expr::var("cursor"), BinOp::Add, Expr::literal(1));
        assert_eq!(classify(&idx, &env), IndexClass::Unknown);
    }
}
