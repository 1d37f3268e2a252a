//! Expression lowering — IR expressions to C text.
//!
//! Binary and unary expressions are fully parenthesized; the output trades
//! prettiness for an unambiguous, deterministic mapping. Name resolution
//! depends on the lowering scope: inside pool hooks, the pool's per-slot
//! names lower to `pool_<name>_<field>[i]`.

use gamec_ir::game::{Game, Pool};
use gamec_ir::ir::{Expr, UnaryOp};

use crate::names;

/// The current slot index variable in pool per-slot code.
pub const SLOT_VAR: &str = "i";

/// Lowering scope for name resolution.
pub struct LowerCtx<'a> {
    pub game: &'a Game,
    /// The pool whose per-slot names are in scope, if any.
    pub pool: Option<&'a Pool>,
    /// Live loop induction variables, innermost last. Lowered verbatim
    /// (they are C locals of the enclosing generated loop).
    pub loop_vars: Vec<String>,
    /// Whether the pool in scope carries the implicit particle lifetime.
    pub has_lifetime: bool,
}

impl<'a> LowerCtx<'a> {
    pub fn global(game: &'a Game) -> Self {
        Self {
            game,
            pool: None,
            loop_vars: Vec::new(),
            has_lifetime: false,
        }
    }

    pub fn in_pool(game: &'a Game, pool: &'a Pool, has_lifetime: bool) -> Self {
        Self {
            game,
            pool: Some(pool),
            loop_vars: Vec::new(),
            has_lifetime,
        }
    }

    /// Lower a scalar name to its C lvalue.
    pub fn lvalue(&self, name: &str) -> String {
        if self.loop_vars.iter().any(|v| v == name) {
            return names::c_ident(name);
        }
        if let Some(pool) = self.pool {
            if self.is_slot_name(pool, name) {
                return format!("{}[{SLOT_VAR}]", names::pool_field(&pool.name, name));
            }
        }
        names::var(name)
    }

    fn is_slot_name(&self, pool: &Pool, name: &str) -> bool {
        if pool.fields.iter().any(|f| f.name == name) {
            return true;
        }
        if pool.has_position && (name == "x" || name == "y") {
            return true;
        }
        if pool.has_velocity && (name == "vx" || name == "vy") {
            return true;
        }
        self.has_lifetime && name == "_lifetime"
    }
}

/// Lower one expression to C text.
pub fn emit_expr(expr: &Expr, ctx: &LowerCtx<'_>) -> String {
    match expr {
        Expr::Literal(value) => value.to_string(),
        Expr::Variable(name) => ctx.lvalue(name),
        Expr::ArrayIndex { array, index } => {
            format!("{}[{}]", names::array(array), emit_expr(index, ctx))
        }
        Expr::Binary { left, op, right } => format!(
            "({} {} {})",
            emit_expr(left, ctx),
            op.c_token(),
            emit_expr(right, ctx)
        ),
        Expr::Unary { op, operand } => {
            let token = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            };
            format!("({token}{})", emit_expr(operand, ctx))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamec_ir::game::GameBuilder;
    use gamec_ir::ir::BinOp;

    #[test]
    fn test_global_lowering() {
        let game = GameBuilder::new().build();
        let ctx = LowerCtx::global(&game);
        let expr = Expr::binary(
            Expr::var("score"),
            BinOp::Add,
            Expr::index("inventory", Expr::literal(2)),
        );
        assert_eq!(emit_expr(&expr, &ctx), "(var_score + arr_inventory[2])");
    }

    #[test]
    fn test_loop_var_lowers_verbatim() {
        let game = GameBuilder::new().build();
        let mut ctx = LowerCtx::global(&game);
        ctx.loop_vars.push("k".into());
        assert_eq!(
            emit_expr(&Expr::index("inventory", Expr::var("k")), &ctx),
            "arr_inventory[k]"
        );
    }

    #[test]
    fn test_pool_slot_lowering() {
        use gamec_ir::game::Pool;
        let game = GameBuilder::new().build();
        let pool = Pool {
            name: "bullets".into(),
            capacity: 8,
            has_position: true,
            has_velocity: false,
            sprite: None,
            fields: Vec::new(),
            on_spawn: Vec::new(),
            on_frame: Vec::new(),
            on_despawn: Vec::new(),
            despawn_when: Vec::new(),
        };
        let ctx = LowerCtx::in_pool(&game, &pool, false);
        assert_eq!(emit_expr(&Expr::var("x"), &ctx), "pool_bullets_x[i]");
        assert_eq!(emit_expr(&Expr::var("score"), &ctx), "var_score");
    }
}
