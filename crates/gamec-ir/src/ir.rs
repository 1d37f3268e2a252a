//! IR node types: the closed statement and expression variant sets.
//!
//! Every statement optionally carries an [`Origin`] produced by the
//! front-end. The core treats origins as opaque except for propagating them
//! into the source map. Recursive variants are boxed where they would bloat
//! the enum; statement lists are plain `Vec<Stmt>` in source order.

use crate::Origin;

// ══════════════════════════════════════════════════════════════════════════════
// Element types
// ══════════════════════════════════════════════════════════════════════════════

/// Storage type of a variable, array element, or save field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    U8,
    U16,
    I8,
    I16,
}

impl VarType {
    /// Inclusive numeric range of the type.
    pub fn bounds(self) -> (i32, i32) {
        match self {
            VarType::U8 => (0, 255),
            VarType::U16 => (0, 65535),
            VarType::I8 => (-128, 127),
            VarType::I16 => (-32768, 32767),
        }
    }

    /// Storage size in bytes.
    pub fn size_bytes(self) -> u32 {
        match self {
            VarType::U8 | VarType::I8 => 1,
            VarType::U16 | VarType::I16 => 2,
        }
    }

    /// The C type name used in generated code.
    pub fn c_name(self) -> &'static str {
        match self {
            VarType::U8 => "uint8_t",
            VarType::U16 => "uint16_t",
            VarType::I8 => "int8_t",
            VarType::I16 => "int16_t",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Expressions carry no origin of their own — findings
/// against an expression are reported at the enclosing statement's origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An integer literal.
    Literal(i32),
    /// A reference to a declared variable, a loop induction variable, or —
    /// inside pool hooks — a per-slot field.
    Variable(String),
    /// `array[index]`
    ArrayIndex { array: String, index: Box<Expr> },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
}

impl Expr {
    pub fn literal(value: i32) -> Self {
        Expr::Literal(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn index(array: impl Into<String>, index: Expr) -> Self {
        Expr::ArrayIndex {
            array: array.into(),
            index: Box::new(index),
        }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// The literal value, if this expression is one.
    pub fn as_literal(&self) -> Option<i32> {
        match self {
            Expr::Literal(v) => Some(*v),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// The C operator token.
    pub fn c_token(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement with its optional source origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub origin: Option<Origin>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, origin: None }
    }

    /// Tag this statement with an origin. Tagging an already-tagged
    /// statement is a no-op, so re-recording through the front-end is safe.
    pub fn tag(&mut self, origin: Origin) {
        if self.origin.is_none() {
            self.origin = Some(origin);
        }
    }

    /// Builder-style origin tagging with the same idempotence.
    pub fn tagged(mut self, origin: Origin) -> Self {
        self.tag(origin);
        self
    }
}

/// The closed statement variant set: general control flow plus one variant
/// per domain subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `target = value`
    Assign { target: String, value: Expr },
    /// `array[index] = value`
    ArrayAssign {
        array: String,
        index: Expr,
        value: Expr,
    },
    /// `if (condition) { then } else { otherwise }`
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    /// `if (condition) { body }` without an else arm.
    When { condition: Expr, body: Vec<Stmt> },
    While { condition: Expr, body: Vec<Stmt> },
    /// Bounded counted loop, `from..=to` inclusive. The induction variable's
    /// range is known statically, which the array-bounds pass exploits.
    For {
        var: String,
        from: i32,
        to: i32,
        body: Vec<Stmt>,
    },
    /// Invoke a declared cutscene by name.
    Call { cutscene: String },
    /// Switch to another scene (runs exit/enter hooks).
    SceneChange { scene: String },
    /// Verbatim C text pasted into the output.
    RawEmit { code: String },
    /// Start a named animation on a sprite.
    Animation { sprite: String, animation: String },
    Camera(CameraOp),
    Transition(TransitionOp),
    Pool(PoolOp),
    Menu(MenuOp),
    Dialog(DialogOp),
    Mixer(MixerOp),
    Tween(Tween),
}

/// Camera control statements (valid only when a camera is declared).
#[derive(Debug, Clone, PartialEq)]
pub enum CameraOp {
    /// Track a declared entity's position.
    Follow { entity: String },
    /// Jump to an absolute world position.
    MoveTo { x: Expr, y: Expr },
    /// Screen shake for a fixed number of frames.
    Shake { frames: u8 },
}

/// Screen transition statements.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOp {
    FadeOut { frames: u8 },
    FadeIn { frames: u8 },
}

/// Pool lifecycle statements.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolOp {
    /// Spawn into the first free slot. On a full pool this sets the pool's
    /// sticky overflow flag; it never overwrites a live slot.
    Spawn { pool: String },
    /// Spawn with the full/empty outcome exposed to the caller.
    TrySpawn {
        pool: String,
        on_spawned: Vec<Stmt>,
        on_full: Vec<Stmt>,
    },
    /// Run onDespawn for every active slot and clear the pool.
    DespawnAll { pool: String },
}

/// Menu statements.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuOp {
    Open { menu: String },
    Close,
}

/// Dialog statements.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOp {
    Show { dialog: String },
    Hide,
}

/// Audio mixer statements.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerOp {
    Play { group: String, sound: u8 },
    Stop { group: String },
    SetVolume { group: String, volume: Expr },
}

/// A tween request: interpolate `target` from `from` to `to` over
/// `duration_frames` using the given easing curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: String,
    pub target_type: VarType,
    pub from: Expr,
    pub to: Expr,
    pub duration_frames: u32,
    pub easing: Easing,
}

/// Easing curve kinds. Only kinds actually referenced in a game get a
/// generated lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    Bounce,
}

impl Easing {
    /// Stable table/constant suffix in generated C.
    pub fn c_suffix(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::QuadIn => "quad_in",
            Easing::QuadOut => "quad_out",
            Easing::QuadInOut => "quad_in_out",
            Easing::CubicIn => "cubic_in",
            Easing::CubicOut => "cubic_out",
            Easing::Bounce => "bounce",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Traversal
// ══════════════════════════════════════════════════════════════════════════════

impl StmtKind {
    /// The nested statement lists of this statement, in source order.
    pub fn child_bodies(&self) -> Vec<&[Stmt]> {
        match self {
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => vec![then_body.as_slice(), else_body.as_slice()],
            StmtKind::When { body, .. }
            | StmtKind::While { body, .. }
            | StmtKind::For { body, .. } => vec![body.as_slice()],
            StmtKind::Pool(PoolOp::TrySpawn {
                on_spawned,
                on_full,
                ..
            }) => vec![on_spawned.as_slice(), on_full.as_slice()],
            _ => Vec::new(),
        }
    }

    /// The expressions directly held by this statement (not recursing into
    /// child statement lists).
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            StmtKind::Assign { value, .. } => vec![value],
            StmtKind::ArrayAssign { index, value, .. } => vec![index, value],
            StmtKind::If { condition, .. }
            | StmtKind::When { condition, .. }
            | StmtKind::While { condition, .. } => vec![condition],
            StmtKind::Camera(CameraOp::MoveTo { x, y }) => vec![x, y],
            StmtKind::Mixer(MixerOp::SetVolume { volume, .. }) => vec![volume],
            StmtKind::Tween(tween) => vec![&tween.from, &tween.to],
            _ => Vec::new(),
        }
    }
}

/// Depth-first pre-order walk over a statement list and all nested bodies.
pub fn visit_stmts<'a>(stmts: &'a [Stmt], f: &mut dyn FnMut(&'a Stmt)) {
    for stmt in stmts {
        f(stmt);
        for body in stmt.kind.child_bodies() {
            visit_stmts(body, f);
        }
    }
}

/// Every variable and array name an expression mentions.
pub fn expr_names<'a>(expr: &'a Expr, out: &mut Vec<(&'a str, bool)>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Variable(name) => out.push((name, false)),
        Expr::ArrayIndex { array, index } => {
            out.push((array, true));
            expr_names(index, out);
        }
        Expr::Binary { left, right, .. } => {
            expr_names(left, out);
            expr_names(right, out);
        }
        Expr::Unary { operand, .. } => expr_names(operand, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_type_bounds() {
        assert_eq!(VarType::U8.bounds(), (0, 255));
        assert_eq!(VarType::U16.bounds(), (0, 65535));
        assert_eq!(VarType::I8.bounds(), (-128, 127));
        assert_eq!(VarType::I16.bounds(), (-32768, 32767));
    }

    #[test]
    fn test_tagging_is_idempotent() {
        let mut stmt = Stmt::new(StmtKind::Assign {
            target: "score".into(),
            value: Expr::literal(0),
        });
        stmt.tag(Origin::new("game.def", 4, 2));
        stmt.tag(Origin::new("other.def", 99, 1));
        assert_eq!(stmt.origin.as_ref().unwrap().file, "game.def");
        assert_eq!(stmt.origin.as_ref().unwrap().line, 4);
    }

    #[test]
    fn test_as_literal() {
        assert_eq!(Expr::literal(7).as_literal(), Some(7));
        assert_eq!(Expr::var("hp").as_literal(), None);
    }
}
