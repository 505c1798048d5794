use serde::{Deserialize, Serialize};

/// GROQ Abstract Syntax Tree types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    // Literals
    StringLiteral(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Null,
    Array(Vec<Expr>),
    /// `{ ... }` in value position, evaluated against `@`.
    Object(Vec<(String, Expr)>),

    // Identifiers & access
    Ident(String),
    DotAccess(Box<Expr>, String),
    /// `base->` or `base->field`.
    Deref(Box<Expr>, Option<String>),
    This,
    Parent,

    // Comparison operators
    Eq(Box<Expr>, Box<Expr>),
    Neq(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Lte(Box<Expr>, Box<Expr>),
    Gte(Box<Expr>, Box<Expr>),
    In(Box<Expr>, Box<Expr>),
    Match(Box<Expr>, Box<Expr>),

    // Logical operators
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),

    // Query constructs. A pipeline is a source followed by stages.
    Everything,
    Pipeline(Vec<Expr>),
    Filter(Box<Expr>),
    Projection(Vec<(String, Expr)>),
    /// Sort keys with `true` for ascending.
    Order(Vec<(Expr, bool)>),
    /// Half-open range `[start, end)`.
    Slice(i64, i64),
    Index(i64),
    /// `[]` array traversal.
    Traverse,

    // Function call
    FuncCall(String, Vec<Expr>),

    // Parameter reference ($param)
    Param(String),
}

impl Expr {
    /// Append a pipeline stage, turning a plain expression into a pipeline.
    pub fn with_stage(self, stage: Expr) -> Expr {
        match self {
            Expr::Pipeline(mut stages) => {
                stages.push(stage);
                Expr::Pipeline(stages)
            }
            other => Expr::Pipeline(vec![other, stage]),
        }
    }

    /// True when the projection key is the `...` spread marker.
    pub fn is_spread_key(key: &str) -> bool {
        key == "..."
    }
}
