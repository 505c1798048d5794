//! GROQ query language: lexer, parser and an in-memory evaluator.

pub mod ast;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::Expr;
pub use eval::{eval_filter, Dataset, EvalError, Evaluator};
pub use parser::{parse, ParseError};

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Parse and evaluate `src` against `dataset`.
pub fn query(src: &str, dataset: &Dataset, params: &Value, now: &str) -> Result<Value, QueryError> {
    let expr = parse(src)?;
    tracing::trace!(query = src, "evaluating GROQ query");
    Ok(Evaluator::new(dataset, params, now).evaluate(&expr)?)
}
