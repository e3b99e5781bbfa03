//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Malformed rule at {path}: {message}")]
    MalformedRule { message: String, path: String },

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Operator {operator} cannot compare {left} with {right}")]
    Incomparable {
        operator: String,
        left: String,
        right: String,
    },

    #[error("Maximum nesting depth of {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
