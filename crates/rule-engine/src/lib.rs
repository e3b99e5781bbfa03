//! JSON 规则引擎
//!
//! 提供声明式规则的校验与评估能力，支持：
//! - `all` / `any` 嵌套条件与字段约束
//! - 结构校验，报告第一个错误及其位置
//! - 顶层条件首个匹配者胜出，未匹配时回退到默认值
//! - 可配置的嵌套深度限制、短路求值和评估追踪

pub mod compiler;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod operators;
pub mod validator;

pub use compiler::{CompiledRule, RuleCompiler};
pub use engine::{evaluate, validate, RuleEngine};
pub use error::{Result, RuleError};
pub use evaluator::ConstraintChecker;
pub use executor::RuleExecutor;
pub use models::{Condition, Constraint, Criteria, EvaluationResult, Rule, RuleNode};
pub use operators::{Combinator, Operator};
pub use rules_shared::config::EngineConfig;
pub use validator::{RuleValidator, ValidationError, ValidationResult};
