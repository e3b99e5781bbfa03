//! 规则引擎入口
//!
//! 组合校验器、编译器和执行器，对外提供 `validate` / `evaluate` 两个操作。

use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::Result;
use crate::executor::RuleExecutor;
use crate::models::{Criteria, EvaluationResult};
use crate::validator::{RuleValidator, ValidationResult};
use rules_shared::config::EngineConfig;
use serde_json::Value;

/// 规则引擎
///
/// 不持有跨调用的状态，可在多个线程间共享。
#[derive(Debug, Clone)]
pub struct RuleEngine {
    validator: RuleValidator,
    compiler: RuleCompiler,
    executor: RuleExecutor,
}

impl RuleEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            validator: RuleValidator::new(config.max_depth),
            compiler: RuleCompiler::from_config(config),
            executor: RuleExecutor::from_config(config),
        }
    }

    /// 校验规则结构
    pub fn validate(&self, rule: &Value) -> ValidationResult {
        self.validator.validate(rule)
    }

    /// 编译规则，供重复评估使用
    pub fn compile(&self, rule: &Value) -> Result<CompiledRule> {
        self.compiler.compile(rule)
    }

    /// 评估规则，返回命中条件的 result、`true`、default 或 `false`
    pub fn evaluate(&self, rule: &Value, criteria: &Value) -> Result<Value> {
        self.evaluate_detailed(rule, criteria).map(|result| result.value)
    }

    /// 评估规则并返回完整的评估结果
    pub fn evaluate_detailed(&self, rule: &Value, criteria: &Value) -> Result<EvaluationResult> {
        let compiled = self.compiler.compile(rule)?;
        let criteria = Criteria::from_value(criteria.clone())?;
        self.executor.execute(compiled.rule(), &criteria)
    }

    /// 评估已编译的规则
    pub fn evaluate_compiled(
        &self,
        compiled: &CompiledRule,
        criteria: &Criteria,
    ) -> Result<EvaluationResult> {
        self.executor.execute(compiled.rule(), criteria)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// 使用默认配置校验规则
pub fn validate(rule: &Value) -> ValidationResult {
    RuleEngine::default().validate(rule)
}

/// 使用默认配置评估规则
pub fn evaluate(rule: &Value, criteria: &Value) -> Result<Value> {
    RuleEngine::default().evaluate(rule, criteria)
}
