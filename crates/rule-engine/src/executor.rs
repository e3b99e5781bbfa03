//! 规则执行器
//!
//! 递归评估条件树，按顺序评估顶层条件，首个匹配的条件胜出。

use crate::error::{Result, RuleError};
use crate::evaluator::ConstraintChecker;
use crate::models::{Condition, Constraint, Criteria, EvaluationResult, Rule, RuleNode};
use crate::operators::Combinator;
use rules_shared::config::EngineConfig;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument};

/// 规则执行器
#[derive(Debug, Clone)]
pub struct RuleExecutor {
    /// 条件最大嵌套深度
    max_depth: usize,
    /// 组结果确定后是否跳过剩余子节点
    short_circuit: bool,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            short_circuit: config.short_circuit,
            trace_enabled: config.trace_enabled,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_short_circuit(mut self, enabled: bool) -> Self {
        self.short_circuit = enabled;
        self
    }

    /// 执行规则评估，返回规则输出值
    pub fn evaluate(&self, rule: &Rule, criteria: &Criteria) -> Result<Value> {
        self.execute(rule, criteria).map(|result| result.value)
    }

    /// 执行规则评估
    ///
    /// 顶层条件按输入顺序评估，返回第一个匹配条件的 `result`（缺省为 `true`）；
    /// 全部不匹配时返回 `default`（缺省为 `false`）。
    #[instrument(level = "debug", skip_all, fields(conditions = rule.conditions.len()))]
    pub fn execute(&self, rule: &Rule, criteria: &Criteria) -> Result<EvaluationResult> {
        let start = Instant::now();
        let mut result = EvaluationResult::new();

        for (i, condition) in rule.conditions.iter().enumerate() {
            let path = format!("conditions[{}]", i);
            if self.evaluate_condition_at(condition, criteria, &mut result, &path, 1)? {
                result.matched = true;
                result.matched_condition = Some(i);
                result.value = non_null(&condition.result).unwrap_or(Value::Bool(true));
                break;
            }
        }

        if !result.matched {
            result.value = non_null(&rule.default).unwrap_or(Value::Bool(false));
            if self.trace_enabled {
                result
                    .evaluation_trace
                    .push(format!("no condition matched, returning {}", result.value));
            }
        }

        result.evaluation_time_us = start.elapsed().as_micros() as u64;

        debug!(
            matched = result.matched,
            matched_condition = ?result.matched_condition,
            elapsed_us = result.evaluation_time_us,
            "Rule evaluated"
        );

        Ok(result)
    }

    /// 评估单个条件（不记录追踪）
    pub fn evaluate_condition(&self, condition: &Condition, criteria: &Criteria) -> Result<bool> {
        let mut scratch = EvaluationResult::new();
        self.evaluate_condition_at(condition, criteria, &mut scratch, "condition", 1)
    }

    /// 递归评估条件节点
    fn evaluate_condition_at(
        &self,
        condition: &Condition,
        criteria: &Criteria,
        result: &mut EvaluationResult,
        path: &str,
        depth: usize,
    ) -> Result<bool> {
        if depth > self.max_depth {
            return Err(RuleError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }

        let combinator = condition.combinator;

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: evaluating {} group ({} children)",
                path,
                combinator,
                condition.children.len()
            ));
        }

        let mut outcome = combinator.identity();
        let matched_mark = result.matched_constraints.len();

        for (i, child) in condition.children.iter().enumerate() {
            let child_path = format!("{}.{}[{}]", path, combinator, i);
            let child_matched = match child {
                RuleNode::Condition(nested) => {
                    self.evaluate_condition_at(nested, criteria, result, &child_path, depth + 1)?
                }
                RuleNode::Constraint(constraint) => {
                    self.check_constraint(constraint, criteria, result, &child_path)?
                }
            };

            outcome = match combinator {
                Combinator::All => outcome && child_matched,
                Combinator::Any => outcome || child_matched,
            };

            if self.short_circuit && combinator.is_decided_by(child_matched) {
                if self.trace_enabled {
                    result.evaluation_trace.push(format!(
                        "{}: {} short-circuit at child {}",
                        path, combinator, i
                    ));
                }
                break;
            }
        }

        // 未匹配的分组不贡献匹配约束
        if !outcome {
            result.matched_constraints.truncate(matched_mark);
        }

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: {} group => {}",
                path,
                combinator,
                if outcome { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        Ok(outcome)
    }

    /// 评估约束节点
    fn check_constraint(
        &self,
        constraint: &Constraint,
        criteria: &Criteria,
        result: &mut EvaluationResult,
        path: &str,
    ) -> Result<bool> {
        let matched = ConstraintChecker::check(constraint, criteria)?;

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: {} {} {} => {}",
                path,
                constraint.field,
                constraint.operator,
                constraint.value,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        if matched {
            result.matched_constraints.push(format!(
                "{}: {} {} {}",
                path, constraint.field, constraint.operator, constraint.value
            ));
        }

        Ok(matched)
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// `null` 与缺省等价
fn non_null(value: &Option<Value>) -> Option<Value> {
    value.as_ref().filter(|v| !v.is_null()).cloned()
}
