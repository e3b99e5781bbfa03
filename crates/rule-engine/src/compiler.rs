//! 规则编译器
//!
//! 将原始 JSON 规则校验后一次性转换为强类型的条件树，并预提取规则引用的字段。

use crate::discovery::{condition_type, is_condition, is_constraint};
use crate::error::{Result, RuleError};
use crate::models::{Condition, Constraint, Rule, RuleNode};
use crate::validator::RuleValidator;
use rules_shared::config::EngineConfig;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 强类型规则
    pub rule: Rule,
    /// 规则中引用的所有字段名
    pub required_fields: HashSet<String>,
}

impl CompiledRule {
    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

/// 规则编译器
#[derive(Debug, Clone, Default)]
pub struct RuleCompiler {
    validator: RuleValidator,
}

impl RuleCompiler {
    pub fn new(max_depth: usize) -> Self {
        Self {
            validator: RuleValidator::new(max_depth),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_depth)
    }

    /// 从 JSON 字符串编译规则
    pub fn compile_from_json(&self, json: &str) -> Result<CompiledRule> {
        let raw: Value = serde_json::from_str(json)?;
        self.compile(&raw)
    }

    /// 编译规则
    ///
    /// 校验失败时返回 `MalformedRule`，携带第一个错误的信息和位置；
    /// 嵌套超出深度限制时返回 `DepthExceeded`。
    #[instrument(level = "debug", skip_all)]
    pub fn compile(&self, raw: &Value) -> Result<CompiledRule> {
        self.validator.check(raw)?;

        let rule = self.build_rule(raw)?;
        let required_fields = extract_fields(&rule);

        debug!(
            conditions = rule.conditions.len(),
            fields = required_fields.len(),
            "Rule compiled"
        );

        Ok(CompiledRule {
            rule,
            required_fields,
        })
    }

    fn build_rule(&self, raw: &Value) -> Result<Rule> {
        let conditions = match raw.get("conditions") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.build_condition(item, &format!("conditions[{}]", i)))
                .collect::<Result<Vec<_>>>()?,
            Some(single @ Value::Object(_)) => vec![self.build_condition(single, "conditions")?],
            _ => {
                return Err(malformed(
                    "rule",
                    "A rule must have a 'conditions' property.",
                ));
            }
        };

        Ok(Rule {
            conditions,
            default: raw.get("default").cloned(),
        })
    }

    fn build_condition(&self, node: &Value, path: &str) -> Result<Condition> {
        let combinator = condition_type(node, path)?;
        let key = combinator.key();

        let children = node
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| malformed(path, format!("The '{}' property must be an array.", key)))?
            .iter()
            .enumerate()
            .map(|(i, child)| self.build_node(child, &format!("{}.{}[{}]", path, key, i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Condition {
            combinator,
            children,
            result: node.get("result").cloned(),
        })
    }

    fn build_node(&self, node: &Value, path: &str) -> Result<RuleNode> {
        if is_condition(node) {
            self.build_condition(node, path).map(RuleNode::Condition)
        } else if is_constraint(node) {
            Constraint::deserialize(node)
                .map(RuleNode::Constraint)
                .map_err(|e| malformed(path, e.to_string()))
        } else {
            Err(malformed(
                path,
                "A node must be either a condition or a constraint.",
            ))
        }
    }
}

fn malformed(path: &str, message: impl Into<String>) -> RuleError {
    RuleError::MalformedRule {
        message: message.into(),
        path: path.to_string(),
    }
}

/// 提取规则中引用的所有字段
fn extract_fields(rule: &Rule) -> HashSet<String> {
    let mut fields = HashSet::new();
    for condition in &rule.conditions {
        collect_fields(condition, &mut fields);
    }
    fields
}

fn collect_fields(condition: &Condition, fields: &mut HashSet<String>) {
    for child in &condition.children {
        match child {
            RuleNode::Constraint(constraint) => {
                fields.insert(constraint.field.clone());
            }
            RuleNode::Condition(nested) => collect_fields(nested, fields),
        }
    }
}
