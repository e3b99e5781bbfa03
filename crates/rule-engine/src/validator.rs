//! 规则结构校验器
//!
//! 在评估前检查原始规则 JSON 的结构合法性。深度优先、子节点按列表顺序遍历，
//! 遇到第一个错误即返回，不汇总多个错误。

use crate::discovery::{condition_type, has_combinator_key, has_constraint_key};
use crate::error::RuleError;
use crate::operators::Operator;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// 嵌套条件携带 result 时的错误信息
pub const NESTED_RESULT_MESSAGE: &str = "Nested conditions cannot have a result property.";

/// 校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub message: String,
    /// 出错节点位置，如 `conditions[0].all[1]`；规则根部的错误没有路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// 超出嵌套深度限制时记录该限制
    #[serde(skip)]
    depth_limit: Option<usize>,
}

impl ValidationError {
    fn at(path: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Some(path.to_string()),
            depth_limit: None,
        }
    }

    fn depth_exceeded(path: &str, max_depth: usize) -> Self {
        Self {
            message: format!("Maximum nesting depth of {} exceeded.", max_depth),
            path: Some(path.to_string()),
            depth_limit: Some(max_depth),
        }
    }

    /// 是否因超出嵌套深度限制而失败
    pub fn is_depth_exceeded(&self) -> bool {
        self.depth_limit.is_some()
    }

    fn root(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            depth_limit: None,
        }
    }
}

impl From<RuleError> for ValidationError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::MalformedRule { message, path } => Self {
                message,
                path: Some(path),
                depth_limit: None,
            },
            RuleError::DepthExceeded { max_depth } => Self {
                message: format!("Maximum nesting depth of {} exceeded.", max_depth),
                path: None,
                depth_limit: Some(max_depth),
            },
            other => Self::root(other.to_string()),
        }
    }
}

impl From<ValidationError> for RuleError {
    fn from(err: ValidationError) -> Self {
        match err.depth_limit {
            Some(max_depth) => RuleError::DepthExceeded { max_depth },
            None => RuleError::MalformedRule {
                message: err.message,
                path: err.path.unwrap_or_else(|| "rule".to_string()),
            },
        }
    }
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: ValidationError) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
        }
    }

    /// 错误信息（校验通过时为 None）
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

type Check = std::result::Result<(), ValidationError>;

/// 规则校验器
#[derive(Debug, Clone)]
pub struct RuleValidator {
    max_depth: usize,
}

impl RuleValidator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// 校验规则，从不返回错误，所有缺陷都体现在结果中
    pub fn validate(&self, rule: &Value) -> ValidationResult {
        match self.check_rule(rule) {
            Ok(()) => ValidationResult::valid(),
            Err(error) => {
                debug!(
                    path = error.path.as_deref().unwrap_or("rule"),
                    message = %error.message,
                    "Rule validation failed"
                );
                ValidationResult::invalid(error)
            }
        }
    }

    /// 校验规则，以 `Result` 形式返回第一个错误
    pub fn check(&self, rule: &Value) -> Check {
        self.check_rule(rule)
    }

    fn check_rule(&self, rule: &Value) -> Check {
        let obj = rule
            .as_object()
            .ok_or_else(|| ValidationError::root("A rule must be an object."))?;

        let conditions = obj
            .get("conditions")
            .ok_or_else(|| ValidationError::root("A rule must have a 'conditions' property."))?;

        match conditions {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(ValidationError::at(
                        "conditions",
                        "The 'conditions' property must not be empty.",
                    ));
                }
                for (i, item) in items.iter().enumerate() {
                    self.check_condition(item, &format!("conditions[{}]", i), 1, false)?;
                }
                Ok(())
            }
            Value::Object(_) => self.check_condition(conditions, "conditions", 1, false),
            _ => Err(ValidationError::at(
                "conditions",
                "The 'conditions' property must be an object or an array.",
            )),
        }
    }

    fn check_condition(&self, node: &Value, path: &str, depth: usize, nested: bool) -> Check {
        let Some(obj) = node.as_object() else {
            return Err(ValidationError::at(path, "A condition must be an object."));
        };

        if depth > self.max_depth {
            return Err(ValidationError::depth_exceeded(path, self.max_depth));
        }

        if has_constraint_key(node) {
            let message = if has_combinator_key(node) {
                "A node cannot be both a condition and a constraint."
            } else {
                "Expected a condition with an 'all' or 'any' property, found a constraint."
            };
            return Err(ValidationError::at(path, message));
        }

        let combinator = condition_type(node, path)?;

        if nested && obj.contains_key("result") {
            return Err(ValidationError::at(path, NESTED_RESULT_MESSAGE));
        }

        let key = combinator.key();
        let children = obj
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ValidationError::at(path, format!("The '{}' property must be an array.", key))
            })?;

        if children.is_empty() {
            return Err(ValidationError::at(
                path,
                format!("The '{}' property must not be empty.", key),
            ));
        }

        for (i, child) in children.iter().enumerate() {
            let child_path = format!("{}.{}[{}]", path, key, i);
            self.check_node(child, &child_path, depth)?;
        }

        Ok(())
    }

    fn check_node(&self, node: &Value, path: &str, parent_depth: usize) -> Check {
        if has_combinator_key(node) {
            self.check_condition(node, path, parent_depth + 1, true)
        } else if has_constraint_key(node) {
            self.check_constraint(node, path)
        } else {
            Err(ValidationError::at(
                path,
                "A node must be either a condition or a constraint.",
            ))
        }
    }

    fn check_constraint(&self, node: &Value, path: &str) -> Check {
        match node.get("field") {
            Some(Value::String(field)) if !field.is_empty() => {}
            _ => {
                return Err(ValidationError::at(
                    path,
                    "A constraint must have a non-empty string 'field' property.",
                ));
            }
        }

        let operator = match node.get("operator") {
            None => {
                return Err(ValidationError::at(
                    path,
                    "A constraint must have an 'operator' property.",
                ));
            }
            Some(Value::String(name)) => name
                .parse::<Operator>()
                .map_err(|_| ValidationError::at(path, format!("Invalid operator '{}'.", name)))?,
            Some(other) => {
                return Err(ValidationError::at(
                    path,
                    format!("Invalid operator '{}'.", other),
                ));
            }
        };

        let value = node.get("value").ok_or_else(|| {
            ValidationError::at(path, "A constraint must have a 'value' property.")
        })?;

        if operator.requires_array() && !value.is_array() {
            return Err(ValidationError::at(
                path,
                format!("The '{}' operator requires an array value.", operator),
            ));
        }

        Ok(())
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(rules_shared::config::EngineConfig::default().max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(rule: Value) -> ValidationResult {
        RuleValidator::default().validate(&rule)
    }

    fn error_of(rule: Value) -> ValidationError {
        validate(rule).error.expect("rule should be invalid")
    }

    #[test]
    fn test_valid_simple_rule() {
        let result = validate(json!({
            "conditions": [
                {"all": [{"field": "name", "operator": "equal", "value": "test"}]}
            ]
        }));
        assert!(result.is_valid);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_single_condition_object_is_accepted() {
        let result = validate(json!({
            "conditions": {"any": [{"field": "a", "operator": "lessThan", "value": 3}]},
            "default": "fallback"
        }));
        assert!(result.is_valid);
    }

    #[test]
    fn test_rule_must_be_object_with_conditions() {
        assert_eq!(error_of(json!([])).message, "A rule must be an object.");

        let error = error_of(json!({"default": 1}));
        assert_eq!(error.message, "A rule must have a 'conditions' property.");
        assert_eq!(error.path, None);

        let error = error_of(json!({"conditions": "all"}));
        assert_eq!(
            error.message,
            "The 'conditions' property must be an object or an array."
        );

        let error = error_of(json!({"conditions": []}));
        assert_eq!(error.message, "The 'conditions' property must not be empty.");
    }

    #[test]
    fn test_bad_operator() {
        let error = error_of(json!({
            "conditions": [{"all": [{"field": "name", "operator": "*", "value": "test"}]}]
        }));
        assert_eq!(error.message, "Invalid operator '*'.");
        assert_eq!(error.path.as_deref(), Some("conditions[0].all[0]"));

        let error = error_of(json!({
            "conditions": [{"all": [{"field": "name", "operator": 7, "value": "test"}]}]
        }));
        assert_eq!(error.message, "Invalid operator '7'.");
    }

    #[test]
    fn test_in_and_not_in_require_arrays() {
        for op in ["in", "notIn"] {
            let error = error_of(json!({
                "conditions": [{"all": [{"field": "name", "operator": op, "value": "test"}]}]
            }));
            assert_eq!(
                error.message,
                format!("The '{}' operator requires an array value.", op)
            );
        }

        assert!(validate(json!({
            "conditions": [{"all": [{"field": "name", "operator": "notIn", "value": ["a"]}]}]
        }))
        .is_valid);
    }

    #[test]
    fn test_nested_result_rejected() {
        let error = error_of(json!({
            "conditions": [{
                "any": [
                    {"all": [{"field": "a", "operator": "equal", "value": 1}], "result": 5}
                ],
                "result": 3
            }]
        }));
        assert_eq!(error.message, NESTED_RESULT_MESSAGE);
        assert_eq!(error.path.as_deref(), Some("conditions[0].any[0]"));
    }

    #[test]
    fn test_deeply_nested_result_rejected() {
        let error = error_of(json!({
            "conditions": {
                "all": [{
                    "any": [{
                        "all": [{"field": "a", "operator": "equal", "value": 1}],
                        "result": true
                    }]
                }]
            }
        }));
        assert_eq!(error.message, NESTED_RESULT_MESSAGE);
        assert_eq!(error.path.as_deref(), Some("conditions.all[0].any[0]"));
    }

    #[test]
    fn test_combinator_rules() {
        let error = error_of(json!({
            "conditions": [{"all": [], "any": []}]
        }));
        assert_eq!(
            error.message,
            "A condition cannot have both 'all' and 'any' properties."
        );

        let error = error_of(json!({"conditions": [{"result": 1}]}));
        assert_eq!(
            error.message,
            "A condition must have either an 'all' or an 'any' property."
        );

        let error = error_of(json!({"conditions": [{"all": {"field": "a"}}]}));
        assert_eq!(error.message, "The 'all' property must be an array.");

        let error = error_of(json!({"conditions": [{"any": []}]}));
        assert_eq!(error.message, "The 'any' property must not be empty.");
    }

    #[test]
    fn test_top_level_constraint_rejected() {
        let error = error_of(json!({
            "conditions": [{"field": "a", "operator": "equal", "value": 1}]
        }));
        assert!(error.message.contains("found a constraint"));
        assert_eq!(error.path.as_deref(), Some("conditions[0]"));
    }

    #[test]
    fn test_hybrid_node_rejected() {
        let error = error_of(json!({
            "conditions": [{"all": [{
                "any": [{"field": "a", "operator": "equal", "value": 1}],
                "field": "b"
            }]}]
        }));
        assert_eq!(
            error.message,
            "A node cannot be both a condition and a constraint."
        );
    }

    #[test]
    fn test_constraint_fields_required() {
        let error = error_of(json!({
            "conditions": [{"all": [{"operator": "equal", "value": 1}]}]
        }));
        assert!(error.message.contains("'field'"));

        let error = error_of(json!({
            "conditions": [{"all": [{"field": 3, "operator": "equal", "value": 1}]}]
        }));
        assert!(error.message.contains("'field'"));

        let error = error_of(json!({
            "conditions": [{"all": [{"field": "a", "value": 1}]}]
        }));
        assert_eq!(error.message, "A constraint must have an 'operator' property.");

        let error = error_of(json!({
            "conditions": [{"all": [{"field": "a", "operator": "equal"}]}]
        }));
        assert_eq!(error.message, "A constraint must have a 'value' property.");
    }

    #[test]
    fn test_unknown_node_rejected() {
        let error = error_of(json!({
            "conditions": [{"all": [{"foo": "bar"}]}]
        }));
        assert_eq!(
            error.message,
            "A node must be either a condition or a constraint."
        );

        let error = error_of(json!({"conditions": [{"all": [42]}]}));
        assert_eq!(error.path.as_deref(), Some("conditions[0].all[0]"));
    }

    #[test]
    fn test_first_error_in_traversal_order_wins() {
        let error = error_of(json!({
            "conditions": [
                {"all": [
                    {"any": [{"field": "a", "operator": "bogus", "value": 1}]},
                    {"field": "b", "operator": "in", "value": 1}
                ]},
                {"all": [], "result": 1}
            ]
        }));
        assert_eq!(error.message, "Invalid operator 'bogus'.");
        assert_eq!(error.path.as_deref(), Some("conditions[0].all[0].any[0]"));
    }

    #[test]
    fn test_max_depth() {
        let leaf = json!({"field": "a", "operator": "equal", "value": 1});
        let nested = json!({"all": [{"all": [{"all": [leaf]}]}]});
        let rule = json!({"conditions": [nested]});

        assert!(RuleValidator::new(3).validate(&rule).is_valid);

        let result = RuleValidator::new(2).validate(&rule);
        assert_eq!(
            result.message(),
            Some("Maximum nesting depth of 2 exceeded.")
        );

        let error = result.error.unwrap();
        assert!(error.is_depth_exceeded());
        assert!(matches!(
            RuleError::from(error),
            RuleError::DepthExceeded { max_depth: 2 }
        ));
    }

    #[test]
    fn test_constraint_field_must_be_non_empty_string() {
        for field in [json!(""), json!(7), Value::Null] {
            let error = error_of(json!({
                "conditions": [{"all": [{"field": field, "operator": "equal", "value": 1}]}]
            }));
            assert_eq!(
                error.message,
                "A constraint must have a non-empty string 'field' property."
            );
            assert_eq!(error.path.as_deref(), Some("conditions[0].all[0]"));
        }
    }

    #[test]
    fn test_structural_error_converts_to_malformed() {
        let error = error_of(json!({"conditions": [{"all": []}]}));
        assert!(!error.is_depth_exceeded());

        match RuleError::from(error) {
            RuleError::MalformedRule { path, .. } => assert_eq!(path, "conditions[0]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let valid = serde_json::to_value(ValidationResult::valid()).unwrap();
        assert_eq!(valid, json!({"isValid": true}));

        let invalid = serde_json::to_value(validate(json!({"conditions": [{"any": []}]}))).unwrap();
        assert_eq!(
            invalid,
            json!({
                "isValid": false,
                "error": {
                    "message": "The 'any' property must not be empty.",
                    "path": "conditions[0]"
                }
            })
        );
    }

    #[test]
    fn test_validation_error_converts_to_malformed_rule() {
        let err: RuleError = ValidationError::root("A rule must be an object.").into();
        assert!(matches!(
            err,
            RuleError::MalformedRule { ref path, .. } if path == "rule"
        ));
    }
}
