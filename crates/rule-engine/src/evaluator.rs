//! 约束检查器
//!
//! 实现各操作符的比较逻辑。比较只在明确的值类型之间进行：
//! - 相等：数值按数值比较（`1 == 1.0`），其余按 JSON 结构比较，类型不同即不相等
//! - 有序比较：数值/数值、字符串/字符串、布尔/布尔，其他组合返回 `Incomparable`

use crate::error::{Result, RuleError};
use crate::models::{Constraint, Criteria};
use crate::operators::Operator;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// 约束检查器
pub struct ConstraintChecker;

impl ConstraintChecker {
    /// 检查约束是否被条件记录满足
    ///
    /// 字段不存在时对任何操作符都返回 false（包括 `notEqual` 和 `notIn`）。
    pub fn check(constraint: &Constraint, criteria: &Criteria) -> Result<bool> {
        match criteria.get_field(&constraint.field) {
            Some(criterion) => Self::evaluate(criterion, constraint.operator, &constraint.value),
            None => Ok(false),
        }
    }

    /// 对单个字段值执行操作符
    ///
    /// # Arguments
    /// * `field_value` - 条件记录中的字段值
    /// * `operator` - 操作符
    /// * `expected_value` - 规则中定义的期望值
    pub fn evaluate(field_value: &Value, operator: Operator, expected_value: &Value) -> Result<bool> {
        match operator {
            Operator::Equal => Ok(Self::eq(field_value, expected_value)),
            Operator::NotEqual => Ok(!Self::eq(field_value, expected_value)),
            Operator::GreaterThan => Self::compare(field_value, expected_value, operator)
                .map(|o| o == Ordering::Greater),
            Operator::GreaterThanOrEqual => Self::compare(field_value, expected_value, operator)
                .map(|o| o != Ordering::Less),
            Operator::LessThan => {
                Self::compare(field_value, expected_value, operator).map(|o| o == Ordering::Less)
            }
            Operator::LessThanOrEqual => Self::compare(field_value, expected_value, operator)
                .map(|o| o != Ordering::Greater),
            Operator::In => Self::in_list(field_value, expected_value),
            Operator::NotIn => Self::in_list(field_value, expected_value).map(|r| !r),
        }
    }

    /// 相等比较
    fn eq(field: &Value, expected: &Value) -> bool {
        if let (Value::Number(a), Value::Number(b)) = (field, expected) {
            return Self::cmp_numbers(a, b) == Some(Ordering::Equal);
        }

        field == expected
    }

    /// 数值比较
    ///
    /// 两侧都是整数时按 i128 精确比较，避免超过 2^53 的整数在浮点下合并；
    /// 任一侧为浮点数时按 f64 比较（如 100 == 100.0）。
    fn cmp_numbers(a: &Number, b: &Number) -> Option<Ordering> {
        match (Self::as_integer(a), Self::as_integer(b)) {
            (Some(i1), Some(i2)) => Some(i1.cmp(&i2)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    fn as_integer(n: &Number) -> Option<i128> {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    }

    /// 有序比较
    fn compare(field: &Value, expected: &Value, operator: Operator) -> Result<Ordering> {
        let ordering = match (field, expected) {
            (Value::Number(a), Value::Number(b)) => Self::cmp_numbers(a, b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        };

        ordering.ok_or_else(|| RuleError::Incomparable {
            operator: operator.to_string(),
            left: type_name(field).to_string(),
            right: type_name(expected).to_string(),
        })
    }

    /// 列表包含检查
    fn in_list(field: &Value, expected: &Value) -> Result<bool> {
        let arr = expected.as_array().ok_or_else(|| RuleError::TypeMismatch {
            expected: "array".to_string(),
            actual: type_name(expected).to_string(),
        })?;

        Ok(arr.iter().any(|item| Self::eq(field, item)))
    }
}

/// 获取值的类型名称
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
