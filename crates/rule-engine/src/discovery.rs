//! 节点类型识别
//!
//! 规则 JSON 中的节点没有显式类型标签，依靠键的存在与否区分：
//! 带 `all`/`any` 的是条件，带 `field`/`operator`/`value` 的是约束。

use crate::error::{Result, RuleError};
use crate::operators::Combinator;
use serde_json::Value;

/// 约束节点必须具备的键
pub const CONSTRAINT_KEYS: [&str; 3] = ["field", "operator", "value"];

/// 节点是否为条件：存在 `all` 或 `any` 键且其值为数组
pub fn is_condition(node: &Value) -> bool {
    let Some(obj) = node.as_object() else {
        return false;
    };

    [Combinator::All, Combinator::Any]
        .iter()
        .any(|c| obj.get(c.key()).is_some_and(Value::is_array))
}

/// 节点是否为约束：`field`、`operator`、`value` 三个键都存在
pub fn is_constraint(node: &Value) -> bool {
    node.as_object()
        .is_some_and(|obj| CONSTRAINT_KEYS.iter().all(|key| obj.contains_key(*key)))
}

/// 是否带有任一组合键（不检查值类型）
pub fn has_combinator_key(node: &Value) -> bool {
    node.as_object()
        .is_some_and(|obj| obj.contains_key("all") || obj.contains_key("any"))
}

/// 是否带有任一约束键
pub fn has_constraint_key(node: &Value) -> bool {
    node.as_object()
        .is_some_and(|obj| CONSTRAINT_KEYS.iter().any(|key| obj.contains_key(*key)))
}

/// 获取条件的组合方式
///
/// 两个组合键都缺失或同时存在时返回 `MalformedRule`，不做默认推断。
pub fn condition_type(node: &Value, path: &str) -> Result<Combinator> {
    let malformed = |message: &str| RuleError::MalformedRule {
        message: message.to_string(),
        path: path.to_string(),
    };

    let obj = node
        .as_object()
        .ok_or_else(|| malformed("A condition must be an object."))?;

    match (obj.contains_key("all"), obj.contains_key("any")) {
        (true, false) => Ok(Combinator::All),
        (false, true) => Ok(Combinator::Any),
        (true, true) => Err(malformed(
            "A condition cannot have both 'all' and 'any' properties.",
        )),
        (false, false) => Err(malformed(
            "A condition must have either an 'all' or an 'any' property.",
        )),
    }
}
