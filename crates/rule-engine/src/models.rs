//! 规则引擎领域模型
//!
//! 规则 JSON 在编译阶段被一次性识别并转换为这里的强类型树，
//! 执行阶段不再做结构判断。

use crate::error::{Result, RuleError};
use crate::operators::{Combinator, Operator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 规则定义
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// 顶层条件，按输入顺序保存（首个匹配者胜出）
    pub conditions: Vec<Condition>,
    /// 无条件匹配时返回的默认值
    pub default: Option<Value>,
}

impl Rule {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// 规则节点（条件或约束）
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    Condition(Condition),
    Constraint(Constraint),
}

impl From<Condition> for RuleNode {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<Constraint> for RuleNode {
    fn from(constraint: Constraint) -> Self {
        Self::Constraint(constraint)
    }
}

/// 条件节点
///
/// `result` 只允许出现在顶层条件上，嵌套条件携带 `result` 会被校验器拒绝。
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub combinator: Combinator,
    pub children: Vec<RuleNode>,
    pub result: Option<Value>,
}

impl Condition {
    pub fn new(combinator: Combinator, children: Vec<RuleNode>) -> Self {
        Self {
            combinator,
            children,
            result: None,
        }
    }

    pub fn all(children: Vec<RuleNode>) -> Self {
        Self::new(Combinator::All, children)
    }

    pub fn any(children: Vec<RuleNode>) -> Self {
        Self::new(Combinator::Any, children)
    }

    pub fn with_result(mut self, result: impl Into<Value>) -> Self {
        self.result = Some(result.into());
        self
    }
}

/// 约束节点（叶子比较）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Constraint {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// 评估条件 - 调用方提供的扁平键值记录
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    data: Map<String, Value>,
}

impl Criteria {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// 从 JSON 值创建，只接受对象
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(RuleError::InvalidCriteria(format!(
                "expected a JSON object, found {}",
                crate::evaluator::type_name(&other)
            ))),
        }
    }

    /// 从 JSON 字符串创建
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// 获取字段值；字段名按字面匹配，不解析路径
    pub fn get_field(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// 获取底层数据
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl From<Map<String, Value>> for Criteria {
    fn from(data: Map<String, Value>) -> Self {
        Self::new(data)
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub matched: bool,
    /// 规则的最终输出：命中条件的 result、true、default 或 false
    pub value: Value,
    /// 命中的顶层条件下标
    pub matched_condition: Option<usize>,
    pub matched_constraints: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

impl EvaluationResult {
    pub fn new() -> Self {
        Self {
            matched: false,
            value: Value::Bool(false),
            matched_condition: None,
            matched_constraints: Vec::new(),
            evaluation_trace: Vec::new(),
            evaluation_time_us: 0,
        }
    }
}

impl Default for EvaluationResult {
    fn default() -> Self {
        Self::new()
    }
}
