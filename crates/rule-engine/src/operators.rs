//! 规则操作符定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 约束操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    // 通用比较
    Equal,
    NotEqual,

    // 有序比较
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,

    // 包含检查
    In,
    NotIn,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::In,
        Self::NotIn,
    ];

    /// 规则 JSON 中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanOrEqual => "greaterThanOrEqual",
            Self::LessThan => "lessThan",
            Self::LessThanOrEqual => "lessThanOrEqual",
            Self::In => "in",
            Self::NotIn => "notIn",
        }
    }

    /// 操作数是否必须为数组
    pub fn requires_array(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| RuleError::UnknownOperator(s.to_string()))
    }
}

/// 条件组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// 逻辑与
    All,
    /// 逻辑或
    Any,
}

impl Combinator {
    /// 条件节点上对应的键名
    pub fn key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }

    /// 空子节点列表的结果（AND/OR 单位元）
    pub fn identity(&self) -> bool {
        matches!(self, Self::All)
    }

    /// 子节点结果为 `outcome` 时是否已经可以确定整组结果
    pub fn is_decided_by(&self, outcome: bool) -> bool {
        match self {
            Self::All => !outcome,
            Self::Any => outcome,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
