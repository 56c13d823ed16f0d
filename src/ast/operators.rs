use serde::{Deserialize, Serialize};

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,
}

impl BoolOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BoolOp::And => "&&",
            BoolOp::Or => "||",
        }
    }

    /// Whether evaluation stops at an operand of the given truthiness.
    pub(crate) fn stops_at(self, truthy: bool) -> bool {
        match self {
            BoolOp::And => !truthy,
            BoolOp::Or => truthy,
        }
    }

    /// Value of the operator over zero operands.
    pub(crate) fn identity(self) -> bool {
        matches!(self, BoolOp::And)
    }
}

/// Equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
        }
    }

    pub(crate) fn apply(self, equal: bool) -> bool {
        match self {
            CompareOp::Equal => equal,
            CompareOp::NotEqual => !equal,
        }
    }
}
