use std::fmt;

use serde::{Deserialize, Serialize};

/// Position-relative array subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicSubscript {
    /// `[^]`
    First,
    /// `[|]`, element at `len / 2`
    Mid,
    /// `[$]`
    Last,
    /// `[*]`, a copy of the whole array
    All,
}

impl DynamicSubscript {
    pub fn symbol(self) -> &'static str {
        match self {
            DynamicSubscript::First => "^",
            DynamicSubscript::Mid => "|",
            DynamicSubscript::Last => "$",
            DynamicSubscript::All => "*",
        }
    }

    /// Index selected in an array of `len` elements, `None` for `All` or
    /// when the array is empty.
    pub fn position(self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            DynamicSubscript::First => Some(0),
            DynamicSubscript::Mid => Some(len / 2),
            DynamicSubscript::Last => Some(len - 1),
            DynamicSubscript::All => None,
        }
    }

    /// Path of this variant in generated source.
    pub(crate) fn source_path(self) -> &'static str {
        match self {
            DynamicSubscript::First => "::ogel_lang::ast::DynamicSubscript::First",
            DynamicSubscript::Mid => "::ogel_lang::ast::DynamicSubscript::Mid",
            DynamicSubscript::Last => "::ogel_lang::ast::DynamicSubscript::Last",
            DynamicSubscript::All => "::ogel_lang::ast::DynamicSubscript::All",
        }
    }
}

impl fmt::Display for DynamicSubscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions() {
        assert_eq!(DynamicSubscript::First.position(5), Some(0));
        assert_eq!(DynamicSubscript::Mid.position(5), Some(2));
        assert_eq!(DynamicSubscript::Mid.position(4), Some(2));
        assert_eq!(DynamicSubscript::Last.position(5), Some(4));
        assert_eq!(DynamicSubscript::All.position(5), None);
        assert_eq!(DynamicSubscript::Last.position(0), None);
    }
}
