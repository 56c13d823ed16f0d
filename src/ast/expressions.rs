use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    ast::{BoolOp, CompareOp, DynamicSubscript},
    value::Literal,
};

/// A node of an expression tree.
///
/// Children are owned exclusively by their parent; the tree is acyclic and
/// unshared. Arity is fixed by the variant's shape, so no arity check happens
/// at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Literal constant
    ///
    /// # Example
    /// ```text
    /// 42
    /// "hello"
    /// ```
    Const(Literal),

    /// The root object of the evaluation (`#root`)
    Root,

    /// The current source (`#this`)
    This,

    /// Context variable (`#name`); undefined variables read as null.
    Variable(String),

    /// Named property of the current source
    ///
    /// # Example
    /// ```text
    /// active
    /// ```
    Property(String),

    /// Indexed access; the key expression is evaluated against the root.
    ///
    /// # Example
    /// ```text
    /// items[0]
    /// settings["theme"]
    /// ```
    Index(Box<Node>),

    /// Dynamic subscript over an array (`[^]`, `[|]`, `[$]`, `[*]`)
    Subscript(DynamicSubscript),

    /// Method call on the current source; arguments are evaluated against
    /// the root.
    ///
    /// # Example
    /// ```text
    /// name.startsWith("a")
    /// ```
    Method { name: String, args: Vec<Node> },

    /// Navigation chain: each child is evaluated against the previous
    /// child's result, the first against the source.
    ///
    /// # Example
    /// ```text
    /// account.owner.name
    /// ```
    Chain(Vec<Node>),

    /// Boolean negation (`!`)
    Not(Box<Node>),

    /// Short-circuit `&&` / `||` over any number of operands. The result is
    /// the operand that decided the outcome, not a coerced boolean.
    Logical { op: BoolOp, operands: Vec<Node> },

    /// `==` / `!=`
    Compare {
        op: CompareOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn constant(lit: impl Into<Literal>) -> Self {
        Node::Const(lit.into())
    }

    pub fn null() -> Self {
        Node::Const(Literal::Null)
    }

    pub fn property(name: impl Into<String>) -> Self {
        Node::Property(name.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable(name.into())
    }

    pub fn index(key: Node) -> Self {
        Node::Index(Box::new(key))
    }

    pub fn method(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::Method {
            name: name.into(),
            args,
        }
    }

    pub fn chain(links: Vec<Node>) -> Self {
        Node::Chain(links)
    }

    pub fn not(operand: Node) -> Self {
        Node::Not(Box::new(operand))
    }

    pub fn and(operands: Vec<Node>) -> Self {
        Node::Logical {
            op: BoolOp::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Node>) -> Self {
        Node::Logical {
            op: BoolOp::Or,
            operands,
        }
    }

    pub fn equal(left: Node, right: Node) -> Self {
        Node::Compare {
            op: CompareOp::Equal,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not_equal(left: Node, right: Node) -> Self {
        Node::Compare {
            op: CompareOp::NotEqual,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Display operator of operator nodes, for diagnostics only.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Node::Not(_) => Some("!"),
            Node::Logical { op, .. } => Some(op.symbol()),
            Node::Compare { op, .. } => Some(op.symbol()),
            _ => None,
        }
    }

    /// Children in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Const(_)
            | Node::Root
            | Node::This
            | Node::Variable(_)
            | Node::Property(_)
            | Node::Subscript(_) => Vec::new(),
            Node::Index(key) => vec![key.as_ref()],
            Node::Not(operand) => vec![operand.as_ref()],
            Node::Method { args, .. } => args.iter().collect(),
            Node::Chain(links) => links.iter().collect(),
            Node::Logical { operands, .. } => operands.iter().collect(),
            Node::Compare { left, right, .. } => vec![left.as_ref(), right.as_ref()],
        }
    }

    fn is_operator(&self) -> bool {
        self.operator().is_some()
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    if node.is_operator() && !matches!(node, Node::Not(_)) {
        write!(f, "({node})")
    } else {
        write!(f, "{node}")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Const(Literal::Null) => f.write_str("null"),
            Node::Const(Literal::Boolean(b)) => write!(f, "{b}"),
            Node::Const(Literal::Integer(n)) => write!(f, "{n}"),
            Node::Const(Literal::Float(n)) => write!(f, "{n:?}"),
            Node::Const(Literal::String(s)) => write!(f, "{s:?}"),
            Node::Root => f.write_str("#root"),
            Node::This => f.write_str("#this"),
            Node::Variable(name) => write!(f, "#{name}"),
            Node::Property(name) => f.write_str(name),
            Node::Index(key) => write!(f, "[{key}]"),
            Node::Subscript(sub) => write!(f, "{sub}"),
            Node::Method { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Node::Chain(links) => {
                for (i, link) in links.iter().enumerate() {
                    let bracketed = matches!(link, Node::Index(_) | Node::Subscript(_));
                    if i > 0 && !bracketed {
                        f.write_str(".")?;
                    }
                    write_operand(f, link)?;
                }
                Ok(())
            }
            Node::Not(operand) => {
                f.write_str("!")?;
                write_operand(f, operand)
            }
            Node::Logical { op, operands } => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.symbol())?;
                    }
                    write_operand(f, operand)?;
                }
                Ok(())
            }
            Node::Compare { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_common_shapes() {
        let expr = Node::not(Node::chain(vec![
            Node::variable("user"),
            Node::property("items"),
            Node::index(Node::constant(0)),
            Node::method("isEmpty", vec![]),
        ]));
        assert_eq!(expr.to_string(), "!#user.items[0].isEmpty()");

        let expr = Node::and(vec![
            Node::property("a"),
            Node::equal(Node::property("b"), Node::constant("x")),
        ]);
        assert_eq!(expr.to_string(), r#"a && (b == "x")"#);
    }

    #[test]
    fn operators_are_reported() {
        assert_eq!(Node::not(Node::Root).operator(), Some("!"));
        assert_eq!(Node::or(vec![]).operator(), Some("||"));
        assert_eq!(Node::property("x").operator(), None);
    }

    #[test]
    fn deserializes_from_tagged_json() {
        let node: Node = serde_json::from_str(
            r#"{"not": {"chain": [{"variable": "user"}, {"property": "active"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            node,
            Node::not(Node::chain(vec![
                Node::variable("user"),
                Node::property("active")
            ]))
        );

        let node: Node = serde_json::from_str(
            r#"{"logical": {"op": "or", "operands": [{"const": null}, "root"]}}"#,
        )
        .unwrap();
        assert_eq!(node, Node::or(vec![Node::null(), Node::Root]));
    }
}
