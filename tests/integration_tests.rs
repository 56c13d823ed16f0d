use ogel_lang::reflect::{Class, ClassBuilder, Visibility};
use ogel_lang::{
    DefaultValue, EvalContext, EvalError, Node, Value, get_value, set_value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn eval(expr: &Node, root: Value) -> Result<Value, String> {
    let ctx = EvalContext::new(root);
    get_value(expr, &ctx).map_err(|e| format!("{:?}", e))
}

fn json_object(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::Map(map)
}

struct Account {
    active: Mutex<bool>,
    owner: Option<String>,
    tags: Vec<String>,
}

fn account_class() -> Class<Account> {
    ClassBuilder::<Account>::new("Account")
        .field_rw(
            "active",
            Visibility::Public,
            |a| Value::from(*a.active.lock().unwrap()),
            |a, v| {
                *a.active.lock().unwrap() = v.is_truthy();
                Ok(())
            },
        )
        .field("owner", Visibility::Public, |a| Value::from(a.owner.clone()))
        .method("get_tags", Visibility::Public, 0, |a, _| {
            Ok(Value::from(a.tags.clone()))
        })
        .method("hasTag", Visibility::Public, 1, |a, args| {
            let tag = args[0].as_str().unwrap_or_default();
            Ok(Value::from(a.tags.iter().any(|t| t == tag)))
        })
        .method("nickname", Visibility::Public, 0, |_, _| Ok(Value::Null))
        .build()
}

fn account(active: bool) -> Value {
    account_class().wrap(Account {
        active: Mutex::new(active),
        owner: Some("ada".to_string()),
        tags: vec!["admin".to_string()],
    })
}

#[test]
fn test_not_active_host_object() {
    let expr = Node::not(Node::property("active"));
    assert_eq!(eval(&expr, account(true)).unwrap(), Value::Boolean(false));
    assert_eq!(eval(&expr, account(false)).unwrap(), Value::Boolean(true));
}

#[test]
fn test_not_missing_property_with_substitution() {
    let expr = Node::not(Node::property("active"));
    let ctx = EvalContext::new(json_object(vec![]))
        .with_null_handler(Arc::new(DefaultValue(Value::Boolean(false))));
    assert_eq!(get_value(&expr, &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_not_truthiness_table() {
    let expr = Node::not(Node::property("v"));
    let cases = vec![
        (Value::Null, true),
        (Value::Boolean(false), true),
        (Value::Boolean(true), false),
        (Value::Integer(0), true),
        (Value::Integer(-3), false),
        (Value::Float(0.0), true),
        (Value::Float(0.5), false),
        (Value::from(""), true),
        (Value::from("no"), false),
        (Value::Array(vec![]), false),
        (json_object(vec![]), false),
    ];
    for (v, expected) in cases {
        let root = json_object(vec![("v", v.clone())]);
        assert_eq!(
            eval(&expr, root).unwrap(),
            Value::Boolean(expected),
            "!{}",
            v
        );
    }
}

#[test]
fn test_double_negation() {
    let expr = Node::not(Node::not(Node::property("name")));
    let root = json_object(vec![("name", Value::from("x"))]);
    assert_eq!(eval(&expr, root).unwrap(), Value::Boolean(true));
}

#[test]
fn test_nested_navigation() {
    let root = json_object(vec![(
        "user",
        json_object(vec![("profile", json_object(vec![("name", Value::from("ada"))]))]),
    )]);
    let expr = Node::chain(vec![
        Node::property("user"),
        Node::property("profile"),
        Node::property("name"),
    ]);
    assert_eq!(eval(&expr, root).unwrap(), Value::from("ada"));
}

#[test]
fn test_index_and_subscripts() {
    let root = json_object(vec![
        ("items", Value::from(vec![10, 20, 30])),
        ("i", Value::from(1)),
    ]);
    let by_var = Node::chain(vec![
        Node::property("items"),
        Node::index(Node::property("i")),
    ]);
    assert_eq!(eval(&by_var, root.clone()).unwrap(), Value::from(20));

    let last = Node::chain(vec![
        Node::property("items"),
        Node::Subscript(ogel_lang::DynamicSubscript::Last),
    ]);
    assert_eq!(eval(&last, root.clone()).unwrap(), Value::from(30));

    let out_of_range = Node::chain(vec![
        Node::property("items"),
        Node::index(Node::constant(7)),
    ]);
    assert!(eval(&out_of_range, root).unwrap_err().contains("IndexOutOfBounds"));
}

#[test]
fn test_host_getters_and_methods() {
    let tags = Node::chain(vec![Node::property("tags"), Node::method("size", vec![])]);
    assert_eq!(eval(&tags, account(true)).unwrap(), Value::from(1));

    let has = Node::method("hasTag", vec![Node::constant("admin")]);
    assert_eq!(eval(&has, account(true)).unwrap(), Value::Boolean(true));

    let wrong_arity = Node::method("hasTag", vec![]);
    assert!(eval(&wrong_arity, account(true)).unwrap_err().contains("Arity"));
}

#[test]
fn test_variables() {
    let ctx = EvalContext::new(Value::Null).with_variable("user", account(true));
    let expr = Node::chain(vec![Node::variable("user"), Node::property("owner")]);
    assert_eq!(get_value(&expr, &ctx).unwrap(), Value::from("ada"));

    let undefined = Node::not(Node::variable("nobody"));
    assert_eq!(get_value(&undefined, &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_logical_returns_deciding_operand() {
    let root = json_object(vec![("a", Value::from("")), ("b", Value::from("fallback"))]);
    let or = Node::or(vec![Node::property("a"), Node::property("b")]);
    assert_eq!(eval(&or, root.clone()).unwrap(), Value::from("fallback"));

    let and = Node::and(vec![Node::property("a"), Node::property("b")]);
    assert_eq!(eval(&and, root).unwrap(), Value::from(""));
}

#[test]
fn test_logical_short_circuits() {
    // the right operand would fail on a null source
    let expr = Node::and(vec![
        Node::property("missing"),
        Node::chain(vec![Node::property("missing"), Node::property("deeper")]),
    ]);
    assert_eq!(eval(&expr, json_object(vec![])).unwrap(), Value::Null);
}

#[test]
fn test_compare() {
    let root = json_object(vec![("n", Value::from(2)), ("f", Value::from(2.0))]);
    let eq = Node::equal(Node::property("n"), Node::property("f"));
    assert_eq!(eval(&eq, root.clone()).unwrap(), Value::Boolean(true));
    let ne = Node::not_equal(Node::property("n"), Node::constant("2"));
    assert_eq!(eval(&ne, root).unwrap(), Value::Boolean(true));
}

#[test]
fn test_null_source_aborts_evaluation() {
    let expr = Node::not(Node::chain(vec![
        Node::property("user"),
        Node::property("active"),
    ]));
    let ctx = EvalContext::new(json_object(vec![]));
    let err = get_value(&expr, &ctx).unwrap_err();
    assert!(matches!(err, EvalError::NullSource { operation: "getProperty", .. }));
}

#[test]
fn test_missing_host_member() {
    let expr = Node::property("balance");
    let ctx = EvalContext::new(account(true));
    let err = get_value(&expr, &ctx).unwrap_err();
    assert!(matches!(err, EvalError::NoSuchMember { .. }));
    assert!(err.to_string().contains("Account"));
}

#[test]
fn test_set_value_through_chain() {
    let mut ctx = EvalContext::new(Value::Null).with_variable("acct", account(true));
    let path = Node::chain(vec![Node::variable("acct"), Node::property("active")]);
    set_value(&path, &mut ctx, Value::Boolean(false)).unwrap();
    assert_eq!(get_value(&Node::not(path), &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_set_value_variable_and_unassignable() {
    let mut ctx = EvalContext::new(Value::Null);
    set_value(&Node::variable("x"), &mut ctx, Value::from(5)).unwrap();
    assert_eq!(ctx.variable("x"), Some(&Value::from(5)));

    let err = set_value(&Node::not(Node::variable("x")), &mut ctx, Value::Null).unwrap_err();
    assert!(matches!(err, EvalError::NotAssignable(_)));

    let read_only = Node::chain(vec![Node::Root, Node::property("owner")]);
    let mut ctx = EvalContext::new(account(true));
    assert!(set_value(&read_only, &mut ctx, Value::from("bob")).is_err());
}

#[test]
fn test_context_reuse_across_roots() {
    let expr = Node::not(Node::property("active"));
    let mut ctx = EvalContext::new(account(true));
    assert_eq!(get_value(&expr, &ctx).unwrap(), Value::Boolean(false));
    ctx.reset();
    ctx.set_root(account(false));
    assert_eq!(get_value(&expr, &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_ast_from_json() {
    let expr: Node = serde_json::from_str(r#"{"not": {"property": "active"}}"#).unwrap();
    assert_eq!(expr.to_string(), "!active");
    assert_eq!(eval(&expr, account(true)).unwrap(), Value::Boolean(false));
}
