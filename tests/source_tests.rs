use ogel_lang::reflect::{ClassBuilder, Visibility};
use ogel_lang::source::{self, NULL_LITERAL};
use ogel_lang::{DefaultMemberAccess, EvalContext, EvalError, GenerationError, Node, TypeHint, Value};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

fn json_object(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::Map(map)
}

fn generate(expr: &Node, root: Value) -> (String, Option<TypeHint>) {
    let mut ctx = EvalContext::new(root);
    let src = source::to_source(expr, &mut ctx).unwrap();
    (src, ctx.current_type().cloned())
}

#[test]
fn test_not_over_blank_child_negates_null() {
    let expr = Node::not(Node::chain(vec![]));
    let (src, hint) = generate(&expr, Value::Null);
    assert_eq!(
        src,
        format!("(!::ogel_lang::ops::boolean_value(&({NULL_LITERAL})))")
    );
    assert_eq!(hint, Some(TypeHint::Boolean));
}

#[test]
fn test_not_property() {
    let expr = Node::not(Node::property("active"));
    let (src, hint) = generate(&expr, json_object(vec![("active", Value::from(true))]));
    assert_eq!(
        src,
        r#"(!::ogel_lang::ops::boolean_value(&(::ogel_lang::runtime::get_property(ctx, &target, "active")?)))"#
    );
    assert_eq!(hint, Some(TypeHint::Boolean));
}

#[test]
fn test_not_boolean_literal_stays_native() {
    let (src, hint) = generate(&Node::not(Node::constant(true)), Value::Null);
    assert_eq!(src, "(!::ogel_lang::ops::boolean_value(&(true)))");
    assert_eq!(hint, Some(TypeHint::Boolean));

    let (src, hint) = generate(&Node::constant("x"), Value::Null);
    assert_eq!(
        src,
        r#"::ogel_lang::Value::String(::std::string::String::from("x"))"#
    );
    assert_eq!(hint, Some(TypeHint::String));
}

#[test]
fn test_chain_threads_the_target_expression() {
    let root = json_object(vec![("user", json_object(vec![("active", Value::from(true))]))]);
    let expr = Node::chain(vec![Node::property("user"), Node::property("active")]);
    let (src, hint) = generate(&expr, root);
    assert_eq!(
        src,
        r#"::ogel_lang::runtime::get_property(ctx, &(::ogel_lang::runtime::get_property(ctx, &target, "user")?), "active")?"#
    );
    assert_eq!(hint, Some(TypeHint::Dynamic));
}

#[test]
fn test_target_is_restored_after_a_chain() {
    let root = json_object(vec![
        ("user", json_object(vec![("active", Value::from(true))])),
        ("flag", Value::from(false)),
    ]);
    let expr = Node::or(vec![
        Node::chain(vec![Node::property("user"), Node::property("active")]),
        Node::property("flag"),
    ]);
    let (src, _) = generate(&expr, root);
    assert!(src.ends_with(r#"else { ::ogel_lang::runtime::get_property(ctx, &target, "flag")? } }"#));
}

#[test]
fn test_compare_is_boolean_and_boxed_when_negated_value_needed() {
    let expr = Node::equal(Node::property("n"), Node::constant(1));
    let (src, hint) = generate(&expr, json_object(vec![("n", Value::from(1))]));
    assert_eq!(
        src,
        r#"::ogel_lang::ops::equals(&::ogel_lang::runtime::get_property(ctx, &target, "n")?, &::ogel_lang::Value::Integer(1))"#
    );
    assert_eq!(hint, Some(TypeHint::Boolean));

    let and = Node::and(vec![Node::constant(false), Node::property("n")]);
    let (src, _) = generate(&and, json_object(vec![("n", Value::from(1))]));
    assert!(src.starts_with("{ let v = ::ogel_lang::Value::Boolean(false);"));
}

#[test]
fn test_index_keys_render_against_root() {
    let root = json_object(vec![
        ("items", Value::from(vec![1, 2])),
        ("i", Value::from(0)),
    ]);
    let expr = Node::chain(vec![Node::property("items"), Node::index(Node::property("i"))]);
    let (src, _) = generate(&expr, root);
    assert_eq!(
        src,
        r#"::ogel_lang::runtime::get_index(ctx, &(::ogel_lang::runtime::get_property(ctx, &target, "items")?), &::ogel_lang::runtime::get_property(ctx, &root, "i")?)?"#
    );
}

#[test]
fn test_method_and_variable_fragments() {
    let ctx_root = json_object(vec![("tags", Value::from(vec!["a"]))]);
    let mut ctx = EvalContext::new(ctx_root).with_variable("tag", Value::from("a"));
    let expr = Node::chain(vec![
        Node::property("tags"),
        Node::method("contains", vec![Node::variable("tag")]),
    ]);
    let src = source::to_source(&expr, &mut ctx).unwrap();
    assert_eq!(
        src,
        r#"::ogel_lang::runtime::call_method(ctx, &(::ogel_lang::runtime::get_property(ctx, &target, "tags")?), "contains", &[::ogel_lang::runtime::variable(ctx, "tag")])?"#
    );
}

struct Secret;

fn secret_root() -> Value {
    ClassBuilder::<Secret>::new("Secret")
        .field("pin", Visibility::Private, |_| Value::from(1))
        .field("hint", Visibility::Public, |_| Value::from("birthday"))
        .build()
        .wrap(Secret)
}

#[test]
fn test_inaccessible_member_fails_generation() {
    let expr = Node::not(Node::property("pin"));
    let mut ctx = EvalContext::new(secret_root());
    let err: GenerationError = source::to_source(&expr, &mut ctx).unwrap_err();
    assert_eq!(err.expression, "!pin");

    // the wrapped cause chain ends at the evaluation error
    let inner = err.source().unwrap();
    let root_cause = inner.source().unwrap();
    assert!(matches!(
        root_cause.downcast_ref::<EvalError>(),
        Some(EvalError::Inaccessible { .. })
    ));
}

#[test]
fn test_policy_allows_generation() {
    let expr = Node::not(Node::property("pin"));
    let mut ctx = EvalContext::new(secret_root())
        .with_member_access(Arc::new(DefaultMemberAccess::allow_all(true)));
    assert!(source::to_source(&expr, &mut ctx).is_ok());
}

#[test]
fn test_missing_member_fails_generation() {
    let mut ctx = EvalContext::new(secret_root());
    let err = source::to_source(&Node::property("nope"), &mut ctx).unwrap_err();
    assert!(err.to_string().contains("nope"));
    assert!(err.source().is_some());
}

#[test]
fn test_routine_wraps_boolean_fragments() {
    let mut ctx = EvalContext::new(secret_root());
    let src = source::to_source(&Node::not(Node::property("hint")), &mut ctx).unwrap();
    let routine = source::routine("check", &src, ctx.current_type());
    assert!(routine.contains("fn check(ctx: &::ogel_lang::EvalContext"));
    assert!(routine.contains(&format!("Ok(::ogel_lang::Value::Boolean({src}))")));
}

// Checked-in output of `source::routine` for `!user.active || n == 0`.
const INACTIVE_OR_EMPTY: &str = concat!(
    "#[allow(unused_variables)]\n",
    "fn inactive_or_empty(ctx: &::ogel_lang::EvalContext, root: &::ogel_lang::Value, target: &::ogel_lang::Value) -> ::std::result::Result<::ogel_lang::Value, ::ogel_lang::EvalError> {\n",
    "    Ok({ let v = ::ogel_lang::Value::Boolean((!::ogel_lang::ops::boolean_value(&(::ogel_lang::runtime::get_property(ctx, &(::ogel_lang::runtime::get_property(ctx, &target, \"user\")?), \"active\")?)))); ",
    "if ::ogel_lang::ops::boolean_value(&v) { v } else { ",
    "::ogel_lang::Value::Boolean(::ogel_lang::ops::equals(&::ogel_lang::runtime::get_property(ctx, &target, \"n\")?, &::ogel_lang::Value::Integer(0))) } })\n",
    "}\n",
);

#[allow(unused_variables)]
fn inactive_or_empty(ctx: &::ogel_lang::EvalContext, root: &::ogel_lang::Value, target: &::ogel_lang::Value) -> ::std::result::Result<::ogel_lang::Value, ::ogel_lang::EvalError> {
    Ok({ let v = ::ogel_lang::Value::Boolean((!::ogel_lang::ops::boolean_value(&(::ogel_lang::runtime::get_property(ctx, &(::ogel_lang::runtime::get_property(ctx, &target, "user")?), "active")?)))); if ::ogel_lang::ops::boolean_value(&v) { v } else { ::ogel_lang::Value::Boolean(::ogel_lang::ops::equals(&::ogel_lang::runtime::get_property(ctx, &target, "n")?, &::ogel_lang::Value::Integer(0))) } })
}

fn inactive_or_empty_expr() -> Node {
    Node::or(vec![
        Node::not(Node::chain(vec![
            Node::property("user"),
            Node::property("active"),
        ])),
        Node::equal(Node::property("n"), Node::constant(0)),
    ])
}

fn account_root(active: bool, n: i64) -> Value {
    json_object(vec![
        ("user", json_object(vec![("active", Value::from(active))])),
        ("n", Value::from(n)),
    ])
}

#[test]
fn test_generated_routine_matches_checked_in_source() {
    let mut ctx = EvalContext::new(account_root(false, 3));
    let fragment = source::to_source(&inactive_or_empty_expr(), &mut ctx).unwrap();
    let routine = source::routine("inactive_or_empty", &fragment, ctx.current_type());
    assert_eq!(routine, INACTIVE_OR_EMPTY);
}

#[test]
fn test_compiled_routine_agrees_with_interpreter() {
    let expr = inactive_or_empty_expr();
    for (active, n) in [(false, 3), (true, 0), (true, 5), (false, 0)] {
        let root = account_root(active, n);
        let ctx = EvalContext::new(root.clone());
        let interpreted = ogel_lang::get_value(&expr, &ctx).unwrap();
        let compiled = inactive_or_empty(&ctx, &root, &root).unwrap();
        assert_eq!(compiled, interpreted, "active={active} n={n}");
    }
}

#[test]
fn test_not_equal_negates_the_equality_call() {
    let expr = Node::not_equal(Node::property("n"), Node::constant(1));
    let (src, hint) = generate(&expr, json_object(vec![("n", Value::from(2))]));
    assert_eq!(
        src,
        r#"(!::ogel_lang::ops::equals(&::ogel_lang::runtime::get_property(ctx, &target, "n")?, &::ogel_lang::Value::Integer(1)))"#
    );
    assert_eq!(hint, Some(TypeHint::Boolean));
}
