//! Array container semantics through the evaluation protocol

mod common;

use common::*;
use php_treeval::core::value::Val;

#[test]
fn nested_copy_independence_end_to_end() {
    // $a = []; $a['x']['y'] = 3; $b = $a; $b['x']['y'] = 9;
    // -> $a['x']['y'] == 3 and $b['x']['y'] == 9
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("a"), lit(Val::empty_array()))),
        expr_stmt(assign(dim(dim(t.var("a"), lit("x")), lit("y")), lit(3))),
        expr_stmt(assign(t.var("b"), t.var("a"))),
        expr_stmt(assign(dim(dim(t.var("b"), lit("x")), lit("y")), lit(9))),
        expr_stmt(assign(t.var("a_val"), dim(dim(t.var("a"), lit("x")), lit("y")))),
        expr_stmt(assign(t.var("b_val"), dim(dim(t.var("b"), lit("x")), lit("y")))),
    ];
    t.run(program);
    assert_eq!(t.get("a_val"), Val::Int(3));
    assert_eq!(t.get("b_val"), Val::Int(9));
}

#[test]
fn numeric_string_keys_normalize() {
    // $a["5"] = "canonical"; reading $a[5] hits the same slot.
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(dim(t.var("a"), lit("5")), lit("canonical"))),
        expr_stmt(assign(t.var("by_int"), dim(t.var("a"), lit(5)))),
    ];
    t.run(program);
    assert_eq!(t.get("by_int"), Val::from("canonical"));
}

#[test]
fn non_canonical_numeric_strings_stay_strings() {
    // $a["05"] and $a[5] are distinct slots.
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(dim(t.var("a"), lit("05")), lit("padded"))),
        expr_stmt(assign(dim(t.var("a"), lit(5)), lit("int"))),
        expr_stmt(assign(t.var("padded"), dim(t.var("a"), lit("05")))),
        expr_stmt(assign(t.var("int"), dim(t.var("a"), lit(5)))),
    ];
    t.run(program);
    assert_eq!(t.get("padded"), Val::from("padded"));
    assert_eq!(t.get("int"), Val::from("int"));
}

#[test]
fn append_uses_next_integer_key() {
    // $a[] = "first"; $a[7] = "gap"; $a[] = "after-gap";
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(dim_append(t.var("a")), lit("first"))),
        expr_stmt(assign(dim(t.var("a"), lit(7)), lit("gap"))),
        expr_stmt(assign(dim_append(t.var("a")), lit("after-gap"))),
        expr_stmt(assign(t.var("k0"), dim(t.var("a"), lit(0)))),
        expr_stmt(assign(t.var("k8"), dim(t.var("a"), lit(8)))),
    ];
    t.run(program);
    assert_eq!(t.get("k0"), Val::from("first"));
    assert_eq!(t.get("k8"), Val::from("after-gap"));
}

#[test]
fn missing_key_read_warns_and_yields_null() {
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("a"), lit(Val::empty_array()))),
        expr_stmt(assign(t.var("missing"), dim(t.var("a"), lit("nope")))),
    ];
    t.run(program);
    assert_eq!(t.get("missing"), Val::Null);
    assert!(t
        .warnings()
        .iter()
        .any(|message| message.contains("Undefined array key")));
}

#[test]
fn array_plus_is_left_biased_union() {
    use php_treeval::interp::expr::{BinaryExpr, BinaryOp};

    let mut t = TestRun::new();
    let union = Box::new(BinaryExpr::new(
        BinaryOp::Add,
        t.var("a"),
        t.var("b"),
    )) as _;
    let program = vec![
        expr_stmt(assign(dim(t.var("a"), lit(0)), lit("left"))),
        expr_stmt(assign(dim(t.var("b"), lit(0)), lit("right"))),
        expr_stmt(assign(dim(t.var("b"), lit(1)), lit("only-right"))),
        expr_stmt(assign(t.var("u"), union)),
        expr_stmt(assign(t.var("u0"), dim(t.var("u"), lit(0)))),
        expr_stmt(assign(t.var("u1"), dim(t.var("u"), lit(1)))),
    ];
    t.run(program);
    assert_eq!(t.get("u0"), Val::from("left"));
    assert_eq!(t.get("u1"), Val::from("only-right"));
}

#[test]
fn string_offsets_read_single_bytes() {
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("s"), lit("abc"))),
        expr_stmt(assign(t.var("first"), dim(t.var("s"), lit(0)))),
        expr_stmt(assign(t.var("last"), dim(t.var("s"), lit(-1)))),
    ];
    t.run(program);
    assert_eq!(t.get("first"), Val::from("a"));
    assert_eq!(t.get("last"), Val::from("c"));
}

#[test]
fn offset_read_on_scalar_is_recoverable() {
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("n"), lit(42))),
        expr_stmt(assign(t.var("out"), dim(t.var("n"), lit(0)))),
    ];
    t.run(program);
    assert_eq!(t.get("out"), Val::Null);
    assert!(t
        .warnings()
        .iter()
        .any(|message| message.contains("array offset")));
}
