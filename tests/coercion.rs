//! Type juggling through operators, rendering and the fixed error policies

mod common;

use common::*;
use php_treeval::core::value::Val;
use php_treeval::interp::error::ErrorLevel;
use php_treeval::interp::expr::{
    BinaryExpr, BinaryOp, CmpExpr, CmpOp, ConcatExpr, IssetExpr, UnaryExpr, UnaryOp,
};
use php_treeval::interp::stmt::UnsetStmt;

fn binary(op: BinaryOp, lhs: php_treeval::interp::expr::ExprNode, rhs: php_treeval::interp::expr::ExprNode) -> php_treeval::interp::expr::ExprNode {
    Box::new(BinaryExpr::new(op, lhs, rhs))
}

#[test]
fn numeric_strings_participate_in_arithmetic() {
    let mut t = TestRun::new();
    let sum = binary(BinaryOp::Add, lit("5"), lit("3"));
    let program = vec![expr_stmt(assign(t.var("out"), sum))];
    t.run(program);
    assert_eq!(t.get("out"), Val::Int(8));
    assert!(t.warnings().is_empty());
}

#[test]
fn non_numeric_string_warns_and_counts_as_zero() {
    let mut t = TestRun::new();
    let sum = binary(BinaryOp::Add, lit("abc"), lit(5));
    let program = vec![expr_stmt(assign(t.var("out"), sum))];
    t.run(program);
    assert_eq!(t.get("out"), Val::Int(5));
    assert!(t
        .warnings()
        .iter()
        .any(|message| message.contains("non-numeric")));
}

#[test]
fn division_by_zero_policy_is_warning_plus_sentinel() {
    let mut t = TestRun::new();
    let div = binary(BinaryOp::Div, lit(1), lit(0));
    let modulo = binary(BinaryOp::Mod, lit(1), lit(0));
    let program = vec![
        expr_stmt(assign(t.var("div"), div)),
        expr_stmt(assign(t.var("mod"), modulo)),
        // Evaluation continued past both.
        expr_stmt(assign(t.var("after"), lit(1))),
    ];
    t.run(program);
    assert_eq!(t.get("div"), Val::Bool(false));
    assert_eq!(t.get("mod"), Val::Bool(false));
    assert_eq!(t.get("after"), Val::Int(1));
    assert_eq!(t.warnings().len(), 2);
}

#[test]
fn int_division_stays_int_when_exact() {
    let mut t = TestRun::new();
    let exact = binary(BinaryOp::Div, lit(6), lit(3));
    let inexact = binary(BinaryOp::Div, lit(7), lit(2));
    let program = vec![
        expr_stmt(assign(t.var("exact"), exact)),
        expr_stmt(assign(t.var("inexact"), inexact)),
    ];
    t.run(program);
    assert_eq!(t.get("exact"), Val::Int(2));
    assert_eq!(t.get("inexact"), Val::Float(3.5));
}

#[test]
fn concat_builds_one_string() {
    let mut t = TestRun::new();
    let concat = Box::new(ConcatExpr::new(vec![
        lit("value: "),
        lit(42),
        lit(", done: "),
        lit(true),
    ]));
    let program = vec![expr_stmt(assign(t.var("out"), concat))];
    t.run(program);
    assert_eq!(t.get("out"), Val::from("value: 42, done: 1"));
}

#[test]
fn echo_renders_through_the_sink() {
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("x"), lit(7))),
        echo(vec![lit("x="), t.var("x"), lit("\n")]),
    ];
    t.run(program);
    assert_eq!(t.stdout_str(), "x=7\n");
}

#[test]
fn rendering_an_array_is_a_sentinel_with_warning() {
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(dim_append(t.var("a")), lit(1))),
        echo(vec![t.var("a")]),
    ];
    t.run(program);
    assert_eq!(t.stdout_str(), "Array");
    assert!(t
        .warnings()
        .iter()
        .any(|message| message.contains("Array to string conversion")));
}

#[test]
fn loose_vs_strict_comparison() {
    let mut t = TestRun::new();
    let loose = Box::new(CmpExpr::new(CmpOp::Eq, lit(100), lit("1e2")));
    let strict = Box::new(CmpExpr::new(CmpOp::Identical, lit(100), lit("100")));
    let lt = Box::new(CmpExpr::new(CmpOp::Lt, lit("9"), lit("10")));
    let program = vec![
        expr_stmt(assign(t.var("loose"), loose)),
        expr_stmt(assign(t.var("strict"), strict)),
        expr_stmt(assign(t.var("lt"), lt)),
    ];
    t.run(program);
    assert_eq!(t.get("loose"), Val::Bool(true));
    assert_eq!(t.get("strict"), Val::Bool(false));
    // Two numeric strings order numerically, not bytewise.
    assert_eq!(t.get("lt"), Val::Bool(true));
}

#[test]
fn unary_operators() {
    let mut t = TestRun::new();
    let neg = Box::new(UnaryExpr::new(UnaryOp::Neg, lit("7")));
    let not = Box::new(UnaryExpr::new(UnaryOp::Not, lit("0")));
    let program = vec![
        expr_stmt(assign(t.var("neg"), neg)),
        expr_stmt(assign(t.var("not"), not)),
    ];
    t.run(program);
    assert_eq!(t.get("neg"), Val::Int(-7));
    assert_eq!(t.get("not"), Val::Bool(true));
}

#[test]
fn logical_operators_short_circuit() {
    use php_treeval::interp::call::Function;
    use php_treeval::interp::expr::{LogicalExpr, LogicalOp};
    use php_treeval::interp::stmt::ReturnStmt;

    // function touch() { global $touched; $touched = true; return true; }
    let mut t = TestRun::new();
    let touched = t.sym("touched");
    let body = block(vec![
        Box::new(php_treeval::interp::stmt::GlobalStmt(vec![touched])) as _,
        expr_stmt(assign(t.var("touched"), lit(true))),
        Box::new(ReturnStmt(Some(lit(true)))) as _,
    ]);
    t.env
        .register_function(b"touch", Function::user("touch", Vec::new(), body))
        .unwrap();

    let touch = t.sym("touch");
    let or = Box::new(LogicalExpr::new(
        LogicalOp::Or,
        lit(true),
        call(touch, vec![]),
    ));
    let program = vec![
        expr_stmt(assign(t.var("touched"), lit(false))),
        expr_stmt(assign(t.var("out"), or)),
    ];
    t.run(program);
    assert_eq!(t.get("out"), Val::Bool(true));
    // The right-hand side never ran.
    assert_eq!(t.get("touched"), Val::Bool(false));
}

#[test]
fn undefined_variable_read_is_a_notice() {
    let mut t = TestRun::new();
    let program = vec![expr_stmt(assign(t.var("copy"), t.var("never_set")))];
    t.run(program);
    assert_eq!(t.get("copy"), Val::Null);
    assert!(t
        .diagnostics()
        .iter()
        .any(|(level, message)| *level == ErrorLevel::Notice
            && message.contains("Undefined variable")));
}

#[test]
fn isset_distinguishes_null_from_unset_for_probes() {
    let mut t = TestRun::new();
    let null_probe = Box::new(IssetExpr::new(vec![t.var("holds_null")]));
    let unset_probe = Box::new(IssetExpr::new(vec![t.var("removed")]));
    let unset_stmt = Box::new(UnsetStmt(vec![t.var("removed")])) as _;
    let program = vec![
        expr_stmt(assign(t.var("holds_null"), lit(Val::Null))),
        expr_stmt(assign(t.var("removed"), lit(1))),
        unset_stmt,
        expr_stmt(assign(t.var("null_probe"), null_probe)),
        expr_stmt(assign(t.var("unset_probe"), unset_probe)),
    ];
    t.run(program);
    // Both report false to isset, but only the null-holding slot exists.
    assert_eq!(t.get("null_probe"), Val::Bool(false));
    assert_eq!(t.get("unset_probe"), Val::Bool(false));
    let holds_null = t.sym("holds_null");
    let removed = t.sym("removed");
    assert!(t.env.var_exists(holds_null));
    assert!(!t.env.var_exists(removed));
}

#[test]
fn increment_replaces_the_slot_value() {
    use php_treeval::interp::expr::{IncDecExpr, IncDecOp};

    let mut t = TestRun::new();
    let pre = Box::new(IncDecExpr::new(IncDecOp::PreInc, t.var("x")));
    let post = Box::new(IncDecExpr::new(IncDecOp::PostDec, t.var("x")));
    let program = vec![
        expr_stmt(assign(t.var("x"), lit(5))),
        expr_stmt(assign(t.var("pre"), pre)),
        expr_stmt(assign(t.var("post"), post)),
    ];
    t.run(program);
    assert_eq!(t.get("pre"), Val::Int(6));
    assert_eq!(t.get("post"), Val::Int(6));
    assert_eq!(t.get("x"), Val::Int(5));
}
