//! Reference-cell aliasing semantics

mod common;

use common::*;
use php_treeval::core::value::Val;

#[test]
fn basic_reference() {
    // $a = 1; $b =& $a; $b = 2; -> $a == 2
    let mut t = TestRun::new();
    let a = t.var("a");
    let program = vec![
        expr_stmt(assign(a, lit(1))),
        expr_stmt(assign_ref(t.var("b"), t.var("a"))),
        expr_stmt(assign(t.var("b"), lit(2))),
    ];
    t.run(program);
    assert_eq!(t.get("a"), Val::Int(2));
}

#[test]
fn reference_chain() {
    // $a = 1; $b =& $a; $c =& $b; $c = 3; -> $a == 3
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("a"), lit(1))),
        expr_stmt(assign_ref(t.var("b"), t.var("a"))),
        expr_stmt(assign_ref(t.var("c"), t.var("b"))),
        expr_stmt(assign(t.var("c"), lit(3))),
    ];
    t.run(program);
    assert_eq!(t.get("a"), Val::Int(3));
}

#[test]
fn value_copy_separates_from_reference() {
    // $a = 1; $b =& $a; $c = $a; $c = 4; -> $a == 1
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("a"), lit(1))),
        expr_stmt(assign_ref(t.var("b"), t.var("a"))),
        expr_stmt(assign(t.var("c"), t.var("a"))),
        expr_stmt(assign(t.var("c"), lit(4))),
    ];
    t.run(program);
    assert_eq!(t.get("a"), Val::Int(1));
    assert_eq!(t.get("c"), Val::Int(4));
}

#[test]
fn rebinding_detaches_the_slot_not_the_cell() {
    // $a = 1; $b = 2; $c =& $a; $c =& $b; $c = 3; -> $a == 1, $b == 3
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("a"), lit(1))),
        expr_stmt(assign(t.var("b"), lit(2))),
        expr_stmt(assign_ref(t.var("c"), t.var("a"))),
        expr_stmt(assign_ref(t.var("c"), t.var("b"))),
        expr_stmt(assign(t.var("c"), lit(3))),
    ];
    t.run(program);
    assert_eq!(t.get("a"), Val::Int(1));
    assert_eq!(t.get("b"), Val::Int(3));
}

#[test]
fn reference_into_array_element() {
    // $arr = []; $arr['x'] = 1; $r =& $arr['x']; $r = 9; -> $arr['x'] == 9
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(t.var("arr"), lit(Val::empty_array()))),
        expr_stmt(assign(dim(t.var("arr"), lit("x")), lit(1))),
        expr_stmt(assign_ref(t.var("r"), dim(t.var("arr"), lit("x")))),
        expr_stmt(assign(t.var("r"), lit(9))),
        expr_stmt(assign(t.var("out"), dim(t.var("arr"), lit("x")))),
    ];
    t.run(program);
    assert_eq!(t.get("out"), Val::Int(9));
}

#[test]
fn element_reference_survives_array_copy() {
    // $arr['x'] = 1; $r =& $arr['x']; $copy = $arr; $r = 5;
    // -> $arr['x'] == 5 (shared cell), $copy['x'] follows the cell too:
    // ref-bound slots stay linked across the value copy.
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(dim(t.var("arr"), lit("x")), lit(1))),
        expr_stmt(assign_ref(t.var("r"), dim(t.var("arr"), lit("x")))),
        expr_stmt(assign(t.var("copy"), t.var("arr"))),
        expr_stmt(assign(t.var("r"), lit(5))),
        expr_stmt(assign(t.var("from_orig"), dim(t.var("arr"), lit("x")))),
        expr_stmt(assign(t.var("from_copy"), dim(t.var("copy"), lit("x")))),
    ];
    t.run(program);
    assert_eq!(t.get("from_orig"), Val::Int(5));
    assert_eq!(t.get("from_copy"), Val::Int(5));
}

#[test]
fn plain_elements_do_not_alias_across_copy() {
    let mut t = TestRun::new();
    let program = vec![
        expr_stmt(assign(dim(t.var("arr"), lit("x")), lit(1))),
        expr_stmt(assign(t.var("copy"), t.var("arr"))),
        expr_stmt(assign(dim(t.var("copy"), lit("x")), lit(99))),
        expr_stmt(assign(t.var("orig_x"), dim(t.var("arr"), lit("x")))),
    ];
    t.run(program);
    assert_eq!(t.get("orig_x"), Val::Int(1));
}

#[test]
fn unset_detaches_one_alias_only() {
    use php_treeval::interp::stmt::UnsetStmt;

    // $a = 7; $b =& $a; unset($b); -> $a still 7, $b gone
    let mut t = TestRun::new();
    let unset_b = Box::new(UnsetStmt(vec![t.var("b")])) as _;
    let program = vec![
        expr_stmt(assign(t.var("a"), lit(7))),
        expr_stmt(assign_ref(t.var("b"), t.var("a"))),
        unset_b,
    ];
    t.run(program);
    assert_eq!(t.get("a"), Val::Int(7));
    let b = t.sym("b");
    assert!(!t.env.var_exists(b));
}
