//! Common test helpers
//!
//! Tests drive the engine the way an embedding parser would: they build
//! expression/statement trees by hand and evaluate them against a captured
//! environment. `TestRun` bundles the environment with its captured output
//! and diagnostics.

#![allow(dead_code)]

use php_treeval::core::value::{Symbol, Val};
use php_treeval::interp::env::{Env, SharedBufferWriter};
use php_treeval::interp::error::{CollectingErrorHandler, ErrorLevel};
use php_treeval::interp::executor::run_program;
use php_treeval::interp::expr::{
    ArrayDimExpr, AssignExpr, AssignRefExpr, CallExpr, ExprNode, FieldGetExpr, MethodCallExpr,
    NewExpr, VarExpr,
};
use php_treeval::interp::stmt::{BlockStmt, EchoStmt, ExprStmt, StmtNode};
use php_treeval::runtime::context::EngineContext;

pub use php_treeval::interp::expr::lit;

pub struct TestRun {
    pub env: Env,
    stdout: SharedBufferWriter,
    diagnostics: CollectingErrorHandler,
}

impl TestRun {
    pub fn new() -> Self {
        let mut env = Env::new(EngineContext::new());
        let stdout = SharedBufferWriter::new();
        let diagnostics = CollectingErrorHandler::new();
        env.set_output_writer(Box::new(stdout.clone()));
        env.set_error_handler(Box::new(diagnostics.clone()));
        Self {
            env,
            stdout,
            diagnostics,
        }
    }

    pub fn sym(&mut self, name: &str) -> Symbol {
        self.env.intern(name.as_bytes())
    }

    /// Variable reference node.
    pub fn var(&mut self, name: &str) -> ExprNode {
        let sym = self.sym(name);
        Box::new(VarExpr::new(sym))
    }

    /// Current value of a variable (unset reads as null, with a notice).
    pub fn get(&mut self, name: &str) -> Val {
        let sym = self.sym(name);
        self.env.read_var(sym)
    }

    /// Execute statements as a top-level program, panicking on engine
    /// errors.
    pub fn run(&mut self, program: Vec<StmtNode>) -> Val {
        run_program(&mut self.env, &program).expect("program execution failed")
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout.contents()).into_owned()
    }

    pub fn diagnostics(&self) -> Vec<(ErrorLevel, String)> {
        self.diagnostics.entries()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics
            .entries()
            .into_iter()
            .filter(|(level, _)| *level == ErrorLevel::Warning)
            .map(|(_, message)| message)
            .collect()
    }
}

// ---- expression builders ----------------------------------------------

pub fn assign(target: ExprNode, value: ExprNode) -> ExprNode {
    Box::new(AssignExpr::new(target, value))
}

pub fn assign_ref(target: ExprNode, source: ExprNode) -> ExprNode {
    Box::new(AssignRefExpr::new(target, source))
}

pub fn dim(base: ExprNode, index: ExprNode) -> ExprNode {
    Box::new(ArrayDimExpr::new(base, index))
}

pub fn dim_append(base: ExprNode) -> ExprNode {
    Box::new(ArrayDimExpr::append(base))
}

pub fn field(obj: ExprNode, name: Symbol) -> ExprNode {
    Box::new(FieldGetExpr::new(obj, name))
}

pub fn call(name: Symbol, args: Vec<ExprNode>) -> ExprNode {
    Box::new(CallExpr::new(name, args))
}

pub fn method_call(obj: ExprNode, method: Symbol, args: Vec<ExprNode>) -> ExprNode {
    Box::new(MethodCallExpr::new(obj, method, args))
}

pub fn new_object(class: Symbol, args: Vec<ExprNode>) -> ExprNode {
    Box::new(NewExpr::new(class, args))
}

// ---- statement builders ------------------------------------------------

pub fn expr_stmt(expr: ExprNode) -> StmtNode {
    Box::new(ExprStmt(expr))
}

pub fn echo(parts: Vec<ExprNode>) -> StmtNode {
    Box::new(EchoStmt(parts))
}

pub fn block(stmts: Vec<StmtNode>) -> StmtNode {
    Box::new(BlockStmt(stmts))
}
