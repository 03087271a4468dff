//! Operators
//!
//! Arithmetic, bitwise, comparison, logical and concatenation nodes. The
//! numeric work itself lives on `Val`; this layer adds the per-operator
//! policies that need an environment: the non-numeric-string diagnostic and
//! the zero-divisor sentinel.
//!
//! Division and modulo by zero share one fixed policy: a warning plus a
//! `false` sentinel, with evaluation continuing. Negative shift amounts get
//! the same treatment.

use crate::core::value::{parse_numeric, Val};
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::{Expr, ExprNode};
use std::cmp::Ordering;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: ExprNode,
    pub rhs: ExprNode,
}

impl BinaryExpr {
    pub fn new(op: BinaryOp, lhs: ExprNode, rhs: ExprNode) -> Self {
        Self { op, lhs, rhs }
    }
}

/// Raise the recoverable diagnostic for strings without a numeric prefix
/// participating in arithmetic; they coerce to zero and evaluation goes on.
fn warn_non_numeric(env: &mut Env, value: &Val) {
    if let Val::String(s) = value {
        let fully = matches!(parse_numeric(s), Some((_, true)));
        if !fully {
            env.warn("A non-numeric value encountered");
        }
    }
}

impl Expr for BinaryExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let lhs = self.lhs.eval(env)?;
        let rhs = self.rhs.eval(env)?;

        if !(matches!(self.op, BinaryOp::Add)
            && matches!(lhs, Val::Array(_))
            && matches!(rhs, Val::Array(_)))
        {
            warn_non_numeric(env, &lhs);
            warn_non_numeric(env, &rhs);
        }

        let result = match self.op {
            BinaryOp::Add => lhs.add(&rhs),
            BinaryOp::Sub => lhs.sub(&rhs),
            BinaryOp::Mul => lhs.mul(&rhs),
            BinaryOp::Div => {
                if rhs.to_float() == 0.0 {
                    env.warn("Division by zero");
                    return Ok(Val::Bool(false));
                }
                lhs.div(&rhs)
            }
            BinaryOp::Mod => {
                if rhs.to_int() == 0 {
                    env.warn("Modulo by zero");
                    return Ok(Val::Bool(false));
                }
                lhs.rem(&rhs)
            }
            BinaryOp::Shl | BinaryOp::Shr => {
                if rhs.to_int() < 0 {
                    env.warn("Bit shift by negative number");
                    return Ok(Val::Bool(false));
                }
                match self.op {
                    BinaryOp::Shl => lhs.shl(&rhs),
                    _ => lhs.shr(&rhs),
                }
            }
            BinaryOp::BitAnd => lhs.bit_and(&rhs),
            BinaryOp::BitOr => lhs.bit_or(&rhs),
            BinaryOp::BitXor => lhs.bit_xor(&rhs),
        };
        Ok(result)
    }
}

/// String concatenation chain (`.`). Parts append into one byte builder,
/// frozen into the immutable string form before the result is observable.
#[derive(Debug)]
pub struct ConcatExpr {
    pub parts: Vec<ExprNode>,
}

impl ConcatExpr {
    pub fn new(parts: Vec<ExprNode>) -> Self {
        Self { parts }
    }
}

impl Expr for ConcatExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let mut builder = Vec::new();
        for part in &self.parts {
            let value = part.eval(env)?;
            builder.extend_from_slice(&env.render_bytes(&value));
        }
        Ok(Val::String(Rc::new(builder)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug)]
pub struct CmpExpr {
    pub op: CmpOp,
    pub lhs: ExprNode,
    pub rhs: ExprNode,
}

impl CmpExpr {
    pub fn new(op: CmpOp, lhs: ExprNode, rhs: ExprNode) -> Self {
        Self { op, lhs, rhs }
    }
}

impl Expr for CmpExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let lhs = self.lhs.eval(env)?;
        let rhs = self.rhs.eval(env)?;
        let result = match self.op {
            CmpOp::Eq => lhs.loose_equals(&rhs),
            CmpOp::Neq => !lhs.loose_equals(&rhs),
            CmpOp::Identical => lhs.identical_to(&rhs),
            CmpOp::NotIdentical => !lhs.identical_to(&rhs),
            CmpOp::Lt => lhs.loose_cmp(&rhs) == Ordering::Less,
            CmpOp::Le => lhs.loose_cmp(&rhs) != Ordering::Greater,
            CmpOp::Gt => lhs.loose_cmp(&rhs) == Ordering::Greater,
            CmpOp::Ge => lhs.loose_cmp(&rhs) != Ordering::Less,
        };
        Ok(Val::Bool(result))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Xor,
}

/// `&&` / `||` short-circuit; `xor` evaluates both sides.
#[derive(Debug)]
pub struct LogicalExpr {
    pub op: LogicalOp,
    pub lhs: ExprNode,
    pub rhs: ExprNode,
}

impl LogicalExpr {
    pub fn new(op: LogicalOp, lhs: ExprNode, rhs: ExprNode) -> Self {
        Self { op, lhs, rhs }
    }
}

impl Expr for LogicalExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let lhs = self.lhs.eval(env)?.to_bool();
        let result = match self.op {
            LogicalOp::And => lhs && self.rhs.eval(env)?.to_bool(),
            LogicalOp::Or => lhs || self.rhs.eval(env)?.to_bool(),
            LogicalOp::Xor => lhs ^ self.rhs.eval(env)?.to_bool(),
        };
        Ok(Val::Bool(result))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: ExprNode,
}

impl UnaryExpr {
    pub fn new(op: UnaryOp, operand: ExprNode) -> Self {
        Self { op, operand }
    }
}

impl Expr for UnaryExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let value = self.operand.eval(env)?;
        let result = match self.op {
            UnaryOp::Neg => {
                warn_non_numeric(env, &value);
                value.neg()
            }
            UnaryOp::Not => Val::Bool(!value.to_bool()),
            UnaryOp::BitNot => value.bit_not(),
        };
        Ok(result)
    }
}
