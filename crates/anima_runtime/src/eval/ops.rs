//! Operator evaluation and value formatting.
use anima_ir::{BinaryOp, UnaryOp};

use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind, messages};
use crate::instance::{InstanceData, InstanceId, NIL};

impl Engine {
    /// Consume both operands, produce a +1 result.
    pub(crate) fn eval_binary(
        &mut self,
        op: BinaryOp,
        l: InstanceId,
        r: InstanceId,
    ) -> Result<InstanceId, RuntimeError> {
        let result = self.binary_value(op, l, r);
        self.release(l);
        self.release(r);
        result
    }

    fn binary_value(
        &mut self,
        op: BinaryOp,
        l: InstanceId,
        r: InstanceId,
    ) -> Result<InstanceId, RuntimeError> {
        use InstanceData::*;
        match (&self.objs.get(l).data, &self.objs.get(r).data) {
            (Integer(a), Integer(b)) => {
                let (a, b) = (*a, *b);
                self.int_binary(op, a, b)
            }
            (Real(a), Real(b)) => {
                let (a, b) = (*a, *b);
                self.real_binary(op, a, b)
            }
            (Integer(a), Real(b)) => {
                let (a, b) = (*a as f32, *b);
                self.real_binary(op, a, b)
            }
            (Real(a), Integer(b)) => {
                let (a, b) = (*a, *b as f32);
                self.real_binary(op, a, b)
            }
            (Str(a), Str(b)) => {
                let (a, b) = (a.clone(), b.clone());
                self.str_binary(op, &a, &b)
            }
            (Sym(a), Sym(b)) => match op {
                BinaryOp::Eq => Ok(self.new_boolean(a == b)),
                BinaryOp::Ne => Ok(self.new_boolean(a != b)),
                _ => Err(self.bad_operands(op)),
            },
            (Boolean(a), Boolean(b)) => {
                let (a, b) = (*a, *b);
                match op {
                    BinaryOp::Eq => Ok(self.new_boolean(a == b)),
                    BinaryOp::Ne => Ok(self.new_boolean(a != b)),
                    _ => Err(self.bad_operands(op)),
                }
            }
            (List(a), List(b)) => match op {
                BinaryOp::Add => {
                    let mut items: Vec<InstanceId> = Vec::with_capacity(a.len() + b.len());
                    items.extend(a.iter().copied());
                    items.extend(b.iter().copied());
                    for &item in &items {
                        self.objs.inc_ref(item);
                    }
                    Ok(self.new_list(items))
                }
                BinaryOp::Eq => Ok(self.new_boolean(l == r)),
                BinaryOp::Ne => Ok(self.new_boolean(l != r)),
                _ => Err(self.bad_operands(op)),
            },
            _ => match op {
                // Identity comparison for everything else, nil included.
                BinaryOp::Eq => Ok(self.new_boolean(l == r)),
                BinaryOp::Ne => Ok(self.new_boolean(l != r)),
                _ => Err(self.bad_operands(op)),
            },
        }
    }

    fn int_binary(&mut self, op: BinaryOp, a: i64, b: i64) -> Result<InstanceId, RuntimeError> {
        Ok(match op {
            BinaryOp::Add => self.new_integer(a.wrapping_add(b)),
            BinaryOp::Sub => self.new_integer(a.wrapping_sub(b)),
            BinaryOp::Mul => self.new_integer(a.wrapping_mul(b)),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::DivisionByZero,
                        messages::DIVISION_BY_ZERO,
                    ));
                }
                self.new_integer(a.wrapping_div(b))
            }
            BinaryOp::Mod => {
                if b == 0 {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::DivisionByZero,
                        messages::DIVISION_BY_ZERO,
                    ));
                }
                self.new_integer(a.wrapping_rem(b))
            }
            BinaryOp::Gt => self.new_boolean(a > b),
            BinaryOp::Lt => self.new_boolean(a < b),
            BinaryOp::Ge => self.new_boolean(a >= b),
            BinaryOp::Le => self.new_boolean(a <= b),
            BinaryOp::Eq => self.new_boolean(a == b),
            BinaryOp::Ne => self.new_boolean(a != b),
            BinaryOp::And | BinaryOp::Or => return Err(self.bad_operands(op)),
        })
    }

    fn real_binary(&mut self, op: BinaryOp, a: f32, b: f32) -> Result<InstanceId, RuntimeError> {
        Ok(match op {
            BinaryOp::Add => self.new_real(a + b),
            BinaryOp::Sub => self.new_real(a - b),
            BinaryOp::Mul => self.new_real(a * b),
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::DivisionByZero,
                        messages::DIVISION_BY_ZERO,
                    ));
                }
                self.new_real(a / b)
            }
            BinaryOp::Mod => self.new_real(a % b),
            BinaryOp::Gt => self.new_boolean(a > b),
            BinaryOp::Lt => self.new_boolean(a < b),
            BinaryOp::Ge => self.new_boolean(a >= b),
            BinaryOp::Le => self.new_boolean(a <= b),
            BinaryOp::Eq => self.new_boolean(a == b),
            BinaryOp::Ne => self.new_boolean(a != b),
            BinaryOp::And | BinaryOp::Or => return Err(self.bad_operands(op)),
        })
    }

    fn str_binary(&mut self, op: BinaryOp, a: &str, b: &str) -> Result<InstanceId, RuntimeError> {
        Ok(match op {
            BinaryOp::Add => {
                let mut s = String::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                self.new_string(s)
            }
            BinaryOp::Eq => self.new_boolean(a == b),
            BinaryOp::Ne => self.new_boolean(a != b),
            BinaryOp::Gt => self.new_boolean(a > b),
            BinaryOp::Lt => self.new_boolean(a < b),
            BinaryOp::Ge => self.new_boolean(a >= b),
            BinaryOp::Le => self.new_boolean(a <= b),
            _ => return Err(self.bad_operands(op)),
        })
    }

    /// Consume the operand, produce a +1 result.
    pub(crate) fn eval_unary(
        &mut self,
        op: UnaryOp,
        v: InstanceId,
    ) -> Result<InstanceId, RuntimeError> {
        let result = match (op, &self.objs.get(v).data) {
            (UnaryOp::Neg, InstanceData::Integer(a)) => {
                let a = *a;
                Ok(self.new_integer(-a))
            }
            (UnaryOp::Neg, InstanceData::Real(a)) => {
                let a = *a;
                Ok(self.new_real(-a))
            }
            (UnaryOp::Not, InstanceData::Boolean(a)) => {
                let a = *a;
                Ok(self.new_boolean(!a))
            }
            (UnaryOp::Neg, _) => Err(RuntimeError::new(
                RuntimeErrorKind::NotANumber,
                messages::NOT_A_NUMBER,
            )),
            (UnaryOp::Not, _) => Err(RuntimeError::new(
                RuntimeErrorKind::NotABoolean,
                messages::NOT_A_BOOLEAN,
            )),
        };
        self.release(v);
        result
    }

    fn bad_operands(&self, op: BinaryOp) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::ArgumentType,
            format!("operator {op:?} not defined for these operands"),
        )
    }

    /// Consume the value; yield its Boolean payload or a runtime error.
    pub(crate) fn expect_boolean(&mut self, v: InstanceId) -> Result<bool, RuntimeError> {
        let result = match &self.objs.get(v).data {
            InstanceData::Boolean(b) => Ok(*b),
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::NotABoolean,
                messages::NOT_A_BOOLEAN,
            )),
        };
        self.release(v);
        result
    }

    /// Printable rendition, the way `write` shows values.
    pub fn value_to_string(&self, v: InstanceId) -> String {
        if v == NIL {
            return "nil".to_string();
        }
        match &self.objs.get(v).data {
            InstanceData::None => "nil".to_string(),
            InstanceData::Boolean(b) => b.to_string(),
            InstanceData::Integer(i) => {
                let mut buf = itoa::Buffer::new();
                buf.format(*i).to_string()
            }
            InstanceData::Real(r) => {
                let mut buf = ryu::Buffer::new();
                buf.format(*r).to_string()
            }
            InstanceData::Str(s) => s.to_string(),
            InstanceData::Sym(s) => format!("'{}'", s),
            InstanceData::List(items) => {
                let mut out = String::from("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.value_to_string(*item));
                }
                out.push(']');
                out
            }
            InstanceData::Slots(_) => {
                format!("{}()", self.brain.class(self.objs.class_of(v)).name)
            }
            InstanceData::Actor { name, .. } => format!("@{}", name),
            InstanceData::ClassRef(c) => self.brain.class(*c).name.as_str(),
            InstanceData::Closure(c) => {
                if c.lit.is_coroutine {
                    "<coroutine closure>".to_string()
                } else {
                    "<closure>".to_string()
                }
            }
            InstanceData::Shared(inner) => self.value_to_string(*inner),
        }
    }
}
