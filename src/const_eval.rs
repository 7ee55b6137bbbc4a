use crate::translate::{ConstExpr, ConstOp};
use crate::values::Ref;
use crate::{enum_accessors, wasm_unsupported, Error};
use alloc::string::String;
use smallvec::SmallVec;

/// The result of evaluating a constant expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstVal {
    I32(i32),
    I64(i64),
    Ref(Ref),
}

impl ConstVal {
    enum_accessors! {
        e
        (I32(i32) is_i32 i32 unwrap_i32 *e)
        (I64(i64) is_i64 i64 unwrap_i64 *e)
        (Ref(Ref) is_ref ref_ unwrap_ref *e)
    }
}

#[derive(Debug, Default)]
pub struct ConstExprEvaluator {
    stack: SmallVec<[ConstVal; 2]>,
}

impl ConstExprEvaluator {
    /// Evaluates `expr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for `global.get`, and [`Error::InvalidWebAssembly`] if
    /// the expression is ill-typed or doesn't produce exactly one value.
    pub fn eval(&mut self, expr: &ConstExpr) -> crate::Result<ConstVal> {
        self.stack.clear();

        for op in expr.ops() {
            match op {
                ConstOp::I32Const(value) => self.push(ConstVal::I32(value)),
                ConstOp::I64Const(value) => self.push(ConstVal::I64(value)),
                ConstOp::RefNull => self.push(ConstVal::Ref(Ref::Null)),
                ConstOp::RefFunc(index) => self.push(ConstVal::Ref(Ref::Func(index))),
                ConstOp::GlobalGet(index) => {
                    return Err(wasm_unsupported!(
                        "global.get {} in constant expression",
                        index.as_u32()
                    ));
                }
                ConstOp::I32Add => self.binop_i32(i32::wrapping_add)?,
                ConstOp::I32Sub => self.binop_i32(i32::wrapping_sub)?,
                ConstOp::I32Mul => self.binop_i32(i32::wrapping_mul)?,
                ConstOp::I64Add => self.binop_i64(i64::wrapping_add)?,
                ConstOp::I64Sub => self.binop_i64(i64::wrapping_sub)?,
                ConstOp::I64Mul => self.binop_i64(i64::wrapping_mul)?,
            }
        }

        match (self.stack.pop(), self.stack.is_empty()) {
            (Some(val), true) => Ok(val),
            _ => Err(invalid("constant expression must yield one value")),
        }
    }

    /// Evaluates `expr` as an offset into a 32-bit table.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails or the result is not an `i32`.
    pub fn eval_offset(&mut self, expr: &ConstExpr) -> crate::Result<u32> {
        let offset = self
            .eval(expr)?
            .i32()
            .ok_or_else(|| invalid("table offset must be an i32"))?;
        Ok(u32::from_ne_bytes(offset.to_ne_bytes()))
    }

    /// Evaluates `expr` as a reference.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails or the result is not a reference.
    pub fn eval_ref(&mut self, expr: &ConstExpr) -> crate::Result<Ref> {
        self.eval(expr)?
            .ref_()
            .ok_or_else(|| invalid("expected a reference-typed constant expression"))
    }

    fn push(&mut self, val: ConstVal) {
        self.stack.push(val);
    }

    fn binop_i32(&mut self, f: impl FnOnce(i32, i32) -> i32) -> crate::Result<()> {
        let (v1, v2) = self.pop2()?;
        match (v1, v2) {
            (ConstVal::I32(a), ConstVal::I32(b)) => {
                self.push(ConstVal::I32(f(a, b)));
                Ok(())
            }
            _ => Err(invalid("type mismatch in i32 constant expression")),
        }
    }

    fn binop_i64(&mut self, f: impl FnOnce(i64, i64) -> i64) -> crate::Result<()> {
        let (v1, v2) = self.pop2()?;
        match (v1, v2) {
            (ConstVal::I64(a), ConstVal::I64(b)) => {
                self.push(ConstVal::I64(f(a, b)));
                Ok(())
            }
            _ => Err(invalid("type mismatch in i64 constant expression")),
        }
    }

    fn pop2(&mut self) -> crate::Result<(ConstVal, ConstVal)> {
        let v2 = self.stack.pop();
        let v1 = self.stack.pop();
        v1.zip(v2)
            .ok_or_else(|| invalid("stack underflow in constant expression"))
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidWebAssembly {
        message: String::from(message),
        offset: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::{FuncIndex, GlobalIndex};

    #[test]
    fn evaluates_extended_const() {
        let mut eval = ConstExprEvaluator::default();
        let expr = ConstExpr::new([ConstOp::I32Const(6), ConstOp::I32Const(4), ConstOp::I32Sub]);
        assert_eq!(eval.eval(&expr).unwrap(), ConstVal::I32(2));

        let expr = ConstExpr::new([
            ConstOp::I64Const(i64::MAX),
            ConstOp::I64Const(2),
            ConstOp::I64Mul,
        ]);
        assert_eq!(eval.eval(&expr).unwrap(), ConstVal::I64(-2));
    }

    #[test]
    fn offsets_are_reinterpreted_unsigned() {
        let mut eval = ConstExprEvaluator::default();
        let expr = ConstExpr::new([ConstOp::I32Const(-1)]);
        assert_eq!(eval.eval_offset(&expr).unwrap(), u32::MAX);
    }

    #[test]
    fn references() {
        let mut eval = ConstExprEvaluator::default();
        assert_eq!(
            eval.eval_ref(&ConstExpr::new([ConstOp::RefNull])).unwrap(),
            Ref::Null
        );
        assert_eq!(
            eval.eval_ref(&ConstExpr::new([ConstOp::RefFunc(FuncIndex::from_u32(3))]))
                .unwrap(),
            Ref::Func(FuncIndex::from_u32(3))
        );
        let int = ConstExpr::new([ConstOp::I32Const(0)]);
        assert!(eval.eval_ref(&int).is_err());
    }

    #[test]
    fn globals_are_unsupported() {
        let mut eval = ConstExprEvaluator::default();
        let expr = ConstExpr::new([ConstOp::GlobalGet(GlobalIndex::from_u32(0))]);
        assert!(matches!(eval.eval(&expr), Err(Error::Unsupported(_))));
    }

    #[test]
    fn malformed_expressions() {
        let mut eval = ConstExprEvaluator::default();
        assert!(matches!(
            eval.eval(&ConstExpr::new([ConstOp::I32Add])),
            Err(Error::InvalidWebAssembly { .. })
        ));
        let two_values = ConstExpr::new([ConstOp::I32Const(1), ConstOp::I32Const(2)]);
        assert!(matches!(
            eval.eval(&two_values),
            Err(Error::InvalidWebAssembly { .. })
        ));
        assert!(eval.eval(&ConstExpr::new([])).is_err());
    }
}
