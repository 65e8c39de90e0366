//! Expression typing.

use quill_ir::{BinaryOp, ExprId, ExprKind, Name, Span, Type, UnaryOp};
use quill_resolve::{edit_distance, Builtin, SymbolKind, MAX_SUGGESTION_DISTANCE};
use quill_stack::ensure_sufficient_stack;
use smallvec::SmallVec;

use super::Checker;
use crate::error::{Expected, TypeErrorKind};

type ArgTypes = SmallVec<[Type; 4]>;

impl Checker<'_> {
    /// Compute and record the type of `id`.
    pub(super) fn check_expr(&mut self, id: ExprId) -> Type {
        let ty = ensure_sufficient_stack(|| self.infer_expr(id));
        tracing::trace!(expr = ?id, %ty, "typed");
        self.expr_types[id.index()] = ty.clone();
        ty
    }

    fn infer_expr(&mut self, id: ExprId) -> Type {
        let module = self.module;
        let expr = module.arena.get(id);
        match &expr.kind {
            ExprKind::Int(_) => Type::INT,
            ExprKind::Float(_) => Type::FLOAT,
            ExprKind::Bool(_) => Type::BOOL,
            ExprKind::Str(_) => Type::STR,
            ExprKind::Ident(_) => {
                let ty = self.name_type(id);
                if matches!(ty, Type::Function(_)) {
                    self.mismatch(Expected::Value, ty, expr.span);
                    Type::Error
                } else {
                    ty
                }
            }
            ExprKind::Binary { op, left, right } => {
                self.check_binary(*op, *left, *right, expr.span)
            }
            ExprKind::Unary { op, operand } => self.check_unary(*op, *operand, expr.span),
            ExprKind::Call { callee, args } => self.check_call(*callee, args, expr.span),
            ExprKind::Index { array, index } => self.check_index(*array, *index),
            ExprKind::NewArray { elem, len } => {
                self.expect_exact(*len, &Type::INT);
                if self.check_storable(elem, expr.span) {
                    Type::array_of(elem.clone())
                } else {
                    Type::Error
                }
            }
            ExprKind::Field {
                base,
                field,
                field_span,
            } => self.check_field(*base, *field, *field_span),
            ExprKind::Assign { target, value } => self.check_assign(*target, *value),
            ExprKind::Error => Type::Error,
        }
    }

    fn name_type(&self, id: ExprId) -> Type {
        self.res
            .expr_symbol(id)
            .map_or(Type::Error, |sym| self.res.symbol(sym).ty.clone())
    }

    /// Type an expression in a position where a function name is allowed:
    /// a callee, or a target that reports its own error for functions.
    pub(super) fn check_place(&mut self, id: ExprId) -> Type {
        if !matches!(self.module.arena.kind(id), ExprKind::Ident(_)) {
            return self.check_expr(id);
        }
        let ty = self.name_type(id);
        self.expr_types[id.index()] = ty.clone();
        ty
    }

    fn check_binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId, span: Span) -> Type {
        let lt = self.check_expr(left);
        let rt = self.check_expr(right);
        if lt.contains_error() || rt.contains_error() {
            return Type::Error;
        }

        let both_numeric = lt.is_numeric() && rt.is_numeric();
        let result = if op.is_arithmetic() {
            if lt == Type::INT && rt == Type::INT {
                Some(Type::INT)
            } else if both_numeric {
                self.widen_operands(left, &lt, right, &rt);
                Some(Type::FLOAT)
            } else if op == BinaryOp::Add && lt == Type::STR && rt == Type::STR {
                Some(Type::STR)
            } else {
                None
            }
        } else if op.is_ordering() {
            both_numeric.then(|| {
                self.widen_operands(left, &lt, right, &rt);
                Type::BOOL
            })
        } else if op.is_equality() {
            if both_numeric {
                self.widen_operands(left, &lt, right, &rt);
                Some(Type::BOOL)
            } else if lt == rt
                && matches!(lt, Type::Primitive(_) | Type::Array(_) | Type::Record(_))
            {
                Some(Type::BOOL)
            } else {
                None
            }
        } else if lt == Type::BOOL && rt == Type::BOOL {
            Some(Type::BOOL)
        } else {
            None
        };

        result.unwrap_or_else(|| {
            self.error(
                TypeErrorKind::BinaryOperands {
                    op,
                    left: lt,
                    right: rt,
                },
                span,
            );
            Type::Error
        })
    }

    /// Mixed `int`/`float` operands: the `int` side is widened.
    fn widen_operands(&mut self, left: ExprId, lt: &Type, right: ExprId, rt: &Type) {
        if *lt == Type::INT && *rt == Type::FLOAT {
            self.widened.insert(left);
        } else if *lt == Type::FLOAT && *rt == Type::INT {
            self.widened.insert(right);
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> Type {
        let ty = self.check_expr(operand);
        if ty.contains_error() {
            return Type::Error;
        }
        let ok = match op {
            UnaryOp::Neg => ty.is_numeric(),
            UnaryOp::Not => ty == Type::BOOL,
        };
        if ok {
            ty
        } else {
            self.error(TypeErrorKind::UnaryOperand { op, operand: ty }, span);
            Type::Error
        }
    }

    fn check_call(&mut self, callee: ExprId, args: &[ExprId], span: Span) -> Type {
        let res = self.res;
        let builtin = match self.module.arena.kind(callee) {
            ExprKind::Ident(_) => res
                .expr_symbol(callee)
                .and_then(|sym| res.symbol(sym).builtin()),
            _ => None,
        };
        let callee_ty = self.check_place(callee);
        let arg_types: ArgTypes = args.iter().map(|arg| self.check_expr(*arg)).collect();

        if let Some(builtin) = builtin.filter(|b| b.has_custom_rule()) {
            return self.check_builtin_call(builtin, args, &arg_types, span);
        }
        if callee_ty.is_error() {
            return Type::Error;
        }
        let Type::Function(sig) = &callee_ty else {
            let callee_span = self.module.arena.span(callee);
            let kind = TypeErrorKind::NotCallable {
                found: callee_ty.clone(),
            };
            self.error(kind, callee_span);
            return Type::Error;
        };
        if sig.params.len() != args.len() {
            self.error(
                TypeErrorKind::Arity {
                    expected: sig.params.len(),
                    found: args.len(),
                },
                span,
            );
            return (*sig.ret).clone();
        }
        for ((arg, found), expected) in args.iter().zip(&arg_types).zip(&sig.params) {
            self.expect_assignable(*arg, found, expected);
        }
        (*sig.ret).clone()
    }

    /// `write`/`writeln` take any primitive or record; `len` takes arrays
    /// and strings.
    fn check_builtin_call(
        &mut self,
        builtin: Builtin,
        args: &[ExprId],
        arg_types: &[Type],
        span: Span,
    ) -> Type {
        let (min, ret) = match builtin {
            Builtin::WriteLn => (0, Type::Void),
            Builtin::Len => (1, Type::INT),
            _ => (1, Type::Void),
        };
        if args.len() < min || args.len() > 1 {
            self.error(
                TypeErrorKind::Arity {
                    expected: 1,
                    found: args.len(),
                },
                span,
            );
            return ret;
        }
        for (arg, ty) in args.iter().zip(arg_types) {
            if ty.contains_error() {
                continue;
            }
            let (accepted, expected) = match builtin {
                Builtin::Len => (
                    matches!(ty, Type::Array(_)) || *ty == Type::STR,
                    Expected::Sized,
                ),
                _ => (
                    ty.is_primitive() || matches!(ty, Type::Record(_)),
                    Expected::Printable,
                ),
            };
            if !accepted {
                let arg_span = self.module.arena.span(*arg);
                self.mismatch(expected, ty.clone(), arg_span);
            }
        }
        ret
    }

    fn check_index(&mut self, array: ExprId, index: ExprId) -> Type {
        let array_ty = self.check_expr(array);
        self.expect_exact(index, &Type::INT);
        match array_ty {
            Type::Array(elem) => *elem,
            Type::Error => Type::Error,
            other => {
                let span = self.module.arena.span(array);
                self.mismatch(Expected::Array, other, span);
                Type::Error
            }
        }
    }

    fn check_field(&mut self, base: ExprId, field: Name, field_span: Span) -> Type {
        let base_ty = self.check_expr(base);
        if base_ty.is_error() {
            return Type::Error;
        }
        if !matches!(base_ty, Type::Record(_)) {
            let span = self.module.arena.span(base);
            self.mismatch(Expected::Record, base_ty, span);
            return Type::Error;
        }
        // Undeclared record types were already reported by the resolver.
        let Some(record) = self.module.record(&base_ty) else {
            return Type::Error;
        };
        if let Some((_, decl)) = record.field(field) {
            return decl.ty.clone();
        }
        let wanted = self.interner.lookup(field);
        let suggestion = record
            .fields
            .iter()
            .map(|f| self.interner.lookup(f.name))
            .map(|name| (name, edit_distance(wanted, name)))
            .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name.to_string());
        let kind = TypeErrorKind::UnknownField {
            record: base_ty.to_string(),
            field: wanted.to_string(),
            suggestion,
        };
        self.error(kind, field_span);
        Type::Error
    }

    fn check_assign(&mut self, target: ExprId, value: ExprId) -> Type {
        let res = self.res;
        let target_ty = self.check_place(target);
        let target_span = self.module.arena.span(target);
        let value_ty = self.check_expr(value);

        if let Some(symbol) = res.expr_symbol(target).map(|id| res.symbol(id)) {
            match symbol.kind {
                SymbolKind::Error => return Type::Error,
                SymbolKind::Function | SymbolKind::Builtin(_) | SymbolKind::Record => {
                    self.mismatch(Expected::Assignable, target_ty, target_span);
                    return Type::Error;
                }
                _ if symbol.is_const => {
                    let kind = TypeErrorKind::AssignToConstant {
                        name: self.interner.lookup(symbol.name).to_string(),
                        declared: symbol.span,
                    };
                    self.error(kind, target_span);
                    return Type::Error;
                }
                _ => {}
            }
        }

        if target_ty.contains_error() {
            return Type::Error;
        }
        if self.expect_assignable(value, &value_ty, &target_ty) {
            target_ty
        } else {
            Type::Error
        }
    }
}
