//! Expression parsing.
//!
//! Precedence, lowest first: assignment (right-associative), `||`, `&&`,
//! equality, relational, additive, multiplicative, unary, postfix.

use quill_diagnostic::ErrorCode;
use quill_ir::{BinaryOp, ExprId, ExprKind, Span, TokenKind, UnaryOp};
use quill_stack::ensure_sufficient_stack;

use crate::{ParseError, Parser};

/// `|i32::MIN|`, only reachable as the operand of a folded negation.
const I32_MIN_ABS: u64 = 2_147_483_648;

fn logic_or_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::PipePipe => Some(BinaryOp::Or),
        _ => None,
    }
}

fn logic_and_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::AmpAmp => Some(BinaryOp::And),
        _ => None,
    }
}

fn equality_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        _ => None,
    }
}

fn relational_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        _ => None,
    }
}

fn additive_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn multiplicative_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        _ => None,
    }
}

fn unary_op(kind: TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Bang => Some(UnaryOp::Not),
        _ => None,
    }
}

type Level<'a> = fn(&mut Parser<'a>) -> Result<ExprId, ParseError>;

impl<'a> Parser<'a> {
    /// Parse an expression.
    ///
    /// Runs under `ensure_sufficient_stack` so deeply nested input cannot
    /// overflow the native stack.
    pub(crate) fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_assignment())
    }

    fn parse_assignment(&mut self) -> Result<ExprId, ParseError> {
        let target = self.parse_logic_or()?;
        if !self.eat(TokenKind::Eq) {
            return Ok(target);
        }
        let value = self.parse_expr()?;
        let target_span = self.arena.span(target);
        let span = target_span.merge(self.arena.span(value));

        if matches!(
            self.arena.kind(target),
            ExprKind::Ident(_) | ExprKind::Index { .. } | ExprKind::Field { .. }
        ) {
            Ok(self.alloc(ExprKind::Assign { target, value }, span))
        } else {
            self.errors.push(ParseError::new(
                ErrorCode::E1002,
                "invalid assignment target",
                target_span,
            ));
            Ok(self.alloc(ExprKind::Error, span))
        }
    }

    /// One left-associative binary level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        next: Level<'a>,
        match_op: fn(TokenKind) -> Option<BinaryOp>,
    ) -> Result<ExprId, ParseError> {
        let mut left = next(self)?;
        while let Some(op) = match_op(self.current_kind()) {
            self.bump();
            let right = next(self)?;
            let span = self.arena.span(left).merge(self.arena.span(right));
            left = self.alloc(ExprKind::Binary { op, left, right }, span);
        }
        Ok(left)
    }

    fn parse_logic_or(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_logic_and, logic_or_op)
    }

    fn parse_logic_and(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_equality, logic_and_op)
    }

    fn parse_equality(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_relational, equality_op)
    }

    fn parse_relational(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_additive, relational_op)
    }

    fn parse_additive(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_multiplicative, additive_op)
    }

    fn parse_multiplicative(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_unary, multiplicative_op)
    }

    /// Parse unary operators.
    ///
    /// `-` directly followed by an integer literal folds into one literal,
    /// which is how `-2147483648` is written.
    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        let Some(op) = unary_op(self.current_kind()) else {
            return self.parse_postfix();
        };
        let start = self.bump().span;

        if op == UnaryOp::Neg {
            if let TokenKind::Int(n) = self.current_kind() {
                let span = start.merge(self.bump().span);
                let value = if n == I32_MIN_ABS {
                    Some(i32::MIN)
                } else {
                    i32::try_from(n).ok().map(|v| -v)
                };
                return Ok(self.int_literal(value, n, span, true));
            }
        }

        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        let span = start.merge(self.arena.span(operand));
        Ok(self.alloc(ExprKind::Unary { op, operand }, span))
    }

    /// `primary ( "(" args ")" | "[" index "]" | "." field )*`
    fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    let open = self.bump().span;
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let close = self.expect_closing(TokenKind::RParen, open)?.span;
                    let span = self.arena.span(expr).merge(close);
                    expr = self.alloc(ExprKind::Call { callee: expr, args }, span);
                }
                TokenKind::LBracket => {
                    let open = self.bump().span;
                    let index = self.parse_expr()?;
                    let close = self.expect_closing(TokenKind::RBracket, open)?.span;
                    let span = self.arena.span(expr).merge(close);
                    expr = self.alloc(ExprKind::Index { array: expr, index }, span);
                }
                TokenKind::Dot => {
                    self.bump();
                    let (field, field_span) = self.expect_ident("field name")?;
                    let span = self.arena.span(expr).merge(field_span);
                    let base = expr;
                    expr = self.alloc(
                        ExprKind::Field {
                            base,
                            field,
                            field_span,
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let span = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::Int(n) => {
                self.bump();
                return Ok(self.int_literal(i32::try_from(n).ok(), n, span, false));
            }
            TokenKind::Float(bits) => ExprKind::Float(bits),
            TokenKind::String(name) => ExprKind::Str(name),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_closing(TokenKind::RParen, span)?;
                return Ok(inner);
            }
            TokenKind::Array => return self.parse_new_array(),
            _ => return Err(self.unexpected("expression")),
        };
        self.bump();
        Ok(self.alloc(kind, span))
    }

    /// `array [len] of T`
    fn parse_new_array(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::Array)?.span;
        let open = self.expect(TokenKind::LBracket)?.span;
        let len = self.parse_expr()?;
        self.expect_closing(TokenKind::RBracket, open)?;
        self.expect(TokenKind::Of)?;
        let (elem, ty_span) = self.parse_type()?;
        Ok(self.alloc(ExprKind::NewArray { elem, len }, start.merge(ty_span)))
    }

    /// Allocate an `int` literal, or an error node if it does not fit.
    fn int_literal(&mut self, value: Option<i32>, raw: u64, span: Span, negated: bool) -> ExprId {
        if let Some(v) = value {
            return self.alloc(ExprKind::Int(v), span);
        }
        let sign = if negated { "-" } else { "" };
        self.errors.push(ParseError::new(
            ErrorCode::E1003,
            format!("integer literal `{sign}{raw}` is out of range for `int`"),
            span,
        ));
        self.alloc(ExprKind::Error, span)
    }
}
