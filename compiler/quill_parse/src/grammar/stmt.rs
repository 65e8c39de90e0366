//! Blocks and statements.

use quill_ir::{Block, Stmt, StmtKind, TokenKind, VarDecl};
use quill_stack::ensure_sufficient_stack;

use crate::recovery::{synchronize, STMT_BOUNDARY};
use crate::{ParseError, Parser};

impl Parser<'_> {
    /// `{ stmt* }`
    ///
    /// Fails only when the opening brace is missing. A missing closing
    /// brace is reported at the next `function` keyword or end of input
    /// and the block ends there.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RBrace => {
                    let close = self.bump().span;
                    return Ok(Block {
                        stmts,
                        span: open.merge(close),
                    });
                }
                TokenKind::Eof | TokenKind::Function => {
                    let err = self
                        .unexpected(TokenKind::RBrace.display_name())
                        .with_context(open, "this block is never closed");
                    self.report(err);
                    return Ok(Block {
                        stmts,
                        span: self.span_from(open),
                    });
                }
                _ => {}
            }
            let start = self.cursor.position();
            stmts.push(self.parse_stmt_recovering());
            if self.cursor.position() == start {
                self.cursor.advance();
            }
        }
    }

    /// Parse one statement; on error, report, skip to a statement boundary
    /// and return an error statement.
    fn parse_stmt_recovering(&mut self) -> Stmt {
        let start = self.current_span();
        match ensure_sufficient_stack(|| self.parse_stmt()) {
            Ok(stmt) => stmt,
            Err(err) => {
                self.report(err);
                synchronize(&mut self.cursor, STMT_BOUNDARY);
                self.cursor.eat(TokenKind::Semicolon);
                Stmt::new(StmtKind::Error, self.span_from(start))
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::Var | TokenKind::Const => StmtKind::Var(self.parse_var_decl()?),
            TokenKind::If => return self.parse_if(),
            TokenKind::While => {
                self.bump();
                let open = self.expect(TokenKind::LParen)?.span;
                let cond = self.parse_expr()?;
                self.expect_closing(TokenKind::RParen, open)?;
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => {
                self.bump();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Return(value)
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    /// `var name: T [= init];` or `const name: T = init;`
    pub(crate) fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let start = self.current_span();
        let is_const = self.check(TokenKind::Const);
        self.bump();

        let (name, name_span) = self.expect_ident("variable name")?;
        let binding = self.fresh_binding();
        self.expect(TokenKind::Colon)?;
        let (ty, ty_span) = self.parse_type()?;

        let init = if is_const {
            self.expect(TokenKind::Eq)?;
            Some(self.parse_expr()?)
        } else if self.eat(TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(VarDecl {
            binding,
            name,
            name_span,
            ty,
            ty_span,
            init,
            is_const,
            span: self.span_from(start),
        })
    }

    /// `if (cond) { ... } [else { ... } | else if ...]`
    ///
    /// `else if` becomes an else block holding a single `If` statement.
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        let open = self.expect(TokenKind::LParen)?.span;
        let cond = self.parse_expr()?;
        self.expect_closing(TokenKind::RParen, open)?;
        let then_block = self.parse_block()?;

        let else_block = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                let nested = ensure_sufficient_stack(|| self.parse_if())?;
                Some(Block {
                    span: nested.span,
                    stmts: vec![nested],
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            self.span_from(start),
        ))
    }

    /// `for (i, start, end, step) { ... }`
    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(TokenKind::For)?;
        let open = self.expect(TokenKind::LParen)?.span;
        let (name, name_span) = self.expect_ident("loop variable")?;
        let var = self.alloc(quill_ir::ExprKind::Ident(name), name_span);
        self.expect(TokenKind::Comma)?;
        let start = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let end = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let step = self.parse_expr()?;
        self.expect_closing(TokenKind::RParen, open)?;
        let body = self.parse_block()?;
        Ok(StmtKind::For {
            var,
            start,
            end,
            step,
            body,
        })
    }
}
