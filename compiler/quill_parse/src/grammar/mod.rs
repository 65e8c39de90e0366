//! Grammar productions, split by syntactic category.
//!
//! - `mod.rs`: items (functions, globals, records) and types
//! - `stmt.rs`: blocks and statements
//! - `expr.rs`: the expression precedence chain

mod expr;
mod stmt;

use quill_ir::{Function, Item, Param, RecordDecl, RecordField, Span, TokenKind, Type};

use crate::recovery::{synchronize, ITEM_START};
use crate::{ParseError, Parser};

const ITEM_EXPECTED: &str = "`function`, `var`, `const` or `record`";

impl Parser<'_> {
    /// Parse items until end of input, recovering at item keywords.
    pub(crate) fn parse_items(&mut self) -> Vec<Item> {
        let mut items = Vec::new();
        if self.cursor.is_at_end() {
            // Nothing to compile; the module gets an error root.
            let err = self.unexpected(ITEM_EXPECTED);
            self.report(err);
        }
        while !self.cursor.is_at_end() {
            let start = self.cursor.position();
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    self.report(err);
                    synchronize(&mut self.cursor, ITEM_START);
                }
            }
            if self.cursor.position() == start {
                self.cursor.advance();
            }
        }
        items
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        match self.current_kind() {
            TokenKind::Function => self.parse_function().map(Item::Function),
            TokenKind::Var | TokenKind::Const => self.parse_var_decl().map(Item::Global),
            TokenKind::Record => self.parse_record().map(Item::Record),
            _ => Err(self.unexpected(ITEM_EXPECTED)),
        }
    }

    /// `record Name { field: T; ... }`
    fn parse_record(&mut self) -> Result<RecordDecl, ParseError> {
        let start = self.expect(TokenKind::Record)?.span;
        let (name, name_span) = self.expect_ident("record name")?;
        let binding = self.fresh_binding();
        let ty = Type::record(self.cursor.interner().lookup(name));

        let open = self.expect(TokenKind::LBrace)?.span;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.cursor.is_at_end() {
            let (field_name, field_span) = self.expect_ident("field name")?;
            self.expect(TokenKind::Colon)?;
            let (field_ty, ty_span) = self.parse_type()?;
            self.expect(TokenKind::Semicolon)?;
            fields.push(RecordField {
                name: field_name,
                name_span: field_span,
                ty: field_ty,
                ty_span,
            });
        }
        let close = self.expect_closing(TokenKind::RBrace, open)?.span;

        Ok(RecordDecl {
            binding,
            name,
            name_span,
            ty,
            fields,
            span: start.merge(close),
        })
    }

    /// `function name(a: T, ...) [: R] { ... }`
    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let start = self.expect(TokenKind::Function)?.span;
        let (name, name_span) = self.expect_ident("function name")?;
        let binding = self.fresh_binding();

        let open = self.expect(TokenKind::LParen)?.span;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let (param_name, param_span) = self.expect_ident("parameter name")?;
                self.expect(TokenKind::Colon)?;
                let (ty, ty_span) = self.parse_type()?;
                params.push(Param {
                    binding: self.fresh_binding(),
                    name: param_name,
                    ty,
                    span: param_span.merge(ty_span),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_closing(TokenKind::RParen, open)?;

        let (ret, ret_span) = if self.eat(TokenKind::Colon) {
            self.parse_type()?
        } else {
            (Type::Void, name_span)
        };
        let body = self.parse_block()?;

        Ok(Function {
            binding,
            name,
            name_span,
            params,
            ret,
            ret_span,
            span: start.merge(body.span),
            body,
        })
    }

    /// `int`, `float[]`, `Point[][]`, ...
    ///
    /// Any identifier parses as a record type; the resolver checks that a
    /// record of that name exists.
    pub(crate) fn parse_type(&mut self) -> Result<(Type, Span), ParseError> {
        let mut ty = match self.current_kind() {
            TokenKind::IntType => Type::INT,
            TokenKind::FloatType => Type::FLOAT,
            TokenKind::BoolType => Type::BOOL,
            TokenKind::StringType => Type::STR,
            TokenKind::VoidType => Type::Void,
            TokenKind::Ident(name) => Type::record(self.cursor.interner().lookup(name)),
            _ => return Err(self.unexpected("type")),
        };
        let mut span = self.bump().span;
        while self.check(TokenKind::LBracket) && self.cursor.peek_kind_at(1) == TokenKind::RBracket
        {
            self.bump();
            span = span.merge(self.bump().span);
            ty = Type::array_of(ty);
        }
        Ok((ty, span))
    }
}
