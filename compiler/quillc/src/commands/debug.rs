//! Debug commands: `lex` and `parse` for inspecting the front end.

use std::path::Path;

use quill_diagnostic::emitter::ColorMode;
use quill_ir::{Block, ExprId, ExprKind, Item, Module, StmtKind, StringInterner, VarDecl};

use super::{read_source, report, DriverError, Outcome};
use crate::CompileOutput;

/// Print the token stream of a file.
pub fn lex_file(path: &Path, color: ColorMode) -> Result<Outcome, DriverError> {
    let unit = read_source(path)?;
    let interner = StringInterner::new();
    let lexed = quill_lexer::lex(&unit.text, &interner);

    println!("Tokens for '{}' ({} tokens):", unit.name, lexed.tokens.len());
    for tok in lexed.tokens.iter() {
        println!("  {:?} @ {}  {:?}", tok.kind, tok.span, tok.lexeme(&unit.text));
    }

    let output = CompileOutput {
        artifact: None,
        diagnostics: lexed.errors.iter().map(|e| e.to_diagnostic()).collect(),
    };
    report(&unit, &output, color);
    Ok(Outcome::from_errors(output.has_errors()))
}

/// Parse a file and print its syntax tree.
pub fn parse_file(path: &Path, color: ColorMode) -> Result<Outcome, DriverError> {
    let unit = read_source(path)?;
    let interner = StringInterner::new();
    let lexed = quill_lexer::lex(&unit.text, &interner);
    let parsed = quill_parse::parse(&lexed.tokens, &interner);
    let module = &parsed.module;

    println!("Parse result for '{}':", unit.name);
    if module.is_error_root() {
        println!("  Root: <error>");
    }
    println!("  Items: {}", module.items().len());
    println!("  Expressions: {}", module.arena.len());
    println!("  Errors: {}", lexed.errors.len() + parsed.errors.len());

    if !module.items().is_empty() {
        println!();
        print!("{}", dump_module(module, &interner));
    }

    let diagnostics = lexed
        .errors
        .iter()
        .map(|e| e.to_diagnostic())
        .chain(parsed.errors.iter().map(|e| e.to_diagnostic()))
        .collect();
    let output = CompileOutput {
        artifact: None,
        diagnostics,
    };
    report(&unit, &output, color);
    Ok(Outcome::from_errors(output.has_errors()))
}

/// Indented tree of every item, statement and expression in `module`.
///
/// Expressions are printed on one line, fully parenthesized.
pub fn dump_module(module: &Module, interner: &StringInterner) -> String {
    let mut dumper = Dumper {
        module,
        interner,
        out: String::new(),
    };
    for item in module.items() {
        match item {
            Item::Function(func) => {
                let params: Vec<_> = func
                    .params
                    .iter()
                    .map(|p| format!("{}: {}", interner.lookup(p.name), p.ty))
                    .collect();
                dumper.line(
                    0,
                    &format!(
                        "function {}({}): {} @ {}",
                        interner.lookup(func.name),
                        params.join(", "),
                        func.ret,
                        func.span
                    ),
                );
                dumper.block(&func.body, 1);
            }
            Item::Global(decl) => dumper.var_decl(decl, 0),
            Item::Record(record) => {
                dumper.line(
                    0,
                    &format!("record {} @ {}", interner.lookup(record.name), record.span),
                );
                for field in &record.fields {
                    dumper.line(1, &format!("{}: {}", interner.lookup(field.name), field.ty));
                }
            }
        }
    }
    dumper.out
}

struct Dumper<'a> {
    module: &'a Module,
    interner: &'a StringInterner,
    out: String,
}

impl Dumper<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn var_decl(&mut self, decl: &VarDecl, depth: usize) {
        let keyword = if decl.is_const { "const" } else { "var" };
        let mut text = format!("{keyword} {}: {}", self.interner.lookup(decl.name), decl.ty);
        if let Some(init) = decl.init {
            text.push_str(" = ");
            text.push_str(&self.expr(init));
        }
        self.line(depth, &text);
    }

    fn block(&mut self, block: &Block, depth: usize) {
        for stmt in &block.stmts {
            match &stmt.kind {
                StmtKind::Var(decl) => self.var_decl(decl, depth),
                StmtKind::Expr(expr) => {
                    let text = self.expr(*expr);
                    self.line(depth, &text);
                }
                StmtKind::If {
                    cond,
                    then_block,
                    else_block,
                } => {
                    let text = format!("if {}", self.expr(*cond));
                    self.line(depth, &text);
                    self.block(then_block, depth + 1);
                    if let Some(else_block) = else_block {
                        self.line(depth, "else");
                        self.block(else_block, depth + 1);
                    }
                }
                StmtKind::While { cond, body } => {
                    let text = format!("while {}", self.expr(*cond));
                    self.line(depth, &text);
                    self.block(body, depth + 1);
                }
                StmtKind::For {
                    var,
                    start,
                    end,
                    step,
                    body,
                } => {
                    let text = format!(
                        "for {} in {}..{} step {}",
                        self.expr(*var),
                        self.expr(*start),
                        self.expr(*end),
                        self.expr(*step)
                    );
                    self.line(depth, &text);
                    self.block(body, depth + 1);
                }
                StmtKind::Return(None) => self.line(depth, "return"),
                StmtKind::Return(Some(value)) => {
                    let text = format!("return {}", self.expr(*value));
                    self.line(depth, &text);
                }
                StmtKind::Block(inner) => {
                    self.line(depth, "block");
                    self.block(inner, depth + 1);
                }
                StmtKind::Error => self.line(depth, "<error>"),
            }
        }
    }

    fn expr(&self, id: ExprId) -> String {
        match self.module.arena.kind(id) {
            ExprKind::Int(v) => v.to_string(),
            ExprKind::Float(bits) => format!("{:?}", f64::from_bits(*bits)),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Str(text) => format!("{:?}", self.interner.lookup(*text)),
            ExprKind::Ident(name) => self.interner.lookup(*name).to_string(),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", self.expr(*left), op.as_symbol(), self.expr(*right))
            }
            ExprKind::Unary { op, operand } => format!("({}{})", op.as_symbol(), self.expr(*operand)),
            ExprKind::Call { callee, args } => {
                let args: Vec<_> = args.iter().map(|a| self.expr(*a)).collect();
                format!("{}({})", self.expr(*callee), args.join(", "))
            }
            ExprKind::Index { array, index } => {
                format!("{}[{}]", self.expr(*array), self.expr(*index))
            }
            ExprKind::Field { base, field, .. } => {
                format!("{}.{}", self.expr(*base), self.interner.lookup(*field))
            }
            ExprKind::NewArray { elem, len } => format!("array [{}] of {elem}", self.expr(*len)),
            ExprKind::Assign { target, value } => {
                format!("({} = {})", self.expr(*target), self.expr(*value))
            }
            ExprKind::Error => "<error>".to_owned(),
        }
    }
}
