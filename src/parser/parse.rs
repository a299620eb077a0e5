//! Handwritten recursive-descent parser for the lazy source language.
//!
//! The parser consumes the layout-resolved `&[Spanned<Token>]` (every block
//! delimited by braces and semicolons, virtual or not) and builds an
//! `AstModule`.
//!
//! Grammar (informal):
//! ```text
//! module   := ["module" CONID exports? "where"] block
//! block    := "{" (decl (";" decl)*)? "}"
//! decl     := VARID VARID* "=" expr ["where" block]
//!           | VARID ("," VARID)* "::" type          -- ignored
//!           | ("data" | "type" | "class" | ...) ... -- rejected by lowering
//! expr     := infix ["::" type]
//! infix    := prefix (OP infix)*                    -- Haskell fixities
//! prefix   := "-" infix(7) | exp10
//! exp10    := "\" VARID+ "->" expr
//!           | "let" block "in" expr
//!           | "if" expr "then" expr "else" expr
//!           | "case" expr "of" block | "do" block
//!           | fexp
//! fexp     := aexp aexp*
//! aexp     := VARID | CONID | INT | STRING | "(" OP ")" | "(" ")"
//!           | "(" expr ("," expr)* ")" | "[" (expr ("," expr)*)? "]"
//! ```

use crate::error::ParseError;
use crate::parser::ast::{AstDecl, AstExpr, AstLit, AstModule, Ident, UnsupportedDecl};
use crate::parser::lexer::{Span, Spanned, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
    None,
}

/// Precedence and associativity of a binary operator. Unknown operators get
/// the default `infixl 9`.
fn fixity(op: &str) -> (u8, Assoc) {
    match op {
        "." => (9, Assoc::Right),
        "*" | "/" | "div" | "mod" | "rem" | "quot" => (7, Assoc::Left),
        "+" | "-" => (6, Assoc::Left),
        "++" | ":" => (5, Assoc::Right),
        "==" | "/=" | "<" | "<=" | ">" | ">=" | "elem" | "notElem" => (4, Assoc::None),
        "&&" => (3, Assoc::Right),
        "||" => (2, Assoc::Right),
        ">>" | ">>=" => (1, Assoc::Left),
        "$" | "$!" | "seq" => (0, Assoc::Right),
        _ => (9, Assoc::Left),
    }
}

pub struct Parser<'t> {
    tokens: &'t [Spanned<Token>],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Spanned<Token>]) -> Self {
        Self { tokens, pos: 0 }
    }

    // -----------------------------------------------------------------------
    // Token stream helpers
    // -----------------------------------------------------------------------

    fn peek_tok(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = self.pos + offset;
        if idx < self.tokens.len() {
            &self.tokens[idx].node
        } else {
            &Token::Eof
        }
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(t) => t.span,
            None => Span::at(0),
        }
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            return self.current_span();
        }
        self.tokens[self.pos - 1].span
    }

    fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        match self.peek_tok() {
            Token::Eof => ParseError::UnexpectedEof {
                context: expected.into(),
            },
            tok => ParseError::UnexpectedToken {
                expected: expected.into(),
                found: tok.to_string(),
                span: self.current_span(),
            },
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, ParseError> {
        if self.peek_tok() == expected {
            Ok(self.advance())
        } else {
            Err(self.unexpected(format!("'{}'", expected)))
        }
    }

    fn expect_var(&mut self) -> Result<Ident, ParseError> {
        match self.peek_tok().clone() {
            Token::VarId(name) => {
                let span = self.advance();
                Ok(Ident { name, span })
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek_tok() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    // -----------------------------------------------------------------------
    // Top-level
    // -----------------------------------------------------------------------

    pub fn parse_module(&mut self) -> Result<AstModule, ParseError> {
        let start = self.current_span();
        let mut name = None;
        let mut exports = Vec::new();
        if self.eat(&Token::Module) {
            name = Some(self.parse_module_name()?);
            if self.peek_tok() == &Token::LParen {
                exports = self.parse_export_list()?;
            }
            self.expect(&Token::Where)?;
        }
        let decls = self.parse_decl_block()?;
        if self.peek_tok() != &Token::Eof {
            return Err(self.unexpected("end of input"));
        }
        Ok(AstModule {
            name,
            exports,
            decls,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_module_name(&mut self) -> Result<Ident, ParseError> {
        let (mut name, mut span) = match self.peek_tok().clone() {
            Token::ConId(n) => (n, self.advance()),
            _ => return Err(self.unexpected("module name")),
        };
        while self.peek_tok() == &Token::Op(".".into()) {
            if let Token::ConId(part) = self.peek_at(1).clone() {
                self.advance();
                span = span.merge(self.advance());
                name.push('.');
                name.push_str(&part);
            } else {
                break;
            }
        }
        Ok(Ident { name, span })
    }

    fn parse_export_list(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.expect(&Token::LParen)?;
        let mut exports = Vec::new();
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_tok().clone() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::VarId(n) | Token::ConId(n) if depth == 1 => {
                    exports.push(Ident::new(n, self.current_span()));
                }
                Token::Eof => return Err(self.unexpected("export list")),
                _ => {}
            }
            self.advance();
        }
        Ok(exports)
    }

    /// `{ decl ; decl ; ... }` with empty declarations allowed.
    fn parse_decl_block(&mut self) -> Result<Vec<AstDecl>, ParseError> {
        self.expect(&Token::LBrace)?;
        let mut decls = Vec::new();
        loop {
            while self.eat(&Token::Semi) {}
            if self.eat(&Token::RBrace) {
                break;
            }
            decls.push(self.parse_decl()?);
            match self.peek_tok() {
                Token::Semi => {}
                Token::RBrace => {}
                _ => return Err(self.unexpected("';' or end of block")),
            }
        }
        Ok(decls)
    }

    fn parse_decl(&mut self) -> Result<AstDecl, ParseError> {
        let unsupported = match self.peek_tok() {
            Token::Data => Some(UnsupportedDecl::Data),
            Token::Type => Some(UnsupportedDecl::Type),
            Token::Newtype => Some(UnsupportedDecl::Newtype),
            Token::Class => Some(UnsupportedDecl::Class),
            Token::Instance => Some(UnsupportedDecl::Instance),
            Token::Import => Some(UnsupportedDecl::Import),
            Token::Infix | Token::Infixl | Token::Infixr => Some(UnsupportedDecl::Fixity),
            Token::Default => Some(UnsupportedDecl::Default),
            Token::Foreign => Some(UnsupportedDecl::Foreign),
            _ => None,
        };
        if let Some(kind) = unsupported {
            let start = self.current_span();
            self.skip_to_decl_end();
            return Ok(AstDecl::Unsupported {
                kind,
                span: start.merge(self.prev_span()),
            });
        }

        match self.peek_tok() {
            Token::VarId(_) if matches!(self.peek_at(1), Token::DoubleColon | Token::Comma) => {
                self.parse_signature()
            }
            Token::VarId(_) => self.parse_binding(),
            _ => Err(self.unexpected("declaration")),
        }
    }

    /// Skips tokens up to (not including) the `;` or `}` that ends the
    /// current declaration, stepping over nested groups. An unmatched closing
    /// bracket also stops the skip and is left for the caller to report.
    fn skip_to_decl_end(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_tok() {
                Token::Eof => return,
                Token::Semi | Token::RBrace | Token::RParen | Token::RBracket if depth == 0 => {
                    return
                }
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_signature(&mut self) -> Result<AstDecl, ParseError> {
        let start = self.current_span();
        let mut names = vec![self.expect_var()?];
        while self.eat(&Token::Comma) {
            names.push(self.expect_var()?);
        }
        self.expect(&Token::DoubleColon)?;
        self.skip_to_decl_end();
        Ok(AstDecl::Signature {
            names,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_binding(&mut self) -> Result<AstDecl, ParseError> {
        let name = self.expect_var()?;
        let mut params = Vec::new();
        loop {
            match self.peek_tok() {
                Token::VarId(_) => params.push(self.expect_var()?),
                Token::Equals => break,
                Token::IntLit(_)
                | Token::StringLit(_)
                | Token::ConId(_)
                | Token::LParen
                | Token::LBracket
                | Token::Tilde
                | Token::At => {
                    return Err(ParseError::UnsupportedPattern {
                        span: self.current_span(),
                    })
                }
                _ => return Err(self.unexpected("'=' or a parameter name")),
            }
        }
        self.expect(&Token::Equals)?;
        let mut body = self.parse_expr()?;
        if self.eat(&Token::Where) {
            let where_start = self.prev_span();
            let decls = self.parse_decl_block()?;
            let span = where_start.merge(body.span()).merge(self.prev_span());
            body = AstExpr::Let {
                decls,
                body: Box::new(body),
                span,
            };
        }
        let span = name.span.merge(self.prev_span());
        if params.is_empty() {
            Ok(AstDecl::Value { name, body, span })
        } else {
            Ok(AstDecl::Function {
                name,
                params,
                body,
                span,
            })
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<AstExpr, ParseError> {
        let expr = self.parse_infix(0)?;
        if self.eat(&Token::DoubleColon) {
            self.skip_type_annotation();
        }
        Ok(expr)
    }

    fn skip_type_annotation(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_tok() {
                Token::Eof => return,
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace if depth == 0 => return,
                Token::RParen | Token::RBracket | Token::RBrace => depth -= 1,
                Token::Semi | Token::Comma | Token::Then | Token::Else | Token::Of | Token::In
                | Token::Where
                    if depth == 0 =>
                {
                    return
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// The operator at the cursor, if any: a symbolic operator or a
    /// backtick-quoted identifier. Returns the identifier and the number of
    /// tokens it spans.
    fn peek_operator(&self) -> Option<(Ident, usize)> {
        match self.peek_tok() {
            Token::Op(sym) => Some((Ident::new(sym.clone(), self.current_span()), 1)),
            Token::Backtick => match (self.peek_at(1), self.peek_at(2)) {
                (Token::VarId(name), Token::Backtick) => {
                    let span = self.tokens[self.pos + 1].span;
                    Some((Ident::new(name.clone(), span), 3))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_infix(&mut self, min_prec: u8) -> Result<AstExpr, ParseError> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some((op, width)) = self.peek_operator() else {
                break;
            };
            // `(e op)` is a left section; leave it for parse_aexp to report.
            if self.peek_at(width) == &Token::RParen {
                break;
            }
            let (prec, assoc) = fixity(&op.name);
            if prec < min_prec {
                break;
            }
            for _ in 0..width {
                self.advance();
            }
            let next_min = match assoc {
                Assoc::Right => prec,
                Assoc::Left | Assoc::None => prec + 1,
            };
            let rhs = self.parse_infix(next_min)?;
            let span = lhs.span().merge(rhs.span());
            lhs = AstExpr::BinOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
            if assoc == Assoc::None {
                if let Some((next, _)) = self.peek_operator() {
                    if fixity(&next.name) == (prec, Assoc::None) {
                        return Err(ParseError::NonAssociative {
                            op: next.name,
                            span: next.span,
                        });
                    }
                }
            }
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<AstExpr, ParseError> {
        if self.peek_tok() == &Token::Op("-".into()) {
            let start = self.advance();
            let operand = self.parse_infix(7)?;
            let span = start.merge(operand.span());
            return Ok(AstExpr::Neg {
                expr: Box::new(operand),
                span,
            });
        }
        self.parse_exp10()
    }

    fn parse_exp10(&mut self) -> Result<AstExpr, ParseError> {
        match self.peek_tok() {
            Token::Backslash => self.parse_lambda(),
            Token::Let => {
                let start = self.advance();
                let decls = self.parse_decl_block()?;
                self.expect(&Token::In)?;
                let body = self.parse_expr()?;
                let span = start.merge(body.span());
                Ok(AstExpr::Let {
                    decls,
                    body: Box::new(body),
                    span,
                })
            }
            Token::If => {
                let start = self.advance();
                let cond = self.parse_expr()?;
                self.skip_layout_semi_before(&Token::Then);
                self.expect(&Token::Then)?;
                let then_branch = self.parse_expr()?;
                self.skip_layout_semi_before(&Token::Else);
                self.expect(&Token::Else)?;
                let else_branch = self.parse_expr()?;
                let span = start.merge(else_branch.span());
                Ok(AstExpr::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                    span,
                })
            }
            Token::Case => {
                let start = self.advance();
                let scrutinee = self.parse_expr()?;
                self.expect(&Token::Of)?;
                self.skip_block()?;
                Ok(AstExpr::Case {
                    scrutinee: Box::new(scrutinee),
                    span: start.merge(self.prev_span()),
                })
            }
            Token::Do => {
                let start = self.advance();
                self.skip_block()?;
                Ok(AstExpr::Do {
                    span: start.merge(self.prev_span()),
                })
            }
            _ => self.parse_fexp(),
        }
    }

    /// `if c\n then a\n else b` inside a layout block puts a `;` before
    /// `then` and `else`.
    fn skip_layout_semi_before(&mut self, keyword: &Token) {
        if self.peek_tok() == &Token::Semi && self.peek_at(1) == keyword {
            self.advance();
        }
    }

    /// Skips a `{ ... }` block, balancing nested braces.
    fn skip_block(&mut self) -> Result<(), ParseError> {
        self.expect(&Token::LBrace)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_tok() {
                Token::LBrace => depth += 1,
                Token::RBrace => depth -= 1,
                Token::Eof => return Err(self.unexpected("block")),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    fn parse_lambda(&mut self) -> Result<AstExpr, ParseError> {
        let start = self.expect(&Token::Backslash)?;
        let mut params = Vec::new();
        loop {
            match self.peek_tok() {
                Token::VarId(_) => params.push(self.expect_var()?),
                Token::Arrow if !params.is_empty() => break,
                Token::IntLit(_)
                | Token::StringLit(_)
                | Token::ConId(_)
                | Token::LParen
                | Token::LBracket
                | Token::Tilde => {
                    return Err(ParseError::UnsupportedPattern {
                        span: self.current_span(),
                    })
                }
                _ => return Err(self.unexpected("lambda parameter")),
            }
        }
        self.expect(&Token::Arrow)?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span());
        Ok(AstExpr::Lambda {
            params,
            body: Box::new(body),
            span,
        })
    }

    fn starts_aexp(&self) -> bool {
        matches!(
            self.peek_tok(),
            Token::VarId(_)
                | Token::ConId(_)
                | Token::IntLit(_)
                | Token::StringLit(_)
                | Token::LParen
                | Token::LBracket
        )
    }

    fn parse_fexp(&mut self) -> Result<AstExpr, ParseError> {
        let mut func = self.parse_aexp()?;
        while self.starts_aexp() {
            let arg = self.parse_aexp()?;
            let span = func.span().merge(arg.span());
            func = AstExpr::App {
                func: Box::new(func),
                arg: Box::new(arg),
                span,
            };
        }
        Ok(func)
    }

    fn parse_aexp(&mut self) -> Result<AstExpr, ParseError> {
        match self.peek_tok().clone() {
            Token::VarId(name) => {
                let span = self.advance();
                Ok(AstExpr::Var(Ident { name, span }))
            }
            Token::ConId(name) => {
                let span = self.advance();
                Ok(AstExpr::Con(Ident { name, span }))
            }
            Token::IntLit(n) => {
                let span = self.advance();
                Ok(AstExpr::Lit {
                    value: AstLit::Int(n),
                    span,
                })
            }
            Token::StringLit(s) => {
                let span = self.advance();
                Ok(AstExpr::Lit {
                    value: AstLit::Str(s),
                    span,
                })
            }
            Token::LParen => self.parse_paren(),
            Token::LBracket => {
                let start = self.advance();
                let mut elems = Vec::new();
                if self.peek_tok() != &Token::RBracket {
                    elems.push(self.parse_expr()?);
                    while self.eat(&Token::Comma) {
                        elems.push(self.parse_expr()?);
                    }
                }
                let end = self.expect(&Token::RBracket)?;
                Ok(AstExpr::List {
                    elems,
                    span: start.merge(end),
                })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_paren(&mut self) -> Result<AstExpr, ParseError> {
        let start = self.expect(&Token::LParen)?;

        if self.peek_tok() == &Token::RParen {
            let end = self.advance();
            return Ok(AstExpr::Con(Ident::new("()", start.merge(end))));
        }

        // `(op)` names the operator; `(op e)` is a right section.
        if let Some((op, width)) = self.peek_operator() {
            if self.peek_at(width) == &Token::RParen {
                for _ in 0..width {
                    self.advance();
                }
                let end = self.advance();
                return Ok(AstExpr::Var(Ident::new(op.name, start.merge(end))));
            }
            if op.name != "-" {
                return Err(ParseError::UnsupportedSection {
                    op: op.name,
                    span: op.span,
                });
            }
        }

        let first = self.parse_expr()?;
        if let Some((op, _)) = self.peek_operator() {
            return Err(ParseError::UnsupportedSection {
                op: op.name,
                span: op.span,
            });
        }
        if self.peek_tok() == &Token::Comma {
            let mut elems = vec![first];
            while self.eat(&Token::Comma) {
                elems.push(self.parse_expr()?);
            }
            let end = self.expect(&Token::RParen)?;
            return Ok(AstExpr::Tuple {
                elems,
                span: start.merge(end),
            });
        }
        self.expect(&Token::RParen)?;
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{layout, Lexer};

    fn parse(src: &str) -> Result<AstModule, ParseError> {
        let tokens = Lexer::new(src).tokenize()?;
        let tokens = layout::resolve(src, tokens)?;
        Parser::new(&tokens).parse_module()
    }

    fn body_of(src: &str) -> AstExpr {
        let module = parse(src).expect("parse failed");
        match module.decls.into_iter().next() {
            Some(AstDecl::Value { body, .. }) | Some(AstDecl::Function { body, .. }) => body,
            other => panic!("expected a binding, got {:?}", other),
        }
    }

    /// Renders an expression fully parenthesized for shape assertions.
    fn shape(e: &AstExpr) -> String {
        match e {
            AstExpr::Var(id) | AstExpr::Con(id) => id.name.clone(),
            AstExpr::Lit { value: AstLit::Int(n), .. } => n.to_string(),
            AstExpr::Lit { value: AstLit::Str(s), .. } => format!("{:?}", s),
            AstExpr::BinOp { op, lhs, rhs, .. } => {
                format!("({} {} {})", shape(lhs), op.name, shape(rhs))
            }
            AstExpr::Neg { expr, .. } => format!("(neg {})", shape(expr)),
            AstExpr::App { func, arg, .. } => format!("({} {})", shape(func), shape(arg)),
            AstExpr::If { cond, then_branch, else_branch, .. } => format!(
                "(if {} {} {})",
                shape(cond),
                shape(then_branch),
                shape(else_branch)
            ),
            AstExpr::Let { decls, body, .. } => format!("(let[{}] {})", decls.len(), shape(body)),
            AstExpr::Lambda { params, body, .. } => {
                let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
                format!("(\\{} {})", names.join(" "), shape(body))
            }
            other => other.describe().to_owned(),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(shape(&body_of("main = 1 + 2 * 3")), "(1 + (2 * 3))");
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(shape(&body_of("main = 10 - 3 - 2")), "((10 - 3) - 2)");
    }

    #[test]
    fn application_binds_tighter_than_operators() {
        assert_eq!(shape(&body_of("main = f 3 * 2")), "((f 3) * 2)");
    }

    #[test]
    fn backtick_operators_use_their_fixity() {
        assert_eq!(shape(&body_of("main = a + b `div` c")), "(a + (b div c))");
    }

    #[test]
    fn dollar_is_right_associative_and_loosest() {
        assert_eq!(
            shape(&body_of("main = putStrLn $ show $ f 3")),
            "(putStrLn $ (show $ (f 3)))"
        );
    }

    #[test]
    fn comparison_cannot_be_chained() {
        let err = parse("main = a < b < c").unwrap_err();
        assert!(matches!(err, ParseError::NonAssociative { .. }));
    }

    #[test]
    fn prefix_negation() {
        assert_eq!(shape(&body_of("main = - 2 * x + 1")), "((neg (2 * x)) + 1)");
        assert_eq!(shape(&body_of("main = f (-3)")), "(f (neg 3))");
    }

    #[test]
    fn operator_in_parens_is_a_variable() {
        assert_eq!(shape(&body_of("main = (+) 1 2")), "((+ 1) 2)");
    }

    #[test]
    fn where_becomes_let() {
        let body = body_of("f x = y\n  where\n    y = x * 2\n    z = 1");
        assert_eq!(shape(&body), "(let[2] y)");
    }

    #[test]
    fn if_then_else_across_lines() {
        let src = "main = if c\n  then 1\n  else 2";
        assert_eq!(shape(&body_of(src)), "(if c 1 2)");
    }

    #[test]
    fn lambda_extends_to_the_right() {
        assert_eq!(shape(&body_of("main = \\x y -> x + y")), "(\\x y (x + y))");
    }

    #[test]
    fn signatures_are_kept_as_declarations() {
        let module = parse("f :: Int -> Int\nf x = x").expect("parse failed");
        assert!(matches!(module.decls[0], AstDecl::Signature { .. }));
        assert!(matches!(module.decls[1], AstDecl::Function { .. }));
    }

    #[test]
    fn data_declaration_is_recorded_as_unsupported() {
        let module = parse("data T = A | B\nmain = 1").expect("parse failed");
        assert!(matches!(
            module.decls[0],
            AstDecl::Unsupported { kind: UnsupportedDecl::Data, .. }
        ));
        assert_eq!(module.decls.len(), 2);
    }

    #[test]
    fn constructor_pattern_parameter_is_rejected() {
        let err = parse("f (Just x) = x").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedPattern { .. }));
    }

    #[test]
    fn module_header_with_exports() {
        let module = parse("module Main (main) where\nmain = 1").expect("parse failed");
        assert_eq!(module.name.map(|n| n.name), Some("Main".to_owned()));
        assert_eq!(module.exports.len(), 1);
    }

    #[test]
    fn case_and_tuples_are_parsed() {
        assert_eq!(shape(&body_of("main = case x of\n  y -> y")), "case expression");
        assert_eq!(shape(&body_of("main = (1, 2)")), "tuple");
        assert_eq!(shape(&body_of("main = ()")), "()");
    }

    #[test]
    fn stray_closer_in_skipped_declaration_is_reported() {
        let err = parse("f :: Int -> Int)\nf x = x\nmain = f 1").unwrap_err();
        assert!(
            matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == ")"),
            "{:?}",
            err
        );
        let err = parse("data T = A ]\nmain = 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }), "{:?}", err);
    }

    #[test]
    fn right_section_is_rejected() {
        let err = parse("main = (+ 1)").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedSection { .. }));
    }
}
