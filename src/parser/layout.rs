//! Layout resolution: turns indentation into explicit `{ ; }` tokens.
//!
//! After `where`, `let`, `do` and `of`, a block is opened. If the next token
//! is `{` the block is explicit. Otherwise an implicit block opens at that
//! token's column. A token that starts a line at the block column inserts
//! `;`, and a token left of it closes the block. Implicit blocks are also
//! closed by `in` (for `let`), by the bracket or comma that ends an enclosing
//! group, and at end of input.

use crate::error::ParseError;
use crate::parser::lexer::{Span, Spanned, Token};

#[derive(Debug, Clone, Copy)]
enum Context {
    Implicit { column: u32, depth: usize, is_let: bool },
    Explicit,
}

/// Line and column (both 1-based) for a byte offset.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn position(&self, src: &str, byte: u32) -> (u32, u32) {
        let byte = (byte as usize).min(src.len());
        let line = match self.starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.starts[line];
        let column = src
            .get(line_start..byte)
            .map_or(0, |prefix| prefix.chars().count());
        (line as u32 + 1, column as u32 + 1)
    }
}

fn virtual_token(node: Token, at: Span) -> Spanned<Token> {
    Spanned {
        node,
        span: Span::at(at.start.0),
    }
}

fn opens_block(tok: &Token) -> bool {
    matches!(tok, Token::Where | Token::Let | Token::Do | Token::Of)
}

/// Inserts virtual braces and semicolons into a raw token stream.
pub fn resolve(src: &str, tokens: Vec<Spanned<Token>>) -> Result<Vec<Spanned<Token>>, ParseError> {
    let index = LineIndex::new(src);
    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut stack: Vec<Context> = Vec::new();
    let mut depth = 0usize;
    let mut prev_line = 0u32;

    // A module without a header is one implicit top-level block.
    let mut pending: Option<bool> = match tokens.first().map(|t| &t.node) {
        Some(Token::Module) | Some(Token::LBrace) => None,
        _ => Some(false),
    };

    for tok in tokens {
        if tok.node == Token::Eof {
            if pending.take().is_some() {
                out.push(virtual_token(Token::LBrace, tok.span));
                out.push(virtual_token(Token::RBrace, tok.span));
            }
            while let Some(ctx) = stack.pop() {
                match ctx {
                    Context::Implicit { .. } => out.push(virtual_token(Token::RBrace, tok.span)),
                    Context::Explicit => {
                        return Err(ParseError::UnexpectedEof {
                            context: "an explicit '{' block".into(),
                        })
                    }
                }
            }
            out.push(tok);
            break;
        }

        let (line, column) = index.position(src, tok.span.start.0);
        let first_on_line = line > prev_line;
        prev_line = line;

        let mut check_line_start = first_on_line;
        if let Some(is_let) = pending.take() {
            check_line_start = false;
            if tok.node == Token::LBrace {
                stack.push(Context::Explicit);
                out.push(tok);
                continue;
            }
            let enclosing = stack.iter().rev().find_map(|c| match c {
                Context::Implicit { column, .. } => Some(*column),
                Context::Explicit => None,
            });
            let nested_ok = match (stack.last(), enclosing) {
                (Some(Context::Explicit), _) | (_, None) => true,
                (_, Some(m)) => column > m,
            };
            out.push(virtual_token(Token::LBrace, tok.span));
            if nested_ok {
                stack.push(Context::Implicit { column, depth, is_let });
            } else {
                out.push(virtual_token(Token::RBrace, tok.span));
                check_line_start = true;
            }
        }

        if check_line_start {
            while let Some(Context::Implicit { column: m, .. }) = stack.last().copied() {
                if column < m {
                    out.push(virtual_token(Token::RBrace, tok.span));
                    stack.pop();
                } else {
                    if column == m {
                        out.push(virtual_token(Token::Semi, tok.span));
                    }
                    break;
                }
            }
        }

        match &tok.node {
            Token::In => {
                if let Some(Context::Implicit { is_let: true, .. }) = stack.last() {
                    out.push(virtual_token(Token::RBrace, tok.span));
                    stack.pop();
                }
            }
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket | Token::Comma => {
                // Implicit blocks opened inside the current bracket group end
                // at its closing bracket or separating comma.
                while let Some(Context::Implicit { depth: d, .. }) = stack.last().copied() {
                    if d == depth && depth > 0 {
                        out.push(virtual_token(Token::RBrace, tok.span));
                        stack.pop();
                    } else {
                        break;
                    }
                }
                if tok.node != Token::Comma {
                    depth = depth.saturating_sub(1);
                }
            }
            Token::LBrace => stack.push(Context::Explicit),
            Token::RBrace => {
                while let Some(ctx) = stack.pop() {
                    match ctx {
                        Context::Implicit { .. } => {
                            out.push(virtual_token(Token::RBrace, tok.span))
                        }
                        Context::Explicit => break,
                    }
                }
            }
            _ => {}
        }

        let opener = opens_block(&tok.node);
        let is_let = tok.node == Token::Let;
        out.push(tok);
        if opener {
            pending = Some(is_let);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn layout(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        resolve(src, tokens)
            .expect("layout failed")
            .iter()
            .map(|t| t.node.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn top_level_declarations_are_separated() {
        assert_eq!(
            layout("main = f 3\nf x = x"),
            "{ main = f 3 ; f x = x } <eof>"
        );
    }

    #[test]
    fn continuation_lines_do_not_split() {
        assert_eq!(layout("f x =\n  x + 1"), "{ f x = x + 1 } <eof>");
    }

    #[test]
    fn module_header_opens_block_after_where() {
        assert_eq!(
            layout("module Main where\nmain = 1"),
            "module Main where { main = 1 } <eof>"
        );
    }

    #[test]
    fn let_block_closed_by_in_on_same_line() {
        assert_eq!(
            layout("main = let y = 2 in y"),
            "{ main = let { y = 2 } in y } <eof>"
        );
    }

    #[test]
    fn let_block_with_multiple_bindings() {
        let src = "main = let y = 2\n           z = 3\n       in y + z";
        assert_eq!(
            layout(src),
            "{ main = let { y = 2 ; z = 3 } in y + z } <eof>"
        );
    }

    #[test]
    fn where_block_is_closed_by_dedent() {
        let src = "f x = y\n  where\n    y = x\nmain = f 1";
        assert_eq!(
            layout(src),
            "{ f x = y where { y = x } ; main = f 1 } <eof>"
        );
    }

    #[test]
    fn explicit_braces_pass_through() {
        assert_eq!(
            layout("main = let { a = 1; b = 2 } in a"),
            "{ main = let { a = 1 ; b = 2 } in a } <eof>"
        );
    }

    #[test]
    fn unclosed_explicit_brace_is_an_error() {
        let tokens = Lexer::new("main = let { a = 1").tokenize().expect("lex failed");
        let err = resolve("main = let { a = 1", tokens).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }
}
