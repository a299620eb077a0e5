use crate::error::ParseError;

/// A byte offset within the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BytePos(pub u32);

/// A half-open `[start, end)` byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: BytePos,
    pub end: BytePos,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: BytePos(start),
            end: BytePos(end),
        }
    }

    /// Creates a zero-length span at position `pos` (for synthetic nodes).
    pub fn at(pos: u32) -> Self {
        Self::new(pos, pos)
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Case,
    Class,
    Data,
    Default,
    Deriving,
    Do,
    Else,
    Foreign,
    If,
    Import,
    In,
    Infix,
    Infixl,
    Infixr,
    Instance,
    Let,
    Module,
    Newtype,
    Of,
    Then,
    Type,
    Where,

    // Identifiers and literals
    /// Lower-case identifier (also `_`).
    VarId(String),
    /// Upper-case identifier: constructors, types, module names.
    ConId(String),
    IntLit(i64),
    StringLit(String),
    /// Any non-reserved symbolic operator, including `-`.
    Op(String),

    // Reserved operators
    Equals,      // =
    Backslash,   // \
    Pipe,        // |
    Arrow,       // ->
    LArrow,      // <-
    DoubleColon, // ::
    FatArrow,    // =>
    DotDot,      // ..
    At,          // @
    Tilde,       // ~

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Comma,    // ,
    Semi,     // ;
    Backtick, // `

    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Case => write!(f, "case"),
            Token::Class => write!(f, "class"),
            Token::Data => write!(f, "data"),
            Token::Default => write!(f, "default"),
            Token::Deriving => write!(f, "deriving"),
            Token::Do => write!(f, "do"),
            Token::Else => write!(f, "else"),
            Token::Foreign => write!(f, "foreign"),
            Token::If => write!(f, "if"),
            Token::Import => write!(f, "import"),
            Token::In => write!(f, "in"),
            Token::Infix => write!(f, "infix"),
            Token::Infixl => write!(f, "infixl"),
            Token::Infixr => write!(f, "infixr"),
            Token::Instance => write!(f, "instance"),
            Token::Let => write!(f, "let"),
            Token::Module => write!(f, "module"),
            Token::Newtype => write!(f, "newtype"),
            Token::Of => write!(f, "of"),
            Token::Then => write!(f, "then"),
            Token::Type => write!(f, "type"),
            Token::Where => write!(f, "where"),
            Token::VarId(s) | Token::ConId(s) | Token::Op(s) => write!(f, "{}", s),
            Token::IntLit(n) => write!(f, "{}", n),
            Token::StringLit(s) => write!(f, "{:?}", s),
            Token::Equals => write!(f, "="),
            Token::Backslash => write!(f, "\\"),
            Token::Pipe => write!(f, "|"),
            Token::Arrow => write!(f, "->"),
            Token::LArrow => write!(f, "<-"),
            Token::DoubleColon => write!(f, "::"),
            Token::FatArrow => write!(f, "=>"),
            Token::DotDot => write!(f, ".."),
            Token::At => write!(f, "@"),
            Token::Tilde => write!(f, "~"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Backtick => write!(f, "`"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

/// A value paired with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

fn is_symbol_char(c: char) -> bool {
    matches!(
        c,
        '!' | '#' | '$' | '%' | '&' | '*' | '+' | '.' | '/' | '<' | '=' | '>' | '?' | '@' | '\\'
            | '^' | '|' | '-' | '~' | ':'
    )
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn keyword(word: &str) -> Option<Token> {
    let tok = match word {
        "case" => Token::Case,
        "class" => Token::Class,
        "data" => Token::Data,
        "default" => Token::Default,
        "deriving" => Token::Deriving,
        "do" => Token::Do,
        "else" => Token::Else,
        "foreign" => Token::Foreign,
        "if" => Token::If,
        "import" => Token::Import,
        "in" => Token::In,
        "infix" => Token::Infix,
        "infixl" => Token::Infixl,
        "infixr" => Token::Infixr,
        "instance" => Token::Instance,
        "let" => Token::Let,
        "module" => Token::Module,
        "newtype" => Token::Newtype,
        "of" => Token::Of,
        "then" => Token::Then,
        "type" => Token::Type,
        "where" => Token::Where,
        _ => return None,
    };
    Some(tok)
}

fn reserved_op(sym: &str) -> Option<Token> {
    let tok = match sym {
        "=" => Token::Equals,
        "\\" => Token::Backslash,
        "|" => Token::Pipe,
        "->" => Token::Arrow,
        "<-" => Token::LArrow,
        "::" => Token::DoubleColon,
        "=>" => Token::FatArrow,
        ".." => Token::DotDot,
        "@" => Token::At,
        "~" => Token::Tilde,
        _ => return None,
    };
    Some(tok)
}

pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self { src, pos: 0 }
    }

    /// Tokenizes the full source and returns a flat `Vec` of spanned tokens,
    /// terminated by `Token::Eof`. Layout is not resolved here; see
    /// [`crate::parser::layout::resolve`].
    pub fn tokenize(&mut self) -> Result<Vec<Spanned<Token>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            if self.pos >= self.src.len() {
                let end = self.pos as u32;
                tokens.push(Spanned {
                    node: Token::Eof,
                    span: Span::at(end),
                });
                break;
            }
            let tok = self.next_token()?;
            tokens.push(tok);
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            while self.peek().map_or(false, char::is_whitespace) {
                self.bump();
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with("{-") {
                self.skip_block_comment()?;
            } else if self.at_line_comment() {
                while self.peek().map_or(false, |c| c != '\n') {
                    self.bump();
                }
            } else {
                return Ok(());
            }
        }
    }

    /// A run of two or more dashes starts a line comment unless it is part of
    /// a longer operator such as `-->`.
    fn at_line_comment(&self) -> bool {
        let rest = &self.src[self.pos..];
        if !rest.starts_with("--") {
            return false;
        }
        let dashes = rest.chars().take_while(|&c| c == '-').count();
        !rest[dashes..].chars().next().map_or(false, is_symbol_char)
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos as u32;
        let mut depth = 0usize;
        loop {
            let rest = &self.src[self.pos..];
            if rest.is_empty() {
                return Err(ParseError::UnterminatedComment { pos: start });
            }
            if rest.starts_with("{-") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("-}") {
                depth -= 1;
                self.pos += 2;
                if depth == 0 {
                    return Ok(());
                }
            } else {
                self.bump();
            }
        }
    }

    fn spanned(&self, node: Token, start: usize) -> Spanned<Token> {
        Spanned {
            node,
            span: Span::new(start as u32, self.pos as u32),
        }
    }

    fn next_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        let start = self.pos;
        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(self.spanned(Token::Eof, start)),
        };

        let punct = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semi),
            '`' => Some(Token::Backtick),
            _ => None,
        };
        if let Some(tok) = punct {
            self.bump();
            return Ok(self.spanned(tok, start));
        }

        if ch == '"' {
            return self.lex_string(start);
        }
        if ch == '\'' {
            return self.lex_char(start);
        }
        if ch.is_ascii_digit() {
            return self.lex_number(start);
        }
        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.lex_ident_or_keyword(start));
        }
        if is_symbol_char(ch) {
            while self.peek().map_or(false, is_symbol_char) {
                self.bump();
            }
            let sym = &self.src[start..self.pos];
            let tok = reserved_op(sym).unwrap_or_else(|| Token::Op(sym.to_owned()));
            return Ok(self.spanned(tok, start));
        }

        Err(ParseError::UnexpectedChar {
            ch,
            pos: start as u32,
        })
    }

    fn lex_escape(&mut self) -> Result<char, ParseError> {
        let pos = self.pos as u32;
        let c = match self.bump() {
            Some(c) => c,
            None => return Err(ParseError::UnterminatedString { pos }),
        };
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' if !self.peek().map_or(false, |d| d.is_ascii_digit()) => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            d if d.is_ascii_digit() => {
                let mut code = d.to_digit(10).unwrap_or(0);
                while let Some(next) = self.peek().and_then(|n| n.to_digit(10)) {
                    self.bump();
                    code = code.saturating_mul(10).saturating_add(next);
                }
                char::from_u32(code).ok_or(ParseError::InvalidEscape { ch: d, pos })?
            }
            other => return Err(ParseError::InvalidEscape { ch: other, pos }),
        };
        Ok(decoded)
    }

    fn lex_string(&mut self, start: usize) -> Result<Spanned<Token>, ParseError> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(ParseError::UnterminatedString { pos: start as u32 })
                }
                Some('"') => break,
                Some('\\') => s.push(self.lex_escape()?),
                Some(c) => s.push(c),
            }
        }
        Ok(self.spanned(Token::StringLit(s), start))
    }

    /// Character literals become one-character strings; the language has no
    /// separate character type.
    fn lex_char(&mut self, start: usize) -> Result<Spanned<Token>, ParseError> {
        self.bump();
        let c = match self.bump() {
            Some('\\') => self.lex_escape()?,
            Some(c) if c != '\'' && c != '\n' => c,
            _ => return Err(ParseError::UnterminatedString { pos: start as u32 }),
        };
        if self.bump() != Some('\'') {
            return Err(ParseError::UnterminatedString { pos: start as u32 });
        }
        Ok(self.spanned(Token::StringLit(c.to_string()), start))
    }

    fn lex_number(&mut self, start: usize) -> Result<Spanned<Token>, ParseError> {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        let value: i64 = text.parse().map_err(|_| ParseError::IntegerOverflow {
            text: text.to_owned(),
            span: Span::new(start as u32, self.pos as u32),
        })?;
        Ok(self.spanned(Token::IntLit(value), start))
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Spanned<Token> {
        while self.peek().map_or(false, is_ident_continue) {
            self.bump();
        }
        let word = &self.src[start..self.pos];
        let tok = keyword(word).unwrap_or_else(|| {
            if word.starts_with(|c: char| c.is_uppercase()) {
                Token::ConId(word.to_owned())
            } else {
                Token::VarId(word.to_owned())
            }
        });
        self.spanned(tok, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        Lexer::new(src)
            .tokenize()
            .expect("lex failed")
            .into_iter()
            .map(|t| t.node)
            .collect()
    }

    #[test]
    fn lexes_definition() {
        assert_eq!(
            kinds("f x = x * 2"),
            vec![
                Token::VarId("f".into()),
                Token::VarId("x".into()),
                Token::Equals,
                Token::VarId("x".into()),
                Token::Op("*".into()),
                Token::IntLit(2),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_and_nested_block_comments() {
        let toks = kinds("-- comment\n{- outer {- inner -} -} main");
        assert_eq!(toks, vec![Token::VarId("main".into()), Token::Eof]);
    }

    #[test]
    fn dash_operator_is_not_a_comment() {
        let toks = kinds("a --> b");
        assert_eq!(toks[1], Token::Op("-->".into()));
    }

    #[test]
    fn reserved_operators_and_keywords() {
        let toks = kinds("\\x -> let y = x in y :: Int");
        assert_eq!(toks[0], Token::Backslash);
        assert_eq!(toks[2], Token::Arrow);
        assert_eq!(toks[3], Token::Let);
        assert_eq!(toks[7], Token::In);
        assert_eq!(toks[9], Token::DoubleColon);
        assert_eq!(toks[10], Token::ConId("Int".into()));
    }

    #[test]
    fn string_escapes() {
        let toks = kinds(r#""a\n\"b\"\65""#);
        assert_eq!(toks[0], Token::StringLit("a\n\"b\"A".into()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("main = \"oops").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { pos: 7 }));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::IntegerOverflow { .. }));
    }

    #[test]
    fn primes_in_identifiers() {
        assert_eq!(kinds("go'")[0], Token::VarId("go'".into()));
    }
}
