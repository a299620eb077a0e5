use crate::parser::lexer::Span;

/// An identifier with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A parsed module: optional header plus a block of declarations.
#[derive(Debug, Clone)]
pub struct AstModule {
    pub name: Option<Ident>,
    pub exports: Vec<Ident>,
    pub decls: Vec<AstDecl>,
    pub span: Span,
}

/// Declaration kinds the parser recognizes but the compiler does not lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedDecl {
    Data,
    Type,
    Newtype,
    Class,
    Instance,
    Import,
    Fixity,
    Default,
    Foreign,
}

impl std::fmt::Display for UnsupportedDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self {
            UnsupportedDecl::Data => "data declaration",
            UnsupportedDecl::Type => "type synonym",
            UnsupportedDecl::Newtype => "newtype declaration",
            UnsupportedDecl::Class => "class declaration",
            UnsupportedDecl::Instance => "instance declaration",
            UnsupportedDecl::Import => "import",
            UnsupportedDecl::Fixity => "fixity declaration",
            UnsupportedDecl::Default => "default declaration",
            UnsupportedDecl::Foreign => "foreign declaration",
        };
        f.write_str(what)
    }
}

#[derive(Debug, Clone)]
pub enum AstDecl {
    /// `name p1 .. pn = body`, n >= 1.
    Function {
        name: Ident,
        params: Vec<Ident>,
        body: AstExpr,
        span: Span,
    },
    /// `name = body`.
    Value {
        name: Ident,
        body: AstExpr,
        span: Span,
    },
    /// `name1, name2 :: type`. Parsed and ignored.
    Signature { names: Vec<Ident>, span: Span },
    Unsupported { kind: UnsupportedDecl, span: Span },
}

impl AstDecl {
    pub fn span(&self) -> Span {
        match self {
            AstDecl::Function { span, .. }
            | AstDecl::Value { span, .. }
            | AstDecl::Signature { span, .. }
            | AstDecl::Unsupported { span, .. } => *span,
        }
    }

    /// The name bound by this declaration, if it binds one.
    pub fn bound_name(&self) -> Option<&Ident> {
        match self {
            AstDecl::Function { name, .. } | AstDecl::Value { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstLit {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone)]
pub enum AstExpr {
    Var(Ident),
    /// Constructor reference; `()` is the constructor named `()`.
    Con(Ident),
    Lit {
        value: AstLit,
        span: Span,
    },
    BinOp {
        op: Ident,
        lhs: Box<AstExpr>,
        rhs: Box<AstExpr>,
        span: Span,
    },
    /// Prefix `-e`.
    Neg {
        expr: Box<AstExpr>,
        span: Span,
    },
    App {
        func: Box<AstExpr>,
        arg: Box<AstExpr>,
        span: Span,
    },
    If {
        cond: Box<AstExpr>,
        then_branch: Box<AstExpr>,
        else_branch: Box<AstExpr>,
        span: Span,
    },
    Let {
        decls: Vec<AstDecl>,
        body: Box<AstExpr>,
        span: Span,
    },
    Lambda {
        params: Vec<Ident>,
        body: Box<AstExpr>,
        span: Span,
    },

    // Parsed so that they can be reported precisely; never lowered.
    Case {
        scrutinee: Box<AstExpr>,
        span: Span,
    },
    Do {
        span: Span,
    },
    Tuple {
        elems: Vec<AstExpr>,
        span: Span,
    },
    List {
        elems: Vec<AstExpr>,
        span: Span,
    },
}

impl AstExpr {
    pub fn span(&self) -> Span {
        match self {
            AstExpr::Var(id) | AstExpr::Con(id) => id.span,
            AstExpr::Lit { span, .. }
            | AstExpr::BinOp { span, .. }
            | AstExpr::Neg { span, .. }
            | AstExpr::App { span, .. }
            | AstExpr::If { span, .. }
            | AstExpr::Let { span, .. }
            | AstExpr::Lambda { span, .. }
            | AstExpr::Case { span, .. }
            | AstExpr::Do { span }
            | AstExpr::Tuple { span, .. }
            | AstExpr::List { span, .. } => *span,
        }
    }

    /// Human-readable name of the construct, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            AstExpr::Var(_) => "variable",
            AstExpr::Con(_) => "constructor",
            AstExpr::Lit { .. } => "literal",
            AstExpr::BinOp { .. } => "operator application",
            AstExpr::Neg { .. } => "negation",
            AstExpr::App { .. } => "application",
            AstExpr::If { .. } => "conditional",
            AstExpr::Let { .. } => "let expression",
            AstExpr::Lambda { .. } => "lambda",
            AstExpr::Case { .. } => "case expression",
            AstExpr::Do { .. } => "do block",
            AstExpr::Tuple { .. } => "tuple",
            AstExpr::List { .. } => "list literal",
        }
    }
}
