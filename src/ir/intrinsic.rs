/// Runtime primitives the core IR can reference directly.
///
/// Each intrinsic has a fixed arity, the source names it is bound to in the
/// prelude scope, and the C runtime symbol implementing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intrinsic {
    Plus,
    Minus,
    Mult,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Negate,
    Show,
    PutStrLn,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 14] = [
        Intrinsic::Plus,
        Intrinsic::Minus,
        Intrinsic::Mult,
        Intrinsic::Div,
        Intrinsic::Mod,
        Intrinsic::Eq,
        Intrinsic::Neq,
        Intrinsic::Lt,
        Intrinsic::Lte,
        Intrinsic::Gt,
        Intrinsic::Gte,
        Intrinsic::Negate,
        Intrinsic::Show,
        Intrinsic::PutStrLn,
    ];

    /// Internal name, used by the core printer (`#plus`).
    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Plus => "plus",
            Intrinsic::Minus => "minus",
            Intrinsic::Mult => "mult",
            Intrinsic::Div => "div",
            Intrinsic::Mod => "mod",
            Intrinsic::Eq => "eq",
            Intrinsic::Neq => "neq",
            Intrinsic::Lt => "lt",
            Intrinsic::Lte => "lte",
            Intrinsic::Gt => "gt",
            Intrinsic::Gte => "gte",
            Intrinsic::Negate => "negate",
            Intrinsic::Show => "show",
            Intrinsic::PutStrLn => "putStrLn",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Intrinsic::Negate | Intrinsic::Show | Intrinsic::PutStrLn => 1,
            _ => 2,
        }
    }

    pub fn runtime_symbol(self) -> &'static str {
        match self {
            Intrinsic::Plus => "lz_plus",
            Intrinsic::Minus => "lz_minus",
            Intrinsic::Mult => "lz_mult",
            Intrinsic::Div => "lz_div",
            Intrinsic::Mod => "lz_mod",
            Intrinsic::Eq => "lz_eq",
            Intrinsic::Neq => "lz_neq",
            Intrinsic::Lt => "lz_lt",
            Intrinsic::Lte => "lz_lte",
            Intrinsic::Gt => "lz_gt",
            Intrinsic::Gte => "lz_gte",
            Intrinsic::Negate => "lz_negate",
            Intrinsic::Show => "lz_show",
            Intrinsic::PutStrLn => "lz_put_str_ln",
        }
    }

    /// Source-level names bound to this intrinsic in the prelude scope.
    pub fn source_names(self) -> &'static [&'static str] {
        match self {
            Intrinsic::Plus => &["+"],
            Intrinsic::Minus => &["-"],
            Intrinsic::Mult => &["*"],
            Intrinsic::Div => &["/", "div"],
            Intrinsic::Mod => &["mod"],
            Intrinsic::Eq => &["=="],
            Intrinsic::Neq => &["/="],
            Intrinsic::Lt => &["<"],
            Intrinsic::Lte => &["<="],
            Intrinsic::Gt => &[">"],
            Intrinsic::Gte => &[">="],
            Intrinsic::Negate => &["negate"],
            Intrinsic::Show => &["show"],
            Intrinsic::PutStrLn => &["putStrLn"],
        }
    }

    /// Looks up the intrinsic a source name refers to.
    pub fn from_source_name(name: &str) -> Option<Intrinsic> {
        Intrinsic::ALL
            .iter()
            .copied()
            .find(|i| i.source_names().contains(&name))
    }

    pub fn from_name(name: &str) -> Option<Intrinsic> {
        Intrinsic::ALL.iter().copied().find(|i| i.name() == name)
    }
}

/// Operator symbols bound in the prelude scope. The other catalog operators
/// (`/`, `/=`, `<`, `>`) are only reachable through the operator fallback.
pub const PRELUDE_OPERATORS: [&str; 6] = ["+", "-", "*", "==", "<=", ">="];

/// True for names written with symbol characters (`+`, `>=`, ...).
pub fn is_operator_name(name: &str) -> bool {
    name.chars().next().map_or(false, |c| !c.is_alphanumeric() && c != '_')
}

impl std::fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
