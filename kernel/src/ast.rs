use std::fmt;
use std::sync::Arc;

// =============================================================================
// Naming scheme
// =============================================================================

/// Parse a signed index, accepting only its canonical decimal rendering.
///
/// `"007"`, `"+7"` and `"-0"` are rejected so that every accepted suffix
/// renders back to exactly the same text.
fn parse_index(text: &str) -> Option<i64> {
    let index: i64 = text.parse().ok()?;
    (index.to_string() == text).then_some(index)
}

fn parse_natural(text: &str) -> Option<u64> {
    let value: u64 = text.parse().ok()?;
    (value.to_string() == text).then_some(value)
}

/// A globally declared identifier.
///
/// Constants whose id is the canonical decimal rendering of a non-negative
/// integer are natural numbers; they carry the integer and are resolved
/// against the signature's natural-number family instead of by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    id: Arc<str>,
    natural: Option<u64>,
}

impl Constant {
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref();
        Constant {
            id: Arc::from(id),
            natural: parse_natural(id),
        }
    }

    pub fn natural(value: u64) -> Self {
        Constant {
            id: Arc::from(value.to_string()),
            natural: Some(value),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn natural_value(&self) -> Option<u64> {
        self.natural
    }

    pub fn is_natural_number(&self) -> bool {
        self.natural.is_some()
    }
}

/// A local identifier.
///
/// Plain variables carry a user name. Generated variables carry a `(base, index)`
/// pair and render as `$base_index`; indexed variables are generated variables
/// with an empty base (`$_index`). The id and the structure determine each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    id: Arc<str>,
    base: Arc<str>,
    index: Option<i64>,
}

impl Variable {
    /// Same as [`Variable::parse`].
    pub fn new(id: impl AsRef<str>) -> Self {
        Self::parse(id.as_ref())
    }

    /// Returns the richest variant consistent with `id`. Never fails: ids that
    /// only look like the generated encoding degrade to plain variables.
    pub fn parse(id: &str) -> Self {
        if let Some((base, index)) = id
            .strip_prefix('$')
            .and_then(|rest| rest.rsplit_once('_'))
        {
            if let Some(index) = parse_index(index) {
                return Self::generated(base, index);
            }
        }
        Variable {
            id: Arc::from(id),
            base: Arc::from(id),
            index: None,
        }
    }

    pub fn generated(base: impl AsRef<str>, index: i64) -> Self {
        let base = base.as_ref();
        Variable {
            id: Arc::from(format!("${}_{}", base, index)),
            base: Arc::from(base),
            index: Some(index),
        }
    }

    pub fn indexed(index: i64) -> Self {
        Self::generated("", index)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name fresh variants of this variable are generated from. For a plain
    /// variable this is its id.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn index(&self) -> Option<i64> {
        self.index
    }

    pub fn is_generated(&self) -> bool {
        self.index.is_some()
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some() && self.base.is_empty()
    }
}

/// A placeholder for a subterm that has not been constructed yet.
/// Indexed meta-variables use the id pattern `m_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaVariable {
    id: Arc<str>,
    index: Option<i64>,
}

impl MetaVariable {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self::parse(id.as_ref())
    }

    pub fn parse(id: &str) -> Self {
        let index = id.strip_prefix("m_").and_then(parse_index);
        MetaVariable {
            id: Arc::from(id),
            index,
        }
    }

    pub fn indexed(index: i64) -> Self {
        MetaVariable {
            id: Arc::from(format!("m_{}", index)),
            index: Some(index),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> Option<i64> {
        self.index
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }
}

// =============================================================================
// Terms and sorts
// =============================================================================

/// Terms of the Lambda-Pi calculus with named variables.
///
/// `Lambda` and `Pi` bind their variable in the scope only, never in the type.
/// The derived equality is syntactic: no renaming, and identifiers of
/// different kinds never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ast {
    /// The sort of all families; itself of sort `Kind`.
    TypeKind,
    Constant(Constant),
    Variable(Variable),
    MetaVariable(MetaVariable),
    /// Application: (head argument)
    Application(Arc<Ast>, Arc<Ast>),
    /// Lambda abstraction: \bound : type. scope
    Lambda(Variable, Arc<Ast>, Arc<Ast>),
    /// Dependent product: (bound : type) -> scope
    Pi(Variable, Arc<Ast>, Arc<Ast>),
}

// Helper constructors for convenience
impl Ast {
    pub fn type_kind() -> Arc<Self> {
        Arc::new(Ast::TypeKind)
    }

    pub fn constant(id: impl AsRef<str>) -> Arc<Self> {
        Arc::new(Ast::Constant(Constant::new(id)))
    }

    pub fn natural_number(value: u64) -> Arc<Self> {
        Arc::new(Ast::Constant(Constant::natural(value)))
    }

    pub fn variable(id: impl AsRef<str>) -> Arc<Self> {
        Arc::new(Ast::Variable(Variable::new(id)))
    }

    pub fn var(variable: Variable) -> Arc<Self> {
        Arc::new(Ast::Variable(variable))
    }

    pub fn meta_variable(id: impl AsRef<str>) -> Arc<Self> {
        Arc::new(Ast::MetaVariable(MetaVariable::new(id)))
    }

    pub fn meta(meta: MetaVariable) -> Arc<Self> {
        Arc::new(Ast::MetaVariable(meta))
    }

    pub fn app(head: Arc<Ast>, argument: Arc<Ast>) -> Arc<Self> {
        Arc::new(Ast::Application(head, argument))
    }

    pub fn lambda(bound: Variable, ty: Arc<Ast>, scope: Arc<Ast>) -> Arc<Self> {
        Arc::new(Ast::Lambda(bound, ty, scope))
    }

    pub fn pi(bound: Variable, ty: Arc<Ast>, scope: Arc<Ast>) -> Arc<Self> {
        Arc::new(Ast::Pi(bound, ty, scope))
    }

    /// Non-dependent product `from -> to`, binding an indexed variable that
    /// occurs nowhere in `to`, bound or free.
    pub fn arrow(from: Arc<Ast>, to: Arc<Ast>) -> Arc<Self> {
        let avoid = crate::subst::variables(&to);
        let bound = crate::subst::new_variable(&avoid, &Variable::indexed(0));
        Arc::new(Ast::Pi(bound, from, to))
    }

    /// Left-nested application of `head` to `arguments`.
    pub fn apply_all(head: Arc<Ast>, arguments: impl IntoIterator<Item = Arc<Ast>>) -> Arc<Self> {
        arguments.into_iter().fold(head, Ast::app)
    }

    pub fn is_type_kind(&self) -> bool {
        matches!(self, Ast::TypeKind)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Ast::Constant(_))
    }

    pub fn is_natural_number(&self) -> bool {
        matches!(self, Ast::Constant(c) if c.is_natural_number())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Ast::Variable(_))
    }

    pub fn is_meta_variable(&self) -> bool {
        matches!(self, Ast::MetaVariable(_))
    }

    pub fn is_application(&self) -> bool {
        matches!(self, Ast::Application(_, _))
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, Ast::Lambda(_, _, _))
    }

    pub fn is_pi(&self) -> bool {
        matches!(self, Ast::Pi(_, _, _))
    }

    pub fn is_binder(&self) -> bool {
        self.is_lambda() || self.is_pi()
    }

    /// Atoms have no subterms.
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Ast::TypeKind | Ast::Constant(_) | Ast::Variable(_) | Ast::MetaVariable(_)
        )
    }

    /// Bound variable, type and scope of a `Lambda` or `Pi`.
    pub fn binder(&self) -> Option<(&Variable, &Arc<Ast>, &Arc<Ast>)> {
        match self {
            Ast::Lambda(bound, ty, scope) | Ast::Pi(bound, ty, scope) => Some((bound, ty, scope)),
            _ => None,
        }
    }

    /// Splits an application spine into its head and its arguments, first
    /// argument first.
    pub fn head_and_arguments(self: &Arc<Self>) -> (Arc<Ast>, Vec<Arc<Ast>>) {
        let mut arguments = Vec::new();
        let mut current = self.clone();
        while let Ast::Application(head, argument) = &*current {
            arguments.push(argument.clone());
            current = head.clone();
        }
        arguments.reverse();
        (current, arguments)
    }
}

/// The sort of a term: another term (`Type` or a family) or `Kind`, which is
/// not a term and has no sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sort {
    Kind,
    Term(Arc<Ast>),
}

impl Sort {
    /// The sort `Type`.
    pub fn type_kind() -> Self {
        Sort::Term(Ast::type_kind())
    }

    pub fn is_kind(&self) -> bool {
        matches!(self, Sort::Kind)
    }

    pub fn as_term(&self) -> Option<&Arc<Ast>> {
        match self {
            Sort::Kind => None,
            Sort::Term(term) => Some(term),
        }
    }
}

impl From<Arc<Ast>> for Sort {
    fn from(term: Arc<Ast>) -> Self {
        Sort::Term(term)
    }
}

// =============================================================================
// Rendering
// =============================================================================

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Display for MetaVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.id)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::TypeKind => f.write_str("Type"),
            Ast::Constant(c) => write!(f, "{}", c),
            Ast::Variable(v) => write!(f, "{}", v),
            Ast::MetaVariable(m) => write!(f, "{}", m),
            Ast::Application(head, argument) => {
                if head.is_binder() {
                    write!(f, "({})", head)?;
                } else {
                    write!(f, "{}", head)?;
                }
                if argument.is_atom() {
                    write!(f, " {}", argument)
                } else {
                    write!(f, " ({})", argument)
                }
            }
            Ast::Lambda(bound, ty, scope) => write!(f, "\\{} : {}. {}", bound, ty, scope),
            Ast::Pi(bound, ty, scope) => {
                if crate::subst::occurs_free(bound, scope) {
                    write!(f, "({} : {}) -> {}", bound, ty, scope)
                } else if ty.is_binder() {
                    write!(f, "({}) -> {}", ty, scope)
                } else {
                    write!(f, "{} -> {}", ty, scope)
                }
            }
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Kind => f.write_str("Kind"),
            Sort::Term(term) => write!(f, "{}", term),
        }
    }
}
