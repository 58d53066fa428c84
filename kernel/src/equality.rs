//! The three equality oracles.
//!
//! - syntactic: structural, no renaming;
//! - alpha: up to consistent renaming of bound variables;
//! - beta-eta(-delta): computational, for terms that are already well-sorted.

use crate::assoc::Assoc;
use crate::ast::{Ast, Sort, Variable};
use crate::normalize::to_weak_head_normal_form;
use crate::subst::{common_binder, free_variables, new_variable, occurs_free, rename_bound};
use std::sync::Arc;
use tracing::trace;

pub fn syntactic_equality(left: &Ast, right: &Ast) -> bool {
    left == right
}

/// Structural equality up to renaming of bound variables.
///
/// `bound` holds the names currently shared by both sides. A variable is only
/// equal to itself when its name is in `bound`; callers comparing open terms
/// should seed `bound` with their free variables (see [`alpha_equivalent`]).
pub fn alpha_equality(bound: &[Variable], left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    match (&**left, &**right) {
        (Ast::Variable(l), Ast::Variable(r)) => l == r && bound.contains(l),
        (Ast::Application(h1, a1), Ast::Application(h2, a2)) => {
            alpha_equality(bound, h1, h2) && alpha_equality(bound, a1, a2)
        }
        (Ast::Lambda(b1, t1, s1), Ast::Lambda(b2, t2, s2))
        | (Ast::Pi(b1, t1, s1), Ast::Pi(b2, t2, s2)) => {
            if !alpha_equality(bound, t1, t2) {
                return false;
            }
            let (shared, s1, s2) = common_binder(b1, s1, b2, s2, &[]);
            let mut extended = bound.to_vec();
            extended.push(shared);
            alpha_equality(&extended, &s1, &s2)
        }
        (Ast::TypeKind, Ast::TypeKind) => true,
        (Ast::Constant(l), Ast::Constant(r)) => l == r,
        (Ast::MetaVariable(l), Ast::MetaVariable(r)) => l == r,
        _ => false,
    }
}

/// Alpha equality of two open terms, treating their free variables as shared.
pub fn alpha_equivalent(left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    let mut bound = free_variables(&[], left);
    for v in free_variables(&[], right) {
        if !bound.contains(&v) {
            bound.push(v);
        }
    }
    alpha_equality(&bound, left, right)
}

// =============================================================================
// Definitions
// =============================================================================

/// Definitions of free variables, unfolded by [`beta_eta_delta_equality`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    entries: Assoc<Variable, Arc<Ast>>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&self, variable: Variable, value: Arc<Ast>) -> Self {
        Definitions {
            entries: self.entries.add(variable, value),
        }
    }

    pub fn lookup(&self, variable: &Variable) -> Option<&Arc<Ast>> {
        self.entries.lookup(variable)
    }

    pub fn remove(&self, variable: &Variable) -> Self {
        Definitions {
            entries: self.entries.remove(variable),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Defined names and the free variables of their definitions. Binders
    /// introduced during comparison must avoid these.
    fn reserved_names(&self) -> Vec<Variable> {
        let mut names = Vec::new();
        for (variable, value) in self.entries.iter() {
            names.push(variable.clone());
            names.extend(free_variables(&[], value));
        }
        names
    }
}

impl FromIterator<(Variable, Arc<Ast>)> for Definitions {
    fn from_iter<I: IntoIterator<Item = (Variable, Arc<Ast>)>>(iter: I) -> Self {
        Definitions {
            entries: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Beta-eta(-delta) equality
// =============================================================================

/// Equality up to beta-reduction and eta-expansion.
///
/// Assumes both sides are well-sorted; it must not be used to decide sortedness.
pub fn beta_eta_equality(left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    let none = Definitions::new();
    equal(&none, &none, left, right)
}

/// [`beta_eta_equality`] that may also unfold the variables of `definitions`.
///
/// Each side keeps its own copy of `definitions`; a variable is removed from a
/// side's copy once unfolded there, so it unfolds at most once along any path
/// of the comparison.
pub fn beta_eta_delta_equality(definitions: &Definitions, left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    equal(definitions, definitions, left, right)
}

/// Equality of sorts: `Kind` only equals `Kind`, terms compare by beta-eta.
pub fn sort_equality(left: &Sort, right: &Sort) -> bool {
    match (left, right) {
        (Sort::Kind, Sort::Kind) => true,
        (Sort::Term(l), Sort::Term(r)) => beta_eta_equality(l, r),
        _ => false,
    }
}

fn equal(left_defs: &Definitions, right_defs: &Definitions, left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    let left = to_weak_head_normal_form(left);
    let right = to_weak_head_normal_form(right);
    equal_whnf(left_defs, right_defs, &left, &right) || unfold_and_retry(left_defs, right_defs, &left, &right)
}

fn equal_whnf(left_defs: &Definitions, right_defs: &Definitions, left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    match (&**left, &**right) {
        (l, r) if l.is_atom() && r.is_atom() => l == r,
        (Ast::Application(h1, a1), Ast::Application(h2, a2)) => {
            !h1.is_binder()
                && !h2.is_binder()
                && equal(left_defs, right_defs, h1, h2)
                && equal(left_defs, right_defs, a1, a2)
        }
        (Ast::Lambda(b1, t1, s1), Ast::Lambda(b2, t2, s2))
        | (Ast::Pi(b1, t1, s1), Ast::Pi(b2, t2, s2)) => {
            if !equal(left_defs, right_defs, t1, t2) {
                return false;
            }
            let avoid = reserved_names(left_defs, right_defs);
            let (_, s1, s2) = common_binder(b1, s1, b2, s2, &avoid);
            equal(left_defs, right_defs, &s1, &s2)
        }
        (Ast::Lambda(bound, _, scope), _) if !right.is_binder() => {
            let (expanded, scope) = eta_expand(left_defs, right_defs, bound, scope, right);
            equal(left_defs, right_defs, &scope, &expanded)
        }
        (_, Ast::Lambda(bound, _, scope)) if !left.is_binder() => {
            let (expanded, scope) = eta_expand(left_defs, right_defs, bound, scope, left);
            equal(left_defs, right_defs, &expanded, &scope)
        }
        _ => false,
    }
}

/// Applies `other` to the lambda's bound variable, renaming the binder first
/// if `other` or the definitions mention it. Returns the application and the
/// correspondingly renamed scope.
fn eta_expand(
    left_defs: &Definitions,
    right_defs: &Definitions,
    bound: &Variable,
    scope: &Arc<Ast>,
    other: &Arc<Ast>,
) -> (Arc<Ast>, Arc<Ast>) {
    let mut avoid = reserved_names(left_defs, right_defs);
    let (bound, scope) = if occurs_free(bound, other) || avoid.contains(bound) {
        avoid.extend(free_variables(&[], other));
        avoid.extend(free_variables(&[], scope));
        avoid.push(bound.clone());
        let fresh = new_variable(&avoid, bound);
        let scope = rename_bound(bound, scope, &fresh);
        (fresh, scope)
    } else {
        (bound.clone(), scope.clone())
    };
    (Ast::app(other.clone(), Ast::var(bound)), scope)
}

fn reserved_names(left_defs: &Definitions, right_defs: &Definitions) -> Vec<Variable> {
    let mut names = left_defs.reserved_names();
    names.extend(right_defs.reserved_names());
    names
}

/// Unfolds the defined head variable of each side, if any, and compares again.
fn unfold_and_retry(left_defs: &Definitions, right_defs: &Definitions, left: &Arc<Ast>, right: &Arc<Ast>) -> bool {
    let left_unfolded = unfold_head(left_defs, left);
    let right_unfolded = unfold_head(right_defs, right);
    if left_unfolded.is_none() && right_unfolded.is_none() {
        return false;
    }
    let (left_defs, left) = match left_unfolded {
        Some((variable, unfolded)) => (left_defs.remove(&variable), unfolded),
        None => (left_defs.clone(), left.clone()),
    };
    let (right_defs, right) = match right_unfolded {
        Some((variable, unfolded)) => (right_defs.remove(&variable), unfolded),
        None => (right_defs.clone(), right.clone()),
    };
    equal(&left_defs, &right_defs, &left, &right)
}

fn unfold_head(definitions: &Definitions, ast: &Arc<Ast>) -> Option<(Variable, Arc<Ast>)> {
    if definitions.is_empty() {
        return None;
    }
    let (head, arguments) = ast.head_and_arguments();
    let Ast::Variable(variable) = &*head else {
        return None;
    };
    let value = definitions.lookup(variable)?;
    trace!(variable = %variable, "unfolding definition");
    Some((variable.clone(), Ast::apply_all(value.clone(), arguments)))
}
