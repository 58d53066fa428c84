//! Contexts, meta-contexts, signatures and the checking environment.
//!
//! All three are persistent association lists from an identifier to its
//! declared sort. None of them rejects shadowing; well-formedness is decided
//! separately by the checker.

use crate::assoc::{Assoc, Iter};
use crate::ast::{Ast, Constant, MetaVariable, Variable};
use crate::equality::beta_eta_equality;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Context
// =============================================================================

/// Local assumptions: variable -> declared sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ctx {
    entries: Assoc<Variable, Arc<Ast>>,
}

impl Ctx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, variable: Variable, sort: Arc<Ast>) -> Self {
        Ctx {
            entries: self.entries.add(variable, sort),
        }
    }

    pub fn remove(&self, variable: &Variable) -> Self {
        Ctx {
            entries: self.entries.remove(variable),
        }
    }

    pub fn lookup(&self, variable: &Variable) -> Option<&Arc<Ast>> {
        self.entries.lookup(variable)
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.entries.contains(variable)
    }

    /// Declared variables, newest first, each listed once.
    pub fn domain(&self) -> Vec<Variable> {
        let mut domain: Vec<Variable> = Vec::new();
        for (variable, _) in self.entries.iter() {
            if !domain.contains(variable) {
                domain.push(variable.clone());
            }
        }
        domain
    }

    /// Entries from the newest to the oldest.
    pub fn iter(&self) -> Iter<'_, Variable, Arc<Ast>> {
        self.entries.iter()
    }

    /// Entries from the oldest to the newest.
    pub fn entries(&self) -> Vec<(&Variable, &Arc<Ast>)> {
        self.entries.entries()
    }

    /// The newest entry and the context declared before it.
    pub fn split_newest(&self) -> Option<(&Variable, &Arc<Ast>, Ctx)> {
        self.entries
            .split_newest()
            .map(|(variable, sort, rest)| (variable, sort, Ctx { entries: rest }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Entries are given oldest first.
impl FromIterator<(Variable, Arc<Ast>)> for Ctx {
    fn from_iter<I: IntoIterator<Item = (Variable, Arc<Ast>)>>(iter: I) -> Self {
        Ctx {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Two contexts declaring the same variable with sorts that are not
/// beta-eta-equal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("variable {id} is declared as {left} and as {right}")]
pub struct CtxIncompatibility {
    pub id: Variable,
    pub left: Arc<Ast>,
    pub right: Arc<Ast>,
}

/// Merges two contexts, right-biased by position: entries only in `left`
/// keep their relative order and come first, followed by all of `right` in
/// its own order. Every variable declared in both must have beta-eta-equal
/// sorts.
pub fn ctx_union(left: &Ctx, right: &Ctx) -> Result<Ctx, CtxIncompatibility> {
    let mut merged = left.clone();
    for (variable, right_sort) in right.entries() {
        if let Some(left_sort) = left.lookup(variable) {
            if !beta_eta_equality(left_sort, right_sort) {
                debug!(variable = %variable, left = %left_sort, right = %right_sort, "incompatible contexts");
                return Err(CtxIncompatibility {
                    id: variable.clone(),
                    left: left_sort.clone(),
                    right: right_sort.clone(),
                });
            }
            merged = merged.remove(variable);
        }
    }
    Ok(right
        .entries()
        .into_iter()
        .fold(merged, |ctx, (variable, sort)| ctx.add(variable.clone(), sort.clone())))
}

// =============================================================================
// Meta-context
// =============================================================================

/// Meta-variable -> declared sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaCtx {
    entries: Assoc<MetaVariable, Arc<Ast>>,
}

impl MetaCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, meta: MetaVariable, sort: Arc<Ast>) -> Self {
        MetaCtx {
            entries: self.entries.add(meta, sort),
        }
    }

    pub fn remove(&self, meta: &MetaVariable) -> Self {
        MetaCtx {
            entries: self.entries.remove(meta),
        }
    }

    pub fn lookup(&self, meta: &MetaVariable) -> Option<&Arc<Ast>> {
        self.entries.lookup(meta)
    }

    pub fn contains(&self, meta: &MetaVariable) -> bool {
        self.entries.contains(meta)
    }

    pub fn domain(&self) -> Vec<MetaVariable> {
        let mut domain: Vec<MetaVariable> = Vec::new();
        for (meta, _) in self.entries.iter() {
            if !domain.contains(meta) {
                domain.push(meta.clone());
            }
        }
        domain
    }

    pub fn iter(&self) -> Iter<'_, MetaVariable, Arc<Ast>> {
        self.entries.iter()
    }

    pub fn entries(&self) -> Vec<(&MetaVariable, &Arc<Ast>)> {
        self.entries.entries()
    }

    pub fn split_newest(&self) -> Option<(&MetaVariable, &Arc<Ast>, MetaCtx)> {
        self.entries
            .split_newest()
            .map(|(meta, sort, rest)| (meta, sort, MetaCtx { entries: rest }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(MetaVariable, Arc<Ast>)> for MetaCtx {
    fn from_iter<I: IntoIterator<Item = (MetaVariable, Arc<Ast>)>>(iter: I) -> Self {
        MetaCtx {
            entries: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Signature
// =============================================================================

/// Signature keys: ordinary constants, plus one reserved key standing for
/// the family of every natural-number literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SigKey {
    Constant(Constant),
    NaturalNumbers,
}

impl fmt::Display for SigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigKey::Constant(c) => write!(f, "{}", c),
            SigKey::NaturalNumbers => f.write_str("<natural numbers>"),
        }
    }
}

/// Global constants -> declared sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sig {
    entries: Assoc<SigKey, Arc<Ast>>,
}

impl Sig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, constant: Constant, sort: Arc<Ast>) -> Self {
        self.add_key(SigKey::Constant(constant), sort)
    }

    /// Declares `sort` as the sort of every natural-number literal.
    pub fn add_natural_numbers(&self, sort: Arc<Ast>) -> Self {
        self.add_key(SigKey::NaturalNumbers, sort)
    }

    pub fn add_key(&self, key: SigKey, sort: Arc<Ast>) -> Self {
        Sig {
            entries: self.entries.add(key, sort),
        }
    }

    pub fn remove(&self, key: &SigKey) -> Self {
        Sig {
            entries: self.entries.remove(key),
        }
    }

    /// Natural numbers resolve to the reserved key whatever their value;
    /// other constants resolve by id.
    pub fn lookup(&self, constant: &Constant) -> Option<&Arc<Ast>> {
        if constant.is_natural_number() {
            self.entries.find(|key| matches!(key, SigKey::NaturalNumbers))
        } else {
            self.entries
                .find(|key| matches!(key, SigKey::Constant(c) if c == constant))
        }
    }

    pub fn lookup_key(&self, key: &SigKey) -> Option<&Arc<Ast>> {
        self.entries.lookup(key)
    }

    pub fn contains(&self, constant: &Constant) -> bool {
        self.lookup(constant).is_some()
    }

    pub fn domain(&self) -> Vec<SigKey> {
        let mut domain: Vec<SigKey> = Vec::new();
        for (key, _) in self.entries.iter() {
            if !domain.contains(key) {
                domain.push(key.clone());
            }
        }
        domain
    }

    /// Declared ordinary constants, newest first.
    pub fn constants(&self) -> Vec<Constant> {
        self.domain()
            .into_iter()
            .filter_map(|key| match key {
                SigKey::Constant(c) => Some(c),
                SigKey::NaturalNumbers => None,
            })
            .collect()
    }

    pub fn iter(&self) -> Iter<'_, SigKey, Arc<Ast>> {
        self.entries.iter()
    }

    pub fn entries(&self) -> Vec<(&SigKey, &Arc<Ast>)> {
        self.entries.entries()
    }

    pub fn split_newest(&self) -> Option<(&SigKey, &Arc<Ast>, Sig)> {
        self.entries
            .split_newest()
            .map(|(key, sort, rest)| (key, sort, Sig { entries: rest }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Constant, Arc<Ast>)> for Sig {
    fn from_iter<I: IntoIterator<Item = (Constant, Arc<Ast>)>>(iter: I) -> Self {
        Sig {
            entries: iter
                .into_iter()
                .map(|(constant, sort)| (SigKey::Constant(constant), sort))
                .collect(),
        }
    }
}

// =============================================================================
// Environment
// =============================================================================

/// The checking environment: signature, context and meta-context. Never
/// mutated; descending under a binder builds an extended copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    sig: Sig,
    ctx: Ctx,
    meta_ctx: MetaCtx,
}

impl Env {
    pub fn new(sig: Sig, ctx: Ctx, meta_ctx: MetaCtx) -> Self {
        Env { sig, ctx, meta_ctx }
    }

    pub fn from_sig(sig: Sig) -> Self {
        Env::new(sig, Ctx::new(), MetaCtx::new())
    }

    pub fn sig(&self) -> &Sig {
        &self.sig
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    pub fn meta_ctx(&self) -> &MetaCtx {
        &self.meta_ctx
    }

    pub fn with_ctx(&self, ctx: Ctx) -> Self {
        Env::new(self.sig.clone(), ctx, self.meta_ctx.clone())
    }

    pub fn with_meta_ctx(&self, meta_ctx: MetaCtx) -> Self {
        Env::new(self.sig.clone(), self.ctx.clone(), meta_ctx)
    }

    /// The environment with one more context entry.
    pub fn extend(&self, variable: Variable, sort: Arc<Ast>) -> Self {
        self.with_ctx(self.ctx.add(variable, sort))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: &str) -> Variable {
        Variable::new(id)
    }

    fn ctx(entries: &[(&str, Arc<Ast>)]) -> Ctx {
        entries
            .iter()
            .map(|(id, sort)| (v(id), sort.clone()))
            .collect()
    }

    #[test]
    fn test_ctx_lookup_newest_first() {
        let c = ctx(&[("x", Ast::constant("a")), ("x", Ast::constant("b"))]);
        assert_eq!(c.lookup(&v("x")), Some(&Ast::constant("b")));
        assert_eq!(c.domain(), vec![v("x")]);
    }

    #[test]
    fn test_ctx_add_is_persistent() {
        let base = ctx(&[("x", Ast::constant("a"))]);
        let extended = base.add(v("y"), Ast::constant("a"));
        assert!(!base.contains(&v("y")));
        assert!(extended.contains(&v("y")));
        assert!(extended.contains(&v("x")));
    }

    #[test]
    fn test_sig_natural_numbers_resolve_by_value_class() {
        let sig = Sig::new()
            .add(Constant::new("nat"), Ast::type_kind())
            .add_natural_numbers(Ast::constant("nat"));
        assert_eq!(sig.lookup(&Constant::natural(0)), Some(&Ast::constant("nat")));
        assert_eq!(sig.lookup(&Constant::natural(42)), Some(&Ast::constant("nat")));
        assert_eq!(sig.lookup(&Constant::new("nat")), Some(&Ast::type_kind()));
        assert_eq!(sig.constants(), vec![Constant::new("nat")]);
    }

    #[test]
    fn test_sig_without_natural_numbers() {
        let sig = Sig::new().add(Constant::new("3"), Ast::type_kind());
        assert_eq!(sig.lookup(&Constant::natural(3)), None);
    }

    #[test]
    fn test_ctx_union_right_biased() {
        let a = Ast::constant("a");
        let left = ctx(&[("x", a.clone()), ("y", a.clone())]);
        let right = ctx(&[("y", a.clone()), ("z", a.clone())]);
        let merged = ctx_union(&left, &right).expect("compatible");
        let order: Vec<_> = merged.entries().into_iter().map(|(v, _)| v.id().to_string()).collect();
        assert_eq!(order, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_ctx_union_reorders_shared_entries() {
        let a = Ast::constant("a");
        let left = ctx(&[("y", a.clone()), ("x", a.clone())]);
        let right = ctx(&[("z", a.clone()), ("y", a.clone())]);
        let merged = ctx_union(&left, &right).expect("compatible");
        let order: Vec<_> = merged.entries().into_iter().map(|(v, _)| v.id().to_string()).collect();
        assert_eq!(order, vec!["x", "z", "y"]);
    }

    #[test]
    fn test_ctx_union_uses_beta_eta() {
        let redex = Ast::app(
            Ast::lambda(v("t"), Ast::type_kind(), Ast::variable("t")),
            Ast::constant("a"),
        );
        let left = ctx(&[("x", Ast::constant("a"))]);
        let right = ctx(&[("x", redex)]);
        assert!(ctx_union(&left, &right).is_ok());
    }

    #[test]
    fn test_ctx_union_incompatible() {
        let left = ctx(&[("x", Ast::constant("a"))]);
        let right = ctx(&[("x", Ast::constant("b"))]);
        let err = ctx_union(&left, &right).unwrap_err();
        assert_eq!(
            err,
            CtxIncompatibility {
                id: v("x"),
                left: Ast::constant("a"),
                right: Ast::constant("b"),
            }
        );
    }
}
