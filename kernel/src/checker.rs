use crate::ast::{Ast, Sort, Variable};
use crate::context::{Ctx, Env, MetaCtx, Sig};
use crate::equality::{beta_eta_equality, sort_equality};
use crate::error::{FailedCtxCheck, FailedEnvCheck, FailedMetaCtxCheck, FailedSigCheck, SortError};
use crate::normalize::{to_beta_normal_form, to_weak_head_normal_form};
use crate::subst::{new_variable, rename_bound, substitute};
use std::sync::Arc;
use tracing::{debug, trace};

// =============================================================================
// Synthesis
// =============================================================================

/// Synthesizes the sort of `ast`. Term-valued sorts come back in beta normal form.
///
/// The signature, context and meta-context of `env` are taken as given; use
/// [`check_env`] and friends to validate them.
pub fn synthesize(env: &Env, ast: &Arc<Ast>) -> Result<Sort, SortError> {
    trace!(term = %ast, "synthesize");
    let sort = match &**ast {
        Ast::TypeKind => Sort::Kind,
        Ast::Constant(c) => env
            .sig()
            .lookup(c)
            .cloned()
            .map(Sort::Term)
            .ok_or_else(|| SortError::UndeclaredConstant(c.clone()))?,
        Ast::Variable(v) => env
            .ctx()
            .lookup(v)
            .cloned()
            .map(Sort::Term)
            .ok_or_else(|| SortError::UndeclaredVariable(v.clone()))?,
        Ast::MetaVariable(m) => env
            .meta_ctx()
            .lookup(m)
            .cloned()
            .map(Sort::Term)
            .ok_or_else(|| SortError::UndeclaredMetaVariable(m.clone()))?,
        Ast::Pi(bound, ty, scope) => {
            let inner = enter_binder(env, ast, bound, ty)?;
            let scope_sort = synthesize(&inner, scope).map_err(|e| SortError::bad_child(ast, e))?;
            check_family_or_kind(scope, &scope_sort).map_err(|e| SortError::bad_child(ast, e))?;
            scope_sort
        }
        Ast::Lambda(bound, ty, scope) => {
            let inner = enter_binder(env, ast, bound, ty)?;
            let scope_sort = synthesize(&inner, scope).map_err(|e| SortError::bad_child(ast, e))?;
            let scope_family =
                check_object_or_family(scope, scope_sort).map_err(|e| SortError::bad_child(ast, e))?;
            let renamed = new_variable(&env.ctx().domain(), bound);
            let family = rename_bound(bound, &scope_family, &renamed);
            Sort::Term(Ast::pi(renamed, ty.clone(), family))
        }
        Ast::Application(head, argument) => {
            let head_sort = synthesize(env, head).map_err(|e| SortError::bad_child(ast, e))?;
            let (bound, domain, codomain) =
                expect_pi(head, head_sort).map_err(|e| SortError::bad_child(ast, e))?;
            let argument_sort = synthesize(env, argument).map_err(|e| SortError::bad_child(ast, e))?;
            let expected = Sort::Term(domain);
            if !sort_equality(&argument_sort, &expected) {
                return Err(SortError::bad_child(
                    ast,
                    SortError::FailedCheck {
                        subject: argument.clone(),
                        expected,
                        actual: argument_sort,
                    },
                ));
            }
            Sort::Term(substitute(&bound, argument, &codomain))
        }
    };
    Ok(match sort {
        Sort::Kind => Sort::Kind,
        Sort::Term(term) => Sort::Term(to_beta_normal_form(&term)),
    })
}

/// Checks the binder of a `Pi` or `Lambda`: the bound variable must be new to
/// the context and its type must have sort `Type`. Returns the environment for
/// the scope.
fn enter_binder(env: &Env, binder: &Arc<Ast>, bound: &Variable, ty: &Arc<Ast>) -> Result<Env, SortError> {
    if env.ctx().contains(bound) {
        return Err(SortError::bad_child(
            binder,
            SortError::RedeclaredVariable(bound.clone()),
        ));
    }
    check_and_report(env, ty, &Sort::type_kind()).map_err(|e| SortError::bad_child(binder, e))?;
    Ok(env.extend(bound.clone(), ty.clone()))
}

fn is_type(sort: &Sort) -> bool {
    match sort {
        Sort::Kind => false,
        Sort::Term(term) => beta_eta_equality(term, &Ast::type_kind()),
    }
}

/// `subject` must be a family (sort `Type`) or a kind (sort `Kind`).
fn check_family_or_kind(subject: &Arc<Ast>, sort: &Sort) -> Result<(), SortError> {
    if sort.is_kind() || is_type(sort) {
        Ok(())
    } else {
        Err(SortError::FailedCheckFamilyOrKind {
            subject: subject.clone(),
            actual: sort.clone(),
        })
    }
}

/// `subject` must be an object or a family, i.e. its sort must be a term.
fn check_object_or_family(subject: &Arc<Ast>, sort: Sort) -> Result<Arc<Ast>, SortError> {
    match sort {
        Sort::Term(term) => Ok(term),
        Sort::Kind => Err(SortError::FailedCheckObjectOrFamily {
            subject: subject.clone(),
            actual: Sort::Kind,
        }),
    }
}

/// The sort of `subject` must reduce to a `Pi`; returns its parts.
fn expect_pi(subject: &Arc<Ast>, sort: Sort) -> Result<(Variable, Arc<Ast>, Arc<Ast>), SortError> {
    if let Sort::Term(term) = &sort {
        if let Ast::Pi(bound, domain, codomain) = &*to_weak_head_normal_form(term) {
            return Ok((bound.clone(), domain.clone(), codomain.clone()));
        }
    }
    Err(SortError::FailedCheckPi {
        subject: subject.clone(),
        actual: sort,
    })
}

/// Checks `ast` against `expected`. A mismatch is reported as `FailedCheck`
/// on `ast`; synthesis failures are returned unchanged.
pub fn check_and_report(env: &Env, ast: &Arc<Ast>, expected: &Sort) -> Result<(), SortError> {
    let actual = synthesize(env, ast)?;
    if sort_equality(&actual, expected) {
        Ok(())
    } else {
        debug!(term = %ast, expected = %expected, actual = %actual, "sort mismatch");
        Err(SortError::FailedCheck {
            subject: ast.clone(),
            expected: expected.clone(),
            actual,
        })
    }
}

/// Convenience wrapper returning whether `ast` has sort `expected`.
pub fn check(env: &Env, ast: &Arc<Ast>, expected: &Sort) -> bool {
    check_and_report(env, ast, expected).is_ok()
}

// =============================================================================
// Well-formedness of contexts, signatures and meta-contexts
// =============================================================================
//
// Each walk starts at the most recently added entry. An entry is first checked
// for redeclaration against the entries older than it, then its declared sort
// is checked in the environment those older entries form.

/// Validates `ctx` against `sig`: no variable declared twice, and every
/// declared sort has sort `Type`.
pub fn check_ctx_and_report(sig: &Sig, ctx: &Ctx) -> Result<(), FailedCtxCheck> {
    let mut rest = ctx.clone();
    loop {
        let Some((id, sort, older)) = rest.split_newest() else {
            return Ok(());
        };
        if older.contains(id) {
            debug!(variable = %id, "variable redeclared in context");
            return Err(FailedCtxCheck::RedeclaredVariable(id.clone()));
        }
        let env = Env::new(sig.clone(), older.clone(), MetaCtx::new());
        if let Err(sort_error) = check_and_report(&env, sort, &Sort::type_kind()) {
            debug!(variable = %id, error = %sort_error, "bad context entry");
            return Err(FailedCtxCheck::BadEntry {
                id: id.clone(),
                sort_error,
            });
        }
        rest = older;
    }
}

/// Validates `sig`: no key declared twice, and every declared sort is a
/// family or a kind.
pub fn check_sig(sig: &Sig) -> Result<(), FailedSigCheck> {
    let mut rest = sig.clone();
    loop {
        let Some((key, sort, older)) = rest.split_newest() else {
            return Ok(());
        };
        if older.lookup_key(key).is_some() {
            debug!(constant = %key, "constant redeclared in signature");
            return Err(FailedSigCheck::RedeclaredConstant(key.clone()));
        }
        let env = Env::from_sig(older.clone());
        let checked = synthesize(&env, sort).and_then(|actual| check_family_or_kind(sort, &actual));
        if let Err(sort_error) = checked {
            debug!(constant = %key, error = %sort_error, "bad signature entry");
            return Err(FailedSigCheck::BadEntry {
                id: key.clone(),
                sort_error,
            });
        }
        rest = older;
    }
}

/// Validates `meta_ctx` against `sig` and `ctx`: no meta-variable declared
/// twice, and every declared sort has sort `Type`.
pub fn check_meta_ctx(sig: &Sig, ctx: &Ctx, meta_ctx: &MetaCtx) -> Result<(), FailedMetaCtxCheck> {
    let mut rest = meta_ctx.clone();
    loop {
        let Some((id, sort, older)) = rest.split_newest() else {
            return Ok(());
        };
        if older.contains(id) {
            debug!(meta = %id, "meta-variable redeclared");
            return Err(FailedMetaCtxCheck::RedeclaredMetaVariable(id.clone()));
        }
        let env = Env::new(sig.clone(), ctx.clone(), older.clone());
        if let Err(sort_error) = check_and_report(&env, sort, &Sort::type_kind()) {
            debug!(meta = %id, error = %sort_error, "bad meta-context entry");
            return Err(FailedMetaCtxCheck::BadEntry {
                id: id.clone(),
                sort_error,
            });
        }
        rest = older;
    }
}

/// Validates the signature, then the context, then the meta-context of `env`.
pub fn check_env(env: &Env) -> Result<(), FailedEnvCheck> {
    check_sig(env.sig())?;
    check_ctx_and_report(env.sig(), env.ctx())?;
    check_meta_ctx(env.sig(), env.ctx(), env.meta_ctx())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Constant;

    fn v(id: &str) -> Variable {
        Variable::new(id)
    }

    fn sig_a() -> Sig {
        Sig::new().add(Constant::new("a"), Ast::type_kind())
    }

    #[test]
    fn test_type_has_sort_kind() {
        let env = Env::default();
        assert_eq!(synthesize(&env, &Ast::type_kind()), Ok(Sort::Kind));
    }

    #[test]
    fn test_pi_into_type_is_a_kind() {
        let env = Env::from_sig(sig_a());
        let pi = Ast::pi(v("x"), Ast::constant("a"), Ast::type_kind());
        assert_eq!(synthesize(&env, &pi), Ok(Sort::Kind));
    }

    #[test]
    fn test_lambda_synthesizes_pi() {
        let env = Env::from_sig(sig_a());
        let identity = Ast::lambda(v("x"), Ast::constant("a"), Ast::variable("x"));
        let expected = Ast::pi(v("x"), Ast::constant("a"), Ast::constant("a"));
        assert_eq!(synthesize(&env, &identity), Ok(Sort::Term(expected)));
    }

    #[test]
    fn test_lambda_into_kind_is_rejected() {
        let env = Env::from_sig(sig_a());
        let lam = Ast::lambda(v("x"), Ast::constant("a"), Ast::type_kind());
        let err = synthesize(&env, &lam).unwrap_err();
        assert_eq!(
            err,
            SortError::bad_child(
                &lam,
                SortError::FailedCheckObjectOrFamily {
                    subject: Ast::type_kind(),
                    actual: Sort::Kind,
                },
            )
        );
    }

    #[test]
    fn test_binder_type_must_be_a_type() {
        // (x : Type) -> a   -- Type has sort Kind, not Type
        let env = Env::from_sig(sig_a());
        let pi = Ast::pi(v("x"), Ast::type_kind(), Ast::constant("a"));
        let err = synthesize(&env, &pi).unwrap_err();
        assert_eq!(
            err,
            SortError::bad_child(
                &pi,
                SortError::FailedCheck {
                    subject: Ast::type_kind(),
                    expected: Sort::type_kind(),
                    actual: Sort::Kind,
                },
            )
        );
    }

    #[test]
    fn test_pi_scope_must_be_family_or_kind() {
        // sig: a : Type, c : a;  (x : a) -> c
        let sig = sig_a().add(Constant::new("c"), Ast::constant("a"));
        let env = Env::from_sig(sig);
        let pi = Ast::pi(v("x"), Ast::constant("a"), Ast::constant("c"));
        let err = synthesize(&env, &pi).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SortError::FailedCheckFamilyOrKind {
                subject: Ast::constant("c"),
                actual: Sort::Term(Ast::constant("a")),
            }
        );
    }

    #[test]
    fn test_apply_non_function() {
        let sig = sig_a().add(Constant::new("c"), Ast::constant("a"));
        let env = Env::from_sig(sig);
        let app = Ast::app(Ast::constant("c"), Ast::constant("c"));
        let err = synthesize(&env, &app).unwrap_err();
        assert_eq!(
            err,
            SortError::bad_child(
                &app,
                SortError::FailedCheckPi {
                    subject: Ast::constant("c"),
                    actual: Sort::Term(Ast::constant("a")),
                },
            )
        );
    }

    #[test]
    fn test_dependent_application_substitutes_argument() {
        // sig: a : Type, p : (x : a) -> Type, f : (x : a) -> p x, c : a
        let p_ty = Ast::pi(v("x"), Ast::constant("a"), Ast::type_kind());
        let f_ty = Ast::pi(
            v("x"),
            Ast::constant("a"),
            Ast::app(Ast::constant("p"), Ast::variable("x")),
        );
        let sig = sig_a()
            .add(Constant::new("p"), p_ty)
            .add(Constant::new("f"), f_ty)
            .add(Constant::new("c"), Ast::constant("a"));
        let env = Env::from_sig(sig);
        let app = Ast::app(Ast::constant("f"), Ast::constant("c"));
        assert_eq!(
            synthesize(&env, &app),
            Ok(Sort::Term(Ast::app(Ast::constant("p"), Ast::constant("c"))))
        );
    }

    #[test]
    fn test_check_and_report_mismatch() {
        let sig = sig_a()
            .add(Constant::new("b"), Ast::type_kind())
            .add(Constant::new("c"), Ast::constant("a"));
        let env = Env::from_sig(sig);
        let err = check_and_report(&env, &Ast::constant("c"), &Sort::Term(Ast::constant("b"))).unwrap_err();
        assert_eq!(
            err,
            SortError::FailedCheck {
                subject: Ast::constant("c"),
                expected: Sort::Term(Ast::constant("b")),
                actual: Sort::Term(Ast::constant("a")),
            }
        );
        assert!(check(&env, &Ast::constant("c"), &Sort::Term(Ast::constant("a"))));
    }

    #[test]
    fn test_check_sig_reports_redeclaration() {
        let sig = sig_a().add(Constant::new("a"), Ast::type_kind());
        assert_eq!(
            check_sig(&sig),
            Err(FailedSigCheck::RedeclaredConstant(crate::context::SigKey::Constant(Constant::new("a"))))
        );
    }

    #[test]
    fn test_check_sig_rejects_objects_as_sorts() {
        // c : a  is fine, d : c  is not (c is an object)
        let sig = sig_a()
            .add(Constant::new("c"), Ast::constant("a"))
            .add(Constant::new("d"), Ast::constant("c"));
        let err = check_sig(&sig).unwrap_err();
        assert!(matches!(err, FailedSigCheck::BadEntry { ref id, .. } if id.to_string() == "d"));
    }

    #[test]
    fn test_check_meta_ctx() {
        let meta = MetaCtx::new().add(crate::ast::MetaVariable::indexed(0), Ast::constant("a"));
        assert_eq!(check_meta_ctx(&sig_a(), &Ctx::new(), &meta), Ok(()));
        let bad = meta.add(crate::ast::MetaVariable::indexed(0), Ast::constant("a"));
        assert_eq!(
            check_meta_ctx(&sig_a(), &Ctx::new(), &bad),
            Err(FailedMetaCtxCheck::RedeclaredMetaVariable(crate::ast::MetaVariable::indexed(0)))
        );
    }
}
