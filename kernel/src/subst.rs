//! Free variables, fresh names and capture-avoiding substitution.
//!
//! Fresh names are a pure function of an explicit avoid-set; nothing here
//! keeps a counter.

use crate::ast::{Ast, MetaVariable, Variable};
use std::sync::Arc;
use tracing::trace;

/// Variables of `ast` that are not in `bound` and not bound by a binder of
/// `ast`, in order of first occurrence.
pub fn free_variables(bound: &[Variable], ast: &Ast) -> Vec<Variable> {
    let mut bound = bound.to_vec();
    let mut free = Vec::new();
    collect_free(ast, &mut bound, &mut free);
    free
}

fn collect_free(ast: &Ast, bound: &mut Vec<Variable>, free: &mut Vec<Variable>) {
    match ast {
        Ast::Variable(v) => {
            if !bound.contains(v) && !free.contains(v) {
                free.push(v.clone());
            }
        }
        Ast::TypeKind | Ast::Constant(_) | Ast::MetaVariable(_) => {}
        Ast::Application(head, argument) => {
            collect_free(head, bound, free);
            collect_free(argument, bound, free);
        }
        Ast::Lambda(b, ty, scope) | Ast::Pi(b, ty, scope) => {
            collect_free(ty, bound, free);
            bound.push(b.clone());
            collect_free(scope, bound, free);
            bound.pop();
        }
    }
}

/// Whether `x` occurs free in `ast`.
pub fn occurs_free(x: &Variable, ast: &Ast) -> bool {
    match ast {
        Ast::Variable(v) => v == x,
        Ast::TypeKind | Ast::Constant(_) | Ast::MetaVariable(_) => false,
        Ast::Application(head, argument) => occurs_free(x, head) || occurs_free(x, argument),
        Ast::Lambda(b, ty, scope) | Ast::Pi(b, ty, scope) => {
            occurs_free(x, ty) || (b != x && occurs_free(x, scope))
        }
    }
}

/// Every variable mentioned in `ast`, bound or free, in order of first occurrence.
pub fn variables(ast: &Ast) -> Vec<Variable> {
    fn go(ast: &Ast, out: &mut Vec<Variable>) {
        match ast {
            Ast::Variable(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Ast::TypeKind | Ast::Constant(_) | Ast::MetaVariable(_) => {}
            Ast::Application(head, argument) => {
                go(head, out);
                go(argument, out);
            }
            Ast::Lambda(b, ty, scope) | Ast::Pi(b, ty, scope) => {
                if !out.contains(b) {
                    out.push(b.clone());
                }
                go(ty, out);
                go(scope, out);
            }
        }
    }
    let mut out = Vec::new();
    go(ast, &mut out);
    out
}

/// Meta-variables occurring in `ast`, in order of first occurrence.
pub fn meta_variables(ast: &Ast) -> Vec<MetaVariable> {
    fn go(ast: &Ast, out: &mut Vec<MetaVariable>) {
        match ast {
            Ast::MetaVariable(m) => {
                if !out.contains(m) {
                    out.push(m.clone());
                }
            }
            Ast::TypeKind | Ast::Constant(_) | Ast::Variable(_) => {}
            Ast::Application(head, argument) => {
                go(head, out);
                go(argument, out);
            }
            Ast::Lambda(_, ty, scope) | Ast::Pi(_, ty, scope) => {
                go(ty, out);
                go(scope, out);
            }
        }
    }
    let mut out = Vec::new();
    go(ast, &mut out);
    out
}

/// Returns `candidate` if it is not in `avoid`. Otherwise returns the generated
/// variable with `candidate`'s base whose index is one more than the largest
/// index among the members of `avoid` sharing that base (plain variables
/// count as index 0), so the result is fresh for the whole set at once.
///
/// When that index would overflow, the smallest positive index not taken by
/// `avoid` is used instead.
pub fn new_variable(avoid: &[Variable], candidate: &Variable) -> Variable {
    if !avoid.contains(candidate) {
        return candidate.clone();
    }
    let base = candidate.base();
    let used: Vec<i64> = avoid
        .iter()
        .filter(|v| v.base() == base)
        .map(|v| v.index().unwrap_or(0))
        .collect();
    Variable::generated(base, next_index(&used, 1))
}

/// The indexed meta-variable `m_(1 + max)` over the indexed members of
/// `avoid`, or `m_0` when there are none.
pub fn new_meta_variable(avoid: &[MetaVariable]) -> MetaVariable {
    let used: Vec<i64> = avoid.iter().filter_map(MetaVariable::index).collect();
    MetaVariable::indexed(next_index(&used, 0))
}

/// One past the largest of `used`, or `start` when `used` is empty. Falls back
/// to the smallest index from `start` up that is not in `used` on overflow.
fn next_index(used: &[i64], start: i64) -> i64 {
    match used.iter().max() {
        None => start,
        Some(max) => match max.checked_add(1) {
            Some(next) => next,
            None => (start..).find(|i| !used.contains(i)).unwrap_or(start),
        },
    }
}

/// Replace free occurrences of `x` in `ast` by `with`, renaming binders of
/// `ast` that would capture a free variable of `with`.
pub fn substitute(x: &Variable, with: &Arc<Ast>, ast: &Arc<Ast>) -> Arc<Ast> {
    let with_free = free_variables(&[], with);
    substitute_with(x, with, &with_free, ast)
}

/// Renames the binder `bound` of `scope` to `to`.
pub fn rename_bound(bound: &Variable, scope: &Arc<Ast>, to: &Variable) -> Arc<Ast> {
    if bound == to {
        return scope.clone();
    }
    substitute(bound, &Ast::var(to.clone()), scope)
}

fn substitute_with(x: &Variable, with: &Arc<Ast>, with_free: &[Variable], ast: &Arc<Ast>) -> Arc<Ast> {
    match &**ast {
        Ast::Variable(v) if v == x => with.clone(),
        Ast::TypeKind | Ast::Constant(_) | Ast::Variable(_) | Ast::MetaVariable(_) => ast.clone(),
        Ast::Application(head, argument) => Ast::app(
            substitute_with(x, with, with_free, head),
            substitute_with(x, with, with_free, argument),
        ),
        Ast::Lambda(b, ty, scope) => {
            let (b, ty, scope) = substitute_binder(x, with, with_free, b, ty, scope);
            Ast::lambda(b, ty, scope)
        }
        Ast::Pi(b, ty, scope) => {
            let (b, ty, scope) = substitute_binder(x, with, with_free, b, ty, scope);
            Ast::pi(b, ty, scope)
        }
    }
}

fn substitute_binder(
    x: &Variable,
    with: &Arc<Ast>,
    with_free: &[Variable],
    bound: &Variable,
    ty: &Arc<Ast>,
    scope: &Arc<Ast>,
) -> (Variable, Arc<Ast>, Arc<Ast>) {
    let ty = substitute_with(x, with, with_free, ty);
    if bound == x {
        // `x` is rebound here: the scope cannot mention the outer `x`.
        return (bound.clone(), ty, scope.clone());
    }
    if with_free.contains(bound) && occurs_free(x, scope) {
        let mut avoid = with_free.to_vec();
        avoid.extend(free_variables(&[], scope));
        let fresh = new_variable(&avoid, bound);
        trace!(from = %bound, to = %fresh, "renaming binder to avoid capture");
        let renamed = rename_bound(bound, scope, &fresh);
        return (fresh, ty, substitute_with(x, with, with_free, &renamed));
    }
    (bound.clone(), ty, substitute_with(x, with, with_free, scope))
}

/// Brings two binder scopes under one shared bound name.
///
/// Prefers the left name, then the right one, and otherwise generates a name
/// fresh for both scopes. Names in `avoid` are never chosen.
pub(crate) fn common_binder(
    left_bound: &Variable,
    left_scope: &Arc<Ast>,
    right_bound: &Variable,
    right_scope: &Arc<Ast>,
    avoid: &[Variable],
) -> (Variable, Arc<Ast>, Arc<Ast>) {
    if !avoid.contains(left_bound)
        && (left_bound == right_bound || !occurs_free(left_bound, right_scope))
    {
        let right_scope = rename_bound(right_bound, right_scope, left_bound);
        return (left_bound.clone(), left_scope.clone(), right_scope);
    }
    if !avoid.contains(right_bound) && !occurs_free(right_bound, left_scope) {
        let left_scope = rename_bound(left_bound, left_scope, right_bound);
        return (right_bound.clone(), left_scope, right_scope.clone());
    }
    let mut taken = avoid.to_vec();
    taken.extend(free_variables(&[], left_scope));
    taken.extend(free_variables(&[], right_scope));
    taken.push(left_bound.clone());
    taken.push(right_bound.clone());
    let fresh = new_variable(&taken, left_bound);
    (
        fresh.clone(),
        rename_bound(left_bound, left_scope, &fresh),
        rename_bound(right_bound, right_scope, &fresh),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: &str) -> Variable {
        Variable::new(id)
    }

    #[test]
    fn test_new_variable_keeps_fresh_candidate() {
        assert_eq!(new_variable(&[v("y")], &v("x")), v("x"));
    }

    #[test]
    fn test_new_variable_is_fresh_for_whole_set() {
        let avoid = [v("x"), v("$x_4"), v("$x_2"), v("$y_9")];
        assert_eq!(new_variable(&avoid, &v("x")), Variable::generated("x", 5));
        assert_eq!(new_variable(&avoid, &v("$x_2")), Variable::generated("x", 5));
    }

    #[test]
    fn test_new_variable_at_largest_index() {
        let top = Variable::generated("y", i64::MAX);
        let avoid = [v("y"), top.clone(), Variable::generated("y", 1)];
        let fresh = new_variable(&avoid, &v("y"));
        assert!(!avoid.contains(&fresh));
        assert_eq!(fresh, Variable::generated("y", 2));
        assert_eq!(new_variable(&[top.clone()], &top), Variable::generated("y", 1));
    }

    #[test]
    fn test_substitute_avoids_capture_at_largest_index() {
        // (\y : a. x y)[x := y $y_MAX] must not capture $y_MAX
        let top = Variable::generated("y", i64::MAX);
        let with = Ast::app(Ast::variable("y"), Ast::var(top.clone()));
        let term = Ast::lambda(
            v("y"),
            Ast::constant("a"),
            Ast::app(Ast::variable("x"), Ast::variable("y")),
        );
        let result = substitute(&v("x"), &with, &term);
        assert_eq!(free_variables(&[], &result), vec![v("y"), top]);
    }

    #[test]
    fn test_new_meta_variable_at_largest_index() {
        let avoid = [MetaVariable::indexed(0), MetaVariable::indexed(i64::MAX)];
        assert_eq!(new_meta_variable(&avoid), MetaVariable::indexed(1));
    }

    #[test]
    fn test_new_meta_variable() {
        assert_eq!(new_meta_variable(&[]), MetaVariable::indexed(0));
        let avoid = [MetaVariable::new("goal"), MetaVariable::indexed(3)];
        assert_eq!(new_meta_variable(&avoid), MetaVariable::indexed(4));
    }

    #[test]
    fn test_free_variables_respects_binders() {
        // \x : a. f x y
        let term = Ast::lambda(
            v("x"),
            Ast::variable("a"),
            Ast::apply_all(Ast::variable("f"), vec![Ast::variable("x"), Ast::variable("y")]),
        );
        assert_eq!(free_variables(&[], &term), vec![v("a"), v("f"), v("y")]);
        assert_eq!(free_variables(&[v("f")], &term), vec![v("a"), v("y")]);
    }

    #[test]
    fn test_binder_does_not_bind_its_type() {
        // (x : x) -> x
        let term = Ast::pi(v("x"), Ast::variable("x"), Ast::variable("x"));
        assert_eq!(free_variables(&[], &term), vec![v("x")]);
    }

    #[test]
    fn test_substitute_stops_at_rebinding() {
        // (\x : x. x)[x := c] = \x : c. x
        let term = Ast::lambda(v("x"), Ast::variable("x"), Ast::variable("x"));
        let result = substitute(&v("x"), &Ast::constant("c"), &term);
        assert_eq!(result, Ast::lambda(v("x"), Ast::constant("c"), Ast::variable("x")));
    }

    #[test]
    fn test_substitute_avoids_capture() {
        // (\y : a. x y)[x := y] = \$y_1 : a. y $y_1
        let term = Ast::lambda(
            v("y"),
            Ast::constant("a"),
            Ast::app(Ast::variable("x"), Ast::variable("y")),
        );
        let result = substitute(&v("x"), &Ast::variable("y"), &term);
        let fresh = Variable::generated("y", 1);
        assert_eq!(
            result,
            Ast::lambda(
                fresh.clone(),
                Ast::constant("a"),
                Ast::app(Ast::variable("y"), Ast::var(fresh)),
            )
        );
    }

    #[test]
    fn test_substitute_without_capture_keeps_name() {
        // (\y : a. y)[x := y] leaves the binder alone since x does not occur.
        let term = Ast::lambda(v("y"), Ast::constant("a"), Ast::variable("y"));
        assert_eq!(substitute(&v("x"), &Ast::variable("y"), &term), term);
    }

    #[test]
    fn test_common_binder_prefers_left_name() {
        let left = Ast::variable("x");
        let right = Ast::variable("y");
        let (name, l, r) = common_binder(&v("x"), &left, &v("y"), &right, &[]);
        assert_eq!(name, v("x"));
        assert_eq!(l, left);
        assert_eq!(r, Ast::variable("x"));
    }

    #[test]
    fn test_common_binder_falls_back_to_fresh() {
        // left scope mentions y free, right scope mentions x free
        let left = Ast::app(Ast::variable("x"), Ast::variable("y"));
        let right = Ast::app(Ast::variable("y"), Ast::variable("x"));
        let (name, l, r) = common_binder(&v("x"), &left, &v("y"), &right, &[]);
        assert_eq!(name, Variable::generated("x", 1));
        assert_eq!(l, Ast::app(Ast::var(name.clone()), Ast::variable("y")));
        assert_eq!(r, Ast::app(Ast::var(name), Ast::variable("x")));
    }
}
