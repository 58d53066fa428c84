use crate::ast::Ast;
use crate::subst::substitute;
use std::sync::Arc;

/// Weak head normal form: contracts beta-redexes in head position only.
/// Arguments, binder types and binder scopes are left untouched.
pub fn to_weak_head_normal_form(ast: &Arc<Ast>) -> Arc<Ast> {
    match &**ast {
        Ast::Application(head, argument) => {
            let head_whnf = to_weak_head_normal_form(head);
            if let Ast::Lambda(bound, _, scope) = &*head_whnf {
                to_weak_head_normal_form(&substitute(bound, argument, scope))
            } else if Arc::ptr_eq(&head_whnf, head) {
                ast.clone()
            } else {
                Ast::app(head_whnf, argument.clone())
            }
        }
        _ => ast.clone(),
    }
}

/// Beta normal form: contracts every beta-redex, including those created by
/// contraction.
pub fn to_beta_normal_form(ast: &Arc<Ast>) -> Arc<Ast> {
    match &**ast {
        Ast::TypeKind | Ast::Constant(_) | Ast::Variable(_) | Ast::MetaVariable(_) => ast.clone(),
        Ast::Lambda(bound, ty, scope) => Ast::lambda(
            bound.clone(),
            to_beta_normal_form(ty),
            to_beta_normal_form(scope),
        ),
        Ast::Pi(bound, ty, scope) => Ast::pi(
            bound.clone(),
            to_beta_normal_form(ty),
            to_beta_normal_form(scope),
        ),
        Ast::Application(head, argument) => {
            let head = to_beta_normal_form(head);
            let argument = to_beta_normal_form(argument);
            if let Ast::Lambda(bound, _, scope) = &*head {
                to_beta_normal_form(&substitute(bound, &argument, scope))
            } else {
                Ast::app(head, argument)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Variable;

    fn identity(ty: &str) -> Arc<Ast> {
        Ast::lambda(Variable::new("x"), Ast::constant(ty), Ast::variable("x"))
    }

    #[test]
    fn test_whnf_beta() {
        let term = Ast::app(identity("a"), Ast::constant("c"));
        assert_eq!(to_weak_head_normal_form(&term), Ast::constant("c"));
    }

    #[test]
    fn test_whnf_leaves_arguments_alone() {
        let redex = Ast::app(identity("a"), Ast::constant("c"));
        let term = Ast::app(Ast::constant("f"), redex.clone());
        assert_eq!(to_weak_head_normal_form(&term), term);
    }

    #[test]
    fn test_whnf_leaves_binders_alone() {
        let redex = Ast::app(identity("a"), Ast::constant("c"));
        let term = Ast::lambda(Variable::new("y"), Ast::constant("a"), redex);
        assert_eq!(to_weak_head_normal_form(&term), term);
    }

    #[test]
    fn test_whnf_nested_head() {
        // (\f : a. f) (\x : a. x) c  ~>  c
        let outer = Ast::lambda(Variable::new("f"), Ast::constant("a"), Ast::variable("f"));
        let term = Ast::apply_all(outer, vec![identity("a"), Ast::constant("c")]);
        assert_eq!(to_weak_head_normal_form(&term), Ast::constant("c"));
    }

    #[test]
    fn test_beta_normal_form_under_binders() {
        let redex = Ast::app(identity("a"), Ast::constant("c"));
        let term = Ast::lambda(Variable::new("y"), redex.clone(), Ast::app(Ast::constant("f"), redex));
        let expected = Ast::lambda(
            Variable::new("y"),
            Ast::constant("c"),
            Ast::app(Ast::constant("f"), Ast::constant("c")),
        );
        assert_eq!(to_beta_normal_form(&term), expected);
    }

    #[test]
    fn test_beta_normal_form_created_redex() {
        // (\g : a. g c) (\x : a. x)  ~>  c
        let apply_to_c = Ast::lambda(
            Variable::new("g"),
            Ast::constant("a"),
            Ast::app(Ast::variable("g"), Ast::constant("c")),
        );
        let term = Ast::app(apply_to_c, identity("a"));
        assert_eq!(to_beta_normal_form(&term), Ast::constant("c"));
    }
}
