//! JSON renderings of terms, sorts, environments and failures for diagnostics.
//!
//! The output is for presentation only; nothing reads it back.

use crate::ast::{Ast, Constant, MetaVariable, Sort, Variable};
use crate::context::{Ctx, CtxIncompatibility, MetaCtx, Sig, SigKey};
use crate::error::{FailedCtxCheck, FailedEnvCheck, FailedMetaCtxCheck, FailedSigCheck, SortError};
use serde_json::{json, Value};

pub fn display_constant(constant: &Constant) -> Value {
    match constant.natural_value() {
        Some(n) => json!(n),
        None => json!(constant.id()),
    }
}

pub fn display_variable(variable: &Variable) -> Value {
    json!(variable.id())
}

pub fn display_meta_variable(meta: &MetaVariable) -> Value {
    json!(meta.id())
}

pub fn display_sig_key(key: &SigKey) -> Value {
    match key {
        SigKey::Constant(constant) => display_constant(constant),
        SigKey::NaturalNumbers => json!(key.to_string()),
    }
}

pub fn display_ast(ast: &Ast) -> Value {
    match ast {
        Ast::TypeKind => json!("Type"),
        Ast::Constant(c) => display_constant(c),
        Ast::Variable(v) => display_variable(v),
        Ast::MetaVariable(m) => display_meta_variable(m),
        Ast::Application(head, argument) => json!({
            "application": {
                "head": display_ast(head),
                "argument": display_ast(argument),
            }
        }),
        Ast::Lambda(bound, ty, scope) => json!({
            "lambda": {
                "bound": display_variable(bound),
                "type": display_ast(ty),
                "scope": display_ast(scope),
            }
        }),
        Ast::Pi(bound, ty, scope) => json!({
            "pi": {
                "bound": display_variable(bound),
                "type": display_ast(ty),
                "scope": display_ast(scope),
            }
        }),
    }
}

pub fn display_sort(sort: &Sort) -> Value {
    match sort {
        Sort::Kind => json!("Kind"),
        Sort::Term(term) => display_ast(term),
    }
}

pub fn display_sort_error(error: &SortError) -> Value {
    match error {
        SortError::UndeclaredConstant(c) => json!({
            "error": "UndeclaredConstant",
            "id": display_constant(c),
        }),
        SortError::UndeclaredVariable(v) => json!({
            "error": "UndeclaredVariable",
            "id": display_variable(v),
        }),
        SortError::UndeclaredMetaVariable(m) => json!({
            "error": "UndeclaredMetaVariable",
            "id": display_meta_variable(m),
        }),
        SortError::RedeclaredVariable(v) => json!({
            "error": "RedeclaredVariable",
            "id": display_variable(v),
        }),
        SortError::FailedCheck {
            subject,
            expected,
            actual,
        } => json!({
            "error": "FailedCheck",
            "subject": display_ast(subject),
            "expected": display_sort(expected),
            "actual": display_sort(actual),
        }),
        SortError::FailedCheckPi { subject, actual } => json!({
            "error": "FailedCheckPi",
            "subject": display_ast(subject),
            "actual": display_sort(actual),
        }),
        SortError::FailedCheckObjectOrFamily { subject, actual } => json!({
            "error": "FailedCheckObjectOrFamily",
            "subject": display_ast(subject),
            "actual": display_sort(actual),
        }),
        SortError::FailedCheckFamilyOrKind { subject, actual } => json!({
            "error": "FailedCheckFamilyOrKind",
            "subject": display_ast(subject),
            "actual": display_sort(actual),
        }),
        SortError::BadChildSort {
            subject,
            child_error,
        } => json!({
            "error": "BadChildSort",
            "subject": display_ast(subject),
            "child": display_sort_error(child_error),
        }),
    }
}

pub fn display_failed_ctx_check(error: &FailedCtxCheck) -> Value {
    match error {
        FailedCtxCheck::RedeclaredVariable(v) => json!({
            "error": "RedeclaredVariable",
            "id": display_variable(v),
        }),
        FailedCtxCheck::BadEntry { id, sort_error } => json!({
            "error": "BadEntry",
            "id": display_variable(id),
            "cause": display_sort_error(sort_error),
        }),
    }
}

pub fn display_failed_sig_check(error: &FailedSigCheck) -> Value {
    match error {
        FailedSigCheck::RedeclaredConstant(key) => json!({
            "error": "RedeclaredConstant",
            "id": display_sig_key(key),
        }),
        FailedSigCheck::BadEntry { id, sort_error } => json!({
            "error": "BadEntry",
            "id": display_sig_key(id),
            "cause": display_sort_error(sort_error),
        }),
    }
}

pub fn display_failed_meta_ctx_check(error: &FailedMetaCtxCheck) -> Value {
    match error {
        FailedMetaCtxCheck::RedeclaredMetaVariable(m) => json!({
            "error": "RedeclaredMetaVariable",
            "id": display_meta_variable(m),
        }),
        FailedMetaCtxCheck::BadEntry { id, sort_error } => json!({
            "error": "BadEntry",
            "id": display_meta_variable(id),
            "cause": display_sort_error(sort_error),
        }),
    }
}

pub fn display_failed_env_check(error: &FailedEnvCheck) -> Value {
    match error {
        FailedEnvCheck::Sig(e) => display_failed_sig_check(e),
        FailedEnvCheck::Ctx(e) => display_failed_ctx_check(e),
        FailedEnvCheck::MetaCtx(e) => display_failed_meta_ctx_check(e),
    }
}

pub fn display_ctx_incompatibility(error: &CtxIncompatibility) -> Value {
    json!({
        "error": "CtxIncompatibility",
        "id": display_variable(&error.id),
        "left": display_ast(&error.left),
        "right": display_ast(&error.right),
    })
}

/// Entries oldest first, as `{"id": .., "sort": ..}` objects.
pub fn display_ctx(ctx: &Ctx) -> Value {
    Value::Array(
        ctx.entries()
            .into_iter()
            .map(|(id, sort)| json!({ "id": display_variable(id), "sort": display_ast(sort) }))
            .collect(),
    )
}

pub fn display_meta_ctx(meta_ctx: &MetaCtx) -> Value {
    Value::Array(
        meta_ctx
            .entries()
            .into_iter()
            .map(|(id, sort)| json!({ "id": display_meta_variable(id), "sort": display_ast(sort) }))
            .collect(),
    )
}

pub fn display_sig(sig: &Sig) -> Value {
    Value::Array(
        sig.entries()
            .into_iter()
            .map(|(key, sort)| json!({ "id": display_sig_key(key), "sort": display_ast(sort) }))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_atoms() {
        assert_eq!(display_ast(&Ast::TypeKind), json!("Type"));
        assert_eq!(display_ast(&Ast::natural_number(42)), json!(42));
        assert_eq!(display_ast(&Ast::constant("nat")), json!("nat"));
        assert_eq!(display_ast(&Ast::meta_variable("m_3")), json!("m_3"));
        assert_eq!(display_sort(&Sort::Kind), json!("Kind"));
    }

    #[test]
    fn test_display_nested_error() {
        let app = Ast::app(Ast::constant("f"), Ast::variable("y"));
        let err = SortError::bad_child(&app, SortError::UndeclaredVariable(Variable::new("y")));
        assert_eq!(
            display_sort_error(&err),
            json!({
                "error": "BadChildSort",
                "subject": {"application": {"head": "f", "argument": "y"}},
                "child": {"error": "UndeclaredVariable", "id": "y"},
            })
        );
    }

    #[test]
    fn test_display_natural_numbers_key() {
        assert_eq!(display_sig_key(&SigKey::NaturalNumbers), json!("<natural numbers>"));
    }
}
