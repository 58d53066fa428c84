use crate::ast::{Ast, Constant, MetaVariable, Sort, Variable};
use crate::context::SigKey;
use std::sync::Arc;
use thiserror::Error;

/// Why a term failed to sort-check.
///
/// Failures below the root are wrapped in `BadChildSort` at every parent, so
/// the error is a trace from the failure site up to the checked term.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("undeclared constant {0}")]
    UndeclaredConstant(Constant),
    #[error("undeclared variable {0}")]
    UndeclaredVariable(Variable),
    #[error("undeclared meta-variable {0}")]
    UndeclaredMetaVariable(MetaVariable),
    #[error("variable {0} is already declared")]
    RedeclaredVariable(Variable),
    #[error("{subject} has sort {actual}, expected {expected}")]
    FailedCheck {
        subject: Arc<Ast>,
        expected: Sort,
        actual: Sort,
    },
    #[error("{subject} has sort {actual}, expected a Pi type")]
    FailedCheckPi { subject: Arc<Ast>, actual: Sort },
    #[error("{subject} has sort {actual}, expected an object or a family")]
    FailedCheckObjectOrFamily { subject: Arc<Ast>, actual: Sort },
    #[error("{subject} has sort {actual}, expected a family or a kind")]
    FailedCheckFamilyOrKind { subject: Arc<Ast>, actual: Sort },
    #[error("ill-sorted subterm of {subject}")]
    BadChildSort {
        subject: Arc<Ast>,
        #[source]
        child_error: Box<SortError>,
    },
}

impl SortError {
    pub fn bad_child(subject: &Arc<Ast>, child_error: SortError) -> Self {
        SortError::BadChildSort {
            subject: subject.clone(),
            child_error: Box::new(child_error),
        }
    }

    /// The innermost error, below every `BadChildSort` wrapper.
    pub fn root_cause(&self) -> &SortError {
        let mut current = self;
        while let SortError::BadChildSort { child_error, .. } = current {
            current = &**child_error;
        }
        current
    }

    /// Number of `BadChildSort` wrappers above the root cause.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let SortError::BadChildSort { child_error, .. } = current {
            depth += 1;
            current = &**child_error;
        }
        depth
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailedCtxCheck {
    #[error("variable {0} is declared more than once")]
    RedeclaredVariable(Variable),
    #[error("bad context entry for {id}")]
    BadEntry {
        id: Variable,
        #[source]
        sort_error: SortError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailedSigCheck {
    #[error("{0} is declared more than once")]
    RedeclaredConstant(SigKey),
    #[error("bad signature entry for {id}")]
    BadEntry {
        id: SigKey,
        #[source]
        sort_error: SortError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailedMetaCtxCheck {
    #[error("meta-variable {0} is declared more than once")]
    RedeclaredMetaVariable(MetaVariable),
    #[error("bad meta-context entry for {id}")]
    BadEntry {
        id: MetaVariable,
        #[source]
        sort_error: SortError,
    },
}

/// First failure found when validating a whole environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailedEnvCheck {
    #[error(transparent)]
    Sig(#[from] FailedSigCheck),
    #[error(transparent)]
    Ctx(#[from] FailedCtxCheck),
    #[error(transparent)]
    MetaCtx(#[from] FailedMetaCtxCheck),
}
