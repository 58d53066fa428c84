//! Kernel of a Lambda-Pi logical framework: terms, capture-avoiding
//! substitution, equality oracles, normalization and a bidirectional sort
//! checker over signatures, contexts and meta-contexts.

pub mod assoc;
pub mod ast;
pub mod checker;
pub mod context;
pub mod display;
pub mod equality;
pub mod error;
pub mod normalize;
pub mod subst;
#[doc(hidden)]
pub mod test_support;

pub use ast::*;
pub use checker::{check, check_and_report, check_ctx_and_report, check_env, check_meta_ctx, check_sig, synthesize};
pub use context::{ctx_union, Ctx, CtxIncompatibility, Env, MetaCtx, Sig, SigKey};
pub use equality::{
    alpha_equality, alpha_equivalent, beta_eta_delta_equality, beta_eta_equality, sort_equality, syntactic_equality,
    Definitions,
};
pub use error::{FailedCtxCheck, FailedEnvCheck, FailedMetaCtxCheck, FailedSigCheck, SortError};
pub use normalize::{to_beta_normal_form, to_weak_head_normal_form};
pub use subst::{free_variables, meta_variables, new_meta_variable, new_variable, substitute};
