//! Banyan Runtime
//!
//! Loads DAR archives and evaluates their rulesets against evidence.
//!
//! A [`DarLoader`] turns an archive into an immutable [`DarRuntimeContext`];
//! an [`Evaluator`] builds executable trees from it and evaluates them. The
//! [`DarRuntimeStore`] keeps loaded contexts for reuse across requests.

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod evidence;
pub mod loader;
pub mod operators;
pub mod store;

pub use ast::{AstBuilder, ExecutableNode, LogicalNode, RuleNode};
pub use config::StoreConfig;
pub use context::{
    ChallengeKey, DarRuntimeContext, DarRuntimeContextBuilder, EvidenceTypeKey, RuleKey,
    RulesetKey, TaskKey,
};
pub use error::{Error, Result};
pub use evaluator::{ChallengeOutcome, Evaluator, TaskOutcome};
pub use evidence::{EvidenceContext, EvidenceSource, EvidenceValue};
pub use loader::DarLoader;
pub use operators::Operator;
pub use store::{DarId, DarRuntimeStore};
