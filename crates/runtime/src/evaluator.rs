//! Evaluator
//!
//! Evaluates rulesets, tasks and challenges of one loaded DAR. Executable
//! trees are built on first use and shared afterwards; the context and the
//! trees are immutable, so an `Evaluator` can serve concurrent requests.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, instrument};

use crate::ast::{AstBuilder, ExecutableNode};
use crate::context::{ChallengeKey, DarRuntimeContext, RulesetKey, TaskKey};
use crate::error::Result;
use crate::evidence::EvidenceSource;

/// Result of evaluating one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub key: TaskKey,
    pub passed: bool,
    /// `emit` values of the actions that fired, in declared order.
    pub emitted: Vec<String>,
}

/// Result of evaluating a challenge: one outcome per task, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeOutcome {
    pub key: ChallengeKey,
    pub tasks: Vec<TaskOutcome>,
}

impl ChallengeOutcome {
    /// Whether every task passed.
    pub fn passed(&self) -> bool {
        self.tasks.iter().all(|t| t.passed)
    }
}

pub struct Evaluator {
    context: Arc<DarRuntimeContext>,
    trees: RwLock<HashMap<RulesetKey, Arc<ExecutableNode>>>,
}

impl Evaluator {
    pub fn new(context: Arc<DarRuntimeContext>) -> Self {
        Self {
            context,
            trees: RwLock::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &DarRuntimeContext {
        &self.context
    }

    /// The executable tree of a ruleset, built on first request.
    pub fn tree(&self, key: &RulesetKey) -> Result<Arc<ExecutableNode>> {
        if let Some(tree) = self
            .trees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(Arc::clone(tree));
        }

        let tree = Arc::new(AstBuilder::new(&self.context).build(key)?);
        debug!(ruleset = %key, nodes = tree.size(), "executable tree built");
        let mut trees = self.trees.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(trees.entry(key.clone()).or_insert(tree)))
    }

    /// Evaluate the ruleset at `key`.
    #[instrument(skip(self, evidence), fields(ruleset = %key))]
    pub fn evaluate<E: EvidenceSource + ?Sized>(&self, key: &RulesetKey, evidence: &E) -> Result<bool> {
        let result = self.tree(key)?.evaluate(evidence)?;
        debug!(result, "ruleset evaluated");
        Ok(result)
    }

    /// Evaluate a task's ruleset and fire its actions.
    pub fn evaluate_task<E: EvidenceSource + ?Sized>(&self, key: &TaskKey, evidence: &E) -> Result<TaskOutcome> {
        let task = self.context.task(key)?;
        let passed = self.evaluate(&RulesetKey::from(&task.ruleset_ref), evidence)?;
        let emitted = task
            .actions
            .iter()
            .filter(|action| action.on.fires(passed))
            .map(|action| action.emit.clone())
            .collect();
        Ok(TaskOutcome {
            key: key.clone(),
            passed,
            emitted,
        })
    }

    /// Evaluate every task of a challenge in declared order.
    #[instrument(skip(self, evidence), fields(challenge = %key))]
    pub fn evaluate_challenge<E: EvidenceSource + ?Sized>(
        &self,
        key: &ChallengeKey,
        evidence: &E,
    ) -> Result<ChallengeOutcome> {
        let challenge = self.context.challenge(key)?;
        let tasks = challenge
            .tasks
            .iter()
            .map(|task| self.evaluate_task(&TaskKey::from(task), evidence))
            .collect::<Result<Vec<_>>>()?;
        let outcome = ChallengeOutcome {
            key: key.clone(),
            tasks,
        };
        debug!(passed = outcome.passed(), "challenge evaluated");
        Ok(outcome)
    }
}
