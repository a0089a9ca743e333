//! Executable rule trees
//!
//! [`AstBuilder`] turns the stored expression tree of a ruleset into an
//! [`ExecutableNode`] tree with every referenced rule resolved. Evaluation
//! follows a two-valued policy over missing evidence:
//!
//! - **AND** returns `false` at the first child that is `false` *or* whose
//!   evidence is missing; later children are not evaluated.
//! - **OR** returns `true` at the first child that is `true`; a child whose
//!   evidence is missing counts as `false` and evaluation continues.
//!
//! So [`Error::MissingEvidence`] only reaches the caller when the root is a
//! bare rule. Every other error is fatal and propagates unchanged.

use banyan_foundation::{CompiledRule, LogicalOperator, RulesetExpression};
use tracing::trace;

use crate::context::{DarRuntimeContext, RuleKey, RulesetKey};
use crate::error::{Error, Result};
use crate::evidence::EvidenceSource;
use crate::operators::Operator;

/// Leaf: one resolved rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    pub key: RuleKey,
    pub rule: CompiledRule,
}

impl RuleNode {
    pub fn evaluate<E: EvidenceSource + ?Sized>(&self, evidence: &E) -> Result<bool> {
        let input = self.rule.input.as_str();
        let actual = evidence
            .get(input)
            .ok_or_else(|| Error::MissingEvidence(input.to_string()))?;
        let result = Operator::parse(&self.rule.operator)?.apply(input, actual, &self.rule.value)?;
        trace!(rule = %self.key, %actual, result, "rule evaluated");
        Ok(result)
    }
}

/// Internal node: an operator over ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalNode {
    pub operator: LogicalOperator,
    pub children: Vec<ExecutableNode>,
}

impl LogicalNode {
    pub fn evaluate<E: EvidenceSource + ?Sized>(&self, evidence: &E) -> Result<bool> {
        match self.operator {
            LogicalOperator::And => {
                for child in &self.children {
                    match child.evaluate(evidence) {
                        Ok(true) => {}
                        Ok(false) => return Ok(false),
                        Err(err) if err.is_missing_evidence() => {
                            trace!(error = %err, "missing evidence defeats AND");
                            return Ok(false);
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(true)
            }
            LogicalOperator::Or => {
                for child in &self.children {
                    match child.evaluate(evidence) {
                        Ok(true) => return Ok(true),
                        Ok(false) => {}
                        Err(err) if err.is_missing_evidence() => {
                            trace!(error = %err, "missing evidence skipped in OR");
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(false)
            }
        }
    }
}

/// A node of an executable rule tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableNode {
    Rule(RuleNode),
    Logical(LogicalNode),
}

impl ExecutableNode {
    pub fn evaluate<E: EvidenceSource + ?Sized>(&self, evidence: &E) -> Result<bool> {
        match self {
            ExecutableNode::Rule(node) => node.evaluate(evidence),
            ExecutableNode::Logical(node) => node.evaluate(evidence),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            ExecutableNode::Rule(_) => 1,
            ExecutableNode::Logical(node) => 1 + node.children.iter().map(Self::size).sum::<usize>(),
        }
    }
}

/// Builds executable trees from a runtime context.
pub struct AstBuilder<'a> {
    context: &'a DarRuntimeContext,
}

impl<'a> AstBuilder<'a> {
    pub fn new(context: &'a DarRuntimeContext) -> Self {
        Self { context }
    }

    /// Build the tree of the ruleset at `key`.
    pub fn build(&self, key: &RulesetKey) -> Result<ExecutableNode> {
        let ruleset = self.context.ruleset(key)?;
        self.build_expression(&ruleset.root)
    }

    /// Map an expression, resolving each rule reference by its own version.
    pub fn build_expression(&self, expression: &RulesetExpression) -> Result<ExecutableNode> {
        match expression {
            RulesetExpression::RuleRef { rule_id, version } => {
                let key = RuleKey::new(rule_id.clone(), *version);
                let rule = self.context.rule(&key)?.clone();
                Ok(ExecutableNode::Rule(RuleNode { key, rule }))
            }
            RulesetExpression::Logical { operator, operands } => {
                let children = operands
                    .iter()
                    .map(|operand| self.build_expression(operand))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ExecutableNode::Logical(LogicalNode {
                    operator: *operator,
                    children,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{EvidenceContext, EvidenceValue};
    use banyan_foundation::dar::ManifestHeader;
    use banyan_foundation::{
        ArtifactPayload, CompilationMetadata, CompiledArtifact, CompiledRuleset, RuleValue,
    };
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Evidence that records every field lookup.
    struct RecordingEvidence {
        values: HashMap<String, EvidenceValue>,
        lookups: RefCell<Vec<String>>,
    }

    impl RecordingEvidence {
        fn new(values: &[(&str, i64)]) -> Self {
            Self {
                values: values
                    .iter()
                    .map(|(k, v)| (k.to_string(), EvidenceValue::Integer(*v)))
                    .collect(),
                lookups: RefCell::new(Vec::new()),
            }
        }

        fn looked_up(&self, field: &str) -> bool {
            self.lookups.borrow().iter().any(|f| f == field)
        }
    }

    impl EvidenceSource for RecordingEvidence {
        fn get(&self, field: &str) -> Option<&EvidenceValue> {
            self.lookups.borrow_mut().push(field.to_string());
            self.values.get(field)
        }
    }

    /// `input > 0`, keyed by the input name.
    fn positive(input: &str) -> ExecutableNode {
        ExecutableNode::Rule(RuleNode {
            key: RuleKey::new(input, 1),
            rule: CompiledRule {
                input: input.into(),
                operator: ">".into(),
                value: RuleValue::Integer(0),
                rule_type: "THRESHOLD".into(),
            },
        })
    }

    fn logical(operator: LogicalOperator, children: Vec<ExecutableNode>) -> ExecutableNode {
        ExecutableNode::Logical(LogicalNode { operator, children })
    }

    #[test]
    fn and_all_true() {
        let tree = logical(LogicalOperator::And, vec![positive("a"), positive("b")]);
        let evidence = RecordingEvidence::new(&[("a", 1), ("b", 1)]);
        assert!(tree.evaluate(&evidence).unwrap());
    }

    #[test]
    fn and_short_circuits_on_false() {
        let tree = logical(
            LogicalOperator::And,
            vec![positive("a"), positive("b"), positive("c")],
        );
        let evidence = RecordingEvidence::new(&[("a", 1), ("b", 0), ("c", 1)]);

        assert!(!tree.evaluate(&evidence).unwrap());
        assert!(evidence.looked_up("b"));
        assert!(!evidence.looked_up("c"));
    }

    #[test]
    fn and_is_defeated_by_missing_evidence() {
        let tree = logical(LogicalOperator::And, vec![positive("absent"), positive("c")]);
        let evidence = RecordingEvidence::new(&[("c", 1)]);

        assert!(!tree.evaluate(&evidence).unwrap());
        assert!(!evidence.looked_up("c"));
    }

    #[test]
    fn or_swallows_missing_evidence() {
        let tree = logical(LogicalOperator::Or, vec![positive("absent"), positive("b")]);
        let evidence = RecordingEvidence::new(&[("b", 1)]);
        assert!(tree.evaluate(&evidence).unwrap());
    }

    #[test]
    fn or_all_false() {
        let tree = logical(LogicalOperator::Or, vec![positive("a"), positive("b")]);
        let evidence = RecordingEvidence::new(&[("a", 0), ("b", 0)]);
        assert!(!tree.evaluate(&evidence).unwrap());
    }

    #[test]
    fn or_short_circuits_on_true() {
        let tree = logical(LogicalOperator::Or, vec![positive("a"), positive("b")]);
        let evidence = RecordingEvidence::new(&[("a", 1), ("b", 1)]);
        assert!(tree.evaluate(&evidence).unwrap());
        assert!(!evidence.looked_up("b"));
    }

    #[test]
    fn bare_rule_propagates_missing_evidence() {
        let err = positive("count").evaluate(&EvidenceContext::empty()).unwrap_err();
        assert!(matches!(err, Error::MissingEvidence(field) if field == "count"));
    }

    #[test]
    fn nested_logical_absorbs_missing_evidence() {
        let tree = logical(
            LogicalOperator::Or,
            vec![
                logical(LogicalOperator::And, vec![positive("absent")]),
                positive("b"),
            ],
        );
        let evidence = RecordingEvidence::new(&[("b", 1)]);
        assert!(tree.evaluate(&evidence).unwrap());
    }

    #[test]
    fn fatal_errors_are_not_absorbed() {
        let mut bad = positive("a");
        if let ExecutableNode::Rule(node) = &mut bad {
            node.rule.operator = "=~".into();
        }
        let tree = logical(LogicalOperator::Or, vec![bad, positive("b")]);
        let evidence = RecordingEvidence::new(&[("a", 1), ("b", 1)]);
        assert!(matches!(tree.evaluate(&evidence), Err(Error::UnsupportedOperator(_))));

        let text: EvidenceContext = [("a", "many")].into_iter().collect();
        let tree = logical(LogicalOperator::And, vec![positive("a")]);
        assert!(matches!(
            tree.evaluate(&text),
            Err(Error::InvalidEvidenceType { .. })
        ));
    }

    fn artifact(id: &str, version: u32, payload: ArtifactPayload) -> CompiledArtifact {
        CompiledArtifact::new(
            id,
            version,
            CompilationMetadata {
                compiler_version: "test".into(),
                compiled_at_epoch_millis: 0,
                content_hash: String::new(),
            },
            Vec::new(),
            payload,
        )
    }

    fn rule(input: &str, threshold: i64) -> ArtifactPayload {
        ArtifactPayload::Rule(CompiledRule {
            input: input.into(),
            operator: ">".into(),
            value: RuleValue::Integer(threshold),
            rule_type: "THRESHOLD".into(),
        })
    }

    #[test]
    fn builder_resolves_rules_by_their_own_version() {
        let mut builder = DarRuntimeContext::builder(ManifestHeader {
            root_id: "c1".into(),
            root_version: 1,
            compiled_at_epoch_millis: 0,
            compiler_version: "test".into(),
        });
        builder
            .insert(artifact("r1", 1, rule("count", 3)))
            .insert(artifact("r1", 2, rule("count", 10)))
            .insert(artifact(
                "rs1",
                1,
                ArtifactPayload::Ruleset(CompiledRuleset {
                    root: RulesetExpression::logical(
                        LogicalOperator::And,
                        vec![
                            RulesetExpression::rule_ref("r1", 1),
                            RulesetExpression::rule_ref("r1", 2),
                        ],
                    ),
                }),
            ));
        let ctx = builder.build();

        let tree = AstBuilder::new(&ctx).build(&RulesetKey::new("rs1", 1)).unwrap();
        assert_eq!(tree.size(), 3);
        let ExecutableNode::Logical(node) = &tree else {
            panic!("expected logical root");
        };
        let thresholds: Vec<_> = node
            .children
            .iter()
            .map(|child| match child {
                ExecutableNode::Rule(rule) => rule.rule.value.clone(),
                ExecutableNode::Logical(_) => panic!("expected rule"),
            })
            .collect();
        assert_eq!(thresholds, [RuleValue::Integer(3), RuleValue::Integer(10)]);

        assert!(AstBuilder::new(&ctx).build(&RulesetKey::new("rs9", 1)).is_err());
    }

    #[test]
    fn builder_fails_on_dangling_rule() {
        let mut builder = DarRuntimeContext::builder(ManifestHeader {
            root_id: "c1".into(),
            root_version: 1,
            compiled_at_epoch_millis: 0,
            compiler_version: "test".into(),
        });
        builder.insert(artifact(
            "rs1",
            1,
            ArtifactPayload::Ruleset(CompiledRuleset {
                root: RulesetExpression::rule_ref("gone", 1),
            }),
        ));
        let ctx = builder.build();
        assert!(matches!(
            AstBuilder::new(&ctx).build(&RulesetKey::new("rs1", 1)),
            Err(Error::ArtifactNotFound { .. })
        ));
    }
}
