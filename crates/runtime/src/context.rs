//! Runtime context
//!
//! The in-memory image of one loaded DAR: one mapping per artifact kind,
//! each keyed by `(version, id)`. Populated once by the loader and
//! read-only afterwards. Lookups of absent keys fail; nothing is loaded
//! lazily.

use std::collections::HashMap;
use std::fmt;

use banyan_foundation::dar::ManifestHeader;
use banyan_foundation::{
    ArtifactKind, CompiledArtifact, CompiledChallenge, CompiledEvidenceType, CompiledRule,
    CompiledRuleset, CompiledTask, VersionedId,
};

use crate::error::{Error, Result};

macro_rules! runtime_key {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            pub version: u32,
            pub id: String,
        }

        impl $name {
            pub const KIND: ArtifactKind = $kind;

            pub fn new(id: impl Into<String>, version: u32) -> Self {
                Self {
                    version,
                    id: id.into(),
                }
            }

            fn not_found(&self) -> Error {
                Error::ArtifactNotFound {
                    kind: Self::KIND,
                    id: self.id.clone(),
                    version: self.version,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}@{}", self.id, self.version)
            }
        }

        impl From<&VersionedId> for $name {
            fn from(reference: &VersionedId) -> Self {
                Self::new(reference.id.clone(), reference.version)
            }
        }
    };
}

runtime_key!(
    /// Key of a loaded challenge
    ChallengeKey => ArtifactKind::Challenge
);
runtime_key!(
    /// Key of a loaded task
    TaskKey => ArtifactKind::Task
);
runtime_key!(
    /// Key of a loaded ruleset
    RulesetKey => ArtifactKind::Ruleset
);
runtime_key!(
    /// Key of a loaded rule
    RuleKey => ArtifactKind::Rule
);
runtime_key!(
    /// Key of a loaded evidence type
    EvidenceTypeKey => ArtifactKind::EvidenceType
);

/// Every artifact of one DAR, by kind.
#[derive(Debug, Clone)]
pub struct DarRuntimeContext {
    header: ManifestHeader,
    challenges: HashMap<ChallengeKey, CompiledArtifact>,
    tasks: HashMap<TaskKey, CompiledArtifact>,
    rulesets: HashMap<RulesetKey, CompiledArtifact>,
    rules: HashMap<RuleKey, CompiledArtifact>,
    evidence_types: HashMap<EvidenceTypeKey, CompiledArtifact>,
}

impl DarRuntimeContext {
    pub fn builder(header: ManifestHeader) -> DarRuntimeContextBuilder {
        DarRuntimeContextBuilder {
            context: DarRuntimeContext {
                header,
                challenges: HashMap::new(),
                tasks: HashMap::new(),
                rulesets: HashMap::new(),
                rules: HashMap::new(),
                evidence_types: HashMap::new(),
            },
        }
    }

    /// Identity of the archive this context was loaded from.
    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    /// The root challenge named by the manifest.
    pub fn root_key(&self) -> ChallengeKey {
        ChallengeKey::new(self.header.root_id.clone(), self.header.root_version)
    }

    pub fn challenge(&self, key: &ChallengeKey) -> Result<&CompiledChallenge> {
        self.challenges
            .get(key)
            .and_then(|a| a.payload().as_challenge())
            .ok_or_else(|| key.not_found())
    }

    pub fn task(&self, key: &TaskKey) -> Result<&CompiledTask> {
        self.tasks
            .get(key)
            .and_then(|a| a.payload().as_task())
            .ok_or_else(|| key.not_found())
    }

    pub fn ruleset(&self, key: &RulesetKey) -> Result<&CompiledRuleset> {
        self.rulesets
            .get(key)
            .and_then(|a| a.payload().as_ruleset())
            .ok_or_else(|| key.not_found())
    }

    pub fn rule(&self, key: &RuleKey) -> Result<&CompiledRule> {
        self.rules
            .get(key)
            .and_then(|a| a.payload().as_rule())
            .ok_or_else(|| key.not_found())
    }

    pub fn evidence_type(&self, key: &EvidenceTypeKey) -> Result<&CompiledEvidenceType> {
        self.evidence_types
            .get(key)
            .and_then(|a| a.payload().as_evidence_type())
            .ok_or_else(|| key.not_found())
    }

    /// The full envelope of any loaded artifact, for provenance inspection.
    pub fn artifact(&self, kind: ArtifactKind, id: &str, version: u32) -> Option<&CompiledArtifact> {
        let id = id.to_string();
        match kind {
            ArtifactKind::Challenge => self.challenges.get(&ChallengeKey::new(id, version)),
            ArtifactKind::Task => self.tasks.get(&TaskKey::new(id, version)),
            ArtifactKind::Ruleset => self.rulesets.get(&RulesetKey::new(id, version)),
            ArtifactKind::Rule => self.rules.get(&RuleKey::new(id, version)),
            ArtifactKind::EvidenceType => self.evidence_types.get(&EvidenceTypeKey::new(id, version)),
        }
    }

    /// All loaded artifacts, in no particular order.
    pub fn artifacts(&self) -> impl Iterator<Item = &CompiledArtifact> {
        self.challenges
            .values()
            .chain(self.tasks.values())
            .chain(self.rulesets.values())
            .chain(self.rules.values())
            .chain(self.evidence_types.values())
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
            + self.tasks.len()
            + self.rulesets.len()
            + self.rules.len()
            + self.evidence_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Populates a [`DarRuntimeContext`]. The context is immutable once built.
#[derive(Debug)]
pub struct DarRuntimeContextBuilder {
    context: DarRuntimeContext,
}

impl DarRuntimeContextBuilder {
    /// Route an artifact into the mapping of its kind.
    pub fn insert(&mut self, artifact: CompiledArtifact) -> &mut Self {
        let id = artifact.id().to_string();
        let version = artifact.version();
        let ctx = &mut self.context;
        match artifact.kind() {
            ArtifactKind::Challenge => {
                ctx.challenges.insert(ChallengeKey::new(id, version), artifact);
            }
            ArtifactKind::Task => {
                ctx.tasks.insert(TaskKey::new(id, version), artifact);
            }
            ArtifactKind::Ruleset => {
                ctx.rulesets.insert(RulesetKey::new(id, version), artifact);
            }
            ArtifactKind::Rule => {
                ctx.rules.insert(RuleKey::new(id, version), artifact);
            }
            ArtifactKind::EvidenceType => {
                ctx.evidence_types.insert(EvidenceTypeKey::new(id, version), artifact);
            }
        }
        self
    }

    pub fn build(self) -> DarRuntimeContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banyan_foundation::{ArtifactPayload, CompilationMetadata, RuleValue, RulesetExpression};

    fn header() -> ManifestHeader {
        ManifestHeader {
            root_id: "c1".into(),
            root_version: 1,
            compiled_at_epoch_millis: 0,
            compiler_version: "test".into(),
        }
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

    #[test]
    fn lookups_are_per_kind_and_version() {
        let mut builder = DarRuntimeContext::builder(header());
        builder
            .insert(artifact(
                "r1",
                2,
                ArtifactPayload::Rule(CompiledRule {
                    input: "count".into(),
                    operator: ">".into(),
                    value: RuleValue::Integer(3),
                    rule_type: "THRESHOLD".into(),
                }),
            ))
            .insert(artifact(
                "r1",
                1,
                ArtifactPayload::Ruleset(CompiledRuleset {
                    root: RulesetExpression::rule_ref("r1", 2),
                }),
            ));
        let ctx = builder.build();

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.rule(&RuleKey::new("r1", 2)).unwrap().input, "count");
        assert!(ctx.rule(&RuleKey::new("r1", 1)).is_err());
        assert!(ctx.ruleset(&RulesetKey::new("r1", 1)).is_ok());
        assert!(matches!(
            ctx.task(&TaskKey::new("r1", 1)),
            Err(Error::ArtifactNotFound { kind: ArtifactKind::Task, .. })
        ));
        assert!(ctx.artifact(ArtifactKind::Rule, "r1", 2).is_some());
        assert_eq!(ctx.root_key(), ChallengeKey::new("c1", 1));
    }

    #[test]
    fn key_display_and_conversion() {
        let key = RulesetKey::from(&VersionedId::new("rs1", 3));
        assert_eq!(key.to_string(), "rs1@3");
        assert_eq!(RulesetKey::KIND, ArtifactKind::Ruleset);
    }
}
