//! Narrative function classification
//!
//! The pipeline needs a narrative function and necessity score for every
//! fragment. Graded fragments carry both already; for the rest there is an
//! async [`NarrativeFunctionSource`] boundary (normally backed by a remote
//! text classifier) with [`LexicalClassifier`] as the deterministic local
//! fallback. Resolution happens once, up front — nothing inside the
//! synchronous pipeline suspends.

use crate::error::{PipelineError, PipelineResult};
use crate::fragment::{Fragment, FragmentId, FragmentRejection, NarrativeFunction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-fragment narrative assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionAssessment {
    pub function: NarrativeFunction,
    /// How necessary the fragment is to the narrative, 0-1
    pub necessity: f64,
    /// What the work would lose if this fragment were removed
    pub removal_impact: String,
}

/// Source of narrative function assessments
///
/// Implementations may call out to a remote classifier; the local fallback
/// is [`LexicalClassifier`]. Resolution must complete before the synchronous
/// pipeline runs.
#[async_trait]
pub trait NarrativeFunctionSource: Send + Sync {
    async fn assess(&self, fragment: &Fragment) -> PipelineResult<FunctionAssessment>;
}

/// Resolved assessments plus any recorded classifier failures
#[derive(Debug, Clone, Default)]
pub struct ResolvedFunctions {
    pub assessments: BTreeMap<FragmentId, FunctionAssessment>,
    pub failures: Vec<FragmentRejection>,
}

impl ResolvedFunctions {
    /// Function for a fragment, `Undetermined` when nothing resolved
    pub fn function_of(&self, id: &FragmentId) -> NarrativeFunction {
        self.assessments
            .get(id)
            .map(|a| a.function)
            .unwrap_or(NarrativeFunction::Undetermined)
    }

    /// Necessity for a fragment, defaulting to 0.5 when nothing resolved
    pub fn necessity_of(&self, id: &FragmentId) -> f64 {
        self.assessments.get(id).map(|a| a.necessity).unwrap_or(0.5)
    }
}

/// Resolve narrative functions for a fragment set
///
/// Supplied grades are authoritative and never re-classified. Fragments
/// without a grade go through `source`; a source failure marks the fragment
/// `Undetermined` and records the failure — it is never silently replaced
/// with a guess.
pub async fn resolve_functions(
    source: &dyn NarrativeFunctionSource,
    fragments: &[Fragment],
) -> ResolvedFunctions {
    let mut resolved = ResolvedFunctions::default();
    for fragment in fragments {
        if let Some(grade) = fragment.grade {
            resolved.assessments.insert(
                fragment.id.clone(),
                FunctionAssessment {
                    function: grade.function,
                    necessity: grade.necessity.clamp(0.0, 1.0),
                    removal_impact: "graded externally".to_string(),
                },
            );
            continue;
        }
        match source.assess(fragment).await {
            Ok(assessment) => {
                resolved.assessments.insert(fragment.id.clone(), assessment);
            }
            Err(e) => {
                debug!(fragment = %fragment.id, error = %e, "classifier failed");
                resolved.assessments.insert(
                    fragment.id.clone(),
                    FunctionAssessment {
                        function: NarrativeFunction::Undetermined,
                        necessity: 0.5,
                        removal_impact: "not assessed".to_string(),
                    },
                );
                resolved.failures.push(FragmentRejection {
                    fragment_id: fragment.id.clone(),
                    reason: format!("classifier failed: {}", e),
                });
            }
        }
    }
    resolved
}

/// Cue phrases per narrative function, checked in fixed order
const CUE_TABLE: &[(NarrativeFunction, &[&str])] = &[
    (
        NarrativeFunction::Setup,
        &[
            "it began",
            "at first",
            "first met",
            "arrived",
            "introduce",
            "little did",
            "would later",
            "for the first time",
        ],
    ),
    (
        NarrativeFunction::Payoff,
        &[
            "finally",
            "at last",
            "realized",
            "revealed",
            "it all made sense",
            "in the end",
            "came to pass",
            "paid off",
        ],
    ),
    (
        NarrativeFunction::Characterization,
        &[
            "always",
            "never could",
            "believed",
            "felt that",
            "the kind of",
            "her way of",
            "his way of",
            "typical of",
        ],
    ),
    (
        NarrativeFunction::Worldbuilding,
        &[
            "in this world",
            "the city",
            "the village",
            "custom",
            "tradition",
            "history of",
            "the law",
            "founded",
        ],
    ),
    (
        NarrativeFunction::Atmosphere,
        &[
            "the air",
            "the light",
            "silence",
            "the smell",
            "shadows",
            "the cold",
            "the warmth",
            "mist",
        ],
    ),
    (
        NarrativeFunction::Transition,
        &[
            "later that",
            "meanwhile",
            "the next day",
            "afterwards",
            "by the time",
            "weeks passed",
            "years later",
            "on the way",
        ],
    ),
];

/// Local, deterministic narrative classifier
///
/// Counts cue-phrase hits per category over lowercased text; the highest
/// count wins, ties going to the category listed first in the cue table.
/// No hits at all classifies as `Dispensable`.
#[derive(Debug, Clone, Default)]
pub struct LexicalClassifier;

impl LexicalClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a piece of text
    pub fn classify(&self, text: &str) -> FunctionAssessment {
        let lowered = text.to_lowercase();
        let mut best: Option<(NarrativeFunction, usize)> = None;
        for (function, cues) in CUE_TABLE {
            let hits: usize = cues.iter().map(|cue| lowered.matches(cue).count()).sum();
            if hits > 0 && best.map(|(_, b)| hits > b).unwrap_or(true) {
                best = Some((*function, hits));
            }
        }

        match best {
            Some((function, hits)) => FunctionAssessment {
                necessity: (Self::base_necessity(function)
                    + 0.05 * hits.min(4) as f64)
                    .clamp(0.0, 1.0),
                removal_impact: Self::removal_impact(function).to_string(),
                function,
            },
            None => FunctionAssessment {
                function: NarrativeFunction::Dispensable,
                necessity: 0.15,
                removal_impact: "no structural role detected; removal is low risk".to_string(),
            },
        }
    }

    fn base_necessity(function: NarrativeFunction) -> f64 {
        match function {
            NarrativeFunction::Setup => 0.65,
            NarrativeFunction::Payoff => 0.75,
            NarrativeFunction::Characterization => 0.55,
            NarrativeFunction::Worldbuilding => 0.5,
            NarrativeFunction::Atmosphere => 0.3,
            NarrativeFunction::Transition => 0.35,
            NarrativeFunction::Dispensable | NarrativeFunction::Undetermined => 0.15,
        }
    }

    fn removal_impact(function: NarrativeFunction) -> &'static str {
        match function {
            NarrativeFunction::Setup => "later payoffs would lose their grounding",
            NarrativeFunction::Payoff => "an established setup would go unresolved",
            NarrativeFunction::Characterization => "a character would become flatter",
            NarrativeFunction::Worldbuilding => "the setting would lose definition",
            NarrativeFunction::Atmosphere => "the scene would lose sensory texture",
            NarrativeFunction::Transition => "adjacent scenes would jump abruptly",
            NarrativeFunction::Dispensable | NarrativeFunction::Undetermined => {
                "no structural role detected; removal is low risk"
            }
        }
    }
}

#[async_trait]
impl NarrativeFunctionSource for LexicalClassifier {
    async fn assess(&self, fragment: &Fragment) -> PipelineResult<FunctionAssessment> {
        Ok(self.classify(&fragment.text))
    }
}

/// A source that always fails; used to exercise the failure path
#[cfg(test)]
pub(crate) struct UnavailableSource;

#[cfg(test)]
#[async_trait]
impl NarrativeFunctionSource for UnavailableSource {
    async fn assess(&self, _fragment: &Fragment) -> PipelineResult<FunctionAssessment> {
        Err(PipelineError::Classifier("service unreachable".to_string()))
    }
}
