//! Coverage analysis
//!
//! A deterministic rule table over themes, arcs, and mappings that reports
//! weaknesses (gaps) and notable strengths of the harvested material. Rules
//! run in a fixed order so output ordering is stable.

use crate::fragment::FragmentId;
use crate::research::types::{
    ArcPhaseKind, CoverageGap, GapSeverity, NarrativeArc, SourceMapping, Theme,
};
use std::collections::BTreeMap;

/// Gaps and strengths derived from the research structures
#[derive(Debug, Clone, Default)]
pub(crate) struct CoverageReport {
    pub gaps: Vec<CoverageGap>,
    pub strengths: Vec<String>,
}

/// Orphan count above which the gap escalates from minor to moderate
const ORPHAN_MODERATE_FLOOR: usize = 3;
/// Key-passage count worth calling out as a strength
const KEY_PASSAGE_STRENGTH_FLOOR: usize = 3;

/// Run the coverage rule table
pub(crate) fn analyze_coverage(
    fragment_count: usize,
    themes: &[Theme],
    arcs: &[NarrativeArc],
    mappings: &BTreeMap<FragmentId, SourceMapping>,
) -> CoverageReport {
    let mut report = CoverageReport::default();

    if fragment_count == 0 {
        report.gaps.push(CoverageGap {
            theme: "source material".to_string(),
            description: "no fragments were provided".to_string(),
            severity: GapSeverity::Major,
            suggested_action: "harvest source material before outlining".to_string(),
        });
        return report;
    }

    for theme in themes {
        if theme.fragment_ids.len() < 2 {
            report.gaps.push(CoverageGap {
                theme: theme.name.clone(),
                description: format!(
                    "theme '{}' is supported by only {} fragment",
                    theme.name,
                    theme.fragment_ids.len()
                ),
                severity: GapSeverity::Moderate,
                suggested_action: format!("gather more material on '{}'", theme.name),
            });
        }
        if theme.strength >= 0.8 {
            report.strengths.push(format!(
                "theme '{}' is strongly supported ({} fragments)",
                theme.name,
                theme.fragment_ids.len()
            ));
        }
        if theme.average_grade < 3.0 && theme.fragment_ids.len() >= 2 {
            report.gaps.push(CoverageGap {
                theme: theme.name.clone(),
                description: format!(
                    "theme '{}' averages below-par grades ({:.1})",
                    theme.name, theme.average_grade
                ),
                severity: GapSeverity::Minor,
                suggested_action: format!("rework or replace weak fragments in '{}'", theme.name),
            });
        }
    }

    for arc in arcs {
        let present = arc.phase_kinds();
        let missing: Vec<&str> = [
            ArcPhaseKind::Setup,
            ArcPhaseKind::Development,
            ArcPhaseKind::Resolution,
        ]
        .iter()
        .filter(|kind| !present.contains(kind))
        .map(|kind| kind.label())
        .collect();
        if !missing.is_empty() {
            report.gaps.push(CoverageGap {
                theme: arc.name.clone(),
                description: format!(
                    "arc '{}' is missing phases: {}",
                    arc.name,
                    missing.join(", ")
                ),
                severity: if missing.len() >= 2 {
                    GapSeverity::Major
                } else {
                    GapSeverity::Moderate
                },
                suggested_action: format!("draft material for the {} phase", missing.join("/")),
            });
        }
        if arc.completeness >= 0.7 {
            report.strengths.push(format!(
                "arc '{}' is well developed (completeness {:.2})",
                arc.name, arc.completeness
            ));
        }
    }

    let orphans: Vec<&FragmentId> = mappings
        .values()
        .filter(|m| m.theme_ids.is_empty())
        .map(|m| &m.fragment_id)
        .collect();
    if !orphans.is_empty() {
        report.gaps.push(CoverageGap {
            theme: "unthemed material".to_string(),
            description: format!("{} fragments match no theme", orphans.len()),
            severity: if orphans.len() > ORPHAN_MODERATE_FLOOR {
                GapSeverity::Moderate
            } else {
                GapSeverity::Minor
            },
            suggested_action: "review orphaned fragments for a missing theme".to_string(),
        });
    }

    let key_passages = mappings.values().filter(|m| m.key_passage).count();
    if key_passages == 0 {
        report.gaps.push(CoverageGap {
            theme: "key passages".to_string(),
            description: "no fragment qualifies as a key passage".to_string(),
            severity: GapSeverity::Major,
            suggested_action: "identify or grade the pivotal passages".to_string(),
        });
    } else if key_passages >= KEY_PASSAGE_STRENGTH_FLOOR {
        report
            .strengths
            .push(format!("{} key passages anchor the material", key_passages));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::types::{ArcId, ArcPhase, ThemeId};
    use std::collections::BTreeSet;

    fn theme(name: &str, fragment_count: usize, strength: f64, grade: f64) -> Theme {
        Theme {
            id: ThemeId::from_name(name),
            name: name.to_string(),
            keywords: vec![],
            fragment_ids: (0..fragment_count)
                .map(|i| format!("{}-{}", name, i).into())
                .collect(),
            strength,
            average_grade: grade,
            dominant_function: None,
        }
    }

    fn mapping(id: &str, themed: bool, key: bool) -> (FragmentId, SourceMapping) {
        let theme_ids: BTreeSet<ThemeId> = if themed {
            [ThemeId::from_name("t")].into_iter().collect()
        } else {
            BTreeSet::new()
        };
        (
            id.into(),
            SourceMapping {
                fragment_id: id.into(),
                theme_ids,
                relevance: BTreeMap::new(),
                position: None,
                key_passage: key,
            },
        )
    }

    #[test]
    fn test_empty_input_single_major_gap() {
        let report = analyze_coverage(0, &[], &[], &BTreeMap::new());
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].severity, GapSeverity::Major);
        assert!(report.strengths.is_empty());
    }

    #[test]
    fn test_thin_theme_and_strong_theme() {
        let themes = vec![theme("thin", 1, 0.2, 3.5), theme("strong", 5, 0.9, 4.0)];
        let mappings: BTreeMap<_, _> = [mapping("f1", true, true)].into_iter().collect();
        let report = analyze_coverage(5, &themes, &[], &mappings);
        assert!(report
            .gaps
            .iter()
            .any(|g| g.theme == "thin" && g.severity == GapSeverity::Moderate));
        assert!(report.strengths.iter().any(|s| s.contains("strong")));
    }

    #[test]
    fn test_low_grade_theme_minor_gap() {
        let themes = vec![theme("weak", 3, 0.5, 2.2)];
        let mappings: BTreeMap<_, _> = [mapping("f1", true, true)].into_iter().collect();
        let report = analyze_coverage(3, &themes, &[], &mappings);
        assert!(report
            .gaps
            .iter()
            .any(|g| g.theme == "weak" && g.severity == GapSeverity::Minor));
    }

    #[test]
    fn test_arc_missing_phases() {
        let arc = NarrativeArc {
            id: ArcId::from_name("main"),
            name: "main".to_string(),
            phases: vec![ArcPhase {
                kind: ArcPhaseKind::Setup,
                fragment_ids: ["a".into(), "b".into()].into_iter().collect(),
                strength: 0.5,
            }],
            fragment_ids: ["a".into(), "b".into()].into_iter().collect(),
            completeness: 0.2,
        };
        let mappings: BTreeMap<_, _> = [mapping("a", true, true)].into_iter().collect();
        let report = analyze_coverage(2, &[], &[arc], &mappings);
        // development and resolution both missing
        let gap = report.gaps.iter().find(|g| g.theme == "main").unwrap();
        assert_eq!(gap.severity, GapSeverity::Major);
        assert!(gap.description.contains("development"));
        assert!(gap.description.contains("resolution"));
    }

    #[test]
    fn test_orphans_escalate() {
        let mappings: BTreeMap<_, _> = (0..5)
            .map(|i| mapping(&format!("f{}", i), false, i == 0))
            .collect();
        let report = analyze_coverage(5, &[], &[], &mappings);
        let gap = report
            .gaps
            .iter()
            .find(|g| g.theme == "unthemed material")
            .unwrap();
        assert_eq!(gap.severity, GapSeverity::Moderate);
    }

    #[test]
    fn test_key_passage_rules() {
        let none: BTreeMap<_, _> = [mapping("f1", true, false)].into_iter().collect();
        let report = analyze_coverage(1, &[], &[], &none);
        assert!(report
            .gaps
            .iter()
            .any(|g| g.theme == "key passages" && g.severity == GapSeverity::Major));

        let many: BTreeMap<_, _> = (0..3)
            .map(|i| mapping(&format!("f{}", i), true, true))
            .collect();
        let report = analyze_coverage(3, &[], &[], &many);
        assert!(report.strengths.iter().any(|s| s.contains("key passages")));
    }
}
