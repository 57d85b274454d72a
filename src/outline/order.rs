//! Per-section fragment ordering for drafting hand-off
//!
//! Resolves each generated section's assigned fragments, orders them by
//! grade descending then timestamp ascending, and tags the key-passage
//! subset. The output is always set-equal to the input assignment — a
//! fragment is never dropped or duplicated here.

use crate::error::{PipelineError, PipelineResult};
use crate::fragment::{Fragment, FragmentId};
use crate::outline::types::{GeneratedOutline, OrderedSection};
use crate::research::ResearchResult;
use std::collections::BTreeMap;

/// Order every section's fragments for drafting
pub fn order_sections(
    outline: &GeneratedOutline,
    fragments: &[Fragment],
    research: &ResearchResult,
) -> PipelineResult<Vec<OrderedSection>> {
    let by_id: BTreeMap<&FragmentId, &Fragment> =
        fragments.iter().map(|f| (&f.id, f)).collect();

    let mut sections = Vec::with_capacity(outline.items.len());
    for item in &outline.items {
        let mut resolved: Vec<&Fragment> = Vec::with_capacity(item.fragment_ids.len());
        for id in &item.fragment_ids {
            match by_id.get(id) {
                Some(fragment) => resolved.push(fragment),
                None => return Err(PipelineError::UnknownFragment { id: id.clone() }),
            }
        }

        // Grade descending, then timestamp ascending (undated last), then
        // id for a total order.
        resolved.sort_by(|a, b| {
            b.overall_or_default()
                .partial_cmp(&a.overall_or_default())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| match (a.created_at, b.created_at) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        sections.push(OrderedSection {
            title: item.text.clone(),
            path: item.path.clone(),
            key_fragment_ids: resolved
                .iter()
                .filter(|f| research.is_key_passage(&f.id))
                .map(|f| f.id.clone())
                .collect(),
            fragment_ids: resolved.into_iter().map(|f| f.id.clone()).collect(),
        });
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Grade, NarrativeFunction};
    use crate::outline::types::{
        GeneratedItem, ItemSource, OutlineItem, OutlineKind, OutlineStructure,
    };
    use crate::research::{NarrativePosition, SourceMapping};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn grade(overall: u8) -> Grade {
        Grade {
            overall,
            necessity: 0.5,
            function: NarrativeFunction::Setup,
            inflection: 1,
        }
    }

    fn outline_with(ids: &[&str]) -> GeneratedOutline {
        let items = vec![GeneratedItem {
            path: "0".to_string(),
            text: "Section".to_string(),
            fragment_ids: ids.iter().map(|s| (*s).into()).collect(),
            confidence: 0.8,
            source: ItemSource::Research,
            theme_ids: BTreeSet::new(),
        }];
        GeneratedOutline {
            structure: OutlineStructure::new(
                OutlineKind::Sections,
                vec![OutlineItem::new("Section")],
            ),
            assignments: items
                .iter()
                .map(|i| (i.path.clone(), i.fragment_ids.clone()))
                .collect(),
            items,
            confidence: 0.8,
            from_proposed: false,
            from_research: true,
        }
    }

    fn empty_research() -> ResearchResult {
        ResearchResult {
            themes: vec![],
            arcs: vec![],
            mappings: BTreeMap::new(),
            gaps: vec![],
            strengths: vec![],
            suggested_sections: vec![],
            fragment_count: 0,
            confidence: 0.0,
            rejections: vec![],
        }
    }

    #[test]
    fn test_grade_then_timestamp_ordering() {
        let at = |day| Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).unwrap();
        let fragments = vec![
            Fragment::new("late-good", "x").with_grade(grade(5)).with_created_at(at(9)),
            Fragment::new("early-good", "x").with_grade(grade(5)).with_created_at(at(2)),
            Fragment::new("mediocre", "x").with_grade(grade(2)).with_created_at(at(1)),
            Fragment::new("ungraded", "x").with_created_at(at(1)),
        ];
        let outline = outline_with(&["late-good", "early-good", "mediocre", "ungraded"]);
        let sections = order_sections(&outline, &fragments, &empty_research()).unwrap();
        let order: Vec<&str> = sections[0]
            .fragment_ids
            .iter()
            .map(|id| id.as_str())
            .collect();
        // grade 5s first (by date), then the default-3 ungraded, then grade 2
        assert_eq!(order, vec!["early-good", "late-good", "ungraded", "mediocre"]);
    }

    #[test]
    fn test_set_equality_preserved() {
        let fragments: Vec<Fragment> = (0..6)
            .map(|i| Fragment::new(format!("f{}", i), "x"))
            .collect();
        let outline = outline_with(&["f3", "f1", "f5"]);
        let sections = order_sections(&outline, &fragments, &empty_research()).unwrap();
        let output: BTreeSet<&FragmentId> = sections[0].fragment_ids.iter().collect();
        let input: BTreeSet<&FragmentId> = outline.assignments["0"].iter().collect();
        assert_eq!(output, input);
        assert_eq!(sections[0].fragment_ids.len(), 3);
    }

    #[test]
    fn test_key_passages_tagged() {
        let fragments = vec![
            Fragment::new("key", "x"),
            Fragment::new("plain", "x"),
        ];
        let mut research = empty_research();
        research.mappings.insert(
            "key".into(),
            SourceMapping {
                fragment_id: "key".into(),
                theme_ids: BTreeSet::new(),
                relevance: BTreeMap::new(),
                position: Some(NarrativePosition::Early),
                key_passage: true,
            },
        );
        let outline = outline_with(&["key", "plain"]);
        let sections = order_sections(&outline, &fragments, &research).unwrap();
        assert!(sections[0].key_fragment_ids.contains(&"key".into()));
        assert!(!sections[0].key_fragment_ids.contains(&"plain".into()));
    }

    #[test]
    fn test_unknown_assignment_is_an_error() {
        let fragments = vec![Fragment::new("f1", "x")];
        let outline = outline_with(&["f1", "ghost"]);
        let result = order_sections(&outline, &fragments, &empty_research());
        assert!(matches!(
            result,
            Err(PipelineError::UnknownFragment { .. })
        ));
    }
}
