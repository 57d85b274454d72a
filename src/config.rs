//! Pipeline configuration
//!
//! Every tunable threshold in the pipeline lives here with a documented
//! default. The defaults are empirically tuned values, not invariants;
//! retune them when moving to a corpus with very different fragment sizes.

/// Configuration for the outline intelligence pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum token length for theme-level keyword extraction
    pub theme_keyword_min_len: usize,
    /// Minimum token length when matching outline item text
    pub outline_keyword_min_len: usize,
    /// Fragment-to-theme relevance floor; matches below it are dropped
    pub theme_relevance_floor: f64,
    /// Theme-to-outline-item relevance floor for the theme bonus in review
    pub item_theme_relevance_floor: f64,
    /// Fragment match score floor during outline review
    pub match_score_floor: f64,
    /// Minimum corpus-wide co-occurrence count for a keyword pair
    pub cooccurrence_floor: u32,
    /// Maximum number of theme-derived suggested sections
    pub max_theme_sections: usize,
    /// Hard cap on generated outline sections
    pub max_sections: usize,
    /// Prose-expansion multiplier for estimated word counts
    pub word_expansion: f64,
    /// Minimum theme strength for merging a research section into an outline
    pub min_merge_strength: f64,
    /// Fragment-overlap ratio above which a research section is a duplicate
    pub overlap_cap: f64,
    /// Review feasibility below which a proposed outline is not seeded from
    pub feasibility_floor: f64,
    /// Maximum outline tree depth accepted by validation
    pub max_outline_depth: usize,
    /// Seed all proposed items, even those with no fragment coverage
    pub keep_proposed: bool,
    /// Reorder generated sections by narrative flow
    pub narrative_reorder: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            theme_keyword_min_len: 4,
            outline_keyword_min_len: 3,
            theme_relevance_floor: 0.2,
            item_theme_relevance_floor: 0.3,
            match_score_floor: 0.2,
            cooccurrence_floor: 2,
            max_theme_sections: 6,
            max_sections: 10,
            word_expansion: 1.5,
            min_merge_strength: 0.25,
            overlap_cap: 0.5,
            feasibility_floor: 0.4,
            max_outline_depth: 6,
            keep_proposed: false,
            narrative_reorder: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generated-outline section cap
    pub fn with_max_sections(mut self, max: usize) -> Self {
        self.max_sections = max;
        self
    }

    /// Set the prose-expansion multiplier
    pub fn with_word_expansion(mut self, multiplier: f64) -> Self {
        self.word_expansion = multiplier;
        self
    }

    /// Keep every proposed outline item regardless of coverage
    pub fn with_keep_proposed(mut self, keep: bool) -> Self {
        self.keep_proposed = keep;
        self
    }

    /// Enable or disable narrative-flow reordering
    pub fn with_narrative_reorder(mut self, enabled: bool) -> Self {
        self.narrative_reorder = enabled;
        self
    }

    /// Set the minimum theme strength for research-section merging
    pub fn with_min_merge_strength(mut self, strength: f64) -> Self {
        self.min_merge_strength = strength;
        self
    }
}
