//! On-the-fly (OTF) visitor scoring.
//!
//! A scorer looks at a visitor's clickstream aggregate and decides whether
//! they are browsing with purchase intent right now. The production scorer
//! is a placeholder that flags every visitor; the trait lets a trained model
//! be swapped in through [`crate::state::AppState`].

use std::fmt::Debug;

use crate::clickstream::VisitTable;

/// Decides whether a visitor is an OTF shopper.
pub trait OtfScorer: Send + Sync + Debug {
    fn score(&self, visit: &VisitTable) -> bool;
}

/// Flags every visitor as OTF.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOtf;

impl OtfScorer for AlwaysOtf {
    fn score(&self, _visit: &VisitTable) -> bool {
        true
    }
}

/// Flags visitors whose engagement crosses fixed thresholds.
///
/// Used in tests and as a reference for replacing [`AlwaysOtf`].
#[derive(Debug, Clone, Copy)]
pub struct ThresholdScorer {
    pub min_clicks: u64,
    pub min_scroll_depth: f64,
    pub min_pages: u64,
}

impl OtfScorer for ThresholdScorer {
    fn score(&self, visit: &VisitTable) -> bool {
        visit.num_clicks >= self.min_clicks
            && visit.max_scroll_depth >= self.min_scroll_depth
            && visit.page_count >= self.min_pages
    }
}
