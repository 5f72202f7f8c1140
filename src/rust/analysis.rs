//! Turns raw classifier output into what gets displayed: a headline emotion, a
//! top-three ranking, and the full radar series.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::classifier::{LabelMap, LabelResolution, RawScore};

pub const TOP_RANKED: usize = 3;

/// A score in `[0, 1]` shown as a percentage with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Confidence(pub f32);

impl Confidence {
    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn percent(&self) -> String {
        format!("{:.2}%", f64::from(self.0) * 100.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.percent())
    }
}

/// A raw score with its resolved category name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// Identifier as emitted by the classifier, e.g. `LABEL_3`.
    pub label_id: String,
    pub resolution: LabelResolution,
    pub score: Confidence,
}

impl RankedResult {
    pub fn name(&self) -> &str {
        self.resolution.name()
    }
}

/// Everything one submission renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub top1: RankedResult,
    /// At most [`TOP_RANKED`] entries, highest score first.
    pub top3: Vec<RankedResult>,
    /// Every category in the classifier's own order, so chart angles stay put between requests.
    pub radar: Vec<RankedResult>,
}

impl Analysis {
    pub fn headline(&self) -> (&str, Confidence) {
        (self.top1.name(), self.top1.score)
    }
}

pub fn resolve(raw: &RawScore, labels: &LabelMap) -> RankedResult {
    RankedResult {
        label_id: raw.label.clone(),
        resolution: labels.resolve(&raw.label),
        score: Confidence(raw.score),
    }
}

/// Descending by score; NaN last. Stable, so equal scores keep input order.
fn by_score_desc(a: &RankedResult, b: &RankedResult) -> Ordering {
    match (a.score.0.is_nan(), b.score.0.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.score.0.partial_cmp(&a.score.0).unwrap_or(Ordering::Equal),
    }
}

/// All entries, resolved and sorted by descending score.
pub fn rank(raw: &[RawScore], labels: &LabelMap) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = raw.iter().map(|r| resolve(r, labels)).collect();
    ranked.sort_by(by_score_desc);
    ranked
}

/// Reshapes one inference result. `None` only when `raw` is empty.
pub fn transform(raw: &[RawScore], labels: &LabelMap) -> Option<Analysis> {
    let radar: Vec<RankedResult> = raw.iter().map(|r| resolve(r, labels)).collect();

    let mut sorted = radar.clone();
    sorted.sort_by(by_score_desc);
    sorted.truncate(TOP_RANKED);

    let top1 = sorted.first()?.clone();
    Some(Analysis {
        top1,
        top3: sorted,
        radar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelMap {
        [
            "joy", "sadness", "anticipate", "anger", "fear", "disgust", "trust", "surprise", "neutral",
        ]
        .into_iter()
        .enumerate()
        .collect()
    }

    fn raw(scores: &[f32]) -> Vec<RawScore> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| RawScore::new(format!("LABEL_{}", i), s))
            .collect()
    }

    const SCORES: [f32; 9] = [0.8743, 0.01, 0.05, 0.003, 0.002, 0.001, 0.03, 0.02, 0.0097];

    #[test]
    fn test_top1_and_top3() {
        let analysis = transform(&raw(&SCORES), &labels()).unwrap();

        assert_eq!(analysis.top1.name(), "joy");
        assert_eq!(analysis.top1.score.percent(), "87.43%");
        let names: Vec<_> = analysis.top3.iter().map(RankedResult::name).collect();
        assert_eq!(names, vec!["joy", "anticipate", "trust"]);
        assert_eq!(analysis.top3[0], analysis.top1);

        let full = rank(&raw(&SCORES), &labels());
        assert_eq!(&full[..3], &analysis.top3[..]);
        let max = analysis.top3.iter().map(|r| r.score.0).fold(f32::MIN, f32::max);
        assert_eq!(analysis.top1.score.0, max);
    }

    #[test]
    fn test_radar_keeps_input_order() {
        let input = raw(&SCORES);
        let analysis = transform(&input, &labels()).unwrap();

        assert_eq!(analysis.radar.len(), 9);
        for (entry, original) in analysis.radar.iter().zip(&input) {
            assert_eq!(entry.label_id, original.label);
            assert_eq!(entry.score.0, original.score);
        }
        let names: Vec<_> = analysis.radar.iter().map(RankedResult::name).collect();
        assert_eq!(names, labels().names().collect::<Vec<_>>());
    }

    #[test]
    fn test_transform_is_pure() {
        let input = raw(&SCORES);
        assert_eq!(transform(&input, &labels()), transform(&input, &labels()));
    }

    #[test]
    fn test_unresolved_identifiers_pass_through() {
        let input = vec![RawScore::new("joy", 0.4), RawScore::new("LABEL_42", 0.6)];
        let analysis = transform(&input, &labels()).unwrap();
        assert_eq!(analysis.top1.name(), "LABEL_42");
        assert!(!analysis.top1.resolution.is_resolved());
        assert_eq!(analysis.radar[0].resolution, LabelResolution::Unresolved("joy".into()));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let analysis = transform(&raw(&[0.25, 0.5, 0.25, 0.0]), &labels()).unwrap();
        let names: Vec<_> = analysis.top3.iter().map(RankedResult::name).collect();
        assert_eq!(names, vec!["sadness", "joy", "anticipate"]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let analysis = transform(&raw(&[f32::NAN, 0.1, 0.2]), &labels()).unwrap();
        assert_eq!(analysis.top1.name(), "anticipate");
        assert!(analysis.top3[2].score.0.is_nan());
    }

    #[test]
    fn test_short_and_empty_input() {
        let analysis = transform(&raw(&[0.3, 0.7]), &labels()).unwrap();
        assert_eq!(analysis.top3.len(), 2);
        assert!(transform(&[], &labels()).is_none());
    }

    #[test]
    fn test_confidence_formatting() {
        assert_eq!(Confidence(0.8743).to_string(), "87.43%");
        assert_eq!(Confidence(1.0).percent(), "100.00%");
        assert_eq!(Confidence(0.0).percent(), "0.00%");
    }
}
