//! Quality scoring seam
//!
//! Grading a reading is done by an external collaborator. It may be missing
//! or fail for some readings; those readings simply carry no score.

use crate::reading::Reading;

/// Highest valid quality score
pub const MAX_SCORE: f64 = 100.0;

/// External grading collaborator
pub trait QualityScorer: Send + Sync {
    /// Score in `[0, 100]`, or `None` when no score is available
    fn score(&self, reading: &Reading) -> Option<f64>;
}

impl<F> QualityScorer for F
where
    F: Fn(&Reading) -> Option<f64> + Send + Sync,
{
    fn score(&self, reading: &Reading) -> Option<f64> {
        self(reading)
    }
}

/// Uses the score recorded on the reading by the upstream grading engine
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedScorer;

impl QualityScorer for RecordedScorer {
    fn score(&self, reading: &Reading) -> Option<f64> {
        reading.quality_score
    }
}

/// Score every reading, dropping readings without a usable score
pub fn score_readings<R: AsRef<Reading>>(
    scorer: Option<&dyn QualityScorer>,
    readings: &[R],
) -> Vec<f64> {
    let Some(scorer) = scorer else {
        return Vec::new();
    };

    readings
        .iter()
        .filter_map(|r| {
            let score = scorer.score(r.as_ref())?;
            if score.is_finite() && (0.0..=MAX_SCORE).contains(&score) {
                Some(score)
            } else {
                tracing::warn!("Discarding out-of-range quality score {}", score);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_scorer() {
        let reading = Reading {
            quality_score: Some(82.5),
            ..Reading::default()
        };
        assert_eq!(RecordedScorer.score(&reading), Some(82.5));
        assert_eq!(RecordedScorer.score(&Reading::new()), None);
    }

    #[test]
    fn test_closure_scorer() {
        let scorer = |r: &Reading| r.ph.map(|ph| ph * 10.0);
        let readings = vec![Reading::new().with(crate::reading::Parameter::Ph, 6.5)];
        assert_eq!(score_readings(Some(&scorer), &readings), vec![65.0]);
    }

    #[test]
    fn test_invalid_scores_dropped() {
        let scores = [Some(50.0), None, Some(120.0), Some(f64::NAN), Some(-1.0), Some(100.0)];
        let readings: Vec<Reading> = scores
            .iter()
            .map(|s| Reading {
                quality_score: *s,
                ..Reading::default()
            })
            .collect();

        assert_eq!(score_readings(Some(&RecordedScorer), &readings), vec![50.0, 100.0]);
    }

    #[test]
    fn test_missing_scorer() {
        let readings = vec![Reading::new()];
        assert!(score_readings(None, &readings).is_empty());
    }
}
