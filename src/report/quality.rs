//! Quality-score trend and the recommendation derived from it

use serde::{Deserialize, Serialize};

use crate::analysis::{TrendDetector, TrendDirection};

/// Fewest scores needed for a quality trend
pub const MIN_QUALITY_SCORES: usize = 5;

/// Urgency of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    High,
    Critical,
}

/// Suggested response to a quality trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
}

impl Recommendation {
    /// Recommendation for a trend direction and change rate
    pub fn for_trend(direction: TrendDirection, change_rate: f64) -> Self {
        let (priority, action) = match direction {
            TrendDirection::Decreasing if change_rate.abs() > 1.0 => (
                Priority::Critical,
                "Quality declining rapidly. Review recent changes in feeding, storage, or hygiene practices immediately.",
            ),
            TrendDirection::Decreasing => (
                Priority::High,
                "Monitor closely. Identify and address factors causing quality decline.",
            ),
            TrendDirection::Increasing => (
                Priority::Low,
                "Continue current practices. Quality is improving.",
            ),
            TrendDirection::Stable | TrendDirection::InsufficientData => {
                (Priority::Low, "Maintain current standards.")
            }
        };

        Self {
            priority,
            action: action.to_string(),
        }
    }
}

/// Trend of quality scores over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTrend {
    pub trend: TrendDirection,
    pub change_rate: f64,
    pub current_score: Option<f64>,
    pub previous_score: Option<f64>,
    /// Current minus previous score
    pub recent_change: Option<f64>,
    pub strength: f64,
    pub message: String,
    pub recommendation: Option<Recommendation>,
}

impl QualityTrend {
    /// Result for too few scores
    pub fn insufficient() -> Self {
        Self {
            trend: TrendDirection::InsufficientData,
            change_rate: 0.0,
            current_score: None,
            previous_score: None,
            recent_change: None,
            strength: 0.0,
            message: format!("Need at least {} readings for trend analysis", MIN_QUALITY_SCORES),
            recommendation: None,
        }
    }

    /// Quality trend of an ordered score sequence
    pub fn from_scores(scores: &[f64], detector: &TrendDetector) -> Self {
        if scores.len() < MIN_QUALITY_SCORES {
            return Self::insufficient();
        }

        let trend = detector.detect(scores);
        let current = scores[scores.len() - 1];
        let previous = scores[scores.len() - 2];

        let message = match trend.direction {
            TrendDirection::Increasing => {
                format!("Quality improving! +{:.1}% per reading", trend.change_rate.abs())
            }
            TrendDirection::Decreasing => format!(
                "Quality declining. -{:.1}% per reading. Take action!",
                trend.change_rate.abs()
            ),
            _ => "Quality stable. Maintain current practices.".to_string(),
        };

        Self {
            trend: trend.direction,
            change_rate: trend.change_rate,
            current_score: Some(current),
            previous_score: Some(previous),
            recent_change: Some(current - previous),
            strength: trend.strength,
            message,
            recommendation: Some(Recommendation::for_trend(trend.direction, trend.change_rate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rapid_decline_is_critical() {
        let scores = [90.0, 85.0, 80.0, 75.0, 70.0];
        let trend = QualityTrend::from_scores(&scores, &TrendDetector::default());

        assert_eq!(trend.trend, TrendDirection::Decreasing);
        assert_eq!(trend.current_score, Some(70.0));
        assert_eq!(trend.previous_score, Some(75.0));
        assert_eq!(trend.recent_change, Some(-5.0));
        assert_eq!(trend.message, "Quality declining. -500.0% per reading. Take action!");
        assert_eq!(trend.recommendation.unwrap().priority, Priority::Critical);
    }

    #[test]
    fn test_recommendation_bands() {
        let rec = Recommendation::for_trend(TrendDirection::Decreasing, -0.5);
        assert_eq!(rec.priority, Priority::High);

        let rec = Recommendation::for_trend(TrendDirection::Decreasing, -1.5);
        assert_eq!(rec.priority, Priority::Critical);

        let rec = Recommendation::for_trend(TrendDirection::Increasing, 40.0);
        assert_eq!(rec.priority, Priority::Low);
    }

    #[test]
    fn test_improving() {
        let scores = [60.0, 62.0, 64.0, 66.0, 68.0];
        let trend = QualityTrend::from_scores(&scores, &TrendDetector::default());

        assert_eq!(trend.trend, TrendDirection::Increasing);
        assert_eq!(trend.message, "Quality improving! +200.0% per reading");
        assert_eq!(trend.recommendation.unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_stable() {
        let scores = [75.0; 8];
        let trend = QualityTrend::from_scores(&scores, &TrendDetector::default());

        assert_eq!(trend.trend, TrendDirection::Stable);
        assert_eq!(trend.message, "Quality stable. Maintain current practices.");
        assert_eq!(
            trend.recommendation.unwrap().action,
            "Maintain current standards."
        );
    }

    #[test]
    fn test_insufficient() {
        let trend = QualityTrend::from_scores(&[70.0, 71.0, 72.0, 73.0], &TrendDetector::default());
        assert_eq!(trend.trend, TrendDirection::InsufficientData);
        assert_eq!(trend.current_score, None);
        assert!(trend.recommendation.is_none());
    }
}
