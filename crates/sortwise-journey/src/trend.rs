//! Linear-regression trend classification over an ordered series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slope thresholds for calling a trend up or down.
const SLOPE_THRESHOLD: f64 = 0.5;

/// One observation in an ordered series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Observed value.
    pub value: f64,
    /// When the value was observed. Regression runs on index order,
    /// not on the timestamps; the date is carried for the caller.
    pub date: DateTime<Utc>,
}

/// Direction of a detected trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Result of trend classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// Up / down / stable.
    pub direction: TrendDirection,
    /// |slope| normalized by the value range, clamped to [0, 1].
    pub magnitude: f64,
    /// sqrt(R²) of the fit, in [0, 1].
    pub confidence: f64,
    /// The points the trend was computed from.
    pub points: Vec<TrendPoint>,
}

/// Ordinary least-squares trend over `points`, regressing value against
/// index 0..n−1.
///
/// Fewer than 2 points is a stable trend with zero magnitude and
/// confidence. Flat value ranges yield magnitude 0 rather than NaN.
pub fn calculate_trend(points: &[TrendPoint]) -> TrendAnalysis {
    let n = points.len();
    if n < 2 {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            magnitude: 0.0,
            confidence: 0.0,
            points: points.to_vec(),
        };
    }

    let nf = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = points.iter().map(|p| p.value).sum();
    let sum_xy: f64 = points.iter().enumerate().map(|(i, p)| i as f64 * p.value).sum();
    let sum_x2: f64 = (0..n).map(|i| (i * i) as f64).sum();

    // Denominator is n(n²−1)/12 > 0 for n ≥ 2.
    let slope = (nf * sum_xy - sum_x * sum_y) / (nf * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / nf;

    let direction = if slope > SLOPE_THRESHOLD {
        TrendDirection::Up
    } else if slope < -SLOPE_THRESHOLD {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let range = max - min;
    let magnitude = if range > 0.0 {
        (slope.abs() / range).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mean = sum_y / nf;
    let ss_tot: f64 = points.iter().map(|p| (p.value - mean).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .enumerate()
        .map(|(i, p)| (p.value - (slope * i as f64 + intercept)).powi(2))
        .sum();
    let confidence = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).max(0.0).sqrt().clamp(0.0, 1.0)
    } else {
        0.0
    };

    TrendAnalysis {
        direction,
        magnitude,
        confidence,
        points: points.to_vec(),
    }
}
