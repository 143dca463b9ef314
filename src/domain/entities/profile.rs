use serde::{Deserialize, Serialize};
use std::fmt;

/// Height and weight as submitted by the user via /set
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BodyMetrics {
    /// Height in meters
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
}

impl BodyMetrics {
    /// Plausible human height range in meters
    pub const HEIGHT_RANGE: (f64, f64) = (0.5, 3.0);
    /// Plausible human weight range in kilograms
    pub const WEIGHT_RANGE: (f64, f64) = (30.0, 200.0);

    pub fn new(height: f64, weight: f64) -> Self {
        Self { height, weight }
    }

    /// Check that both values fall inside the plausible human ranges
    pub fn is_plausible(&self) -> bool {
        let (h_min, h_max) = Self::HEIGHT_RANGE;
        let (w_min, w_max) = Self::WEIGHT_RANGE;
        self.height >= h_min && self.height <= h_max && self.weight >= w_min && self.weight <= w_max
    }

    /// Body-mass index: weight / height²
    pub fn bmi(&self) -> f64 {
        self.weight / (self.height * self.height)
    }
}

/// Per-chat user state, persisted across restarts
///
/// Serde field names (`userAnswer`, `imt`) keep the on-disk JSON compatible
/// with the state files written by earlier deployments.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "userAnswer", default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BodyMetrics>,
    #[serde(rename = "imt", default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
}

impl UserProfile {
    pub fn new(username: Option<impl Into<String>>) -> Self {
        Self {
            username: username.map(Into::into),
            metrics: None,
            bmi: None,
        }
    }

    /// Store new metrics and recompute the derived BMI
    pub fn set_metrics(&mut self, metrics: BodyMetrics) {
        self.bmi = Some(metrics.bmi());
        self.metrics = Some(metrics);
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(name) => write!(f, "@{}", name),
            None => write!(f, "<anonymous>"),
        }
    }
}
