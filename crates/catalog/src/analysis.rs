//! Ingestion of remote analysis results.
//!
//! The remote call itself is opaque: an [`AnalysisProvider`] turns input files
//! into an [`AnalysisResult`] or a human-readable failure. Only `targetAreas`
//! is interpreted; every other field passes through untouched.

use std::collections::BTreeSet;
use std::future::Future;

use scene::targets::{DATA_MAX, DATA_MIN, TargetPoint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("no input files supplied")]
    NoInput,
    #[error("analysis failed: {0}")]
    Remote(String),
    #[error("malformed analysis result: {0}")]
    Malformed(String),
    #[error("duplicate target id {id}")]
    DuplicateTarget { id: u64 },
    #[error("target {id} is invalid: {reason}")]
    InvalidTarget { id: u64, reason: &'static str },
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetArea {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub probability: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub target_areas: Vec<TargetArea>,
    /// Ratings, recommended actions, narrative text.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn from_json_str(raw: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Validated target points.
    ///
    /// Positions are clamped into the data square and probabilities into
    /// `0..=1`. Non-finite values and repeated ids are rejected.
    pub fn to_targets(&self) -> Result<Vec<TargetPoint>, AnalysisError> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(self.target_areas.len());
        for area in &self.target_areas {
            if !seen.insert(area.id) {
                return Err(AnalysisError::DuplicateTarget { id: area.id });
            }
            if !(area.x.is_finite() && area.y.is_finite()) {
                return Err(AnalysisError::InvalidTarget {
                    id: area.id,
                    reason: "position is not finite",
                });
            }
            if !area.probability.is_finite() {
                return Err(AnalysisError::InvalidTarget {
                    id: area.id,
                    reason: "probability is not finite",
                });
            }

            let x = area.x.clamp(DATA_MIN, DATA_MAX);
            let y = area.y.clamp(DATA_MIN, DATA_MAX);
            let probability = area.probability.clamp(0.0, 1.0);
            if x != area.x || y != area.y || probability != area.probability {
                warn!(id = area.id, "target area out of range, clamped");
            }

            let mut point = TargetPoint::new(area.id, x, y, probability)
                .with_description(area.description.clone());
            point.reasoning = area.reasoning.clone();
            out.push(point);
        }
        Ok(out)
    }
}

/// An uploaded file handed to the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

pub trait AnalysisProvider {
    fn run_analysis(
        &self,
        inputs: &[InputFile],
    ) -> impl Future<Output = Result<AnalysisResult, AnalysisError>>;
}

/// Runs the analysis and validates its targets.
pub async fn analyze<P: AnalysisProvider>(
    provider: &P,
    inputs: &[InputFile],
) -> Result<Vec<TargetPoint>, AnalysisError> {
    let result = provider.run_analysis(inputs).await?;
    let targets = result.to_targets()?;
    debug!(inputs = inputs.len(), targets = targets.len(), "analysis ingested");
    Ok(targets)
}

/// Serves a canned result, or a canned failure.
#[derive(Debug, Clone)]
pub struct FixtureAnalysisProvider {
    outcome: Result<AnalysisResult, String>,
}

impl FixtureAnalysisProvider {
    pub fn new(result: AnalysisResult) -> Self {
        Self { outcome: Ok(result) }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AnalysisError> {
        AnalysisResult::from_json_str(raw).map(Self::new)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
        }
    }
}

impl AnalysisProvider for FixtureAnalysisProvider {
    async fn run_analysis(&self, inputs: &[InputFile]) -> Result<AnalysisResult, AnalysisError> {
        if inputs.is_empty() {
            return Err(AnalysisError::NoInput);
        }
        self.outcome.clone().map_err(AnalysisError::Remote)
    }
}
