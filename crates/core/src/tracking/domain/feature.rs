use crate::error::{Result, TrackError};

const ZERO_NORM_EPSILON: f32 = 1e-12;

/// An appearance embedding produced by the feature extractor.
///
/// Kept L2-normalized once constructed via [`Feature::normalized`]; the
/// raw constructor does not enforce this so callers can build up a
/// running EMA before normalizing once at the end.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature(Vec<f32>);

impl Feature {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn l2norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Returns a unit-length copy. Fails if the vector's norm is too
    /// small to normalize meaningfully.
    pub fn normalized(&self) -> Result<Feature> {
        let norm = self.l2norm();
        if norm < ZERO_NORM_EPSILON {
            return Err(TrackError::ZeroVector);
        }
        Ok(Feature(self.0.iter().map(|v| v / norm).collect()))
    }

    /// Cosine similarity, in `[-1, 1]`. Fails on dimension mismatch or
    /// a near-zero vector on either side.
    pub fn cosine(&self, other: &Feature) -> Result<f32> {
        if self.0.len() != other.0.len() {
            return Err(TrackError::DimensionMismatch {
                a: self.0.len(),
                b: other.0.len(),
            });
        }
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let na = self.l2norm();
        let nb = other.l2norm();
        if na < ZERO_NORM_EPSILON || nb < ZERO_NORM_EPSILON {
            return Err(TrackError::ZeroVector);
        }
        Ok((dot / (na * nb)).clamp(-1.0, 1.0))
    }

    /// Elementwise sum. Panics on dimension mismatch — callers only add
    /// features they already know share an extractor's output shape.
    pub fn add(&self, other: &Feature) -> Feature {
        assert_eq!(self.0.len(), other.0.len(), "feature dimension mismatch in add");
        Feature(self.0.iter().zip(other.0.iter()).map(|(a, b)| a + b).collect())
    }

    pub fn scale(&self, factor: f32) -> Feature {
        Feature(self.0.iter().map(|v| v * factor).collect())
    }

    /// Exponential moving average fusion: `momentum * other + (1 - momentum) * self`,
    /// renormalized to unit length. `other` is the new observation, so it
    /// carries weight `momentum`.
    pub fn ema_fuse(&self, other: &Feature, momentum: f32) -> Result<Feature> {
        let fused = self.scale(1.0 - momentum).add(&other.scale(momentum));
        fused.normalized()
    }
}
