use crate::error::{Result, TrackError};
use crate::tracking::domain::bounding_box::BoundingBox;
use crate::tracking::domain::feature::Feature;

const ZERO_WEIGHT_EPSILON: f32 = 1e-6;

/// Greedy one-to-one matcher combining box IoU and appearance cosine
/// similarity into a single geometric-weighted-mean score.
#[derive(Clone, Copy, Debug)]
pub struct Associator {
    iou_weight: f32,
    feature_weight: f32,
    threshold: f32,
}

impl Associator {
    pub fn new(iou_weight: f32, feature_weight: f32, threshold: f32) -> Result<Self> {
        if iou_weight + feature_weight <= ZERO_WEIGHT_EPSILON {
            return Err(TrackError::ZeroWeights);
        }
        Ok(Self {
            iou_weight,
            feature_weight,
            threshold,
        })
    }

    /// Scores one pair. A dimension mismatch between features is a
    /// structural config error and propagates; a near-zero feature norm
    /// just means this pair has no appearance signal, scored as if
    /// `cos' = 0` rather than failing the whole match.
    fn combined_score(&self, left: (&BoundingBox, &Feature), right: (&BoundingBox, &Feature)) -> Result<f32> {
        let total = self.iou_weight + self.feature_weight;
        let wi = self.iou_weight / total;
        let wf = self.feature_weight / total;

        let iou = left.0.iou(right.0);
        let cos_mapped = match left.1.cosine(right.1) {
            Ok(c) => 0.5 * (c + 1.0),
            Err(TrackError::ZeroVector) => 0.0,
            Err(e) => return Err(e),
        };

        // geometric weighted mean: iou^wi * cos'^wf, guarding 0^0 = 1
        let iou_term = if wi <= f32::EPSILON { 1.0 } else { iou.max(0.0).powf(wi) };
        let cos_term = if wf <= f32::EPSILON { 1.0 } else { cos_mapped.max(0.0).powf(wf) };
        Ok(iou_term * cos_term)
    }

    /// Matches `left` against `right`, each given as parallel
    /// `(bbox, feature)` slices. Returns claimed `(left_idx, right_idx)`
    /// pairs, sorted by descending score, each index used at most once.
    pub fn match_greedy(
        &self,
        left: &[(&BoundingBox, &Feature)],
        right: &[(&BoundingBox, &Feature)],
    ) -> Result<Vec<(usize, usize)>> {
        let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
        for (i, l) in left.iter().enumerate() {
            for (j, r) in right.iter().enumerate() {
                let score = self.combined_score(*l, *r)?;
                if score >= self.threshold {
                    candidates.push((score, i, j));
                }
            }
        }
        // stable sort preserves encounter order among ties
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_claimed = vec![false; left.len()];
        let mut right_claimed = vec![false; right.len()];
        let mut pairs = Vec::new();
        for (_, i, j) in candidates {
            if !left_claimed[i] && !right_claimed[j] {
                left_claimed[i] = true;
                right_claimed[j] = true;
                pairs.push((i, j));
            }
        }
        Ok(pairs)
    }
}
