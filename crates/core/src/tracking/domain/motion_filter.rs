use crate::tracking::domain::bounding_box::BoundingBox;

const SIZE_DAMPING: f32 = 0.8;

pub(crate) const POS_PROCESS_NOISE: f32 = 1e-3;
pub(crate) const SIZE_PROCESS_NOISE: f32 = 2e-3;
const VEL_PROCESS_NOISE: f32 = 1e-3;
const SIZE_VEL_PROCESS_NOISE: f32 = 1e-2;

const POS_MEASUREMENT_NOISE: f32 = 1e-2;
const SIZE_MEASUREMENT_NOISE: f32 = 1e-1;

/// A single `[s, v]` constant-velocity channel with scalar measurement.
///
/// `px/py/w/h` each get their own independent channel — the transition
/// and noise matrices in §4.3 are block-diagonal across these four
/// pairs, so a 2-state filter per channel is equivalent to the full
/// 8-state formulation and far simpler to reason about.
#[derive(Clone, Copy, Debug)]
struct Channel1D {
    s: f32,
    v: f32,
    // posterior error covariance, row-major 2x2
    p: [[f32; 2]; 2],
    damping: f32,
    process_noise_s: f32,
    process_noise_v: f32,
    measurement_noise: f32,
}

impl Channel1D {
    fn new(s: f32, damping: f32, process_noise_s: f32, process_noise_v: f32, measurement_noise: f32) -> Self {
        Self {
            s,
            v: 0.0,
            p: [[1.0, 0.0], [0.0, 1.0]],
            damping,
            process_noise_s,
            process_noise_v,
            measurement_noise,
        }
    }

    fn predict(&mut self) {
        let d = self.damping;
        // F = [[1, 1], [0, d]] for size channels (d=0.8), [[1,1],[0,1]] for position.
        let new_s = self.s + self.v;
        let new_v = self.v * d;

        // P' = F P F^T + Q
        let p00 = self.p[0][0];
        let p01 = self.p[0][1];
        let p10 = self.p[1][0];
        let p11 = self.p[1][1];

        let fp00 = p00 + p10;
        let fp01 = p01 + p11;
        let fp10 = d * p10;
        let fp11 = d * p11;

        let new_p00 = fp00 + fp01 + self.process_noise_s;
        let new_p01 = d * fp01;
        let new_p10 = fp10 + fp11;
        let new_p11 = d * fp11 + self.process_noise_v;

        self.s = new_s;
        self.v = new_v;
        self.p = [[new_p00, new_p01], [new_p10, new_p11]];
    }

    fn correct(&mut self, observed: f32) {
        let p00 = self.p[0][0];
        let p10 = self.p[1][0];
        let innovation_cov = p00 + self.measurement_noise;
        let k0 = p00 / innovation_cov;
        let k1 = p10 / innovation_cov;

        let residual = observed - self.s;
        self.s += k0 * residual;
        self.v += k1 * residual;

        let p01 = self.p[0][1];
        let p11 = self.p[1][1];
        self.p = [
            [p00 - k0 * p00, p01 - k0 * p01],
            [p10 - k1 * p00, p11 - k1 * p01],
        ];
    }
}

/// Per-track 8-state constant-velocity + damped-size motion filter.
///
/// State is `[px, py, w, h, vx, vy, vw, vh]` where `(px, py)` is the
/// bottom-midpoint of the box, decoupling position noise from size
/// changes.
#[derive(Clone, Debug)]
pub struct MotionFilter {
    px: Channel1D,
    py: Channel1D,
    w: Channel1D,
    h: Channel1D,
}

impl MotionFilter {
    pub fn init(bbox: &BoundingBox) -> Self {
        Self::init_with_noise(bbox, POS_PROCESS_NOISE, SIZE_PROCESS_NOISE)
    }

    /// Like [`MotionFilter::init`], but overriding the diagonal process
    /// noise for the position and size channels — the `kf_pos_noise` /
    /// `kf_size_noise` config keys (§6).
    pub fn init_with_noise(bbox: &BoundingBox, pos_noise: f32, size_noise: f32) -> Self {
        let (bx, by) = bbox.bottom_mid();
        Self {
            px: Channel1D::new(bx, 1.0, pos_noise, VEL_PROCESS_NOISE, POS_MEASUREMENT_NOISE),
            py: Channel1D::new(by, 1.0, pos_noise, VEL_PROCESS_NOISE, POS_MEASUREMENT_NOISE),
            w: Channel1D::new(
                bbox.w,
                SIZE_DAMPING,
                size_noise,
                SIZE_VEL_PROCESS_NOISE,
                SIZE_MEASUREMENT_NOISE,
            ),
            h: Channel1D::new(
                bbox.h,
                SIZE_DAMPING,
                size_noise,
                SIZE_VEL_PROCESS_NOISE,
                SIZE_MEASUREMENT_NOISE,
            ),
        }
    }

    fn current_box(&self) -> BoundingBox {
        let w = self.w.s.max(1.0);
        let h = self.h.s.max(1.0);
        BoundingBox::new(self.px.s - w * 0.5, self.py.s - h, w, h)
    }

    /// Advances the state and returns the predicted box, width/height
    /// clamped to at least 1 pixel.
    pub fn predict(&mut self) -> BoundingBox {
        self.px.predict();
        self.py.predict();
        self.w.predict();
        self.h.predict();
        self.current_box()
    }

    pub fn correct(&mut self, observed: &BoundingBox) -> BoundingBox {
        let (bx, by) = observed.bottom_mid();
        self.px.correct(bx);
        self.py.correct(by);
        self.w.correct(observed.w);
        self.h.correct(observed.h);
        self.current_box()
    }
}
