use glam::Vec2;
use std::collections::HashMap;
use std::sync::Arc;

const SPLINE_TABLE_SIZE: usize = 11;
const SAMPLE_STEP: f32 = 1.0 / (SPLINE_TABLE_SIZE as f32 - 1.0);
const NEWTON_ITERATIONS: usize = 4;
const NEWTON_MIN_SLOPE: f32 = 0.001;
const SUBDIVISION_PRECISION: f32 = 0.000_000_1;
const SUBDIVISION_MAX_ITERATIONS: usize = 10;

/// Cubic-bezier timing function through (0,0), `p1`, `p2`, (1,1).
#[derive(Debug, Clone)]
pub struct BezierEasing {
    p1: Vec2,
    p2: Vec2,
    samples: [f32; SPLINE_TABLE_SIZE],
    linear: bool,
}

impl BezierEasing {
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        // x must stay monotonic for the curve to be a function of time
        let p1 = Vec2::new(p1.x.clamp(0.0, 1.0), p1.y);
        let p2 = Vec2::new(p2.x.clamp(0.0, 1.0), p2.y);
        let linear = p1.x == p1.y && p2.x == p2.y;

        let mut samples = [0.0; SPLINE_TABLE_SIZE];
        if !linear {
            for (i, sample) in samples.iter_mut().enumerate() {
                *sample = calc_bezier(i as f32 * SAMPLE_STEP, p1.x, p2.x);
            }
        }

        Self {
            p1,
            p2,
            samples,
            linear,
        }
    }

    pub fn linear() -> Self {
        Self::new(Vec2::ZERO, Vec2::ONE)
    }

    pub fn control_points(&self) -> (Vec2, Vec2) {
        (self.p1, self.p2)
    }

    /// Maps normalized time `x` to progress.
    pub fn ease(&self, x: f32) -> f32 {
        if self.linear {
            return x;
        }
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        calc_bezier(self.t_for_x(x), self.p1.y, self.p2.y)
    }

    fn t_for_x(&self, x: f32) -> f32 {
        let mut interval_start = 0.0;
        let mut current = 1;
        let last = SPLINE_TABLE_SIZE - 1;

        while current != last && self.samples[current] <= x {
            interval_start += SAMPLE_STEP;
            current += 1;
        }
        current -= 1;

        let span = self.samples[current + 1] - self.samples[current];
        let dist = if span == 0.0 {
            0.0
        } else {
            (x - self.samples[current]) / span
        };
        let guess = interval_start + dist * SAMPLE_STEP;

        let initial_slope = slope(guess, self.p1.x, self.p2.x);
        if initial_slope >= NEWTON_MIN_SLOPE {
            newton_raphson(x, guess, self.p1.x, self.p2.x)
        } else if initial_slope == 0.0 {
            guess
        } else {
            binary_subdivide(
                x,
                interval_start,
                interval_start + SAMPLE_STEP,
                self.p1.x,
                self.p2.x,
            )
        }
    }
}

fn coeff_a(a1: f32, a2: f32) -> f32 {
    1.0 - 3.0 * a2 + 3.0 * a1
}

fn coeff_b(a1: f32, a2: f32) -> f32 {
    3.0 * a2 - 6.0 * a1
}

fn coeff_c(a1: f32) -> f32 {
    3.0 * a1
}

fn calc_bezier(t: f32, a1: f32, a2: f32) -> f32 {
    ((coeff_a(a1, a2) * t + coeff_b(a1, a2)) * t + coeff_c(a1)) * t
}

fn slope(t: f32, a1: f32, a2: f32) -> f32 {
    3.0 * coeff_a(a1, a2) * t * t + 2.0 * coeff_b(a1, a2) * t + coeff_c(a1)
}

fn newton_raphson(x: f32, mut guess: f32, x1: f32, x2: f32) -> f32 {
    for _ in 0..NEWTON_ITERATIONS {
        let current_slope = slope(guess, x1, x2);
        if current_slope == 0.0 {
            return guess;
        }
        let current_x = calc_bezier(guess, x1, x2) - x;
        guess -= current_x / current_slope;
    }
    guess
}

fn binary_subdivide(x: f32, mut a: f32, mut b: f32, x1: f32, x2: f32) -> f32 {
    let mut t = a;
    for _ in 0..SUBDIVISION_MAX_ITERATIONS {
        t = a + (b - a) / 2.0;
        let current_x = calc_bezier(t, x1, x2) - x;
        if current_x.abs() <= SUBDIVISION_PRECISION {
            break;
        }
        if current_x > 0.0 {
            b = t;
        } else {
            a = t;
        }
    }
    t
}

type EasingKey = [u32; 4];

/// Memoizes easing curves by their exact control values.
///
/// One registry can be shared by every animation built in a process; tests
/// construct their own.
#[derive(Debug, Default)]
pub struct EasingRegistry {
    curves: HashMap<EasingKey, Arc<BezierEasing>>,
    lookups: usize,
}

impl EasingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn curve(&mut self, p1: Vec2, p2: Vec2) -> Arc<BezierEasing> {
        self.lookups += 1;
        let key = [p1.x.to_bits(), p1.y.to_bits(), p2.x.to_bits(), p2.y.to_bits()];
        self.curves
            .entry(key)
            .or_insert_with(|| Arc::new(BezierEasing::new(p1, p2)))
            .clone()
    }

    /// Distinct curves held.
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Total `curve` calls, hits included.
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}
