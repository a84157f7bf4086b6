//! Real roots of quadratic, cubic and quartic polynomials
//!
//! Roots are returned unordered in a fixed-capacity [`Roots`]. An empty result
//! means "no real root"; a root that is exactly zero is simply `0.0` in the
//! list. Degenerate inputs (zero leading coefficient, non-finite values,
//! Newton-Raphson failing to converge) never produce NaN or infinite roots.

use crate::consts::{DEGENERATE_COEFFICIENT, NEWTON_MAX_ITERATIONS, NEWTON_TOLERANCE};

/// Up to four real roots
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Roots {
    values: [f64; 4],
    len: usize,
}

impl Roots {
    pub const NONE: Roots = Roots {
        values: [0.0; 4],
        len: 0,
    };

    fn push(&mut self, x: f64) {
        if self.len < self.values.len() && x.is_finite() {
            self.values[self.len] = x;
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.as_slice().iter().copied()
    }

    /// Roots in ascending order
    pub fn sorted(mut self) -> Self {
        self.values[..self.len].sort_by(f64::total_cmp);
        self
    }
}

/// Solve `a*x + b = 0`
pub fn solve_linear(a: f64, b: f64) -> Roots {
    let mut roots = Roots::NONE;
    if a != 0.0 && a.is_finite() && b.is_finite() {
        roots.push(-b / a);
    }
    roots
}

/// Solve `a*x^2 + b*x + c = 0`
///
/// A zero `a` is handed to [`solve_linear`] instead of being divided by.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Roots::NONE;
    }
    if a == 0.0 {
        return solve_linear(b, c);
    }

    let discriminant = b * b - 4.0 * a * c;
    let mut roots = Roots::NONE;
    if discriminant < 0.0 {
        return roots;
    }
    if discriminant == 0.0 {
        roots.push(-b / (2.0 * a));
        return roots;
    }

    // Cancellation-free form: q never vanishes while the discriminant is positive
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    roots.push(q / a);
    roots.push(c / q);
    roots
}

/// Solve `a*x^3 + b*x^2 + c*x + d = 0`
///
/// One root comes from Newton-Raphson started at zero; the remaining quadratic
/// factor is found by synthetic division. If Newton-Raphson does not converge
/// the result is empty rather than a wrong value.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots {
    if !(a.is_finite() && b.is_finite() && c.is_finite() && d.is_finite()) {
        return Roots::NONE;
    }
    if a == 0.0 {
        return solve_quadratic(b, c, d);
    }

    let (b, c, d) = (b / a, c / a, d / a);
    let cubic = |x: f64| {
        let value = ((x + b) * x + c) * x + d;
        let slope = (3.0 * x + 2.0 * b) * x + c;
        (value, slope)
    };

    // Every root lies strictly inside the Cauchy bound, so the bracket always changes sign
    let bound = cauchy_bound(&[b, c, d]);
    let Some(root) = refine_root(cubic, -bound, bound, 0.0) else {
        log::debug!("cubic: Newton-Raphson did not converge (b={b}, c={c}, d={d})");
        return Roots::NONE;
    };

    // Synthetic division by (x - root)
    let b1 = b + root;
    let c1 = c + b1 * root;

    let mut roots = Roots::NONE;
    roots.push(root);
    for x in solve_quadratic(1.0, b1, c1).iter() {
        roots.push(x);
    }
    roots
}

/// Solve `a*x^4 + b*x^3 + c*x^2 + d*x + e = 0`
///
/// The stationary points (roots of the cubic derivative) split the real line
/// into intervals on which the quartic is monotone. Each interval whose ends
/// have opposite signs holds exactly one root; it is seeded from a local
/// quadratic model at the adjacent stationary point and refined by
/// Newton-Raphson on the quartic itself. A stationary point where the quartic
/// vanishes is itself a (repeated) root.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Roots {
    if !(a.is_finite() && b.is_finite() && c.is_finite() && d.is_finite() && e.is_finite()) {
        return Roots::NONE;
    }
    if a == 0.0 {
        return solve_cubic(b, c, d, e);
    }

    let (b, c, d, e) = (b / a, c / a, d / a, e / a);
    let quartic = |x: f64| {
        let value = (((x + b) * x + c) * x + d) * x + e;
        let slope = ((4.0 * x + 3.0 * b) * x + 2.0 * c) * x + d;
        (value, slope)
    };
    let curvature = |x: f64| (12.0 * x + 6.0 * b) * x + 2.0 * c;
    let rounding = |x: f64| {
        let ax = x.abs();
        let magnitude = (((ax + b.abs()) * ax + c.abs()) * ax + d.abs()) * ax + e.abs();
        16.0 * f64::EPSILON * magnitude
    };

    let mut stationary: Vec<f64> = solve_cubic(4.0, 3.0 * b, 2.0 * c, d)
        .sorted()
        .iter()
        .collect();
    stationary.dedup_by(|x, y| (*x - *y).abs() <= 1e-9 * x.abs().max(1.0));
    if stationary.is_empty() {
        return Roots::NONE;
    }

    let bound = cauchy_bound(&[b, c, d, e]);
    let mut roots = Roots::NONE;

    // Knots: the outer bracket ends (where the quartic is positive) and every stationary point
    let mut knots = Vec::with_capacity(stationary.len() + 2);
    knots.push((-bound, quartic(-bound).0, false));
    for &s in &stationary {
        let (value, _) = quartic(s);
        if value.abs() <= rounding(s) {
            roots.push(s);
            knots.push((s, 0.0, true));
        } else {
            knots.push((s, value, true));
        }
    }
    knots.push((bound, quartic(bound).0, false));

    for pair in knots.windows(2) {
        let (lo, f_lo, lo_stationary) = pair[0];
        let (hi, f_hi, hi_stationary) = pair[1];
        if f_lo == 0.0 || f_hi == 0.0 || f_lo.signum() == f_hi.signum() {
            continue;
        }

        // Seed from whichever stationary end sits closer to zero
        let anchor = match (lo_stationary, hi_stationary) {
            (true, true) if f_lo.abs() <= f_hi.abs() => Some((lo, 1.0)),
            (true, true) => Some((hi, -1.0)),
            (true, false) => Some((lo, 1.0)),
            (false, true) => Some((hi, -1.0)),
            (false, false) => None,
        };
        let guess = anchor
            .and_then(|(s, direction)| {
                let (value, slope) = quartic(s);
                local_quadratic_step(value, slope, curvature(s), direction).map(|step| s + step)
            })
            .unwrap_or(0.5 * (lo + hi));

        if let Some(root) = refine_root(quartic, lo, hi, guess) {
            roots.push(root);
        }
    }

    roots
}

/// Roots of a polynomial given highest-degree coefficient first (degree <= 4)
///
/// Leading coefficients that are negligible next to the largest one are
/// dropped, so a quartic whose leading terms cancel is solved as the cubic,
/// quadratic or linear equation it really is.
pub fn solve_polynomial(coefficients: &[f64]) -> Roots {
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Roots::NONE;
    }
    let largest = coefficients.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if largest == 0.0 {
        return Roots::NONE;
    }
    let first = coefficients
        .iter()
        .position(|c| c.abs() > DEGENERATE_COEFFICIENT * largest)
        .unwrap_or(coefficients.len());

    match &coefficients[first..] {
        [a, b, c, d, e] => solve_quartic(*a, *b, *c, *d, *e),
        [a, b, c, d] => solve_cubic(*a, *b, *c, *d),
        [a, b, c] => solve_quadratic(*a, *b, *c),
        [a, b] => solve_linear(*a, *b),
        _ => Roots::NONE,
    }
}

/// Evaluate a polynomial (highest degree first) with Horner's rule
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * x + c)
}

/// Bound on root magnitude for a monic polynomial with the given lower coefficients
fn cauchy_bound(lower: &[f64]) -> f64 {
    1.0 + lower.iter().fold(0.0_f64, |m, c| m.max(c.abs()))
}

/// Offset from a stationary point to the root of its local quadratic model
///
/// `direction` is +1 when the wanted root lies to the right. The model
/// `value + slope*h + curvature*h^2/2` has two branches; the one on the
/// requested side is the basin the sign change lives in.
fn local_quadratic_step(value: f64, slope: f64, curvature: f64, direction: f64) -> Option<f64> {
    solve_quadratic(0.5 * curvature, slope, value)
        .iter()
        .filter(|h| h * direction > 0.0)
        .min_by(|x, y| x.abs().total_cmp(&y.abs()))
}

/// Newton-Raphson inside a sign-changing bracket
///
/// Steps that would leave the bracket fall back to bisection, so the iteration
/// cannot wander into another root's basin. Returns `None` if the bracket does
/// not change sign or the iteration cap is reached first.
fn refine_root<F>(f: F, lo: f64, hi: f64, guess: f64) -> Option<f64>
where
    F: Fn(f64) -> (f64, f64),
{
    let (f_lo, _) = f(lo);
    let (f_hi, _) = f(hi);
    if !(f_lo.is_finite() && f_hi.is_finite()) {
        return None;
    }
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return None;
    }

    // Orient so that f(neg) < 0 < f(pos)
    let (mut neg, mut pos) = if f_lo < 0.0 { (lo, hi) } else { (hi, lo) };
    let inside = |x: f64, a: f64, b: f64| x > a.min(b) && x < a.max(b);

    let mut x = if inside(guess, neg, pos) {
        guess
    } else {
        0.5 * (neg + pos)
    };

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let (value, slope) = f(x);
        if !value.is_finite() {
            return None;
        }
        if value == 0.0 {
            return Some(x);
        }
        if value < 0.0 {
            neg = x;
        } else {
            pos = x;
        }

        let newton = x - value / slope;
        let next = if slope != 0.0 && newton.is_finite() && inside(newton, neg, pos) {
            newton
        } else {
            0.5 * (neg + pos)
        };

        if (next - x).abs() <= NEWTON_TOLERANCE * x.abs().max(1.0) {
            return Some(next);
        }
        x = next;
    }

    None
}
