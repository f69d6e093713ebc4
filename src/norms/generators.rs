//! Pure per-family t-norm, t-conorm and additive-generator functions
//!
//! Everything here is a stateless function of `(family, params, inputs)`.
//! [`super::OperationTNorm`] layers q-generalization, custom generators and
//! self-verification on top of these base forms.
//!
//! Edge policy: inputs are clamped to [0,1] before evaluation; `g(0)` maps to
//! `+inf` and `g(1)` to `0` instead of raising; pseudo-inverses clamp their
//! argument into the generator's range so no NaN escapes.

use super::{NormFamily, NormParams};

/// Tolerance used for boundary comparisons throughout the norm engine
pub const EPS: f64 = 1e-12;

/// Clamp a membership degree into [0,1], mapping NaN to 0
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Sanitize a generator value: NaN maps to the `+inf` sentinel
fn sanitize_gen(u: f64) -> f64 {
    if u.is_nan() {
        f64::INFINITY
    } else {
        u.max(0.0)
    }
}

// ============================================================================
// Base t-norms
// ============================================================================

/// Evaluate the base (q=1) t-norm of a family
pub fn t_norm(family: NormFamily, params: &NormParams, a: f64, b: f64) -> f64 {
    let a = clamp01(a);
    let b = clamp01(b);
    let t = match family {
        NormFamily::Algebraic => a * b,
        NormFamily::Lukasiewicz => (a + b - 1.0).max(0.0),
        NormFamily::Einstein => a * b / (1.0 + (1.0 - a) * (1.0 - b)),
        NormFamily::Hamacher => {
            let gamma = params.hamacher_gamma;
            if a < EPS && b < EPS {
                0.0
            } else {
                a * b / (gamma + (1.0 - gamma) * (a + b - a * b))
            }
        }
        NormFamily::Yager => {
            let p = params.yager_p;
            let s = ((1.0 - a).powf(p) + (1.0 - b).powf(p)).powf(1.0 / p);
            (1.0 - s).max(0.0)
        }
        NormFamily::SchweizerSklar => {
            let p = params.sklar_p;
            if p > 0.0 {
                if a < EPS || b < EPS {
                    0.0
                } else {
                    (a.powf(-p) + b.powf(-p) - 1.0).powf(-1.0 / p)
                }
            } else {
                let r = -p;
                (a.powf(r) + b.powf(r) - 1.0).max(0.0).powf(1.0 / r)
            }
        }
        NormFamily::Dombi => {
            let p = params.dombi_p;
            if a < EPS || b < EPS {
                0.0
            } else if (1.0 - a) < EPS {
                b
            } else if (1.0 - b) < EPS {
                a
            } else {
                let u = ((1.0 - a) / a).powf(p) + ((1.0 - b) / b).powf(p);
                1.0 / (1.0 + u.powf(1.0 / p))
            }
        }
        NormFamily::AczelAlsina => {
            let p = params.aa_p;
            if a < EPS || b < EPS {
                0.0
            } else {
                let u = (-a.ln()).powf(p) + (-b.ln()).powf(p);
                (-u.powf(1.0 / p)).exp()
            }
        }
        NormFamily::Frank => {
            let s = params.frank_s;
            let num = (s.powf(a) - 1.0) * (s.powf(b) - 1.0) / (s - 1.0);
            (1.0 + num).ln() / s.ln()
        }
        NormFamily::Minimum => a.min(b),
        NormFamily::Drastic => {
            if (1.0 - a).abs() < EPS {
                b
            } else if (1.0 - b).abs() < EPS {
                a
            } else {
                0.0
            }
        }
        NormFamily::Nilpotent => {
            if a + b > 1.0 {
                a.min(b)
            } else {
                0.0
            }
        }
    };
    clamp01(t)
}

// ============================================================================
// Base t-conorms
// ============================================================================

/// Evaluate the base (q=1) t-conorm of a family
///
/// Standard closed forms where they exist; otherwise the De Morgan dual
/// `S(a,b) = 1 - T(1-a, 1-b)`.
pub fn t_conorm(family: NormFamily, params: &NormParams, a: f64, b: f64) -> f64 {
    let a = clamp01(a);
    let b = clamp01(b);
    let s = match family {
        NormFamily::Algebraic => a + b - a * b,
        NormFamily::Lukasiewicz => (a + b).min(1.0),
        NormFamily::Einstein => (a + b) / (1.0 + a * b),
        NormFamily::Hamacher => {
            let gamma = params.hamacher_gamma;
            let denom = 1.0 - (1.0 - gamma) * a * b;
            (a + b - a * b - (1.0 - gamma) * a * b) / denom
        }
        NormFamily::Yager => {
            let p = params.yager_p;
            (a.powf(p) + b.powf(p)).powf(1.0 / p).min(1.0)
        }
        NormFamily::Dombi => {
            let p = params.dombi_p;
            if (1.0 - a) < EPS || (1.0 - b) < EPS {
                1.0
            } else if a < EPS {
                b
            } else if b < EPS {
                a
            } else {
                let u = (a / (1.0 - a)).powf(p) + (b / (1.0 - b)).powf(p);
                1.0 / (1.0 + u.powf(-1.0 / p))
            }
        }
        NormFamily::AczelAlsina => {
            let p = params.aa_p;
            if (1.0 - a) < EPS || (1.0 - b) < EPS {
                1.0
            } else {
                let u = (-(1.0 - a).ln()).powf(p) + (-(1.0 - b).ln()).powf(p);
                1.0 - (-u.powf(1.0 / p)).exp()
            }
        }
        NormFamily::Minimum => a.max(b),
        NormFamily::Drastic => {
            if a < EPS {
                b
            } else if b < EPS {
                a
            } else {
                1.0
            }
        }
        NormFamily::Nilpotent => {
            if a + b < 1.0 {
                a.max(b)
            } else {
                1.0
            }
        }
        // SchweizerSklar and Frank duals have no simpler closed form
        NormFamily::SchweizerSklar | NormFamily::Frank => {
            1.0 - t_norm(family, params, 1.0 - a, 1.0 - b)
        }
    };
    clamp01(s)
}

// ============================================================================
// Additive generators
// ============================================================================

/// Evaluate the base additive generator `g` of an Archimedean family
///
/// `g` is strictly decreasing on [0,1] with `g(1) = 0`; `g(0)` is `+inf` for
/// strict families and finite for nilpotent ones. Returns `None` for the
/// non-Archimedean families (minimum, drastic, nilpotent).
pub fn generator(family: NormFamily, params: &NormParams, a: f64) -> Option<f64> {
    let a = clamp01(a);
    let u = match family {
        NormFamily::Algebraic => -a.ln(),
        NormFamily::Lukasiewicz => 1.0 - a,
        NormFamily::Einstein => ((2.0 - a) / a).ln(),
        NormFamily::Hamacher => {
            let gamma = params.hamacher_gamma;
            ((gamma + (1.0 - gamma) * a) / a).ln()
        }
        NormFamily::Yager => (1.0 - a).powf(params.yager_p),
        NormFamily::SchweizerSklar => {
            let p = params.sklar_p;
            if p > 0.0 {
                a.powf(-p) - 1.0
            } else {
                1.0 - a.powf(-p)
            }
        }
        NormFamily::Dombi => ((1.0 - a) / a).powf(params.dombi_p),
        NormFamily::AczelAlsina => (-a.ln()).powf(params.aa_p),
        NormFamily::Frank => {
            let s = params.frank_s;
            -((s.powf(a) - 1.0) / (s - 1.0)).ln()
        }
        NormFamily::Minimum | NormFamily::Drastic | NormFamily::Nilpotent => return None,
    };
    Some(sanitize_gen(u))
}

/// Evaluate the base pseudo-inverse `g⁻¹` of an Archimedean family
///
/// Clamps its argument into the generator's range: `u < 0` maps to 1,
/// `u > g(0)` maps to 0. Returns `None` for non-Archimedean families.
pub fn pseudo_inverse(family: NormFamily, params: &NormParams, u: f64) -> Option<f64> {
    if u.is_nan() {
        return Some(0.0);
    }
    let u = u.max(0.0);
    let a = match family {
        NormFamily::Algebraic => (-u).exp(),
        NormFamily::Lukasiewicz => (1.0 - u).max(0.0),
        NormFamily::Einstein => 2.0 / (u.exp() + 1.0),
        NormFamily::Hamacher => {
            let gamma = params.hamacher_gamma;
            gamma / (u.exp() + gamma - 1.0)
        }
        NormFamily::Yager => {
            let p = params.yager_p;
            if u >= 1.0 {
                0.0
            } else {
                1.0 - u.powf(1.0 / p)
            }
        }
        NormFamily::SchweizerSklar => {
            let p = params.sklar_p;
            if p > 0.0 {
                (1.0 + u).powf(-1.0 / p)
            } else {
                (1.0 - u).max(0.0).powf(-1.0 / p)
            }
        }
        NormFamily::Dombi => {
            let p = params.dombi_p;
            if u.is_infinite() {
                0.0
            } else {
                1.0 / (1.0 + u.powf(1.0 / p))
            }
        }
        NormFamily::AczelAlsina => {
            let p = params.aa_p;
            (-u.powf(1.0 / p)).exp()
        }
        NormFamily::Frank => {
            let s = params.frank_s;
            (1.0 + (s - 1.0) * (-u).exp()).ln() / s.ln()
        }
        NormFamily::Minimum | NormFamily::Drastic | NormFamily::Nilpotent => return None,
    };
    Some(clamp01(a))
}

// ============================================================================
// Numeric pseudo-inverse
// ============================================================================

/// Cap on bisection refinement steps for custom generators
pub const MAX_BISECT_ITERATIONS: usize = 100;

/// Approximate the pseudo-inverse of an arbitrary decreasing generator
///
/// Used when no closed-form inverse is known. Bisects on [0,1] until the
/// bracket collapses below [`EPS`] or [`MAX_BISECT_ITERATIONS`] is reached,
/// returning the best approximation found. Arguments outside the generator's
/// range clamp to the corresponding endpoint.
pub fn bisect_inverse<G>(g: G, u: f64) -> f64
where
    G: Fn(f64) -> f64,
{
    if u.is_nan() || u <= 0.0 {
        return 1.0;
    }
    let g0 = g(0.0);
    if u >= g0 {
        return 0.0;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    // Invariant: g(lo) >= u >= g(hi), g decreasing
    for _ in 0..MAX_BISECT_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let gm = g(mid);
        if (gm - u).abs() < EPS {
            return mid;
        }
        if gm > u {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < EPS {
            break;
        }
    }
    0.5 * (lo + hi)
}
