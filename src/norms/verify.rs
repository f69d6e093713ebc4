//! Algebraic self-verification for t-norm bundles
//!
//! Checks a freshly built [`OperationTNorm`](super::OperationTNorm) against
//! the t-norm axioms on a fixed sample grid: commutativity, associativity,
//! monotonicity, boundary conditions, the Archimedean property, the additive
//! generator identity and De Morgan duality under the q-rung complement.
//!
//! Deviations are downgraded to warnings, never errors: a numerically
//! imperfect norm remains usable. Each deviation is emitted through
//! `tracing::warn!` and collected into a [`NormCheckReport`].

use tracing::warn;

use super::{ArchimedeanKind, OperationTNorm, EPS};

/// Sample grid for pairwise property checks
const GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Coarser grid for triple-nested (associativity) checks
const COARSE_GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

/// Upper bound on stored warning messages (the deviation counter is exact)
const MAX_STORED_WARNINGS: usize = 16;

/// Options controlling construction-time verification
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Run verification at construction
    pub enabled: bool,
    /// Tolerance for exact algebraic identities
    pub tolerance: f64,
    /// Looser tolerance for generator round-trips away from singular inputs
    pub identity_tolerance: f64,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            enabled: true,
            tolerance: EPS,
            identity_tolerance: 1e-6,
        }
    }
}

/// Outcome of self-verification
#[derive(Debug, Clone, serde::Serialize)]
pub struct NormCheckReport {
    /// Operator name (family or custom generator name)
    pub norm: String,
    /// q-rung the operator was built with
    pub q: u32,
    /// Number of individual property evaluations
    pub checks: usize,
    /// Number of evaluations that deviated beyond tolerance
    pub deviations: usize,
    /// First few deviation messages (capped; `deviations` is the full count)
    pub warnings: Vec<String>,
}

impl NormCheckReport {
    /// Whether every check passed
    pub fn is_clean(&self) -> bool {
        self.deviations == 0
    }

    fn record(&mut self, message: String) {
        self.deviations += 1;
        warn!(norm = %self.norm, q = self.q, "{}", message);
        if self.warnings.len() < MAX_STORED_WARNINGS {
            self.warnings.push(message);
        }
    }
}

/// Run the full property suite against an operator bundle
pub fn verify(op: &OperationTNorm, options: &VerifyOptions) -> NormCheckReport {
    let mut report = NormCheckReport {
        norm: op.name().to_string(),
        q: op.q(),
        checks: 0,
        deviations: 0,
        warnings: Vec::new(),
    };
    let tol = options.tolerance;

    // Commutativity: T(a,b) = T(b,a), S(a,b) = S(b,a)
    for &a in &GRID {
        for &b in &GRID {
            report.checks += 1;
            if (op.t_norm(a, b) - op.t_norm(b, a)).abs() > tol {
                report.record(format!("commutativity violated at T({}, {})", a, b));
            }
            report.checks += 1;
            if (op.t_conorm(a, b) - op.t_conorm(b, a)).abs() > tol {
                report.record(format!("commutativity violated at S({}, {})", a, b));
            }
        }
    }

    // Associativity: T(T(a,b),c) = T(a,T(b,c))
    for &a in &COARSE_GRID {
        for &b in &COARSE_GRID {
            for &c in &COARSE_GRID {
                report.checks += 1;
                let left = op.t_norm(op.t_norm(a, b), c);
                let right = op.t_norm(a, op.t_norm(b, c));
                if (left - right).abs() > options.identity_tolerance {
                    report.record(format!(
                        "associativity violated at ({}, {}, {}): {} vs {}",
                        a, b, c, left, right
                    ));
                }
            }
        }
    }

    // Monotonicity: a <= b implies T(a,c) <= T(b,c)
    for &a in &GRID {
        for &b in &GRID {
            if a > b {
                continue;
            }
            for &c in &COARSE_GRID {
                report.checks += 1;
                if op.t_norm(a, c) > op.t_norm(b, c) + tol {
                    report.record(format!(
                        "monotonicity violated: T({}, {}) > T({}, {})",
                        a, c, b, c
                    ));
                }
            }
        }
    }

    // Boundary: T(a,1) = a and S(a,0) = a
    for &a in &GRID {
        report.checks += 1;
        if (op.t_norm(a, 1.0) - a).abs() > options.identity_tolerance {
            report.record(format!("boundary violated: T({}, 1) = {}", a, op.t_norm(a, 1.0)));
        }
        report.checks += 1;
        if (op.t_conorm(a, 0.0) - a).abs() > options.identity_tolerance {
            report.record(format!("boundary violated: S({}, 0) = {}", a, op.t_conorm(a, 0.0)));
        }
    }

    // Archimedean property: T(a,a) < a (strict) or <= a (nilpotent)
    match op.archimedean_kind() {
        ArchimedeanKind::Strict => {
            for &a in &GRID {
                report.checks += 1;
                if op.t_norm(a, a) >= a - tol {
                    report.record(format!(
                        "strict Archimedean property violated: T({0}, {0}) = {1}",
                        a,
                        op.t_norm(a, a)
                    ));
                }
            }
        }
        ArchimedeanKind::Nilpotent => {
            for &a in &GRID {
                report.checks += 1;
                if op.t_norm(a, a) > a + tol {
                    report.record(format!(
                        "Archimedean property violated: T({0}, {0}) = {1} > {0}",
                        a,
                        op.t_norm(a, a)
                    ));
                }
            }
        }
        ArchimedeanKind::None => {}
    }

    // Generator identity: T(a,b) = g_inv(g(a) + g(b)), away from 0/1
    if op.has_generator() {
        for &a in &GRID {
            for &b in &GRID {
                report.checks += 1;
                let direct = op.t_norm(a, b);
                let via = op
                    .g(a)
                    .zip(op.g(b))
                    .and_then(|(ga, gb)| op.g_inv(ga + gb));
                match via {
                    Some(v) if (v - direct).abs() > options.identity_tolerance => {
                        report.record(format!(
                            "generator identity violated at ({}, {}): {} vs {}",
                            a, b, direct, v
                        ));
                    }
                    None => {
                        report.record(format!("generator unavailable at ({}, {})", a, b));
                    }
                    _ => {}
                }
            }
        }
    }

    // De Morgan duality under the q-rung complement N(x) = (1 - x^q)^(1/q)
    for &a in &COARSE_GRID {
        for &b in &COARSE_GRID {
            report.checks += 1;
            let lhs = op.t_conorm(a, b);
            let rhs = op.complement(op.t_norm(op.complement(a), op.complement(b)));
            if (lhs - rhs).abs() > options.identity_tolerance {
                report.record(format!(
                    "De Morgan duality violated at ({}, {}): S = {} vs N(T(N,N)) = {}",
                    a, b, lhs, rhs
                ));
            }
        }
    }

    report
}
