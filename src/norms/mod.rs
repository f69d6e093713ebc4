//! Triangular-norm engine
//!
//! Builds q-generalized t-norm/t-conorm operator bundles from a family
//! identifier, an integer q-rung and family parameters:
//!
//! - [`NormFamily`] - the twelve supported families
//! - [`NormParams`] - family-specific parameters with domain validation
//! - [`OperationTNorm`] - the assembled operator bundle: `t_norm`, `t_conorm`,
//!   generator `g`, pseudo-inverse `g_inv`, dual generator `f`, `f_inv`
//! - [`verify::NormCheckReport`] - non-fatal algebraic self-verification
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzznum::norms::{NormFamily, NormParams, OperationTNorm};
//!
//! let op = OperationTNorm::new(NormFamily::Algebraic, 1, NormParams::default())?;
//! assert_eq!(op.t_norm(0.5, 0.8), 0.4);
//! assert_eq!(op.t_conorm(0.5, 0.8), 0.9);
//! ```

pub mod generators;
pub mod verify;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{FuzzError, FuzzResult};

pub use generators::{bisect_inverse, clamp01, EPS, MAX_BISECT_ITERATIONS};
pub use verify::{NormCheckReport, VerifyOptions};

// ============================================================================
// Families
// ============================================================================

/// The supported t-norm families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormFamily {
    Algebraic,
    Lukasiewicz,
    Einstein,
    Hamacher,
    Yager,
    SchweizerSklar,
    Dombi,
    AczelAlsina,
    Frank,
    Minimum,
    Drastic,
    Nilpotent,
}

impl NormFamily {
    /// Every supported family, in declaration order
    pub const ALL: [NormFamily; 12] = [
        NormFamily::Algebraic,
        NormFamily::Lukasiewicz,
        NormFamily::Einstein,
        NormFamily::Hamacher,
        NormFamily::Yager,
        NormFamily::SchweizerSklar,
        NormFamily::Dombi,
        NormFamily::AczelAlsina,
        NormFamily::Frank,
        NormFamily::Minimum,
        NormFamily::Drastic,
        NormFamily::Nilpotent,
    ];

    /// String identifier of this family
    pub fn name(&self) -> &'static str {
        match self {
            NormFamily::Algebraic => "algebraic",
            NormFamily::Lukasiewicz => "lukasiewicz",
            NormFamily::Einstein => "einstein",
            NormFamily::Hamacher => "hamacher",
            NormFamily::Yager => "yager",
            NormFamily::SchweizerSklar => "schweizer_sklar",
            NormFamily::Dombi => "dombi",
            NormFamily::AczelAlsina => "aczel_alsina",
            NormFamily::Frank => "frank",
            NormFamily::Minimum => "minimum",
            NormFamily::Drastic => "drastic",
            NormFamily::Nilpotent => "nilpotent",
        }
    }

    /// Whether this family has an additive generator
    pub fn has_generator(&self) -> bool {
        !matches!(
            self,
            NormFamily::Minimum | NormFamily::Drastic | NormFamily::Nilpotent
        )
    }

    /// Whether this family supports q-generalization
    ///
    /// Identical to [`has_generator`](Self::has_generator): q-generalization
    /// is defined through the generator.
    pub fn supports_q(&self) -> bool {
        self.has_generator()
    }
}

impl Default for NormFamily {
    fn default() -> Self {
        NormFamily::Algebraic
    }
}

impl fmt::Display for NormFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NormFamily {
    type Err = FuzzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "algebraic" => Ok(NormFamily::Algebraic),
            "lukasiewicz" => Ok(NormFamily::Lukasiewicz),
            "einstein" => Ok(NormFamily::Einstein),
            "hamacher" => Ok(NormFamily::Hamacher),
            "yager" => Ok(NormFamily::Yager),
            "schweizer_sklar" => Ok(NormFamily::SchweizerSklar),
            "dombi" => Ok(NormFamily::Dombi),
            "aczel_alsina" => Ok(NormFamily::AczelAlsina),
            "frank" => Ok(NormFamily::Frank),
            "minimum" => Ok(NormFamily::Minimum),
            "drastic" => Ok(NormFamily::Drastic),
            "nilpotent" => Ok(NormFamily::Nilpotent),
            other => Err(FuzzError::unknown_family(other)),
        }
    }
}

/// How a family satisfies (or does not satisfy) the Archimedean property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchimedeanKind {
    /// `T(a,a) < a` strictly on (0,1), generator unbounded at 0
    Strict,
    /// `T(a,a) ≤ a`, generator bounded at 0 (nilpotent t-norms)
    Nilpotent,
    /// Not Archimedean; no generator
    None,
}

// ============================================================================
// Parameters
// ============================================================================

/// Family-specific parameters
///
/// Defaults put every parameterized family at a representative point of its
/// domain; [`validate`](Self::validate) enforces the domain for the family
/// actually in use.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NormParams {
    /// Hamacher γ, must be > 0
    pub hamacher_gamma: f64,
    /// Yager p, must be > 0
    pub yager_p: f64,
    /// Schweizer-Sklar p, must be ≠ 0
    pub sklar_p: f64,
    /// Dombi p, must be > 0
    pub dombi_p: f64,
    /// Aczel-Alsina p, must be > 0
    pub aa_p: f64,
    /// Frank s, must be > 0 and ≠ 1
    pub frank_s: f64,
}

impl Default for NormParams {
    fn default() -> Self {
        NormParams {
            hamacher_gamma: 1.0,
            yager_p: 2.0,
            sklar_p: 1.0,
            dombi_p: 1.0,
            aa_p: 1.0,
            frank_s: 2.0,
        }
    }
}

impl NormParams {
    /// Build from keyword-style parameters (`hamacher_gamma`, `yager_p`,
    /// `sklar_p`, `dombi_p`, `aa_p`, `frank_s`); unknown keys are rejected
    pub fn from_map(map: &HashMap<String, f64>) -> FuzzResult<Self> {
        let mut params = NormParams::default();
        for (key, value) in map {
            match key.as_str() {
                "hamacher_gamma" => params.hamacher_gamma = *value,
                "yager_p" => params.yager_p = *value,
                "sklar_p" => params.sklar_p = *value,
                "dombi_p" => params.dombi_p = *value,
                "aa_p" => params.aa_p = *value,
                "frank_s" => params.frank_s = *value,
                other => {
                    return Err(FuzzError::value(format!(
                        "Unknown norm parameter '{}'",
                        other
                    )))
                }
            }
        }
        Ok(params)
    }

    /// Check the parameter domain for a family; errors name the violation
    pub fn validate(&self, family: NormFamily) -> FuzzResult<()> {
        match family {
            NormFamily::Hamacher if self.hamacher_gamma <= 0.0 => Err(FuzzError::parameter(
                "hamacher",
                format!("hamacher_gamma must be > 0, got {}", self.hamacher_gamma),
            )),
            NormFamily::Yager if self.yager_p <= 0.0 => Err(FuzzError::parameter(
                "yager",
                format!("yager_p must be > 0, got {}", self.yager_p),
            )),
            NormFamily::SchweizerSklar if self.sklar_p == 0.0 => Err(FuzzError::parameter(
                "schweizer_sklar",
                "sklar_p must be non-zero",
            )),
            NormFamily::Dombi if self.dombi_p <= 0.0 => Err(FuzzError::parameter(
                "dombi",
                format!("dombi_p must be > 0, got {}", self.dombi_p),
            )),
            NormFamily::AczelAlsina if self.aa_p <= 0.0 => Err(FuzzError::parameter(
                "aczel_alsina",
                format!("aa_p must be > 0, got {}", self.aa_p),
            )),
            NormFamily::Frank if self.frank_s <= 0.0 || (self.frank_s - 1.0).abs() < EPS => {
                Err(FuzzError::parameter(
                    "frank",
                    format!("frank_s must be > 0 and != 1, got {}", self.frank_s),
                ))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Custom generators
// ============================================================================

/// A user-supplied additive generator with a bisection pseudo-inverse
#[derive(Clone)]
pub struct CustomGenerator {
    name: String,
    g: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl CustomGenerator {
    fn g(&self, a: f64) -> f64 {
        (self.g)(clamp01(a)).max(0.0)
    }

    fn g_inv(&self, u: f64) -> f64 {
        bisect_inverse(|a| (self.g)(a), u)
    }
}

impl fmt::Debug for CustomGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomGenerator")
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// OperationTNorm
// ============================================================================

/// A q-generalized t-norm/t-conorm operator bundle
///
/// Immutable after construction; a pure function bundle with no interior
/// state, safe to share across threads.
///
/// With base generator `g_b` and q ≥ 1:
///
/// - `g(a) = g_b(a^q)`, `g_inv(u) = g_b⁻¹(u)^(1/q)`
/// - `f(a) = g_b(1 - a^q)`, `f_inv(u) = (1 - g_b⁻¹(u))^(1/q)`
/// - `T(a,b) = g_inv(g(a) + g(b))`, `S(a,b) = f_inv(f(a) + f(b))`
///
/// Non-Archimedean families carry no generator and are evaluated at their
/// base forms regardless of q.
#[derive(Debug, Clone)]
pub struct OperationTNorm {
    family: NormFamily,
    q: u32,
    params: NormParams,
    custom: Option<CustomGenerator>,
    report: Option<NormCheckReport>,
}

impl OperationTNorm {
    /// Build and self-verify an operator bundle
    ///
    /// Parameter-domain violations fail immediately; algebraic-property
    /// deviations found by self-verification are downgraded to warnings
    /// (retrievable via [`check_report`](Self::check_report)).
    pub fn new(family: NormFamily, q: u32, params: NormParams) -> FuzzResult<Self> {
        Self::with_options(family, q, params, &VerifyOptions::default())
    }

    /// Build with explicit verification options
    pub fn with_options(
        family: NormFamily,
        q: u32,
        params: NormParams,
        options: &VerifyOptions,
    ) -> FuzzResult<Self> {
        if q == 0 {
            return Err(FuzzError::new(
                crate::error::ErrorCode::InvalidQrung,
                format!("q must be >= 1, got {}", q),
            ));
        }
        params.validate(family)?;

        let mut op = OperationTNorm {
            family,
            q,
            params,
            custom: None,
            report: None,
        };
        if options.enabled {
            op.report = Some(verify::verify(&op, options));
        }
        Ok(op)
    }

    /// Resolve a family by name and build, with keyword parameters
    pub fn from_name(name: &str, q: u32, params: &HashMap<String, f64>) -> FuzzResult<Self> {
        let family = NormFamily::from_str(name)?;
        Self::new(family, q, NormParams::from_map(params)?)
    }

    /// Build from an arbitrary strictly-decreasing additive generator
    ///
    /// The pseudo-inverse is approximated by bisection (capped at
    /// [`MAX_BISECT_ITERATIONS`] refinement steps). The resulting operator is
    /// treated as strict Archimedean.
    pub fn from_generator<G>(name: impl Into<String>, q: u32, g: G) -> FuzzResult<Self>
    where
        G: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        if q == 0 {
            return Err(FuzzError::new(
                crate::error::ErrorCode::InvalidQrung,
                format!("q must be >= 1, got {}", q),
            ));
        }
        let custom = CustomGenerator {
            name: name.into(),
            g: Arc::new(g),
        };
        // Sanity: g must be decreasing with g(1) = 0
        if custom.g(1.0) > EPS || custom.g(0.25) <= custom.g(0.75) {
            return Err(FuzzError::value(
                "custom generator must be strictly decreasing with g(1) = 0",
            ));
        }
        let mut op = OperationTNorm {
            family: NormFamily::Algebraic,
            q,
            params: NormParams::default(),
            custom: Some(custom),
            report: None,
        };
        op.report = Some(verify::verify(&op, &VerifyOptions::default()));
        Ok(op)
    }

    /// The family this bundle was built from
    pub fn family(&self) -> NormFamily {
        self.family
    }

    /// Identifier used in error messages and cache keys
    pub fn name(&self) -> &str {
        match &self.custom {
            Some(c) => &c.name,
            None => self.family.name(),
        }
    }

    /// The q-rung of this bundle
    pub fn q(&self) -> u32 {
        self.q
    }

    /// The family parameters
    pub fn params(&self) -> &NormParams {
        &self.params
    }

    /// Self-verification report, if verification ran at construction
    pub fn check_report(&self) -> Option<&NormCheckReport> {
        self.report.as_ref()
    }

    /// How this operator satisfies the Archimedean property
    pub fn archimedean_kind(&self) -> ArchimedeanKind {
        if self.custom.is_some() {
            return ArchimedeanKind::Strict;
        }
        match self.family {
            NormFamily::Lukasiewicz | NormFamily::Yager => ArchimedeanKind::Nilpotent,
            NormFamily::SchweizerSklar if self.params.sklar_p < 0.0 => ArchimedeanKind::Nilpotent,
            NormFamily::Minimum | NormFamily::Drastic | NormFamily::Nilpotent => {
                ArchimedeanKind::None
            }
            _ => ArchimedeanKind::Strict,
        }
    }

    /// Whether this bundle exposes a generator
    pub fn has_generator(&self) -> bool {
        self.custom.is_some() || self.family.has_generator()
    }

    // ========================================================================
    // Operator surface
    // ========================================================================

    /// The q-generalized t-norm `T(a, b)`
    pub fn t_norm(&self, a: f64, b: f64) -> f64 {
        let a = clamp01(a);
        let b = clamp01(b);
        if let Some(custom) = &self.custom {
            let u = custom.g(self.q_pow(a)) + custom.g(self.q_pow(b));
            return clamp01(self.q_root(custom.g_inv(u)));
        }
        if !self.family.has_generator() || self.q == 1 {
            return generators::t_norm(self.family, &self.params, a, b);
        }
        let base = generators::t_norm(self.family, &self.params, self.q_pow(a), self.q_pow(b));
        clamp01(self.q_root(base))
    }

    /// The q-generalized t-conorm `S(a, b)`
    pub fn t_conorm(&self, a: f64, b: f64) -> f64 {
        let a = clamp01(a);
        let b = clamp01(b);
        if let Some(custom) = &self.custom {
            let fa = custom.g(1.0 - self.q_pow(a));
            let fb = custom.g(1.0 - self.q_pow(b));
            return clamp01(self.q_root(1.0 - custom.g_inv(fa + fb)));
        }
        if !self.family.has_generator() || self.q == 1 {
            return generators::t_conorm(self.family, &self.params, a, b);
        }
        let base = generators::t_conorm(self.family, &self.params, self.q_pow(a), self.q_pow(b));
        clamp01(self.q_root(base))
    }

    /// The q-generalized additive generator `g(a)`; `None` when the family
    /// has no generator
    pub fn g(&self, a: f64) -> Option<f64> {
        let aq = self.q_pow(clamp01(a));
        if let Some(custom) = &self.custom {
            return Some(custom.g(aq));
        }
        generators::generator(self.family, &self.params, aq)
    }

    /// The q-generalized pseudo-inverse `g⁻¹(u)`
    pub fn g_inv(&self, u: f64) -> Option<f64> {
        if let Some(custom) = &self.custom {
            return Some(clamp01(self.q_root(custom.g_inv(u))));
        }
        generators::pseudo_inverse(self.family, &self.params, u)
            .map(|a| clamp01(self.q_root(a)))
    }

    /// The dual generator `f(a) = g_b(1 - a^q)`
    pub fn f(&self, a: f64) -> Option<f64> {
        let arg = 1.0 - self.q_pow(clamp01(a));
        if let Some(custom) = &self.custom {
            return Some(custom.g(arg));
        }
        generators::generator(self.family, &self.params, arg)
    }

    /// The dual pseudo-inverse `f⁻¹(u) = (1 - g_b⁻¹(u))^(1/q)`
    pub fn f_inv(&self, u: f64) -> Option<f64> {
        if let Some(custom) = &self.custom {
            return Some(clamp01(self.q_root(1.0 - custom.g_inv(u))));
        }
        generators::pseudo_inverse(self.family, &self.params, u)
            .map(|a| clamp01(self.q_root(1.0 - a)))
    }

    /// The q-rung complement `N(x) = (1 - x^q)^(1/q)`
    pub fn complement(&self, x: f64) -> f64 {
        clamp01(self.q_root(1.0 - self.q_pow(clamp01(x))))
    }

    fn q_pow(&self, x: f64) -> f64 {
        if self.q == 1 {
            x
        } else {
            x.powi(self.q as i32)
        }
    }

    fn q_root(&self, x: f64) -> f64 {
        if self.q == 1 {
            x
        } else {
            x.max(0.0).powf(1.0 / self.q as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(family: NormFamily, q: u32) -> OperationTNorm {
        OperationTNorm::new(family, q, NormParams::default()).unwrap()
    }

    #[test]
    fn test_algebraic_q1_concrete() {
        let t = op(NormFamily::Algebraic, 1);
        assert!((t.t_norm(0.5, 0.8) - 0.4).abs() < EPS);
        assert!((t.t_conorm(0.5, 0.8) - 0.9).abs() < EPS);
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!(
            "schweizer_sklar".parse::<NormFamily>().unwrap(),
            NormFamily::SchweizerSklar
        );
        assert!("nope".parse::<NormFamily>().is_err());
    }

    #[test]
    fn test_parameter_domain_rejected() {
        let bad = NormParams {
            hamacher_gamma: -1.0,
            ..NormParams::default()
        };
        assert!(OperationTNorm::new(NormFamily::Hamacher, 1, bad).is_err());

        let bad = NormParams {
            frank_s: 1.0,
            ..NormParams::default()
        };
        assert!(OperationTNorm::new(NormFamily::Frank, 1, bad).is_err());

        let bad = NormParams {
            sklar_p: 0.0,
            ..NormParams::default()
        };
        assert!(OperationTNorm::new(NormFamily::SchweizerSklar, 1, bad).is_err());
    }

    #[test]
    fn test_q_zero_rejected() {
        let err = OperationTNorm::new(NormFamily::Algebraic, 0, NormParams::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_q2_algebraic_conorm_matches_hand_computation() {
        let t = op(NormFamily::Algebraic, 2);
        // S_2(a,b) = sqrt(a^2 + b^2 - a^2 b^2)
        let expected = (0.6f64.powi(2) + 0.5f64.powi(2)
            - 0.6f64.powi(2) * 0.5f64.powi(2))
        .sqrt();
        assert!((t.t_conorm(0.6, 0.5) - expected).abs() < EPS);
        // T_2(a,b) = sqrt(a^2 b^2) = ab for the algebraic family
        assert!((t.t_norm(0.3, 0.4) - 0.12).abs() < EPS);
    }

    #[test]
    fn test_q1_reduction_is_exact() {
        for family in NormFamily::ALL {
            if !family.has_generator() {
                continue;
            }
            let t1 = op(family, 1);
            for &(a, b) in &[(0.2, 0.7), (0.5, 0.5), (0.9, 0.1)] {
                let base = generators::t_norm(family, &NormParams::default(), a, b);
                assert_eq!(t1.t_norm(a, b), base, "{:?}", family);
            }
        }
    }

    #[test]
    fn test_generator_identity_q2() {
        for family in NormFamily::ALL {
            if !family.has_generator() {
                continue;
            }
            let t = op(family, 2);
            for &(a, b) in &[(0.3, 0.6), (0.5, 0.9)] {
                let direct = t.t_norm(a, b);
                let via_gen = t.g_inv(t.g(a).unwrap() + t.g(b).unwrap()).unwrap();
                assert!(
                    (direct - via_gen).abs() < 1e-6,
                    "{:?}: {} vs {}",
                    family,
                    direct,
                    via_gen
                );
            }
        }
    }

    #[test]
    fn test_dual_generator_identity() {
        for family in NormFamily::ALL {
            if !family.has_generator() {
                continue;
            }
            let t = op(family, 2);
            for &(a, b) in &[(0.3, 0.6), (0.5, 0.9)] {
                let direct = t.t_conorm(a, b);
                let via_gen = t.f_inv(t.f(a).unwrap() + t.f(b).unwrap()).unwrap();
                assert!(
                    (direct - via_gen).abs() < 1e-6,
                    "{:?}: {} vs {}",
                    family,
                    direct,
                    via_gen
                );
            }
        }
    }

    #[test]
    fn test_non_archimedean_has_no_generator() {
        for family in [NormFamily::Minimum, NormFamily::Drastic, NormFamily::Nilpotent] {
            let t = op(family, 3);
            assert!(!t.has_generator());
            assert!(t.g(0.5).is_none());
            assert!(t.f(0.5).is_none());
            // q is ignored: base forms apply
            assert_eq!(
                t.t_norm(0.3, 0.8),
                generators::t_norm(family, &NormParams::default(), 0.3, 0.8)
            );
        }
    }

    #[test]
    fn test_edge_sentinels() {
        let t = op(NormFamily::Algebraic, 2);
        assert!(t.g(0.0).unwrap().is_infinite());
        assert_eq!(t.g(1.0).unwrap(), 0.0);
        assert_eq!(t.g_inv(f64::INFINITY).unwrap(), 0.0);
        assert_eq!(t.g_inv(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_complement_involution() {
        let t = op(NormFamily::Algebraic, 3);
        for &x in &[0.0, 0.2, 0.5, 0.8, 1.0] {
            let back = t.complement(t.complement(x));
            assert!((back - x).abs() < 1e-9);
        }
    }

    #[test]
    fn test_custom_generator_matches_algebraic() {
        // -ln(a) is the algebraic generator; the bisection-backed custom
        // bundle must agree with the closed form
        let custom = OperationTNorm::from_generator("neg_log", 1, |a: f64| -a.ln()).unwrap();
        let closed = op(NormFamily::Algebraic, 1);
        for &(a, b) in &[(0.2, 0.7), (0.5, 0.5), (0.9, 0.3)] {
            assert!((custom.t_norm(a, b) - closed.t_norm(a, b)).abs() < 1e-8);
            assert!((custom.t_conorm(a, b) - closed.t_conorm(a, b)).abs() < 1e-8);
        }
    }

    #[test]
    fn test_custom_generator_rejects_increasing() {
        assert!(OperationTNorm::from_generator("bad", 1, |a: f64| a).is_err());
    }

    #[test]
    fn test_self_verification_report_present() {
        let t = op(NormFamily::Algebraic, 2);
        let report = t.check_report().unwrap();
        assert!(report.is_clean(), "warnings: {:?}", report.warnings);
    }
}
