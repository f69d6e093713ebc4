//! q-rung orthopair fuzzy numbers (mtype `qrofn`)
//!
//! A qrofn carries a membership degree `md` and a non-membership degree
//! `nmd`, both in [0,1], under the constraint `md^q + nmd^q <= 1`. The
//! constraint is re-checked on every mutation of `md`, `nmd` or `q`.
//!
//! All arithmetic is expressed through the injected t-norm bundle, so the
//! same strategy computes under any Archimedean family: addition joins
//! memberships with the t-conorm and non-memberships with the t-norm,
//! multiplication is the dual, and sub/div invert add/mul in generator space
//! with admissibility guards.

use crate::core::attrs::{scalar_attrs, AttrValue, AttributeMap};
use crate::core::traits::{
    current_generation, CompareOp, FuzznumStrategy, FuzznumTemplate, Generation, MetricCache,
    StrategyRef, ValidationReport,
};
use crate::error::{FuzzError, FuzzResult};
use crate::norms::{OperationTNorm, EPS};

/// The mtype tag for q-rung orthopair fuzzy numbers
pub const MTYPE: &str = "qrofn";

// ============================================================================
// Strategy
// ============================================================================

/// Numeric state and algebra of a qrofn
#[derive(Debug, Clone, PartialEq)]
pub struct QrofnStrategy {
    md: f64,
    nmd: f64,
    q: u32,
}

impl QrofnStrategy {
    /// A zero qrofn (md = 0, nmd = 0) at the given q-rung
    pub fn new(q: u32) -> FuzzResult<Self> {
        if q == 0 {
            return Err(FuzzError::new(
                crate::error::ErrorCode::InvalidQrung,
                format!("q must be >= 1, got {}", q),
            ));
        }
        Ok(QrofnStrategy { md: 0.0, nmd: 0.0, q })
    }

    /// Build with explicit degrees, validating range and constraint
    pub fn with_values(q: u32, md: f64, nmd: f64) -> FuzzResult<Self> {
        let mut strategy = Self::new(q)?;
        Self::check_degree("md", md)?;
        Self::check_degree("nmd", nmd)?;
        strategy.md = md;
        strategy.nmd = nmd;
        strategy.check_constraint()?;
        Ok(strategy)
    }

    /// Membership degree
    pub fn md(&self) -> f64 {
        self.md
    }

    /// Non-membership degree
    pub fn nmd(&self) -> f64 {
        self.nmd
    }

    fn check_degree(name: &str, value: f64) -> FuzzResult<()> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(FuzzError::value(format!(
                "{} must be in [0, 1], got {}",
                name, value
            ))
            .with_context("attribute", name));
        }
        Ok(())
    }

    fn check_constraint(&self) -> FuzzResult<()> {
        let sum = self.md.powi(self.q as i32) + self.nmd.powi(self.q as i32);
        if sum > 1.0 + EPS {
            return Err(FuzzError::constraint(format!(
                "md^q + nmd^q = {} exceeds 1 (md = {}, nmd = {}, q = {})",
                sum, self.md, self.nmd, self.q
            )));
        }
        Ok(())
    }

    /// Read the peer's degrees through the attribute interface
    fn peer(other: &dyn FuzznumStrategy) -> FuzzResult<(f64, f64)> {
        let md = other.get_attr("md")?.as_scalar()?;
        let nmd = other.get_attr("nmd")?.as_scalar()?;
        Ok((md, nmd))
    }

    fn score_of(&self) -> f64 {
        self.md.powi(self.q as i32) - self.nmd.powi(self.q as i32)
    }

    fn accuracy_of(&self) -> f64 {
        self.md.powi(self.q as i32) + self.nmd.powi(self.q as i32)
    }

    fn result(&self, md: f64, nmd: f64) -> AttributeMap {
        scalar_attrs(&[("md", md), ("nmd", nmd)])
    }

    /// Whether a candidate (md, nmd) pair is admissible at this q
    fn admissible(&self, md: f64, nmd: f64) -> bool {
        md.is_finite()
            && nmd.is_finite()
            && (0.0..=1.0).contains(&md)
            && (0.0..=1.0).contains(&nmd)
            && md.powi(self.q as i32) + nmd.powi(self.q as i32) <= 1.0 + EPS
    }

    /// `g(a)`, or NotImplemented for generator-less (non-Archimedean) norms
    fn req_g(op: &str, tnorm: &OperationTNorm, a: f64) -> FuzzResult<f64> {
        tnorm
            .g(a)
            .ok_or_else(|| FuzzError::not_implemented(op, MTYPE, tnorm.name()))
    }

    /// `f(a)`, or NotImplemented for generator-less norms
    fn req_f(op: &str, tnorm: &OperationTNorm, a: f64) -> FuzzResult<f64> {
        tnorm
            .f(a)
            .ok_or_else(|| FuzzError::not_implemented(op, MTYPE, tnorm.name()))
    }
}

impl FuzznumStrategy for QrofnStrategy {
    fn mtype(&self) -> &str {
        MTYPE
    }

    fn q(&self) -> u32 {
        self.q
    }

    fn set_q(&mut self, q: u32) -> FuzzResult<()> {
        if q == 0 {
            return Err(FuzzError::new(
                crate::error::ErrorCode::InvalidQrung,
                format!("q must be >= 1, got {}", q),
            ));
        }
        // validate-then-commit: constraint checked on a candidate copy
        let candidate = QrofnStrategy { q, ..*self };
        candidate.check_constraint()?;
        *self = candidate;
        Ok(())
    }

    fn attributes(&self) -> AttributeMap {
        self.result(self.md, self.nmd)
    }

    fn get_attr(&self, name: &str) -> FuzzResult<AttrValue> {
        match name {
            "md" => Ok(AttrValue::Scalar(self.md)),
            "nmd" => Ok(AttrValue::Scalar(self.nmd)),
            other => Err(FuzzError::unknown_attribute(MTYPE, other)),
        }
    }

    fn set_attr(&mut self, name: &str, value: AttrValue) -> FuzzResult<()> {
        let value = value.as_scalar()?;
        Self::check_degree(name, value)?;
        let candidate = match name {
            "md" => QrofnStrategy { md: value, ..*self },
            "nmd" => QrofnStrategy { nmd: value, ..*self },
            other => return Err(FuzzError::unknown_attribute(MTYPE, other)),
        };
        candidate.check_constraint()?;
        *self = candidate;
        Ok(())
    }

    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if let Err(err) = Self::check_degree("md", self.md) {
            report.issue(err.message);
        }
        if let Err(err) = Self::check_degree("nmd", self.nmd) {
            report.issue(err.message);
        }
        if self.q == 0 {
            report.issue("q must be >= 1");
        }
        if let Err(err) = self.check_constraint() {
            report.issue(err.message);
        }
        report
    }

    fn clone_box(&self) -> Box<dyn FuzznumStrategy> {
        Box::new(self.clone())
    }

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------

    fn add(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = tnorm.t_conorm(self.md, md2);
        let nmd = tnorm.t_norm(self.nmd, nmd2);
        Ok(self.result(md, nmd))
    }

    fn sub(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let f1 = Self::req_f("sub", tnorm, self.md)?;
        let f2 = Self::req_f("sub", tnorm, md2)?;
        let g1 = Self::req_g("sub", tnorm, self.nmd)?;
        let g2 = Self::req_g("sub", tnorm, nmd2)?;

        // invert addition in generator space; inadmissible differences
        // degenerate to the additive annihilator (0, 1)
        let diff_f = f1 - f2;
        let diff_g = g1 - g2;
        if !diff_f.is_finite() || !diff_g.is_finite() || diff_f < -EPS || diff_g < -EPS {
            return Ok(self.result(0.0, 1.0));
        }
        let md = tnorm.f_inv(diff_f.max(0.0));
        let nmd = tnorm.g_inv(diff_g.max(0.0));
        match (md, nmd) {
            (Some(md), Some(nmd)) if self.admissible(md, nmd) => Ok(self.result(md, nmd)),
            _ => Ok(self.result(0.0, 1.0)),
        }
    }

    fn mul(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = tnorm.t_norm(self.md, md2);
        let nmd = tnorm.t_conorm(self.nmd, nmd2);
        Ok(self.result(md, nmd))
    }

    fn div(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let g1 = Self::req_g("div", tnorm, self.md)?;
        let g2 = Self::req_g("div", tnorm, md2)?;
        let f1 = Self::req_f("div", tnorm, self.nmd)?;
        let f2 = Self::req_f("div", tnorm, nmd2)?;

        // invert multiplication; the multiplicative annihilator is (1, 0)
        let diff_g = g1 - g2;
        let diff_f = f1 - f2;
        if !diff_g.is_finite() || !diff_f.is_finite() || diff_g < -EPS || diff_f < -EPS {
            return Ok(self.result(1.0, 0.0));
        }
        let md = tnorm.g_inv(diff_g.max(0.0));
        let nmd = tnorm.f_inv(diff_f.max(0.0));
        match (md, nmd) {
            (Some(md), Some(nmd)) if self.admissible(md, nmd) => Ok(self.result(md, nmd)),
            _ => Ok(self.result(1.0, 0.0)),
        }
    }

    fn pow(&self, operand: f64, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        if !operand.is_finite() || operand <= 0.0 {
            return Err(FuzzError::value(format!(
                "pow exponent must be > 0, got {}",
                operand
            )));
        }
        let g_md = Self::req_g("pow", tnorm, self.md)?;
        let f_nmd = Self::req_f("pow", tnorm, self.nmd)?;
        let md = tnorm.g_inv(operand * g_md);
        let nmd = tnorm.f_inv(operand * f_nmd);
        match (md, nmd) {
            (Some(md), Some(nmd)) => Ok(self.result(md, nmd)),
            _ => Err(FuzzError::not_implemented("pow", MTYPE, tnorm.name())),
        }
    }

    fn tim(&self, operand: f64, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        if !operand.is_finite() || operand <= 0.0 {
            return Err(FuzzError::value(format!(
                "tim multiplier must be > 0, got {}",
                operand
            )));
        }
        let f_md = Self::req_f("tim", tnorm, self.md)?;
        let g_nmd = Self::req_g("tim", tnorm, self.nmd)?;
        let md = tnorm.f_inv(operand * f_md);
        let nmd = tnorm.g_inv(operand * g_nmd);
        match (md, nmd) {
            (Some(md), Some(nmd)) => Ok(self.result(md, nmd)),
            _ => Err(FuzzError::not_implemented("tim", MTYPE, tnorm.name())),
        }
    }

    // ------------------------------------------------------------------
    // Comparison and set operations
    // ------------------------------------------------------------------

    fn compare(
        &self,
        op: CompareOp,
        other: &dyn FuzznumStrategy,
        _tnorm: &OperationTNorm,
    ) -> FuzzResult<bool> {
        let (md2, nmd2) = Self::peer(other)?;
        let peer = QrofnStrategy {
            md: md2,
            nmd: nmd2,
            q: self.q,
        };
        let eq = (self.md - peer.md).abs() < EPS && (self.nmd - peer.nmd).abs() < EPS;
        // score orders first; accuracy breaks score ties
        let ds = self.score_of() - peer.score_of();
        let dh = self.accuracy_of() - peer.accuracy_of();
        let gt = ds > EPS || (ds.abs() <= EPS && dh > EPS);
        let lt = -ds > EPS || (ds.abs() <= EPS && -dh > EPS);
        Ok(match op {
            CompareOp::Gt => gt,
            CompareOp::Lt => lt,
            CompareOp::Eq => eq,
            CompareOp::Ne => !eq,
            CompareOp::Ge => !lt,
            CompareOp::Le => !gt,
        })
    }

    fn intersection(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = tnorm.t_norm(self.md, md2);
        let nmd = tnorm.t_conorm(self.nmd, nmd2);
        Ok(self.result(md, nmd))
    }

    fn union(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = tnorm.t_conorm(self.md, md2);
        let nmd = tnorm.t_norm(self.nmd, nmd2);
        Ok(self.result(md, nmd))
    }

    fn complement(&self, _tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        Ok(self.result(self.nmd, self.md))
    }
}

// ============================================================================
// Template
// ============================================================================

/// Presentation view of a qrofn: string forms and scalar metrics
///
/// Holds only a weak reference to the owning strategy. Metrics are cached
/// per write-generation.
#[derive(Debug)]
pub struct QrofnTemplate {
    strategy: StrategyRef,
    generation: Generation,
    cache: MetricCache,
}

impl QrofnTemplate {
    /// Bind a template to a strategy reference
    pub fn new(strategy: StrategyRef, generation: Generation) -> Self {
        QrofnTemplate {
            strategy,
            generation,
            cache: MetricCache::new(8),
        }
    }

    fn read(&self) -> FuzzResult<(f64, f64, u32)> {
        let strategy = self
            .strategy
            .upgrade()
            .ok_or_else(|| FuzzError::invalid_reference("qrofn template"))?;
        let guard = strategy.read()?;
        let md = guard.get_attr("md")?.as_scalar()?;
        let nmd = guard.get_attr("nmd")?.as_scalar()?;
        Ok((md, nmd, guard.q()))
    }

    fn metric<F>(&self, name: &str, compute: F) -> FuzzResult<f64>
    where
        F: Fn(f64, f64, i32) -> f64,
    {
        // a dead owner invalidates the template permanently, cached or not
        if self.strategy.strong_count() == 0 {
            return Err(FuzzError::invalid_reference("qrofn template"));
        }
        let generation = current_generation(&self.generation);
        self.cache.get_or_compute(name, generation, || {
            let (md, nmd, q) = self.read()?;
            Ok(compute(md, nmd, q as i32))
        })
    }
}

impl FuzznumTemplate for QrofnTemplate {
    fn mtype(&self) -> &str {
        MTYPE
    }

    fn is_live(&self) -> bool {
        self.strategy.strong_count() > 0
    }

    fn report(&self) -> FuzzResult<String> {
        let (md, nmd, q) = self.read()?;
        Ok(format!(
            "qrofn(q={})\n  md            = {}\n  nmd           = {}\n  score         = {}\n  accuracy      = {}\n  indeterminacy = {}",
            q,
            md,
            nmd,
            self.score()?,
            self.accuracy()?,
            self.indeterminacy()?,
        ))
    }

    fn display(&self) -> FuzzResult<String> {
        let (md, nmd, q) = self.read()?;
        Ok(format!("<{}, {}>_q={}", md, nmd, q))
    }

    fn score(&self) -> FuzzResult<f64> {
        self.metric("score", |md, nmd, q| md.powi(q) - nmd.powi(q))
    }

    fn accuracy(&self) -> FuzzResult<f64> {
        self.metric("accuracy", |md, nmd, q| md.powi(q) + nmd.powi(q))
    }

    fn indeterminacy(&self) -> FuzzResult<f64> {
        self.metric("indeterminacy", |md, nmd, q| {
            (1.0 - md.powi(q) - nmd.powi(q)).max(0.0).powf(1.0 / q as f64)
        })
    }
}

/// The complete qrofn registration (strategy + template)
pub fn registration() -> crate::registry::Registration {
    crate::registry::Registration::pair(
        MTYPE,
        |q| Ok(Box::new(QrofnStrategy::new(q)?) as Box<dyn FuzznumStrategy>),
        |strategy, generation| {
            Box::new(QrofnTemplate::new(strategy, generation)) as Box<dyn FuzznumTemplate>
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::{NormFamily, NormParams};

    fn tnorm(q: u32) -> OperationTNorm {
        OperationTNorm::new(NormFamily::Algebraic, q, NormParams::default()).unwrap()
    }

    #[test]
    fn test_constraint_enforced_at_construction() {
        assert!(QrofnStrategy::with_values(1, 0.6, 0.3).is_ok());
        assert!(QrofnStrategy::with_values(1, 0.8, 0.5).is_err());
        // relaxed at q = 2: 0.64 + 0.25 <= 1
        assert!(QrofnStrategy::with_values(2, 0.8, 0.5).is_ok());
        assert!(QrofnStrategy::with_values(1, 1.2, 0.0).is_err());
    }

    #[test]
    fn test_rejected_set_attr_leaves_state_intact() {
        let mut s = QrofnStrategy::with_values(2, 0.8, 0.5).unwrap();
        let err = s.set_attr("nmd", AttrValue::Scalar(0.9)).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConstraintViolation);
        assert_eq!(s.md(), 0.8);
        assert_eq!(s.nmd(), 0.5);
    }

    #[test]
    fn test_set_q_revalidates_constraint() {
        let mut s = QrofnStrategy::with_values(2, 0.8, 0.5).unwrap();
        // at q = 1 the same degrees violate md + nmd <= 1
        assert!(s.set_q(1).is_err());
        assert_eq!(s.q(), 2);
        assert!(s.set_q(3).is_ok());
    }

    #[test]
    fn test_add_concrete_q2_algebraic() {
        let a = QrofnStrategy::with_values(2, 0.6, 0.3).unwrap();
        let b = QrofnStrategy::with_values(2, 0.5, 0.4).unwrap();
        let result = a.add(&b, &tnorm(2)).unwrap();
        let md = result["md"].as_scalar().unwrap();
        let nmd = result["nmd"].as_scalar().unwrap();

        let expected_md =
            (0.6f64.powi(2) + 0.5f64.powi(2) - 0.6f64.powi(2) * 0.5f64.powi(2)).sqrt();
        assert!((md - expected_md).abs() < 1e-12);
        assert!((md - 0.7810).abs() < 1e-4);
        assert!((nmd - 0.12).abs() < 1e-12);
        assert!(md.powi(2) + nmd.powi(2) <= 1.0 + EPS);
    }

    #[test]
    fn test_mul_is_dual_of_add() {
        let a = QrofnStrategy::with_values(2, 0.6, 0.3).unwrap();
        let b = QrofnStrategy::with_values(2, 0.5, 0.4).unwrap();
        let result = a.mul(&b, &tnorm(2)).unwrap();
        let md = result["md"].as_scalar().unwrap();
        let nmd = result["nmd"].as_scalar().unwrap();
        assert!((md - 0.3).abs() < 1e-12);
        let expected_nmd =
            (0.3f64.powi(2) + 0.4f64.powi(2) - 0.3f64.powi(2) * 0.4f64.powi(2)).sqrt();
        assert!((nmd - expected_nmd).abs() < 1e-12);
    }

    #[test]
    fn test_sub_inverts_add() {
        let norm = tnorm(2);
        let a = QrofnStrategy::with_values(2, 0.6, 0.3).unwrap();
        let b = QrofnStrategy::with_values(2, 0.5, 0.4).unwrap();
        let sum = a.add(&b, &norm).unwrap();
        let sum_strategy = QrofnStrategy::with_values(
            2,
            sum["md"].as_scalar().unwrap(),
            sum["nmd"].as_scalar().unwrap(),
        )
        .unwrap();
        let back = sum_strategy.sub(&b, &norm).unwrap();
        assert!((back["md"].as_scalar().unwrap() - 0.6).abs() < 1e-9);
        assert!((back["nmd"].as_scalar().unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_sub_inadmissible_degenerates() {
        let norm = tnorm(1);
        let a = QrofnStrategy::with_values(1, 0.2, 0.7).unwrap();
        let b = QrofnStrategy::with_values(1, 0.5, 0.3).unwrap();
        // md1 < md2: no orthopair c satisfies b + c = a
        let result = a.sub(&b, &norm).unwrap();
        assert_eq!(result["md"].as_scalar().unwrap(), 0.0);
        assert_eq!(result["nmd"].as_scalar().unwrap(), 1.0);
    }

    #[test]
    fn test_div_inverts_mul() {
        let norm = tnorm(2);
        let a = QrofnStrategy::with_values(2, 0.6, 0.3).unwrap();
        let b = QrofnStrategy::with_values(2, 0.5, 0.4).unwrap();
        let product = a.mul(&b, &norm).unwrap();
        let product_strategy = QrofnStrategy::with_values(
            2,
            product["md"].as_scalar().unwrap(),
            product["nmd"].as_scalar().unwrap(),
        )
        .unwrap();
        let back = product_strategy.div(&b, &norm).unwrap();
        assert!((back["md"].as_scalar().unwrap() - 0.6).abs() < 1e-9);
        assert!((back["nmd"].as_scalar().unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_sub_under_non_archimedean_is_not_implemented() {
        let norm = OperationTNorm::new(NormFamily::Minimum, 1, NormParams::default()).unwrap();
        let a = QrofnStrategy::with_values(1, 0.6, 0.3).unwrap();
        let b = QrofnStrategy::with_values(1, 0.5, 0.4).unwrap();
        let err = a.sub(&b, &norm).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotImplemented);
        assert!(err.message.contains("minimum"));
    }

    #[test]
    fn test_pow_algebraic_q1_matches_closed_form() {
        // under the algebraic norm at q=1: md^λ and 1-(1-nmd)^λ
        let a = QrofnStrategy::with_values(1, 0.6, 0.3).unwrap();
        let result = a.pow(2.0, &tnorm(1)).unwrap();
        let md = result["md"].as_scalar().unwrap();
        let nmd = result["nmd"].as_scalar().unwrap();
        assert!((md - 0.36).abs() < 1e-12);
        assert!((nmd - (1.0 - 0.7f64.powi(2))).abs() < 1e-12);
    }

    #[test]
    fn test_tim_algebraic_q1_matches_closed_form() {
        // λ·A under the algebraic norm at q=1: 1-(1-md)^λ and nmd^λ
        let a = QrofnStrategy::with_values(1, 0.6, 0.3).unwrap();
        let result = a.tim(2.0, &tnorm(1)).unwrap();
        let md = result["md"].as_scalar().unwrap();
        let nmd = result["nmd"].as_scalar().unwrap();
        assert!((md - (1.0 - 0.4f64.powi(2))).abs() < 1e-12);
        assert!((nmd - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_pow_rejects_nonpositive_exponent() {
        let a = QrofnStrategy::with_values(1, 0.6, 0.3).unwrap();
        assert!(a.pow(0.0, &tnorm(1)).is_err());
        assert!(a.pow(-1.0, &tnorm(1)).is_err());
    }

    #[test]
    fn test_comparisons_by_score_and_accuracy() {
        let norm = tnorm(1);
        let high = QrofnStrategy::with_values(1, 0.7, 0.2).unwrap();
        let low = QrofnStrategy::with_values(1, 0.4, 0.5).unwrap();
        assert!(high.compare(CompareOp::Gt, &low, &norm).unwrap());
        assert!(low.compare(CompareOp::Lt, &high, &norm).unwrap());
        assert!(high.compare(CompareOp::Ge, &low, &norm).unwrap());
        assert!(!high.compare(CompareOp::Le, &low, &norm).unwrap());
        assert!(high.compare(CompareOp::Ne, &low, &norm).unwrap());

        // same score (0.1), accuracy breaks the tie: 0.9 vs 0.5
        let sharp = QrofnStrategy::with_values(1, 0.5, 0.4).unwrap();
        let vague = QrofnStrategy::with_values(1, 0.3, 0.2).unwrap();
        assert!(sharp.compare(CompareOp::Gt, &vague, &norm).unwrap());

        let same = QrofnStrategy::with_values(1, 0.7, 0.2).unwrap();
        assert!(high.compare(CompareOp::Eq, &same, &norm).unwrap());
        assert!(high.compare(CompareOp::Ge, &same, &norm).unwrap());
        assert!(high.compare(CompareOp::Le, &same, &norm).unwrap());
    }

    #[test]
    fn test_template_invalidated_after_owner_drop() {
        use crate::core::traits::StrategyHandle;
        use std::sync::atomic::AtomicU64;
        use std::sync::{Arc, RwLock};

        let strategy: StrategyHandle = Arc::new(RwLock::new(Box::new(
            QrofnStrategy::with_values(1, 0.6, 0.3).unwrap(),
        ) as Box<dyn FuzznumStrategy>));
        let generation: Generation = Arc::new(AtomicU64::new(0));
        let template = QrofnTemplate::new(Arc::downgrade(&strategy), generation);

        assert!(template.is_live());
        assert!((template.score().unwrap() - 0.3).abs() < 1e-12);

        drop(strategy);
        assert!(!template.is_live());
        // even previously cached metrics must refuse to answer
        let err = template.score().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidReference);
        assert!(template.display().is_err());
        assert!(template.report().is_err());
    }

    #[test]
    fn test_set_operations() {
        let norm = tnorm(1);
        let a = QrofnStrategy::with_values(1, 0.6, 0.3).unwrap();
        let b = QrofnStrategy::with_values(1, 0.5, 0.4).unwrap();

        let inter = a.intersection(&b, &norm).unwrap();
        assert!((inter["md"].as_scalar().unwrap() - 0.3).abs() < 1e-12);

        let union = a.union(&b, &norm).unwrap();
        assert!((union["md"].as_scalar().unwrap() - 0.8).abs() < 1e-12);
        assert!((union["nmd"].as_scalar().unwrap() - 0.12).abs() < 1e-12);

        let comp = a.complement(&norm).unwrap();
        assert_eq!(comp["md"].as_scalar().unwrap(), 0.3);
        assert_eq!(comp["nmd"].as_scalar().unwrap(), 0.6);
    }
}
