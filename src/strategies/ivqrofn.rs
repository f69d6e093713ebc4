//! Interval-valued q-rung orthopair fuzzy numbers (mtype `ivqrofn`)
//!
//! Degrees are closed intervals `[lower, upper]` instead of points. The
//! orthopair constraint binds the upper endpoints:
//! `md_upper^q + nmd_upper^q <= 1`.
//!
//! Arithmetic applies the qrofn formulas endpoint-wise. Subtraction and
//! division are not defined for this representation and fall through to the
//! default NotImplemented hooks.

use crate::core::attrs::{AttrValue, AttributeMap};
use crate::core::traits::{
    current_generation, CompareOp, FuzznumStrategy, FuzznumTemplate, Generation, MetricCache,
    StrategyRef, ValidationReport,
};
use crate::error::{FuzzError, FuzzResult};
use crate::norms::{OperationTNorm, EPS};

/// The mtype tag for interval-valued q-rung orthopair fuzzy numbers
pub const MTYPE: &str = "ivqrofn";

// ============================================================================
// Strategy
// ============================================================================

/// Numeric state and algebra of an ivqrofn
#[derive(Debug, Clone, PartialEq)]
pub struct IvqrofnStrategy {
    md: [f64; 2],
    nmd: [f64; 2],
    q: u32,
}

impl IvqrofnStrategy {
    /// A zero ivqrofn at the given q-rung
    pub fn new(q: u32) -> FuzzResult<Self> {
        if q == 0 {
            return Err(FuzzError::new(
                crate::error::ErrorCode::InvalidQrung,
                format!("q must be >= 1, got {}", q),
            ));
        }
        Ok(IvqrofnStrategy {
            md: [0.0, 0.0],
            nmd: [0.0, 0.0],
            q,
        })
    }

    /// Build with explicit intervals, validating range and constraint
    pub fn with_values(q: u32, md: [f64; 2], nmd: [f64; 2]) -> FuzzResult<Self> {
        let mut strategy = Self::new(q)?;
        Self::check_interval("md", md)?;
        Self::check_interval("nmd", nmd)?;
        strategy.md = md;
        strategy.nmd = nmd;
        strategy.check_constraint()?;
        Ok(strategy)
    }

    fn check_interval(name: &str, value: [f64; 2]) -> FuzzResult<()> {
        let [lo, hi] = value;
        if !lo.is_finite() || !hi.is_finite() || !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) {
            return Err(FuzzError::value(format!(
                "{} endpoints must be in [0, 1], got [{}, {}]",
                name, lo, hi
            )));
        }
        if lo > hi + EPS {
            return Err(FuzzError::value(format!(
                "{} lower endpoint {} exceeds upper endpoint {}",
                name, lo, hi
            )));
        }
        Ok(())
    }

    fn check_constraint(&self) -> FuzzResult<()> {
        let sum = self.md[1].powi(self.q as i32) + self.nmd[1].powi(self.q as i32);
        if sum > 1.0 + EPS {
            return Err(FuzzError::constraint(format!(
                "md_upper^q + nmd_upper^q = {} exceeds 1 (q = {})",
                sum, self.q
            )));
        }
        Ok(())
    }

    fn peer(other: &dyn FuzznumStrategy) -> FuzzResult<([f64; 2], [f64; 2])> {
        let md = other.get_attr("md")?.as_interval()?;
        let nmd = other.get_attr("nmd")?.as_interval()?;
        Ok((md, nmd))
    }

    fn result(&self, md: [f64; 2], nmd: [f64; 2]) -> AttributeMap {
        let mut attrs = AttributeMap::new();
        attrs.insert("md".to_string(), AttrValue::Interval(md));
        attrs.insert("nmd".to_string(), AttrValue::Interval(nmd));
        attrs
    }

    fn midpoint_score(md: [f64; 2], nmd: [f64; 2], q: i32) -> f64 {
        let m = (md[0].powi(q) + md[1].powi(q)) / 2.0;
        let n = (nmd[0].powi(q) + nmd[1].powi(q)) / 2.0;
        m - n
    }
}

impl FuzznumStrategy for IvqrofnStrategy {
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
        let candidate = IvqrofnStrategy { q, ..*self };
        candidate.check_constraint()?;
        *self = candidate;
        Ok(())
    }

    fn attributes(&self) -> AttributeMap {
        self.result(self.md, self.nmd)
    }

    fn get_attr(&self, name: &str) -> FuzzResult<AttrValue> {
        match name {
            "md" => Ok(AttrValue::Interval(self.md)),
            "nmd" => Ok(AttrValue::Interval(self.nmd)),
            other => Err(FuzzError::unknown_attribute(MTYPE, other)),
        }
    }

    fn set_attr(&mut self, name: &str, value: AttrValue) -> FuzzResult<()> {
        let value = value.as_interval()?;
        Self::check_interval(name, value)?;
        let candidate = match name {
            "md" => IvqrofnStrategy { md: value, ..*self },
            "nmd" => IvqrofnStrategy { nmd: value, ..*self },
            other => return Err(FuzzError::unknown_attribute(MTYPE, other)),
        };
        candidate.check_constraint()?;
        *self = candidate;
        Ok(())
    }

    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if let Err(err) = Self::check_interval("md", self.md) {
            report.issue(err.message);
        }
        if let Err(err) = Self::check_interval("nmd", self.nmd) {
            report.issue(err.message);
        }
        if let Err(err) = self.check_constraint() {
            report.issue(err.message);
        }
        report
    }

    fn clone_box(&self) -> Box<dyn FuzznumStrategy> {
        Box::new(self.clone())
    }

    fn add(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = [
            tnorm.t_conorm(self.md[0], md2[0]),
            tnorm.t_conorm(self.md[1], md2[1]),
        ];
        let nmd = [
            tnorm.t_norm(self.nmd[0], nmd2[0]),
            tnorm.t_norm(self.nmd[1], nmd2[1]),
        ];
        Ok(self.result(md, nmd))
    }

    fn mul(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = [
            tnorm.t_norm(self.md[0], md2[0]),
            tnorm.t_norm(self.md[1], md2[1]),
        ];
        let nmd = [
            tnorm.t_conorm(self.nmd[0], nmd2[0]),
            tnorm.t_conorm(self.nmd[1], nmd2[1]),
        ];
        Ok(self.result(md, nmd))
    }

    fn pow(&self, operand: f64, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        if !operand.is_finite() || operand <= 0.0 {
            return Err(FuzzError::value(format!(
                "pow exponent must be > 0, got {}",
                operand
            )));
        }
        let endpoint = |a: f64| -> FuzzResult<f64> {
            let g = tnorm
                .g(a)
                .ok_or_else(|| FuzzError::not_implemented("pow", MTYPE, tnorm.name()))?;
            tnorm
                .g_inv(operand * g)
                .ok_or_else(|| FuzzError::not_implemented("pow", MTYPE, tnorm.name()))
        };
        let dual = |a: f64| -> FuzzResult<f64> {
            let f = tnorm
                .f(a)
                .ok_or_else(|| FuzzError::not_implemented("pow", MTYPE, tnorm.name()))?;
            tnorm
                .f_inv(operand * f)
                .ok_or_else(|| FuzzError::not_implemented("pow", MTYPE, tnorm.name()))
        };
        let md = [endpoint(self.md[0])?, endpoint(self.md[1])?];
        let nmd = [dual(self.nmd[0])?, dual(self.nmd[1])?];
        Ok(self.result(md, nmd))
    }

    fn tim(&self, operand: f64, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        if !operand.is_finite() || operand <= 0.0 {
            return Err(FuzzError::value(format!(
                "tim multiplier must be > 0, got {}",
                operand
            )));
        }
        let dual = |a: f64| -> FuzzResult<f64> {
            let f = tnorm
                .f(a)
                .ok_or_else(|| FuzzError::not_implemented("tim", MTYPE, tnorm.name()))?;
            tnorm
                .f_inv(operand * f)
                .ok_or_else(|| FuzzError::not_implemented("tim", MTYPE, tnorm.name()))
        };
        let endpoint = |a: f64| -> FuzzResult<f64> {
            let g = tnorm
                .g(a)
                .ok_or_else(|| FuzzError::not_implemented("tim", MTYPE, tnorm.name()))?;
            tnorm
                .g_inv(operand * g)
                .ok_or_else(|| FuzzError::not_implemented("tim", MTYPE, tnorm.name()))
        };
        let md = [dual(self.md[0])?, dual(self.md[1])?];
        let nmd = [endpoint(self.nmd[0])?, endpoint(self.nmd[1])?];
        Ok(self.result(md, nmd))
    }

    fn compare(
        &self,
        op: CompareOp,
        other: &dyn FuzznumStrategy,
        _tnorm: &OperationTNorm,
    ) -> FuzzResult<bool> {
        let (md2, nmd2) = Self::peer(other)?;
        let q = self.q as i32;
        let s1 = Self::midpoint_score(self.md, self.nmd, q);
        let s2 = Self::midpoint_score(md2, nmd2, q);
        let eq = self.md.iter().zip(md2.iter()).all(|(a, b)| (a - b).abs() < EPS)
            && self.nmd.iter().zip(nmd2.iter()).all(|(a, b)| (a - b).abs() < EPS);
        let gt = s1 - s2 > EPS;
        let lt = s2 - s1 > EPS;
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
        let md = [
            tnorm.t_norm(self.md[0], md2[0]),
            tnorm.t_norm(self.md[1], md2[1]),
        ];
        let nmd = [
            tnorm.t_conorm(self.nmd[0], nmd2[0]),
            tnorm.t_conorm(self.nmd[1], nmd2[1]),
        ];
        Ok(self.result(md, nmd))
    }

    fn union(
        &self,
        other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        let (md2, nmd2) = Self::peer(other)?;
        let md = [
            tnorm.t_conorm(self.md[0], md2[0]),
            tnorm.t_conorm(self.md[1], md2[1]),
        ];
        let nmd = [
            tnorm.t_norm(self.nmd[0], nmd2[0]),
            tnorm.t_norm(self.nmd[1], nmd2[1]),
        ];
        Ok(self.result(md, nmd))
    }

    fn complement(&self, _tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        Ok(self.result(self.nmd, self.md))
    }
}

// ============================================================================
// Template
// ============================================================================

/// Presentation view of an ivqrofn
#[derive(Debug)]
pub struct IvqrofnTemplate {
    strategy: StrategyRef,
    generation: Generation,
    cache: MetricCache,
}

impl IvqrofnTemplate {
    /// Bind a template to a strategy reference
    pub fn new(strategy: StrategyRef, generation: Generation) -> Self {
        IvqrofnTemplate {
            strategy,
            generation,
            cache: MetricCache::new(8),
        }
    }

    fn read(&self) -> FuzzResult<([f64; 2], [f64; 2], u32)> {
        let strategy = self
            .strategy
            .upgrade()
            .ok_or_else(|| FuzzError::invalid_reference("ivqrofn template"))?;
        let guard = strategy.read()?;
        let md = guard.get_attr("md")?.as_interval()?;
        let nmd = guard.get_attr("nmd")?.as_interval()?;
        Ok((md, nmd, guard.q()))
    }

    fn metric<F>(&self, name: &str, compute: F) -> FuzzResult<f64>
    where
        F: Fn([f64; 2], [f64; 2], i32) -> f64,
    {
        // a dead owner invalidates the template permanently, cached or not
        if self.strategy.strong_count() == 0 {
            return Err(FuzzError::invalid_reference("ivqrofn template"));
        }
        let generation = current_generation(&self.generation);
        self.cache.get_or_compute(name, generation, || {
            let (md, nmd, q) = self.read()?;
            Ok(compute(md, nmd, q as i32))
        })
    }
}

impl FuzznumTemplate for IvqrofnTemplate {
    fn mtype(&self) -> &str {
        MTYPE
    }

    fn is_live(&self) -> bool {
        self.strategy.strong_count() > 0
    }

    fn report(&self) -> FuzzResult<String> {
        let (md, nmd, q) = self.read()?;
        Ok(format!(
            "ivqrofn(q={})\n  md            = [{}, {}]\n  nmd           = [{}, {}]\n  score         = {}\n  accuracy      = {}\n  indeterminacy = {}",
            q,
            md[0],
            md[1],
            nmd[0],
            nmd[1],
            self.score()?,
            self.accuracy()?,
            self.indeterminacy()?,
        ))
    }

    fn display(&self) -> FuzzResult<String> {
        let (md, nmd, q) = self.read()?;
        Ok(format!(
            "<[{}, {}], [{}, {}]>_q={}",
            md[0], md[1], nmd[0], nmd[1], q
        ))
    }

    fn score(&self) -> FuzzResult<f64> {
        self.metric("score", IvqrofnStrategy::midpoint_score)
    }

    fn accuracy(&self) -> FuzzResult<f64> {
        self.metric("accuracy", |md, nmd, q| {
            (md[0].powi(q) + md[1].powi(q) + nmd[0].powi(q) + nmd[1].powi(q)) / 2.0
        })
    }

    fn indeterminacy(&self) -> FuzzResult<f64> {
        self.metric("indeterminacy", |md, nmd, q| {
            (1.0 - md[1].powi(q) - nmd[1].powi(q))
                .max(0.0)
                .powf(1.0 / q as f64)
        })
    }
}

/// The complete ivqrofn registration (strategy + template)
pub fn registration() -> crate::registry::Registration {
    crate::registry::Registration::pair(
        MTYPE,
        |q| Ok(Box::new(IvqrofnStrategy::new(q)?) as Box<dyn FuzznumStrategy>),
        |strategy, generation| {
            Box::new(IvqrofnTemplate::new(strategy, generation)) as Box<dyn FuzznumTemplate>
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
    fn test_interval_validation() {
        assert!(IvqrofnStrategy::with_values(1, [0.2, 0.5], [0.1, 0.4]).is_ok());
        // lower above upper
        assert!(IvqrofnStrategy::with_values(1, [0.6, 0.4], [0.1, 0.2]).is_err());
        // constraint on upper endpoints
        assert!(IvqrofnStrategy::with_values(1, [0.2, 0.7], [0.1, 0.5]).is_err());
        assert!(IvqrofnStrategy::with_values(2, [0.2, 0.7], [0.1, 0.5]).is_ok());
    }

    #[test]
    fn test_add_endpoint_wise() {
        let a = IvqrofnStrategy::with_values(1, [0.2, 0.4], [0.1, 0.3]).unwrap();
        let b = IvqrofnStrategy::with_values(1, [0.3, 0.5], [0.2, 0.4]).unwrap();
        let result = a.add(&b, &tnorm(1)).unwrap();
        let md = result["md"].as_interval().unwrap();
        let nmd = result["nmd"].as_interval().unwrap();
        assert!((md[0] - (0.2 + 0.3 - 0.06)).abs() < 1e-12);
        assert!((md[1] - (0.4 + 0.5 - 0.2)).abs() < 1e-12);
        assert!((nmd[0] - 0.02).abs() < 1e-12);
        assert!((nmd[1] - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_sub_falls_through_to_not_implemented() {
        let a = IvqrofnStrategy::with_values(1, [0.2, 0.4], [0.1, 0.3]).unwrap();
        let b = IvqrofnStrategy::with_values(1, [0.1, 0.2], [0.3, 0.5]).unwrap();
        let err = a.sub(&b, &tnorm(1)).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotImplemented);
        assert!(err.message.contains("ivqrofn"));
    }

    #[test]
    fn test_rejected_set_attr_keeps_state() {
        let mut s = IvqrofnStrategy::with_values(2, [0.2, 0.7], [0.1, 0.5]).unwrap();
        assert!(s.set_attr("nmd", AttrValue::Interval([0.1, 0.9])).is_err());
        assert_eq!(s.get_attr("nmd").unwrap().as_interval().unwrap(), [0.1, 0.5]);
    }

    #[test]
    fn test_midpoint_comparison() {
        let norm = tnorm(1);
        let high = IvqrofnStrategy::with_values(1, [0.5, 0.7], [0.1, 0.2]).unwrap();
        let low = IvqrofnStrategy::with_values(1, [0.2, 0.3], [0.4, 0.6]).unwrap();
        assert!(high.compare(CompareOp::Gt, &low, &norm).unwrap());
        assert!(low.compare(CompareOp::Le, &high, &norm).unwrap());
    }

    #[test]
    fn test_complement_swaps_intervals() {
        let a = IvqrofnStrategy::with_values(1, [0.2, 0.4], [0.1, 0.3]).unwrap();
        let result = a.complement(&tnorm(1)).unwrap();
        assert_eq!(result["md"].as_interval().unwrap(), [0.1, 0.3]);
        assert_eq!(result["nmd"].as_interval().unwrap(), [0.2, 0.4]);
    }
}
