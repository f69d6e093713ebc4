//! Core trait abstractions for fuzznum extensibility
//!
//! This module defines the fundamental traits that enable:
//! - Pluggable fuzzy-number representations (strategies)
//! - Presentation templates derived from a strategy without owning it
//! - Observable registry mutations
//!
//! # Design Principles
//!
//! 1. **Dependency Inversion**: the executor depends on these abstractions,
//!    never on a concrete representation
//! 2. **Open/Closed**: new mtypes are added by registering implementations,
//!    not by modifying the executor
//! 3. **Interoperability without downcasting**: strategies exchange state
//!    through attribute maps, so any two strategies of the same mtype can
//!    compute against each other

use std::fmt::Debug;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::cache::LruCache;
use crate::core::attrs::{AttrValue, AttributeMap};
use crate::error::{FuzzError, FuzzResult};
use crate::norms::OperationTNorm;

// ============================================================================
// Operations
// ============================================================================

/// Every operation the executor can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Tim,
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
    Ne,
    Intersection,
    Union,
    Complement,
}

/// How many and what kind of operands an operation takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Two fuzzy-number operands
    Binary,
    /// One fuzzy-number operand and one scalar
    Scalar,
    /// A single fuzzy-number operand
    Unary,
}

impl Operation {
    /// All operations, in declaration order
    pub const ALL: [Operation; 15] = [
        Operation::Add,
        Operation::Sub,
        Operation::Mul,
        Operation::Div,
        Operation::Pow,
        Operation::Tim,
        Operation::Gt,
        Operation::Lt,
        Operation::Eq,
        Operation::Ge,
        Operation::Le,
        Operation::Ne,
        Operation::Intersection,
        Operation::Union,
        Operation::Complement,
    ];

    /// Short identifier used in errors and cache keys
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Mul => "mul",
            Operation::Div => "div",
            Operation::Pow => "pow",
            Operation::Tim => "tim",
            Operation::Gt => "gt",
            Operation::Lt => "lt",
            Operation::Eq => "eq",
            Operation::Ge => "ge",
            Operation::Le => "le",
            Operation::Ne => "ne",
            Operation::Intersection => "intersection",
            Operation::Union => "union",
            Operation::Complement => "complement",
        }
    }

    /// The operand shape this operation expects
    pub fn operand_kind(&self) -> OperandKind {
        match self {
            Operation::Pow | Operation::Tim => OperandKind::Scalar,
            Operation::Complement => OperandKind::Unary,
            _ => OperandKind::Binary,
        }
    }

    /// Whether this operation yields a boolean rather than a fuzzy number
    pub fn is_comparison(&self) -> bool {
        self.as_compare().is_some()
    }

    /// View a comparison operation as a [`CompareOp`]
    pub fn as_compare(&self) -> Option<CompareOp> {
        match self {
            Operation::Gt => Some(CompareOp::Gt),
            Operation::Lt => Some(CompareOp::Lt),
            Operation::Eq => Some(CompareOp::Eq),
            Operation::Ge => Some(CompareOp::Ge),
            Operation::Le => Some(CompareOp::Le),
            Operation::Ne => Some(CompareOp::Ne),
            _ => None,
        }
    }
}

impl FromStr for Operation {
    type Err = FuzzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .find(|op| op.name() == s)
            .copied()
            .ok_or_else(|| FuzzError::value(format!("Unknown operation '{}'", s)))
    }
}

/// Comparison operators, passed to the strategy's `compare` hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
    Ne,
}

impl CompareOp {
    /// Short identifier
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Gt => "gt",
            CompareOp::Lt => "lt",
            CompareOp::Eq => "eq",
            CompareOp::Ge => "ge",
            CompareOp::Le => "le",
            CompareOp::Ne => "ne",
        }
    }
}

// ============================================================================
// Operation output
// ============================================================================

/// Result of dispatching an operation to a strategy
///
/// Arithmetic and set operations produce the attribute values of a new fuzzy
/// number; comparisons produce a plain boolean.
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutput {
    /// New attribute values for a result fuzzy number
    Attributes(AttributeMap),
    /// A comparison verdict
    Boolean(bool),
}

impl OpOutput {
    /// Check whether this output is a boolean verdict
    pub fn is_boolean(&self) -> bool {
        matches!(self, OpOutput::Boolean(_))
    }

    /// Get the attribute map, if this is a value output
    pub fn as_attributes(&self) -> Option<&AttributeMap> {
        match self {
            OpOutput::Attributes(a) => Some(a),
            _ => None,
        }
    }

    /// Get the boolean verdict, if this is a comparison output
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            OpOutput::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Outcome of a strategy or façade health check
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ValidationReport {
    /// Whether the state satisfies every constraint
    pub is_valid: bool,
    /// Human-readable descriptions of each violation
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// A report with no issues
    pub fn ok() -> Self {
        ValidationReport {
            is_valid: true,
            issues: Vec::new(),
        }
    }

    /// Add an issue, marking the report invalid
    pub fn issue(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.issues.push(message.into());
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ValidationReport) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.issues.extend(other.issues);
    }
}

// ============================================================================
// FuzznumStrategy
// ============================================================================

/// A fuzzy-number representation: numeric state plus operation hooks
///
/// One implementation exists per mtype. The strategy owns the raw attribute
/// values and implements the algebra parameterized by an injected
/// [`OperationTNorm`]. Operation hooks default to a `NotImplemented` error
/// naming the operation, the mtype and the t-norm, so an implementation only
/// overrides what its algebra defines.
///
/// # Example
///
/// ```ignore
/// impl FuzznumStrategy for QrofnStrategy {
///     fn add(&self, other: &dyn FuzznumStrategy, tnorm: &OperationTNorm)
///         -> FuzzResult<AttributeMap>
///     {
///         let md = tnorm.t_conorm(self.md, other.get_attr("md")?.as_scalar()?);
///         let nmd = tnorm.t_norm(self.nmd, other.get_attr("nmd")?.as_scalar()?);
///         Ok(scalar_attrs(&[("md", md), ("nmd", nmd)]))
///     }
/// }
/// ```
pub trait FuzznumStrategy: Send + Sync + Debug {
    /// The mtype tag this strategy implements (e.g. `"qrofn"`)
    fn mtype(&self) -> &str;

    /// The q-rung of this instance
    fn q(&self) -> u32;

    /// Change the q-rung, re-validating the composite constraint
    fn set_q(&mut self, q: u32) -> FuzzResult<()>;

    /// Snapshot of every attribute value
    fn attributes(&self) -> AttributeMap;

    /// Read one attribute by name
    fn get_attr(&self, name: &str) -> FuzzResult<AttrValue>;

    /// Write one attribute through the validated mutation pipeline
    ///
    /// Implementations must be atomic: a rejected write leaves the strategy
    /// exactly as it was (validate-then-commit).
    fn set_attr(&mut self, name: &str, value: AttrValue) -> FuzzResult<()>;

    /// Check every per-field and composite constraint
    fn validate(&self) -> ValidationReport;

    /// Clone into a boxed trait object
    fn clone_box(&self) -> Box<dyn FuzznumStrategy>;

    // ------------------------------------------------------------------
    // Operation hooks
    // ------------------------------------------------------------------

    /// Fuzzy addition
    fn add(
        &self,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("add", self.mtype(), tnorm.name()))
    }

    /// Fuzzy subtraction
    fn sub(
        &self,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("sub", self.mtype(), tnorm.name()))
    }

    /// Fuzzy multiplication
    fn mul(
        &self,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("mul", self.mtype(), tnorm.name()))
    }

    /// Fuzzy division
    fn div(
        &self,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("div", self.mtype(), tnorm.name()))
    }

    /// Power by a positive scalar exponent
    fn pow(&self, _operand: f64, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("pow", self.mtype(), tnorm.name()))
    }

    /// Scalar multiplication (λ times this number)
    fn tim(&self, _operand: f64, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("tim", self.mtype(), tnorm.name()))
    }

    /// Order/equality comparison
    fn compare(
        &self,
        op: CompareOp,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<bool> {
        Err(FuzzError::not_implemented(op.name(), self.mtype(), tnorm.name()))
    }

    /// Fuzzy set intersection
    fn intersection(
        &self,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("intersection", self.mtype(), tnorm.name()))
    }

    /// Fuzzy set union
    fn union(
        &self,
        _other: &dyn FuzznumStrategy,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("union", self.mtype(), tnorm.name()))
    }

    /// Fuzzy complement
    fn complement(&self, tnorm: &OperationTNorm) -> FuzzResult<AttributeMap> {
        Err(FuzzError::not_implemented("complement", self.mtype(), tnorm.name()))
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Route an [`Operation`] to the matching hook
    ///
    /// Binary operations require `other`; pow/tim require `operand`. A
    /// missing operand is a type error, not a panic.
    fn dispatch(
        &self,
        op: Operation,
        other: Option<&dyn FuzznumStrategy>,
        operand: Option<f64>,
        tnorm: &OperationTNorm,
    ) -> FuzzResult<OpOutput> {
        match op.operand_kind() {
            OperandKind::Binary => {
                let other = other.ok_or_else(|| {
                    FuzzError::type_mismatch(format!(
                        "operation '{}' requires a second fuzzy operand",
                        op.name()
                    ))
                })?;
                if let Some(cmp) = op.as_compare() {
                    return Ok(OpOutput::Boolean(self.compare(cmp, other, tnorm)?));
                }
                let attrs = match op {
                    Operation::Add => self.add(other, tnorm)?,
                    Operation::Sub => self.sub(other, tnorm)?,
                    Operation::Mul => self.mul(other, tnorm)?,
                    Operation::Div => self.div(other, tnorm)?,
                    Operation::Intersection => self.intersection(other, tnorm)?,
                    Operation::Union => self.union(other, tnorm)?,
                    _ => unreachable!("binary operation set is closed"),
                };
                Ok(OpOutput::Attributes(attrs))
            }
            OperandKind::Scalar => {
                let operand = operand.ok_or_else(|| {
                    FuzzError::type_mismatch(format!(
                        "operation '{}' requires a scalar operand",
                        op.name()
                    ))
                })?;
                let attrs = match op {
                    Operation::Pow => self.pow(operand, tnorm)?,
                    Operation::Tim => self.tim(operand, tnorm)?,
                    _ => unreachable!("scalar operation set is closed"),
                };
                Ok(OpOutput::Attributes(attrs))
            }
            OperandKind::Unary => Ok(OpOutput::Attributes(self.complement(tnorm)?)),
        }
    }
}

impl Clone for Box<dyn FuzznumStrategy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Shared, lock-guarded handle to a strategy instance
pub type StrategyHandle = Arc<RwLock<Box<dyn FuzznumStrategy>>>;

/// Weak back-reference from a template to its strategy
pub type StrategyRef = Weak<RwLock<Box<dyn FuzznumStrategy>>>;

// ============================================================================
// FuzznumTemplate
// ============================================================================

/// A read-only presentation view over a strategy
///
/// Templates derive string forms and scalar metrics from the bound strategy.
/// They hold a [`StrategyRef`] (weak) only: once the owning Fuzznum is
/// dropped, every accessor fails with an `InvalidReference` error.
pub trait FuzznumTemplate: Send + Sync + Debug {
    /// The mtype tag this template presents
    fn mtype(&self) -> &str;

    /// Whether the owning Fuzznum is still alive
    fn is_live(&self) -> bool;

    /// Multi-line human-readable report
    fn report(&self) -> FuzzResult<String>;

    /// Compact string form (used by the Fuzznum `Display` impl)
    fn display(&self) -> FuzzResult<String>;

    /// Score metric
    fn score(&self) -> FuzzResult<f64>;

    /// Accuracy metric
    fn accuracy(&self) -> FuzzResult<f64>;

    /// Indeterminacy metric
    fn indeterminacy(&self) -> FuzzResult<f64>;
}

// ============================================================================
// Metric cache
// ============================================================================

/// Bounded cache for template-derived metrics
///
/// Entries are stamped with the owner's write generation; a strategy write
/// bumps the generation, so stale entries miss and are recomputed.
#[derive(Debug)]
pub struct MetricCache {
    inner: Mutex<LruCache<String, (u64, f64)>>,
}

impl MetricCache {
    /// Create a cache holding at most `capacity` metrics
    pub fn new(capacity: usize) -> Self {
        MetricCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Serve `name` from cache if fresh at `generation`, else compute and store
    pub fn get_or_compute<F>(&self, name: &str, generation: u64, compute: F) -> FuzzResult<f64>
    where
        F: FnOnce() -> FuzzResult<f64>,
    {
        let mut cache = self.inner.lock()?;
        if let Some((gen, value)) = cache.get(&name.to_string()) {
            if gen == generation {
                return Ok(value);
            }
        }
        drop(cache);
        let value = compute()?;
        self.inner.lock()?.put(name.to_string(), (generation, value));
        Ok(value)
    }

    /// Drop every cached metric
    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.clear();
        }
    }
}

/// Monotonic write-generation counter shared between a Fuzznum and its template
pub type Generation = Arc<AtomicU64>;

/// Bump a generation counter after a strategy write
pub fn bump_generation(generation: &Generation) -> u64 {
    generation.fetch_add(1, Ordering::SeqCst) + 1
}

/// Read a generation counter
pub fn current_generation(generation: &Generation) -> u64 {
    generation.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::{NormFamily, NormParams};

    #[derive(Debug, Clone)]
    struct StubStrategy;

    impl FuzznumStrategy for StubStrategy {
        fn mtype(&self) -> &str {
            "stub"
        }
        fn q(&self) -> u32 {
            1
        }
        fn set_q(&mut self, _q: u32) -> FuzzResult<()> {
            Ok(())
        }
        fn attributes(&self) -> AttributeMap {
            AttributeMap::new()
        }
        fn get_attr(&self, name: &str) -> FuzzResult<AttrValue> {
            Err(FuzzError::unknown_attribute("stub", name))
        }
        fn set_attr(&mut self, name: &str, _value: AttrValue) -> FuzzResult<()> {
            Err(FuzzError::unknown_attribute("stub", name))
        }
        fn validate(&self) -> ValidationReport {
            ValidationReport::ok()
        }
        fn clone_box(&self) -> Box<dyn FuzznumStrategy> {
            Box::new(self.clone())
        }
    }

    fn tnorm() -> OperationTNorm {
        OperationTNorm::new(NormFamily::Algebraic, 1, NormParams::default()).unwrap()
    }

    #[test]
    fn test_default_hooks_raise_not_implemented() {
        let a = StubStrategy;
        let b = StubStrategy;
        let err = a.add(&b, &tnorm()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotImplemented);
        assert!(err.message.contains("stub"));
        assert!(err.message.contains("algebraic"));
    }

    #[test]
    fn test_dispatch_requires_matching_operands() {
        let a = StubStrategy;
        let err = a.dispatch(Operation::Add, None, None, &tnorm()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TypeMismatch);

        let err = a.dispatch(Operation::Pow, None, None, &tnorm()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TypeMismatch);
    }

    #[test]
    fn test_operation_parsing_and_kinds() {
        assert_eq!("add".parse::<Operation>().unwrap(), Operation::Add);
        assert!("frobnicate".parse::<Operation>().is_err());
        assert_eq!(Operation::Pow.operand_kind(), OperandKind::Scalar);
        assert_eq!(Operation::Complement.operand_kind(), OperandKind::Unary);
        assert!(Operation::Ge.is_comparison());
        assert!(!Operation::Union.is_comparison());
    }

    #[test]
    fn test_metric_cache_generation_invalidation() {
        let cache = MetricCache::new(8);
        let mut calls = 0;
        let v = cache
            .get_or_compute("score", 1, || {
                calls += 1;
                Ok(0.5)
            })
            .unwrap();
        assert_eq!(v, 0.5);

        // same generation: served from cache
        let v = cache
            .get_or_compute("score", 1, || {
                calls += 1;
                Ok(0.9)
            })
            .unwrap();
        assert_eq!(v, 0.5);
        assert_eq!(calls, 1);

        // bumped generation: recomputed
        let v = cache
            .get_or_compute("score", 2, || {
                calls += 1;
                Ok(0.9)
            })
            .unwrap();
        assert_eq!(v, 0.9);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_validation_report_merge() {
        let mut a = ValidationReport::ok();
        let mut b = ValidationReport::ok();
        b.issue("md out of range");
        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.issues.len(), 1);
    }
}
