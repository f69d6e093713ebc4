//! Operation executor
//!
//! Validates operands, builds the t-norm bundle, dispatches to the operand's
//! strategy and wraps the result back into a [`Fuzznum`]:
//!
//! - named surface: `addition`, `subtract`, `multiply`, `divide`, `power`,
//!   `times`, `greater_than` .. `not_equal`, `intersection`, `union`,
//!   `complement`
//! - LRU result caching keyed by (operation, operand state, params), with an
//!   independently toggleable instance-creation cache
//! - `batch_operation` collects per-item errors without aborting the batch
//! - `chain_operation` threads results and fails fast on a boolean
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzznum::{Fuzznum, OperationExecutor, scalar_attrs};
//!
//! let executor = OperationExecutor::new(registry.clone());
//! let a = Fuzznum::create_in(&registry, "qrofn", 2, scalar_attrs(&[("md", 0.6), ("nmd", 0.3)]))?;
//! let b = Fuzznum::create_in(&registry, "qrofn", 2, scalar_attrs(&[("md", 0.5), ("nmd", 0.4)]))?;
//! let sum = executor.addition(&a, &b)?;
//! ```

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use fnv::FnvHasher;

use crate::cache::{CacheStats, LruCache};
use crate::config::{ExecutorConfigSection, NormsConfig};
use crate::core::attrs::{canonical_attrs, AttributeMap};
use crate::core::traits::{FuzznumStrategy, OpOutput, OperandKind, Operation};
use crate::error::{ErrorCode, FuzzError, FuzzResult};
use crate::fuzznum::{Fuzznum, FuzznumDto};
use crate::norms::{NormFamily, NormParams, OperationTNorm};
use crate::registry::FuzznumRegistry;

// ============================================================================
// Configuration
// ============================================================================

/// Executor configuration: which norm to compute under, and cache behavior
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// T-norm family used for every operation
    pub family: NormFamily,
    /// Family parameters
    pub params: NormParams,
    /// Norm verification settings
    pub norms: NormsConfig,
    /// Cache sizes and toggles
    pub cache: ExecutorConfigSection,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of one executed operation
#[derive(Debug)]
pub enum OpOutcome {
    /// A new fuzzy number
    Value(Fuzznum),
    /// A comparison verdict
    Boolean(bool),
}

impl OpOutcome {
    /// Unwrap a value outcome
    pub fn into_value(self) -> FuzzResult<Fuzznum> {
        match self {
            OpOutcome::Value(f) => Ok(f),
            OpOutcome::Boolean(b) => Err(FuzzError::new(
                ErrorCode::ChainTypeError,
                format!("expected a fuzzy number result, got boolean {}", b),
            )),
        }
    }

    /// Unwrap a boolean outcome
    pub fn into_boolean(self) -> FuzzResult<bool> {
        match self {
            OpOutcome::Boolean(b) => Ok(b),
            OpOutcome::Value(_) => Err(FuzzError::type_mismatch(
                "expected a boolean result, got a fuzzy number",
            )),
        }
    }
}

/// Per-item outcome of a batch operation
#[derive(Debug)]
pub enum BatchOutcome {
    /// A new fuzzy number
    Value(Fuzznum),
    /// A comparison verdict
    Boolean(bool),
    /// The item (or adjacent pair starting) at `index` failed
    Error {
        /// Index into the input list
        index: usize,
        /// What went wrong
        error: FuzzError,
    },
}

impl BatchOutcome {
    /// Whether this item failed
    pub fn is_error(&self) -> bool {
        matches!(self, BatchOutcome::Error { .. })
    }
}

#[derive(Debug, Clone)]
enum CachedOutcome {
    Value(FuzznumDto),
    Boolean(bool),
}

// ============================================================================
// Executor
// ============================================================================

/// Executes operations between Fuzznum operands under a configured t-norm
pub struct OperationExecutor {
    registry: Arc<FuzznumRegistry>,
    config: ExecutorConfig,
    result_cache: RwLock<LruCache<u64, CachedOutcome>>,
    instance_cache: RwLock<LruCache<u64, Box<dyn FuzznumStrategy>>>,
    result_cache_enabled: AtomicBool,
    instance_cache_enabled: AtomicBool,
}

impl OperationExecutor {
    /// Create an executor with default configuration (algebraic norm)
    pub fn new(registry: Arc<FuzznumRegistry>) -> Self {
        Self::with_config(registry, ExecutorConfig::default())
    }

    /// Create an executor with explicit configuration
    pub fn with_config(registry: Arc<FuzznumRegistry>, config: ExecutorConfig) -> Self {
        let result_capacity = config.cache.result_cache_size;
        let result_enabled = config.cache.enable_result_cache;
        let instance_enabled = config.cache.enable_instance_cache;
        OperationExecutor {
            registry,
            config,
            result_cache: RwLock::new(LruCache::new(result_capacity)),
            instance_cache: RwLock::new(LruCache::new(64)),
            result_cache_enabled: AtomicBool::new(result_enabled),
            instance_cache_enabled: AtomicBool::new(instance_enabled),
        }
    }

    /// Create an executor computing under a specific norm family
    pub fn with_norm(registry: Arc<FuzznumRegistry>, family: NormFamily, params: NormParams) -> Self {
        Self::with_config(
            registry,
            ExecutorConfig {
                family,
                params,
                ..ExecutorConfig::default()
            },
        )
    }

    /// The registry this executor resolves strategies against
    pub fn registry(&self) -> &Arc<FuzznumRegistry> {
        &self.registry
    }

    /// The configured norm family
    pub fn family(&self) -> NormFamily {
        self.config.family
    }

    // ========================================================================
    // Cache control
    // ========================================================================

    /// Toggle the operation result cache
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.result_cache_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Toggle the instance-creation cache
    pub fn set_instance_cache_enabled(&self, enabled: bool) {
        self.instance_cache_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Drop every cached operation result
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.result_cache.write() {
            cache.clear();
        }
    }

    /// Drop every cached instance
    pub fn clear_instance_cache(&self) {
        if let Ok(mut cache) = self.instance_cache.write() {
            cache.clear();
        }
    }

    /// Statistics of the result cache
    pub fn cache_stats(&self) -> CacheStats {
        self.result_cache
            .read()
            .map(|c| c.stats())
            .unwrap_or_default()
    }

    // ========================================================================
    // Core execution
    // ========================================================================

    /// Execute a binary operation between two validated operands
    pub fn execute_binary(&self, op: Operation, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<OpOutcome> {
        if op.operand_kind() != OperandKind::Binary {
            return Err(FuzzError::type_mismatch(format!(
                "operation '{}' is not binary",
                op.name()
            )));
        }
        self.validate_operand(f1, "left operand")?;
        self.validate_operand(f2, "right operand")?;
        if f1.mtype() != f2.mtype() {
            return Err(FuzzError::new(
                ErrorCode::MtypeMismatch,
                format!(
                    "cannot apply '{}' to mtypes '{}' and '{}'",
                    op.name(),
                    f1.mtype(),
                    f2.mtype()
                ),
            ));
        }
        if f1.q() != f2.q() {
            return Err(FuzzError::new(
                ErrorCode::QrungMismatch,
                format!(
                    "cannot apply '{}' across q-rungs {} and {}",
                    op.name(),
                    f1.q(),
                    f2.q()
                ),
            ));
        }

        let key = self.cache_key(op, &[f1.to_dict()?, f2.to_dict()?], None);
        if let Some(outcome) = self.cache_get(key)? {
            return Ok(outcome);
        }

        let tnorm = self.build_norm(f1.q())?;
        // clone the right strategy so a self-operation (add(a, a)) never
        // takes the same lock twice
        let other = f2.strategy().read()?.clone_box();
        let output = {
            let strategy = f1.strategy().read()?;
            strategy.dispatch(op, Some(other.as_ref()), None, &tnorm)?
        };
        self.finish(f1, key, output)
    }

    /// Execute an operation with one fuzzy operand and an optional scalar
    pub fn execute_unary(
        &self,
        op: Operation,
        f: &Fuzznum,
        operand: Option<f64>,
    ) -> FuzzResult<OpOutcome> {
        match op.operand_kind() {
            OperandKind::Binary => {
                return Err(FuzzError::type_mismatch(format!(
                    "operation '{}' requires two fuzzy operands",
                    op.name()
                )))
            }
            OperandKind::Scalar if operand.is_none() => {
                return Err(FuzzError::type_mismatch(format!(
                    "operation '{}' requires a scalar operand",
                    op.name()
                )))
            }
            _ => {}
        }
        self.validate_operand(f, "operand")?;

        let key = self.cache_key(op, &[f.to_dict()?], operand);
        if let Some(outcome) = self.cache_get(key)? {
            return Ok(outcome);
        }

        let tnorm = self.build_norm(f.q())?;
        let output = {
            let strategy = f.strategy().read()?;
            strategy.dispatch(op, None, operand, &tnorm)?
        };
        self.finish(f, key, output)
    }

    fn finish(&self, source: &Fuzznum, key: u64, output: OpOutput) -> FuzzResult<OpOutcome> {
        match output {
            OpOutput::Boolean(b) => {
                self.cache_put(key, CachedOutcome::Boolean(b));
                Ok(OpOutcome::Boolean(b))
            }
            OpOutput::Attributes(attrs) => {
                let result = self.wrap(source.mtype(), source.q(), attrs)?;
                self.cache_put(key, CachedOutcome::Value(result.to_dict()?));
                Ok(OpOutcome::Value(result))
            }
        }
    }

    fn validate_operand(&self, f: &Fuzznum, role: &str) -> FuzzResult<()> {
        let report = f.validate_state();
        if !report.is_valid {
            return Err(FuzzError::new(
                ErrorCode::InvalidOperand,
                format!(
                    "{} ({}) failed validation: {}",
                    role,
                    f.mtype(),
                    report.issues.join("; ")
                ),
            ));
        }
        Ok(())
    }

    fn build_norm(&self, q: u32) -> FuzzResult<OperationTNorm> {
        OperationTNorm::with_options(
            self.config.family,
            q,
            self.config.params,
            &self.config.norms.verify_options(),
        )
    }

    /// Wrap result attributes into a new Fuzznum, via the instance cache
    fn wrap(&self, mtype: &str, q: u32, attrs: AttributeMap) -> FuzzResult<Fuzznum> {
        if !self.instance_cache_enabled.load(Ordering::SeqCst) {
            return Fuzznum::create_in(&self.registry, mtype, q, attrs);
        }

        let mut hasher = FnvHasher::default();
        mtype.hash(&mut hasher);
        q.hash(&mut hasher);
        canonical_attrs(&attrs).hash(&mut hasher);
        let key = hasher.finish();

        if let Ok(mut cache) = self.instance_cache.write() {
            if let Some(strategy) = cache.get(&key) {
                return Fuzznum::from_strategy_in(&self.registry, strategy);
            }
        }
        let result = Fuzznum::create_in(&self.registry, mtype, q, attrs)?;
        if let Ok(mut cache) = self.instance_cache.write() {
            let strategy = result.strategy().read()?.clone_box();
            cache.put(key, strategy);
        }
        Ok(result)
    }

    fn cache_key(&self, op: Operation, operands: &[FuzznumDto], operand: Option<f64>) -> u64 {
        let mut hasher = FnvHasher::default();
        op.name().hash(&mut hasher);
        self.config.family.name().hash(&mut hasher);
        format!("{:?}", self.config.params).hash(&mut hasher);
        for dto in operands {
            dto.mtype.hash(&mut hasher);
            dto.q.hash(&mut hasher);
            canonical_attrs(&dto.attributes).hash(&mut hasher);
        }
        if let Some(operand) = operand {
            format!("{}", operand).hash(&mut hasher);
        }
        hasher.finish()
    }

    fn cache_get(&self, key: u64) -> FuzzResult<Option<OpOutcome>> {
        if !self.result_cache_enabled.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let cached = match self.result_cache.write() {
            Ok(mut cache) => cache.get(&key),
            Err(_) => None,
        };
        match cached {
            Some(CachedOutcome::Boolean(b)) => Ok(Some(OpOutcome::Boolean(b))),
            Some(CachedOutcome::Value(dto)) => {
                let fuzznum = self.wrap(&dto.mtype, dto.q, dto.attributes)?;
                Ok(Some(OpOutcome::Value(fuzznum)))
            }
            None => Ok(None),
        }
    }

    fn cache_put(&self, key: u64, outcome: CachedOutcome) {
        if !self.result_cache_enabled.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(mut cache) = self.result_cache.write() {
            cache.put(key, outcome);
        }
    }

    // ========================================================================
    // Named operation surface
    // ========================================================================

    /// Fuzzy addition
    pub fn addition(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_binary(Operation::Add, f1, f2)?.into_value()
    }

    /// Fuzzy subtraction
    pub fn subtract(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_binary(Operation::Sub, f1, f2)?.into_value()
    }

    /// Fuzzy multiplication
    pub fn multiply(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_binary(Operation::Mul, f1, f2)?.into_value()
    }

    /// Fuzzy division
    pub fn divide(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_binary(Operation::Div, f1, f2)?.into_value()
    }

    /// Power by a scalar exponent
    pub fn power(&self, f: &Fuzznum, exponent: f64) -> FuzzResult<Fuzznum> {
        self.execute_unary(Operation::Pow, f, Some(exponent))?
            .into_value()
    }

    /// Scalar multiplication
    pub fn times(&self, f: &Fuzznum, multiplier: f64) -> FuzzResult<Fuzznum> {
        self.execute_unary(Operation::Tim, f, Some(multiplier))?
            .into_value()
    }

    /// Strictly greater (score order)
    pub fn greater_than(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<bool> {
        self.execute_binary(Operation::Gt, f1, f2)?.into_boolean()
    }

    /// Strictly less (score order)
    pub fn less_than(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<bool> {
        self.execute_binary(Operation::Lt, f1, f2)?.into_boolean()
    }

    /// Component-wise equality
    pub fn equal(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<bool> {
        self.execute_binary(Operation::Eq, f1, f2)?.into_boolean()
    }

    /// Greater or equal (score order)
    pub fn greater_equal(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<bool> {
        self.execute_binary(Operation::Ge, f1, f2)?.into_boolean()
    }

    /// Less or equal (score order)
    pub fn less_equal(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<bool> {
        self.execute_binary(Operation::Le, f1, f2)?.into_boolean()
    }

    /// Component-wise inequality
    pub fn not_equal(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<bool> {
        self.execute_binary(Operation::Ne, f1, f2)?.into_boolean()
    }

    /// Fuzzy set intersection
    pub fn intersection(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_binary(Operation::Intersection, f1, f2)?
            .into_value()
    }

    /// Fuzzy set union
    pub fn union(&self, f1: &Fuzznum, f2: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_binary(Operation::Union, f1, f2)?.into_value()
    }

    /// Fuzzy complement
    pub fn complement(&self, f: &Fuzznum) -> FuzzResult<Fuzznum> {
        self.execute_unary(Operation::Complement, f, None)?
            .into_value()
    }

    // ========================================================================
    // Batch and chain helpers
    // ========================================================================

    /// Apply one operation across a list
    ///
    /// Binary operations run over adjacent pairs (`items[i]`, `items[i+1]`),
    /// producing `len - 1` outcomes; unary and scalar operations run per
    /// item. Failures are collected as [`BatchOutcome::Error`] records; the
    /// batch never aborts early.
    pub fn batch_operation(
        &self,
        op: Operation,
        items: &[Fuzznum],
        operand: Option<f64>,
    ) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::new();
        match op.operand_kind() {
            OperandKind::Binary => {
                for index in 0..items.len().saturating_sub(1) {
                    match self.execute_binary(op, &items[index], &items[index + 1]) {
                        Ok(OpOutcome::Value(f)) => outcomes.push(BatchOutcome::Value(f)),
                        Ok(OpOutcome::Boolean(b)) => outcomes.push(BatchOutcome::Boolean(b)),
                        Err(error) => outcomes.push(BatchOutcome::Error { index, error }),
                    }
                }
            }
            OperandKind::Scalar | OperandKind::Unary => {
                for (index, item) in items.iter().enumerate() {
                    match self.execute_unary(op, item, operand) {
                        Ok(OpOutcome::Value(f)) => outcomes.push(BatchOutcome::Value(f)),
                        Ok(OpOutcome::Boolean(b)) => outcomes.push(BatchOutcome::Boolean(b)),
                        Err(error) => outcomes.push(BatchOutcome::Error { index, error }),
                    }
                }
            }
        }
        outcomes
    }

    /// Thread a sequence of operations through intermediate results
    ///
    /// The accumulator starts at `fuzznums[0]`; each binary step consumes
    /// the next operand from `fuzznums`, each scalar step consumes its entry
    /// in `operands`. Fails fast if any step yields a boolean instead of a
    /// fuzzy number.
    pub fn chain_operation(
        &self,
        ops: &[Operation],
        fuzznums: &[Fuzznum],
        operands: &[Option<f64>],
    ) -> FuzzResult<Fuzznum> {
        if ops.is_empty() {
            return Err(FuzzError::value("chain requires at least one operation"));
        }
        if fuzznums.is_empty() {
            return Err(FuzzError::value("chain requires at least one fuzzy operand"));
        }
        if operands.len() != ops.len() {
            return Err(FuzzError::value(format!(
                "chain has {} operations but {} operand slots",
                ops.len(),
                operands.len()
            )));
        }

        let mut acc: Option<Fuzznum> = None;
        let mut next = 1;
        for (step, op) in ops.iter().enumerate() {
            let current: &Fuzznum = match &acc {
                Some(f) => f,
                None => &fuzznums[0],
            };
            let outcome = match op.operand_kind() {
                OperandKind::Binary => {
                    let rhs = fuzznums.get(next).ok_or_else(|| {
                        FuzzError::value(format!(
                            "chain step {} ('{}') needs a fuzzy operand but the list is exhausted",
                            step,
                            op.name()
                        ))
                    })?;
                    next += 1;
                    self.execute_binary(*op, current, rhs)?
                }
                OperandKind::Scalar => self.execute_unary(*op, current, operands[step])?,
                OperandKind::Unary => self.execute_unary(*op, current, None)?,
            };
            match outcome {
                OpOutcome::Value(f) => acc = Some(f),
                OpOutcome::Boolean(_) => {
                    return Err(FuzzError::new(
                        ErrorCode::ChainTypeError,
                        format!(
                            "chain step {} ('{}') produced a boolean; chains require fuzzy intermediate results",
                            step,
                            op.name()
                        ),
                    ))
                }
            }
        }
        acc.ok_or_else(|| FuzzError::internal("chain finished without a result"))
    }
}
