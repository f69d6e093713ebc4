//! fuzznum - generalized fuzzy-number arithmetic
//!
//! A computational library for arithmetic, comparison and set operations over
//! generalized fuzzy numbers (membership degree, non-membership degree and an
//! integer exponent q), built on a pluggable library of triangular norms.
//!
//! # Architecture
//!
//! The crate is organized around core trait abstractions that enable extensibility:
//!
//! - [`core::FuzznumStrategy`] - a representation's numeric state and algebra
//! - [`core::FuzznumTemplate`] - presentation views derived from a strategy
//! - [`registry::FuzznumRegistry`] - transactional catalog of representations
//! - [`norms::OperationTNorm`] - q-generalized t-norm/t-conorm bundles
//! - [`executor::OperationExecutor`] - validated dispatch with result caching
//!
//! # Features
//!
//! - Twelve t-norm families (algebraic, Łukasiewicz, Einstein, Hamacher,
//!   Yager, Schweizer-Sklar, Dombi, Aczel-Alsina, Frank, minimum, drastic,
//!   nilpotent) with additive generators and pseudo-inverses
//! - q-generalization of every Archimedean family; q=1 recovers the base
//! - Construction-time self-verification of the t-norm axioms (warnings,
//!   never errors)
//! - Runtime-extensible fuzzy-number representations with transactional
//!   registration
//! - Batch and chain execution helpers with per-item error isolation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fuzznum::{Fuzznum, FuzznumRegistry, OperationExecutor, scalar_attrs};
//!
//! let registry = Arc::new(FuzznumRegistry::with_builtins()?);
//! let executor = OperationExecutor::new(registry.clone());
//!
//! let a = Fuzznum::create_in(&registry, "qrofn", 2, scalar_attrs(&[("md", 0.6), ("nmd", 0.3)]))?;
//! let b = Fuzznum::create_in(&registry, "qrofn", 2, scalar_attrs(&[("md", 0.5), ("nmd", 0.4)]))?;
//!
//! let sum = executor.addition(&a, &b)?;
//! println!("{} + {} = {}", a, b, sum);
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod executor;
pub mod fuzznum;
pub mod norms;
pub mod registry;
pub mod strategies;

// Re-export core traits and types
pub use crate::core::{
    canonical_attrs, scalar_attrs, AttrValue, AttributeMap, CompareOp, FuzznumStrategy,
    FuzznumTemplate, OpOutput, OperandKind, Operation, StrategyHandle, StrategyRef,
    ValidationReport,
};

// Re-export the norm engine
pub use crate::norms::{
    ArchimedeanKind, NormCheckReport, NormFamily, NormParams, OperationTNorm, VerifyOptions,
};

// Re-export registry types
pub use crate::registry::{
    FuzznumRegistry, Registration, RegistryEvent, RegistryEventKind, RegistryHealth,
    RegistryObserver, RegistryStats,
};

// Re-export the façade
pub use crate::fuzznum::{Fuzznum, FuzznumDto};

// Re-export the executor
pub use crate::executor::{BatchOutcome, ExecutorConfig, OpOutcome, OperationExecutor};

// Re-export configuration types
pub use crate::config::{ConfigError, ExecutorConfigSection, FuzzConfig, NormsConfig, TemplateConfigSection};

// Re-export error types
pub use crate::error::{ErrorCode, ErrorContext, FuzzError, FuzzResult};
