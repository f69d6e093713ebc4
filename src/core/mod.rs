//! Core abstractions: attribute values, strategy/template traits, operations

pub mod attrs;
pub mod traits;

pub use attrs::{canonical_attrs, scalar_attrs, AttrValue, AttributeMap};
pub use traits::{
    bump_generation, current_generation, CompareOp, FuzznumStrategy, FuzznumTemplate, Generation,
    MetricCache, OpOutput, OperandKind, Operation, StrategyHandle, StrategyRef, ValidationReport,
};
