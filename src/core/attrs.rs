//! Attribute values exchanged between strategies, templates and the executor
//!
//! A strategy's numeric state is exposed as a map of named attribute values.
//! Operation hooks consume and produce these maps, which keeps strategy
//! implementations interoperable without downcasting: a qrofn strategy reads
//! its peer's `md`/`nmd` through the same map interface the executor uses to
//! build result instances.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FuzzError, FuzzResult};

/// A single attribute value: scalar, interval, or vector
///
/// Which kinds an mtype uses is up to its strategy: `qrofn` stores scalars,
/// `ivqrofn` stores `[lower, upper]` intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// A single numeric value
    Scalar(f64),
    /// A closed interval `[lower, upper]`
    Interval([f64; 2]),
    /// A fixed-length numeric vector
    Vector(Vec<f64>),
}

impl AttrValue {
    /// Kind name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Scalar(_) => "scalar",
            AttrValue::Interval(_) => "interval",
            AttrValue::Vector(_) => "vector",
        }
    }

    /// Extract a scalar, or fail with a kind mismatch
    pub fn as_scalar(&self) -> FuzzResult<f64> {
        match self {
            AttrValue::Scalar(v) => Ok(*v),
            other => Err(FuzzError::type_mismatch(format!(
                "expected scalar attribute, got {}",
                other.kind()
            ))
            .with_code(crate::error::ErrorCode::AttributeKindMismatch)),
        }
    }

    /// Extract an interval, or fail with a kind mismatch
    pub fn as_interval(&self) -> FuzzResult<[f64; 2]> {
        match self {
            AttrValue::Interval(v) => Ok(*v),
            other => Err(FuzzError::type_mismatch(format!(
                "expected interval attribute, got {}",
                other.kind()
            ))
            .with_code(crate::error::ErrorCode::AttributeKindMismatch)),
        }
    }

    /// Extract a vector view, or fail with a kind mismatch
    pub fn as_vector(&self) -> FuzzResult<&[f64]> {
        match self {
            AttrValue::Vector(v) => Ok(v.as_slice()),
            other => Err(FuzzError::type_mismatch(format!(
                "expected vector attribute, got {}",
                other.kind()
            ))
            .with_code(crate::error::ErrorCode::AttributeKindMismatch)),
        }
    }

    /// Component-wise approximate equality within a tolerance
    pub fn approx_eq(&self, other: &AttrValue, tol: f64) -> bool {
        match (self, other) {
            (AttrValue::Scalar(a), AttrValue::Scalar(b)) => (a - b).abs() <= tol,
            (AttrValue::Interval(a), AttrValue::Interval(b)) => {
                (a[0] - b[0]).abs() <= tol && (a[1] - b[1]).abs() <= tol
            }
            (AttrValue::Vector(a), AttrValue::Vector(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol)
            }
            _ => false,
        }
    }

    /// Deterministic string form used in cache keys
    ///
    /// Rust's shortest-round-trip float formatting is stable across calls,
    /// which makes the canonical form usable as a hash input.
    pub fn canonical(&self) -> String {
        match self {
            AttrValue::Scalar(v) => format!("{}", v),
            AttrValue::Interval([lo, hi]) => format!("[{},{}]", lo, hi),
            AttrValue::Vector(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| format!("{}", v)).collect();
                format!("({})", parts.join(","))
            }
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Scalar(v)
    }
}

impl From<[f64; 2]> for AttrValue {
    fn from(v: [f64; 2]) -> Self {
        AttrValue::Interval(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Vector(v)
    }
}

/// Named attribute values in declaration order
pub type AttributeMap = IndexMap<String, AttrValue>;

/// Canonical string form of an attribute map: keys sorted, values canonical
///
/// Two maps with equal contents produce identical strings regardless of
/// insertion order, which is what the executor's cache key needs.
pub fn canonical_attrs(attrs: &AttributeMap) -> String {
    let mut keys: Vec<&String> = attrs.keys().collect();
    keys.sort();
    let parts: Vec<String> = keys
        .iter()
        .map(|k| format!("{}={}", k, attrs[k.as_str()].canonical()))
        .collect();
    parts.join(";")
}

/// Convenience constructor for scalar attribute maps
pub fn scalar_attrs(pairs: &[(&str, f64)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttrValue::Scalar(*v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_roundtrip() {
        let v = AttrValue::Scalar(0.6);
        assert_eq!(v.as_scalar().unwrap(), 0.6);
        assert!(v.as_interval().is_err());
    }

    #[test]
    fn test_interval_kind_mismatch_names_kinds() {
        let v = AttrValue::Interval([0.2, 0.5]);
        let err = v.as_scalar().unwrap_err();
        assert!(err.message.contains("interval"));
    }

    #[test]
    fn test_approx_eq() {
        let a = AttrValue::Scalar(0.5);
        let b = AttrValue::Scalar(0.5 + 1e-14);
        assert!(a.approx_eq(&b, 1e-12));
        assert!(!a.approx_eq(&AttrValue::Scalar(0.6), 1e-12));
        assert!(!a.approx_eq(&AttrValue::Interval([0.5, 0.5]), 1e-12));
    }

    #[test]
    fn test_canonical_attrs_is_order_independent() {
        let mut a = AttributeMap::new();
        a.insert("md".into(), AttrValue::Scalar(0.6));
        a.insert("nmd".into(), AttrValue::Scalar(0.3));

        let mut b = AttributeMap::new();
        b.insert("nmd".into(), AttrValue::Scalar(0.3));
        b.insert("md".into(), AttrValue::Scalar(0.6));

        assert_eq!(canonical_attrs(&a), canonical_attrs(&b));
    }

    #[test]
    fn test_serde_untagged() {
        let v: AttrValue = serde_json::from_str("0.75").unwrap();
        assert_eq!(v, AttrValue::Scalar(0.75));
        let v: AttrValue = serde_json::from_str("[0.2, 0.4]").unwrap();
        assert_eq!(v, AttrValue::Interval([0.2, 0.4]));
        let v: AttrValue = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(v, AttrValue::Vector(vec![0.1, 0.2, 0.3]));
    }
}
