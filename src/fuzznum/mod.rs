//! The Fuzznum façade
//!
//! A [`Fuzznum`] binds one strategy instance (the numeric state and algebra)
//! and one template instance (the presentation view) for a registered mtype:
//!
//! - attribute reads/writes delegate to the strategy through its validated
//!   mutation pipeline, with a per-instance read cache
//! - view methods (`score`, `accuracy`, `report`, `Display`) delegate to the
//!   template, which only holds a weak reference back
//! - `to_dict`/`from_dict` serialize to a plain `{mtype, q, attributes}`
//!   mapping
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzznum::{Fuzznum, scalar_attrs};
//!
//! let a = Fuzznum::create("qrofn", 2, scalar_attrs(&[("md", 0.6), ("nmd", 0.3)]))?;
//! println!("{} scores {}", a, a.score()?);
//! ```

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::cache::LruCache;
use crate::core::attrs::{AttrValue, AttributeMap};
use crate::core::traits::{
    bump_generation, current_generation, FuzznumTemplate, Generation, StrategyHandle,
    ValidationReport,
};
use crate::error::{FuzzError, FuzzResult};
use crate::registry::FuzznumRegistry;

/// Capacity of the per-instance attribute read cache
const ATTR_CACHE_CAPACITY: usize = 16;

// ============================================================================
// Serialization DTO
// ============================================================================

/// Plain-data form of a Fuzznum: `{mtype, q, attributes}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzznumDto {
    /// Representation tag
    pub mtype: String,
    /// q-rung
    pub q: u32,
    /// Attribute values
    pub attributes: AttributeMap,
}

// ============================================================================
// Fuzznum
// ============================================================================

/// A generalized fuzzy number bound to its strategy and template
#[derive(Debug)]
pub struct Fuzznum {
    mtype: String,
    strategy: StrategyHandle,
    template: Box<dyn FuzznumTemplate>,
    generation: Generation,
    registry: Arc<FuzznumRegistry>,
    attr_cache: RwLock<LruCache<String, (u64, AttrValue)>>,
}

impl Fuzznum {
    /// Build a Fuzznum from the process-wide registry
    pub fn create(mtype: &str, q: u32, attrs: AttributeMap) -> FuzzResult<Self> {
        Self::create_in(&FuzznumRegistry::global(), mtype, q, attrs)
    }

    /// Build a Fuzznum from an explicit registry
    pub fn create_in(
        registry: &Arc<FuzznumRegistry>,
        mtype: &str,
        q: u32,
        attrs: AttributeMap,
    ) -> FuzzResult<Self> {
        let mut strategy = registry.get_strategy(mtype, q)?;
        for (name, value) in attrs {
            strategy.set_attr(&name, value)?;
        }

        let handle: StrategyHandle = Arc::new(RwLock::new(strategy));
        let generation: Generation = Arc::new(AtomicU64::new(0));
        let template = registry.get_template(mtype, Arc::downgrade(&handle), generation.clone())?;

        Ok(Fuzznum {
            mtype: mtype.to_string(),
            strategy: handle,
            template,
            generation,
            registry: registry.clone(),
            attr_cache: RwLock::new(LruCache::new(ATTR_CACHE_CAPACITY)),
        })
    }

    /// Wrap an already-validated strategy instance
    ///
    /// Used by the executor's instance cache to skip the attribute pipeline
    /// when an identical result was built before. The template still comes
    /// from the registry.
    pub fn from_strategy_in(
        registry: &Arc<FuzznumRegistry>,
        strategy: Box<dyn crate::core::traits::FuzznumStrategy>,
    ) -> FuzzResult<Self> {
        let mtype = strategy.mtype().to_string();
        let handle: StrategyHandle = Arc::new(RwLock::new(strategy));
        let generation: Generation = Arc::new(AtomicU64::new(0));
        let template =
            registry.get_template(&mtype, Arc::downgrade(&handle), generation.clone())?;
        Ok(Fuzznum {
            mtype,
            strategy: handle,
            template,
            generation,
            registry: registry.clone(),
            attr_cache: RwLock::new(LruCache::new(ATTR_CACHE_CAPACITY)),
        })
    }

    /// Rebuild from a serialized mapping via the process-wide registry
    pub fn from_dict(dto: &FuzznumDto) -> FuzzResult<Self> {
        Self::from_dict_in(&FuzznumRegistry::global(), dto)
    }

    /// Rebuild from a serialized mapping via an explicit registry
    pub fn from_dict_in(registry: &Arc<FuzznumRegistry>, dto: &FuzznumDto) -> FuzzResult<Self> {
        Self::create_in(registry, &dto.mtype, dto.q, dto.attributes.clone())
    }

    /// Parse a Fuzznum from its JSON form
    pub fn from_json(json: &str) -> FuzzResult<Self> {
        let dto: FuzznumDto = serde_json::from_str(json)?;
        Self::from_dict(&dto)
    }

    /// Serialize to a plain `{mtype, q, attributes}` mapping
    pub fn to_dict(&self) -> FuzzResult<FuzznumDto> {
        let strategy = self.strategy.read()?;
        Ok(FuzznumDto {
            mtype: self.mtype.clone(),
            q: strategy.q(),
            attributes: strategy.attributes(),
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> FuzzResult<String> {
        Ok(serde_json::to_string(&self.to_dict()?)?)
    }

    /// Independent deep copy; no mutable state is shared with the original
    pub fn copy(&self) -> FuzzResult<Self> {
        let dto = self.to_dict()?;
        Self::from_dict_in(&self.registry, &dto)
    }

    // ========================================================================
    // Delegated data access
    // ========================================================================

    /// The representation tag
    pub fn mtype(&self) -> &str {
        &self.mtype
    }

    /// The q-rung
    pub fn q(&self) -> u32 {
        self.strategy.read().map(|s| s.q()).unwrap_or(0)
    }

    /// The registry this instance was created from
    pub fn registry(&self) -> &Arc<FuzznumRegistry> {
        &self.registry
    }

    /// Shared handle to the bound strategy (used by the executor)
    pub fn strategy(&self) -> &StrategyHandle {
        &self.strategy
    }

    /// Snapshot of every attribute
    pub fn attributes(&self) -> FuzzResult<AttributeMap> {
        Ok(self.strategy.read()?.attributes())
    }

    /// Read one attribute, served from the instance cache until invalidated
    pub fn get(&self, name: &str) -> FuzzResult<AttrValue> {
        let generation = current_generation(&self.generation);
        {
            let mut cache = self.attr_cache.write()?;
            if let Some((gen, value)) = cache.get(&name.to_string()) {
                if gen == generation {
                    return Ok(value);
                }
            }
        }
        let value = self.strategy.read()?.get_attr(name)?;
        self.attr_cache
            .write()?
            .put(name.to_string(), (generation, value.clone()));
        Ok(value)
    }

    /// Write one attribute through the strategy's validated pipeline
    ///
    /// A successful write bumps the generation counter, invalidating both
    /// the attribute cache and the template's metric cache.
    pub fn set(&self, name: &str, value: AttrValue) -> FuzzResult<()> {
        self.strategy.write()?.set_attr(name, value)?;
        bump_generation(&self.generation);
        Ok(())
    }

    /// Change the q-rung, re-validating the composite constraint
    pub fn set_q(&self, q: u32) -> FuzzResult<()> {
        self.strategy.write()?.set_q(q)?;
        bump_generation(&self.generation);
        Ok(())
    }

    // ========================================================================
    // Delegated views
    // ========================================================================

    /// Score metric from the bound template
    pub fn score(&self) -> FuzzResult<f64> {
        self.template.score()
    }

    /// Accuracy metric from the bound template
    pub fn accuracy(&self) -> FuzzResult<f64> {
        self.template.accuracy()
    }

    /// Indeterminacy metric from the bound template
    pub fn indeterminacy(&self) -> FuzzResult<f64> {
        self.template.indeterminacy()
    }

    /// Multi-line report from the bound template
    pub fn report(&self) -> FuzzResult<String> {
        self.template.report()
    }

    /// Direct access to the bound template
    pub fn template(&self) -> &dyn FuzznumTemplate {
        self.template.as_ref()
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Aggregate strategy-level and template-level health checks
    pub fn validate_state(&self) -> ValidationReport {
        let mut report = ValidationReport::ok();
        match self.strategy.read() {
            Ok(strategy) => report.merge(strategy.validate()),
            Err(_) => report.issue("strategy lock poisoned"),
        }
        if !self.template.is_live() {
            report.issue("template reference is no longer live");
        }
        if self.template.mtype() != self.mtype {
            report.issue(format!(
                "template mtype '{}' does not match fuzznum mtype '{}'",
                self.template.mtype(),
                self.mtype
            ));
        }
        report
    }
}

impl fmt::Display for Fuzznum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.template.display() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "<invalid {}>", self.mtype),
        }
    }
}

impl PartialEq for Fuzznum {
    fn eq(&self, other: &Self) -> bool {
        if self.mtype != other.mtype || self.q() != other.q() {
            return false;
        }
        match (self.attributes(), other.attributes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
