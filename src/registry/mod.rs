//! Transactional catalog of fuzzy-number representations
//!
//! Maps an mtype tag to the strategy and template factories that build
//! instances of that representation:
//!
//! - [`FuzznumRegistry`] - the catalog service object
//! - [`Registration`] - one strategy and/or template registration
//! - [`RegistryObserver`] - hook notified on every mutation
//! - transactions with snapshot/rollback; `batch_register` is all-or-nothing
//!
//! The registry is an explicit, injectable service: construct one with
//! [`FuzznumRegistry::new`] (or [`with_builtins`](FuzznumRegistry::with_builtins))
//! and share it via `Arc`. A process-wide handle pre-loaded with the built-in
//! mtypes is available through [`FuzznumRegistry::global`] for convenience;
//! nothing in the crate requires it.
//!
//! A [`transaction`](FuzznumRegistry::transaction) holds the catalog's write
//! lock for its whole extent, so readers see either the pre-transaction or
//! the post-transaction catalog, never a half-applied one. Observers are
//! notified only for mutations that actually commit.

use std::sync::{Arc, OnceLock, RwLock};

use indexmap::IndexMap;
use tracing::warn;

use crate::core::traits::{FuzznumStrategy, FuzznumTemplate, Generation, StrategyRef};
use crate::error::{FuzzError, FuzzResult};

// ============================================================================
// Factories and registrations
// ============================================================================

/// Builds a strategy instance at a given q-rung
pub type StrategyFactory = Arc<dyn Fn(u32) -> FuzzResult<Box<dyn FuzznumStrategy>> + Send + Sync>;

/// Builds a template bound to a strategy through a weak reference
pub type TemplateFactory =
    Arc<dyn Fn(StrategyRef, Generation) -> Box<dyn FuzznumTemplate> + Send + Sync>;

/// A strategy half of a registration, declaring its mtype
#[derive(Clone)]
pub struct StrategyRegistration {
    /// The mtype this factory builds
    pub mtype: String,
    /// The factory
    pub make: StrategyFactory,
}

/// A template half of a registration, declaring its mtype
#[derive(Clone)]
pub struct TemplateRegistration {
    /// The mtype this factory presents
    pub mtype: String,
    /// The factory
    pub make: TemplateFactory,
}

/// One registration: a strategy, a template, or both
///
/// When both halves are present their declared mtypes must match.
#[derive(Clone, Default)]
pub struct Registration {
    /// Optional strategy half
    pub strategy: Option<StrategyRegistration>,
    /// Optional template half
    pub template: Option<TemplateRegistration>,
}

impl Registration {
    /// A strategy-only registration
    pub fn strategy<F>(mtype: impl Into<String>, make: F) -> Self
    where
        F: Fn(u32) -> FuzzResult<Box<dyn FuzznumStrategy>> + Send + Sync + 'static,
    {
        Registration {
            strategy: Some(StrategyRegistration {
                mtype: mtype.into(),
                make: Arc::new(make),
            }),
            template: None,
        }
    }

    /// A template-only registration
    pub fn template<F>(mtype: impl Into<String>, make: F) -> Self
    where
        F: Fn(StrategyRef, Generation) -> Box<dyn FuzznumTemplate> + Send + Sync + 'static,
    {
        Registration {
            strategy: None,
            template: Some(TemplateRegistration {
                mtype: mtype.into(),
                make: Arc::new(make),
            }),
        }
    }

    /// A complete strategy + template pair for one mtype
    pub fn pair<S, T>(mtype: impl Into<String>, strategy: S, template: T) -> Self
    where
        S: Fn(u32) -> FuzzResult<Box<dyn FuzznumStrategy>> + Send + Sync + 'static,
        T: Fn(StrategyRef, Generation) -> Box<dyn FuzznumTemplate> + Send + Sync + 'static,
    {
        let mtype = mtype.into();
        Registration {
            strategy: Some(StrategyRegistration {
                mtype: mtype.clone(),
                make: Arc::new(strategy),
            }),
            template: Some(TemplateRegistration {
                mtype,
                make: Arc::new(template),
            }),
        }
    }

    fn validate(&self) -> FuzzResult<String> {
        let s_mtype = self.strategy.as_ref().map(|s| s.mtype.as_str());
        let t_mtype = self.template.as_ref().map(|t| t.mtype.as_str());
        let mtype = match (s_mtype, t_mtype) {
            (None, None) => {
                return Err(FuzzError::registration(
                    "registration carries neither a strategy nor a template",
                ))
            }
            (Some(s), Some(t)) if s != t => {
                return Err(FuzzError::registration(format!(
                    "strategy mtype '{}' does not match template mtype '{}'",
                    s, t
                )))
            }
            (Some(s), _) => s,
            (None, Some(t)) => t,
        };
        if mtype.is_empty() {
            return Err(FuzzError::registration("mtype must be non-empty"));
        }
        Ok(mtype.to_string())
    }
}

// ============================================================================
// Events and observers
// ============================================================================

/// What changed in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryEventKind {
    RegisterStrategy,
    RegisterTemplate,
    UnregisterStrategy,
    UnregisterTemplate,
}

impl RegistryEventKind {
    /// Short identifier
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEventKind::RegisterStrategy => "register_strategy",
            RegistryEventKind::RegisterTemplate => "register_template",
            RegistryEventKind::UnregisterStrategy => "unregister_strategy",
            RegistryEventKind::UnregisterTemplate => "unregister_template",
        }
    }
}

/// A single catalog mutation
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegistryEvent {
    /// What happened
    pub kind: RegistryEventKind,
    /// The mtype affected
    pub mtype: String,
    /// Whether an existing entry was replaced
    pub overwrote: bool,
    /// Monotonic sequence number
    pub sequence: u64,
}

/// Hook notified on every committed register/unregister
///
/// An observer error is logged and does not interrupt notification of the
/// remaining observers.
pub trait RegistryObserver: Send + Sync {
    /// Receive one catalog mutation
    fn on_event(&self, event: &RegistryEvent) -> FuzzResult<()>;
}

// ============================================================================
// Statistics and health
// ============================================================================

/// Counters over the registry's lifetime
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RegistryStats {
    /// Successful registrations (strategy or template halves)
    pub registrations: u64,
    /// Successful unregistrations
    pub unregistrations: u64,
    /// Registrations that replaced an existing entry
    pub overwrites: u64,
    /// Transactions committed
    pub transactions_committed: u64,
    /// Transactions rolled back
    pub transactions_rolled_back: u64,
}

/// Serializable snapshot of the registry's health
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegistryHealth {
    /// Number of distinct mtypes known (strategy or template)
    pub total_mtypes: usize,
    /// Number of mtypes with both a strategy and a template
    pub complete_pairs: usize,
    /// Number of registered strategies
    pub strategies: usize,
    /// Number of registered templates
    pub templates: usize,
    /// Lifetime counters
    pub stats: RegistryStats,
    /// Number of attached observers
    pub observers: usize,
}

// ============================================================================
// Internal state
// ============================================================================

/// Cap on retained history events
const HISTORY_LIMIT: usize = 256;

struct RegistryState {
    strategies: IndexMap<String, StrategyFactory>,
    templates: IndexMap<String, TemplateFactory>,
    stats: RegistryStats,
    history: Vec<RegistryEvent>,
    sequence: u64,
}

impl RegistryState {
    fn push_event(
        &mut self,
        kind: RegistryEventKind,
        mtype: &str,
        overwrote: bool,
    ) -> RegistryEvent {
        self.sequence += 1;
        let event = RegistryEvent {
            kind,
            mtype: mtype.to_string(),
            overwrote,
            sequence: self.sequence,
        };
        self.history.push(event.clone());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        event
    }

    fn apply_register(&mut self, registration: Registration) -> FuzzResult<Vec<RegistryEvent>> {
        let mtype = registration.validate()?;
        let mut events = Vec::new();

        if let Some(strategy) = registration.strategy {
            let overwrote = self
                .strategies
                .insert(strategy.mtype.clone(), strategy.make)
                .is_some();
            if overwrote {
                self.stats.overwrites += 1;
                warn!(mtype = %mtype, "overwriting registered strategy");
            }
            events.push(self.push_event(RegistryEventKind::RegisterStrategy, &mtype, overwrote));
        }
        if let Some(template) = registration.template {
            let overwrote = self
                .templates
                .insert(template.mtype.clone(), template.make)
                .is_some();
            if overwrote {
                self.stats.overwrites += 1;
                warn!(mtype = %mtype, "overwriting registered template");
            }
            events.push(self.push_event(RegistryEventKind::RegisterTemplate, &mtype, overwrote));
        }
        self.stats.registrations += 1;
        Ok(events)
    }

    fn apply_unregister(
        &mut self,
        mtype: &str,
        remove_strategy: bool,
        remove_template: bool,
    ) -> Vec<RegistryEvent> {
        let mut events = Vec::new();
        if remove_strategy && self.strategies.shift_remove(mtype).is_some() {
            events.push(self.push_event(RegistryEventKind::UnregisterStrategy, mtype, false));
        }
        if remove_template && self.templates.shift_remove(mtype).is_some() {
            events.push(self.push_event(RegistryEventKind::UnregisterTemplate, mtype, false));
        }
        if !events.is_empty() {
            self.stats.unregistrations += 1;
        }
        events
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// A registry transaction: buffered mutations under the catalog write lock
///
/// Obtained from [`FuzznumRegistry::transaction`]. Mutations apply to the
/// live state immediately (the write lock shields them from readers); the
/// snapshot taken at entry is restored if the closure errors. Observer
/// notifications are buffered and delivered only on commit.
pub struct Transaction<'a> {
    state: &'a mut RegistryState,
    events: Vec<RegistryEvent>,
}

impl<'a> Transaction<'a> {
    /// Register a strategy and/or template inside this transaction
    pub fn register(&mut self, registration: Registration) -> FuzzResult<()> {
        let events = self.state.apply_register(registration)?;
        self.events.extend(events);
        Ok(())
    }

    /// Remove entries for an mtype inside this transaction
    pub fn unregister(
        &mut self,
        mtype: &str,
        remove_strategy: bool,
        remove_template: bool,
    ) -> bool {
        let events = self
            .state
            .apply_unregister(mtype, remove_strategy, remove_template);
        let removed = !events.is_empty();
        self.events.extend(events);
        removed
    }

    /// Run a nested transaction
    ///
    /// Nested transactions are no-ops relative to the outermost one: the
    /// closure runs against the same buffered state, and only the outermost
    /// commit or rollback takes effect.
    pub fn transaction<T, F>(&mut self, f: F) -> FuzzResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> FuzzResult<T>,
    {
        f(self)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The catalog of fuzzy-number representations
///
/// All mutation happens behind one `RwLock`; readers see either the
/// pre-transaction or post-transaction catalog.
pub struct FuzznumRegistry {
    state: RwLock<RegistryState>,
    observers: RwLock<Vec<Arc<dyn RegistryObserver>>>,
}

impl Default for FuzznumRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FuzznumRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (strategies, templates) = self
            .state
            .read()
            .map(|s| (s.strategies.len(), s.templates.len()))
            .unwrap_or((0, 0));
        f.debug_struct("FuzznumRegistry")
            .field("strategies", &strategies)
            .field("templates", &templates)
            .finish()
    }
}

impl FuzznumRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        FuzznumRegistry {
            state: RwLock::new(RegistryState {
                strategies: IndexMap::new(),
                templates: IndexMap::new(),
                stats: RegistryStats::default(),
                history: Vec::new(),
                sequence: 0,
            }),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry pre-loaded with the built-in mtypes
    pub fn with_builtins() -> FuzzResult<Self> {
        let registry = FuzznumRegistry::new();
        crate::strategies::register_builtins(&registry)?;
        Ok(registry)
    }

    /// Process-wide shared registry, lazily built with the built-in mtypes
    pub fn global() -> Arc<FuzznumRegistry> {
        static GLOBAL: OnceLock<Arc<FuzznumRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| {
                let registry = FuzznumRegistry::new();
                if let Err(err) = crate::strategies::register_builtins(&registry) {
                    warn!("failed to register built-in mtypes: {}", err);
                }
                Arc::new(registry)
            })
            .clone()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Register a strategy and/or template
    ///
    /// Replacing an existing entry succeeds with a warning; malformed
    /// registrations (no parts, empty mtype, mismatched mtypes) are rejected
    /// before any state changes.
    pub fn register(&self, registration: Registration) -> FuzzResult<()> {
        let events = {
            let mut state = self.state.write()?;
            state.apply_register(registration)?
        };
        self.notify(&events);
        Ok(())
    }

    /// Remove a strategy and/or template for an mtype
    ///
    /// Returns whether anything was actually removed.
    pub fn unregister(
        &self,
        mtype: &str,
        remove_strategy: bool,
        remove_template: bool,
    ) -> FuzzResult<bool> {
        let events = {
            let mut state = self.state.write()?;
            state.apply_unregister(mtype, remove_strategy, remove_template)
        };
        self.notify(&events);
        Ok(!events.is_empty())
    }

    /// Run a closure atomically against the catalog
    ///
    /// Snapshots {strategies, templates, stats} on entry and holds the write
    /// lock for the closure's extent. On `Ok` the mutations commit and
    /// observers are notified; on `Err` the snapshot is restored and the
    /// error propagates unchanged.
    pub fn transaction<T, F>(&self, f: F) -> FuzzResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> FuzzResult<T>,
    {
        let (outcome, events) = {
            let mut state = self.state.write()?;
            let snapshot_strategies = state.strategies.clone();
            let snapshot_templates = state.templates.clone();
            let snapshot_stats = state.stats.clone();

            let mut txn = Transaction {
                state: &mut *state,
                events: Vec::new(),
            };
            match f(&mut txn) {
                Ok(value) => {
                    let events = txn.events;
                    state.stats.transactions_committed += 1;
                    (Ok(value), events)
                }
                Err(err) => {
                    state.strategies = snapshot_strategies;
                    state.templates = snapshot_templates;
                    state.stats = snapshot_stats;
                    state.stats.transactions_rolled_back += 1;
                    warn!("registry transaction rolled back: {}", err.message);
                    (Err(err), Vec::new())
                }
            }
        };
        self.notify(&events);
        outcome
    }

    /// Register many entries in a single transaction; all succeed or none apply
    pub fn batch_register(&self, registrations: Vec<Registration>) -> FuzzResult<usize> {
        self.transaction(|txn| {
            let mut applied = 0;
            for registration in registrations {
                txn.register(registration)?;
                applied += 1;
            }
            Ok(applied)
        })
    }

    /// Attach an observer
    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        if let Ok(mut observers) = self.observers.write() {
            observers.push(observer);
        }
    }

    fn notify(&self, events: &[RegistryEvent]) {
        if events.is_empty() {
            return;
        }
        let observers = match self.observers.read() {
            Ok(observers) => observers.clone(),
            Err(_) => return,
        };
        for event in events {
            for observer in &observers {
                if let Err(err) = observer.on_event(event) {
                    warn!(
                        event = event.kind.name(),
                        mtype = %event.mtype,
                        "registry observer failed: {}",
                        err.message
                    );
                }
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Instantiate a strategy for an mtype at a given q-rung
    pub fn get_strategy(&self, mtype: &str, q: u32) -> FuzzResult<Box<dyn FuzznumStrategy>> {
        let factory = {
            let state = self.state.read()?;
            state
                .strategies
                .get(mtype)
                .cloned()
                .ok_or_else(|| FuzzError::unknown_mtype(mtype))?
        };
        factory(q)
    }

    /// Instantiate a template for an mtype, bound to a strategy reference
    pub fn get_template(
        &self,
        mtype: &str,
        strategy: StrategyRef,
        generation: Generation,
    ) -> FuzzResult<Box<dyn FuzznumTemplate>> {
        let factory = {
            let state = self.state.read()?;
            state
                .templates
                .get(mtype)
                .cloned()
                .ok_or_else(|| FuzzError::unknown_mtype(mtype).with_context("part", "template"))?
        };
        Ok(factory(strategy, generation))
    }

    /// Whether an mtype has a registered strategy
    pub fn contains_strategy(&self, mtype: &str) -> bool {
        self.state
            .read()
            .map(|s| s.strategies.contains_key(mtype))
            .unwrap_or(false)
    }

    /// Whether an mtype has a registered template
    pub fn contains_template(&self, mtype: &str) -> bool {
        self.state
            .read()
            .map(|s| s.templates.contains_key(mtype))
            .unwrap_or(false)
    }

    /// Every mtype with a strategy or template, in registration order
    pub fn get_registered_mtypes(&self) -> Vec<String> {
        let state = match self.state.read() {
            Ok(state) => state,
            Err(_) => return Vec::new(),
        };
        let mut mtypes: Vec<String> = state.strategies.keys().cloned().collect();
        for mtype in state.templates.keys() {
            if !mtypes.contains(mtype) {
                mtypes.push(mtype.clone());
            }
        }
        mtypes
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.strategies.len()).unwrap_or(0)
    }

    /// Whether no strategies are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recent catalog mutations, oldest first
    pub fn history(&self) -> Vec<RegistryEvent> {
        self.state
            .read()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Serializable health snapshot
    pub fn get_health_status(&self) -> FuzzResult<RegistryHealth> {
        let state = self.state.read()?;
        let complete_pairs = state
            .strategies
            .keys()
            .filter(|mtype| state.templates.contains_key(*mtype))
            .count();
        let mut total_mtypes = state.strategies.len();
        for mtype in state.templates.keys() {
            if !state.strategies.contains_key(mtype) {
                total_mtypes += 1;
            }
        }
        Ok(RegistryHealth {
            total_mtypes,
            complete_pairs,
            strategies: state.strategies.len(),
            templates: state.templates.len(),
            stats: state.stats.clone(),
            observers: self.observers.read().map(|o| o.len()).unwrap_or(0),
        })
    }

    /// Lifetime counters
    pub fn stats(&self) -> FuzzResult<RegistryStats> {
        Ok(self.state.read()?.stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::core::attrs::{AttrValue, AttributeMap};
    use crate::core::traits::ValidationReport;
    use crate::error::ErrorCode;

    #[derive(Debug, Clone)]
    struct DummyStrategy {
        q: u32,
    }

    impl FuzznumStrategy for DummyStrategy {
        fn mtype(&self) -> &str {
            "dummy"
        }
        fn q(&self) -> u32 {
            self.q
        }
        fn set_q(&mut self, q: u32) -> FuzzResult<()> {
            self.q = q;
            Ok(())
        }
        fn attributes(&self) -> AttributeMap {
            AttributeMap::new()
        }
        fn get_attr(&self, name: &str) -> FuzzResult<AttrValue> {
            Err(FuzzError::unknown_attribute("dummy", name))
        }
        fn set_attr(&mut self, name: &str, _value: AttrValue) -> FuzzResult<()> {
            Err(FuzzError::unknown_attribute("dummy", name))
        }
        fn validate(&self) -> ValidationReport {
            ValidationReport::ok()
        }
        fn clone_box(&self) -> Box<dyn FuzznumStrategy> {
            Box::new(self.clone())
        }
    }

    fn dummy_registration(mtype: &str) -> Registration {
        Registration::strategy(mtype, |q| {
            Ok(Box::new(DummyStrategy { q }) as Box<dyn FuzznumStrategy>)
        })
    }

    #[test]
    fn test_register_and_instantiate() {
        let registry = FuzznumRegistry::new();
        registry.register(dummy_registration("dummy")).unwrap();
        assert!(registry.contains_strategy("dummy"));
        let strategy = registry.get_strategy("dummy", 3).unwrap();
        assert_eq!(strategy.q(), 3);
    }

    #[test]
    fn test_unknown_mtype_error() {
        let registry = FuzznumRegistry::new();
        let err = registry.get_strategy("nope", 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownMtype);
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn test_malformed_registrations_rejected() {
        let registry = FuzznumRegistry::new();

        let err = registry.register(Registration::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRegistration);

        let err = registry.register(dummy_registration("")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRegistration);

        let mut mismatched = dummy_registration("a");
        mismatched.template = Registration::template("b", |_, _| unreachable!()).template;
        let err = registry.register(mismatched).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRegistration);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overwrite_counts() {
        let registry = FuzznumRegistry::new();
        registry.register(dummy_registration("dummy")).unwrap();
        registry.register(dummy_registration("dummy")).unwrap();
        assert_eq!(registry.stats().unwrap().overwrites, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = FuzznumRegistry::new();
        registry.register(dummy_registration("dummy")).unwrap();
        assert!(registry.unregister("dummy", true, true).unwrap());
        assert!(!registry.contains_strategy("dummy"));
        assert!(!registry.unregister("dummy", true, true).unwrap());
    }

    #[test]
    fn test_transaction_rollback_restores_catalog() {
        let registry = FuzznumRegistry::new();
        registry.register(dummy_registration("keep")).unwrap();
        let before = registry.get_registered_mtypes();
        let stats_before = registry.stats().unwrap();

        let result: FuzzResult<()> = registry.transaction(|txn| {
            txn.register(dummy_registration("first"))?;
            txn.register(Registration::default())?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(registry.get_registered_mtypes(), before);
        let stats_after = registry.stats().unwrap();
        assert_eq!(stats_after.registrations, stats_before.registrations);
        assert_eq!(stats_after.transactions_rolled_back, 1);
    }

    #[test]
    fn test_batch_register_all_or_nothing() {
        let registry = FuzznumRegistry::new();
        let err = registry
            .batch_register(vec![
                dummy_registration("one"),
                dummy_registration("two"),
                dummy_registration(""),
            ])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRegistration);
        assert!(registry.is_empty());

        let applied = registry
            .batch_register(vec![dummy_registration("one"), dummy_registration("two")])
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_nested_transaction_commits_with_outermost() {
        let registry = FuzznumRegistry::new();
        let result: FuzzResult<()> = registry.transaction(|outer| {
            outer.register(dummy_registration("one"))?;
            outer.transaction(|inner| inner.register(dummy_registration("two")))?;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.stats().unwrap().transactions_committed, 1);
    }

    #[test]
    fn test_nested_transaction_failure_rolls_back_everything() {
        let registry = FuzznumRegistry::new();
        let result: FuzzResult<()> = registry.transaction(|outer| {
            outer.register(dummy_registration("one"))?;
            outer.transaction(|inner| inner.register(dummy_registration("")))?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    struct CountingObserver {
        events: AtomicUsize,
        fail: bool,
    }

    impl RegistryObserver for CountingObserver {
        fn on_event(&self, _event: &RegistryEvent) -> FuzzResult<()> {
            self.events.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FuzzError::internal("observer exploded"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_observer_failure_does_not_interrupt_others() {
        let registry = FuzznumRegistry::new();
        let failing = Arc::new(CountingObserver {
            events: AtomicUsize::new(0),
            fail: true,
        });
        let healthy = Arc::new(CountingObserver {
            events: AtomicUsize::new(0),
            fail: false,
        });
        registry.add_observer(failing.clone());
        registry.add_observer(healthy.clone());

        registry.register(dummy_registration("dummy")).unwrap();
        registry.unregister("dummy", true, false).unwrap();

        assert_eq!(failing.events.load(Ordering::SeqCst), 2);
        assert_eq!(healthy.events.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rolled_back_mutations_do_not_notify() {
        let registry = FuzznumRegistry::new();
        let observer = Arc::new(CountingObserver {
            events: AtomicUsize::new(0),
            fail: false,
        });
        registry.add_observer(observer.clone());

        let _ = registry.transaction(|txn| {
            txn.register(dummy_registration("one"))?;
            txn.register(Registration::default())
        });

        assert_eq!(observer.events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_health_status() {
        let registry = FuzznumRegistry::new();
        registry.register(dummy_registration("dummy")).unwrap();
        let health = registry.get_health_status().unwrap();
        assert_eq!(health.total_mtypes, 1);
        assert_eq!(health.strategies, 1);
        assert_eq!(health.complete_pairs, 0);
    }

    #[test]
    fn test_history_records_events() {
        let registry = FuzznumRegistry::new();
        registry.register(dummy_registration("dummy")).unwrap();
        registry.unregister("dummy", true, false).unwrap();
        let history = registry.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, RegistryEventKind::RegisterStrategy);
        assert_eq!(history[1].kind, RegistryEventKind::UnregisterStrategy);
    }
}
