//! Fine-grained reactive signal system
//!
//! A push-pull hybrid, single-threaded reactive graph:
//! - Signals push invalidation notifications to subscribers
//! - Derived values pull (lazily compute) their values when accessed
//! - Effects are scheduled and batched, and run synchronously on flush
//!
//! Every mutation happens inside one synchronous call, so readers never
//! observe a half-applied change. Dependents are recomputed on their next
//! read rather than eagerly.
//!
//! # State
//!
//! [`State<T>`] binds a signal to a [`SharedGraph`] and is the handle most
//! callers keep around:
//!
//! ```rust
//! use sift_core::reactive::{shared_graph, State};
//!
//! let graph = shared_graph();
//! let counter = State::new(&graph, 0i32);
//!
//! counter.set(counter.get() + 1);
//! counter.update(|v| v * 10);
//! assert_eq!(counter.get(), 10);
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::rc::Rc;

new_key_type! {
    /// Unique identifier for a signal
    pub struct SignalId;
    /// Unique identifier for a derived/computed value
    pub struct DerivedId;
    /// Unique identifier for an effect
    pub struct EffectId;
}

/// Subscriber types that can react to signal changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriberId {
    Derived(DerivedId),
    Effect(EffectId),
}

/// A reactive signal handle (cheap to copy)
#[derive(Debug)]
pub struct Signal<T> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> Signal<T> {
    /// Get the signal's internal ID
    pub fn id(&self) -> SignalId {
        self.id
    }
}

/// A derived/computed value handle
#[derive(Debug)]
pub struct Derived<T> {
    id: DerivedId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Derived<T> {}

impl<T> Derived<T> {
    pub fn id(&self) -> DerivedId {
        self.id
    }
}

/// An effect handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    id: EffectId,
}

impl Effect {
    pub fn id(&self) -> EffectId {
        self.id
    }
}

type ComputeFn = Rc<dyn Fn(&ReactiveGraph) -> Box<dyn Any>>;
type EffectFn = Rc<RefCell<dyn FnMut(&ReactiveGraph)>>;
type DeferredFn = Box<dyn FnOnce()>;

struct SignalNode {
    value: Box<dyn Any>,
    /// Version counter for change detection
    version: u64,
    subscribers: SmallVec<[SubscriberId; 4]>,
}

struct DerivedNode {
    /// Cached value (if computed)
    value: Option<Box<dyn Any>>,
    compute: ComputeFn,
    /// Signals read during the last computation
    dependencies: SmallVec<[SignalId; 4]>,
    dirty: Cell<bool>,
}

struct EffectNode {
    run: EffectFn,
    /// Signals read during the last run
    dependencies: SmallVec<[SignalId; 4]>,
    dirty: Cell<bool>,
}

/// The reactive graph that manages all signals, derived values, and effects
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
    derived: SlotMap<DerivedId, DerivedNode>,
    effects: SlotMap<EffectId, EffectNode>,
    pending_effects: RefCell<VecDeque<EffectId>>,
    /// Work queued by effects to run once the graph is released
    deferred: RefCell<VecDeque<DeferredFn>>,
    /// Set while [`run_deferred`] is draining the queue
    draining: Cell<bool>,
    /// Current batch depth (> 0 means we're in a batch)
    batch_depth: Cell<u32>,
    /// Dependencies collected by the computation currently running
    tracking: RefCell<Option<Vec<SignalId>>>,
    global_version: Cell<u64>,
}

impl ReactiveGraph {
    /// Create a new reactive graph
    pub fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            derived: SlotMap::with_key(),
            effects: SlotMap::with_key(),
            pending_effects: RefCell::new(VecDeque::new()),
            deferred: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            batch_depth: Cell::new(0),
            tracking: RefCell::new(None),
            global_version: Cell::new(0),
        }
    }

    // =========================================================================
    // SIGNALS
    // =========================================================================

    /// Create a new signal with an initial value
    pub fn create_signal<T: 'static>(&mut self, initial: T) -> Signal<T> {
        let id = self.signals.insert(SignalNode {
            value: Box::new(initial),
            version: 0,
            subscribers: SmallVec::new(),
        });
        Signal {
            id,
            _marker: PhantomData,
        }
    }

    /// Get the current value of a signal
    ///
    /// If called within a tracking context (effect or derived), this signal
    /// will be recorded as a dependency.
    pub fn get<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.with(signal, T::clone)
    }

    /// Borrow the current value of a signal without cloning it
    ///
    /// Tracks the signal like [`ReactiveGraph::get`].
    pub fn with<T: 'static, R>(&self, signal: Signal<T>, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.track(signal.id);
        self.signals
            .get(signal.id)
            .and_then(|node| node.value.downcast_ref::<T>())
            .map(f)
    }

    /// Get the current value without tracking as a dependency
    pub fn get_untracked<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.signals
            .get(signal.id)
            .and_then(|node| node.value.downcast_ref::<T>().cloned())
    }

    /// Set the value of a signal, triggering reactive updates
    pub fn set<T: 'static>(&mut self, signal: Signal<T>, value: T) {
        let Some(node) = self.signals.get_mut(signal.id) else {
            return;
        };
        node.value = Box::new(value);
        node.version += 1;
        self.global_version.set(self.global_version.get() + 1);

        let subscribers = node.subscribers.clone();
        for sub in subscribers {
            self.mark_dirty(sub);
        }

        if self.batch_depth.get() == 0 {
            self.flush_effects();
        }
    }

    /// Update a signal in place
    ///
    /// The closure mutates the stored value directly; subscribers are
    /// notified exactly as for [`ReactiveGraph::set`].
    pub fn update<T: 'static, R>(
        &mut self,
        signal: Signal<T>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let node = self.signals.get_mut(signal.id)?;
        let value = node.value.downcast_mut::<T>()?;
        let result = f(value);
        node.version += 1;
        self.global_version.set(self.global_version.get() + 1);

        let subscribers = node.subscribers.clone();
        for sub in subscribers {
            self.mark_dirty(sub);
        }

        if self.batch_depth.get() == 0 {
            self.flush_effects();
        }
        Some(result)
    }

    /// Get the version of a signal (for change detection)
    pub fn signal_version(&self, id: SignalId) -> Option<u64> {
        self.signals.get(id).map(|n| n.version)
    }

    // =========================================================================
    // DERIVED VALUES
    // =========================================================================

    /// Create a derived (computed) value
    ///
    /// The computation runs lazily on the first [`ReactiveGraph::get_derived`]
    /// and again on the first read after any signal it read has changed.
    pub fn create_derived<T, F>(&mut self, compute: F) -> Derived<T>
    where
        T: Clone + 'static,
        F: Fn(&ReactiveGraph) -> T + 'static,
    {
        let compute: ComputeFn = Rc::new(move |graph: &ReactiveGraph| -> Box<dyn Any> {
            Box::new(compute(graph))
        });

        let id = self.derived.insert(DerivedNode {
            value: None,
            compute,
            dependencies: SmallVec::new(),
            dirty: Cell::new(true),
        });

        Derived {
            id,
            _marker: PhantomData,
        }
    }

    /// Get the value of a derived, computing if necessary
    pub fn get_derived<T: Clone + 'static>(&mut self, derived: Derived<T>) -> Option<T> {
        let node = self.derived.get(derived.id)?;

        if !node.dirty.get() {
            if let Some(ref cached) = node.value {
                return cached.downcast_ref::<T>().cloned();
            }
        }

        // The closure is shared so it can borrow the graph while it runs
        let compute = Rc::clone(&node.compute);
        let outer = self.tracking.replace(Some(Vec::new()));
        let value = compute(self);
        let deps = self.tracking.replace(outer).unwrap_or_default();

        let subscriber = SubscriberId::Derived(derived.id);
        let old_deps = self
            .derived
            .get(derived.id)
            .map(|node| node.dependencies.clone())
            .unwrap_or_default();
        self.resubscribe(subscriber, &old_deps, &deps);

        let node = self.derived.get_mut(derived.id)?;
        node.dependencies = deps.into_iter().collect();
        node.dirty.set(false);
        let result = value.downcast_ref::<T>().cloned();
        node.value = Some(value);
        result
    }

    /// Whether a derived value will recompute on its next read
    pub fn is_derived_dirty<T>(&self, derived: Derived<T>) -> bool {
        self.derived
            .get(derived.id)
            .map(|node| node.dirty.get())
            .unwrap_or(false)
    }

    // =========================================================================
    // EFFECTS
    // =========================================================================

    /// Create an effect that runs now and again whenever its dependencies change
    pub fn create_effect<F>(&mut self, run: F) -> Effect
    where
        F: FnMut(&ReactiveGraph) + 'static,
    {
        let run: EffectFn = Rc::new(RefCell::new(run));
        let id = self.effects.insert(EffectNode {
            run,
            dependencies: SmallVec::new(),
            dirty: Cell::new(true),
        });

        self.pending_effects.borrow_mut().push_back(id);

        if self.batch_depth.get() == 0 {
            self.flush_effects();
        }

        Effect { id }
    }

    /// Dispose of an effect, removing it from the graph
    pub fn dispose_effect(&mut self, effect: Effect) {
        if let Some(node) = self.effects.remove(effect.id) {
            for &dep_id in &node.dependencies {
                if let Some(sig) = self.signals.get_mut(dep_id) {
                    sig.subscribers
                        .retain(|s| *s != SubscriberId::Effect(effect.id));
                }
            }
        }
    }

    /// Queue a task to run after the current mutation, outside any borrow
    ///
    /// Effects only see `&ReactiveGraph`, so anything that needs to read
    /// back through a [`SharedGraph`] is deferred. Tasks run in queue order
    /// from [`run_deferred`].
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.deferred.borrow_mut().push_back(Box::new(task));
    }

    fn pop_deferred(&self) -> Option<DeferredFn> {
        self.deferred.borrow_mut().pop_front()
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Start a batch - effects won't run until the batch ends
    pub fn batch_start(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
    }

    /// End a batch and flush pending effects
    pub fn batch_end(&mut self) {
        let depth = self.batch_depth.get();
        if depth > 0 {
            self.batch_depth.set(depth - 1);
            if depth == 1 {
                self.flush_effects();
            }
        }
    }

    /// Run a function in a batch context
    pub fn batch<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.batch_start();
        let result = f(self);
        self.batch_end();
        result
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn track(&self, id: SignalId) {
        if let Some(ref mut deps) = *self.tracking.borrow_mut() {
            if !deps.contains(&id) {
                deps.push(id);
            }
        }
    }

    fn resubscribe(&mut self, subscriber: SubscriberId, old: &[SignalId], new: &[SignalId]) {
        for &dep_id in old {
            if let Some(sig) = self.signals.get_mut(dep_id) {
                sig.subscribers.retain(|s| *s != subscriber);
            }
        }
        for &dep_id in new {
            if let Some(sig) = self.signals.get_mut(dep_id) {
                if !sig.subscribers.contains(&subscriber) {
                    sig.subscribers.push(subscriber);
                }
            }
        }
    }

    fn mark_dirty(&self, sub: SubscriberId) {
        match sub {
            SubscriberId::Derived(id) => {
                if let Some(node) = self.derived.get(id) {
                    node.dirty.set(true);
                }
            }
            SubscriberId::Effect(id) => {
                if let Some(node) = self.effects.get(id) {
                    if !node.dirty.get() {
                        node.dirty.set(true);
                        self.pending_effects.borrow_mut().push_back(id);
                    }
                }
            }
        }
    }

    fn flush_effects(&mut self) {
        let effects: Vec<EffectId> = self.pending_effects.borrow_mut().drain(..).collect();
        if !effects.is_empty() {
            tracing::trace!(count = effects.len(), "flushing effects");
        }
        for effect_id in effects {
            self.run_effect(effect_id);
        }
    }

    fn run_effect(&mut self, effect_id: EffectId) {
        let Some(node) = self.effects.get(effect_id) else {
            return;
        };
        if !node.dirty.get() {
            return;
        }
        node.dirty.set(false);
        let run = Rc::clone(&node.run);

        let outer = self.tracking.replace(Some(Vec::new()));
        {
            let mut run = run.borrow_mut();
            (&mut *run)(self);
        }
        let deps = self.tracking.replace(outer).unwrap_or_default();

        let old_deps = self
            .effects
            .get(effect_id)
            .map(|node| node.dependencies.clone())
            .unwrap_or_default();
        self.resubscribe(SubscriberId::Effect(effect_id), &old_deps, &deps);

        if let Some(node) = self.effects.get_mut(effect_id) {
            node.dependencies = deps.into_iter().collect();
        }
    }

    /// Get statistics about the reactive graph
    pub fn stats(&self) -> ReactiveStats {
        ReactiveStats {
            signal_count: self.signals.len(),
            derived_count: self.derived.len(),
            effect_count: self.effects.len(),
            pending_effects: self.pending_effects.borrow().len(),
            deferred_tasks: self.deferred.borrow().len(),
            global_version: self.global_version.get(),
        }
    }
}

impl Default for ReactiveGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the reactive graph
#[derive(Debug, Clone)]
pub struct ReactiveStats {
    pub signal_count: usize,
    pub derived_count: usize,
    pub effect_count: usize,
    pub pending_effects: usize,
    pub deferred_tasks: usize,
    pub global_version: u64,
}

// =============================================================================
// STATE - High-level API for shared state
// =============================================================================

/// Reactive graph shared between the owner of some state and its readers
pub type SharedGraph = Rc<RefCell<ReactiveGraph>>;

/// Create an empty [`SharedGraph`]
pub fn shared_graph() -> SharedGraph {
    Rc::new(RefCell::new(ReactiveGraph::new()))
}

/// Run tasks queued with [`ReactiveGraph::defer`] until the queue is empty
///
/// Each task runs with the graph released, so it may read or write any
/// `State` on it. A call made while another drain is in progress returns
/// at once; the outer drain picks up whatever was queued.
pub fn run_deferred(graph: &SharedGraph) {
    match graph.try_borrow() {
        Ok(g) if !g.draining.get() => g.draining.set(true),
        _ => return,
    }

    loop {
        let task = match graph.try_borrow() {
            Ok(g) => g.pop_deferred(),
            Err(_) => None,
        };
        match task {
            Some(task) => task(),
            None => break,
        }
    }

    if let Ok(g) = graph.try_borrow() {
        g.draining.set(false);
    }
}

/// A signal bound to the graph that owns it
///
/// Cloning a `State` clones the handle, not the value: every clone reads
/// and writes the same signal.
///
/// Effects run synchronously inside [`State::set`] and [`State::update`]
/// while the graph is borrowed, so an effect must not call back into a
/// `State` of the same graph directly. Work that needs to do so goes
/// through [`ReactiveGraph::defer`], which these methods drain once the
/// borrow is released.
pub struct State<T> {
    signal: Signal<T>,
    graph: SharedGraph,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal,
            graph: Rc::clone(&self.graph),
        }
    }
}

impl<T: 'static> State<T> {
    /// Create a signal on `graph` holding `initial`
    pub fn new(graph: &SharedGraph, initial: T) -> Self {
        let signal = graph.borrow_mut().create_signal(initial);
        Self {
            signal,
            graph: Rc::clone(graph),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T
    where
        T: Clone + Default,
    {
        self.try_get().unwrap_or_default()
    }

    /// Get a clone of the current value, returning None if the signal is gone
    pub fn try_get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.graph.borrow().get(self.signal)
    }

    /// Borrow the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.graph.borrow().with(self.signal, f)
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        self.graph.borrow_mut().set(self.signal, value);
        run_deferred(&self.graph);
    }

    /// Mutate the value in place and notify subscribers
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let result = self.graph.borrow_mut().update(self.signal, f);
        run_deferred(&self.graph);
        result
    }

    /// Get the underlying signal (for advanced use cases)
    pub fn signal(&self) -> Signal<T> {
        self.signal
    }

    /// The graph this state lives on
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }
}
