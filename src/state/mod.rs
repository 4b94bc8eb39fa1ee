// State synchronization module
//
// This module provides the SyncEngine, the per-control-instance owner of the
// live numeric state for one or more ordered state identifiers. Every
// mutation is corrected by a deterministic cascade so the bound-set
// invariants hold at every observable instant, and change notifications are
// batched onto a broadcast channel for GUI updates.

pub mod tasks;

pub use tasks::{TaskHandle, TaskQueue};

use crate::spec::ControlSpec;
use crate::validate::BoundSet;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tokio::sync::broadcast;

/// Runtime failure of a state mutation. Fatal to the call only: a rejected
/// call leaves the stored values exactly as they were, with no partial
/// cascade applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("unknown state identifier `{identifier}`")]
    UnknownIdentifier { identifier: String },

    #[error("value {value} for `{identifier}` cannot enter the slot domain")]
    NotANumber { identifier: String, value: f64 },
}

/// When interactive edits are flushed to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Every edit is immediately batched and flushed.
    EveryChange,
    /// Edits accumulate silently until an explicit [`SyncEngine::commit`].
    OnCommit,
}

/// Change events emitted once per notification batch.
///
/// `ValueChanged` is the single-identifier convenience shape; a batch in
/// which more than one identifier changed value arrives as `ValuesChanged`
/// with the full identifier-to-value mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    ValueChanged {
        control: String,
        identifier: String,
        value: f64,
    },
    ValuesChanged {
        control: String,
        values: IndexMap<String, f64>,
    },
}

impl StateEvent {
    /// The owning control's identifier.
    pub fn control(&self) -> &str {
        match self {
            StateEvent::ValueChanged { control, .. }
            | StateEvent::ValuesChanged { control, .. } => control,
        }
    }

    /// The changed identifiers and their resulting real-domain values.
    pub fn values(&self) -> IndexMap<String, f64> {
        match self {
            StateEvent::ValueChanged {
                identifier, value, ..
            } => IndexMap::from([(identifier.clone(), *value)]),
            StateEvent::ValuesChanged { values, .. } => values.clone(),
        }
    }
}

/// Dual-representation state synchronizer for one control instance.
///
/// The engine holds the authoritative value of every state identifier in the
/// integer tick domain (`tick = round(value * 10^precision)`), so repeated
/// real-to-tick round-trips are exact at the declared precision. The
/// real-domain view is always derived, never stored.
///
/// Mutations run the cascade: the edited slot is clamped into the window
/// where the whole chain stays satisfiable, then violated neighbors are
/// pushed outward to `value ± minInterval` and clamped to their own bounds.
/// Construction-time feasibility checking
/// ([`BoundSet::new`](crate::validate::BoundSet::new)) guarantees a solution
/// exists, so the cascade is total - corrections are defined behavior, never
/// errors.
///
/// # Ownership
///
/// An engine is owned exclusively by its control instance and mutated from
/// one logical flow only; broadcast receivers may observe it from anywhere.
pub struct SyncEngine {
    control: String,
    ids: Vec<String>,
    ticks: Vec<i64>,
    slot_ticks: Vec<(i64, i64)>,
    interval_ticks: i64,
    page_ticks: i64,
    scale: f64,
    precision: u32,
    policy: NotifyPolicy,
    pending: IndexSet<String>,
    event_tx: broadcast::Sender<StateEvent>,
}

impl SyncEngine {
    /// Seed an engine from a bound set and initial real-domain values.
    ///
    /// `ids`, `bounds`, and `initial` must agree in length; initial values
    /// are normalized through the cascade so the invariants hold from the
    /// first observable instant.
    pub fn new(
        control: impl Into<String>,
        ids: Vec<String>,
        bounds: &BoundSet,
        initial: &[f64],
        policy: NotifyPolicy,
    ) -> Self {
        assert_eq!(ids.len(), bounds.len(), "one identifier per slot");
        assert_eq!(initial.len(), bounds.len(), "one initial value per slot");

        let scale = bounds.tick_scale();
        let to_tick = |v: f64| (v * scale).round() as i64;

        let slot_ticks: Vec<(i64, i64)> = bounds
            .slots()
            .iter()
            .map(|slot| (to_tick(slot.min), to_tick(slot.max)))
            .collect();
        let interval_ticks = to_tick(bounds.min_interval());
        let page_ticks = to_tick(bounds.page_increment()).max(1);

        // Normalize the seed: clamp each slot, then one ascending pass so
        // adjacent pairs respect the interval.
        let mut ticks: Vec<i64> = initial
            .iter()
            .zip(&slot_ticks)
            .map(|(&v, &(min, max))| to_tick(v).clamp(min, max))
            .collect();
        for i in 1..ticks.len() {
            let (min, max) = slot_ticks[i];
            ticks[i] = ticks[i].max(ticks[i - 1] + interval_ticks).clamp(min, max);
        }

        let (event_tx, _) = broadcast::channel(64);

        Self {
            control: control.into(),
            ids,
            ticks,
            slot_ticks,
            interval_ticks,
            page_ticks,
            scale,
            precision: bounds.precision(),
            policy,
            pending: IndexSet::new(),
            event_tx,
        }
    }

    /// Seed an engine from a numeric control's specifier. Returns `None`
    /// for kinds without numeric slots.
    pub fn from_spec(spec: &ControlSpec) -> Option<Self> {
        let bounds = spec.bounds()?;
        let policy = if spec.send_every_change() {
            NotifyPolicy::EveryChange
        } else {
            NotifyPolicy::OnCommit
        };
        Some(Self::new(
            spec.identifier(),
            spec.state_ids().to_vec(),
            bounds,
            spec.initial_values(),
            policy,
        ))
    }

    pub fn control(&self) -> &str {
        &self.control
    }

    pub fn identifiers(&self) -> &[String] {
        &self.ids
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Page increment in ticks, for discretized step interactions.
    pub fn page_ticks(&self) -> i64 {
        self.page_ticks
    }

    /// Subscribe to this engine's notification batches.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    /// Real-to-tick conversion at this engine's precision.
    pub fn to_tick(&self, value: f64) -> i64 {
        (value * self.scale).round() as i64
    }

    /// Tick-to-real conversion at this engine's precision.
    pub fn from_tick(&self, tick: i64) -> f64 {
        tick as f64 / self.scale
    }

    /// Current real-domain value of one identifier.
    pub fn value(&self, identifier: &str) -> Result<f64, StateError> {
        self.index_of(identifier)
            .map(|i| self.from_tick(self.ticks[i]))
    }

    /// Current tick-domain value of one identifier.
    pub fn tick(&self, identifier: &str) -> Result<i64, StateError> {
        self.index_of(identifier).map(|i| self.ticks[i])
    }

    /// All current values, in slot order.
    pub fn values(&self) -> IndexMap<String, f64> {
        self.ids
            .iter()
            .zip(&self.ticks)
            .map(|(id, &t)| (id.clone(), self.from_tick(t)))
            .collect()
    }

    /// Set one identifier's value, cascading corrections to its neighbors.
    ///
    /// Returns the set of identifiers whose stored value actually changed
    /// (before/after comparison, not merely visited). Emits no
    /// notification; callers batch dirty sets and flush once per batch via
    /// [`notify_listener`](Self::notify_listener).
    pub fn set_state(
        &mut self,
        identifier: &str,
        value: f64,
    ) -> Result<IndexSet<String>, StateError> {
        let index = self.index_of(identifier)?;
        if !value.is_finite() {
            return Err(StateError::NotANumber {
                identifier: identifier.to_string(),
                value,
            });
        }

        let before = self.ticks.clone();
        self.apply(index, self.to_tick(value));

        Ok(self.diff(&before))
    }

    /// Set several identifiers in one call, in the given order.
    ///
    /// Every identifier and value is validated before any mutation, so a
    /// rejected call applies no partial cascade. Returns the union dirty
    /// set.
    pub fn set_states(
        &mut self,
        updates: &[(&str, f64)],
    ) -> Result<IndexSet<String>, StateError> {
        let mut indices = Vec::with_capacity(updates.len());
        for &(identifier, value) in updates {
            let index = self.index_of(identifier)?;
            if !value.is_finite() {
                return Err(StateError::NotANumber {
                    identifier: identifier.to_string(),
                    value,
                });
            }
            indices.push(index);
        }

        let before = self.ticks.clone();
        for (&index, &(_, value)) in indices.iter().zip(updates) {
            self.apply(index, self.to_tick(value));
        }

        Ok(self.diff(&before))
    }

    /// Move one identifier by whole pages in the tick domain.
    pub fn step_page(
        &mut self,
        identifier: &str,
        pages: i64,
    ) -> Result<IndexSet<String>, StateError> {
        let current = self.tick(identifier)?;
        let target = self.from_tick(current + pages * self.page_ticks);
        self.set_state(identifier, target)
    }

    /// Emit exactly one event for a batch of changes.
    ///
    /// A single changed identifier is delivered as the convenience
    /// `ValueChanged` shape, anything larger as `ValuesChanged`. An empty
    /// dirty set emits nothing. Send failures (no live receivers) are
    /// ignored.
    pub fn notify_listener(&self, dirty: &IndexSet<String>) {
        if dirty.is_empty() {
            return;
        }

        let event = if dirty.len() == 1 {
            let identifier = dirty[0].clone();
            let value = self
                .value(&identifier)
                .expect("dirty identifiers are known");
            StateEvent::ValueChanged {
                control: self.control.clone(),
                identifier,
                value,
            }
        } else {
            let values = dirty
                .iter()
                .map(|id| {
                    (
                        id.clone(),
                        self.value(id).expect("dirty identifiers are known"),
                    )
                })
                .collect();
            StateEvent::ValuesChanged {
                control: self.control.clone(),
                values,
            }
        };

        let _ = self.event_tx.send(event);
    }

    /// Policy-aware interactive edit.
    ///
    /// Under `EveryChange` the edit is applied, flushed, and its dirty set
    /// returned. Under `OnCommit` the edit only accumulates into the
    /// pending set and `None` is returned; [`commit`](Self::commit) flushes.
    pub fn edit(
        &mut self,
        identifier: &str,
        value: f64,
    ) -> Result<Option<IndexSet<String>>, StateError> {
        let dirty = self.set_state(identifier, value)?;
        Ok(self.route(dirty))
    }

    /// Policy-aware page step, the discretized counterpart of
    /// [`edit`](Self::edit).
    pub fn edit_page(
        &mut self,
        identifier: &str,
        pages: i64,
    ) -> Result<Option<IndexSet<String>>, StateError> {
        let dirty = self.step_page(identifier, pages)?;
        Ok(self.route(dirty))
    }

    fn route(&mut self, dirty: IndexSet<String>) -> Option<IndexSet<String>> {
        match self.policy {
            NotifyPolicy::EveryChange => {
                self.notify_listener(&dirty);
                Some(dirty)
            }
            NotifyPolicy::OnCommit => {
                self.pending.extend(dirty);
                None
            }
        }
    }

    /// Flush the accumulated pending set as one notification batch.
    ///
    /// Returns the flushed set, or `None` when nothing was pending. Under
    /// `EveryChange` there is never anything pending.
    pub fn commit(&mut self) -> Option<IndexSet<String>> {
        if self.pending.is_empty() {
            return None;
        }
        let dirty = std::mem::take(&mut self.pending);
        self.notify_listener(&dirty);
        Some(dirty)
    }

    fn index_of(&self, identifier: &str) -> Result<usize, StateError> {
        self.ids
            .iter()
            .position(|id| id == identifier)
            .ok_or_else(|| StateError::UnknownIdentifier {
                identifier: identifier.to_string(),
            })
    }

    /// The cascade, in ticks. `target` is clamped into the window where
    /// every neighbor can still reach a legal value, then neighbors are
    /// pushed outward.
    fn apply(&mut self, index: usize, target: i64) {
        let (own_min, own_max) = self.slot_ticks[index];

        // Feasible window: every slot above must fit `k` intervals higher
        // within its own max; every slot below must fit within its own min.
        let mut high = own_max;
        for (k, &(_, max)) in self.slot_ticks[index + 1..].iter().enumerate() {
            high = high.min(max - (k as i64 + 1) * self.interval_ticks);
        }
        let mut low = own_min;
        for (k, &(min, _)) in self.slot_ticks[..index].iter().rev().enumerate() {
            low = low.max(min + (k as i64 + 1) * self.interval_ticks);
        }

        // Construction-time feasibility guarantees low <= high.
        self.ticks[index] = target.clamp(low, high);

        for i in index + 1..self.ticks.len() {
            let floor = self.ticks[i - 1] + self.interval_ticks;
            if self.ticks[i] < floor {
                let (min, max) = self.slot_ticks[i];
                self.ticks[i] = floor.clamp(min, max);
            }
        }
        for i in (0..index).rev() {
            let ceiling = self.ticks[i + 1] - self.interval_ticks;
            if self.ticks[i] > ceiling {
                let (min, max) = self.slot_ticks[i];
                self.ticks[i] = ceiling.clamp(min, max);
            }
        }
    }

    fn diff(&self, before: &[i64]) -> IndexSet<String> {
        self.ids
            .iter()
            .zip(before.iter().zip(&self.ticks))
            .filter(|(_, (b, a))| b != a)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
