//! Bounded scalar / multi-value validator.
//!
//! A [`BoundSet`] describes one or more ordered numeric slots sharing a
//! minimum interval, a page increment, and a decimal precision. For a single
//! slot it degenerates to plain min/max checking; for several slots it also
//! proves at construction time that the configured ranges can be satisfied
//! simultaneously, so the runtime cascade never meets an unsolvable chain.

use crate::models::{ConfigValue, ParamKind, ParamRule, RawConfig};
use crate::validate::{param::validate_param, ValidateError};

/// Highest accepted decimal precision (inclusive).
pub const MAX_PRECISION: u32 = 10;

/// Inclusive bounds of one numeric slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBounds {
    pub min: f64,
    pub max: f64,
}

impl SlotBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Validated bounds for an ordered set of numeric slots.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSet {
    slots: Vec<SlotBounds>,
    min_interval: f64,
    page_increment: f64,
    precision: u32,
}

impl BoundSet {
    /// Build a bound set, verifying precision range, per-slot sanity, and
    /// cross-slot feasibility.
    ///
    /// Feasibility is a forward pass: walking the slots in ascending order,
    /// the lowest value each slot can take (its own minimum, pushed up by
    /// the previous slot plus the interval) must not exceed its maximum.
    /// Configurations that fail this are rejected here with
    /// `IncompatibleBounds` instead of surfacing as an unsolvable cascade
    /// at runtime.
    pub fn new(
        slots: Vec<SlotBounds>,
        min_interval: f64,
        page_increment: f64,
        precision: u32,
    ) -> Result<Self, ValidateError> {
        if precision > MAX_PRECISION {
            return Err(ValidateError::OutOfBounds {
                parameter: "precision".to_string(),
                value: f64::from(precision),
                min: 0.0,
                max: f64::from(MAX_PRECISION),
            });
        }
        if slots.is_empty() {
            return Err(ValidateError::Malformed {
                parameter: "minValue".to_string(),
                reason: "a bound set needs at least one slot".to_string(),
            });
        }
        if min_interval < 0.0 {
            return Err(ValidateError::OutOfBounds {
                parameter: "minInterval".to_string(),
                value: min_interval,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if page_increment <= 0.0 {
            return Err(ValidateError::OutOfBounds {
                parameter: "pageIncrement".to_string(),
                value: page_increment,
                min: f64::MIN_POSITIVE,
                max: f64::INFINITY,
            });
        }

        for (index, slot) in slots.iter().enumerate() {
            if slot.min > slot.max {
                return Err(ValidateError::IncompatibleBounds {
                    parameter: "minValue".to_string(),
                    reason: format!(
                        "slot {} has min {} above max {}",
                        index, slot.min, slot.max
                    ),
                });
            }
        }

        // Forward feasibility pass.
        let mut lowest = f64::NEG_INFINITY;
        for (index, slot) in slots.iter().enumerate() {
            lowest = lowest.max(slot.min);
            if lowest > slot.max {
                return Err(ValidateError::IncompatibleBounds {
                    parameter: "minInterval".to_string(),
                    reason: format!(
                        "slot {} cannot reach a legal value: needs at least {} but its max is {}",
                        index, lowest, slot.max
                    ),
                });
            }
            lowest += min_interval;
        }

        // Repeat the pass in the tick domain the synchronizer will run in.
        // Rounding bounds and interval to the declared precision can tighten
        // a chain that was satisfiable in the real domain (an interval of
        // 0.25 at precision 1 becomes 3 ticks), and the cascade relies on
        // construction having proven the chain it actually computes with.
        let scale = 10f64.powi(precision as i32);
        let tick = |v: f64| (v * scale).round() as i64;
        let interval_ticks = tick(min_interval);
        let mut lowest_ticks = tick(slots[0].min);
        for (index, slot) in slots.iter().enumerate() {
            lowest_ticks = lowest_ticks.max(tick(slot.min));
            if lowest_ticks > tick(slot.max) {
                return Err(ValidateError::IncompatibleBounds {
                    parameter: "minInterval".to_string(),
                    reason: format!(
                        "slot {} cannot reach a legal value at precision {}",
                        index, precision
                    ),
                });
            }
            lowest_ticks += interval_ticks;
        }

        Ok(Self {
            slots,
            min_interval,
            page_increment,
            precision,
        })
    }

    /// Build from a raw configuration for `slot_count` slots.
    ///
    /// `minValue`/`maxValue` accept either a single number applied to every
    /// slot or a per-slot list; absent values fall back to the
    /// caller-supplied absolute `floor`/`ceiling`. `minInterval` defaults to
    /// zero, `pageIncrement` (with `incrementDelta` as accepted alias) to
    /// one, `precision` to zero.
    pub fn from_config(
        config: &RawConfig,
        slot_count: usize,
        floor: f64,
        ceiling: f64,
    ) -> Result<Self, ValidateError> {
        let mins = per_slot_values(config, "minValue", slot_count, floor)?;
        let maxes = per_slot_values(config, "maxValue", slot_count, ceiling)?;

        let min_interval = validate_param(
            config,
            "minInterval",
            &ParamRule::optional(ParamKind::Float, 0.0).with_min(0.0),
        )?
        .as_f64()
        .unwrap_or(0.0);

        let page_increment = page_increment_param(config)?;

        let precision = validate_param(
            config,
            "precision",
            &ParamRule::optional(ParamKind::Int, 0i64).bounded(0.0, f64::from(MAX_PRECISION)),
        )?
        .as_i64()
        .unwrap_or(0) as u32;

        let slots = mins
            .into_iter()
            .zip(maxes)
            .map(|(min, max)| SlotBounds::new(min, max))
            .collect();

        Self::new(slots, min_interval, page_increment, precision)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&SlotBounds> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[SlotBounds] {
        &self.slots
    }

    pub fn min_interval(&self) -> f64 {
        self.min_interval
    }

    pub fn page_increment(&self) -> f64 {
        self.page_increment
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// `10^precision`: the factor between the real and tick domains.
    pub fn tick_scale(&self) -> f64 {
        10f64.powi(self.precision as i32)
    }

    /// Lowest simultaneously-legal assignment: each slot at its minimum,
    /// pushed up by its predecessor plus the interval. Construction
    /// guarantees this fits every slot's bounds.
    pub fn lowest_legal_values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.slots.len());
        let mut lowest = f64::NEG_INFINITY;
        for slot in &self.slots {
            lowest = lowest.max(slot.min);
            values.push(lowest);
            lowest += self.min_interval;
        }
        values
    }
}

/// Read a scalar-or-list numeric parameter into one value per slot.
fn per_slot_values(
    config: &RawConfig,
    name: &str,
    slot_count: usize,
    fallback: f64,
) -> Result<Vec<f64>, ValidateError> {
    let Some(raw) = config.get(name) else {
        return Ok(vec![fallback; slot_count]);
    };

    if let Some(value) = raw.as_f64() {
        return Ok(vec![value; slot_count]);
    }

    let Some(items) = raw.as_list() else {
        return Err(ValidateError::WrongType {
            parameter: name.to_string(),
            expected: "float or list of floats",
            found: raw.clone(),
        });
    };

    if items.len() != slot_count {
        return Err(ValidateError::Malformed {
            parameter: name.to_string(),
            reason: format!(
                "expected {} per-slot entries, found {}",
                slot_count,
                items.len()
            ),
        });
    }

    items
        .iter()
        .map(|item| {
            item.as_f64().ok_or_else(|| ValidateError::WrongType {
                parameter: name.to_string(),
                expected: "float",
                found: item.clone(),
            })
        })
        .collect()
}

/// `pageIncrement` with `incrementDelta` as accepted alias; `pageIncrement`
/// wins when both are present.
fn page_increment_param(config: &RawConfig) -> Result<f64, ValidateError> {
    let name = if config.contains_key("pageIncrement") {
        "pageIncrement"
    } else if config.contains_key("incrementDelta") {
        "incrementDelta"
    } else {
        return Ok(1.0);
    };

    let value = validate_param(config, name, &ParamRule::required(ParamKind::Float))?;
    Ok(value.as_f64().unwrap_or(1.0))
}
