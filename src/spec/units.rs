//! Time-delta unit registry.
//!
//! The registry maps unit identifiers to their length in seconds. It is an
//! explicit, explicitly-constructed object: whichever component needs units
//! builds one (usually [`UnitRegistry::standard`]) at initialization and
//! passes it down. There is no process-wide table.

use crate::validate::ValidateError;
use indexmap::IndexMap;
use regex::Regex;

/// Identifier-to-seconds unit registry, plus a parser for textual deltas
/// such as `"1h 30m"` or `"90 minutes"`.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: IndexMap<String, f64>,
    segment: Regex,
}

impl UnitRegistry {
    /// An empty registry. Prefer [`standard`](Self::standard) unless the
    /// caller defines its own unit vocabulary from scratch.
    pub fn new() -> Self {
        Self {
            units: IndexMap::new(),
            // "<number><unit-word>" segments, case-insensitive.
            segment: Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*([a-z]+)")
                .expect("Invalid delta segment regex"),
        }
    }

    /// The standard time-delta vocabulary: seconds, minutes, hours, days,
    /// weeks, each with its usual short aliases.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (names, factor) in [
            (&["seconds", "second", "secs", "sec", "s"][..], 1.0),
            (&["minutes", "minute", "mins", "min", "m"][..], 60.0),
            (&["hours", "hour", "hrs", "hr", "h"][..], 3_600.0),
            (&["days", "day", "d"][..], 86_400.0),
            (&["weeks", "week", "w"][..], 604_800.0),
        ] {
            for name in names {
                registry
                    .register(name, factor)
                    .expect("standard units are well-formed");
            }
        }
        registry
    }

    /// Register a unit. Names are case-insensitive; re-registering an
    /// existing name or a non-positive factor is rejected.
    pub fn register(&mut self, name: &str, seconds: f64) -> Result<(), ValidateError> {
        let key = name.to_lowercase();
        if key.is_empty() || seconds <= 0.0 || !seconds.is_finite() {
            return Err(ValidateError::Malformed {
                parameter: "units".to_string(),
                reason: format!("unit `{}` must have a positive finite length", name),
            });
        }
        if self.units.contains_key(&key) {
            return Err(ValidateError::Malformed {
                parameter: "units".to_string(),
                reason: format!("unit `{}` is already registered", name),
            });
        }
        self.units.insert(key, seconds);
        Ok(())
    }

    /// Length of one unit in seconds, if registered.
    pub fn factor(&self, name: &str) -> Option<f64> {
        self.units.get(&name.to_lowercase()).copied()
    }

    /// Registered unit names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Resolve a configured unit name, reporting `UnknownUnit` with the
    /// offending parameter on failure.
    pub fn resolve(&self, parameter: &str, name: &str) -> Result<f64, ValidateError> {
        self.factor(name).ok_or_else(|| ValidateError::UnknownUnit {
            parameter: parameter.to_string(),
            unit: name.to_string(),
        })
    }

    /// Parse a textual delta into seconds: one or more `<number><unit>`
    /// segments, summed. `"1h 30m"` is 5400, `"2 days"` is 172800.
    pub fn parse_delta(&self, parameter: &str, text: &str) -> Result<f64, ValidateError> {
        let mut total = 0.0;
        let mut segments = 0;
        let mut matched_chars = 0;

        for captures in self.segment.captures_iter(text) {
            let amount: f64 = captures[1]
                .parse()
                .map_err(|_| ValidateError::Malformed {
                    parameter: parameter.to_string(),
                    reason: format!("unreadable amount in delta `{}`", text),
                })?;
            total += amount * self.resolve(parameter, &captures[2])?;
            segments += 1;
            matched_chars += captures[0].chars().filter(|c| !c.is_whitespace()).count();
        }

        // Everything outside the matched segments must be separators;
        // otherwise the text was not a delta at all.
        let meaningful_chars = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .count();
        if segments == 0 || matched_chars != meaningful_chars {
            return Err(ValidateError::Malformed {
                parameter: parameter.to_string(),
                reason: format!("`{}` is not a time delta", text),
            });
        }

        Ok(total)
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
