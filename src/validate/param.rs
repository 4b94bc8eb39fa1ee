//! Single-parameter validation: presence, type coercion, numeric bounds.

use crate::models::{ConfigValue, ParamKind, ParamRule, RawConfig};
use crate::validate::ValidateError;

/// Validate one configuration entry against its declared rule.
///
/// Pure function of its inputs. Resolution order:
/// 1. Absent parameter: substitute the rule's default, or fail with
///    `MissingRequired` when the rule declares none.
/// 2. Type check with bounded coercion: an integer literal satisfies a
///    `Float` rule (widened to `Float` in the returned value); no other
///    cross-type coercion is accepted.
/// 3. Numeric bounds: when the rule declares `min`/`max`, the coerced value
///    must satisfy `min <= value <= max`.
///
/// Structural kinds check shape only: `List` accepts any list, `MapList`
/// requires every element to be a mapping and reports `Malformed` otherwise.
pub fn validate_param(
    config: &RawConfig,
    name: &str,
    rule: &ParamRule,
) -> Result<ConfigValue, ValidateError> {
    let Some(raw) = config.get(name) else {
        let Some(default) = &rule.default else {
            return Err(ValidateError::MissingRequired {
                parameter: name.to_string(),
            });
        };
        // A declared default is subject to the same bounds as a configured
        // value; an out-of-bounds default is a construction error, not a
        // deferred runtime surprise.
        if let Some(value) = default.as_f64() {
            check_bounds(name, value, rule)?;
        }
        return Ok(default.clone());
    };

    let typed = coerce(name, raw, rule.kind)?;

    if let Some(value) = typed.as_f64() {
        check_bounds(name, value, rule)?;
    }

    Ok(typed)
}

/// Type-check `raw` against `kind`, applying the one accepted widening.
fn coerce(name: &str, raw: &ConfigValue, kind: ParamKind) -> Result<ConfigValue, ValidateError> {
    let wrong_type = || ValidateError::WrongType {
        parameter: name.to_string(),
        expected: kind.expected(),
        found: raw.clone(),
    };

    match kind {
        ParamKind::Bool => raw.as_bool().map(ConfigValue::Bool).ok_or_else(wrong_type),
        ParamKind::Int => raw.as_i64().map(ConfigValue::Int).ok_or_else(wrong_type),
        ParamKind::Float => raw.as_f64().map(ConfigValue::Float).ok_or_else(wrong_type),
        ParamKind::Text => raw
            .as_str()
            .map(|s| ConfigValue::Text(s.to_string()))
            .ok_or_else(wrong_type),
        ParamKind::List => raw
            .as_list()
            .map(|_| raw.clone())
            .ok_or_else(wrong_type),
        ParamKind::MapList => {
            let items = raw.as_list().ok_or_else(wrong_type)?;
            for (index, item) in items.iter().enumerate() {
                if item.as_map().is_none() {
                    return Err(ValidateError::Malformed {
                        parameter: name.to_string(),
                        reason: format!(
                            "entry {} must be a mapping, found {}",
                            index,
                            item.type_name()
                        ),
                    });
                }
            }
            Ok(raw.clone())
        }
    }
}

fn check_bounds(name: &str, value: f64, rule: &ParamRule) -> Result<(), ValidateError> {
    let min = rule.min.unwrap_or(f64::NEG_INFINITY);
    let max = rule.max.unwrap_or(f64::INFINITY);
    if value < min || value > max {
        return Err(ValidateError::OutOfBounds {
            parameter: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}
