use crate::models::value::ConfigValue;

/// Type tag a configuration parameter must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    Text,
    /// An ordered list of values.
    List,
    /// An ordered list where every element must be a mapping.
    MapList,
}

impl ParamKind {
    /// Name used in `WrongType` error messages.
    pub fn expected(self) -> &'static str {
        match self {
            ParamKind::Bool => "boolean",
            ParamKind::Int => "integer",
            ParamKind::Float => "float",
            ParamKind::Text => "text",
            ParamKind::List => "list",
            ParamKind::MapList => "list of mappings",
        }
    }
}

/// Validation rule for a single configuration parameter.
///
/// A rule is declared once per parameter by the control family that consumes
/// it. A parameter without a default is required; one with a default is
/// optional and the default is substituted when the parameter is absent.
///
/// `min`/`max` bound numeric parameters. `min_interval`, `precision`, and
/// `page_increment` are carried here for rules that feed a
/// [`BoundSet`](crate::validate::BoundSet); scalar validation ignores them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRule {
    pub kind: ParamKind,
    pub default: Option<ConfigValue>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_interval: Option<f64>,
    pub precision: Option<u32>,
    pub page_increment: Option<f64>,
}

impl ParamRule {
    /// A required parameter: absence is a validation error.
    pub fn required(kind: ParamKind) -> Self {
        Self {
            kind,
            default: None,
            min: None,
            max: None,
            min_interval: None,
            precision: None,
            page_increment: None,
        }
    }

    /// An optional parameter with a default substituted when absent.
    pub fn optional(kind: ParamKind, default: impl Into<ConfigValue>) -> Self {
        Self {
            default: Some(default.into()),
            ..Self::required(kind)
        }
    }

    /// Restrict the accepted numeric range to `min..=max`.
    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}
