use serde::{Deserialize, Serialize};

/// A threshold or tunable, keyed by a stable string so that
/// `ThresholdOverride` rows can reference it without a schema change per
/// new knob (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThresholdKey(pub String);

impl ThresholdKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl std::fmt::Display for ThresholdKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThresholdValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    String(String),
    StringSet(Vec<String>),
}

impl ThresholdValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ThresholdValue::Float(v) => Some(*v),
            ThresholdValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str_set(&self) -> Option<&[String]> {
        match self {
            ThresholdValue::StringSet(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverride {
    pub maintenance_id: String,
    pub key: ThresholdKey,
    pub value: ThresholdValue,
}
