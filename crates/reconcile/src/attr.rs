//! Three-valued attribute wrapper

use serde::{Deserialize, Serialize};

/// A single attribute value as held by a resource model.
///
/// - `Known` carries a usable value
/// - `Null` means the attribute is explicitly absent
/// - `Unknown` means the remote system will decide the value later
///
/// Equality is strict: `Unknown` is never equal to anything, not even
/// another `Unknown`. Use [`Attr::is_identical`] when the structural
/// shape matters (persistence, tests).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attr<T> {
    /// Value is known
    Known(T),
    /// Value is explicitly absent
    #[default]
    Null,
    /// Value is not yet determined
    Unknown,
}

impl<T> Attr<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Borrow the value if known
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Consume into the value if known
    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Attr<&T> {
        match self {
            Self::Known(v) => Attr::Known(v),
            Self::Null => Attr::Null,
            Self::Unknown => Attr::Unknown,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Attr<U> {
        match self {
            Self::Known(v) => Attr::Known(f(v)),
            Self::Null => Attr::Null,
            Self::Unknown => Attr::Unknown,
        }
    }

    /// Short label of the state, used in diagnostics
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Known(_) => "known",
            Self::Null => "null",
            Self::Unknown => "unknown",
        }
    }
}

impl<T: Clone> Attr<T> {
    /// Replace an `Unknown` with a clone of `prior`; other states are kept.
    pub fn or_prior(&self, prior: &Attr<T>) -> Attr<T> {
        match self {
            Self::Unknown => prior.clone(),
            other => other.clone(),
        }
    }
}

impl<T: PartialEq> Attr<T> {
    /// Structural identity: same state and, if known, equal values.
    ///
    /// Unlike `==`, two `Unknown` attributes are identical.
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a == b,
            (Self::Null, Self::Null) | (Self::Unknown, Self::Unknown) => true,
            _ => false,
        }
    }
}

impl<T: PartialEq> PartialEq for Attr<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a == b,
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}
