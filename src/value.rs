//! Dynamic value model shared by fulfillment values and rejection reasons.
//!
//! The engine treats both sides of a settlement as opaque data, so one
//! concrete type carries everything that can flow through a chain: scalars,
//! text, ordered sequences (the shape `all` fulfills with), and thenable
//! participants. Data arms compare structurally; the thenable arm compares
//! by identity, since a protocol participant has no meaningful structural
//! equality.

use std::fmt;
use std::sync::Arc;

use crate::thenable::Thenable;

/// A fulfillment value or rejection reason.
///
/// Cheap to clone: text and sequences are reference-counted, and the
/// thenable arm is a shared handle to the participant itself.
#[derive(Clone)]
pub enum Value {
    /// The absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// Immutable text.
    Text(Arc<str>),
    /// An ordered sequence of values.
    List(Arc<Vec<Value>>),
    /// A participant in the thenable protocol.
    ///
    /// Anything placed in this arm is subject to adoption when it reaches a
    /// settlement function: the deferred value settles with the thenable's
    /// eventual outcome instead of the handle itself.
    Thenable(Arc<dyn Thenable>),
}

impl Value {
    /// Builds a text value.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// Builds a sequence value.
    #[must_use]
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Arc::new(items))
    }

    /// Wraps a thenable protocol participant.
    pub fn thenable(participant: impl Thenable + 'static) -> Self {
        Self::Thenable(Arc::new(participant))
    }

    /// Returns the thenable handle if this value participates in the protocol.
    #[must_use]
    pub fn as_thenable(&self) -> Option<Arc<dyn Thenable>> {
        match self {
            Self::Thenable(participant) => Some(Arc::clone(participant)),
            _ => None,
        }
    }

    /// Returns true if this value participates in the thenable protocol.
    #[must_use]
    pub fn is_thenable(&self) -> bool {
        matches!(self, Self::Thenable(_))
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the sequence payload, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Bit equality keeps NaN-carrying reasons comparable.
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Thenable(a), Self::Thenable(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Thenable(_) => f.write_str("Thenable(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Thenable(_) => f.write_str("<thenable>"),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::list(items)
    }
}

impl From<Arc<dyn Thenable>> for Value {
    fn from(participant: Arc<dyn Thenable>) -> Self {
        Self::Thenable(participant)
    }
}
