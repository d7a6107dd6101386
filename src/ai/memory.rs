//! Per-entity scratch memory for AI actions and decisions
//!
//! Every controller owns one [`Memory`]. Actions and decision logic use it
//! to keep per-entity working state (timers, destinations, counters) out of
//! the shared state nodes.
//!
//! Values are stored as a tagged [`MemoryValue`]. Reads name the expected
//! Rust type through [`MemoryType`]; an absent key reads as the type's
//! default, a tag mismatch is a programming error reported by
//! [`Memory::try_get`] and logged by [`Memory::get`].
//!
//! ```ignore
//! memory.set("wanderingActionsCompleted", 2_i32);
//! let done: i32 = memory.get("wanderingActionsCompleted");
//! let timer: Option<f32> = memory.get("randomWaitTimer"); // None if absent
//! ```

use std::fmt;

use glam::Vec2;
use rustc_hash::FxHashMap;

/// A single stored value
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValue {
    /// Explicitly empty slot (a stored `None`)
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer counter
    Int(i64),
    /// Scalar timer or measurement
    Float(f32),
    /// 2D point
    Vec2(Vec2),
    /// Free text
    Text(String),
}

impl MemoryValue {
    /// Tag name used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Text(_) => "text",
        }
    }
}

/// Rust types that can live in a [`Memory`] slot.
pub trait MemoryType: Sized + Default {
    /// Tag name used in diagnostics
    const KIND: &'static str;

    /// Wrap the value for storage
    fn into_value(self) -> MemoryValue;

    /// Unwrap a stored value, `None` on a tag mismatch
    fn from_value(value: &MemoryValue) -> Option<Self>;
}

impl MemoryType for bool {
    const KIND: &'static str = "bool";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Bool(self)
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl MemoryType for i64 {
    const KIND: &'static str = "int";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Int(self)
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl MemoryType for i32 {
    const KIND: &'static str = "int";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Int(i64::from(self))
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl MemoryType for u32 {
    const KIND: &'static str = "int";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Int(i64::from(self))
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Int(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl MemoryType for f32 {
    const KIND: &'static str = "float";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Float(self)
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl MemoryType for Vec2 {
    const KIND: &'static str = "vec2";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Vec2(self)
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }
}

impl MemoryType for String {
    const KIND: &'static str = "text";

    fn into_value(self) -> MemoryValue {
        MemoryValue::Text(self)
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Nullable slots: `None` is stored as [`MemoryValue::Null`].
impl<T: MemoryType> MemoryType for Option<T> {
    const KIND: &'static str = T::KIND;

    fn into_value(self) -> MemoryValue {
        self.map_or(MemoryValue::Null, T::into_value)
    }

    fn from_value(value: &MemoryValue) -> Option<Self> {
        match value {
            MemoryValue::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Errors from typed memory reads
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryError {
    /// The slot holds a different type than the one requested
    TypeMismatch {
        /// Slot key
        key: String,
        /// Requested type
        expected: &'static str,
        /// Stored type
        found: &'static str,
    },
    /// The slot holds an integer that does not fit the requested width
    OutOfRange {
        /// Slot key
        key: String,
        /// Stored integer
        value: i64,
        /// Requested type
        expected: &'static str,
    },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => write!(f, "memory slot '{key}' holds {found}, read as {expected}"),
            Self::OutOfRange {
                key,
                value,
                expected,
            } => write!(f, "memory slot '{key}' holds {value}, out of range for {expected}"),
        }
    }
}

impl std::error::Error for MemoryError {}

/// String-keyed store of typed values, owned by one controller
#[derive(Debug, Clone, Default)]
pub struct Memory {
    slots: FxHashMap<String, MemoryValue>,
}

impl Memory {
    /// Create an empty memory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a value, creating the slot if needed
    pub fn set<T: MemoryType>(&mut self, key: &str, value: T) {
        let value = value.into_value();
        if let Some(slot) = self.slots.get_mut(key) {
            *slot = value;
        } else {
            self.slots.insert(key.to_owned(), value);
        }
    }

    /// Read a value, returning `T::default()` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::TypeMismatch`] if the slot holds another type,
    /// or [`MemoryError::OutOfRange`] if a stored integer does not fit `T`.
    pub fn try_get<T: MemoryType>(&self, key: &str) -> Result<T, MemoryError> {
        let Some(value) = self.slots.get(key) else {
            return Ok(T::default());
        };
        T::from_value(value).ok_or_else(|| match value {
            MemoryValue::Int(v) if T::KIND == value.kind() => MemoryError::OutOfRange {
                key: key.to_owned(),
                value: *v,
                expected: std::any::type_name::<T>(),
            },
            _ => MemoryError::TypeMismatch {
                key: key.to_owned(),
                expected: T::KIND,
                found: value.kind(),
            },
        })
    }

    /// Read a value, returning `T::default()` when the key is absent.
    ///
    /// A type mismatch is logged and also reads as the default.
    pub fn get<T: MemoryType>(&self, key: &str) -> T {
        self.try_get(key).unwrap_or_else(|err| {
            log::error!("{err}");
            T::default()
        })
    }

    /// Raw stored value
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&MemoryValue> {
        self.slots.get(key)
    }

    /// Remove a slot, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<MemoryValue> {
        self.slots.remove(key)
    }

    /// Whether a slot exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots exist
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
