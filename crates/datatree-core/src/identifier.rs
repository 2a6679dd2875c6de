//! Interned, validated string keys for node types and property names

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{DataTreeError, Result};

static POOL: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();

fn intern(text: &str) -> Arc<str> {
    let mut pool = POOL
        .get_or_init(|| Mutex::new(HashSet::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(existing) = pool.get(text) {
        return Arc::clone(existing);
    }
    let interned: Arc<str> = Arc::from(text);
    pool.insert(Arc::clone(&interned));
    interned
}

/// Check whether `text` can name a node type or property
///
/// Empty and whitespace-only strings are rejected.
pub fn is_valid_identifier(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Immutable, interned key used for tree types and property names
///
/// Equality and ordering are case-sensitive and lexicographic over the
/// underlying text. The null identifier (no text) sorts before every valid
/// identifier and represents "no type".
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Option<Arc<str>>);

impl Identifier {
    /// Create an identifier, failing fast on empty or whitespace-only input
    ///
    /// # Errors
    /// * `InvalidIdentifier` - If `text` is empty or whitespace-only
    pub fn new(text: &str) -> Result<Self> {
        if !is_valid_identifier(text) {
            return Err(DataTreeError::InvalidIdentifier {
                input: text.to_string(),
            });
        }
        Ok(Self(Some(intern(text))))
    }

    /// The distinguished "no type" identifier
    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Underlying text; empty for the null identifier
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }
}

/// Lenient conversion: invalid text maps to the null identifier
impl From<&str> for Identifier {
    fn from(text: &str) -> Self {
        Self::new(text).unwrap_or_default()
    }
}

impl From<String> for Identifier {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<&String> for Identifier {
    fn from(text: &String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<&Identifier> for Identifier {
    fn from(id: &Identifier) -> Self {
        id.clone()
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(text) => write!(f, "Identifier({:?})", text),
            None => f.write_str("Identifier(null)"),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Identifier::from(text))
    }
}
