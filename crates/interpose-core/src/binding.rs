//! Interceptor binding annotations.
//!
//! Bindings are the markers the assembly phase uses to associate interceptors
//! with methods and lifecycle events. The runtime never interprets them; it
//! only carries them so interceptors can inspect what they were bound through.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// A single binding annotation with optional attribute members.
///
/// # Example
///
/// ```
/// use interpose_core::InterceptorBinding;
///
/// let binding = InterceptorBinding::new("Transactional").with_attribute("mode", "required");
/// assert_eq!(binding.name(), "Transactional");
/// assert_eq!(binding.attribute("mode"), Some("required"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InterceptorBinding {
    name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

impl InterceptorBinding {
    /// Creates a binding without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute member.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the binding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns an attribute member by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns all attribute members in key order.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl fmt::Display for InterceptorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.attributes.is_empty() {
            let members: Vec<String> = self
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "({})", members.join(", "))?;
        }
        Ok(())
    }
}

/// Shared, de-duplicated set of bindings.
///
/// Cloning is cheap; the set is built once at assembly time and shared by
/// every context created for the same method or lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptorBindings(Arc<BTreeSet<InterceptorBinding>>);

impl InterceptorBindings {
    /// Returns an empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if a binding with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the first binding with the given name.
    pub fn get(&self, name: &str) -> Option<&InterceptorBinding> {
        self.0.iter().find(|b| b.name == name)
    }

    /// Iterates the bindings in order.
    pub fn iter(&self) -> impl Iterator<Item = &InterceptorBinding> {
        self.0.iter()
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the union of both sets.
    ///
    /// Used to combine class-level and method-level bindings.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        self.iter().chain(other.iter()).cloned().collect()
    }
}

impl Serialize for InterceptorBindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl FromIterator<InterceptorBinding> for InterceptorBindings {
    fn from_iter<I: IntoIterator<Item = InterceptorBinding>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl<const N: usize> From<[InterceptorBinding; N]> for InterceptorBindings {
    fn from(bindings: [InterceptorBinding; N]) -> Self {
        bindings.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_deduplicate() {
        let bindings: InterceptorBindings = [
            InterceptorBinding::new("Logged"),
            InterceptorBinding::new("Logged"),
            InterceptorBinding::new("Secured").with_attribute("role", "admin"),
        ]
        .into();

        assert_eq!(bindings.len(), 2);
        assert!(bindings.contains("Logged"));
        assert_eq!(
            bindings.get("Secured").and_then(|b| b.attribute("role")),
            Some("admin")
        );
        assert!(!bindings.contains("Cached"));
    }

    #[test]
    fn test_merged() {
        let class_level: InterceptorBindings = [InterceptorBinding::new("Logged")].into();
        let method_level: InterceptorBindings = [InterceptorBinding::new("Timed")].into();

        let merged = class_level.merged(&method_level);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains("Logged"));
        assert!(merged.contains("Timed"));

        assert_eq!(class_level.merged(&InterceptorBindings::empty()), class_level);
    }

    #[test]
    fn test_display() {
        let plain = InterceptorBinding::new("Logged");
        assert_eq!(plain.to_string(), "@Logged");

        let with_members = InterceptorBinding::new("Retry")
            .with_attribute("max", "3")
            .with_attribute("delay", "10ms");
        assert_eq!(with_members.to_string(), "@Retry(delay=10ms, max=3)");
    }

    #[test]
    fn test_serialize() {
        let bindings: InterceptorBindings = [
            InterceptorBinding::new("Logged"),
            InterceptorBinding::new("Retry").with_attribute("max", "3"),
        ]
        .into();

        let json = serde_json::to_value(&bindings).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "Logged" },
                { "name": "Retry", "attributes": { "max": "3" } }
            ])
        );
    }
}
