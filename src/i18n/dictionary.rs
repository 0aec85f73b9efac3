//! Translation dictionaries: flat key → string maps, one per language.

use std::collections::HashMap;
use std::sync::Arc;

/// An immutable, cheaply cloneable dictionary.
///
/// Clones share storage, so every holder of a dictionary handed out with a
/// `languageChanged` signal sees the very same map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationDictionary {
    entries: Arc<HashMap<String, String>>,
}

impl TranslationDictionary {
    /// Parse a `lang/{code}.json` body. Anything but a flat object of strings
    /// is rejected.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let entries: HashMap<String, String> = serde_json::from_str(body)?;
        Ok(Self {
            entries: Arc::new(entries),
        })
    }

    /// Translation for `key`. Empty strings count as missing, so an
    /// untranslated key never blanks out the markup's own text.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both handles share the same underlying map.
    pub fn ptr_eq(&self, other: &TranslationDictionary) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_flat_object() {
        let dict = TranslationDictionary::from_json(r#"{"greeting": "Hallo", "nav_home": "Start"}"#).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.lookup("greeting"), Some("Hallo"));
        assert_eq!(dict.lookup("missing"), None);
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        assert!(TranslationDictionary::from_json(r#"{"nav": {"home": "Start"}}"#).is_err());
        assert!(TranslationDictionary::from_json(r#"["Hallo"]"#).is_err());
        assert!(TranslationDictionary::from_json("not json").is_err());
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let dict: TranslationDictionary = [("footer_note", "")].into_iter().collect();
        assert_eq!(dict.lookup("footer_note"), None);
    }

    #[test]
    fn test_clones_share_storage() {
        let dict: TranslationDictionary = [("greeting", "Hello")].into_iter().collect();
        let clone = dict.clone();
        assert!(dict.ptr_eq(&clone));

        let other: TranslationDictionary = [("greeting", "Hello")].into_iter().collect();
        assert_eq!(dict, other);
        assert!(!dict.ptr_eq(&other));
    }
}
