use std::collections::HashMap;

/// Comparison key for display text: trimmed and lower-cased.
pub fn fold_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Case and whitespace insensitive set that remembers the first spelling
/// seen for each key.
#[derive(Debug, Clone, Default)]
pub struct FoldedSet {
    map: HashMap<String, String>,
}

impl FoldedSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Adds a value; returns false when an equivalent value was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = fold_key(name);
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert(key, name.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&fold_key(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&fold_key(name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_spelling() {
        let mut set = FoldedSet::default();
        assert!(set.insert("Clear"));
        assert!(!set.insert("  clear "));
        assert_eq!(set.get("CLEAR"), Some("Clear"));
        assert_eq!(set.len(), 1);
    }
}
