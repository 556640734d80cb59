//! Ordered, id-keyed registry shared by positions, kinds, resolvers and the lexicon

use std::collections::HashMap;
use std::hash::Hash;

/// Insertion-ordered map where the first registration of an id wins
#[derive(Clone, Debug)]
pub struct Registry<K, V> {
    items: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> Registry<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the id exists. Returns whether the value was stored.
    pub fn register(&mut self, id: K, value: V) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id.clone(), self.items.len());
        self.items.push((id, value));
        true
    }

    pub fn get_if_exists(&self, id: &K) -> Option<&V> {
        self.index.get(id).map(|&i| &self.items[i].1)
    }

    pub fn get_mut(&mut self, id: &K) -> Option<&mut V> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.items[i].1),
            None => None,
        }
    }

    pub fn contains(&self, id: &K) -> bool {
        self.index.contains_key(id)
    }

    /// Values in registration order
    pub fn list(&self) -> impl Iterator<Item = &V> {
        self.items.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.items.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration_wins() {
        let mut registry = Registry::new();
        assert!(registry.register("a", 1));
        assert!(!registry.register("a", 2));
        assert_eq!(registry.get_if_exists(&"a"), Some(&1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_keeps_order() {
        let mut registry = Registry::new();
        registry.register("b", 2);
        registry.register("a", 1);
        registry.register("c", 3);
        let values: Vec<_> = registry.list().copied().collect();
        assert_eq!(values, vec![2, 1, 3]);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut registry: Registry<String, Vec<u8>> = Registry::new();
        registry.register("x".to_string(), vec![]);
        registry.get_mut(&"x".to_string()).unwrap().push(7);
        assert_eq!(registry.get_if_exists(&"x".to_string()), Some(&vec![7]));
        assert!(registry.get_mut(&"y".to_string()).is_none());
    }
}
