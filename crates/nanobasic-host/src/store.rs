use indexmap::IndexMap;

/// Whole-value key-value storage provided by the host.
///
/// This is the only persistence the adapter assumes: a value is read or written
/// in one piece, there is no append and no partial read. In a browser this is
/// typically backed by `localStorage`.
pub trait KeyValueStore {
    /// Returns the full value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: Vec<u8>);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        (**self).set(key, value);
    }
}

/// In-memory `KeyValueStore`, keeping keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: IndexMap<String, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys in the order they were first stored.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Borrowing lookup, without the copy `get` makes.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_owned(), value);
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_keep_first_insertion_order() {
        let mut store = MemoryStore::from_iter([("B", "2"), ("A", "1")]);
        store.set("B", b"3".to_vec());
        store.set("C", Vec::new());
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["B", "A", "C"]);
        assert_eq!(store.get("B"), Some(b"3".to_vec()));
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut store = MemoryStore::from_iter([("A", "1"), ("B", "2"), ("C", "3")]);
        assert_eq!(store.remove("A"), Some(b"1".to_vec()));
        assert_eq!(store.remove("A"), None);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn borrowed_store_writes_through() {
        fn put<S: KeyValueStore>(mut store: S) -> Option<Vec<u8>> {
            store.set("K", b"v".to_vec());
            store.get("K")
        }

        let mut store = MemoryStore::new();
        assert_eq!(put(&mut store), Some(b"v".to_vec()));
        assert_eq!(store.value("K"), Some(b"v".as_slice()));
    }
}
