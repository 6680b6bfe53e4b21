//! In-memory document store

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{check_name, DocumentStore, StoreResult};

#[derive(Debug)]
pub struct MemoryStore<D> {
    docs: RwLock<BTreeMap<String, D>>,
}

impl<D> MemoryStore<D> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl<D> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Clone + Send + Sync> DocumentStore<D> for MemoryStore<D> {
    fn load_all(&self) -> StoreResult<BTreeMap<String, D>> {
        Ok(self.docs.read().clone())
    }

    fn save(&self, name: &str, doc: D) -> StoreResult<()> {
        let name = check_name(name)?;
        self.docs.write().insert(name.to_string(), doc);
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        Ok(self.docs.write().remove(name.trim()).is_some())
    }

    fn load(&self, name: &str) -> StoreResult<Option<D>> {
        Ok(self.docs.read().get(name.trim()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_delete() {
        let store = MemoryStore::<u32>::new();
        store.save("b", 2).unwrap();
        store.save(" a ", 1).unwrap();
        assert_eq!(store.names().unwrap(), vec!["a", "b"]);
        assert_eq!(store.load("a").unwrap(), Some(1));
        assert_eq!(store.load(" a ").unwrap(), Some(1));

        store.save("a", 10).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(10));

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.save("", 0).is_err());
    }
}
