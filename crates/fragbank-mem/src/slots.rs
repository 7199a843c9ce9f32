//! Dense, reusable slot ids.
//!
//! Records are kept in a vector indexed by `id - 1`; released ids go on a
//! LIFO stack and are handed out again before a new id is minted. Ids start
//! at 1, so slot 0 (and therefore handle 0) is never live.

use fragbank_core::SlotId;

pub struct SlotTable<T> {
    records: Vec<Option<T>>,
    released: Vec<SlotId>,
    live: usize,
}

impl<T> SlotTable<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            released: Vec::new(),
            live: 0,
        }
    }

    /// Store `record` under a recycled id if one is available, else a new one.
    ///
    /// The id leaves the released stack before the record becomes visible.
    pub fn insert(&mut self, record: T) -> SlotId {
        self.live += 1;
        match self.released.pop() {
            Some(id) => {
                self.records[Self::index(id)] = Some(record);
                id
            }
            None => {
                self.records.push(Some(record));
                SlotId::new(self.records.len() as u64)
            }
        }
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.records.get(Self::index(id))?.as_ref()
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.records.get_mut(Self::index(id))?.as_mut()
    }

    /// Take the record out and release its id. `None` for ids that are not live,
    /// which leaves the released stack untouched.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let record = self.records.get_mut(Self::index(id))?.take()?;
        self.released.push(id);
        self.live -= 1;
        Some(record)
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn released(&self) -> usize {
        self.released.len()
    }

    fn index(id: SlotId) -> usize {
        // Id 0 wraps to usize::MAX, which is never a valid index.
        (id.get() as usize).wrapping_sub(1)
    }
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let mut t = SlotTable::new();
        assert_eq!(t.insert("a"), SlotId::new(1));
        assert_eq!(t.insert("b"), SlotId::new(2));
        assert!(t.get(SlotId::new(0)).is_none());
    }

    #[test]
    fn test_released_id_is_reused() {
        let mut t = SlotTable::new();
        let a = t.insert(1u32);
        let _b = t.insert(2u32);
        assert_eq!(t.remove(a), Some(1));
        assert_eq!(t.released(), 1);
        let c = t.insert(3u32);
        assert_eq!(c, a);
        assert_eq!(t.get(c), Some(&3));
        assert_eq!(t.released(), 0);
        assert_eq!(t.live(), 2);
    }

    #[test]
    fn test_double_remove_is_rejected() {
        let mut t = SlotTable::new();
        let a = t.insert(());
        assert!(t.remove(a).is_some());
        assert!(t.remove(a).is_none());
        assert_eq!(t.released(), 1);

        // The stack holds `a` once, so two inserts produce two distinct ids.
        let x = t.insert(());
        let y = t.insert(());
        assert_ne!(x, y);
    }

    #[test]
    fn test_unknown_ids() {
        let mut t: SlotTable<u8> = SlotTable::new();
        assert!(t.get(SlotId::new(5)).is_none());
        assert!(t.get_mut(SlotId::new(0)).is_none());
        assert!(t.remove(SlotId::new(u64::MAX)).is_none());
        assert_eq!(t.live(), 0);
    }
}
