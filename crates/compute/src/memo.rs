/// Whether a [`Memo`] lookup reused the cached value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemoStatus {
    Hit,
    Computed,
}

/// Single-slot cache keyed by the full set of inputs of a derived value.
///
/// The value is recomputed exactly when the key changes; an equal key always
/// returns the previous value.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    hits: u64,
    computes: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            hits: 0,
            computes: 0,
        }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&mut self, key: K, compute: F) -> (&V, MemoStatus)
    where
        F: FnOnce() -> V,
    {
        let status = match &self.slot {
            Some((k, _)) if *k == key => {
                self.hits += 1;
                MemoStatus::Hit
            }
            _ => {
                self.slot = None;
                self.computes += 1;
                MemoStatus::Computed
            }
        };
        let (_, value) = self.slot.get_or_insert_with(|| (key, compute()));
        (&*value, status)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn computes(&self) -> u64 {
        self.computes
    }
}
