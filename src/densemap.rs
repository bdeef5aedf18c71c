//! A map of dense integer key to value, used as the node arenas of the graph.

use std::marker::PhantomData;

/// A typed index into a DenseMap.
pub trait Index: Copy {
    fn index(&self) -> usize;
    fn from_index(index: usize) -> Self;
}

/// A map of a dense integer key to value, implemented as a vector.
/// Keys are only ever handed out by push(), so a key from one map is
/// meaningless in another even when the key types match.
pub struct DenseMap<K, V> {
    vec: Vec<V>,
    key_type: PhantomData<K>,
}

impl<K, V> Default for DenseMap<K, V> {
    fn default() -> Self {
        DenseMap {
            vec: Vec::new(),
            key_type: PhantomData,
        }
    }
}

impl<K: Index, V> std::ops::Index<K> for DenseMap<K, V> {
    type Output = V;

    fn index(&self, k: K) -> &Self::Output {
        &self.vec[k.index()]
    }
}

impl<K: Index, V> std::ops::IndexMut<K> for DenseMap<K, V> {
    fn index_mut(&mut self, k: K) -> &mut Self::Output {
        &mut self.vec[k.index()]
    }
}

impl<K: Index, V> DenseMap<K, V> {
    pub fn next_id(&self) -> K {
        K::from_index(self.vec.len())
    }

    pub fn push(&mut self, val: V) -> K {
        let id = self.next_id();
        self.vec.push(val);
        id
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn all_ids(&self) -> impl Iterator<Item = K> {
        (0..self.vec.len()).map(K::from_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.vec
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_index(i), v))
    }
}
