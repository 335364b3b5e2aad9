use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// Define a dense index newtype usable as an [`IdVec`] key
#[macro_export]
macro_rules! id_type {
    ($vis:vis $name:ident) => {
        #[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
        $vis struct $name($crate::idvec::ID);

        impl $crate::idvec::AsID for $name {
            fn id(&self) -> $crate::idvec::ID {
                self.0
            }

            fn to_id(id: $crate::idvec::ID) -> Self {
                $name(id)
            }
        }

        impl $name {
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl From<$crate::idvec::ID> for $name {
            fn from(id: $crate::idvec::ID) -> $name {
                $name(id)
            }
        }
    };
}

pub trait AsID {
    fn id(&self) -> ID;
    fn to_id(id: ID) -> Self;
}

pub type ID = u32;

/// Vector whose values are addressed by dense typed ids.
/// Ids are handed out in insertion order and never reused.
#[derive(Debug, Clone)]
pub struct IdVec<K: AsID, V> {
    items: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K: AsID, V> IdVec<K, V> {
    pub fn new() -> IdVec<K, V> {
        IdVec {
            items: Vec::new(),
            _phantom: PhantomData,
        }
    }

    pub fn push(&mut self, value: V) -> K {
        let id = self.items.len() as ID;
        self.items.push(value);
        K::to_id(id)
    }

    /// Id the next pushed value will receive
    pub fn next_id(&self) -> K {
        K::to_id(self.items.len() as ID)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(key.id() as usize)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key.id() as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            iter: self.items.iter().enumerate(),
            _phantom: PhantomData,
        }
    }

    pub fn values(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }
}

impl<K: AsID, V: Clone> IdVec<K, V> {
    /// Create a vector with `n` copies of `value`, usually a side table for
    /// another `IdVec` with `n` entries
    pub fn filled(n: usize, value: V) -> IdVec<K, V> {
        IdVec {
            items: vec![value; n],
            _phantom: PhantomData,
        }
    }

    pub fn resize(&mut self, n: usize, value: V) {
        self.items.resize(n, value);
    }
}

impl<K: AsID, V> Index<K> for IdVec<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        &self.items[index.id() as usize]
    }
}

impl<K: AsID, V> IndexMut<K> for IdVec<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.items[index.id() as usize]
    }
}

impl<K: AsID, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, K: AsID, V> {
    iter: std::iter::Enumerate<std::slice::Iter<'a, V>>,
    _phantom: PhantomData<K>,
}

impl<'a, K: AsID, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, val) = self.iter.next()?;
        Some((K::to_id(id as ID), val))
    }
}
