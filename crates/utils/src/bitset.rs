use std::hash::{Hash, Hasher};

const WORD_BITS: usize = u64::BITS as usize;

/// Growable set of small integers, usually dense node indices.
///
/// Equality and hashing ignore trailing empty words so sets that grew to
/// different capacities still compare equal.
#[derive(Clone, Default)]
pub struct Bitset {
    inner: Vec<u64>,
}

impl Bitset {
    pub fn new() -> Bitset {
        Bitset { inner: Vec::new() }
    }

    /// Create a set that can hold values below `n` without reallocating
    pub fn with_capacity(n: usize) -> Bitset {
        Bitset {
            inner: vec![0; n.div_ceil(WORD_BITS)],
        }
    }

    pub fn insert(&mut self, n: usize) -> bool {
        let num = n / WORD_BITS;
        let pos = n % WORD_BITS;
        if num >= self.inner.len() {
            self.inner.resize(num + 1, 0);
        }

        let shifted = 1 << pos;
        let added = self.inner[num] & shifted == 0;
        self.inner[num] |= shifted;
        added
    }

    pub fn remove(&mut self, n: usize) -> bool {
        let num = n / WORD_BITS;
        let pos = n % WORD_BITS;
        let Some(word) = self.inner.get_mut(num) else {
            return false;
        };

        let shifted = 1 << pos;
        let removed = *word & shifted != 0;
        *word &= !shifted;
        removed
    }

    pub fn contains(&self, n: usize) -> bool {
        let num = n / WORD_BITS;
        let pos = n % WORD_BITS;
        self.inner
            .get(num)
            .map(|word| word & (1 << pos) != 0)
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.iter().all(|word| *word == 0)
    }

    pub fn len(&self) -> usize {
        self.inner.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Remove all elements, keeps the allocation
    pub fn clear(&mut self) {
        self.inner.iter_mut().for_each(|word| *word = 0);
    }

    pub fn union_with(&mut self, other: &Bitset) {
        if other.inner.len() > self.inner.len() {
            self.inner.resize(other.inner.len(), 0);
        }

        for (a, b) in self.inner.iter_mut().zip(other.inner.iter()) {
            *a |= *b;
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            word: 0,
            bits: self.inner.first().copied().unwrap_or(0),
        }
    }

    fn significant(&self) -> &[u64] {
        let end = self
            .inner
            .iter()
            .rposition(|word| *word != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.inner[..end]
    }
}

impl PartialEq for Bitset {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Bitset {}

impl Hash for Bitset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl FromIterator<usize> for Bitset {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut set = Bitset::new();
        for n in iter {
            set.insert(n);
        }
        set
    }
}

impl std::fmt::Debug for Bitset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[derive(Debug)]
pub struct Iter<'a> {
    set: &'a Bitset,
    word: usize,
    bits: u64,
}

impl<'a> Iterator for Iter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.bits != 0 {
                let pos = self.bits.trailing_zeros() as usize;
                self.bits &= self.bits - 1;
                return Some(self.word * WORD_BITS + pos);
            }

            self.word += 1;
            self.bits = *self.set.inner.get(self.word)?;
        }
    }
}
