pub mod bitset;
pub mod idvec;
