use crate::Hash;
use sha2::Digest;

pub trait Hasher: Default {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;

    fn finalize(self) -> Hash;

    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Plain single-round SHA-256
#[derive(Clone, Default)]
pub struct Sha256(sha2::Sha256);

impl Hasher for Sha256 {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data.as_ref());
        self
    }

    #[inline(always)]
    fn finalize(self) -> Hash {
        Hash::from_bytes(self.0.finalize().into())
    }
}
