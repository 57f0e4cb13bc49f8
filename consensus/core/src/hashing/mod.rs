use visor_addresses::Address;
use visor_hashes::{Hash, Hasher};

pub mod header;
pub mod tx;

pub(crate) trait HasherExtensions {
    /// Writes the len as u64 little endian bytes
    fn write_len(&mut self, len: usize) -> &mut Self;

    fn write_u64(&mut self, value: u64) -> &mut Self;

    /// Writes the address key followed by its version byte
    fn write_address(&mut self, address: &Address) -> &mut Self;

    /// Writes the array len followed by each hash
    fn write_hashes(&mut self, hashes: &[Hash]) -> &mut Self;
}

impl<T: Hasher> HasherExtensions for T {
    #[inline(always)]
    fn write_len(&mut self, len: usize) -> &mut Self {
        self.update((len as u64).to_le_bytes())
    }

    #[inline(always)]
    fn write_u64(&mut self, value: u64) -> &mut Self {
        self.update(value.to_le_bytes())
    }

    #[inline(always)]
    fn write_address(&mut self, address: &Address) -> &mut Self {
        self.update(address.to_storage_bytes())
    }

    fn write_hashes(&mut self, hashes: &[Hash]) -> &mut Self {
        self.write_len(hashes.len());
        for hash in hashes {
            self.update(hash);
        }
        self
    }
}
