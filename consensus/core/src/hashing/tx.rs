use super::HasherExtensions;
use crate::tx::{Transaction, TransactionId, TransactionOutput, UxBody, UxOutId};
use visor_addresses::STORAGE_KEY_SIZE;
use visor_hashes::{HASH_SIZE, Hash, Hasher, Sha256};

const OUTPUT_SIZE: usize = STORAGE_KEY_SIZE + 8 + 8;

/// Hash committing to the inputs and outputs only
pub fn inner_hash(tx: &Transaction) -> Hash {
    let mut hasher = Sha256::default();
    hasher.write_hashes(&tx.inputs);
    write_outputs(&mut hasher, &tx.outputs);
    hasher.finalize()
}

/// The transaction id, covering every field
pub fn id(tx: &Transaction) -> TransactionId {
    let mut hasher = Sha256::default();
    hasher.update(tx.length.to_le_bytes()).update([tx.tx_type]).update(tx.inner_hash).write_hashes(&tx.inputs);
    write_outputs(&mut hasher, &tx.outputs);
    hasher.finalize()
}

/// Size of the serialized transaction as written by [`id`]
pub fn encoded_len(tx: &Transaction) -> usize {
    4 + 1 + HASH_SIZE + 8 + tx.inputs.len() * HASH_SIZE + 8 + tx.outputs.len() * OUTPUT_SIZE
}

pub fn ux_body_hash(body: &UxBody) -> UxOutId {
    let mut hasher = Sha256::default();
    hasher.update(body.src_transaction).write_address(&body.address).write_u64(body.coins).write_u64(body.hours);
    hasher.finalize()
}

fn write_outputs(hasher: &mut Sha256, outputs: &[TransactionOutput]) {
    hasher.write_len(outputs.len());
    for output in outputs {
        hasher.write_address(&output.address).write_u64(output.coins).write_u64(output.hours);
    }
}
