//! Utilities for the preimage server backend.

use crate::kv::{KeyValueStore, KvResult};
use alloy_primitives::{keccak256, B256};
use alloy_rlp::{BufMut, Encodable, EMPTY_STRING_CODE};
use alloy_trie::{proof::ProofRetainer, HashBuilder, Nibbles, EMPTY_ROOT_HASH};
use stele_preimage::PreimageKey;
use tokio::sync::RwLock;

/// Constructs a merkle patricia trie from the ordered list passed and stores
/// every encoded node of the trie in the [KeyValueStore], keyed by its
/// keccak256 digest. Returns the trie root so callers can check it against a
/// fetched header.
pub(crate) async fn store_ordered_trie<KV: KeyValueStore + ?Sized, T: AsRef<[u8]>>(
    kv: &RwLock<KV>,
    values: &[T],
) -> KvResult<B256> {
    let mut kv_write_lock = kv.write().await;

    // If the list of values is empty, store the empty root hash preimage and
    // exit early; the `HashBuilder` retains no nodes for an empty trie.
    if values.is_empty() {
        let empty_key = PreimageKey::new_keccak256(*EMPTY_ROOT_HASH);
        kv_write_lock.set(empty_key.into(), vec![EMPTY_STRING_CODE])?;
        return Ok(EMPTY_ROOT_HASH);
    }

    let mut hb = ordered_trie_with_encoder(values, |value, buf| buf.put_slice(value.as_ref()));
    let root = hb.root();
    let intermediates = hb.take_proof_nodes().into_inner();

    for (_, value) in intermediates.into_iter() {
        let value_hash = keccak256(value.as_ref());
        let key = PreimageKey::new_keccak256(*value_hash);

        kv_write_lock.set(key.into(), value.into())?;
    }

    Ok(root)
}

/// Computes a trie root of the collection of items with a custom encoder,
/// retaining the preimages of every node on every path.
fn ordered_trie_with_encoder<T, F>(items: &[T], mut encode: F) -> HashBuilder
where
    F: FnMut(&T, &mut dyn BufMut),
{
    let mut index_buffer = Vec::new();
    let mut value_buffer = Vec::new();
    let items_len = items.len();

    let path_nibbles = (0..items_len)
        .map(|i| {
            let i = adjust_index_for_rlp(i, items_len);
            index_buffer.clear();
            i.encode(&mut index_buffer);
            Nibbles::unpack(&index_buffer)
        })
        .collect::<Vec<_>>();

    let mut hb = HashBuilder::default().with_proof_retainer(ProofRetainer::new(path_nibbles));
    for i in 0..items_len {
        let index = adjust_index_for_rlp(i, items_len);

        index_buffer.clear();
        index.encode(&mut index_buffer);

        value_buffer.clear();
        encode(&items[index], &mut value_buffer);

        hb.add_leaf(Nibbles::unpack(&index_buffer), &value_buffer);
    }

    hb
}

/// Adjust the index of an item for rlp encoding.
const fn adjust_index_for_rlp(i: usize, len: usize) -> usize {
    if i > 0x7f {
        i
    } else if i == 0x7f || i + 1 == len {
        0
    } else {
        i + 1
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use alloy_consensus::proofs::ordered_trie_root_with_encoder;

    #[tokio::test]
    async fn test_empty_list_stores_empty_root_preimage() {
        let kv = RwLock::new(MemoryKeyValueStore::new());
        let root = store_ordered_trie(&kv, &[] as &[&[u8]]).await.unwrap();

        assert_eq!(root, EMPTY_ROOT_HASH);
        let kv = kv.into_inner();
        let value = kv.get(PreimageKey::new_keccak256(*EMPTY_ROOT_HASH).into()).unwrap();
        assert_eq!(value, vec![EMPTY_STRING_CODE]);
    }

    #[tokio::test]
    async fn test_root_matches_reference_computation() {
        let values =
            (0u8..8).map(|i| vec![i; 96]).collect::<Vec<_>>();

        let kv = RwLock::new(MemoryKeyValueStore::new());
        let root = store_ordered_trie(&kv, values.as_slice()).await.unwrap();

        let expected =
            ordered_trie_root_with_encoder(values.as_slice(), |value, buf| {
                buf.put_slice(value.as_slice())
            });
        assert_eq!(root, expected);
    }

    #[tokio::test]
    async fn test_every_stored_node_is_content_addressed() {
        let values = (0u8..4).map(|i| vec![i; 128]).collect::<Vec<_>>();

        let kv = RwLock::new(MemoryKeyValueStore::new());
        let root = store_ordered_trie(&kv, values.as_slice()).await.unwrap();

        // The root node itself must be stored and resolvable by its digest.
        let kv = kv.into_inner();
        let root_node = kv.get(PreimageKey::new_keccak256(*root).into()).unwrap();
        assert_eq!(keccak256(&root_node), root);
    }
}
