//! Weighted keysets controlling an account.

use crate::{
    constants::{
        DEFAULT_MASTER_KEY_ASSETS_OP_WEIGHT, DEFAULT_MASTER_KEY_GUARDIAN_WEIGHT,
        DEFAULT_MASTER_KEY_OWNER_WEIGHT, MASTER_KEY_INDEX,
    },
    error::{AccountError, SigningError},
    signers::{MasterKeySigner, SignType},
};
use alloy::primitives::{Address, B256, Bytes, keccak256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key type byte of a secp256k1 key.
pub const SECP256K1_KEY_TYPE: u8 = 0;

/// Role weights a key contributes towards each permission threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWeight {
    /// Weight towards owner operations.
    pub owner_weight: u32,
    /// Weight towards asset operations.
    pub assets_op_weight: u32,
    /// Weight towards guardian operations.
    pub guardian_weight: u32,
}

impl RoleWeight {
    /// Creates a new role weight.
    pub const fn new(owner_weight: u32, assets_op_weight: u32, guardian_weight: u32) -> Self {
        Self { owner_weight, assets_op_weight, guardian_weight }
    }

    /// Weights given to a master key built without a keyset json.
    pub const fn master() -> Self {
        Self::new(
            DEFAULT_MASTER_KEY_OWNER_WEIGHT,
            DEFAULT_MASTER_KEY_ASSETS_OP_WEIGHT,
            DEFAULT_MASTER_KEY_GUARDIAN_WEIGHT,
        )
    }

    /// Packed encoding `uint32 owner ‖ uint32 assetsOp ‖ uint32 guardian`.
    pub fn serialize(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..4].copy_from_slice(&self.owner_weight.to_be_bytes());
        out[4..8].copy_from_slice(&self.assets_op_weight.to_be_bytes());
        out[8..].copy_from_slice(&self.guardian_weight.to_be_bytes());
        out
    }
}

/// A secp256k1 key, optionally backed by a signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secp256k1Key {
    /// The key's address.
    pub address: Address,
    /// The key's role weights.
    pub role_weight: RoleWeight,
    /// How the key signs digests.
    #[serde(default)]
    pub sign_type: SignType,
    /// The signer producing signatures for this key.
    #[serde(skip)]
    pub signer: Option<Arc<dyn MasterKeySigner>>,
}

/// A key of another type, carried by its serialized form.
///
/// Such keys contribute to the keyset hash but cannot sign from this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueKey {
    /// The key's role weights.
    pub role_weight: RoleWeight,
    /// Packed key encoding, including its key type byte.
    pub serialized: Bytes,
}

/// A key of a [`Keyset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Key {
    /// A secp256k1 key.
    Secp256k1(Secp256k1Key),
    /// A key held outside of this crate.
    Opaque(OpaqueKey),
}

impl Key {
    /// Creates a secp256k1 key signed by `signer`.
    pub fn secp256k1(
        address: Address,
        role_weight: RoleWeight,
        sign_type: SignType,
        signer: Arc<dyn MasterKeySigner>,
    ) -> Self {
        Self::Secp256k1(Secp256k1Key { address, role_weight, sign_type, signer: Some(signer) })
    }

    /// The key's role weights.
    pub fn role_weight(&self) -> RoleWeight {
        match self {
            Self::Secp256k1(key) => key.role_weight,
            Self::Opaque(key) => key.role_weight,
        }
    }

    /// Packed key encoding used for the keyset hash.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Self::Secp256k1(key) => {
                let mut out = Vec::with_capacity(33);
                out.push(SECP256K1_KEY_TYPE);
                out.extend_from_slice(key.address.as_slice());
                out.extend_from_slice(&key.role_weight.serialize());
                out
            }
            Self::Opaque(key) => key.serialized.to_vec(),
        }
    }

    /// Signs `digest`, returning `uint8(keyType) ‖ signature ‖ uint8(signType)`.
    async fn sign(&self, index: usize, digest: B256) -> Result<Vec<u8>, SigningError> {
        let Self::Secp256k1(Secp256k1Key { sign_type, signer: Some(signer), .. }) = self else {
            return Err(SigningError::NotASigner(index));
        };
        let signature = signer.sign_message(digest.as_slice()).await?;
        if signature.is_empty() {
            return Err(SigningError::MissingSignature);
        }

        let mut out = Vec::with_capacity(signature.len() + 2);
        out.push(SECP256K1_KEY_TYPE);
        out.extend_from_slice(&signature);
        out.push(*sign_type as u8);
        Ok(out)
    }
}

/// Ordered set of keys controlling an account. Index `0` is the master key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyset {
    keys: Vec<Key>,
}

impl Keyset {
    /// Creates a keyset from its keys.
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// The keyset used when no keyset json is configured.
    ///
    /// Both keys belong to the master signer: index `0` signs with [`SignType::EthSign`],
    /// index `1` with [`SignType::Eip712Sign`].
    pub fn from_master(address: Address, signer: Arc<dyn MasterKeySigner>) -> Self {
        Self::new(vec![
            Key::secp256k1(address, RoleWeight::master(), SignType::EthSign, signer.clone()),
            Key::secp256k1(address, RoleWeight::master(), SignType::Eip712Sign, signer),
        ])
    }

    /// Parses a keyset json.
    pub fn from_json(json: &str) -> Result<Self, AccountError> {
        let keyset: Self = serde_json::from_str(json)
            .map_err(|err| AccountError::InvalidParams(format!("invalid keyset json: {err}")))?;
        if keyset.keys.is_empty() {
            return Err(AccountError::InvalidParams("keyset json has no keys".to_string()));
        }
        Ok(keyset)
    }

    /// Serializes the keyset to json. Signers are not part of the encoding.
    pub fn to_json(&self) -> Result<String, AccountError> {
        serde_json::to_string(self).map_err(|err| AccountError::InternalError(err.into()))
    }

    /// Attaches `signer` to the master key.
    ///
    /// The master key must be a secp256k1 key owned by `address`. Its role weight is kept and
    /// it signs with [`SignType::EthSign`] afterwards.
    pub fn with_master_signer(
        mut self,
        address: Address,
        signer: Arc<dyn MasterKeySigner>,
    ) -> Result<Self, AccountError> {
        let master = match self.keys.get(MASTER_KEY_INDEX) {
            Some(Key::Secp256k1(key)) => key,
            _ => return Err(AccountError::InvalidSigner("Invalid Keyset Json".to_string())),
        };
        if master.address != address {
            return Err(AccountError::InvalidSigner(format!(
                "Invalid Keyset Json With MasterKey: {}",
                master.address
            )));
        }
        self.keys[MASTER_KEY_INDEX] =
            Key::secp256k1(address, master.role_weight, SignType::EthSign, signer);
        Ok(self)
    }

    /// The keys in order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The master key.
    pub fn master(&self) -> Option<&Key> {
        self.keys.get(MASTER_KEY_INDEX)
    }

    /// `keccak256(key_0.serialize() ‖ … ‖ key_n.serialize())`
    pub fn hash(&self) -> B256 {
        keccak256(self.keys.iter().flat_map(Key::serialize).collect::<Vec<_>>())
    }

    /// Signs `digest` with the keys at `indexes`.
    ///
    /// The encoding starts with `uint8(0)` (not a session key) followed, per key, by
    /// `uint8(1) ‖ key signature` for signing keys and `uint8(0) ‖ key.serialize()` for the
    /// others.
    pub async fn sign(&self, digest: B256, indexes: &[usize]) -> Result<Bytes, SigningError> {
        if let Some(index) = indexes.iter().find(|index| **index >= self.keys.len()) {
            return Err(SigningError::UnknownKey(*index));
        }

        let mut out = vec![0u8];
        for (index, key) in self.keys.iter().enumerate() {
            if indexes.contains(&index) {
                out.push(1);
                out.extend(key.sign(index, digest).await?);
            } else {
                out.push(0);
                out.extend(key.serialize());
            }
        }
        Ok(out.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signers::DynSigner;
    use alloy::primitives::{address, b256};

    const KEYSET_JSON: &str = r#"{
        "keys": [
            {
                "type": "secp256k1",
                "address": "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
                "roleWeight": { "ownerWeight": 60, "assetsOpWeight": 60, "guardianWeight": 0 }
            },
            {
                "type": "opaque",
                "roleWeight": { "ownerWeight": 40, "assetsOpWeight": 0, "guardianWeight": 50 },
                "serialized": "0x0301020304"
            }
        ]
    }"#;

    fn signer() -> Arc<dyn MasterKeySigner> {
        Arc::new(
            DynSigner::from_signing_key(
                "0x0000000000000000000000000000000000000000000000000000000000000001",
            )
            .unwrap(),
        )
    }

    #[test]
    fn role_weight_serialization() {
        assert_eq!(
            RoleWeight::new(1, 2, 3).serialize(),
            [0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3]
        );
    }

    #[test]
    fn parses_keyset_json() {
        let keyset = Keyset::from_json(KEYSET_JSON).unwrap();
        assert_eq!(keyset.keys().len(), 2);
        assert_eq!(keyset.keys()[0].role_weight(), RoleWeight::new(60, 60, 0));
        assert_eq!(keyset.keys()[1].serialize(), vec![3, 1, 2, 3, 4]);
    }

    #[test]
    fn hash_covers_all_keys() {
        let keyset = Keyset::from_json(KEYSET_JSON).unwrap();
        let mut packed = vec![SECP256K1_KEY_TYPE];
        packed.extend_from_slice(
            address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").as_slice(),
        );
        packed.extend_from_slice(&RoleWeight::new(60, 60, 0).serialize());
        packed.extend_from_slice(&[3, 1, 2, 3, 4]);
        assert_eq!(keyset.hash(), keccak256(packed));
    }

    #[test]
    fn master_signer_must_match() {
        let keyset = Keyset::from_json(KEYSET_JSON).unwrap();
        let err = keyset
            .clone()
            .with_master_signer(address!("0x00000000000000000000000000000000000000aa"), signer())
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidSigner(_)));

        let hash = keyset.hash();
        let keyset = keyset
            .with_master_signer(address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"), signer())
            .unwrap();
        // replacing the signer keeps the identity of the keyset
        assert_eq!(keyset.hash(), hash);
    }

    #[test]
    fn opaque_master_is_rejected() {
        let keyset = Keyset::new(vec![Key::Opaque(OpaqueKey {
            role_weight: RoleWeight::master(),
            serialized: Bytes::from_static(&[1, 2]),
        })]);
        let err = keyset
            .with_master_signer(address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"), signer())
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidSigner(_)));
    }

    #[tokio::test]
    async fn signs_with_requested_indexes() {
        let address = address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
        let keyset = Keyset::from_master(address, signer());
        let digest = b256!("0x2222222222222222222222222222222222222222222222222222222222222222");

        let signature = keyset.sign(digest, &[0]).await.unwrap();
        // session flag, (signed flag, key type, 65 byte signature, sign type), (flag, 33 byte key)
        assert_eq!(signature.len(), 1 + (1 + 1 + 65 + 1) + (1 + 33));
        assert_eq!(signature[0], 0);
        assert_eq!(signature[1], 1);
        assert_eq!(signature[68], SignType::EthSign as u8);
        assert_eq!(signature[69], 0);

        let signature = keyset.sign(digest, &[1]).await.unwrap();
        assert_eq!(signature[1], 0);
        assert_eq!(signature[35], 1);
        assert_eq!(signature[signature.len() - 1], SignType::Eip712Sign as u8);
    }

    #[tokio::test]
    async fn rejects_unknown_and_unsigned_keys() {
        let keyset = Keyset::from_json(KEYSET_JSON).unwrap();
        let digest = B256::ZERO;
        assert!(matches!(keyset.sign(digest, &[5]).await, Err(SigningError::UnknownKey(5))));
        assert!(matches!(keyset.sign(digest, &[1]).await, Err(SigningError::NotASigner(1))));
        // parsed keys carry no signer until one is attached
        assert!(matches!(keyset.sign(digest, &[0]).await, Err(SigningError::NotASigner(0))));
    }
}
