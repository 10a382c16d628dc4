//! Serde adapters that render ed25519 public keys as lowercase hex.

use commonware_codec::DecodeExt;
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::{from_hex_formatted, hex};
use serde::{Deserialize, Deserializer, Serialize as _, Serializer};

pub fn encode_public_key(public_key: &PublicKey) -> String {
    hex(public_key.as_ref())
}

/// Accepts both bare and `0x`-prefixed hex.
pub fn decode_public_key(s: &str) -> Result<PublicKey, String> {
    let bytes = from_hex_formatted(s).ok_or_else(|| "invalid hex string".to_string())?;
    PublicKey::decode(bytes.as_slice()).map_err(|_| "invalid public key".to_string())
}

pub mod public_key {
    use super::*;

    pub fn serialize<S>(public_key: &PublicKey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode_public_key(public_key))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PublicKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        decode_public_key(&s).map_err(serde::de::Error::custom)
    }
}

pub mod public_keys {
    use super::*;

    pub fn serialize<S>(public_keys: &[PublicKey], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        public_keys
            .iter()
            .map(encode_public_key)
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<PublicKey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| decode_public_key(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};

    #[test]
    fn decode_accepts_prefixed_hex() {
        let public = PrivateKey::from_seed(7).public_key();
        let encoded = encode_public_key(&public);
        assert_eq!(decode_public_key(&encoded), Ok(public.clone()));
        assert_eq!(decode_public_key(&format!("0x{encoded}")), Ok(public));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_public_key("zz").is_err());
        assert!(decode_public_key("abcd").is_err());
    }
}
