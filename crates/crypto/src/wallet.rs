use secp256k1::{
    Message, PublicKey, Secp256k1, SecretKey,
    ecdsa::{RecoverableSignature, RecoveryId},
};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::ecies::{self, EncryptedPayload, parse_secret_key, random_secret_key};
use crate::{CryptoError, Result, decode_hex};

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Signing identity of the acting party. The secret key is erased on drop.
pub struct Wallet {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Wallet {
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let secret_key = parse_secret_key(private_key)?;
        let public_key = secret_key.public_key(&Secp256k1::new());
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    pub fn random() -> Self {
        let secret_key = random_secret_key();
        let public_key = secret_key.public_key(&Secp256k1::new());
        Self {
            secret_key,
            public_key,
        }
    }

    /// Lowercase `0x` Ethereum address
    pub fn address(&self) -> String {
        address_of(&self.public_key)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize_uncompressed())
    }

    /// Hex secret for handing to the transaction signer
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret_key.secret_bytes()))
    }

    /// EIP-191 personal signature over a 32-byte content hash, `r || s || v` hex
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<String> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(personal_message_digest(hash));
        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let v = u8::try_from(27 + i32::from(recovery_id))
            .map_err(|e| CryptoError::Signing(format!("bad recovery id: {}", e)))?;
        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(&compact);
        bytes.push(v);
        Ok(format!("0x{}", hex::encode(bytes)))
    }

    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>> {
        ecies::decrypt_with_private_key(payload, &self.private_key_hex())
    }
}

impl Drop for Wallet {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Recover the address that produced `signature` over `hash`
pub fn recover_signer(hash: &[u8; 32], signature: &str) -> Result<String> {
    let bytes = decode_hex(signature).map_err(|e| CryptoError::Signing(format!("bad hex: {}", e)))?;
    if bytes.len() != 65 {
        return Err(CryptoError::Signing(format!(
            "signature must be 65 bytes, got {}",
            bytes.len()
        )));
    }

    let v = i32::from(bytes[64]);
    let recovery_id = RecoveryId::try_from(if v >= 27 { v - 27 } else { v })
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    let secp = Secp256k1::new();
    let message = Message::from_digest(personal_message_digest(hash));
    let public_key = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(address_of(&public_key))
}

fn personal_message_digest(hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(hash);
    hasher.finalize().into()
}

fn address_of(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    let hashed = Keccak256::digest(&uncompressed[1..]);
    format!("0x{}", hex::encode(&hashed[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known Hardhat account #0
    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const HARDHAT_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_address_derivation() {
        let wallet = Wallet::from_private_key(HARDHAT_KEY).unwrap();
        assert_eq!(wallet.address(), HARDHAT_ADDRESS);
    }

    #[test]
    fn test_sign_and_recover() {
        let wallet = Wallet::random();
        let hash = [0x42u8; 32];
        let signature = wallet.sign_hash(&hash).unwrap();
        assert_eq!(signature.len(), 2 + 130);
        let v = u8::from_str_radix(&signature[signature.len() - 2..], 16).unwrap();
        assert!(v == 27 || v == 28);
        assert_eq!(recover_signer(&hash, &signature).unwrap(), wallet.address());
    }

    #[test]
    fn test_recover_with_other_hash_differs() {
        let wallet = Wallet::random();
        let signature = wallet.sign_hash(&[1u8; 32]).unwrap();
        let recovered = recover_signer(&[2u8; 32], &signature).unwrap_or_default();
        assert_ne!(recovered, wallet.address());
    }

    #[test]
    fn test_bad_signature_length() {
        assert!(recover_signer(&[0u8; 32], "0x1234").is_err());
    }

    #[test]
    fn test_wallet_decrypts_own_payload() {
        let wallet = Wallet::random();
        let payload = ecies::encrypt(b"note", &wallet.public_key_hex()).unwrap();
        assert_eq!(wallet.decrypt(&payload).unwrap(), b"note");
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = Wallet::from_private_key(HARDHAT_KEY).unwrap();
        let rendered = format!("{:?}", wallet);
        assert!(rendered.contains(HARDHAT_ADDRESS));
        assert!(!rendered.contains("ac0974bec39a17e3"));
    }
}
