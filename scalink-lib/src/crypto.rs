//! Reference cipher used to predict what the target should answer.

use crate::{Error, Result};
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

pub const AES_BLOCK_SIZE: usize = 16;

pub trait CipherReference: Send + Sync {
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// AES in ECB mode, key size picked from the key length.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesReference;

impl AesReference {
    fn run(key: &[u8], data: &[u8], direction: Direction) -> Result<Vec<u8>> {
        if data.is_empty() || data.len() % AES_BLOCK_SIZE != 0 {
            return Err(Error::Cipher(format!(
                "input length {} is not a multiple of {}",
                data.len(),
                AES_BLOCK_SIZE
            )));
        }
        match key.len() {
            16 => ecb::<Aes128>(key, data, direction),
            24 => ecb::<Aes192>(key, data, direction),
            32 => ecb::<Aes256>(key, data, direction),
            n => Err(Error::Cipher(format!("unsupported AES key length {}", n))),
        }
    }
}

fn ecb<C>(key: &[u8], data: &[u8], direction: Direction) -> Result<Vec<u8>>
where
    C: KeyInit + BlockEncrypt + BlockDecrypt,
{
    let cipher = C::new_from_slice(key).map_err(|e| Error::Cipher(e.to_string()))?;
    let mut out = data.to_vec();
    for chunk in out.chunks_exact_mut(AES_BLOCK_SIZE) {
        let block = GenericArray::from_mut_slice(chunk);
        match direction {
            Direction::Encrypt => cipher.encrypt_block(block),
            Direction::Decrypt => cipher.decrypt_block(block),
        }
    }
    Ok(out)
}

impl CipherReference for AesReference {
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        Self::run(key, plaintext, Direction::Encrypt)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        Self::run(key, ciphertext, Direction::Decrypt)
    }
}
