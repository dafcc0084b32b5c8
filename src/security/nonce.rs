use crate::constants::NONCE_LENGTH;
use crate::error::CspError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Produces base64 nonces from the operating system's secure random source.
#[derive(Debug, Clone)]
pub struct NonceGenerator {
    length: usize,
    generated: Arc<AtomicUsize>,
}

impl NonceGenerator {
    #[inline]
    pub fn new(length: usize) -> Self {
        Self {
            length,
            generated: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fills `length` bytes from the OS and encodes them with the standard
    /// padded base64 alphabet.
    pub fn try_generate(&self) -> Result<String, CspError> {
        let mut buffer = vec![0u8; self.length];
        getrandom::getrandom(&mut buffer)
            .map_err(|err| CspError::CryptoError(format!("secure random unavailable: {}", err)))?;
        self.generated.fetch_add(1, Ordering::Relaxed);
        Ok(BASE64.encode(&buffer))
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(NONCE_LENGTH)
    }
}

/// The nonce bound to one request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestNonce(pub String);

impl Deref for RequestNonce {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
