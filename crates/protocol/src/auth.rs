//! VNC Authentication (security type 2).
//!
//! The server sends a 16-byte random challenge. The client encrypts it with
//! single DES in ECB mode, keyed by the first eight bytes of the password
//! (zero padded) with the bit order of every key byte reversed.

use des::Des;
use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockEncrypt, KeyInit};

/// Length of the server challenge and the client response.
pub const CHALLENGE_LEN: usize = 16;

/// Builds the DES key derived from a VNC password.
pub fn password_key(password: &str) -> [u8; 8] {
	let mut key = [0u8; 8];
	for (slot, byte) in key.iter_mut().zip(password.bytes()) {
		*slot = byte.reverse_bits();
	}
	key
}

/// Encrypts the server challenge with the password-derived key.
pub fn challenge_response(password: &str, challenge: &[u8; CHALLENGE_LEN]) -> [u8; CHALLENGE_LEN] {
	let key = password_key(password);
	let cipher = Des::new(GenericArray::from_slice(&key));

	let mut response = *challenge;
	for chunk in response.chunks_exact_mut(8) {
		cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
	}
	response
}
