//! Base58Check and Bech32 encodings for addresses and keys.

use bech32::{Fe32, Hrp};

use crate::error::AddressDecodeError;
use crate::hash::double_sha256;

/// Encode `version ++ payload` as Base58Check.
pub fn base58check_encode(version: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(version.len() + payload.len() + 4);
    data.extend_from_slice(version);
    data.extend_from_slice(payload);

    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}

/// Decode a Base58Check string and return the payload including its
/// version prefix, with the checksum verified and stripped.
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>, AddressDecodeError> {
    let mut data = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| AddressDecodeError::InvalidBase58)?;

    if data.len() < 5 {
        return Err(AddressDecodeError::InvalidLength {
            expected: 5,
            actual: data.len(),
        });
    }

    let payload_len = data.len() - 4;
    let computed = double_sha256(&data[..payload_len]);
    if data[payload_len..] != computed[..4] {
        return Err(AddressDecodeError::InvalidChecksum);
    }

    data.truncate(payload_len);
    Ok(data)
}

/// Encode a segwit address. Version 0 uses Bech32, version 1+ Bech32m.
pub fn bech32_encode(hrp: &str, version: u8, program: &[u8]) -> Result<String, AddressDecodeError> {
    let hrp = Hrp::parse(hrp).map_err(|e| AddressDecodeError::Bech32(e.to_string()))?;
    let version = Fe32::try_from(version).map_err(|e| AddressDecodeError::Bech32(e.to_string()))?;

    bech32::segwit::encode(hrp, version, program)
        .map_err(|e| AddressDecodeError::Bech32(e.to_string()))
}

/// Decode a segwit address into `(hrp, witness_version, witness_program)`.
///
/// The checksum variant, program length and witness version are validated
/// by the decoder.
pub fn bech32_decode(encoded: &str) -> Result<(String, u8, Vec<u8>), AddressDecodeError> {
    let (hrp, version, program) =
        bech32::segwit::decode(encoded).map_err(|e| AddressDecodeError::Bech32(e.to_string()))?;

    Ok((hrp.to_lowercase(), version.to_u8(), program))
}
