/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
///
/// * If this is the case, the rest of the bytes are very likely PNG data.
/// * If this is *not* the case, the rest of the bytes are very likely *not* PNG
///   data.
///
/// Buffers shorter than 8 bytes just give `false`.
#[inline]
#[must_use]
pub const fn validate_signature(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// The signature bytes, for writing a new stream.
#[inline]
#[must_use]
pub const fn signature_bytes() -> [u8; 8] {
  PNG_SIGNATURE
}

#[test]
fn test_validate_signature() {
  assert!(validate_signature(&PNG_SIGNATURE));
  assert!(validate_signature(&[137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 0]));
  assert!(!validate_signature(&[]));
  assert!(!validate_signature(&PNG_SIGNATURE[..7]));
  assert!(!validate_signature(&[137, 80, 78, 71, 13, 10, 26, 11]));
  // the classic damage from a text-mode transfer: CRLF becomes LF
  assert!(!validate_signature(&[137, 80, 78, 71, 10, 26, 10, 0]));
  assert_eq!(signature_bytes(), PNG_SIGNATURE);
}
