//! Shorthands for pulling fixed-size pieces off the front of byte slices.

#[inline]
#[must_use]
pub(crate) fn try_split_off_byte_array<const N: usize>(bytes: &[u8]) -> Option<([u8; N], &[u8])> {
  if bytes.len() >= N {
    let (head, tail) = bytes.split_at(N);
    let mut a = [0_u8; N];
    a.copy_from_slice(head);
    Some((a, tail))
  } else {
    None
  }
}

#[inline]
#[must_use]
pub(crate) fn u32_be(bytes: [u8; 4]) -> u32 {
  u32::from_be_bytes(bytes)
}

#[inline]
#[must_use]
pub(crate) fn u16_be(bytes: [u8; 2]) -> u16 {
  u16::from_be_bytes(bytes)
}

/// Splits off everything up to the first null byte, and skips the null.
#[inline]
#[must_use]
pub(crate) fn split_at_null(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
  let i = bytes.iter().position(|&b| b == 0)?;
  Some((&bytes[..i], &bytes[i + 1..]))
}
