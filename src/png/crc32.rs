//! The CRC32 that guards every chunk.
//!
//! This is the IEEE 802.3 polynomial (reflected form `0xEDB8_8320`), computed
//! over the chunk type bytes followed by the chunk data bytes.

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

#[inline]
fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
  for &byte in bytes {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc
}

/// Computes the CRC of a run of bytes.
#[inline]
#[must_use]
pub fn png_crc(bytes: &[u8]) -> u32 {
  update_crc(u32::MAX, bytes) ^ u32::MAX
}

/// Computes the CRC that a chunk with this type and data should carry.
#[inline]
#[must_use]
pub fn chunk_crc(ty: [u8; 4], data: &[u8]) -> u32 {
  update_crc(update_crc(u32::MAX, &ty), data) ^ u32::MAX
}

#[test]
fn test_crc_check_values() {
  // the standard CRC-32 check value
  assert_eq!(png_crc(b"123456789"), 0xCBF4_3926);
  assert_eq!(png_crc(&[]), 0);
  // the CRC of an IEND chunk is the same in every PNG
  assert_eq!(chunk_crc(*b"IEND", &[]), 0xAE42_6082);
  assert_eq!(chunk_crc(*b"IEND", &[]), png_crc(b"IEND"));
}
