//! Primitive wire codecs
//!
//! All AMF multi-byte integers and doubles travel in network (big-endian)
//! order. Host byte order and float word order are resolved here and
//! nowhere else: every conversion goes through `from_be_bytes` /
//! `to_be_bytes`, which the compiler lowers to the right permutation for
//! the target.
//!
//! Fixed-width decoders take exact-size arrays, so bounds checking
//! happens when the caller slices the input.
//!
//! AMF3 variable-length integer (U29):
//! ```text
//! 0x00000000 - 0x0000007F : 0xxxxxxx
//! 0x00000080 - 0x00003FFF : 1xxxxxxx 0xxxxxxx
//! 0x00004000 - 0x001FFFFF : 1xxxxxxx 1xxxxxxx 0xxxxxxx
//! 0x00200000 - 0x1FFFFFFF : 1xxxxxxx 1xxxxxxx 1xxxxxxx xxxxxxxx
//! ```

use crate::error::{AmfError, Result};

/// Largest value representable as a U29
pub const U29_MAX: u32 = 0x1FFF_FFFF;

#[inline]
pub fn decode_u16(data: [u8; 2]) -> u16 {
    u16::from_be_bytes(data)
}

#[inline]
pub fn decode_u32(data: [u8; 4]) -> u32 {
    u32::from_be_bytes(data)
}

#[inline]
pub fn encode_u16(val: u16) -> [u8; 2] {
    val.to_be_bytes()
}

#[inline]
pub fn encode_u32(val: u32) -> [u8; 4] {
    val.to_be_bytes()
}

/// Decode an IEEE-754 double sent in network byte order
#[inline]
pub fn decode_double(data: [u8; 8]) -> f64 {
    f64::from_bits(u64::from_be_bytes(data))
}

/// Encode an IEEE-754 double in network byte order
#[inline]
pub fn encode_double(val: f64) -> [u8; 8] {
    val.to_bits().to_be_bytes()
}

/// Decode an AMF3 U29 from the head of `buf`, advancing it past the
/// consumed bytes.
///
/// On underflow `buf` is left untouched.
pub fn decode_u29(buf: &mut &[u8]) -> Result<u32> {
    let data = *buf;
    let byte_at = |i: usize| {
        data.get(i).copied().ok_or(AmfError::Underflow {
            needed: i + 1,
            available: data.len(),
        })
    };

    let mut value: u32 = 0;
    for i in 0..3 {
        let byte = byte_at(i)?;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            *buf = &data[i + 1..];
            return Ok(value);
        }
    }

    // Fourth byte contributes all 8 bits
    value = (value << 8) | byte_at(3)? as u32;
    *buf = &data[4..];
    Ok(value)
}

/// Number of bytes `encode_u29` will write for `val`
pub fn u29_size(val: u32) -> Result<usize> {
    match val {
        0..=0x7F => Ok(1),
        0x80..=0x3FFF => Ok(2),
        0x4000..=0x1F_FFFF => Ok(3),
        0x20_0000..=U29_MAX => Ok(4),
        _ => Err(AmfError::ValueOutOfRange(val)),
    }
}

/// Encode `val` as an AMF3 U29 into `out`, returning bytes written
pub fn encode_u29(val: u32, out: &mut [u8]) -> Result<usize> {
    let size = u29_size(val)?;
    if out.len() < size {
        return Err(AmfError::Overflow {
            needed: size,
            available: out.len(),
        });
    }

    match size {
        1 => {
            out[0] = val as u8;
        }
        2 => {
            out[0] = ((val >> 7) as u8) | 0x80;
            out[1] = (val & 0x7F) as u8;
        }
        3 => {
            out[0] = ((val >> 14) as u8) | 0x80;
            out[1] = (((val >> 7) & 0x7F) as u8) | 0x80;
            out[2] = (val & 0x7F) as u8;
        }
        _ => {
            out[0] = (((val >> 22) & 0x7F) as u8) | 0x80;
            out[1] = (((val >> 15) & 0x7F) as u8) | 0x80;
            out[2] = (((val >> 8) & 0x7F) as u8) | 0x80;
            out[3] = (val & 0xFF) as u8;
        }
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_network_order() {
        assert_eq!(decode_u16([0x12, 0x34]), 0x1234);
        assert_eq!(decode_u32([0xDE, 0xAD, 0xBE, 0xEF]), 0xDEADBEEF);
        assert_eq!(encode_u16(0x0102), [0x01, 0x02]);
        assert_eq!(encode_u32(0x01020304), [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_double_wire_bytes() {
        // 1.0 = 0x3FF0000000000000
        assert_eq!(
            encode_double(1.0),
            [0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            decode_double([0x40, 0x94, 0xE4, 0x00, 0x00, 0x00, 0x00, 0x00]),
            1337.0
        );
        assert_eq!(decode_double(encode_double(-0.5)), -0.5);
    }

    #[test]
    fn test_u29_single_byte() {
        let data = [0x7F, 0xAA];
        let mut buf = &data[..];
        assert_eq!(decode_u29(&mut buf).unwrap(), 0x7F);
        assert_eq!(buf, &[0xAA]);
    }

    #[test]
    fn test_u29_multi_byte() {
        let data = [0x81, 0x00];
        let mut buf = &data[..];
        assert_eq!(decode_u29(&mut buf).unwrap(), 0x80);
        assert!(buf.is_empty());

        let data = [0xFF, 0xFF, 0x7F];
        let mut buf = &data[..];
        assert_eq!(decode_u29(&mut buf).unwrap(), 0x1F_FFFF);

        // Fourth byte uses all 8 bits
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut buf = &data[..];
        assert_eq!(decode_u29(&mut buf).unwrap(), U29_MAX);
    }

    #[test]
    fn test_u29_underflow() {
        let data = [0x80, 0x80];
        let mut buf = &data[..];
        let err = decode_u29(&mut buf).unwrap_err();
        assert_eq!(
            err,
            AmfError::Underflow {
                needed: 3,
                available: 2
            }
        );
        assert_eq!(buf.len(), 2);

        let mut empty: &[u8] = &[];
        assert!(decode_u29(&mut empty).unwrap_err().is_underflow());

        let data = [0x80, 0x80, 0x80];
        let mut buf = &data[..];
        assert_eq!(
            decode_u29(&mut buf).unwrap_err(),
            AmfError::Underflow {
                needed: 4,
                available: 3
            }
        );
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_u29_encode_boundaries() {
        let mut out = [0u8; 4];
        for &(val, size) in &[
            (0u32, 1usize),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (0x1F_FFFF, 3),
            (0x20_0000, 4),
            (U29_MAX, 4),
        ] {
            assert_eq!(encode_u29(val, &mut out).unwrap(), size);
            let mut buf = &out[..size];
            assert_eq!(decode_u29(&mut buf).unwrap(), val);
        }
    }

    #[test]
    fn test_u29_encode_errors() {
        let mut out = [0u8; 4];
        assert_eq!(
            encode_u29(U29_MAX + 1, &mut out),
            Err(AmfError::ValueOutOfRange(U29_MAX + 1))
        );

        let mut small = [0u8; 1];
        assert!(matches!(
            encode_u29(0x80, &mut small),
            Err(AmfError::Overflow { needed: 2, .. })
        ));
    }
}
