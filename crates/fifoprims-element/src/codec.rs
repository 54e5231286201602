//! Encode/decode hooks applied at element boundaries.
//!
//! Hooks are pure conversions between a typed value and exactly
//! `element_size` bytes. The channel guarantees each one runs exactly once
//! per element: the encoder when a new element starts, the decoder when the
//! last byte of an element arrives.

/// Turns a typed value into the bytes of one element.
///
/// `dst` is always exactly `element_size` bytes long.
pub trait Encoder<T: ?Sized> {
    fn encode(&self, value: &T, dst: &mut [u8]);
}

/// Turns the bytes of one element back into a typed value.
///
/// `src` is always exactly `element_size` bytes long.
pub trait Decoder<T> {
    fn decode(&self, src: &[u8]) -> T;
}

impl<T: ?Sized, F> Encoder<T> for F
where
    F: Fn(&T, &mut [u8]),
{
    fn encode(&self, value: &T, dst: &mut [u8]) {
        self(value, dst)
    }
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&[u8]) -> T,
{
    fn decode(&self, src: &[u8]) -> T {
        self(src)
    }
}

/// Identity codec for byte vectors.
///
/// Values shorter than the element are zero-padded, longer ones are
/// truncated. Use [`crate::Channel::try_write_raw`] when a size mismatch
/// should be an error instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl Encoder<[u8]> for RawBytes {
    fn encode(&self, value: &[u8], dst: &mut [u8]) {
        let n = value.len().min(dst.len());
        dst[..n].copy_from_slice(&value[..n]);
        dst[n..].fill(0);
    }
}

impl Encoder<Vec<u8>> for RawBytes {
    fn encode(&self, value: &Vec<u8>, dst: &mut [u8]) {
        Encoder::<[u8]>::encode(self, value.as_slice(), dst)
    }
}

impl Decoder<Vec<u8>> for RawBytes {
    fn decode(&self, src: &[u8]) -> Vec<u8> {
        src.to_vec()
    }
}
