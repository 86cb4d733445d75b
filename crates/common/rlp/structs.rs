use bytes::BufMut;

use super::{
    decode::{RLPDecode, decode_rlp_item, get_item_with_prefix},
    encode::{RLPEncode, encode_length},
    error::RLPDecodeError,
};

/// # Struct decoding helper
///
/// A cursor over the fields of an RLP list. Construct it over the encoded
/// list, pull each field out in order with [`Decoder::decode_field`], and
/// close it with [`Decoder::finish`], which fails if fields were left over.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Fields of the list not yet decoded.
    fields: &'a [u8],
    /// Input bytes after the list.
    rest: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, RLPDecodeError> {
        let (is_list, fields, rest) = decode_rlp_item(buf)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        Ok(Self { fields, rest })
    }

    /// Decodes the next field of the list, advancing past it.
    pub fn decode_field<T: RLPDecode>(&mut self, name: &str) -> Result<T, RLPDecodeError> {
        match T::decode_unfinished(self.fields) {
            Ok((field, undecoded)) => {
                self.fields = undecoded;
                Ok(field)
            }
            Err(err) => Err(RLPDecodeError::Custom(format!(
                "error decoding field '{name}': {err}"
            ))),
        }
    }

    /// Returns the next field undecoded, prefix included, advancing past it.
    pub fn next_encoded_field(&mut self) -> Result<&'a [u8], RLPDecodeError> {
        let (field, undecoded) = get_item_with_prefix(self.fields)?;
        self.fields = undecoded;
        Ok(field)
    }

    /// True while fields remain to be decoded.
    pub const fn has_more_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Closes the decoder, returning the bytes after the list.
    /// Fails if any field was left undecoded.
    pub const fn finish(self) -> Result<&'a [u8], RLPDecodeError> {
        if self.has_more_fields() {
            return Err(RLPDecodeError::MalformedData);
        }
        Ok(self.rest)
    }
}

/// # Struct encoding helper
///
/// Used to encode a struct into RLP format.
/// The struct is encoded as a list, with its values being the fields
/// in the order they are passed to [`Encoder::encode_field`].
#[must_use = "`Encoder` must be consumed with `finish` to perform the encoding"]
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    temp_buf: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            temp_buf: Vec::new(),
        }
    }

    /// Stores a field to be encoded.
    pub fn encode_field<T: RLPEncode>(mut self, value: &T) -> Self {
        <T as RLPEncode>::encode(value, &mut self.temp_buf);
        self
    }

    /// Stores a field to be encoded as a byte string.
    /// Used to bypass the list encoding of `Vec<u8>`.
    pub fn encode_bytes(mut self, value: &[u8]) -> Self {
        <[u8] as RLPEncode>::encode(value, &mut self.temp_buf);
        self
    }

    /// Adds an already-encoded item to the buffer as-is.
    pub fn encode_raw(mut self, value: &[u8]) -> Self {
        self.temp_buf.put_slice(value);
        self
    }

    /// Finishes encoding the struct and writes the result to the buffer.
    pub fn finish(self) {
        encode_length(self.temp_buf.len(), self.buf);
        self.buf.put_slice(&self.temp_buf);
    }
}
