//! The coding state threaded through generated codecs.

use crate::error::Error;

const PADDING: [u8; 3] = [0; 3];

/// The deepest chain of optional values a single state will transfer.
pub const MAX_DEPTH: usize = 512;

/// Number of zero bytes needed to pad `len` bytes to a 4-byte boundary.
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

enum Stream<'a> {
    Encode(&'a mut Vec<u8>),
    Decode { bytes: &'a [u8], pos: usize },
}

/// A direction-aware XDR coding state.
///
/// The same generated codec is used for both directions: when encoding, each
/// transfer appends the current value of a place to the output buffer; when
/// decoding, each transfer overwrites the place with the next value read from
/// the input. The first error is recorded and turns every later transfer into
/// a no-op, so callers only need to consult [`XdrState::check`] once at the
/// end.
pub struct XdrState<'a> {
    stream: Stream<'a>,
    error: Option<Error>,
    depth: usize,
}

impl<'a> XdrState<'a> {
    /// A state that appends encoded values to `buffer`.
    pub fn encoder(buffer: &'a mut Vec<u8>) -> XdrState<'a> {
        XdrState {
            stream: Stream::Encode(buffer),
            error: None,
            depth: 0,
        }
    }

    /// A state that decodes values from the start of `bytes`.
    pub fn decoder(bytes: &'a [u8]) -> XdrState<'a> {
        XdrState {
            stream: Stream::Decode { bytes, pos: 0 },
            error: None,
            depth: 0,
        }
    }

    pub fn encoding(&self) -> bool {
        matches!(self.stream, Stream::Encode(_))
    }

    pub fn decoding(&self) -> bool {
        matches!(self.stream, Stream::Decode { .. })
    }

    /// Returns `true` if no error has been recorded yet.
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// The first error recorded, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Record an error. Only the first error is kept.
    pub fn set_error(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Convert the recorded error, if any, into a `Result`.
    pub fn check(&self) -> Result<(), Error> {
        match &self.error {
            None => Ok(()),
            Some(error) => Err(error.clone()),
        }
    }

    /// Step into the referent of an optional value. Returns `false`, and
    /// records [`Error::DepthExceeded`] if needed, when the referent must not
    /// be transferred. Every `true` return is paired with a [`leave`].
    ///
    /// [`leave`]: XdrState::leave
    pub fn enter(&mut self) -> bool {
        if !self.ok() {
            return false;
        }
        if self.depth >= MAX_DEPTH {
            self.set_error(Error::DepthExceeded);
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Number of input bytes not yet consumed. Always zero when encoding.
    pub fn remaining(&self) -> usize {
        match &self.stream {
            Stream::Encode(_) => 0,
            Stream::Decode { bytes, pos } => bytes.len() - pos,
        }
    }

    pub fn i32(&mut self, value: &mut i32) {
        if let Some(bytes) = self.transfer(value.to_be_bytes()) {
            *value = i32::from_be_bytes(bytes);
        }
    }

    pub fn u32(&mut self, value: &mut u32) {
        if let Some(bytes) = self.transfer(value.to_be_bytes()) {
            *value = u32::from_be_bytes(bytes);
        }
    }

    pub fn i64(&mut self, value: &mut i64) {
        if let Some(bytes) = self.transfer(value.to_be_bytes()) {
            *value = i64::from_be_bytes(bytes);
        }
    }

    pub fn u64(&mut self, value: &mut u64) {
        if let Some(bytes) = self.transfer(value.to_be_bytes()) {
            *value = u64::from_be_bytes(bytes);
        }
    }

    /// Booleans travel as a 32-bit word that must be 0 or 1.
    pub fn bool(&mut self, value: &mut bool) {
        let mut word = u32::from(*value);
        self.u32(&mut word);
        if self.decoding() && self.ok() {
            match word {
                0 => *value = false,
                1 => *value = true,
                other => self.set_error(Error::InvalidBool(other)),
            }
        }
    }

    /// Fixed-length opaque data: the bytes followed by zero padding, with no
    /// length prefix.
    pub fn fixed_opaque(&mut self, data: &mut [u8]) {
        if !self.ok() {
            return;
        }
        let pad = padding(data.len());
        if self.encoding() {
            self.put(data);
            self.put(&PADDING[..pad]);
        } else if let Some(bytes) = self.take(data.len() + pad) {
            let len = data.len();
            data.copy_from_slice(&bytes[..len]);
        }
    }

    /// Variable-length opaque data, optionally bounded by `max` bytes.
    pub fn var_opaque(&mut self, max: Option<u32>, data: &mut Vec<u8>) {
        if let Some(bytes) = self.var_bytes(max, data) {
            data.clear();
            data.extend_from_slice(bytes);
        }
    }

    /// A string, optionally bounded by `max` bytes. Encoded exactly like
    /// variable-length opaque data.
    pub fn string(&mut self, max: Option<u32>, text: &mut String) {
        if let Some(bytes) = self.var_bytes(max, text.as_bytes()) {
            match std::str::from_utf8(bytes) {
                Ok(decoded) => {
                    text.clear();
                    text.push_str(decoded);
                }
                Err(_) => self.set_error(Error::InvalidString),
            }
        }
    }

    /// The length to transmit for a sequence of `len` items: `len` itself
    /// when encoding, or a placeholder to be overwritten when decoding.
    pub fn encoding_len(&mut self, len: usize) -> u32 {
        if !self.encoding() {
            return 0;
        }
        match u32::try_from(len) {
            Ok(len) => len,
            Err(_) => {
                self.set_error(Error::LengthOverflow { max: u32::MAX, got: len });
                0
            }
        }
    }

    /// Record a length overflow if `len` exceeds `max`.
    pub fn check_len(&mut self, len: u32, max: u32) {
        if len > max {
            self.set_error(Error::LengthOverflow {
                max,
                got: len as usize,
            });
        }
    }

    fn var_bytes(&mut self, max: Option<u32>, data: &[u8]) -> Option<&'a [u8]> {
        let mut len = self.encoding_len(data.len());
        if let (true, Some(max)) = (self.encoding(), max) {
            self.check_len(len, max);
        }
        self.u32(&mut len);
        if let (true, Some(max)) = (self.decoding(), max) {
            self.check_len(len, max);
        }
        if !self.ok() {
            return None;
        }

        let len = len as usize;
        let pad = padding(len);
        if self.encoding() {
            self.put(data);
            self.put(&PADDING[..pad]);
            None
        } else {
            let bytes = self.take(len + pad)?;
            Some(&bytes[..len])
        }
    }

    /// Encode `bytes`, or decode into a fresh array. Returns the decoded
    /// bytes only when decoding succeeded.
    fn transfer<const N: usize>(&mut self, bytes: [u8; N]) -> Option<[u8; N]> {
        if !self.ok() {
            return None;
        }
        if self.encoding() {
            self.put(&bytes);
            return None;
        }
        let taken = self.take(N)?;
        let mut out = [0; N];
        out.copy_from_slice(taken);
        Some(out)
    }

    fn put(&mut self, bytes: &[u8]) {
        if let Stream::Encode(buffer) = &mut self.stream {
            buffer.extend_from_slice(bytes);
        }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let taken = match &mut self.stream {
            Stream::Encode(_) => None,
            Stream::Decode { bytes, pos } => {
                let bytes: &'a [u8] = *bytes;
                match pos.checked_add(len) {
                    Some(end) if end <= bytes.len() => {
                        let taken = &bytes[*pos..end];
                        *pos = end;
                        Some(taken)
                    }
                    _ => None,
                }
            }
        };
        if taken.is_none() {
            self.set_error(Error::UnexpectedEof);
        }
        taken
    }
}
