/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Byte sources for the decoder.
//!
//! PSD stores everything big-endian, so the reader here only grows
//! big-endian helpers. The one deliberate oddity is [`f32_reversed`]:
//! 32-bit float samples are stored with their bytes reversed relative
//! to the rest of the stream and must be read that way.
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};

/// Errors raised by a [`ByteSource`].
pub enum SourceError {
    /// Not enough bytes left in the stream, arguments are
    /// requested bytes and bytes we could actually provide.
    Truncated(usize, usize),
    /// Underlying I/O error that is not an end-of-stream condition.
    Io(std::io::Error)
}

impl std::fmt::Debug for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Truncated(requested, available) => {
                writeln!(
                    f,
                    "stream ended early, requested {requested} bytes but only {available} are available"
                )
            }
            SourceError::Io(err) => {
                writeln!(f, "underlying i/o error: {err}")
            }
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err)
    }
}

/// The minimal operations the decoder needs from its input.
///
/// Implemented for [`ByteCursor`] (in-memory bytes) and for
/// `BufReader<R>` where `R: Read + Seek` (files).
pub trait ByteSource {
    /// Read a single byte, failing when the stream is exhausted.
    fn read_byte(&mut self) -> Result<u8, SourceError>;
    /// Fill `buf` completely or fail with [`SourceError::Truncated`].
    fn read_exact_bytes(&mut self, buf: &mut [u8]) -> Result<(), SourceError>;
    /// Seek to an absolute position from the start of the stream.
    ///
    /// Seeking past the end is allowed, subsequent reads will fail.
    fn seek_to(&mut self, position: u64) -> Result<(), SourceError>;
    /// Current absolute position from the start of the stream.
    fn position(&mut self) -> Result<u64, SourceError>;
}

/// An in-memory byte source, the usual way to hand the decoder a
/// buffer that was already read from disk or received from elsewhere.
pub struct ByteCursor<T: AsRef<[u8]>> {
    stream:   T,
    position: usize
}

impl<T: AsRef<[u8]>> ByteCursor<T> {
    pub fn new(stream: T) -> ByteCursor<T> {
        ByteCursor {
            stream,
            position: 0
        }
    }
}

impl<T: AsRef<[u8]>> ByteSource for ByteCursor<T> {
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        match self.stream.as_ref().get(self.position) {
            Some(byte) => {
                self.position += 1;
                Ok(*byte)
            }
            None => Err(SourceError::Truncated(1, 0))
        }
    }

    #[inline(always)]
    fn read_exact_bytes(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        let bytes = self.stream.as_ref();
        let remaining = bytes.len().saturating_sub(self.position);

        if remaining < buf.len() {
            return Err(SourceError::Truncated(buf.len(), remaining));
        }
        buf.copy_from_slice(&bytes[self.position..self.position + buf.len()]);
        self.position += buf.len();

        Ok(())
    }

    #[inline(always)]
    fn seek_to(&mut self, position: u64) -> Result<(), SourceError> {
        self.position = position as usize;
        Ok(())
    }

    #[inline(always)]
    fn position(&mut self) -> Result<u64, SourceError> {
        Ok(self.position as u64)
    }
}

impl<T: Read + Seek> ByteSource for BufReader<T> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        let mut byte = [0];
        self.read_exact_bytes(&mut byte)?;
        Ok(byte[0])
    }

    #[inline]
    fn read_exact_bytes(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        self.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                // read_exact leaves the partial count unspecified, report
                // zero rather than inventing one
                SourceError::Truncated(buf.len(), 0)
            } else {
                SourceError::Io(e)
            }
        })
    }

    fn seek_to(&mut self, position: u64) -> Result<(), SourceError> {
        self.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64, SourceError> {
        self.stream_position().map_err(SourceError::from)
    }
}

/// A reader adding the big-endian getters the format needs on top of a
/// [`ByteSource`].
pub(crate) struct ByteReader<T: ByteSource> {
    inner: T
}

impl<T: ByteSource> ByteReader<T> {
    pub fn new(inner: T) -> ByteReader<T> {
        ByteReader { inner }
    }

    #[inline(always)]
    pub fn get_u8(&mut self) -> Result<u8, SourceError> {
        self.inner.read_byte()
    }

    #[inline(always)]
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        self.inner.read_exact_bytes(buf)
    }

    #[inline(always)]
    pub fn read_fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N], SourceError> {
        let mut bytes = [0; N];
        self.inner.read_exact_bytes(&mut bytes)?;
        Ok(bytes)
    }

    #[inline(always)]
    pub fn get_u16_be(&mut self) -> Result<u16, SourceError> {
        Ok(u16::from_be_bytes(self.read_fixed_bytes::<2>()?))
    }

    #[inline(always)]
    pub fn get_i16_be(&mut self) -> Result<i16, SourceError> {
        Ok(i16::from_be_bytes(self.read_fixed_bytes::<2>()?))
    }

    /// Read four bytes and assemble them MSB first.
    ///
    /// No sign extension happens on the intermediate bytes.
    #[inline(always)]
    pub fn get_u32_be(&mut self) -> Result<u32, SourceError> {
        Ok(u32::from_be_bytes(self.read_fixed_bytes::<4>()?))
    }

    /// Advance the stream by `num` bytes without interpreting them.
    pub fn skip(&mut self, num: usize) -> Result<(), SourceError> {
        let position = self.inner.position()?;
        self.inner.seek_to(position + num as u64)
    }

    pub fn seek_to(&mut self, position: u64) -> Result<(), SourceError> {
        self.inner.seek_to(position)
    }

    pub fn position(&mut self) -> Result<u64, SourceError> {
        self.inner.position()
    }
}

/// Assemble an unsigned integer from `length` big-endian bytes
/// starting at `offset`.
///
/// Callers guarantee `offset + length` is in bounds.
pub(crate) fn be_uint(bytes: &[u8], offset: usize, length: usize) -> u32 {
    let mut value: u32 = 0;

    for byte in &bytes[offset..offset + length] {
        value = (value << 8) | u32::from(*byte);
    }
    value
}

/// Read a 32-bit float stored with its bytes reversed relative to the
/// big-endian stream, i.e. reinterpret them little-endian.
///
/// Callers guarantee `offset + 4` is in bounds.
pub(crate) fn f32_reversed(bytes: &[u8], offset: usize) -> f32 {
    let quad: [u8; 4] = [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3]
    ];
    f32::from_le_bytes(quad)
}
