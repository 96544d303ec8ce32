use bytes::BytesMut;

use crate::Error;

/// A bounds-checked window over a byte region.
///
/// The view carries coordinates only and the storage is passed to every
/// accessor, so a view can outlive the borrow it was parsed from and be
/// handed between pipeline stages freely. Views produced by [`View::slice`]
/// address the same storage as their parent: a write through one view is
/// visible through every other view over the region. Owning copies are made
/// explicitly with [`View::copy`] and [`View::concat`].
///
/// Invariant: `start <= position <= limit`. Every read and write is checked
/// against `[position, limit)` and against the storage length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    start: usize,
    position: usize,
    limit: usize,
}

impl View {
    /// Creates a view over the whole of a region of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            start: 0,
            position: 0,
            limit: size,
        }
    }

    /// Creates a view over `[start, limit)` of some storage.
    pub fn with_range(start: usize, limit: usize) -> Result<Self, Error> {
        if start > limit {
            return Err(Error::OutOfBounds);
        }

        Ok(Self {
            start,
            position: start,
            limit,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position == self.limit
    }

    /// advance the cursor without reading.
    pub fn advance(&mut self, size: usize) -> Result<(), Error> {
        if size > self.remaining() {
            return Err(Error::OutOfBounds);
        }

        self.position += size;
        Ok(())
    }

    /// Creates a sub-view of `size` bytes starting `offset` bytes past the
    /// cursor. The sub-view shares storage with its parent.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::view::View;
    ///
    /// let bytes = [0u8, 1, 2, 3, 4, 5, 6, 7];
    /// let view = View::new(bytes.len());
    ///
    /// let body = view.slice(2, 4).unwrap();
    ///
    /// assert_eq!(body.as_slice(&bytes).unwrap(), &[2, 3, 4, 5]);
    /// assert!(view.slice(2, 7).is_err());
    /// ```
    pub fn slice(&self, offset: usize, size: usize) -> Result<View, Error> {
        if offset + size > self.remaining() {
            return Err(Error::OutOfBounds);
        }

        let start = self.position + offset;
        Ok(View {
            start,
            position: start,
            limit: start + size,
        })
    }

    /// the bytes between the cursor and the limit.
    pub fn as_slice<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8], Error> {
        if self.limit > bytes.len() {
            return Err(Error::OutOfBounds);
        }

        Ok(&bytes[self.position..self.limit])
    }

    /// consume `size` bytes, returning them as a slice of the storage.
    pub fn read<'a>(&mut self, bytes: &'a [u8], size: usize) -> Result<&'a [u8], Error> {
        if size > self.remaining() || self.limit > bytes.len() {
            return Err(Error::OutOfBounds);
        }

        let position = self.position;
        self.position += size;
        Ok(&bytes[position..position + size])
    }

    pub fn get_u8(&mut self, bytes: &[u8]) -> Result<u8, Error> {
        Ok(self.read(bytes, 1)?[0])
    }

    /// # Test
    ///
    /// ```
    /// use rtp_codec::view::View;
    ///
    /// let bytes = [0x80u8, 0xC8, 0x00, 0x06];
    /// let mut view = View::new(bytes.len());
    ///
    /// assert_eq!(view.get_u16(&bytes).unwrap(), 0x80C8);
    /// assert_eq!(view.get_u16(&bytes).unwrap(), 6);
    /// assert!(view.get_u16(&bytes).is_err());
    /// ```
    pub fn get_u16(&mut self, bytes: &[u8]) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.read(bytes, 2)?.try_into()?))
    }

    pub fn get_u32(&mut self, bytes: &[u8]) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.read(bytes, 4)?.try_into()?))
    }

    /// write a slice at the cursor, advancing past it.
    ///
    /// The write goes through to the shared storage and is visible to every
    /// other view over the region.
    pub fn write(&mut self, bytes: &mut [u8], data: &[u8]) -> Result<(), Error> {
        if data.len() > self.remaining() || self.limit > bytes.len() {
            return Err(Error::OutOfBounds);
        }

        bytes[self.position..self.position + data.len()].copy_from_slice(data);
        self.position += data.len();
        Ok(())
    }

    pub fn put_u8(&mut self, bytes: &mut [u8], value: u8) -> Result<(), Error> {
        self.write(bytes, &[value])
    }

    pub fn put_u16(&mut self, bytes: &mut [u8], value: u16) -> Result<(), Error> {
        self.write(bytes, &value.to_be_bytes())
    }

    /// # Test
    ///
    /// ```
    /// use rtp_codec::view::View;
    ///
    /// let mut bytes = [0u8; 4];
    /// let mut view = View::new(bytes.len());
    ///
    /// view.put_u32(&mut bytes, 0x80000001).unwrap();
    ///
    /// assert_eq!(&bytes, &[0x80, 0x00, 0x00, 0x01]);
    /// assert!(view.put_u8(&mut bytes, 0).is_err());
    /// ```
    pub fn put_u32(&mut self, bytes: &mut [u8], value: u32) -> Result<(), Error> {
        self.write(bytes, &value.to_be_bytes())
    }

    /// advance the cursor past consecutive zero bytes, stopping at the first
    /// non-zero byte or at the limit.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::view::View;
    ///
    /// let bytes = [0u8, 0, 0xBE, 0xDE];
    /// let mut view = View::new(bytes.len());
    ///
    /// view.consume_padding(&bytes).unwrap();
    ///
    /// assert_eq!(view.position(), 2);
    /// ```
    pub fn consume_padding(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.limit > bytes.len() {
            return Err(Error::OutOfBounds);
        }

        while self.position < self.limit && bytes[self.position] == 0 {
            self.position += 1;
        }

        Ok(())
    }

    /// Copies `[position, limit)` into a fresh owning allocation.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::view::View;
    ///
    /// let bytes = [1u8, 2, 3, 4];
    /// let mut view = View::new(bytes.len());
    /// view.advance(2).unwrap();
    ///
    /// let owned = view.copy(&bytes).unwrap();
    ///
    /// assert_eq!(&owned[..], &[3, 4]);
    /// ```
    pub fn copy(&self, bytes: &[u8]) -> Result<BytesMut, Error> {
        Ok(BytesMut::from(self.as_slice(bytes)?))
    }

    /// Builds a fresh owning allocation holding this view's remaining bytes
    /// followed by `other`. The source storage is left untouched.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::view::View;
    ///
    /// let bytes = [1u8, 2];
    /// let view = View::new(bytes.len());
    ///
    /// let owned = view.concat(&bytes, &[3, 4]).unwrap();
    ///
    /// assert_eq!(&owned[..], &[1, 2, 3, 4]);
    /// ```
    pub fn concat(&self, bytes: &[u8], other: &[u8]) -> Result<BytesMut, Error> {
        let mut buf = BytesMut::with_capacity(self.remaining() + other.len());
        buf.extend_from_slice(self.as_slice(bytes)?);
        buf.extend_from_slice(other);
        Ok(buf)
    }
}
