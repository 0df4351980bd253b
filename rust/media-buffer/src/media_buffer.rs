//! `MediaBuffer`: a shared chunk of encoded or decoded media together with the
//! metadata a decoder or renderer needs to interpret it.

use std::sync::Arc;

use media_bytes::{AllocationPolicy, Buffer};
use media_common::{Result, error::Error};
use media_common_traits::memory_owner::MemoryOwner;

use crate::{
    decrypt_config::DecryptConfig,
    time::{DiscardPadding, TimeDelta},
};

/// A reference-counted media buffer: payload bytes, optional side data and
/// per-buffer metadata (timestamp, duration, key frame flag, discard padding,
/// decryption parameters).
///
/// Cloning a `MediaBuffer` shares the same instance; the storage is released
/// when the last clone is dropped. Shared instances may be read from any number
/// of threads at once.
///
/// # Memory layout
///
/// The payload of a buffer created by this type is allocated as
/// `data_size() + PADDING_SIZE` bytes, starting on an `ALIGNMENT` boundary,
/// and the trailing `PADDING_SIZE` bytes are zero. SIMD decoders may therefore
/// read up to `PADDING_SIZE` bytes past the end of [`MediaBuffer::data`]
/// through [`MediaBuffer::padded_data`]. The padding is never part of
/// `data_size()` and never takes part in comparisons.
///
/// Buffers wrapping external memory ([`MediaBuffer::from_external`]) only
/// carry the padding their owner provides.
///
/// # End of stream
///
/// [`MediaBuffer::end_of_stream`] builds a distinguished instance that carries
/// no payload and no metadata. Apart from [`MediaBuffer::is_end_of_stream`],
/// [`MediaBuffer::matches`] and [`MediaBuffer::describe`], every accessor
/// panics on it. A buffer copied from an empty slice is *not* an end-of-stream
/// buffer.
///
/// # Mutation
///
/// Metadata is set while building the buffer (`with_*` methods). Afterwards
/// only the timestamp, the side data and the payload of a buffer created with
/// [`MediaBuffer::with_size`] can be changed, all through `&mut self`. If the
/// instance is shared at that point it is detached first: the other holders
/// keep the unmodified buffer. The payload bytes are copied only when they are
/// written to.
#[derive(Clone)]
pub struct MediaBuffer(Arc<Body>);

#[derive(Clone)]
enum Body {
    EndOfStream,
    Frame(Frame),
}

#[derive(Clone)]
struct Frame {
    data: Buffer,
    side_data: Option<Buffer>,
    timestamp: TimeDelta,
    duration: TimeDelta,
    is_key_frame: bool,
    discard_padding: DiscardPadding,
    decrypt_config: Option<Box<DecryptConfig>>,
}

impl MediaBuffer {
    /// Number of zero bytes allocated past the end of the payload.
    pub const PADDING_SIZE: usize = 64;

    /// Alignment of the first payload byte.
    pub const ALIGNMENT: usize = 32;

    /// Layout of every payload allocated by `MediaBuffer`.
    pub const ALLOCATION_POLICY: AllocationPolicy =
        AllocationPolicy::padded(Self::PADDING_SIZE, Self::ALIGNMENT);

    /// Layout of side data, which has no padding or alignment requirement.
    pub const SIDE_DATA_POLICY: AllocationPolicy = AllocationPolicy::UNPADDED;

    /// Creates a buffer with `size` bytes of payload, all zero, to be filled in
    /// through [`MediaBuffer::data_mut`].
    pub fn with_size(size: usize) -> MediaBuffer {
        Self::from_storage(Buffer::allocate(size, Self::ALLOCATION_POLICY), None)
    }

    /// Creates a buffer holding a copy of `data`.
    pub fn copy_from(data: &[u8]) -> MediaBuffer {
        Self::from_storage(Self::copy_payload(data), None)
    }

    /// Creates a buffer holding a copy of `data` and of `side_data`.
    pub fn copy_from_with_side_data(data: &[u8], side_data: &[u8]) -> MediaBuffer {
        Self::from_storage(Self::copy_payload(data), Self::copy_side_data(side_data))
    }

    /// Creates a buffer from a payload described as optional bytes plus a declared
    /// size, the way demuxers hand them over.
    ///
    /// `None` with a zero size yields a valid, empty, non end-of-stream buffer.
    /// Only the first `size` bytes of `data` are copied.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `size > 0` and `data` is `None` or shorter than `size`.
    /// This always indicates a bug in the producer of the data.
    pub fn copy_from_declared(data: Option<&[u8]>, size: usize) -> Result<MediaBuffer> {
        let data = declared_bytes("data", data, size)?;
        Ok(Self::copy_from(data))
    }

    /// Same as [`MediaBuffer::copy_from_declared`], with side data described the
    /// same way.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if either region is declared non-empty but is missing or
    /// shorter than declared.
    pub fn copy_from_declared_with_side_data(
        data: Option<&[u8]>,
        size: usize,
        side_data: Option<&[u8]>,
        side_data_size: usize,
    ) -> Result<MediaBuffer> {
        let data = declared_bytes("data", data, size)?;
        let side_data = declared_bytes("side_data", side_data, side_data_size)?;
        Ok(Self::copy_from_with_side_data(data, side_data))
    }

    /// Creates the end-of-stream marker.
    pub fn end_of_stream() -> MediaBuffer {
        MediaBuffer(Arc::new(Body::EndOfStream))
    }

    /// Creates a buffer over memory that belongs to `owner`, without copying.
    ///
    /// The payload is the owner's memory (`len` bytes); the buffer keeps the owner
    /// alive and drops it together with the last clone. Only the padding reported
    /// by the owner may be read past the end.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the owner's memory is empty.
    pub fn from_external(owner: Arc<dyn MemoryOwner + Send + Sync + 'static>) -> Result<MediaBuffer> {
        let len = owner.memory().len;
        if len == 0 {
            log::error!("refusing to wrap an empty external memory block");
            return Err(Error::invalid_arg("owner", "external memory must not be empty"));
        }
        log::trace!("wrapping {len} bytes of external memory");
        Ok(Self::from_storage(Buffer::from_owner(owner), None))
    }

    /// Sets the presentation timestamp while building the buffer.
    pub fn with_timestamp(mut self, timestamp: TimeDelta) -> MediaBuffer {
        self.frame_mut("timestamp").timestamp = timestamp;
        self
    }

    /// Sets the duration while building the buffer.
    pub fn with_duration(mut self, duration: TimeDelta) -> MediaBuffer {
        self.frame_mut("duration").duration = duration;
        self
    }

    /// Sets the key frame flag while building the buffer.
    pub fn with_key_frame(mut self, is_key_frame: bool) -> MediaBuffer {
        self.frame_mut("is_key_frame").is_key_frame = is_key_frame;
        self
    }

    /// Sets the discard padding while building the buffer.
    pub fn with_discard_padding(mut self, discard_padding: DiscardPadding) -> MediaBuffer {
        self.frame_mut("discard_padding").discard_padding = discard_padding;
        self
    }

    /// Attaches the decryption parameters while building the buffer.
    pub fn with_decrypt_config(mut self, decrypt_config: DecryptConfig) -> MediaBuffer {
        self.frame_mut("decrypt_config").decrypt_config = Some(Box::new(decrypt_config));
        self
    }

    /// Returns `true` for the end-of-stream marker.
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(*self.0, Body::EndOfStream)
    }

    /// Returns the payload, without padding.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.frame("data").data.as_slice()
    }

    /// Returns the payload followed by its readable padding.
    #[inline]
    pub fn padded_data(&self) -> &[u8] {
        self.frame("data").data.as_padded_slice()
    }

    /// Returns the trailing padding of the payload.
    pub fn padding(&self) -> &[u8] {
        let data = &self.frame("padding").data;
        &data.as_padded_slice()[data.len()..]
    }

    /// Returns the payload storage, for handing it on without a copy.
    pub fn data_buffer(&self) -> &Buffer {
        &self.frame("data").data
    }

    #[inline]
    pub fn data_size(&self) -> usize {
        self.frame("data_size").data.len()
    }

    /// Returns the number of bytes allocated for the payload, padding included.
    pub fn allocated_size(&self) -> usize {
        self.frame("allocated_size").data.capacity()
    }

    /// Returns `true` if the payload lives in externally owned memory.
    pub fn is_external(&self) -> bool {
        self.frame("is_external").data.is_external()
    }

    /// Returns the side data; empty if there is none.
    #[inline]
    pub fn side_data(&self) -> &[u8] {
        self.frame("side_data")
            .side_data
            .as_ref()
            .map(Buffer::as_slice)
            .unwrap_or_default()
    }

    #[inline]
    pub fn side_data_size(&self) -> usize {
        self.frame("side_data_size")
            .side_data
            .as_ref()
            .map_or(0, Buffer::len)
    }

    #[inline]
    pub fn timestamp(&self) -> TimeDelta {
        self.frame("timestamp").timestamp
    }

    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.frame("duration").duration
    }

    #[inline]
    pub fn is_key_frame(&self) -> bool {
        self.frame("is_key_frame").is_key_frame
    }

    #[inline]
    pub fn discard_padding(&self) -> DiscardPadding {
        self.frame("discard_padding").discard_padding
    }

    pub fn decrypt_config(&self) -> Option<&DecryptConfig> {
        self.frame("decrypt_config").decrypt_config.as_deref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.decrypt_config().is_some()
    }

    /// Returns the payload for writing.
    ///
    /// Meant for filling a buffer created with [`MediaBuffer::with_size`] before it
    /// is handed to other holders. Shared or external payloads are copied into a
    /// private padded block first.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.frame_mut("data")
            .data
            .make_mut(Self::ALLOCATION_POLICY)
    }

    /// Changes the timestamp.
    ///
    /// # Panics
    ///
    /// Panics on the end-of-stream marker.
    pub fn set_timestamp(&mut self, timestamp: TimeDelta) {
        self.frame_mut("timestamp").timestamp = timestamp;
    }

    /// Replaces the side data with a copy of `side_data`. An empty slice removes
    /// the side data.
    pub fn set_side_data(&mut self, side_data: &[u8]) {
        log::trace!("replacing side data with {} bytes", side_data.len());
        self.frame_mut("side_data").side_data = Self::copy_side_data(side_data);
    }

    /// Replaces the side data with the first `size` bytes of `side_data`.
    ///
    /// A zero `size` removes the side data, whatever `side_data` holds.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `size > 0` and `side_data` is `None` or shorter than
    /// `size`. The buffer is left untouched.
    pub fn set_side_data_declared(&mut self, side_data: Option<&[u8]>, size: usize) -> Result<()> {
        if size == 0 {
            self.clear_side_data();
            return Ok(());
        }
        let side_data = declared_bytes("side_data", side_data, size)?;
        self.set_side_data(side_data);
        Ok(())
    }

    /// Removes the side data.
    pub fn clear_side_data(&mut self) {
        self.frame_mut("side_data").side_data = None;
    }

    /// Compares two buffers field by field, for tests.
    ///
    /// Two end-of-stream markers always match. Otherwise the metadata, the sizes,
    /// the payload and side data bytes (padding excluded) and the decryption
    /// parameters must all be equal.
    pub fn matches(&self, other: &MediaBuffer) -> bool {
        let (lhs, rhs) = match (&*self.0, &*other.0) {
            (Body::EndOfStream, Body::EndOfStream) => return true,
            (Body::Frame(lhs), Body::Frame(rhs)) => (lhs, rhs),
            _ => return false,
        };

        if lhs.timestamp != rhs.timestamp
            || lhs.duration != rhs.duration
            || lhs.is_key_frame != rhs.is_key_frame
            || lhs.discard_padding != rhs.discard_padding
            || self.data_size() != other.data_size()
            || self.side_data_size() != other.side_data_size()
        {
            return false;
        }

        if self.data() != other.data() || self.side_data() != other.side_data() {
            return false;
        }

        match (&lhs.decrypt_config, &rhs.decrypt_config) {
            (Some(lhs), Some(rhs)) => lhs.matches(rhs),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns a one-line description for logs and test failures.
    ///
    /// `"EOS"` for the end-of-stream marker. The format is not meant to be parsed.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    fn from_storage(data: Buffer, side_data: Option<Buffer>) -> MediaBuffer {
        MediaBuffer(Arc::new(Body::Frame(Frame {
            data,
            side_data,
            timestamp: TimeDelta::ZERO,
            duration: TimeDelta::ZERO,
            is_key_frame: false,
            discard_padding: DiscardPadding::default(),
            decrypt_config: None,
        })))
    }

    fn copy_payload(data: &[u8]) -> Buffer {
        Buffer::copy_from_slice(data, Self::ALLOCATION_POLICY)
    }

    fn copy_side_data(side_data: &[u8]) -> Option<Buffer> {
        (!side_data.is_empty()).then(|| Buffer::copy_from_slice(side_data, Self::SIDE_DATA_POLICY))
    }

    #[inline]
    #[track_caller]
    fn frame(&self, field: &str) -> &Frame {
        match &*self.0 {
            Body::Frame(frame) => frame,
            Body::EndOfStream => end_of_stream_access(field),
        }
    }

    #[track_caller]
    fn frame_mut(&mut self, field: &str) -> &mut Frame {
        if self.is_end_of_stream() {
            end_of_stream_access(field);
        }
        match Arc::make_mut(&mut self.0) {
            Body::Frame(frame) => frame,
            Body::EndOfStream => end_of_stream_access(field),
        }
    }
}

impl std::fmt::Display for MediaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = match &*self.0 {
            Body::EndOfStream => return f.write_str("EOS"),
            Body::Frame(frame) => frame,
        };
        write!(
            f,
            "timestamp={} duration={} size={} side_data_size={} is_key_frame={} \
             encrypted={} discard_padding (us)=({}, {})",
            frame.timestamp.in_microseconds(),
            frame.duration.in_microseconds(),
            self.data_size(),
            self.side_data_size(),
            frame.is_key_frame,
            frame.decrypt_config.is_some(),
            frame.discard_padding.front.in_microseconds(),
            frame.discard_padding.back.in_microseconds(),
        )?;
        if let Some(decrypt_config) = &frame.decrypt_config {
            write!(f, " decrypt={decrypt_config}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MediaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.0 {
            Body::EndOfStream => f.write_str("MediaBuffer(EOS)"),
            Body::Frame(frame) => f
                .debug_struct("MediaBuffer")
                .field("timestamp", &frame.timestamp)
                .field("duration", &frame.duration)
                .field("size", &frame.data.len())
                .field("side_data_size", &self.side_data_size())
                .field("is_key_frame", &frame.is_key_frame)
                .field("discard_padding", &frame.discard_padding)
                .field("decrypt_config", &frame.decrypt_config)
                .field("external", &frame.data.is_external())
                .finish_non_exhaustive(),
        }
    }
}

/// Resolves a declared `(data, size)` pair into the first `size` bytes of `data`.
fn declared_bytes<'a>(name: &str, data: Option<&'a [u8]>, size: usize) -> Result<&'a [u8]> {
    match data {
        Some(data) if data.len() >= size => Ok(&data[..size]),
        None if size == 0 => Ok(&[]),
        Some(data) => {
            log::error!(
                "{name} declares {size} bytes but only {} are present",
                data.len()
            );
            Err(Error::invalid_arg(name, format!("{size} bytes declared, {} present", data.len())))
        }
        None => {
            log::error!("{name} declares {size} bytes but carries no data");
            Err(Error::invalid_arg(name, format!("{size} bytes declared, no data")))
        }
    }
}

#[cold]
#[track_caller]
fn end_of_stream_access(field: &str) -> ! {
    panic!("`{field}` accessed on an end-of-stream buffer")
}
