use std::path::Path;

use fifoprims_transport::{Direction, FifoPort, NamedFifo};

use crate::attempt::Attempt;
use crate::channel::Channel;
use crate::codec::{Decoder, Encoder};
use crate::error::{ChannelError, Result};

type BoxedEncoder<T> = Box<dyn Encoder<T> + Send>;
type BoxedDecoder<T> = Box<dyn Decoder<T> + Send>;

/// A [`Channel`] carrying typed values through encode/decode hooks.
///
/// A producer holds an encoder, a consumer a decoder, a bidirectional
/// endpoint both. Hooks run exactly once per element.
pub struct TypedChannel<T, P = NamedFifo> {
    channel: Channel<P>,
    encoder: Option<BoxedEncoder<T>>,
    decoder: Option<BoxedDecoder<T>>,
}

impl<T> TypedChannel<T, NamedFifo> {
    /// Open `path` write-only. The pipe must already exist.
    pub fn producer(
        path: impl AsRef<Path>,
        element_size: usize,
        encoder: impl Encoder<T> + Send + 'static,
    ) -> Result<Self> {
        let channel = Channel::open(path, Direction::Write, element_size)?;
        Ok(Self::from_channel(channel).with_encoder(encoder))
    }

    /// Open `path` read-only. The pipe must already exist.
    pub fn consumer(
        path: impl AsRef<Path>,
        element_size: usize,
        decoder: impl Decoder<T> + Send + 'static,
    ) -> Result<Self> {
        let channel = Channel::open(path, Direction::Read, element_size)?;
        Ok(Self::from_channel(channel).with_decoder(decoder))
    }

    /// Open `path` read-write with both hooks. The pipe must already exist.
    pub fn producer_consumer(
        path: impl AsRef<Path>,
        element_size: usize,
        encoder: impl Encoder<T> + Send + 'static,
        decoder: impl Decoder<T> + Send + 'static,
    ) -> Result<Self> {
        let channel = Channel::open(path, Direction::ReadWrite, element_size)?;
        Ok(Self::from_channel(channel)
            .with_encoder(encoder)
            .with_decoder(decoder))
    }
}

impl<T, P: FifoPort> TypedChannel<T, P> {
    /// Wrap a channel with no hooks yet.
    pub fn from_channel(channel: Channel<P>) -> Self {
        Self {
            channel,
            encoder: None,
            decoder: None,
        }
    }

    pub fn with_encoder(mut self, encoder: impl Encoder<T> + Send + 'static) -> Self {
        self.encoder = Some(Box::new(encoder));
        self
    }

    pub fn with_decoder(mut self, decoder: impl Decoder<T> + Send + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Make one attempt at sending `value`.
    ///
    /// `value` is encoded only when a new element starts. While an element
    /// is in flight, the value passed on retries is ignored.
    pub fn try_produce(&mut self, value: &T) -> Result<Attempt<()>> {
        let Some(encoder) = self.encoder.as_deref() else {
            return Err(ChannelError::MissingEncoder {
                path: self.channel.path().to_path_buf(),
            });
        };
        self.channel
            .try_write_with(|buf| encoder.encode(value, buf))
    }

    /// Make one attempt at receiving a value.
    pub fn try_consume(&mut self) -> Result<Attempt<T>> {
        let Some(decoder) = self.decoder.as_deref() else {
            return Err(ChannelError::MissingDecoder {
                path: self.channel.path().to_path_buf(),
            });
        };
        self.channel.try_read_with(|buf| decoder.decode(buf))
    }

    pub fn has_encoder(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn channel(&self) -> &Channel<P> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut Channel<P> {
        &mut self.channel
    }

    pub fn into_channel(self) -> Channel<P> {
        self.channel
    }

    pub fn close(&mut self) -> Result<()> {
        self.channel.close()
    }

    pub fn destroy(self) -> Result<()> {
        self.channel.destroy()
    }
}

impl<T, P: FifoPort> std::fmt::Debug for TypedChannel<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedChannel")
            .field("channel", &self.channel)
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}
