//! Tokenizer for the engine's diagnostic stream.
//!
//! ffmpeg rewrites its video status line in place with `\r`, so successive
//! reports are not newline separated; audio-only encodes report one line at a
//! time. [`TokenCodec`] covers both with a [`SplitStrategy`], and, like any
//! [`Decoder`], keeps asking for more input until it sees a boundary or the
//! stream ends.

use crate::Error;
use bytes::{Buf, Bytes, BytesMut};
use encodewatch_common::MediaKind;
use tokio_util::codec::Decoder;

/// Longest token accepted before the stream is abandoned.
pub const MAX_TOKEN_LEN: usize = 64 * 1024;

/// Marker that starts every video progress report.
pub const FRAME_MARKER: &[u8] = b"frame=";

/// Where one token ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// A token runs up to the next occurrence of the marker found strictly
    /// after its first byte; the marker starts the following token.
    Marker(&'static [u8]),
    /// A token runs up to the delimiter, which is dropped.
    Delimiter(u8),
}

impl SplitStrategy {
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self::Marker(FRAME_MARKER),
            MediaKind::Audio => Self::Delimiter(b'\n'),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenCodec {
    strategy: SplitStrategy,
    max_length: usize,
    // Bytes already scanned without finding a boundary.
    next_index: usize,
}

impl TokenCodec {
    pub fn new(strategy: SplitStrategy) -> Self {
        Self {
            strategy,
            max_length: MAX_TOKEN_LEN,
            next_index: 0,
        }
    }

    pub fn for_kind(kind: MediaKind) -> Self {
        Self::new(SplitStrategy::for_kind(kind))
    }

    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn strategy(&self) -> SplitStrategy {
        self.strategy
    }

    /// Returns `(token_len, separator_len)` for the first complete token.
    fn boundary(&self, buf: &[u8]) -> Option<(usize, usize)> {
        match self.strategy {
            SplitStrategy::Marker(marker) => {
                // Re-scan the tail of the previous window in case the marker
                // straddled two reads.
                let start = self
                    .next_index
                    .saturating_sub(marker.len().saturating_sub(1))
                    .max(1);
                buf.get(start..)?
                    .windows(marker.len())
                    .position(|w| w == marker)
                    .map(|pos| (start + pos, 0))
            }
            SplitStrategy::Delimiter(delim) => buf
                .get(self.next_index..)?
                .iter()
                .position(|&b| b == delim)
                .map(|pos| (self.next_index + pos, 1)),
        }
    }
}

impl Decoder for TokenCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        match self.boundary(buf) {
            Some((len, _)) if len > self.max_length => Err(Error::TokenTooLong {
                max: self.max_length,
            }),
            Some((len, separator)) => {
                self.next_index = 0;
                let token = buf.split_to(len).freeze();
                buf.advance(separator);
                Ok(Some(token))
            }
            None if buf.len() > self.max_length => Err(Error::TokenTooLong {
                max: self.max_length,
            }),
            None => {
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        if let Some(token) = self.decode(buf)? {
            return Ok(Some(token));
        }
        self.next_index = 0;
        if buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(buf.split().freeze()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    async fn collect(reader: tokio_test::io::Mock, codec: TokenCodec) -> Vec<String> {
        FramedRead::new(reader, codec)
            .map(|token| String::from_utf8(token.unwrap().to_vec()).unwrap())
            .collect()
            .await
    }

    fn decode_all(codec: &mut TokenCodec, input: &[u8]) -> Vec<Bytes> {
        let mut buf = BytesMut::from(input);
        let mut tokens = Vec::new();
        while let Some(token) = codec.decode_eof(&mut buf).unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn strategy_follows_media_kind() {
        assert_eq!(
            SplitStrategy::for_kind(MediaKind::Video),
            SplitStrategy::Marker(b"frame=")
        );
        assert_eq!(
            SplitStrategy::for_kind(MediaKind::Audio),
            SplitStrategy::Delimiter(b'\n')
        );
    }

    #[test]
    fn video_stream_splits_at_each_frame_marker() {
        let mut codec = TokenCodec::for_kind(MediaKind::Video);
        let tokens = decode_all(&mut codec, b"frame=1 a=1\rframe=2 b=2\rframe=3 c=3");
        assert_eq!(
            tokens,
            vec![
                Bytes::from_static(b"frame=1 a=1\r"),
                Bytes::from_static(b"frame=2 b=2\r"),
                Bytes::from_static(b"frame=3 c=3"),
            ]
        );
    }

    #[test]
    fn video_preamble_is_its_own_token() {
        let mut codec = TokenCodec::for_kind(MediaKind::Video);
        let tokens = decode_all(&mut codec, b"Input #0, matroska\nframe=1 x\rframe=2 y");
        assert_eq!(tokens.len(), 3);
        assert_eq!(&tokens[0][..], b"Input #0, matroska\n");
        assert!(tokens[1].starts_with(b"frame=1"));
        assert!(tokens[2].starts_with(b"frame=2"));
    }

    #[test]
    fn video_waits_for_next_marker_before_emitting() {
        let mut codec = TokenCodec::for_kind(MediaKind::Video);
        let mut buf = BytesMut::from(&b"frame=1 time=00:00:01.00"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b" bitrate=1k\rfra");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"me=2");
        let token = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&token[..], b"frame=1 time=00:00:01.00 bitrate=1k\r");
        assert_eq!(&buf[..], b"frame=2");
    }

    #[test]
    fn lines_strip_their_newline() {
        let mut codec = TokenCodec::for_kind(MediaKind::Audio);
        let tokens = decode_all(&mut codec, b"one\ntwo\n\nfour\n");
        assert_eq!(
            tokens,
            vec![
                Bytes::from_static(b"one"),
                Bytes::from_static(b"two"),
                Bytes::from_static(b""),
                Bytes::from_static(b"four"),
            ]
        );
    }

    #[test]
    fn trailing_bytes_form_a_final_token() {
        let mut codec = TokenCodec::for_kind(MediaKind::Audio);
        let tokens = decode_all(&mut codec, b"one\ntail without newline");
        assert_eq!(tokens.len(), 2);
        assert_eq!(&tokens[1][..], b"tail without newline");
    }

    #[test]
    fn oversized_token_is_an_error() {
        let mut codec = TokenCodec::for_kind(MediaKind::Audio).with_max_length(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(Error::TokenTooLong { max: 8 })
        ));
    }

    #[tokio::test]
    async fn video_tokens_survive_tiny_reads() {
        let mut builder = tokio_test::io::Builder::new();
        for chunk in b"frame=1 ... frame=2 ... frame=3 ...".chunks(2) {
            builder.read(chunk);
        }

        let tokens = collect(builder.build(), TokenCodec::for_kind(MediaKind::Video)).await;
        assert_eq!(tokens, vec!["frame=1 ... ", "frame=2 ... ", "frame=3 ..."]);
    }

    #[tokio::test]
    async fn lines_survive_tiny_reads() {
        let input = b"line one\nline two\nline three\n";
        let mut builder = tokio_test::io::Builder::new();
        for chunk in input.chunks(3) {
            builder.read(chunk);
        }

        let tokens = collect(builder.build(), TokenCodec::for_kind(MediaKind::Audio)).await;
        assert_eq!(tokens, vec!["line one", "line two", "line three"]);
    }
}
