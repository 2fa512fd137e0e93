//! Leading header detection and sample-rate extraction

use bytes::{Bytes, BytesMut};
use tracing::debug;

/// Metadata parsed once from the front of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub sample_rate: u32,
}

/// Strips the fixed-size leading block from the stream and reads the
/// sample rate out of it.
///
/// Aligned spans are buffered until a full header is available, spanning
/// chunk boundaries if needed; nothing reaches the decoder before then.
/// After the single successful parse the extractor is a passthrough.
pub struct HeaderExtractor {
    header_len: usize,
    rate_offset: usize,
    pending: BytesMut,
    header: Option<StreamHeader>,
}

impl HeaderExtractor {
    pub fn new(header_len: usize, rate_offset: usize) -> Self {
        debug_assert!(rate_offset + 4 <= header_len);
        Self {
            header_len,
            rate_offset,
            pending: BytesMut::new(),
            header: None,
        }
    }

    /// Feed one aligned span.
    ///
    /// Returns the parsed header on the call that completes it, plus the
    /// bytes left over after the header. Before that point every span is
    /// consumed whole and the returned remainder is empty; after it the
    /// span comes straight back.
    pub fn extract(&mut self, span: Bytes) -> (Option<StreamHeader>, Bytes) {
        if self.header.is_some() {
            return (None, span);
        }

        self.pending.extend_from_slice(&span);
        if self.pending.len() < self.header_len {
            return (None, Bytes::new());
        }

        let block = self.pending.split_to(self.header_len);
        let at = self.rate_offset;
        let sample_rate = u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]]);
        let header = StreamHeader { sample_rate };
        self.header = Some(header);
        debug!("Parsed {}-byte stream header: {} Hz", self.header_len, sample_rate);

        (Some(header), self.pending.split().freeze())
    }

    /// The header, once one has parsed.
    pub fn header(&self) -> Option<StreamHeader> {
        self.header
    }

    /// Bytes buffered while waiting for a complete header.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(sample_rate: u32) -> Vec<u8> {
        let mut block = vec![0u8; 44];
        block[24..28].copy_from_slice(&sample_rate.to_le_bytes());
        block
    }

    #[test]
    fn exact_header_parses_with_empty_remainder() {
        let mut extractor = HeaderExtractor::new(44, 24);
        let (header, rest) = extractor.extract(Bytes::from(header_bytes(24000)));
        assert_eq!(header, Some(StreamHeader { sample_rate: 24000 }));
        assert!(rest.is_empty());
    }

    #[test]
    fn header_split_across_spans_is_buffered() {
        let block = header_bytes(48000);
        let mut extractor = HeaderExtractor::new(44, 24);

        let (header, rest) = extractor.extract(Bytes::copy_from_slice(&block[..10]));
        assert_eq!(header, None);
        assert!(rest.is_empty());
        assert_eq!(extractor.pending_len(), 10);

        let (header, rest) = extractor.extract(Bytes::copy_from_slice(&block[10..]));
        assert_eq!(header, Some(StreamHeader { sample_rate: 48000 }));
        assert!(rest.is_empty());
    }

    #[test]
    fn bytes_past_the_header_come_back_as_remainder() {
        let mut data = header_bytes(22050);
        data.extend_from_slice(&[9, 9, 9, 9]);
        let mut extractor = HeaderExtractor::new(44, 24);

        let (header, rest) = extractor.extract(Bytes::from(data));
        assert_eq!(header.map(|h| h.sample_rate), Some(22050));
        assert_eq!(&rest[..], &[9, 9, 9, 9]);
    }

    #[test]
    fn extractor_is_a_passthrough_after_parsing() {
        let mut extractor = HeaderExtractor::new(44, 24);
        extractor.extract(Bytes::from(header_bytes(24000)));

        let (header, rest) = extractor.extract(Bytes::from_static(&[1, 2, 3, 4]));
        assert_eq!(header, None);
        assert_eq!(&rest[..], &[1, 2, 3, 4]);
        assert_eq!(extractor.header().map(|h| h.sample_rate), Some(24000));
    }

    #[test]
    fn short_stream_never_produces_a_header() {
        let mut extractor = HeaderExtractor::new(44, 24);
        let (header, rest) = extractor.extract(Bytes::from_static(&[0u8; 20]));
        assert_eq!(header, None);
        assert!(rest.is_empty());
        assert_eq!(extractor.pending_len(), 20);
        assert_eq!(extractor.header(), None);
    }
}
