use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
    /// The stream ended in the middle of an event.
    UnexpectedEof,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is delivered. Comment lines and the other fields
/// (`event`, `id`, `retry`) are skipped, and multiple `data` lines of one
/// event are joined with a line feed.
///
/// Chunks may split the stream at any byte, so bytes are buffered and only
/// complete events are decoded as UTF-8.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: vec![],
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Parse buffered data first, the last chunk may have carried
            // more than one event.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // Trailing line breaks are fine, anything else is a cut-off
                // event.
                if self.buf.iter().all(|b| matches!(b, b'\r' | b'\n')) {
                    return Ok(None);
                }
                debug!("stream ended with {} unparsed bytes", self.buf.len());
                return Err(Error::UnexpectedEof);
            };
            self.buf.extend_from_slice(&bytes);
            if self.buf.contains(&b'\r') {
                // The service terminates lines with CRLF. A CR at the very
                // end stays until its LF arrives with the next chunk.
                strip_crlf(&mut self.buf);
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / lf )
        while let Some(eol_idx) = self.buf.windows(2).position(|w| w == b"\n\n")
        {
            let Ok(event) = str::from_utf8(&self.buf[0..eol_idx]) else {
                return Err(Error::InvalidPayload);
            };

            let mut data: Option<String> = None;
            for line in event.split('\n') {
                if line.starts_with(':') {
                    continue;
                }
                let Some((name, value)) = line.split_once(':') else {
                    return Err(Error::InvalidPayload);
                };
                if name != "data" {
                    trace!("skipping sse field: {name}");
                    continue;
                }
                let value = value.strip_prefix(' ').unwrap_or(value);
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            // Consume the bytes from the buffer.
            self.buf.drain(0..eol_idx + 2);

            if data.is_some() {
                return Ok(data);
            }
        }
        Ok(None)
    }
}

/// Replaces every CR LF pair in `buf` with a single LF, in place.
fn strip_crlf(buf: &mut Vec<u8>) {
    let mut write_idx = 0;
    for read_idx in 0..buf.len() {
        let byte = buf[read_idx];
        if byte == b'\r' && buf.get(read_idx + 1) == Some(&b'\n') {
            continue;
        }
        buf[write_idx] = byte;
        write_idx += 1;
    }
    buf.truncate(write_idx);
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn test_normal_events() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: hello\n\n"),
                Bytes::from_static(b"data: bye\n\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data:"),
                Bytes::from_static(b" hello\n"),
                Bytes::from_static(b"\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_crlf_events() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: {\"a\":1}\r"),
                Bytes::from_static(b"\n\r\ndata: {\"a\":2}\r\n\r\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "{\"a\":1}");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "{\"a\":2}");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_skipped_fields() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(
                b": keep-alive\n\nevent: message\nid: 7\ndata: a\ndata: b\n\n",
            )]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "a\nb");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: caf\xC3"),
                Bytes::from_static(b"\xA9 \xE2\x80"),
                Bytes::from_static(b"\x9Cs\xE2\x80\x9D\n\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "café “s”");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cut_off_stream() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: {\"text\":\"AI tutors\"}\n\n"),
                Bytes::from_static(b"data: {\"text\":\" adapt les"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(
            sse.next_event().await.unwrap().unwrap(),
            "{\"text\":\"AI tutors\"}"
        );
        assert_eq!(sse.next_event().await.unwrap_err(), Error::UnexpectedEof);

        // Trailing line breaks after the last event are not a cut-off.
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"data: bye\r\n\r\n\r\n")].into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"xxxxxx\n\n")].into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"xxxxxx\n")].into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::UnexpectedEof);

        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: hello\n"),
                Bytes::from_static(b"data: bye\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::UnexpectedEof);

        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(&[b'd', b'a', 0xff, b'\n', b'\n'])].into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);
    }
}
