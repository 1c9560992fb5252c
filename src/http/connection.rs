use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::http::handlers;
use crate::http::parser::{
    body_framing, decode_body, parse_request_head, wants_continue, BodyFraming, ParseError,
};
use crate::http::request::{BodyError, Method, Request};
use crate::http::response::Response;
use crate::http::writer::{ResponseWriter, CONTINUE};

const READ_CHUNK: usize = 4096;

pub struct Connection<S> {
    stream: S,
    peer: String,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// Outcome of reading one request off the wire.
pub enum Incoming {
    Request(Request),
    /// The request could not be framed; answer and close.
    Rejected(Response),
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(Incoming::Request(req)) => ConnectionState::Processing(req),
                    Some(Incoming::Rejected(response)) => {
                        ConnectionState::Writing(ResponseWriter::new(&response), false)
                    }
                    None => ConnectionState::Closed,
                },

                ConnectionState::Processing(req) => {
                    let (response, keep_alive) = self.handle_request(req);
                    ConnectionState::Writing(ResponseWriter::new(&response), keep_alive)
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        ConnectionState::Reading
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    /// Reads the next request, including its whole body.
    ///
    /// `Ok(None)` means the client closed the connection between requests.
    /// A body cut short by EOF or broken chunk framing still yields a
    /// request, carrying the `BodyError` for the handler to report.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Incoming>> {
        let (mut head, head_len) = loop {
            match parse_request_head(&self.buffer) {
                Ok(parsed) => break parsed,
                Err(ParseError::Incomplete) => {}
                Err(e) => return Ok(Some(self.reject(e))),
            }

            if self.fill_buffer().await? == 0 {
                return Ok(None);
            }
        };
        self.buffer.advance(head_len);

        let framing = match body_framing(&head) {
            Ok(framing) => framing,
            Err(e) => return Ok(Some(self.reject(e))),
        };

        if wants_continue(&head, framing, self.buffer.len()) {
            self.stream.write_all(CONTINUE).await?;
            self.stream.flush().await?;
        }
        head.strip_framing(framing);

        loop {
            match decode_body(&self.buffer, framing) {
                Ok(Some((body, used))) => {
                    self.buffer.advance(used);
                    return Ok(Some(Incoming::Request(head.into_request(Ok(body)))));
                }
                Ok(None) => {}
                Err(e) => {
                    self.buffer.clear();
                    return Ok(Some(Incoming::Request(head.into_request(Err(e)))));
                }
            }

            if self.fill_buffer().await? == 0 {
                let expected = match framing {
                    BodyFraming::Length(n) => Some(n),
                    _ => None,
                };
                let err = BodyError::UnexpectedEof {
                    expected,
                    received: self.buffer.len(),
                };
                return Ok(Some(Incoming::Request(head.into_request(Err(err)))));
            }
        }
    }

    fn handle_request(&self, req: Request) -> (Response, bool) {
        let keep_alive = req.keep_alive();
        let is_head = req.method == Method::HEAD;

        let mut response = handlers::handle(req, &self.peer);
        if !keep_alive {
            response = response.with_header("Connection", "close");
        }
        if is_head {
            response.strip_body();
        }

        (response, keep_alive)
    }

    fn reject(&mut self, err: ParseError) -> Incoming {
        warn!(source_ip = %self.peer, error = %err, "Rejected malformed HTTP request");
        self.buffer.clear();
        Incoming::Rejected(Response::for_parse_error(&err))
    }

    async fn fill_buffer(&mut self) -> std::io::Result<usize> {
        self.buffer.reserve(READ_CHUNK);
        self.stream.read_buf(&mut self.buffer).await
    }
}
