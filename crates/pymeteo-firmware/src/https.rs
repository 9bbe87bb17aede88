//! Bot API requests over TLS with `reqwless`.
//!
//! Every request opens a fresh connection. A body larger than
//! [`BODY_BUFFER`] is cut short rather than failing the request, so an
//! oversized update decodes as unreadable instead of an I/O fault.

use alloc::vec::Vec;

use embassy_net::Stack;
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embedded_io_async::Read;
use esp_hal::rng::Rng;
use log::warn;
use pymeteo_core::telegram::{HttpClient, HttpResponse};
use pymeteo_core::transport::TransportError;
use reqwless::client::{HttpClient as TlsHttpClient, TlsConfig, TlsVerify};
use reqwless::headers::ContentType;
use reqwless::request::{Method, RequestBuilder};

/// Largest TLS record plus overhead.
pub const TLS_READ_BUFFER: usize = 16_640;
pub const TLS_WRITE_BUFFER: usize = 4_096;
/// Status line and headers.
pub const HEADER_BUFFER: usize = 2_048;
/// Room for one update carrying a 4096-character message plus the message it
/// replies to.
pub const BODY_BUFFER: usize = 32_768;

pub type TcpState = TcpClientState<1, 4096, 4096>;

/// Working memory for one connection at a time.
pub struct HttpsBuffers {
    pub tls_read: [u8; TLS_READ_BUFFER],
    pub tls_write: [u8; TLS_WRITE_BUFFER],
    pub header: [u8; HEADER_BUFFER],
    pub body: [u8; BODY_BUFFER],
}

impl HttpsBuffers {
    pub const fn new() -> Self {
        Self {
            tls_read: [0; TLS_READ_BUFFER],
            tls_write: [0; TLS_WRITE_BUFFER],
            header: [0; HEADER_BUFFER],
            body: [0; BODY_BUFFER],
        }
    }
}

impl Default for HttpsBuffers {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HttpsClient<'d> {
    stack: Stack<'d>,
    tcp_state: &'d TcpState,
    buffers: &'d mut HttpsBuffers,
    rng: Rng,
}

fn io_error<E: core::fmt::Debug>(context: &'static str) -> impl FnOnce(E) -> TransportError {
    move |e| {
        log::error!("HTTPS {} failed: {:?}", context, e);
        TransportError::io(context)
    }
}

impl<'d> HttpsClient<'d> {
    pub fn new(
        stack: Stack<'d>,
        tcp_state: &'d TcpState,
        buffers: &'d mut HttpsBuffers,
        rng: Rng,
    ) -> Self {
        Self {
            stack,
            tcp_state,
            buffers,
            rng,
        }
    }

    async fn request(
        &mut self,
        method: Method,
        url: &str,
        form: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        let tcp = TcpClient::new(self.stack, self.tcp_state);
        let dns = DnsSocket::new(self.stack);
        let seed = u64::from(self.rng.random()) << 32 | u64::from(self.rng.random());
        let HttpsBuffers {
            tls_read,
            tls_write,
            header,
            body,
        } = &mut *self.buffers;
        let tls = TlsConfig::new(seed, tls_read, tls_write, TlsVerify::None);
        let mut client = TlsHttpClient::new_with_tls(&tcp, &dns, tls);

        let request = client
            .request(method, url)
            .await
            .map_err(io_error("connect"))?;
        let mut request = match form {
            Some(body) => request
                .body(body.as_bytes())
                .content_type(ContentType::ApplicationXWwwFormUrlencoded),
            None => request.body(&[][..]),
        };

        let reply = request.send(header).await.map_err(io_error("request"))?;
        let status = reply.status.0;

        let mut reader = reply.body().reader();
        let mut filled = 0;
        while filled < body.len() {
            match reader
                .read(&mut body[filled..])
                .await
                .map_err(io_error("read body"))?
            {
                0 => break,
                n => filled += n,
            }
        }
        if filled == body.len() {
            warn!("Response body reached {} bytes, keeping only the start", BODY_BUFFER);
        }

        Ok(HttpResponse {
            status,
            body: Vec::from(&body[..filled]),
        })
    }
}

impl HttpClient for HttpsClient<'_> {
    async fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        self.request(Method::GET, url, None).await
    }

    async fn post_form(&mut self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        self.request(Method::POST, url, Some(body)).await
    }
}
