// src/cert/stream.rs
use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};

use super::source::CertificateSource;

/// Certificate data returned by the resolver. Dropping it closes the file.
#[derive(Debug)]
pub struct CertStream {
    source: CertificateSource,
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    File(File),
    Body(Cursor<Bytes>),
}

impl CertStream {
    pub(crate) fn from_file(source: CertificateSource, file: File) -> Self {
        Self {
            source,
            inner: Inner::File(file),
        }
    }

    pub(crate) fn from_body(source: CertificateSource, body: Bytes) -> Self {
        Self {
            source,
            inner: Inner::Body(Cursor::new(body)),
        }
    }

    pub fn source(&self) -> &CertificateSource {
        &self.source
    }
}

impl AsyncRead for CertStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::File(file) => Pin::new(file).poll_read(cx, buf),
            Inner::Body(body) => Pin::new(body).poll_read(cx, buf),
        }
    }
}
