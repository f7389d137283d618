use std::path::{Path, PathBuf};
use std::{pin, task};

use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::header::HOST;
use hyper::{Request, Response, Uri};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tower::ServiceExt;

use super::decode::LineDecoder;
use super::{Error, Result};

#[derive(Debug, Clone)]
pub(super) struct UnixConnector {
    path: PathBuf,
}

impl UnixConnector {
    pub(super) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

impl tower::Service<Uri> for UnixConnector {
    type Response = TokioIo<tokio::net::UnixStream>;

    type Error = std::io::Error;

    type Future = pin::Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Uri) -> Self::Future {
        let path = self.path.clone();
        Box::pin(async move {
            let stream = tokio::net::UnixStream::connect(path).await?;

            Ok(TokioIo::new(stream))
        })
    }
}

/// Issues a `GET` request on a fresh connection and returns the response if its status
/// signals success.
pub(super) async fn get(connector: &UnixConnector, path: &str) -> Result<Response<Incoming>> {
    log::trace!("GET {} via {}", path, connector.path().display());
    let io = connector
        .clone()
        .oneshot(Uri::from_static("http://docker"))
        .await
        .map_err(|source| Error::SocketConnect {
            path: connector.path().to_path_buf(),
            source,
        })?;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(Error::Handshake)?;
    tokio::spawn(async move {
        if let Err(err) = conn.await {
            log::debug!("docker connection closed: {}", err);
        }
    });

    let request = Request::get(path)
        .header(HOST, "docker")
        .body(Empty::<Bytes>::new())?;
    let response = sender
        .send_request(request)
        .await
        .map_err(|source| Error::Send {
            path: path.to_owned(),
            source,
        })?;

    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = read_body(path, response.into_body()).await?;
    Err(Error::Status {
        path: path.to_owned(),
        status,
        message: error_message(&body),
    })
}

/// Issues a `GET` request and decodes the complete response body as JSON.
pub(super) async fn get_json<T: DeserializeOwned>(
    connector: &UnixConnector,
    path: &str,
) -> Result<T> {
    let response = get(connector, path).await?;
    let body = read_body(path, response.into_body()).await?;
    serde_json::from_slice(&body).map_err(|source| Error::Decode {
        path: path.to_owned(),
        source,
    })
}

/// Issues a streaming `GET` request and forwards every newline-delimited JSON message,
/// mapped through `convert`, into the returned channel.
///
/// Messages that fail to decode or that `convert` rejects are skipped.
pub(super) async fn get_stream<T, U, F>(
    connector: &UnixConnector,
    path: &str,
    buffer: usize,
    convert: F,
) -> Result<mpsc::Receiver<U>>
where
    T: DeserializeOwned + Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Option<U> + Send + 'static,
{
    let response = get(connector, path).await?;
    let (tx, rx) = mpsc::channel(buffer);
    let path = path.to_owned();
    tokio::spawn(async move {
        forward_stream(&path, response.into_body(), tx, convert).await;
        log::debug!("stream `{}` ended", path);
    });

    Ok(rx)
}

async fn forward_stream<T, U, F>(path: &str, mut body: Incoming, tx: mpsc::Sender<U>, convert: F)
where
    T: DeserializeOwned + Send,
    F: Fn(T) -> Option<U>,
{
    let mut decoder = LineDecoder::default();
    loop {
        let frame = tokio::select! {
            _ = tx.closed() => return,
            frame = body.frame() => frame,
        };
        let frame = match frame {
            None => return,
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                log::warn!("failed to read stream `{}`: {}", path, err);
                return;
            }
        };
        let Ok(data) = frame.into_data() else {
            continue;
        };

        decoder.push(&data);
        while let Some(line) = decoder.next_line() {
            let Some(item) = decode_line(path, &line, &convert) else {
                continue;
            };
            if tx.send(item).await.is_err() {
                return;
            }
        }
    }
}

/// Decodes one stream line. Blank lines, undecodable messages and messages rejected by
/// `convert` yield `None`.
fn decode_line<T, U, F>(path: &str, line: &[u8], convert: &F) -> Option<U>
where
    T: DeserializeOwned,
    F: Fn(T) -> Option<U>,
{
    if line.is_empty() {
        return None;
    }
    match serde_json::from_slice::<T>(line) {
        Ok(message) => convert(message),
        Err(err) => {
            log::warn!("failed to decode message of `{}`: {}", path, err);
            None
        }
    }
}

async fn read_body(path: &str, body: Incoming) -> Result<Bytes> {
    Ok(body
        .collect()
        .await
        .map_err(|source| Error::Body {
            path: path.to_owned(),
            source,
        })?
        .to_bytes())
}

/// Extracts the daemon's error message from an error response body.
fn error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorResponse {
        message: String,
    }

    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(response) => response.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    }
}
