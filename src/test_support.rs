//! Shared fakes for unit tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::llm::{CompletionRequest, CompletionResponse, ModelClient};

/// In-process HTTP endpoint answering every request the same way.
pub(crate) struct FakeEndpoint {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeEndpoint {
    /// Reply with `status` and a JSON `body`.
    pub(crate) async fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::start(Some((status, body.into()))).await
    }

    /// Accept connections and read requests, but never reply.
    pub(crate) async fn silent() -> Self {
        Self::start(None).await
    }

    /// An address nothing is listening on.
    pub(crate) async fn closed() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Self {
            addr,
            requests: Arc::new(Mutex::new(Vec::new())),
            handle: None,
        }
    }

    async fn start(reply: Option<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                captured.lock().unwrap().push(request);

                match &reply {
                    Some((status, body)) => {
                        let response = format!(
                            "HTTP/1.1 {} Fake\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    None => {
                        // Hold the connection open without answering.
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            handle: Some(handle),
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}/v1beta/models/fake:generateContent", self.addr)
    }

    /// Raw requests received so far.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Model client replaying canned replies in order, repeating the last one.
pub(crate) struct ScriptedClient {
    replies: Mutex<Vec<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub(crate) fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub(crate) fn replying(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<String> {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            return replies.remove(0);
        }
        match replies.first() {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(e)) => Err(clone_error(e)),
            None => Err(Error::unexpected_shape("no scripted reply")),
        }
    }
}

fn clone_error(error: &Error) -> Error {
    match error {
        Error::Configuration(m) => Error::Configuration(m.clone()),
        Error::Transport { status, message } => Error::Transport {
            status: *status,
            message: message.clone(),
        },
        Error::UnexpectedResponseShape(m) => Error::UnexpectedResponseShape(m.clone()),
        other => Error::transport(other.to_string()),
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if let Some(message) = request.messages.first() {
            self.prompts.lock().unwrap().push(message.content.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply().map(CompletionResponse::new)
    }
}

/// A well-formed model reply with the given score.
pub(crate) fn report_reply(score: i64) -> String {
    format!(
        r#"{{"reproducibility_score": {}, "limitations": ["No random seed", "No pinned versions"], "suggestions": ["Publish a lockfile"]}}"#,
        score
    )
}
