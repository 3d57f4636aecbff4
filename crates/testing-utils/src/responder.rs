//! A minimal HTTP responder whose replies are released by the test.
//!
//! Mirrors the shape of a channel-fed mock transport: every incoming request
//! parks until the test supplies a body via `release`, which lets tests
//! observe profiles in their running state before any terminal transition.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct HoldingResponder {
    addr: SocketAddr,
    body_tx: mpsc::UnboundedSender<Vec<u8>>,
    accept_loop: JoinHandle<()>,
}

impl HoldingResponder {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (body_tx, body_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let body_rx = Arc::new(tokio::sync::Mutex::new(body_rx));

        let accept_loop = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let body_rx = Arc::clone(&body_rx);
                tokio::spawn(async move {
                    // drain the request head before parking on the channel
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => {
                                request.extend_from_slice(&buf[..n]);
                                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                    break;
                                }
                            }
                        }
                    }

                    let body = body_rx.lock().await.recv().await;
                    let Some(body) = body else { return };

                    let head = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.write_all(&body).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            addr,
            body_tx,
            accept_loop,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Releases exactly one parked request with the given body.
    pub fn release(&self, body: &[u8]) {
        let _ = self.body_tx.send(body.to_vec());
    }
}

impl Drop for HoldingResponder {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}
