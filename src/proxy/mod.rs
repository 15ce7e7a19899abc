//! Upstream forwarding
//!
//! Every upstream-backed endpoint goes through [`forwarder::forward`]; the
//! exercise and auth modules only decide URL, headers and error mapping.

pub mod auth;
pub mod exercises;
pub mod forwarder;

pub use forwarder::{forward, upstream_url, ForwardError, ForwardRequest, UpstreamResponse};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{test_config, AppState};
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::Response;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    pub fn state_for(exercise_base: &str, auth_base: &str) -> AppState {
        AppState::new(&test_config(exercise_base, auth_base, ".")).unwrap()
    }

    pub async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    /// Base URL of an upstream that answers `status` with a body cut short:
    /// `Content-Length: 100` is declared, 10 bytes are sent, then the
    /// connection closes.
    pub async fn truncated_body_base(status: u16) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                read_request(&mut stream).await;
                let head = format!("HTTP/1.1 {status} X\r\nContent-Length: 100\r\n\r\n");
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(b"0123456789").await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{addr}")
    }

    /// Consume headers and the declared body so closing does not reset
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(n) = stream.read(&mut chunk).await else { return };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            let Some(end) = text.find("\r\n\r\n") else { continue };
            let declared = text[..end]
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + declared {
                return;
            }
        }
    }

    /// Base URL of a local port with no listener
    pub fn dead_base() -> String {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        format!("http://127.0.0.1:{port}")
    }
}
