//! A one-shot HTTP server answering with a canned response.

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{SocketAddr, TcpListener},
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};

/// Serves exactly one request, then exits.
pub struct CannedServer {
    addr: SocketAddr,
    request_line: Arc<Mutex<Option<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl CannedServer {
    /// Start a server that replies with `status` and a JSON `body`.
    pub fn start(status: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let request_line = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&request_line);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).expect("request line");
            *seen.lock().expect("lock") = Some(line.trim_end().to_owned());

            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).expect("header");
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content length");
                    }
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).expect("body");

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).expect("write response");
        });
        Self {
            addr,
            request_line,
            handle: Some(handle),
        }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// First line of the request received, once served.
    pub fn request_line(&mut self) -> Option<String> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("server thread");
        }
        self.request_line.lock().expect("lock").clone()
    }
}

/// A loopback URL with nothing listening on it.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
