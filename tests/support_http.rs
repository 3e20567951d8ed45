use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Delay between the two chunks of a streamed response.
pub const CHUNK_GAP: Duration = Duration::from_millis(30);
/// How long `/slow` waits before answering.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(2);
pub const TEST_TOKEN: &str = "sk-test-token";

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a small streaming-chat test server.
///
/// Paths: `/stream` (chunked 200), `/auth` (chunked 200 only when the
/// request carries the test token and a streaming JSON body, else 401),
/// `/empty` (200 with no body), `/error` (503), `/slow` (200 after
/// `SLOW_RESPONSE`).
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server() -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

/// Like [`spawn_http_server`], but skips in sandboxes that forbid sockets.
///
/// # Errors
///
/// Returns an error for any other bind failure.
pub fn spawn_http_server_or_skip() -> Result<Option<(String, ServerHandle)>, String> {
    match spawn_http_server() {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// An address nothing listens on.
///
/// # Errors
///
/// Returns an error if a probe listener cannot be bound.
pub fn closed_port_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe listener failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/closed", addr))
}

struct Request {
    path: String,
    authorization: Option<String>,
    body: String,
}

fn read_request(stream: &TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let path = request_line.split_whitespace().nth(1)?.to_owned();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name == "content-length" {
                content_length = value.parse().ok()?;
            } else if name == "authorization" {
                authorization = Some(value.to_owned());
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(Request {
        path,
        authorization,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_chunked(stream: &mut TcpStream) -> std::io::Result<()> {
    stream.write_all(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
    )?;
    for (index, event) in ["event: message_start\n\n", "event: message_stop\n\n"]
        .iter()
        .enumerate()
    {
        if index > 0 {
            thread::sleep(CHUNK_GAP);
        }
        write!(stream, "{:x}\r\n{}\r\n", event.len(), event)?;
        stream.flush()?;
    }
    stream.write_all(b"0\r\n\r\n")?;
    stream.flush()
}

fn write_fixed(stream: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )?;
    stream.flush()
}

fn handle_client(mut stream: TcpStream) {
    let Some(request) = read_request(&stream) else {
        return;
    };
    let written = match request.path.as_str() {
        "/stream" => write_chunked(&mut stream),
        "/auth" => {
            let authorized = request.authorization.as_deref() == Some(TEST_TOKEN)
                && request.body.contains("\"stream\":true");
            if authorized {
                write_chunked(&mut stream)
            } else {
                write_fixed(&mut stream, "401 Unauthorized", "unauthorized")
            }
        }
        "/empty" => write_fixed(&mut stream, "200 OK", ""),
        "/error" => write_fixed(&mut stream, "503 Service Unavailable", "busy"),
        "/slow" => {
            thread::sleep(SLOW_RESPONSE);
            write_fixed(&mut stream, "200 OK", "late")
        }
        _ => write_fixed(&mut stream, "404 Not Found", "missing"),
    };
    if written.is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Run the `routebench` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_routebench<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = routebench_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("ROUTEBENCH_LOG")
        .env_remove("ROUTEBENCH_TOKEN")
        .output()
        .map_err(|err| format!("run routebench failed: {}", err))
}

fn routebench_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_routebench").map_or_else(
        || Err("CARGO_BIN_EXE_routebench missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
