use ip_reporter::email_client::{MailError, Mailer};
use ip_reporter::geolocation::GeolocationClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub const WONDERLAND: &str = r#"{
    "status": "success",
    "country": "Wonderland",
    "countryCode": "WL",
    "region": "RH",
    "regionName": "Red Hearts",
    "city": "Tea Party",
    "zip": "00042",
    "lat": 51.75,
    "lon": -1.25,
    "timezone": "Europe/London",
    "isp": "Rabbit Hole Networks",
    "org": "Cheshire Cat Ltd",
    "as": "AS64500 Mad Hatter",
    "query": "1.2.3.4"
}"#;

/// Geolocation client pointed at `/json/` on a mock server.
pub fn geolocation_client(server: &mockito::ServerGuard) -> GeolocationClient {
    GeolocationClient::new(&format!("{}/json/", server.url()), Duration::from_secs(10))
        .expect("error building geolocation client")
}

/// Remembers every `(body, recipients)` it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send_mail(&self, body: &str, recipients: &str) -> Result<(), MailError> {
        self.calls
            .lock()
            .unwrap()
            .push((body.to_string(), recipients.to_string()));
        if self.fail {
            return Err(MailError::InvalidAddress(recipients.to_string()));
        }
        Ok(())
    }
}

/// Holds every send until `release` is notified.
#[derive(Default)]
pub struct GatedMailer {
    pub entered: Notify,
    pub release: Notify,
    pub calls: AtomicUsize,
}

impl Mailer for GatedMailer {
    async fn send_mail(&self, _body: &str, _recipients: &str) -> Result<(), MailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

pub const AUTH_OK: &str = "235 2.7.0 Authentication successful\r\n";
pub const AUTH_REJECTED: &str = "535 5.7.8 Authentication credentials invalid\r\n";
pub const RCPT_OK: &str = "250 2.1.5 OK\r\n";
pub const RCPT_REJECTED: &str = "550 5.1.1 No such user\r\n";

/// A scripted SMTP peer on an ephemeral port. Every line the client sends is kept.
pub struct FakeSmtpServer {
    pub port: u16,
    pub transcript: Arc<Mutex<Vec<String>>>,
}

impl FakeSmtpServer {
    pub fn lines(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }
}

pub async fn spawn_smtp_server(auth_reply: &'static str, rcpt_reply: &'static str) -> FakeSmtpServer {
    spawn_smtp_server_on("127.0.0.1", auth_reply, rcpt_reply).await
}

/// Same as [`spawn_smtp_server`] but listening on `ip`, e.g. a loopback alias like `127.0.0.2`.
pub async fn spawn_smtp_server_on(
    ip: &str,
    auth_reply: &'static str,
    rcpt_reply: &'static str,
) -> FakeSmtpServer {
    let listener = TcpListener::bind((ip, 0))
        .await
        .expect("error binding fake smtp server");
    let port = listener.local_addr().unwrap().port();
    let transcript = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&transcript);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let _ = serve_smtp(stream, log, auth_reply, rcpt_reply).await;
            });
        }
    });

    FakeSmtpServer { port, transcript }
}

async fn serve_smtp(
    stream: TcpStream,
    log: Arc<Mutex<Vec<String>>>,
    auth_reply: &str,
    rcpt_reply: &str,
) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    write.write_all(b"220 fake.test ESMTP\r\n").await?;

    let mut in_data = false;
    while let Some(line) = lines.next_line().await? {
        log.lock().unwrap().push(line.clone());
        if in_data {
            if line == "." {
                in_data = false;
                write.write_all(b"250 2.0.0 queued\r\n").await?;
            }
            continue;
        }

        let verb = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        let reply = match verb.as_str() {
            "EHLO" | "HELO" => "250-fake.test\r\n250-AUTH PLAIN LOGIN\r\n250 OK\r\n",
            "AUTH" => auth_reply,
            "MAIL" | "RSET" | "NOOP" => "250 2.1.0 OK\r\n",
            "RCPT" => rcpt_reply,
            "DATA" => {
                in_data = true;
                "354 End data with <CR><LF>.<CR><LF>\r\n"
            }
            "QUIT" => {
                write.write_all(b"221 2.0.0 Bye\r\n").await?;
                break;
            }
            _ => "502 5.5.2 Command not implemented\r\n",
        };
        write.write_all(reply.as_bytes()).await?;
    }
    Ok(())
}

/// Accepts connections and never says a word; the sockets stay open until the test ends.
pub async fn spawn_silent_smtp_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("error binding silent smtp server");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    port
}

/// Collects the message of every tracing event it sees.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn count(&self, message: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|m| m.contains(message)).count()
    }
}

impl<S: Subscriber> Layer<S> for EventLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0.lock().unwrap().push(visitor.0);
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
