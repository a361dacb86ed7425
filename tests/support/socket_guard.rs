//! Mock servers for tests that need a loopback socket.
//!
//! Some sandboxes cannot bind 127.0.0.1. There the tests are skipped, unless
//! `GUIDE_SCRAPER_REQUIRE_SOCKET_TESTS` asks for a hard failure instead.

use std::net::TcpListener;

use wiremock::MockServer;

const STRICT_ENV: &str = "GUIDE_SCRAPER_REQUIRE_SOCKET_TESTS";

fn strict() -> bool {
    std::env::var(STRICT_ENV).is_ok_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    })
}

/// Starts a mock server, or returns `None` when loopback is unavailable.
pub async fn mock_server_or_skip() -> Option<MockServer> {
    let Err(e) = TcpListener::bind(("127.0.0.1", 0)) else {
        return Some(MockServer::start().await);
    };
    assert!(!strict(), "loopback bind failed ({e}) and {STRICT_ENV} is set");
    eprintln!("skipping socket-bound test: loopback bind failed ({e}); set {STRICT_ENV}=1 to fail instead");
    None
}
