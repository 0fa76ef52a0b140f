//! ENSO feed download against a local HTTP server.

mod common;

use anomaly_forecast::core::month::month_start;
use anomaly_forecast::data::EnsoClient;
use anomaly_forecast::error::ForecastError;
use common::{enso_feed, synthetic_inputs};
use std::thread;
use std::time::Duration;
use tiny_http::{Response, Server};

/// Serve `body` with `status` to a single request; returns the feed URL.
fn serve_once(status: u16, body: String) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    (format!("http://{addr}/detrend.nino34.ascii.txt"), handle)
}

fn client() -> EnsoClient {
    EnsoClient::new(Duration::from_secs(5)).unwrap()
}

#[test]
fn downloads_and_parses_feed() {
    let (_, enso) = synthetic_inputs(2020, 1, 30, 3);
    let (url, handle) = serve_once(200, enso_feed(&enso));

    let series = client().fetch(&url).unwrap();
    handle.join().unwrap();
    assert_eq!(series.len(), 30);
    assert_eq!(series.first_timestamp(), Some(month_start(2020, 1).unwrap()));
    assert_eq!(series.last_timestamp(), Some(month_start(2022, 6).unwrap()));
}

#[test]
fn server_error_is_unavailable() {
    let (url, handle) = serve_once(500, "internal error".to_string());

    let err = client().fetch(&url).unwrap_err();
    handle.join().unwrap();
    match err {
        ForecastError::DataUnavailable(message) => assert!(message.contains("500")),
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
    assert!(!ForecastError::DataUnavailable(String::new()).is_recoverable());
}

#[test]
fn garbage_body_is_malformed() {
    let (url, handle) = serve_once(200, "<html>maintenance</html>\n".to_string());

    let err = client().fetch(&url).unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, ForecastError::DataMalformed(_)));
}
