use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use fleetmilp::osrm::{OsrmClient, OsrmClientParams};
use fleetmilp::problem::Coordinate;
use fleetmilp::Error;

/// Serves one HTTP response on a local port and returns the base URL and the request line
fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        let request = String::from_utf8_lossy(&request).to_string();
        request.lines().next().unwrap_or_default().to_string()
    });

    (url, handle)
}

fn points() -> Vec<Coordinate> {
    vec![
        Coordinate {
            longitude: -74.08,
            latitude: 4.6,
        },
        Coordinate {
            longitude: -74.1,
            latitude: 4.65,
        },
    ]
}

fn client(url: String) -> OsrmClient {
    OsrmClient::new(OsrmClientParams {
        osrm_url: url,
        ..OsrmClientParams::default()
    })
    .unwrap()
}

#[test]
fn server_error_is_reported_with_status_and_body() {
    let (url, handle) = serve_once("500 Internal Server Error", "boom");
    let result = client(url).fetch_matrices(&points());
    handle.join().unwrap();

    match result {
        Err(Error::Service { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn table_is_parsed_in_point_order() {
    let (url, handle) = serve_once(
        "200 OK",
        r#"{"code":"Ok","distances":[[0,1500],[1700,0]],"durations":[[0,120],[null,0]]}"#,
    );
    let matrices = client(url).fetch_matrices(&points()).unwrap();
    let request_line = handle.join().unwrap();

    let expected = "GET /table/v1/driving/-74.08,4.6;-74.1,4.65?annotations=distance,duration";
    assert!(request_line.starts_with(expected));
    assert_eq!(matrices.distances.get(1, 0), Some(1700.0));
    assert_eq!(matrices.durations.get(0, 1), Some(120.0));
    assert_eq!(matrices.durations.get(1, 0), None);
}
