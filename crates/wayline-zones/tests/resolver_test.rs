//! Zone resolution tests: timeouts, cancellation and the live HTTP source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wayline_core::{validate, FlyZone, GeoPoint, ValidationOutcome, WaypointSpec, ZoneSourceKind};
use wayline_zones::{
    LiveZoneSource, StaticZoneSource, ZoneLookupError, ZoneQuery, ZoneResolver, ZoneSource,
};

/// Source that never answers within any sane deadline.
struct Stalled {
    calls: Arc<AtomicUsize>,
}

impl ZoneSource for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    fn fetch<'a>(&'a self, _query: &'a ZoneQuery) -> BoxFuture<'a, Result<Vec<FlyZone>, ZoneLookupError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
        .boxed()
    }
}

fn nur_khan_query() -> ZoneQuery {
    ZoneQuery::new(GeoPoint::new(33.6166, 73.0993), 20_000.0)
}

#[tokio::test(start_paused = true)]
async fn timed_out_source_falls_back_to_static() {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = ZoneResolver::new(Duration::from_millis(250))
        .with_source(Stalled {
            calls: calls.clone(),
        })
        .with_source(StaticZoneSource::new());

    let zones = resolver.resolve(&nur_khan_query()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!zones.is_empty());
    assert!(zones.iter().all(|z| z.source == ZoneSourceKind::StaticFallback));
    assert!(zones.iter().any(|z| z.id == "static-nur-khan"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_abandons_live_attempt() {
    let resolver = ZoneResolver::new(Duration::from_secs(3600))
        .with_source(Stalled {
            calls: Arc::new(AtomicUsize::new(0)),
        })
        .with_source(StaticZoneSource::new());

    let started = tokio::time::Instant::now();
    let zones = resolver
        .resolve_until(
            &nur_khan_query(),
            tokio::time::sleep(Duration::from_millis(10)),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(zones.iter().any(|z| z.id == "static-nur-khan"));
}

#[tokio::test(start_paused = true)]
async fn static_zone_flags_waypoint_at_its_center() {
    let resolver = ZoneResolver::new(Duration::from_millis(100)).with_source(StaticZoneSource::new());
    let zones = resolver.resolve(&nur_khan_query()).await;

    let waypoint = WaypointSpec {
        index: 0,
        lat: 33.6166,
        lon: 73.0993,
        altitude_m: 30.0,
        speed_mps: 5.0,
        gimbal_pitch_deg: -90.0,
        heading_mode: Default::default(),
        turn_mode: Default::default(),
    };
    let result = validate(&[waypoint], &zones);
    assert_eq!(result.outcome, ValidationOutcome::Flagged);
    assert_eq!(result.affected_waypoint_indices, vec![0]);
    assert!(result.intersecting_zones.iter().any(|z| z.id == "static-nur-khan"));
}

/// Serve one canned HTTP response and hand back the raw request text.
async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let mut read = 0;
        loop {
            let n = socket.read(&mut buf[read..]).await.unwrap();
            read += n;
            if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf[..read]).into_owned()
    });

    (base, handle)
}

#[tokio::test]
async fn live_source_translates_vendor_payload() {
    let body = serde_json::json!({
        "version": 1,
        "zones": [{
            "id": "v-1", "name": "Vendor Zone", "category": 2, "shape": 0,
            "lat": 33.70, "lon": 73.05, "radius_m": 1200.0
        }]
    })
    .to_string();
    let (base, server) = serve_once("200 OK", body).await;

    let source = LiveZoneSource::new(base, Some("secret".to_string()), Duration::from_secs(5)).unwrap();
    let zones = source
        .fetch(&ZoneQuery::new(GeoPoint::new(33.70, 73.05), 20_000.0))
        .await
        .unwrap();

    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].id, "v-1");
    assert_eq!(zones[0].source, ZoneSourceKind::Live);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /v1/fly-zones?lat=33.7&lon=73.05&radius=20000 "));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
}

#[tokio::test]
async fn live_source_reports_http_status() {
    let (base, server) = serve_once("503 Service Unavailable", "{}".to_string()).await;
    let source = LiveZoneSource::new(base, None, Duration::from_secs(5)).unwrap();

    let err = source
        .fetch(&ZoneQuery::new(GeoPoint::new(33.70, 73.05), 20_000.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ZoneLookupError::Status(503)));
    server.await.unwrap();
}

#[tokio::test]
async fn empty_live_answer_falls_back_to_static() {
    let body = serde_json::json!({ "version": 1, "zones": [] }).to_string();
    let (base, server) = serve_once("200 OK", body).await;

    let resolver = ZoneResolver::new(Duration::from_secs(5))
        .with_source(LiveZoneSource::new(base, None, Duration::from_secs(5)).unwrap())
        .with_source(StaticZoneSource::new());

    let zones = resolver.resolve(&nur_khan_query()).await;
    assert!(zones.iter().all(|z| z.source == ZoneSourceKind::StaticFallback));
    assert!(!zones.is_empty());
    server.await.unwrap();
}
