//! Session lifecycle integration tests.
//!
//! These run the real controller with synthetic collaborators: a stub camera,
//! a scripted detector, a recording speech engine, and (for the guidance
//! test) a canned maps endpoint on a loopback listener.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sightline::{
    BoundingBox, CameraConfig, CameraSource, Detection, MapsClient, MapsConfig, NullViewer,
    ObjectTracker, RecordingEngine, SessionController, SessionOptions, StubDetector,
    TrackerConfig, Voice,
};

const FALLBACK_NOTICE: &str =
    "Map opened. Turn by turn guidance is unavailable without a maps API key.";

fn fast_camera() -> CameraSource {
    CameraSource::new(CameraConfig {
        source: "stub://test".to_string(),
        target_fps: 50,
        width: 640,
        height: 480,
    })
    .expect("stub camera")
}

fn person_detector() -> Box<StubDetector> {
    let person = Detection::new("person", 0.9, BoundingBox::new(270, 190, 370, 290));
    Box::new(StubDetector::new(vec![vec![person]]))
}

fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let stop = Instant::now() + deadline;
    while Instant::now() < stop {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn stop_halts_both_tasks_and_announcements() {
    let (engine, recorded) = RecordingEngine::new();
    let voice = Arc::new(Voice::new(Box::new(engine)));
    let maps = MapsClient::new(MapsConfig::default());
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(NullViewer));

    controller
        .start(
            SessionOptions {
                origin: "a".to_string(),
                destination: "b".to_string(),
                use_api_guidance: false,
                announce_interval: Duration::from_secs(12),
            },
            fast_camera(),
            person_detector(),
            ObjectTracker::new(TrackerConfig::default()),
        )
        .expect("start session");
    assert!(!controller.has_guidance_task());

    assert!(
        wait_until(Duration::from_secs(3), || !recorded
            .lock()
            .unwrap()
            .is_empty()),
        "expected at least one announcement"
    );

    controller.stop();
    assert!(!controller.is_active());

    // Once stopped, no further announcements arrive.
    let settled = recorded.lock().unwrap().len();
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(recorded.lock().unwrap().len(), settled);

    let utterances = recorded.lock().unwrap().clone();
    assert!(
        utterances[0].starts_with("person ahead, approximately"),
        "unexpected announcement: {}",
        utterances[0]
    );
    voice.stop();
}

#[test]
fn starting_twice_is_an_error() {
    let (engine, _recorded) = RecordingEngine::new();
    let voice = Arc::new(Voice::new(Box::new(engine)));
    let maps = MapsClient::new(MapsConfig::default());
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(NullViewer));

    let opts = SessionOptions {
        origin: "a".to_string(),
        destination: "b".to_string(),
        use_api_guidance: false,
        announce_interval: Duration::from_secs(12),
    };
    controller
        .start(
            opts.clone(),
            fast_camera(),
            Box::new(StubDetector::empty()),
            ObjectTracker::new(TrackerConfig::default()),
        )
        .expect("first start");
    assert!(controller
        .start(
            opts,
            fast_camera(),
            Box::new(StubDetector::empty()),
            ObjectTracker::new(TrackerConfig::default()),
        )
        .is_err());

    controller.stop();
    voice.stop();
}

#[test]
fn missing_api_key_announces_fallback_once_and_keeps_detecting() {
    let (engine, recorded) = RecordingEngine::new();
    let voice = Arc::new(Voice::new(Box::new(engine)));
    let maps = MapsClient::new(MapsConfig::default());
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(NullViewer));

    controller
        .start(
            SessionOptions {
                origin: "a".to_string(),
                destination: "b".to_string(),
                use_api_guidance: true,
                announce_interval: Duration::from_secs(12),
            },
            fast_camera(),
            person_detector(),
            ObjectTracker::new(TrackerConfig::default()),
        )
        .expect("start session");

    // No credential: the fallback notice replaces the guidance task.
    assert!(!controller.has_guidance_task());
    assert!(
        wait_until(Duration::from_secs(3), || recorded.lock().unwrap().len() >= 2),
        "expected fallback notice plus a detection announcement"
    );

    controller.stop();
    voice.stop();

    let utterances = recorded.lock().unwrap().clone();
    let fallbacks = utterances
        .iter()
        .filter(|text| text.as_str() == FALLBACK_NOTICE)
        .count();
    assert_eq!(fallbacks, 1, "utterances: {:?}", utterances);
    assert_eq!(utterances[0], FALLBACK_NOTICE);
    assert!(utterances
        .iter()
        .any(|text| text.starts_with("person ahead")));
}

// ----------------------------------------------------------------------------
// Guidance against a canned maps endpoint
// ----------------------------------------------------------------------------

const GEOCODE_BODY: &str = r#"{
    "status": "OK",
    "results": [ { "geometry": { "location": { "lat": 40.0, "lng": -74.0 } } } ]
}"#;

const DIRECTIONS_BODY: &str = r#"{
    "status": "OK",
    "routes": [ { "legs": [ {
        "distance": { "text": "1.2 km" },
        "duration": { "text": "15 mins" },
        "steps": [
            {
                "html_instructions": "Head <b>north</b>",
                "distance": { "text": "200 m" },
                "duration": { "value": 1 }
            },
            {
                "html_instructions": "Turn <b>left</b> onto Main&nbsp;St",
                "distance": { "text": "1 km" },
                "duration": { "value": 1 }
            }
        ]
    } ] } ]
}"#;

/// Serve canned JSON for any number of requests; `/geocode` and `/directions`
/// select the body. The thread exits when the listener errors at process end.
fn spawn_canned_maps_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            let request_line = String::from_utf8_lossy(&request);
            let body = if request_line.starts_with("GET /geocode") {
                GEOCODE_BODY
            } else {
                DIRECTIONS_BODY
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{}", addr)
}

#[test]
fn guidance_speaks_route_overview_steps_and_arrival() {
    let base = spawn_canned_maps_server();
    let (engine, recorded) = RecordingEngine::new();
    let voice = Arc::new(Voice::new(Box::new(engine)));
    let maps = MapsClient::new(MapsConfig {
        api_key: Some("test-key".to_string()),
        geocode_url: format!("{}/geocode", base),
        directions_url: format!("{}/directions", base),
        ..MapsConfig::default()
    });
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(NullViewer));

    controller
        .start(
            SessionOptions {
                origin: "Times Square".to_string(),
                destination: "Bryant Park".to_string(),
                use_api_guidance: true,
                announce_interval: Duration::from_millis(100),
            },
            fast_camera(),
            Box::new(StubDetector::empty()),
            ObjectTracker::new(TrackerConfig::default()),
        )
        .expect("start session");
    assert!(controller.has_guidance_task());

    assert!(
        wait_until(Duration::from_secs(5), || recorded
            .lock()
            .unwrap()
            .iter()
            .any(|text| text == "You have arrived at your destination.")),
        "guidance never announced arrival: {:?}",
        recorded.lock().unwrap()
    );

    controller.stop();
    voice.stop();

    let utterances = recorded.lock().unwrap().clone();
    assert_eq!(utterances[0], "Starting navigation. Distance 1.2 km, ETA 15 mins.");
    assert_eq!(utterances[1], "Head north. For 200 m");
    assert_eq!(utterances[2], "Turn left onto Main St. For 1 km");
    assert_eq!(utterances[3], "You have arrived at your destination.");
}

#[test]
fn guidance_failure_is_spoken_and_detection_survives() {
    // No server behind this address: geocode is a transport failure.
    let (engine, recorded) = RecordingEngine::new();
    let voice = Arc::new(Voice::new(Box::new(engine)));
    let maps = MapsClient::new(MapsConfig {
        api_key: Some("test-key".to_string()),
        geocode_url: "http://127.0.0.1:1/geocode".to_string(),
        directions_url: "http://127.0.0.1:1/directions".to_string(),
        ..MapsConfig::default()
    });
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(NullViewer));

    controller
        .start(
            SessionOptions {
                origin: "nowhere".to_string(),
                destination: "nowhere else".to_string(),
                use_api_guidance: true,
                announce_interval: Duration::from_secs(12),
            },
            fast_camera(),
            person_detector(),
            ObjectTracker::new(TrackerConfig::default()),
        )
        .expect("start session");
    assert!(controller.has_guidance_task());

    assert!(
        wait_until(Duration::from_secs(5), || {
            let utterances = recorded.lock().unwrap();
            utterances
                .iter()
                .any(|text| text == "Sorry, I could not locate the starting point.")
                && utterances.iter().any(|text| text.starts_with("person"))
        }),
        "expected failure notice and a detection announcement: {:?}",
        recorded.lock().unwrap()
    );

    controller.stop();
    voice.stop();
}
