//! Spoken turn-by-turn guidance.
//!
//! The guidance task walks a fixed state machine: geocode both endpoints,
//! fetch a route, announce the overview, then announce each step with pacing
//! proportional to the step's estimated duration, and finally announce
//! arrival. Irrecoverable failures (either endpoint unresolvable, no route)
//! are spoken once and terminate only this task; the detection task is
//! unaffected.

pub mod maps;
mod viewer;

pub use maps::{Lookup, MapsClient, MapsConfig, TravelMode};
pub use viewer::{BrowserViewer, NullViewer, RouteViewer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::speech::Voice;

/// Steps are paced at a third of their estimated duration, matching the
/// cadence of a walking pace without waiting out the full step time.
const STEP_PACING_DIVISOR: u32 = 3;
const CANCEL_POLL: Duration = Duration::from_millis(100);

pub(crate) fn run_guidance(
    voice: &Voice,
    maps: &MapsClient,
    origin: &str,
    destination: &str,
    fallback_pacing: Duration,
    running: &AtomicBool,
) {
    log::info!("guidance task started: {} -> {}", origin, destination);

    let origin_point = match maps.geocode(origin) {
        Lookup::Found(point) => point,
        Lookup::NotFound | Lookup::TransportError => {
            voice.speak("Sorry, I could not locate the starting point.");
            return;
        }
    };
    let destination_point = match maps.geocode(destination) {
        Lookup::Found(point) => point,
        Lookup::NotFound | Lookup::TransportError => {
            voice.speak("Sorry, I could not locate the destination.");
            return;
        }
    };

    let route = match maps.route(&origin_point.to_string(), &destination_point.to_string()) {
        Lookup::Found(route) => route,
        Lookup::NotFound | Lookup::TransportError => {
            voice.speak("Sorry, I could not find a route.");
            return;
        }
    };
    if route.steps.is_empty() {
        voice.speak("No navigation steps found.");
        return;
    }

    voice.speak(format!(
        "Starting navigation. Distance {}, ETA {}.",
        route.distance_text, route.duration_text
    ));

    for step in &route.steps {
        if !running.load(Ordering::SeqCst) {
            log::info!("guidance task cancelled");
            return;
        }
        let instruction = strip_instruction_markup(&step.instruction_html);
        let phrase = if step.distance_text.is_empty() {
            instruction
        } else {
            format!("{}. For {}", instruction, step.distance_text)
        };
        voice.speak(phrase);

        let pacing = step
            .duration_secs
            .map(|secs| Duration::from_secs(secs) / STEP_PACING_DIVISOR)
            .unwrap_or(fallback_pacing);
        sleep_while_running(pacing, running);
    }

    if running.load(Ordering::SeqCst) {
        voice.speak("You have arrived at your destination.");
    }
    log::info!("guidance task finished");
}

/// Sleep in short slices so cancellation takes effect within one poll.
fn sleep_while_running(total: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(CANCEL_POLL));
    }
}

/// Strip instruction markup down to speakable text.
fn strip_instruction_markup(html: &str) -> String {
    static TAG_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| regex::Regex::new(r"<[^>]*>").unwrap());
    re.replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_instruction_markup("Head <b>north</b> on Main&nbsp;St &amp; 1st"),
            "Head north on Main St & 1st"
        );
        assert_eq!(strip_instruction_markup("Turn left"), "Turn left");
        assert_eq!(
            strip_instruction_markup(r#"<div style="font-size:0.9em">toward the park</div>"#),
            "toward the park"
        );
    }

    #[test]
    fn sleep_while_running_returns_early_when_cancelled() {
        let running = AtomicBool::new(false);
        let start = Instant::now();
        sleep_while_running(Duration::from_secs(5), &running);
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
