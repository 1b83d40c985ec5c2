// Status output parsing

use crate::remote::models::ServiceState;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Matches `"msg": "<service>|<state>"` fragments anywhere in runner output
fn status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""msg":\s*"([^|]+)\|(\w+)""#).expect("status pattern compiles")
    })
}

/// Extract per-service states from raw runner output.
///
/// The runner's stdout is arbitrary text; only fragments matching the
/// status pattern are considered and everything around them is ignored.
/// Services the output never mentions are simply absent from the result.
/// If a service is mentioned more than once, the last mention wins.
///
/// A literal `|` inside a service name or state word is not representable
/// in this format; the match stops at the first `|`.
pub fn parse_status_output(raw: &str) -> HashMap<String, ServiceState> {
    let mut states = HashMap::new();
    for captures in status_pattern().captures_iter(raw) {
        let service = captures[1].to_string();
        let state = ServiceState::from_raw(&captures[2]);
        states.insert(service, state);
    }
    states
}
