//! Randomized shock request construction.
//!
//! Pure with respect to its inputs aside from the two draws; the random
//! source is injected so tests can pin it.

use std::fmt;

use rand::Rng;
use serde_json::json;

use super::config::ShockConfig;

/// A single-use outbound request to the shocker control endpoint.
///
/// The drawn `intensity` and `duration_ms` are carried alongside the body
/// so the controller can compose its in-progress notification. The token
/// only leaves this value through [`ShockRequest::headers`].
pub struct ShockRequest {
    pub url: String,
    pub body: serde_json::Value,
    pub intensity: u32,
    pub duration_ms: u32,
    api_token: String,
}

impl ShockRequest {
    /// Header set for the dispatch layer to apply verbatim.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            ("Content-Type", "application/json"),
            ("accept", "application/json"),
            ("OpenShockToken", self.api_token.as_str()),
        ]
    }
}

impl fmt::Debug for ShockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShockRequest")
            .field("url", &self.url)
            .field("body", &self.body)
            .field("intensity", &self.intensity)
            .field("duration_ms", &self.duration_ms)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Draws intensity and duration uniformly within the configured bounds
/// (inclusive; min == max pins the draw) and assembles the request.
pub fn build_request(config: &ShockConfig, rng: &mut impl Rng) -> ShockRequest {
    let intensity = rng.gen_range(config.min_intensity..=config.max_intensity);
    let duration_ms = rng.gen_range(config.min_duration_ms..=config.max_duration_ms);

    let body = json!({
        "shocks": [{
            "id": config.shocker_id,
            "type": "Shock",
            "intensity": intensity,
            "duration": duration_ms,
            "exclusive": true,
        }],
        "customName": config.custom_name,
    });

    ShockRequest {
        url: format!("https://{}/2/shockers/control", config.endpoint_domain),
        body,
        intensity,
        duration_ms,
        api_token: config.api_token.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_ENDPOINT_DOMAIN;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_config(
        min_duration_ms: u32,
        max_duration_ms: u32,
        min_intensity: u32,
        max_intensity: u32,
    ) -> ShockConfig {
        ShockConfig {
            shocker_id: "dev-1".to_string(),
            api_token: "supersecret".to_string(),
            custom_name: "DeathShock".to_string(),
            min_duration_ms,
            max_duration_ms,
            min_intensity,
            max_intensity,
            endpoint_domain: DEFAULT_ENDPOINT_DOMAIN.to_string(),
        }
    }

    #[test]
    fn test_draws_stay_in_bounds() {
        let config = test_config(500, 10000, 10, 90);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let request = build_request(&config, &mut rng);
            assert!((10..=90).contains(&request.intensity));
            assert!((500..=10000).contains(&request.duration_ms));
        }
    }

    #[test]
    fn test_degenerate_bounds_pin_the_draw() {
        let config = test_config(5000, 5000, 42, 42);
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..20 {
            let request = build_request(&config, &mut rng);
            assert_eq!(request.intensity, 42);
            assert_eq!(request.duration_ms, 5000);
        }
    }

    #[test]
    fn test_url_uses_default_domain() {
        let config = test_config(300, 30000, 1, 100);
        let mut rng = StdRng::seed_from_u64(1);

        let request = build_request(&config, &mut rng);
        assert_eq!(request.url, "https://api.openshock.app/2/shockers/control");
    }

    #[test]
    fn test_url_uses_configured_domain() {
        let mut config = test_config(300, 30000, 1, 100);
        config.endpoint_domain = "foo.bar".to_string();
        let mut rng = StdRng::seed_from_u64(1);

        let request = build_request(&config, &mut rng);
        assert_eq!(request.url, "https://foo.bar/2/shockers/control");
    }

    #[test]
    fn test_body_shape() {
        let config = test_config(5000, 5000, 42, 42);
        let mut rng = StdRng::seed_from_u64(3);

        let request = build_request(&config, &mut rng);
        let shock = &request.body["shocks"][0];
        assert_eq!(shock["id"], "dev-1");
        assert_eq!(shock["type"], "Shock");
        assert_eq!(shock["intensity"], 42);
        assert_eq!(shock["duration"], 5000);
        assert_eq!(shock["exclusive"], true);
        assert_eq!(request.body["customName"], "DeathShock");
        // Exactly one shock per request.
        assert_eq!(request.body["shocks"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_token_rides_in_header_only() {
        let config = test_config(300, 30000, 1, 100);
        let mut rng = StdRng::seed_from_u64(5);

        let request = build_request(&config, &mut rng);
        let headers = request.headers();
        assert!(headers.contains(&("OpenShockToken", "supersecret")));
        assert!(headers.contains(&("Content-Type", "application/json")));
        assert!(headers.contains(&("accept", "application/json")));

        let body = request.body.to_string();
        assert!(!body.contains("supersecret"));
        let debug = format!("{:?}", request);
        assert!(!debug.contains("supersecret"));
    }
}
