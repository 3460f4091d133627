//! Prediction service client
//!
//! The predictor is treated as an opaque synchronous call from a feature vector
//! to a score. Transport failures surface as `UpstreamUnavailable`; answers
//! without a usable score surface as `UpstreamResponse`.

use crate::error::SleepwiseError;
use crate::types::{FeatureVector, PredictionResult};
use std::time::Duration;

/// Key holding the score in the prediction service response
pub const SCORE_KEY: &str = "Predicted Sleep Quality";

/// Trait for prediction backends
pub trait Predictor: Send + Sync {
    /// Score one feature vector
    fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult, SleepwiseError>;
}

impl<T: Predictor + ?Sized> Predictor for &T {
    fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult, SleepwiseError> {
        (**self).predict(vector)
    }
}

/// Predictor returning a constant score, for offline use and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedPredictor {
    score: f64,
}

impl FixedPredictor {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl Predictor for FixedPredictor {
    fn predict(&self, _vector: &FeatureVector) -> Result<PredictionResult, SleepwiseError> {
        Ok(PredictionResult { score: self.score })
    }
}

/// Configuration for the HTTP prediction client
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Base URL of the prediction service (without the `/predict` path)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl PredictorConfig {
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url.trim_end_matches('/'))
    }
}

/// Read the score out of a prediction service response body
pub fn parse_prediction(body: &serde_json::Value) -> Result<PredictionResult, SleepwiseError> {
    if let Some(error) = body.get("error") {
        let reason = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(SleepwiseError::UpstreamResponse(reason));
    }

    body.get(SCORE_KEY)
        .and_then(serde_json::Value::as_f64)
        .map(|score| PredictionResult { score })
        .ok_or_else(|| SleepwiseError::UpstreamResponse(format!("missing \"{SCORE_KEY}\"")))
}

/// Blocking HTTP client for the prediction service
#[cfg(feature = "http")]
pub struct HttpPredictor {
    config: PredictorConfig,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpPredictor {
    pub fn new(config: PredictorConfig) -> Result<Self, SleepwiseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SleepwiseError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }
}

#[cfg(feature = "http")]
impl Predictor for HttpPredictor {
    fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult, SleepwiseError> {
        let url = self.config.predict_url();
        tracing::debug!(%url, "requesting prediction");

        let response = self
            .client
            .post(&url)
            .json(vector)
            .send()
            .map_err(|e| {
                tracing::warn!(error = %e, "prediction service unreachable");
                SleepwiseError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .map_err(|e| SleepwiseError::UpstreamResponse(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%status, "prediction service rejected request");
            return match parse_prediction(&body) {
                Err(e) => Err(e),
                Ok(_) => Err(SleepwiseError::UpstreamResponse(format!("status {status}"))),
            };
        }

        let result = parse_prediction(&body)?;
        tracing::debug!(score = result.score, "prediction received");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vector() -> FeatureVector {
        FeatureVector {
            age: 40,
            gender: 1,
            bedtime: 1350,
            wakeup_time: 420,
            daily_steps: 5000,
            calories_burned: 2000,
            activity_level: 0,
            dietary_habits: 0,
            sleep_disorders: 0,
            medication_usage: 0,
        }
    }

    #[test]
    fn test_fixed_predictor() {
        let result = FixedPredictor::new(6.25).predict(&vector()).unwrap();
        assert_eq!(result.score, 6.25);
    }

    #[test]
    fn test_parse_prediction() {
        let result = parse_prediction(&json!({ "Predicted Sleep Quality": 7.43 })).unwrap();
        assert_eq!(result.score, 7.43);
    }

    #[test]
    fn test_parse_prediction_error_body() {
        let err = parse_prediction(&json!({ "error": "Invalid time format: 25:99" })).unwrap_err();
        assert!(matches!(err, SleepwiseError::UpstreamResponse(ref msg) if msg.contains("25:99")));
    }

    #[test]
    fn test_parse_prediction_missing_score() {
        let err = parse_prediction(&json!({ "score": 5 })).unwrap_err();
        assert!(matches!(err, SleepwiseError::UpstreamResponse(_)));
    }

    #[test]
    fn test_predict_url_trims_trailing_slash() {
        let config = PredictorConfig {
            base_url: "https://ml.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.predict_url(), "https://ml.example.com/predict");
    }

    #[cfg(feature = "http")]
    fn predictor_at(port: u16) -> HttpPredictor {
        HttpPredictor::new(PredictorConfig {
            base_url: format!("http://127.0.0.1:{port}"),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_unreachable_service_is_upstream_unavailable() {
        // Bind then drop so nothing listens on the port.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = predictor_at(port).predict(&vector()).unwrap_err();
        assert!(
            matches!(err, SleepwiseError::UpstreamUnavailable(_)),
            "unexpected error: {err:?}"
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_rejected_request_is_upstream_response() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // Drain the whole request so closing the socket does not reset it.
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let body = r#"{"error": "bad feature vector"}"#;
            write!(
                stream,
                "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
        });

        let err = predictor_at(port).predict(&vector()).unwrap_err();
        server.join().unwrap();
        assert!(
            matches!(err, SleepwiseError::UpstreamResponse(ref msg) if msg.contains("bad feature vector")),
            "unexpected error: {err:?}"
        );
    }
}
