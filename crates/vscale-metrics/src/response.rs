//! Prometheus query API response decoding.
//!
//! ```json
//! {"status":"success","data":{"resultType":"vector","result":[
//!   {"metric":{"job":"mc"},"value":[1700000000.123,"4"]}
//! ]}}
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use vscale_core::{MetricsError, QueryValue, Sample, Series};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum QueryData {
    Vector(Vec<RawSample>),
    Matrix(Vec<RawSeries>),
    Scalar(RawPoint),
    String(RawPoint),
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: RawPoint,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    values: Vec<RawPoint>,
}

/// `[<unix seconds>, "<value>"]`
type RawPoint = (f64, String);

/// Decode a query API body into a `QueryValue`.
pub fn decode(body: &[u8]) -> Result<QueryValue, MetricsError> {
    let resp: ApiResponse =
        serde_json::from_slice(body).map_err(|e| MetricsError::Decode(e.to_string()))?;

    if resp.status != "success" {
        return Err(MetricsError::Api {
            error_type: resp.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: resp.error.unwrap_or_else(|| format!("status {}", resp.status)),
        });
    }

    let data = resp
        .data
        .ok_or_else(|| MetricsError::Decode("success response without data".to_string()))?;

    Ok(match data {
        QueryData::Vector(samples) => QueryValue::Vector(
            samples
                .into_iter()
                .map(|s| {
                    Ok(Sample {
                        labels: s.metric,
                        timestamp: s.value.0,
                        value: parse_value(&s.value.1)?,
                    })
                })
                .collect::<Result<_, MetricsError>>()?,
        ),
        QueryData::Matrix(series) => QueryValue::Matrix(
            series
                .into_iter()
                .map(|s| {
                    let values = s
                        .values
                        .iter()
                        .map(|(ts, v)| Ok((*ts, parse_value(v)?)))
                        .collect::<Result<_, MetricsError>>()?;
                    Ok(Series {
                        labels: s.metric,
                        values,
                    })
                })
                .collect::<Result<_, MetricsError>>()?,
        ),
        QueryData::Scalar((timestamp, value)) => QueryValue::Scalar {
            timestamp,
            value: parse_value(&value)?,
        },
        QueryData::String((timestamp, value)) => QueryValue::String { timestamp, value },
    })
}

/// Sample values are strings so that `NaN` and infinities survive JSON.
fn parse_value(raw: &str) -> Result<f64, MetricsError> {
    match raw {
        "NaN" => Ok(f64::NAN),
        "+Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        other => other
            .parse::<f64>()
            .map_err(|e| MetricsError::Decode(format!("bad sample value {other:?}: {e}"))),
    }
}
