//! Metrics backend collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::MetricsError;

/// One labeled sample of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: BTreeMap<String, String>,
    /// Unix timestamp (seconds, fractional).
    pub timestamp: f64,
    pub value: f64,
}

/// One labeled series of a range vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: BTreeMap<String, String>,
    pub values: Vec<(f64, f64)>,
}

/// Result of a point-in-time query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Vector(Vec<Sample>),
    Matrix(Vec<Series>),
    Scalar { timestamp: f64, value: f64 },
    String { timestamp: f64, value: String },
}

impl QueryValue {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryValue::Vector(_) => "vector",
            QueryValue::Matrix(_) => "matrix",
            QueryValue::Scalar { .. } => "scalar",
            QueryValue::String { .. } => "string",
        }
    }

    /// Unwrap an instant vector, rejecting every other result shape.
    pub fn into_vector(self) -> Result<Vec<Sample>, MetricsError> {
        match self {
            QueryValue::Vector(samples) => Ok(samples),
            other => Err(MetricsError::UnexpectedResultShape(other.kind())),
        }
    }
}

/// Point-in-time query service returning labeled numeric series.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Evaluate `query` at the current instant.
    async fn query(&self, query: &str) -> Result<QueryValue, MetricsError>;

    /// Evaluate `query` and require an instant vector result.
    async fn query_vector(&self, query: &str) -> Result<Vec<Sample>, MetricsError> {
        self.query(query).await?.into_vector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_vector_accepts_vectors() {
        let value = QueryValue::Vector(vec![]);
        assert_eq!(value.into_vector().unwrap(), vec![]);
    }

    #[test]
    fn into_vector_rejects_scalars() {
        let value = QueryValue::Scalar {
            timestamp: 1.0,
            value: 3.0,
        };
        let err = value.into_vector().unwrap_err();
        assert!(matches!(err, MetricsError::UnexpectedResultShape("scalar")));
    }
}
