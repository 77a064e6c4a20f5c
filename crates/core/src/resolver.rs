//! Clinical code resolution against the Reference Lookup Service.
//!
//! One GET per condition identifier is issued to
//! `<base>/get-value-sets?condition_code=<id>`; all lookups for a call run concurrently and the
//! call waits for every one of them. Resolution is atomic: if any lookup does not succeed, none
//! of the results are used. Lookups are never retried here.

use crate::config::CoreConfig;
use crate::constants::{CONDITION_CODE_PARAM, VALUE_SETS_PATH};
use crate::error::LookupFailure;
use crate::{RefinerError, RefinerResult};
use futures::future::join_all;
use indexmap::IndexMap;
use refiner_types::ConditionCode;
use reqwest::StatusCode;
use serde::Deserialize;

/// A code system and the codes in it that are relevant to a condition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClinicalService {
    pub system: String,
    pub codes: Vec<String>,
}

/// Lookup response body: grouping key (for example `lrtc`) to clinical services.
type ValueSetsResponse = IndexMap<String, Vec<ClinicalService>>;

/// HTTP client for the Reference Lookup Service.
#[derive(Clone, Debug)]
pub struct ReferenceClient {
    http: reqwest::Client,
    value_sets_url: String,
}

impl ReferenceClient {
    /// Create a client for the service configured in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `RefinerError::InvalidConfig` if the HTTP client cannot be constructed.
    pub fn new(cfg: &CoreConfig) -> RefinerResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.lookup_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| RefinerError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            value_sets_url: format!("{}{}", cfg.reference_base_url(), VALUE_SETS_PATH),
        })
    }

    /// Resolves every condition into its clinical services.
    ///
    /// Results are flattened in request order, and within one response in the order the service
    /// listed them.
    ///
    /// # Errors
    ///
    /// - `RefinerError::Resolution` listing every lookup that did not return 200,
    /// - `RefinerError::MalformedReference` if a successful lookup's body does not have the
    ///   expected shape.
    pub async fn resolve_conditions(
        &self,
        conditions: &[ConditionCode],
    ) -> RefinerResult<Vec<ClinicalService>> {
        let outcomes = join_all(conditions.iter().map(|condition| self.lookup(condition))).await;

        let mut bodies = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (condition, outcome) in conditions.iter().zip(outcomes) {
            match outcome {
                Ok(body) => bodies.push((condition, body)),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                failed = failures.len(),
                requested = conditions.len(),
                "reference lookups failed"
            );
            return Err(RefinerError::Resolution { failures });
        }

        let mut services = Vec::new();
        for (condition, body) in bodies {
            let groups: ValueSetsResponse =
                serde_json::from_str(&body).map_err(|e| RefinerError::MalformedReference {
                    condition: condition.to_string(),
                    message: e.to_string(),
                })?;
            services.extend(groups.into_values().flatten());
        }

        tracing::debug!(services = services.len(), "resolved clinical services");
        Ok(services)
    }

    async fn lookup(&self, condition: &ConditionCode) -> Result<String, LookupFailure> {
        let failure = |status: Option<u16>, message: String| LookupFailure {
            condition: condition.to_string(),
            status,
            message,
        };

        let response = self
            .http
            .get(&self.value_sets_url)
            .query(&[(CONDITION_CODE_PARAM, condition.as_str())])
            .send()
            .await
            .map_err(|e| failure(None, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(failure(Some(status.as_u16()), status.to_string()));
        }

        response
            .text()
            .await
            .map_err(|e| failure(Some(status.as_u16()), e.to_string()))
    }
}
