use std::future::Future;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::report::{ValidationMessage, ValidationReport, ValidationStatus};
use super::rules::check_document;
use super::structure::check_structure;
use crate::core::ZatcaError;

/// ZATCA platform environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer portal, accepts any test certificate.
    #[default]
    Sandbox,
    /// Simulation environment with production-like rules.
    Simulation,
    Production,
}

impl Environment {
    /// Base URL of the e-invoicing API for this environment.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://gw-fatoora.zatca.gov.sa/e-invoicing/developer-portal",
            Self::Simulation => "https://gw-fatoora.zatca.gov.sa/e-invoicing/simulation",
            Self::Production => "https://gw-fatoora.zatca.gov.sa/e-invoicing/core",
        }
    }
}

/// Input of a gateway validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    pub xml: String,
    #[serde(default)]
    pub environment: Environment,
    /// Correlation id echoed in the report; generated when absent.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ValidationOptions {
    pub fn new(xml: impl Into<String>) -> Self {
        Self {
            xml: xml.into(),
            ..Default::default()
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Something that validates invoice XML and answers with a report.
///
/// A network client for the ZATCA compliance API would implement this;
/// [`LocalSimulator`] answers offline.
pub trait ComplianceGateway {
    fn validate(
        &self,
        options: &ValidationOptions,
    ) -> impl Future<Output = Result<ValidationReport, ZatcaError>> + Send;
}

/// Offline gateway running the local business rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSimulator;

impl LocalSimulator {
    /// Produce the report synchronously: the structure pre-check, then
    /// the business rules.
    pub fn report(&self, options: &ValidationOptions) -> ValidationReport {
        let (parsed, messages) = match check_document(&options.xml) {
            Ok(rules) => (true, merge_findings(check_structure(&options.xml), rules)),
            Err(message) => (false, vec![message]),
        };
        let status = ValidationStatus::from_messages(parsed, &messages);
        let request_id = options
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        log::debug!(
            "simulated {:?} validation ({}) request {request_id}: {status:?}, {} message(s)",
            options.environment,
            options.environment.base_url(),
            messages.len()
        );

        ValidationReport {
            is_valid: status.is_valid(),
            validation_status: status,
            validation_messages: messages,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            request_id: Some(request_id),
            environment: options.environment,
        }
    }
}

/// Structure findings first, minus those a business rule already
/// reports at or below the same path.
fn merge_findings(
    structure: Vec<ValidationMessage>,
    rules: Vec<ValidationMessage>,
) -> Vec<ValidationMessage> {
    let covered = |path: &str| {
        rules
            .iter()
            .filter(|m| m.is_error())
            .filter_map(|m| m.path.as_deref())
            .any(|p| {
                p.strip_prefix(path)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '[']))
            })
    };
    let mut merged: Vec<ValidationMessage> = structure
        .into_iter()
        .filter(|m| !m.path.as_deref().is_some_and(covered))
        .collect();
    merged.extend(rules);
    merged
}

impl ComplianceGateway for LocalSimulator {
    fn validate(
        &self,
        options: &ValidationOptions,
    ) -> impl Future<Output = Result<ValidationReport, ZatcaError>> + Send {
        std::future::ready(Ok(self.report(options)))
    }
}

/// Validate an invoice the way the ZATCA compliance API would, using the
/// offline simulator.
pub async fn validate_xml_with_zatca(
    options: ValidationOptions,
) -> Result<ValidationReport, ZatcaError> {
    LocalSimulator.validate(&options).await
}
