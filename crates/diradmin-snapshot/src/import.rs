//! Applying an activated unit tree to a configuration store.

use crate::snapshot::{account_templates, decode_certificates};
use crate::unit::{ImportUnit, UnitIdentity, UnitNode};
use crate::Result;
use diradmin_core::{Error, MainConfig, ProfileSettings};
use diradmin_store::ConfigStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counts of what an import run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Global settings were written
    pub main_config: bool,
    /// Certificate bundle was written
    pub certificates: bool,
    /// Number of server profiles written
    pub profiles_saved: usize,
    /// Number of account templates written
    pub templates_saved: usize,
    /// Number of leaves skipped because they were not activated
    pub inactive_units: usize,
}

/// Writes activated import units through a [`ConfigStore`].
///
/// Global settings and certificates are critical: a failure there stops the run immediately.
/// Profile and template writes are independent; their failures are collected and reported once
/// as [`Error::AggregateImportError`] after every activated unit has been attempted. Nothing is
/// rolled back.
pub struct Importer {
    store: Arc<dyn ConfigStore>,
}

impl Importer {
    /// Creates an importer writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Applies every active leaf of `units`, depth-first, one write at a time.
    ///
    /// Container flags are ignored; each leaf's own flag decides whether it is applied.
    ///
    /// # Errors
    ///
    /// Returns the store or decode error of a failed global settings or certificates unit
    /// immediately. Otherwise returns [`Error::AggregateImportError`] listing every profile
    /// name and `profile:type:template` identifier that could not be written.
    pub async fn run_import(&self, units: Vec<ImportUnit>) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let mut failed = Vec::new();

        for unit in units.iter().flat_map(ImportUnit::iter) {
            let UnitNode::Leaf { identity, payload } = unit.node() else {
                continue;
            };
            if !unit.is_active() {
                report.inactive_units += 1;
                continue;
            }

            match identity {
                UnitIdentity::MainConfig => {
                    self.apply_main_config(payload).await?;
                    report.main_config = true;
                }
                UnitIdentity::Certificates => {
                    self.apply_certificates(payload).await?;
                    report.certificates = true;
                }
                UnitIdentity::ServerProfile { profile } => {
                    if self.apply_server_profile(profile, payload).await {
                        report.profiles_saved += 1;
                    } else {
                        failed.push(profile.clone());
                    }
                }
                UnitIdentity::AccountProfile { profile } => {
                    report.templates_saved += self
                        .apply_account_profile(profile, payload, &mut failed)
                        .await;
                }
            }
        }

        if !failed.is_empty() {
            warn!(failed = failed.len(), "import finished with failures");
            return Err(Error::AggregateImportError { failed });
        }

        info!(
            profiles = report.profiles_saved,
            templates = report.templates_saved,
            skipped = report.inactive_units,
            "import finished"
        );
        Ok(report)
    }

    async fn apply_main_config(&self, payload: &Value) -> Result<()> {
        let config = MainConfig::from_value(payload)?;
        if let Err(err) = self.store.save_main_config(&config).await {
            error!("failed to save global settings, aborting import: {err}");
            return Err(err);
        }
        debug!("global settings imported");
        Ok(())
    }

    async fn apply_certificates(&self, payload: &Value) -> Result<()> {
        let certificates = decode_certificates(payload)?;
        if let Err(err) = self.store.save_certificates(&certificates).await {
            error!("failed to save certificates, aborting import: {err}");
            return Err(err);
        }
        debug!(bytes = certificates.len(), "certificates imported");
        Ok(())
    }

    async fn apply_server_profile(&self, profile: &str, payload: &Value) -> bool {
        let settings = match ProfileSettings::from_value(payload) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(profile = %profile, "cannot decode profile settings: {err}");
                return false;
            }
        };
        let saved = self.store.save_profile(profile, &settings).await;
        if saved {
            debug!(profile = %profile, "server profile imported");
        } else {
            warn!(profile = %profile, "server profile could not be saved");
        }
        saved
    }

    /// Writes every template of one profile, returning how many were saved.
    async fn apply_account_profile(
        &self,
        profile: &str,
        payload: &Value,
        failed: &mut Vec<String>,
    ) -> usize {
        let entries = match account_templates(payload) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(profile = %profile, "cannot decode account profile: {err}");
                failed.push(profile.to_string());
                return 0;
            }
        };

        let mut saved = 0;
        for entry in entries {
            if self
                .store
                .save_template(profile, entry.type_id, entry.name, entry.data)
                .await
            {
                saved += 1;
            } else {
                let id = format!("{profile}:{}:{}", entry.type_id, entry.name);
                warn!(template = %id, "account template could not be saved");
                failed.push(id);
            }
        }
        debug!(profile = %profile, templates = saved, "account profile imported");
        saved
    }
}
