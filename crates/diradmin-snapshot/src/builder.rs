//! Turns a snapshot into an import unit tree.

use crate::snapshot::{account_templates, decode_certificates, json_type_name, Section, Snapshot};
use crate::unit::{ContainerKind, ImportUnit, UnitIdentity};
use crate::Result;
use diradmin_core::{Error, FormatIssue};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// Advisory notice that a snapshot section was skipped because it is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSectionWarning {
    /// Name of the skipped section
    pub section: String,
}

impl fmt::Display for UnknownSectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown snapshot section `{}` ignored", self.section)
    }
}

/// Result of building a snapshot: the unit tree and any skipped sections.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPlan {
    /// Top-level units in document order
    pub units: Vec<ImportUnit>,
    /// Sections that were not materialized into units
    pub warnings: Vec<UnknownSectionWarning>,
}

/// Builds [`ImportUnit`] trees from snapshots.
pub struct StepBuilder;

impl StepBuilder {
    /// Decodes snapshot bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the bytes are not a JSON object.
    pub fn parse(bytes: &[u8]) -> Result<Snapshot> {
        Snapshot::from_slice(bytes)
    }

    /// Decodes snapshot bytes and builds the unit tree.
    ///
    /// # Errors
    ///
    /// See [`StepBuilder::parse`] and [`StepBuilder::build`].
    pub fn build_from_slice(bytes: &[u8]) -> Result<UnitPlan> {
        Self::build(&Self::parse(bytes)?)
    }

    /// Builds the unit tree, returning only the units.
    ///
    /// # Errors
    ///
    /// See [`StepBuilder::build`].
    pub fn build_units(snapshot: &Snapshot) -> Result<Vec<ImportUnit>> {
        Ok(Self::build(snapshot)?.units)
    }

    /// Builds the unit tree of `snapshot`, walking sections in document order.
    ///
    /// Unknown sections are logged and reported in [`UnitPlan::warnings`]; they never fail the
    /// build. All units start inactive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatError`] if the snapshot holds no recognized section, and
    /// [`Error::ParseError`] if a recognized section does not have the expected shape.
    pub fn build(snapshot: &Snapshot) -> Result<UnitPlan> {
        if snapshot.is_empty() {
            return Err(Error::FormatError(FormatIssue::EmptyDocument));
        }

        let mut units = Vec::new();
        let mut warnings = Vec::new();

        for (name, payload) in snapshot.sections() {
            let Some(section) = Section::from_name(name) else {
                warn!(section = %name, "ignoring unknown snapshot section");
                warnings.push(UnknownSectionWarning {
                    section: name.to_string(),
                });
                continue;
            };
            debug!(section = %section, "building import units");
            units.push(build_section(section, payload)?);
        }

        if units.is_empty() {
            return Err(Error::FormatError(FormatIssue::NoRecognizedSections {
                sections: snapshot.section_names(),
            }));
        }

        Ok(UnitPlan { units, warnings })
    }
}

fn build_section(section: Section, payload: &Value) -> Result<ImportUnit> {
    match section {
        Section::MainConfig => {
            expect_object(section, payload)?;
            Ok(ImportUnit::leaf(UnitIdentity::MainConfig, payload.clone()))
        }
        Section::Certificates => {
            decode_certificates(payload)
                .map_err(|e| Error::ParseError(format!("{section}: {e}")))?;
            let payload = if payload.is_null() {
                Value::String(String::new())
            } else {
                payload.clone()
            };
            Ok(ImportUnit::leaf(UnitIdentity::Certificates, payload))
        }
        Section::ServerProfiles => {
            let children = expect_object(section, payload)?
                .iter()
                .map(|(profile, settings)| {
                    if settings.is_object() {
                        Ok(ImportUnit::leaf(
                            UnitIdentity::server_profile(profile.as_str()),
                            settings.clone(),
                        ))
                    } else {
                        Err(Error::ParseError(format!(
                            "{section}: profile `{profile}` must be an object, found {}",
                            json_type_name(settings)
                        )))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ImportUnit::container(ContainerKind::ServerProfiles, children))
        }
        Section::AccountProfiles => {
            let children = expect_object(section, payload)?
                .iter()
                .map(|(profile, bundle)| {
                    account_templates(bundle).map_err(|e| {
                        Error::ParseError(format!("{section}: profile `{profile}`: {e}"))
                    })?;
                    Ok(ImportUnit::leaf(
                        UnitIdentity::account_profile(profile.as_str()),
                        bundle.clone(),
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ImportUnit::container(ContainerKind::AccountProfiles, children))
        }
    }
}

fn expect_object(section: Section, payload: &Value) -> Result<&Map<String, Value>> {
    payload.as_object().ok_or_else(|| {
        Error::ParseError(format!(
            "{section} must be an object, found {}",
            json_type_name(payload)
        ))
    })
}
