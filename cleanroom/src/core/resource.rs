//! Station resource kinds and the ordering rules between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// A provisionable capability attached to a station.
///
/// The client keeps no record of which kinds are attached; the platform is
/// the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// Metastore access for the station.
    Metastore,
    /// Output tables shared with the collaborating parties.
    CollaboratorShares,
    /// The station compute workspace.
    Workspace,
    /// Scoped identity that executes the collaboration notebook.
    NotebookServicePrincipal,
    /// The collaboration notebook itself.
    Notebook,
}

/// Resources in the order they must be set up.
pub const SETUP_SEQUENCE: [ResourceKind; 5] = [
    ResourceKind::Metastore,
    ResourceKind::CollaboratorShares,
    ResourceKind::Workspace,
    ResourceKind::NotebookServicePrincipal,
    ResourceKind::Notebook,
];

/// Resources in the order they are torn down, before the station is deleted.
///
/// `Workspace` precedes `CollaboratorShares` here although shares are set up
/// first. Both only depend on the metastore, so either order satisfies the
/// prerequisite graph; the platform's established order is kept as is.
pub const TEARDOWN_SEQUENCE: [ResourceKind; 4] = [
    ResourceKind::NotebookServicePrincipal,
    ResourceKind::Workspace,
    ResourceKind::CollaboratorShares,
    ResourceKind::Metastore,
];

impl ResourceKind {
    /// All kinds, in setup order.
    pub const ALL: [Self; 5] = SETUP_SEQUENCE;

    /// Upper-snake wire name, e.g. `NOTEBOOK_SERVICE_PRINCIPAL`.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Metastore => "METASTORE",
            Self::CollaboratorShares => "COLLABORATOR_SHARES",
            Self::Workspace => "WORKSPACE",
            Self::NotebookServicePrincipal => "NOTEBOOK_SERVICE_PRINCIPAL",
            Self::Notebook => "NOTEBOOK",
        }
    }

    /// Lower-snake field name used by per-kind payloads.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Metastore => "metastore",
            Self::CollaboratorShares => "collaborator_shares",
            Self::Workspace => "workspace",
            Self::NotebookServicePrincipal => "notebook_service_principal",
            Self::Notebook => "notebook",
        }
    }

    /// Human readable label for log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Metastore => "metastore",
            Self::CollaboratorShares => "collaborator shares",
            Self::Workspace => "workspace",
            Self::NotebookServicePrincipal => "notebook service principal",
            Self::Notebook => "notebook",
        }
    }

    /// Kinds that must already exist before this one can be set up.
    #[must_use]
    pub fn prerequisites(self) -> &'static [Self] {
        match self {
            Self::Metastore => &[],
            Self::CollaboratorShares | Self::Workspace => &[Self::Metastore],
            Self::NotebookServicePrincipal => &[Self::Workspace],
            Self::Notebook => &[Self::Workspace, Self::NotebookServicePrincipal],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_name().eq_ignore_ascii_case(s) || kind.field_name() == s)
            .ok_or_else(|| ConfigError::new("resource kind", format!("unknown resource '{s}'")))
    }
}

/// Checks that every kind in `sequence` comes after all of its prerequisites.
///
/// # Errors
///
/// Returns `ConfigError` naming the first kind set up before a prerequisite,
/// or a kind listed twice.
pub fn validate_setup_order(sequence: &[ResourceKind]) -> Result<(), ConfigError> {
    for (idx, kind) in sequence.iter().enumerate() {
        if sequence[..idx].contains(kind) {
            return Err(ConfigError::new(
                "setup order",
                format!("{kind} is set up more than once"),
            ));
        }
        for prereq in kind.prerequisites() {
            if !sequence[..idx].contains(prereq) {
                return Err(ConfigError::new(
                    "setup order",
                    format!("{kind} is set up before its prerequisite {prereq}"),
                ));
            }
        }
    }
    Ok(())
}

/// Checks that no kind in `sequence` is torn down while a kind depending on
/// it is still attached.
///
/// # Errors
///
/// Returns `ConfigError` naming the first kind torn down too early.
pub fn validate_teardown_order(sequence: &[ResourceKind]) -> Result<(), ConfigError> {
    for (idx, kind) in sequence.iter().enumerate() {
        if sequence[..idx].contains(kind) {
            return Err(ConfigError::new(
                "teardown order",
                format!("{kind} is torn down more than once"),
            ));
        }
        let remaining = &sequence[idx + 1..];
        if let Some(dependent) = remaining.iter().find(|other| other.prerequisites().contains(kind)) {
            return Err(ConfigError::new(
                "teardown order",
                format!("{kind} is torn down before its dependent {dependent}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_serde() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::json!(kind.wire_name()));
        }
    }

    #[test]
    fn test_from_str_accepts_both_spellings() {
        assert_eq!(
            "NOTEBOOK_SERVICE_PRINCIPAL".parse::<ResourceKind>().unwrap(),
            ResourceKind::NotebookServicePrincipal
        );
        assert_eq!(
            "collaborator_shares".parse::<ResourceKind>().unwrap(),
            ResourceKind::CollaboratorShares
        );
        assert!("cluster".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_setup_sequence_is_valid() {
        assert!(validate_setup_order(&SETUP_SEQUENCE).is_ok());
    }

    #[test]
    fn test_teardown_sequence_is_valid() {
        assert!(validate_teardown_order(&TEARDOWN_SEQUENCE).is_ok());
    }

    #[test]
    fn test_teardown_swaps_shares_and_workspace_relative_to_setup() {
        let setup_shares = SETUP_SEQUENCE
            .iter()
            .position(|k| *k == ResourceKind::CollaboratorShares);
        let setup_workspace = SETUP_SEQUENCE.iter().position(|k| *k == ResourceKind::Workspace);
        let teardown_shares = TEARDOWN_SEQUENCE
            .iter()
            .position(|k| *k == ResourceKind::CollaboratorShares);
        let teardown_workspace = TEARDOWN_SEQUENCE
            .iter()
            .position(|k| *k == ResourceKind::Workspace);

        assert!(setup_shares < setup_workspace);
        assert!(teardown_workspace < teardown_shares);
    }

    #[test]
    fn test_setup_before_prerequisite_rejected() {
        let err = validate_setup_order(&[ResourceKind::Workspace, ResourceKind::Metastore])
            .unwrap_err();
        assert!(err.message.contains("WORKSPACE"));
        assert!(err.message.contains("METASTORE"));
    }

    #[test]
    fn test_duplicate_setup_rejected() {
        let err = validate_setup_order(&[ResourceKind::Metastore, ResourceKind::Metastore])
            .unwrap_err();
        assert!(err.message.contains("more than once"));
    }

    #[test]
    fn test_teardown_before_dependent_rejected() {
        let err = validate_teardown_order(&[ResourceKind::Metastore, ResourceKind::Workspace])
            .unwrap_err();
        assert!(err.message.contains("METASTORE"));
    }
}
