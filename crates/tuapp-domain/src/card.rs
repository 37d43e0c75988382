//! Physical card profile and lifecycle status.
//!
//! Wire names are the Catalan labels stored in the database and exchanged with the
//! mobile app; Rust variant names are their English equivalents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fare profile of a card. Determines the two-letter card-code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardProfile {
    #[serde(rename = "General")]
    General,
    #[serde(rename = "Jove")]
    Youth,
    #[serde(rename = "Infantil")]
    Child,
    #[serde(rename = "Pensionista")]
    Pensioner,
    #[serde(rename = "Altres")]
    Other,
}

impl CardProfile {
    pub const ALL: [CardProfile; 5] = [
        Self::General,
        Self::Youth,
        Self::Child,
        Self::Pensioner,
        Self::Other,
    ];

    /// Two-letter prefix of every card code issued for this profile.
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::General => "GE",
            Self::Youth => "JV",
            Self::Child => "IN",
            Self::Pensioner => "PE",
            Self::Other => "AT",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Youth => "Jove",
            Self::Child => "Infantil",
            Self::Pensioner => "Pensionista",
            Self::Other => "Altres",
        }
    }
}

/// Lifecycle status of a physical card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardStatus {
    #[serde(rename = "Activa")]
    Active,
    #[serde(rename = "Robada")]
    Stolen,
    #[serde(rename = "Caducada")]
    Expired,
    #[serde(rename = "Perduda")]
    Lost,
    #[serde(rename = "Desactivada")]
    Deactivated,
    #[serde(rename = "Altres")]
    Other,
}

impl CardStatus {
    pub const ALL: [CardStatus; 6] = [
        Self::Active,
        Self::Stolen,
        Self::Expired,
        Self::Lost,
        Self::Deactivated,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Activa",
            Self::Stolen => "Robada",
            Self::Expired => "Caducada",
            Self::Lost => "Perduda",
            Self::Deactivated => "Desactivada",
            Self::Other => "Altres",
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Terminal statuses: a card in one of these can no longer be modified.
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Stolen | Self::Expired)
    }
}

/// Returned when a stored profile or status label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown card label: {0}")]
pub struct UnknownCardLabel(pub String);

impl FromStr for CardProfile {
    type Err = UnknownCardLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownCardLabel(s.to_owned()))
    }
}

impl FromStr for CardStatus {
    type Err = UnknownCardLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownCardLabel(s.to_owned()))
    }
}

impl fmt::Display for CardProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
