//! UAE emirates as place-of-supply and postal region codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the seven emirates, or a region value stored outside the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emirate {
    AbuDhabi,
    #[default]
    Dubai,
    Sharjah,
    Ajman,
    UmmAlQuwain,
    RasAlKhaimah,
    Fujairah,
    /// Value not covered by the lookup table, kept verbatim.
    Other(String),
}

impl Emirate {
    /// All seven emirates in their conventional order.
    pub const ALL: [Emirate; 7] = [
        Self::AbuDhabi,
        Self::Dubai,
        Self::Sharjah,
        Self::Ajman,
        Self::UmmAlQuwain,
        Self::RasAlKhaimah,
        Self::Fujairah,
    ];

    /// Value persisted on company and invoice records (e.g. "DUBAI").
    pub fn code(&self) -> &str {
        match self {
            Self::AbuDhabi => "ABU_DHABI",
            Self::Dubai => "DUBAI",
            Self::Sharjah => "SHARJAH",
            Self::Ajman => "AJMAN",
            Self::UmmAlQuwain => "UMM_AL_QUWAIN",
            Self::RasAlKhaimah => "RAS_AL_KHAIMAH",
            Self::Fujairah => "FUJAIRAH",
            Self::Other(s) => s,
        }
    }

    /// Human-readable name printed on documents.
    pub fn display_name(&self) -> &str {
        match self {
            Self::AbuDhabi => "Abu Dhabi",
            Self::Dubai => "Dubai",
            Self::Sharjah => "Sharjah",
            Self::Ajman => "Ajman",
            Self::UmmAlQuwain => "Umm Al Quwain",
            Self::RasAlKhaimah => "Ras Al Khaimah",
            Self::Fujairah => "Fujairah",
            Self::Other(s) => s.trim(),
        }
    }

    /// Two-letter `CountrySubentityCode`.
    ///
    /// Unmapped values use their first two characters, uppercased.
    pub fn subentity_code(&self) -> String {
        match self {
            Self::AbuDhabi => "AZ".into(),
            Self::Dubai => "DU".into(),
            Self::Sharjah => "SH".into(),
            Self::Ajman => "AJ".into(),
            Self::UmmAlQuwain => "UQ".into(),
            Self::RasAlKhaimah => "RK".into(),
            Self::Fujairah => "FU".into(),
            Self::Other(s) => s.trim().chars().take(2).collect::<String>().to_uppercase(),
        }
    }

    /// Resolve a stored code, display name or legacy alias.
    ///
    /// Never fails: unknown input becomes [`Emirate::Other`].
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let key: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "ABUDHABI" | "AD" | "AZ" => Self::AbuDhabi,
            "DUBAI" | "DU" => Self::Dubai,
            "SHARJAH" | "SH" => Self::Sharjah,
            "AJMAN" | "AJ" => Self::Ajman,
            "UMMALQUWAIN" | "UQ" => Self::UmmAlQuwain,
            "RASALKHAIMAH" | "RK" => Self::RasAlKhaimah,
            "FUJAIRAH" | "FU" => Self::Fujairah,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Emirate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Emirate {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Emirate {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Emirate> for String {
    fn from(value: Emirate) -> Self {
        value.code().to_string()
    }
}
