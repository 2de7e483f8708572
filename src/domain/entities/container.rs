use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ProviderError;

/// ISO container types accepted by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContainerType {
    Dry20,
    Dry40,
    HighCube40,
    HighCube45,
    Reefer20,
    Reefer40,
}

impl ContainerType {
    pub fn code(&self) -> &'static str {
        match self {
            ContainerType::Dry20 => "20DV",
            ContainerType::Dry40 => "40DV",
            ContainerType::HighCube40 => "40HC",
            ContainerType::HighCube45 => "45HC",
            ContainerType::Reefer20 => "20RF",
            ContainerType::Reefer40 => "40RF",
        }
    }

    /// Twenty-foot equivalent units
    pub fn teu(&self) -> f64 {
        match self {
            ContainerType::Dry20 | ContainerType::Reefer20 => 1.0,
            ContainerType::Dry40 | ContainerType::HighCube40 | ContainerType::Reefer40 => 2.0,
            ContainerType::HighCube45 => 2.25,
        }
    }

    pub fn is_reefer(&self) -> bool {
        matches!(self, ContainerType::Reefer20 | ContainerType::Reefer40)
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ContainerType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();

        match key.as_str() {
            "20DV" | "20GP" | "20DC" | "20" | "20FT" => Ok(ContainerType::Dry20),
            "40DV" | "40GP" | "40DC" | "40" | "40FT" => Ok(ContainerType::Dry40),
            "40HC" | "40HQ" => Ok(ContainerType::HighCube40),
            "45HC" | "45HQ" | "45" => Ok(ContainerType::HighCube45),
            "20RF" | "20RE" | "20REEFER" => Ok(ContainerType::Reefer20),
            "40RF" | "40RH" | "40REEFER" => Ok(ContainerType::Reefer40),
            _ => Err(ProviderError::Lookup(format!("Unknown container type: {}", s))),
        }
    }
}

impl TryFrom<String> for ContainerType {
    type Error = ProviderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContainerType> for String {
    fn from(value: ContainerType) -> Self {
        value.code().to_string()
    }
}
