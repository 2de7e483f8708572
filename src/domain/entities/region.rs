use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse geographic region of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Asia,
    China,
    Europe,
    NorthAmerica,
    SouthAmerica,
    MiddleEast,
    Africa,
    Oceania,
    /// Sentinel for ports nobody could place
    Unknown,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Asia => "Asia",
            Region::China => "China",
            Region::Europe => "Europe",
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
            Region::MiddleEast => "Middle East",
            Region::Africa => "Africa",
            Region::Oceania => "Oceania",
            Region::Unknown => "Unknown",
        }
    }

    /// Parse a region name as stored in the ports table. Never fails:
    /// anything unrecognized becomes `Region::Unknown`.
    pub fn parse(raw: &str) -> Region {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "asia" | "asiapacific" | "apac" | "southeastasia" | "eastasia" => Region::Asia,
            "china" | "greaterchina" => Region::China,
            "europe" | "eu" | "northerneurope" | "mediterranean" => Region::Europe,
            "northamerica" | "na" | "usa" | "us" => Region::NorthAmerica,
            "southamerica" | "latam" | "latinamerica" => Region::SouthAmerica,
            "middleeast" | "mena" => Region::MiddleEast,
            "africa" => Region::Africa,
            "oceania" | "australia" => Region::Oceania,
            _ => Region::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Region::Unknown
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Region condition guarding the intra-region modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGate {
    pub regions: Vec<Region>,
}

impl RegionGate {
    pub fn new(regions: Vec<Region>) -> Self {
        RegionGate { regions }
    }

    /// Both ends must be in the gate list. `Unknown` never satisfies a gate,
    /// even if it was configured into the list.
    pub fn admits(&self, origin: Region, destination: Region) -> bool {
        origin.is_known()
            && destination.is_known()
            && self.regions.contains(&origin)
            && self.regions.contains(&destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parse_aliases() {
        assert_eq!(Region::parse("Asia"), Region::Asia);
        assert_eq!(Region::parse("north america"), Region::NorthAmerica);
        assert_eq!(Region::parse("North-America"), Region::NorthAmerica);
        assert_eq!(Region::parse("CHINA"), Region::China);
        assert_eq!(Region::parse("Middle East"), Region::MiddleEast);
    }

    #[test]
    fn test_region_parse_unknown() {
        assert_eq!(Region::parse(""), Region::Unknown);
        assert_eq!(Region::parse("Atlantis"), Region::Unknown);
        assert!(!Region::parse("Atlantis").is_known());
    }

    #[test]
    fn test_gate_admits_only_listed_regions() {
        let gate = RegionGate::new(vec![Region::Asia, Region::China]);
        assert!(gate.admits(Region::China, Region::Asia));
        assert!(gate.admits(Region::Asia, Region::Asia));
        assert!(!gate.admits(Region::China, Region::Europe));
        assert!(!gate.admits(Region::Europe, Region::Europe));
    }

    #[test]
    fn test_gate_never_admits_unknown() {
        let gate = RegionGate::new(vec![Region::Unknown, Region::Asia]);
        assert!(!gate.admits(Region::Unknown, Region::Unknown));
        assert!(!gate.admits(Region::Unknown, Region::Asia));
    }
}
