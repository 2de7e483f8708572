use sha2::{Digest, Sha256};

use crate::config::FallbackBand;
use crate::domain::entities::container::ContainerType;

/// Deterministic synthetic base rate used when no core index is available.
///
/// The route and container are hashed with SHA-256 so the same tuple maps to
/// the same whole-unit rate inside `band` on every run and platform.
pub fn synthetic_base_rate(
    origin_port_id: &str,
    destination_port_id: &str,
    container_type: ContainerType,
    band: &FallbackBand,
) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(origin_port_id.trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(destination_port_id.trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(container_type.code().as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let seed = u64::from_be_bytes(prefix);

    let low = band.min.ceil() as u64;
    let high = band.max.floor().max(band.min.ceil()) as u64;
    let span = high - low + 1;

    (low + seed % span) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> FallbackBand {
        FallbackBand {
            min: 1500.0,
            max: 3000.0,
        }
    }

    #[test]
    fn test_synthetic_rate_is_deterministic() {
        let first = synthetic_base_rate("CNSHA", "NLRTM", ContainerType::Dry40, &band());
        for _ in 0..10 {
            let again = synthetic_base_rate("CNSHA", "NLRTM", ContainerType::Dry40, &band());
            assert_eq!(first.to_bits(), again.to_bits());
        }
    }

    #[test]
    fn test_synthetic_rate_within_band() {
        let routes = [
            ("CNSHA", "NLRTM"),
            ("SGSIN", "USLAX"),
            ("DEHAM", "BRSSZ"),
            ("X", "Y"),
            ("", ""),
        ];
        for (origin, destination) in routes {
            for container in [ContainerType::Dry20, ContainerType::HighCube40, ContainerType::Reefer40] {
                let rate = synthetic_base_rate(origin, destination, container, &band());
                assert!((1500.0..=3000.0).contains(&rate), "{} out of band", rate);
                assert_eq!(rate.fract(), 0.0);
            }
        }
    }

    #[test]
    fn test_synthetic_rate_depends_on_whole_tuple() {
        let a = synthetic_base_rate("CNSHA", "NLRTM", ContainerType::Dry20, &band());
        let b = synthetic_base_rate("NLRTM", "CNSHA", ContainerType::Dry20, &band());
        let c = synthetic_base_rate("CNSHA", "NLRTM", ContainerType::Dry40, &band());
        // Distinct tuples hash independently; at least one must differ
        assert!(a != b || a != c);
    }

    #[test]
    fn test_synthetic_rate_ignores_case_and_whitespace() {
        let a = synthetic_base_rate("cnsha ", "nlrtm", ContainerType::Dry20, &band());
        let b = synthetic_base_rate("CNSHA", "NLRTM", ContainerType::Dry20, &band());
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_band_collapses_to_single_value() {
        let band = FallbackBand {
            min: 2000.0,
            max: 2000.0,
        };
        assert_eq!(
            synthetic_base_rate("CNSHA", "NLRTM", ContainerType::Dry20, &band),
            2000.0
        );
    }
}
