use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic identity of a borefield configuration.
///
/// The fingerprint is the SHA-256 digest of the canonical JSON serialization
/// of everything a g-function computation depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprints any serializable description of a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized to JSON, which
    /// happens for maps with non-string keys.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self(format!("{:x}", Sha256::digest(&bytes))))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Geometry {
        length: f64,
        diameter: f64,
    }

    #[test]
    fn equal_inputs_share_a_fingerprint() -> Result<(), serde_json::Error> {
        let a = Fingerprint::of(&Geometry { length: 100.0, diameter: 0.11 })?;
        let b = Fingerprint::of(&Geometry { length: 100.0, diameter: 0.11 })?;
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        Ok(())
    }

    #[test]
    fn any_change_alters_the_fingerprint() -> Result<(), serde_json::Error> {
        let a = Fingerprint::of(&Geometry { length: 100.0, diameter: 0.11 })?;
        let b = Fingerprint::of(&Geometry { length: 100.0, diameter: 0.110_000_000_1 })?;
        assert_ne!(a, b);
        Ok(())
    }
}
