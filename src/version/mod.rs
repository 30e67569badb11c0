//! Semantic version handling for release numbering.
//!
//! Release versions are strict `major.minor.patch` triples. Parsing goes through
//! the `semver` crate and then rejects anything carrying pre-release or build
//! metadata, so a value that round-trips through [`SemanticVersion`] always has
//! exactly three numeric components.
//!
//! Versions only ever move forward through [`SemanticVersion::bump`]. Going back
//! is done by restoring the previously recorded text, never by arithmetic.
//!
//! ```rust
//! use wrapkit_cli::version::{BumpKind, SemanticVersion};
//!
//! let v: SemanticVersion = "1.2.3".parse().unwrap();
//! assert_eq!(v.bump(BumpKind::Minor).unwrap().to_string(), "1.3.0");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::core::WrapkitError;

/// Which component of the version a release increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BumpKind {
    /// `x.y.z` -> `x.y.(z+1)`
    #[default]
    Patch,
    /// `x.y.z` -> `x.(y+1).0`
    Minor,
    /// `x.y.z` -> `(x+1).0.0`
    Major,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A `major.minor.patch` release version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string, surrounding whitespace allowed.
    pub fn parse(text: &str) -> Result<Self, WrapkitError> {
        let trimmed = text.trim();
        let parsed = semver::Version::parse(trimmed).map_err(|e| WrapkitError::InvalidVersion {
            version: text.to_string(),
            reason: e.to_string(),
        })?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(WrapkitError::InvalidVersion {
                version: text.to_string(),
                reason: "pre-release and build metadata are not allowed".to_string(),
            });
        }

        Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Return the next version for the given bump kind.
    ///
    /// Fails with `InvalidVersion` when the bumped component is already
    /// `u64::MAX`; wrapping would move the version backwards.
    pub fn bump(self, kind: BumpKind) -> Result<Self, WrapkitError> {
        let next = match kind {
            BumpKind::Patch => self.patch.checked_add(1).map(|p| Self::new(self.major, self.minor, p)),
            BumpKind::Minor => self.minor.checked_add(1).map(|m| Self::new(self.major, m, 0)),
            BumpKind::Major => self.major.checked_add(1).map(|m| Self::new(m, 0, 0)),
        };
        next.ok_or_else(|| WrapkitError::InvalidVersion {
            version: self.to_string(),
            reason: format!("{kind} component cannot be incremented further"),
        })
    }
}

impl FromStr for SemanticVersion {
    type Err = WrapkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let v = SemanticVersion::parse("1.2.3").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));

        let v = SemanticVersion::parse(" 0.0.0\n").unwrap();
        assert_eq!(v, SemanticVersion::new(0, 0, 0));
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        for bad in ["1.2", "1", "1.2.3.4", "", "a.b.c", "1.2.-3", "1.2.3-beta", "1.2.3+build", "v1.2.3"]
        {
            let err = SemanticVersion::parse(bad).unwrap_err();
            assert!(
                matches!(err, WrapkitError::InvalidVersion { .. }),
                "expected InvalidVersion for {bad:?}"
            );
        }
    }

    #[test]
    fn test_bump_patch() {
        let v = SemanticVersion::new(1, 2, 3);
        assert_eq!(v.bump(BumpKind::Patch).unwrap(), SemanticVersion::new(1, 2, 4));
    }

    #[test]
    fn test_bump_patch_twice_adds_two() {
        for v in [SemanticVersion::new(0, 0, 0), SemanticVersion::new(3, 9, 41)] {
            let twice = v.bump(BumpKind::Patch).unwrap().bump(BumpKind::Patch).unwrap();
            assert_eq!(twice, SemanticVersion::new(v.major, v.minor, v.patch + 2));
        }
    }

    #[test]
    fn test_bump_minor_resets_patch() {
        let v = SemanticVersion::new(1, 2, 3).bump(BumpKind::Minor).unwrap();
        assert_eq!(v, SemanticVersion::new(1, 3, 0));
    }

    #[test]
    fn test_bump_major_resets_minor_and_patch() {
        let v = SemanticVersion::new(1, 2, 3).bump(BumpKind::Major).unwrap();
        assert_eq!(v, SemanticVersion::new(2, 0, 0));
    }

    #[test]
    fn test_bump_never_decreases() {
        let v = SemanticVersion::new(4, 5, 6);
        for kind in [BumpKind::Patch, BumpKind::Minor, BumpKind::Major] {
            assert!(v.bump(kind).unwrap() > v);
        }
    }

    #[test]
    fn test_bump_at_component_limit_is_rejected() {
        let v = SemanticVersion::parse("1.2.18446744073709551615").unwrap();
        assert!(matches!(v.bump(BumpKind::Patch), Err(WrapkitError::InvalidVersion { .. })));
        assert_eq!(v.bump(BumpKind::Minor).unwrap(), SemanticVersion::new(1, 3, 0));

        let v = SemanticVersion::new(u64::MAX, 0, 0);
        assert!(v.bump(BumpKind::Major).is_err());
        assert_eq!(v.bump(BumpKind::Patch).unwrap(), SemanticVersion::new(u64::MAX, 0, 1));
    }

    #[test]
    fn test_display_round_trip() {
        let v = SemanticVersion::new(10, 0, 7);
        assert_eq!(v.to_string().parse::<SemanticVersion>().unwrap(), v);
    }

    #[test]
    fn test_default_bump_kind_is_patch() {
        assert_eq!(BumpKind::default(), BumpKind::Patch);
    }
}
