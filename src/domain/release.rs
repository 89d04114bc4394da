use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Dotted numeric release, compared segment by segment with missing segments as zero,
/// so `16` == `16.0` and `14.04` < `16`.
#[derive(Debug, Clone, Eq)]
pub struct ReleaseVersion {
    segments: Vec<u64>,
}

impl ReleaseVersion {
    /// Extracts the release from `lsb_release -a` output (`Release:<tab>16.04`).
    pub fn from_lsb_release(output: &str) -> Result<Self> {
        let release = output
            .lines()
            .find_map(|line| line.trim_start().strip_prefix("Release:"))
            .ok_or_else(|| Error::parse("OS release", format!("no 'Release:' line in {:?}", output.trim())))?;

        release.trim().parse()
    }

    fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for ReleaseVersion {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let segments = value
            .trim()
            .split('.')
            .map(|segment| segment.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::parse("OS release", format!("'{}': {}", value.trim(), e)))?;

        Ok(ReleaseVersion { segments })
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len).map(|i| self.segment(i).cmp(&other.segment(i))).find(|o| o.is_ne()).unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(value: &str) -> ReleaseVersion {
        value.parse().unwrap()
    }

    #[test]
    fn test_ordering() {
        assert!(v("14.04") < v("16"));
        assert!(v("16.04") >= v("16"));
        assert_eq!(v("16"), v("16.0"));
        assert!(v("18.04") > v("16.10"));
    }

    #[test]
    fn test_from_lsb_release() {
        let output = "No LSB modules are available.\nDistributor ID:\tUbuntu\nDescription:\tUbuntu 14.04.5 LTS\nRelease:\t14.04\nCodename:\ttrusty\n";

        assert_eq!(ReleaseVersion::from_lsb_release(output).unwrap(), v("14.04"));
    }

    #[test]
    fn test_missing_release_line_is_a_parse_error() {
        let result = ReleaseVersion::from_lsb_release("Distributor ID:\tUbuntu\n");

        assert!(matches!(result, Err(Error::ParseError { .. })));
    }

    #[test]
    fn test_non_numeric_release_is_a_parse_error() {
        assert!(matches!("rolling".parse::<ReleaseVersion>(), Err(Error::ParseError { .. })));
    }
}
