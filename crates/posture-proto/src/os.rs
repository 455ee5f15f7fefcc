//! Operating-system identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating-system family, derived from the product name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsType {
    /// Debian GNU/Linux
    Debian,
    /// Ubuntu
    Ubuntu,
    /// Fedora
    Fedora,
    /// Red Hat Enterprise Linux
    RedHat,
    /// CentOS
    CentOs,
    /// SUSE / openSUSE
    Suse,
    /// Gentoo
    Gentoo,
    /// Android
    Android,
    /// Anything else
    Unknown,
}

/// Product-name prefixes, matched in order
const PREFIXES: &[(&str, OsType)] = &[
    ("Debian", OsType::Debian),
    ("Ubuntu", OsType::Ubuntu),
    ("Fedora", OsType::Fedora),
    ("Red Hat", OsType::RedHat),
    ("CentOS", OsType::CentOs),
    ("SUSE", OsType::Suse),
    ("openSUSE", OsType::Suse),
    ("Gentoo", OsType::Gentoo),
    ("Android", OsType::Android),
];

impl OsType {
    /// Detect the family from a product name such as `"Ubuntu 12.04 LTS"`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map_or(Self::Unknown, |&(_, os_type)| os_type)
    }
}

/// Accepted operating-system identity of an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OsInfo {
    /// Detected family
    pub os_type: OsType,
    /// Product name
    pub name: String,
    /// Version string
    pub version: String,
}

impl OsInfo {
    /// Build an identity, detecting the family from `name`
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self { os_type: OsType::from_name(&name), name, version: version.into() }
    }

    /// Product key used by package databases, e.g. `"Debian 7.0"`
    #[must_use]
    pub fn product(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

impl fmt::Display for OsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_family_by_prefix() {
        assert_eq!(OsType::from_name("Ubuntu 12.04 LTS"), OsType::Ubuntu);
        assert_eq!(OsType::from_name("Red Hat Enterprise Linux"), OsType::RedHat);
        assert_eq!(OsType::from_name("openSUSE"), OsType::Suse);
        assert_eq!(OsType::from_name("Windows"), OsType::Unknown);
        assert_eq!(OsType::from_name(""), OsType::Unknown);
    }

    #[test]
    fn product_key_joins_name_and_version() {
        let info = OsInfo::new("Debian", "7.0");
        assert_eq!(info.os_type, OsType::Debian);
        assert_eq!(info.product(), "Debian 7.0");
    }
}
