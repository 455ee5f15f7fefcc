//! Verifier configuration.

use posture_proto::MessageType;
use serde::{Deserialize, Serialize};

/// Default IF-IMV API version
pub const IF_IMV_VERSION_1: u32 = 1;

/// Verifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Verifier name used in log output
    pub name: String,
    /// Message type this verifier subscribes to
    pub msg_type: MessageType,
    /// IF-IMV API version offered during initialization
    pub if_imv_version: u32,
    /// Settings key meaning "apps from outside the market may be installed"
    pub non_market_apps_key: String,
    /// Value of that key that counts as enabled
    pub non_market_apps_enabled: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            name: "OS".to_string(),
            msg_type: MessageType::OPERATING_SYSTEM,
            if_imv_version: IF_IMV_VERSION_1,
            non_market_apps_key: "install_non_market_apps".to_string(),
            non_market_apps_enabled: "1".to_string(),
        }
    }
}
