//! Simulated posture collector.
//!
//! A [`Collector`] plays the endpoint side of the exchange. It knows a full
//! posture profile and decides which parts of it to volunteer up front and
//! which to hand out only when asked.

use bytes::Bytes;
use posture_proto::{
    Attribute, AttrKind, AttributeType, FwdStatus, IetfAttr, ItaAttr, OpResult, OpStatus, Package,
    Pen, Setting,
};

/// Every attribute type a collector can answer, in the order it reports them
pub const REPORTABLE: &[AttributeType] = &[
    AttributeType::ietf(IetfAttr::ProductInformation),
    AttributeType::ietf(IetfAttr::StringVersion),
    AttributeType::ietf(IetfAttr::NumericVersion),
    AttributeType::ietf(IetfAttr::OperationalStatus),
    AttributeType::ietf(IetfAttr::ForwardingEnabled),
    AttributeType::ietf(IetfAttr::FactoryDefaultPwdEnabled),
    AttributeType::ita(ItaAttr::DeviceId),
];

/// Endpoint profile plus reporting behaviour
#[derive(Debug, Clone)]
pub struct Collector {
    os_name: String,
    os_version: String,
    numeric_version: (u32, u32),
    last_boot: u64,
    forwarding: FwdStatus,
    default_password: bool,
    device_id: Option<Bytes>,
    settings: Vec<Setting>,
    packages: Vec<Package>,
    volunteers: Vec<AttributeType>,
    refuses: Vec<AttributeType>,
    angel: bool,
    angel_running: bool,
    fatal_round: Option<usize>,
}

impl Collector {
    /// Clean Debian 7.0 endpoint that volunteers nothing and answers
    /// everything
    pub fn new() -> Self {
        Self {
            os_name: "Debian".to_string(),
            os_version: "7.0".to_string(),
            numeric_version: (7, 0),
            last_boot: 1_380_700_000,
            forwarding: FwdStatus::Disabled,
            default_password: false,
            device_id: Some(Bytes::from_static(b"a1b2c3d4e5f60708")),
            settings: Vec::new(),
            packages: Vec::new(),
            volunteers: Vec::new(),
            refuses: Vec::new(),
            angel: false,
            angel_running: false,
            fatal_round: None,
        }
    }

    /// Report this operating system
    pub fn with_os(mut self, name: &str, version: &str) -> Self {
        self.os_name = name.to_string();
        self.os_version = version.to_string();
        self
    }

    /// Report this IPv4 forwarding status
    pub fn with_forwarding(mut self, status: FwdStatus) -> Self {
        self.forwarding = status;
        self
    }

    /// Report the factory default password as enabled
    pub fn with_default_password(mut self) -> Self {
        self.default_password = true;
        self
    }

    /// Report no device id at all
    pub fn without_device_id(mut self) -> Self {
        self.device_id = None;
        self
    }

    /// Report this device id
    pub fn with_device_id(mut self, device_id: &'static [u8]) -> Self {
        self.device_id = Some(Bytes::from_static(device_id));
        self
    }

    /// Volunteer a setting in the first message
    pub fn with_setting(mut self, name: &str, value: &'static str) -> Self {
        self.settings.push(Setting::new(name, value));
        self
    }

    /// Installed package inventory
    pub fn with_packages(mut self, packages: Vec<Package>) -> Self {
        self.packages = packages;
        self
    }

    /// Send these attribute types unsolicited in the first message
    pub fn volunteering(mut self, types: &[AttributeType]) -> Self {
        self.volunteers = types.to_vec();
        self
    }

    /// Send every reportable attribute unsolicited in the first message
    pub fn volunteering_all(self) -> Self {
        self.volunteering(REPORTABLE)
    }

    /// Never report these attribute types, even when asked
    pub fn refusing(mut self, types: &[AttributeType]) -> Self {
        self.refuses.extend_from_slice(types);
        self
    }

    /// Run a helper process while collecting packages: `StartAngel` goes out
    /// with the inventory and `StopAngel` one round later
    pub fn with_angel(mut self) -> Self {
        self.angel = true;
        self
    }

    /// Fail decoding fatally in the given round (0 is the first message)
    pub fn with_fatal_error_in_round(mut self, round: usize) -> Self {
        self.fatal_round = Some(round);
        self
    }

    /// Whether the message for `round` is a fatal decoding failure
    pub fn fails_in_round(&self, round: usize) -> bool {
        self.fatal_round == Some(round)
    }

    /// Whether a helper process is still running
    pub fn angel_running(&self) -> bool {
        self.angel_running
    }

    /// Attributes of the first, unsolicited message
    pub fn first_message(&self) -> Vec<Attribute> {
        let mut attributes: Vec<_> =
            self.volunteers.iter().filter_map(|&ty| self.report(ty)).collect();

        if !self.settings.is_empty() {
            attributes.push(Attribute::settings(self.settings.clone()));
        }
        attributes
    }

    /// Answer an attribute request
    pub fn respond(&mut self, requested: &[AttributeType]) -> Vec<Attribute> {
        let mut attributes = Vec::new();

        if self.angel_running {
            self.angel_running = false;
            attributes.push(Attribute::stop_angel());
        }

        for &ty in requested {
            if ty == AttributeType::ietf(IetfAttr::InstalledPackages) && self.angel {
                self.angel = false;
                self.angel_running = true;
                attributes.push(Attribute::start_angel());
            }
            attributes.extend(self.report(ty));
        }
        attributes
    }

    /// Unsolicited follow-up once nothing is requested any more
    pub fn follow_up(&mut self) -> Vec<Attribute> {
        if self.angel_running {
            self.angel_running = false;
            vec![Attribute::stop_angel()]
        } else {
            Vec::new()
        }
    }

    fn report(&self, ty: AttributeType) -> Option<Attribute> {
        if self.refuses.contains(&ty) {
            return None;
        }

        match ty.kind()? {
            AttrKind::Ietf(IetfAttr::ProductInformation) => {
                Some(Attribute::product_info(Pen::Ietf, 0, self.os_name.as_str()))
            },
            AttrKind::Ietf(IetfAttr::StringVersion) => {
                Some(Attribute::string_version(self.os_version.as_str()))
            },
            AttrKind::Ietf(IetfAttr::NumericVersion) => {
                let (major, minor) = self.numeric_version;
                Some(Attribute::numeric_version(major, minor))
            },
            AttrKind::Ietf(IetfAttr::OperationalStatus) => Some(Attribute::operational_status(
                OpStatus::Operational,
                OpResult::Successful,
                self.last_boot,
            )),
            AttrKind::Ietf(IetfAttr::ForwardingEnabled) => {
                Some(Attribute::forwarding_enabled(self.forwarding))
            },
            AttrKind::Ietf(IetfAttr::FactoryDefaultPwdEnabled) => {
                Some(Attribute::default_password_enabled(self.default_password))
            },
            AttrKind::Ietf(IetfAttr::InstalledPackages) => {
                Some(Attribute::installed_packages(self.packages.clone()))
            },
            AttrKind::Ita(ItaAttr::DeviceId) => self.device_id.clone().map(Attribute::device_id),
            _ => None,
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volunteers_only_configured_types() {
        let collector = Collector::new()
            .volunteering(&[AttributeType::ietf(IetfAttr::ProductInformation)])
            .with_setting("install_non_market_apps", "0");

        let first = collector.first_message();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].ty, AttributeType::ietf(IetfAttr::ProductInformation));
        assert_eq!(first[1].ty, AttributeType::ita(ItaAttr::Settings));
    }

    #[test]
    fn refused_types_are_never_reported() {
        let mut collector =
            Collector::new().refusing(&[AttributeType::ietf(IetfAttr::StringVersion)]);

        let answer = collector.respond(REPORTABLE);

        assert_eq!(answer.len(), REPORTABLE.len() - 1);
        assert!(answer.iter().all(|attr| attr.ty != AttributeType::ietf(IetfAttr::StringVersion)));
    }

    #[test]
    fn angel_wraps_package_collection() {
        let mut collector = Collector::new().with_angel();

        let answer = collector.respond(&[AttributeType::ietf(IetfAttr::InstalledPackages)]);
        assert_eq!(answer[0].ty, AttributeType::ita(ItaAttr::StartAngel));
        assert!(collector.angel_running());

        assert_eq!(collector.follow_up(), vec![Attribute::stop_angel()]);
        assert!(!collector.angel_running());
        assert!(collector.follow_up().is_empty());
    }
}
