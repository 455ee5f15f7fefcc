use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use posture_proto::{OsInfo, Package};

use super::{Storage, StorageError};
use crate::{
    ConnectionId, DeviceId, SessionId,
    session::{OsSettings, PackageCounts},
};

/// One known release of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    /// Release string
    pub version: String,
    /// Latest release carrying all security fixes
    pub security: bool,
    /// Release known to be dangerous
    pub blacklisted: bool,
}

impl PackageVersion {
    /// Latest good release
    pub fn security(version: impl Into<String>) -> Self {
        Self { version: version.into(), security: true, blacklisted: false }
    }

    /// Dangerous release
    pub fn blacklisted(version: impl Into<String>) -> Self {
        Self { version: version.into(), security: false, blacklisted: true }
    }

    /// Superseded release
    pub fn release(version: impl Into<String>) -> Self {
        Self { version: version.into(), security: false, blacklisted: false }
    }
}

/// What storage knows about one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    /// Connection the session belongs to
    pub connection_id: ConnectionId,
    /// Accepted OS identity
    pub product: Option<OsInfo>,
    /// Device handle
    pub device_id: Option<DeviceId>,
    /// Final package counts and settings
    pub device_info: Option<(PackageCounts, OsSettings)>,
}

/// In-memory storage implementation for testing and simulation
///
/// Holds a package database keyed by product (`"<name> <version>"`), then
/// by package name. All state is wrapped in `Arc<Mutex<>>` so clones share
/// one database, which lets a test keep a handle for inspection after moving
/// a clone into a verifier.
///
/// # Thread Safety
///
/// This implementation is thread-safe through Mutex. However, it uses
/// `lock().expect()` which will panic if the mutex is poisoned (a thread
/// panicked while holding the lock). This is acceptable for test code.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Default)]
struct MemoryStorageInner {
    next_session_id: SessionId,
    next_device_id: DeviceId,
    sessions: HashMap<SessionId, StoredSession>,
    /// Raw device identifier to device handle
    devices: HashMap<Vec<u8>, DeviceId>,
    /// product -> package name -> known releases
    packages: HashMap<String, HashMap<String, Vec<PackageVersion>>>,
}

impl MemoryStorage {
    /// Create a new empty MemoryStorage
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product with no packages.
    ///
    /// A registered product makes package checks succeed even if every
    /// package is unknown.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_product_database(&self, product: &str) {
        let mut inner = self.inner.lock().expect("MemoryStorage mutex poisoned");
        inner.packages.entry(product.to_string()).or_default();
    }

    /// Register a known release of a package for a product.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_package(&self, product: &str, name: &str, version: PackageVersion) {
        let mut inner = self.inner.lock().expect("MemoryStorage mutex poisoned");
        inner
            .packages
            .entry(product.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(version);
    }

    /// Snapshot of a stored session
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn session(&self, session_id: SessionId) -> Option<StoredSession> {
        self.inner.lock().expect("MemoryStorage mutex poisoned").sessions.get(&session_id).cloned()
    }

    /// Number of distinct devices seen
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn device_count(&self) -> usize {
        self.inner.lock().expect("MemoryStorage mutex poisoned").devices.len()
    }
}

/// Classification of a single package against its known releases
fn classify_package(releases: &[PackageVersion], version: &str, counts: &mut PackageCounts) {
    match releases.iter().find(|release| release.version == version) {
        Some(release) if release.blacklisted => counts.blacklist += 1,
        Some(release) if release.security => counts.ok += 1,
        _ => counts.update += 1,
    }
}

impl Storage for MemoryStorage {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn add_session(&self, connection_id: ConnectionId) -> Result<SessionId, StorageError> {
        let mut inner = self.inner.lock().expect("MemoryStorage mutex poisoned");

        inner.next_session_id = inner
            .next_session_id
            .checked_add(1)
            .ok_or_else(|| StorageError::Backend("session id space exhausted".to_string()))?;
        let session_id = inner.next_session_id;

        inner.sessions.insert(session_id, StoredSession {
            connection_id,
            product: None,
            device_id: None,
            device_info: None,
        });

        Ok(session_id)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn add_product(&self, session_id: SessionId, os: &OsInfo) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("MemoryStorage mutex poisoned");
        let session =
            inner.sessions.get_mut(&session_id).ok_or(StorageError::UnknownSession(session_id))?;
        session.product = Some(os.clone());
        Ok(())
    }

    /// Devices are deduplicated by their raw identifier.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn add_device(&self, session_id: SessionId, raw_id: &[u8]) -> Result<DeviceId, StorageError> {
        let mut guard = self.inner.lock().expect("MemoryStorage mutex poisoned");
        let inner = &mut *guard;

        if !inner.sessions.contains_key(&session_id) {
            return Err(StorageError::UnknownSession(session_id));
        }

        let device_id = match inner.devices.get(raw_id) {
            Some(&device_id) => device_id,
            None => {
                inner.next_device_id += 1;
                inner.devices.insert(raw_id.to_vec(), inner.next_device_id);
                inner.next_device_id
            },
        };

        if let Some(session) = inner.sessions.get_mut(&session_id) {
            session.device_id = Some(device_id);
        }

        Ok(device_id)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn check_packages(
        &self,
        session_id: SessionId,
        os: Option<&OsInfo>,
        packages: &[Package],
    ) -> Result<PackageCounts, StorageError> {
        let inner = self.inner.lock().expect("MemoryStorage mutex poisoned");

        if !inner.sessions.contains_key(&session_id) {
            return Err(StorageError::UnknownSession(session_id));
        }

        let os = os.ok_or(StorageError::MissingIdentity)?;
        let product = os.product();
        let database =
            inner.packages.get(&product).ok_or_else(|| StorageError::UnknownProduct(product))?;

        let mut counts = PackageCounts::default();
        for package in packages {
            counts.total += 1;
            match database.get(&package.name) {
                Some(releases) => classify_package(releases, &package.version, &mut counts),
                None => {
                    tracing::trace!(package = %package.name, "package not found in database");
                },
            }
        }

        debug_assert!(counts.update + counts.blacklist + counts.ok <= counts.total);

        Ok(counts)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn set_device_info(
        &self,
        session_id: SessionId,
        counts: &PackageCounts,
        settings: OsSettings,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("MemoryStorage mutex poisoned");
        let session =
            inner.sessions.get_mut(&session_id).ok_or(StorageError::UnknownSession(session_id))?;
        session.device_info = Some((*counts, settings));
        Ok(())
    }
}
