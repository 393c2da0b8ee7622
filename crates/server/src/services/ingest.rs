//! First-install report ingestion.
//!
//! A client sends one report right after installation. Ingestion validates
//! it, checks the target user exists, files the device under today's date
//! bucket for that user, and treats any repeat of the same (user, device)
//! as success without writing anything.
//!
//! # Flow
//!
//! ```text
//! validate ─▶ resolve user ─▶ entry exists? ──yes──▶ AlreadyRegistered
//!                                  │no
//!                                  ▼
//!                  get_or_create(today's bucket) ─▶ create entry (Offline)
//! ```
//!
//! Both write steps are single atomic storage calls, so a burst of reports
//! for a brand-new user-day converges on one bucket and one entry per device.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Span, instrument};

use peerbook_core::{DeviceId, DeviceStatus, Hostname, Platform, ReferenceZone, UserId};

use crate::clock::{Clock, SystemClock};
use crate::db::{CollectionProvisioner, DeviceRegistry, RepositoryError, Storage, UserDirectory};
use crate::models::{Collection, DeviceEntry, NewDeviceEntry, Registration};

/// A first-install report as received from the client.
///
/// Every field is optional at this stage so that missing and malformed
/// values are reported together by [`FirstInstallReport::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirstInstallReport {
    /// Client-generated device identifier.
    #[serde(default, alias = "device_id")]
    pub client_id: Option<String>,
    /// Device hostname.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Device platform (windows/linux/mac/android/ios).
    #[serde(default)]
    pub platform: Option<String>,
    /// User whose address book the device joins.
    #[serde(default)]
    pub target_user_id: Option<i64>,
}

/// A report whose fields passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReport {
    pub device_id: DeviceId,
    pub hostname: Option<Hostname>,
    pub platform: Option<Platform>,
    pub user_id: UserId,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field a report got wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// A single-field failure, for input that never reached field parsing.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldError {
            field,
            message: message.into(),
        }])
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// The rejected fields, in report order.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether nothing was rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl FirstInstallReport {
    /// Check required fields and parse the rest.
    ///
    /// # Errors
    ///
    /// Returns every offending field when the device id is missing, blank,
    /// or too long, when the target user id is missing or not positive, or
    /// when the hostname is too long. An unrecognized platform is not an
    /// error; it is recorded as `unknown`.
    pub fn validate(&self) -> Result<ValidReport, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let device_id = match self.client_id.as_deref() {
            None => {
                errors.push("client_id", "is required");
                None
            }
            Some(raw) => DeviceId::parse(raw)
                .map_err(|e| errors.push("client_id", e.to_string()))
                .ok(),
        };

        let hostname = Hostname::parse_optional(self.hostname.as_deref())
            .map_err(|e| errors.push("hostname", e.to_string()))
            .ok()
            .flatten();

        let user_id = match self.target_user_id.map(UserId::new) {
            None => {
                errors.push("target_user_id", "is required");
                None
            }
            Some(id) if !id.is_positive() => {
                errors.push("target_user_id", "must be greater than 0");
                None
            }
            Some(id) => Some(id),
        };

        match (device_id, user_id) {
            (Some(device_id), Some(user_id)) if errors.is_empty() => Ok(ValidReport {
                device_id,
                hostname,
                platform: Platform::parse_lenient(self.platform.as_deref()),
                user_id,
            }),
            _ => Err(errors),
        }
    }
}

/// What a successful ingestion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The device was added to the bucket.
    Created {
        entry: DeviceEntry,
        collection: Collection,
    },
    /// The device was already in the user's address book; nothing changed.
    AlreadyRegistered,
}

/// Errors that can occur while ingesting a report.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The report is malformed; the client must fix it.
    #[error("invalid report: {0}")]
    Validation(ValidationErrors),

    /// The target user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Storage failed; the client may resend the whole report.
    #[error("operation failed: {0}")]
    OperationFailed(#[from] RepositoryError),
}

/// Registers devices from first-install reports.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct ReportIngestor {
    users: Arc<dyn UserDirectory>,
    collections: Arc<dyn CollectionProvisioner>,
    devices: Arc<dyn DeviceRegistry>,
    zone: ReferenceZone,
    clock: Arc<dyn Clock>,
}

impl ReportIngestor {
    /// Create an ingestor that dates buckets by the wall clock in `zone`.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        collections: Arc<dyn CollectionProvisioner>,
        devices: Arc<dyn DeviceRegistry>,
        zone: ReferenceZone,
    ) -> Self {
        Self {
            users,
            collections,
            devices,
            zone,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create an ingestor over a bundled set of storage seams.
    #[must_use]
    pub fn from_storage(storage: &Storage, zone: ReferenceZone) -> Self {
        Self::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.collections),
            Arc::clone(&storage.devices),
            zone,
        )
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The zone used to pick today's bucket.
    #[must_use]
    pub const fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Ingest one report.
    ///
    /// Repeated reports for the same (user, device), including concurrent
    /// ones, all succeed and leave exactly one entry.
    ///
    /// # Errors
    ///
    /// - `IngestError::Validation` for malformed reports (nothing is read or written)
    /// - `IngestError::UserNotFound` when the target user doesn't exist
    ///   (nothing is written)
    /// - `IngestError::OperationFailed` when storage fails; the cause is
    ///   recorded at info level and reporting the failure is left to the caller
    #[instrument(
        skip(self, report),
        fields(user_id = tracing::field::Empty, device_id = tracing::field::Empty)
    )]
    pub async fn ingest(&self, report: &FirstInstallReport) -> Result<IngestOutcome, IngestError> {
        let report = report.validate().map_err(|errors| {
            tracing::debug!(%errors, "Rejected first-install report");
            IngestError::Validation(errors)
        })?;

        let span = Span::current();
        span.record("user_id", report.user_id.as_i64());
        span.record("device_id", report.device_id.as_str());

        let result = self.register(report).await;
        if let Err(IngestError::OperationFailed(e)) = &result {
            tracing::info!(error = %e, "Storage failed while registering device");
        }
        result
    }

    async fn register(&self, report: ValidReport) -> Result<IngestOutcome, IngestError> {
        let user = self
            .users
            .resolve(report.user_id)
            .await?
            .ok_or(IngestError::UserNotFound(report.user_id))?;

        if self.devices.exists(user.id, &report.device_id).await? {
            tracing::info!("Device already in address book");
            return Ok(IngestOutcome::AlreadyRegistered);
        }

        let label = self.zone.label_for(self.clock.now());
        let collection = self.collections.get_or_create(user.id, label).await?;

        let registration = self
            .devices
            .create(NewDeviceEntry {
                device_id: report.device_id,
                hostname: report.hostname,
                platform: report.platform,
                user_id: user.id,
                collection_id: collection.id,
                status: DeviceStatus::Offline,
            })
            .await?;

        match registration {
            Registration::Created(entry) => {
                tracing::info!(
                    collection_id = %collection.id,
                    label = %collection.label,
                    "Device added to address book"
                );
                Ok(IngestOutcome::Created { entry, collection })
            }
            Registration::AlreadyRegistered => {
                tracing::info!("Device registered concurrently by another report");
                Ok(IngestOutcome::AlreadyRegistered)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use peerbook_core::{CollectionId, DateLabel};

    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MemoryStore;
    use crate::test_support::AlertCounter;

    /// Noon on 2024-01-01 at UTC+8.
    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap()
    }

    fn ingestor_at(store: &MemoryStore, at: DateTime<Utc>) -> ReportIngestor {
        ReportIngestor::from_storage(&Storage::in_memory(store), ReferenceZone::default())
            .with_clock(Arc::new(FixedClock(at)))
    }

    fn report(device: &str, user: i64) -> FirstInstallReport {
        FirstInstallReport {
            client_id: Some(device.to_owned()),
            hostname: Some("h1".to_owned()),
            platform: Some("linux".to_owned()),
            target_user_id: Some(user),
        }
    }

    #[tokio::test]
    async fn test_first_report_creates_bucket_and_offline_entry() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        let ingestor = ingestor_at(&store, new_year());

        let outcome = ingestor.ingest(&report("dev-1", 42)).await.unwrap();

        let IngestOutcome::Created { entry, collection } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(collection.user_id, UserId::new(42));
        assert_eq!(collection.label, DateLabel::parse("2024-01-01").unwrap());
        assert_eq!(entry.device_id.as_str(), "dev-1");
        assert_eq!(entry.user_id, UserId::new(42));
        assert_eq!(entry.collection_id, collection.id);
        assert_eq!(entry.status, DeviceStatus::Offline);
        assert_eq!(entry.hostname.as_ref().map(Hostname::as_str), Some("h1"));
        assert_eq!(entry.platform, Some(Platform::Linux));
    }

    #[tokio::test]
    async fn test_repeat_report_is_a_noop() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        let ingestor = ingestor_at(&store, new_year());

        ingestor.ingest(&report("dev-1", 42)).await.unwrap();
        let second = ingestor.ingest(&report("dev-1", 42)).await.unwrap();

        assert_eq!(second, IngestOutcome::AlreadyRegistered);
        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.collection_count(), 1);
    }

    #[tokio::test]
    async fn test_repeat_on_a_later_day_keeps_original_bucket() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");

        ingestor_at(&store, new_year())
            .ingest(&report("dev-1", 42))
            .await
            .unwrap();
        let next_day = new_year() + chrono::Duration::days(1);
        let outcome = ingestor_at(&store, next_day)
            .ingest(&report("dev-1", 42))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::AlreadyRegistered);
        assert_eq!(store.collection_count(), 1);
    }

    #[tokio::test]
    async fn test_new_devices_on_different_days_get_different_buckets() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");

        let first = ingestor_at(&store, new_year())
            .ingest(&report("dev-1", 42))
            .await
            .unwrap();
        let second = ingestor_at(&store, new_year() + chrono::Duration::days(1))
            .ingest(&report("dev-2", 42))
            .await
            .unwrap();

        let (
            IngestOutcome::Created { collection: a, .. },
            IngestOutcome::Created { collection: b, .. },
        ) = (first, second)
        else {
            panic!("expected both reports to create entries");
        };
        assert_ne!(a.id, b.id);
        assert_eq!(b.label.to_string(), "2024-01-02");
    }

    #[tokio::test]
    async fn test_bucket_uses_reference_zone_not_utc() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        // 2023-12-31 16:30 UTC is already 2024-01-01 at UTC+8
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 16, 30, 0).unwrap();

        let ingestor = ingestor_at(&store, at);
        assert_eq!(ingestor.zone(), ReferenceZone::default());
        assert_eq!(ingestor.zone().to_string(), "+08:00");

        let outcome = ingestor.ingest(&report("dev-1", 42)).await.unwrap();

        let IngestOutcome::Created { collection, .. } = outcome else {
            panic!("expected Created");
        };
        assert_eq!(collection.label.to_string(), "2024-01-01");
    }

    #[tokio::test]
    async fn test_invalid_reports_have_no_side_effects() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        let ingestor = ingestor_at(&store, new_year());

        for bad in [report("", 42), report("   ", 42), report("dev-1", 0), report("dev-1", -5)] {
            let err = ingestor.ingest(&bad).await.unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)), "{bad:?}");
        }

        assert_eq!(store.collection_count(), 0);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_lists_every_bad_field() {
        let store = MemoryStore::new();
        let ingestor = ingestor_at(&store, new_year());

        let err = ingestor
            .ingest(&FirstInstallReport {
                hostname: Some("x".repeat(Hostname::MAX_LENGTH + 1)),
                ..FirstInstallReport::default()
            })
            .await
            .unwrap_err();

        let IngestError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.fields().iter().map(|e| e.field).collect();
        assert_eq!(fields, ["client_id", "hostname", "target_user_id"]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found_without_side_effects() {
        let store = MemoryStore::new();
        let ingestor = ingestor_at(&store, new_year());

        let err = ingestor.ingest(&report("dev-1", 7)).await.unwrap_err();

        assert!(matches!(err, IngestError::UserNotFound(id) if id == UserId::new(7)));
        assert_eq!(store.collection_count(), 0);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_operation_failed() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        store.set_unavailable(true);
        let ingestor = ingestor_at(&store, new_year());
        let alerts = AlertCounter::default();
        let _guard = alerts.install();

        let err = ingestor.ingest(&report("dev-1", 42)).await.unwrap_err();

        assert!(matches!(err, IngestError::OperationFailed(_)));
        // The caller reports the failure; the ingestor only leaves a breadcrumb.
        assert_eq!(alerts.count(), 0);
    }

    /// Registry whose existence check always misses, as if a concurrent
    /// report inserted the entry between the check and the insert.
    struct StaleExists(MemoryStore);

    #[async_trait]
    impl DeviceRegistry for StaleExists {
        async fn exists(&self, _: UserId, _: &DeviceId) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn create(&self, entry: NewDeviceEntry) -> Result<Registration, RepositoryError> {
            self.0.create(entry).await
        }

        async fn list_in_collection(
            &self,
            collection_id: CollectionId,
        ) -> Result<Vec<DeviceEntry>, RepositoryError> {
            self.0.list_in_collection(collection_id).await
        }
    }

    #[tokio::test]
    async fn test_losing_insert_race_is_success() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        ingestor_at(&store, new_year())
            .ingest(&report("dev-1", 42))
            .await
            .unwrap();

        let racing = ReportIngestor::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(StaleExists(store.clone())),
            ReferenceZone::default(),
        )
        .with_clock(Arc::new(FixedClock(new_year())));

        let outcome = racing.ingest(&report("dev-1", 42)).await.unwrap();

        assert_eq!(outcome, IngestOutcome::AlreadyRegistered);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_installs_share_one_bucket() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        let ingestor = ingestor_at(&store, new_year());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let ingestor = ingestor.clone();
                tokio::spawn(async move { ingestor.ingest(&report(&format!("dev-{i}"), 42)).await })
            })
            .collect();

        let mut buckets = Vec::new();
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                IngestOutcome::Created { collection, .. } => buckets.push(collection.id),
                IngestOutcome::AlreadyRegistered => panic!("distinct devices must all be created"),
            }
        }

        assert_eq!(store.collection_count(), 1);
        assert_eq!(store.entry_count(), 32);
        assert!(buckets.iter().all(|id| *id == buckets[0]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_reports_store_one_entry() {
        let store = MemoryStore::new();
        store.add_user(UserId::new(42), "alice");
        let ingestor = ingestor_at(&store, new_year());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ingestor = ingestor.clone();
                tokio::spawn(async move { ingestor.ingest(&report("dev-1", 42)).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if matches!(handle.await.unwrap().unwrap(), IngestOutcome::Created { .. }) {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.collection_count(), 1);
    }
}
