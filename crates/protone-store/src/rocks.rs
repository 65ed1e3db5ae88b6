//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options, WriteBatch,
};

use protone_core::{PeriodKey, UsageRecord, UsageReservation, UserId, UserRecord};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// Number of stripe locks serializing read-modify-write operations.
const LOCK_STRIPES: usize = 64;

/// RocksDB-backed storage implementation.
///
/// Conditional updates (quota reservation, index maintenance) are serialized
/// by a fixed array of stripe locks keyed by the record key. This store is
/// the sole writer of its database, so an in-process lock is sufficient.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: [Mutex<()>; LOCK_STRIPES],
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: std::array::from_fn(|_| Mutex::new(())),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Decode a user id stored as an index value.
    fn decode_user_id(data: &[u8]) -> Result<UserId> {
        let s = std::str::from_utf8(data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        s.parse()
            .map_err(|e: protone_core::IdError| StoreError::Serialization(e.to_string()))
    }

    /// Pick the stripe lock serializing operations on `key`.
    #[allow(clippy::cast_possible_truncation)] // stripe index only needs the low bits
    fn lock_for(&self, key: &[u8]) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.locks[hasher.finish() as usize % LOCK_STRIPES]
    }

    /// Resolve a user through one of the index column families.
    fn find_user_via_index(&self, cf_name: &str, index_key: &[u8]) -> Result<Option<UserRecord>> {
        let cf = self.cf(cf_name)?;

        match self
            .db
            .get_cf(&cf, index_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            Some(id_bytes) => self.get_user(&Self::decode_user_id(&id_bytes)?),
            None => Ok(None),
        }
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn create_user(&self, user: &UserRecord) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;
        let cf_customer = self.cf(cf::USERS_BY_CUSTOMER)?;
        let cf_subscription = self.cf(cf::USERS_BY_SUBSCRIPTION)?;

        let email_key = keys::email_index_key(&user.email);

        // Serialize the uniqueness check against concurrent registrations
        // for the same email.
        let _guard = self
            .lock_for(&email_key)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.find_user_by_email(&user.email)?.is_some() {
            return Err(StoreError::EmailTaken {
                email: user.email.clone(),
            });
        }

        let value = Self::serialize(user)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(&user.id), &value);
        batch.put_cf(&cf_email, &email_key, user.id.as_bytes());
        if let Some(customer_id) = &user.stripe_customer_id {
            batch.put_cf(
                &cf_customer,
                keys::customer_index_key(customer_id),
                user.id.as_bytes(),
            );
        }
        if let Some(subscription_id) = &user.stripe_subscription_id {
            batch.put_cf(
                &cf_subscription,
                keys::subscription_index_key(subscription_id),
                user.id.as_bytes(),
            );
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn update_user(&self, user: &UserRecord) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;
        let cf_customer = self.cf(cf::USERS_BY_CUSTOMER)?;
        let cf_subscription = self.cf(cf::USERS_BY_SUBSCRIPTION)?;

        let key = keys::user_key(&user.id);

        // Serialize the index diff against concurrent updates of the same
        // user (e.g. checkout and a webhook racing).
        let _guard = self
            .lock_for(&key)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.get_user(&user.id)?.ok_or(StoreError::NotFound)?;

        let value = Self::serialize(user)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, &key, &value);

        if previous.email != user.email {
            batch.delete_cf(&cf_email, keys::email_index_key(&previous.email));
            batch.put_cf(
                &cf_email,
                keys::email_index_key(&user.email),
                user.id.as_bytes(),
            );
        }
        if previous.stripe_customer_id != user.stripe_customer_id {
            if let Some(old) = &previous.stripe_customer_id {
                batch.delete_cf(&cf_customer, keys::customer_index_key(old));
            }
            if let Some(new) = &user.stripe_customer_id {
                batch.put_cf(&cf_customer, keys::customer_index_key(new), user.id.as_bytes());
            }
        }
        if previous.stripe_subscription_id != user.stripe_subscription_id {
            if let Some(old) = &previous.stripe_subscription_id {
                batch.delete_cf(&cf_subscription, keys::subscription_index_key(old));
            }
            if let Some(new) = &user.stripe_subscription_id {
                batch.put_cf(
                    &cf_subscription,
                    keys::subscription_index_key(new),
                    user.id.as_bytes(),
                );
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.find_user_via_index(cf::USERS_BY_EMAIL, &keys::email_index_key(email))
    }

    fn find_user_by_customer(&self, customer_id: &str) -> Result<Option<UserRecord>> {
        self.find_user_via_index(cf::USERS_BY_CUSTOMER, &keys::customer_index_key(customer_id))
    }

    fn find_user_by_subscription(&self, subscription_id: &str) -> Result<Option<UserRecord>> {
        self.find_user_via_index(
            cf::USERS_BY_SUBSCRIPTION,
            &keys::subscription_index_key(subscription_id),
        )
    }

    // =========================================================================
    // Weekly Usage Operations
    // =========================================================================

    fn weekly_used(&self, owner: &UserId, period: &PeriodKey) -> Result<u64> {
        let cf = self.cf(cf::WEEKLY_USAGE)?;
        let key = keys::usage_key(owner, period);

        let used = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize::<UsageRecord>(&data))
            .transpose()?
            .map_or(0, |record| record.used);

        Ok(used)
    }

    fn reserve_usage(
        &self,
        owner: &UserId,
        period: &PeriodKey,
        limit: u32,
    ) -> Result<UsageReservation> {
        let cf = self.cf(cf::WEEKLY_USAGE)?;
        let key = keys::usage_key(owner, period);
        let limit = u64::from(limit);

        // Hold the stripe lock across the whole read-modify-write so two
        // concurrent reservations cannot both observe the last free slot.
        let _guard = self
            .lock_for(&key)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut record = self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize::<UsageRecord>(&data))
            .transpose()?
            .unwrap_or_else(|| UsageRecord::new(owner.clone(), *period));

        if record.used >= limit {
            return Ok(UsageReservation {
                granted: false,
                used: record.used,
                remaining: 0,
                period_key: *period,
            });
        }

        record.used += 1;
        record.updated_at = chrono::Utc::now();

        let value = Self::serialize(&record)?;
        self.db
            .put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(UsageReservation {
            granted: true,
            used: record.used,
            remaining: limit - record.used,
            period_key: *period,
        })
    }

    fn rollback_usage(&self, owner: &UserId, period: &PeriodKey) -> Result<u64> {
        let cf = self.cf(cf::WEEKLY_USAGE)?;
        let key = keys::usage_key(owner, period);

        let _guard = self
            .lock_for(&key)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut record = match self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            Some(data) => Self::deserialize::<UsageRecord>(&data)?,
            // Nothing reserved this period; the floor is already 0.
            None => return Ok(0),
        };

        if record.used <= 1 {
            self.db
                .delete_cf(&cf, &key)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            tracing::debug!(owner = %owner, period = %period, "weekly usage counter removed");
            return Ok(0);
        }

        record.used -= 1;
        record.updated_at = chrono::Utc::now();

        let value = Self::serialize(&record)?;
        self.db
            .put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(record.used)
    }
}
