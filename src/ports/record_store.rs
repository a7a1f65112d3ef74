//! Client record store port.
//!
//! Keyed on the record id. The store allows one writer per id; it offers
//! no transactions across records.

use async_trait::async_trait;

use crate::domain::client::ClientRecord;
use crate::domain::foundation::{ClientId, DomainError};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every stored record.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` when the backing store cannot be read
    async fn get_all(&self) -> Result<Vec<ClientRecord>, DomainError>;

    /// Find a record by id. Returns `None` if not found.
    async fn get(&self, id: &ClientId) -> Result<Option<ClientRecord>, DomainError>;

    /// Insert or replace the record with the same id.
    ///
    /// # Errors
    ///
    /// - `StoreFailure` on persistence failure
    /// - `SerializationFailed` if the record cannot be encoded
    async fn put(&self, record: &ClientRecord) -> Result<(), DomainError>;
}
