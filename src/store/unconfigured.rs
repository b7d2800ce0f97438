use async_trait::async_trait;

use super::{StoreError, Table};
use crate::models::Record;

/// Stand-in used when no endpoint/key is configured. Reads come back empty,
/// writes fail with [`StoreError::NotConfigured`].
pub(crate) struct Unconfigured;

#[async_trait]
impl<R: Record> Table<R> for Unconfigured {
    async fn select_owned(&self, _owner: &str) -> Result<Vec<R>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _owner: &str, _draft: &R::Draft) -> Result<R, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn update(&self, _owner: &str, _id: &str, _patch: &R::Patch) -> Result<R, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn delete(&self, _owner: &str, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }
}
