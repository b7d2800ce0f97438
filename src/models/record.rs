use serde::de::DeserializeOwned;
use serde::Serialize;

/// A row in one of the user-owned collections.
///
/// `Draft` is the insert payload without server-assigned fields, `Patch` the
/// partial update payload. Stores that assign ids and timestamps themselves
/// build rows through `from_draft` and `apply_patch`.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Draft: Clone + Serialize + Send + Sync;
    type Patch: Clone + Serialize + Send + Sync;

    const TABLE: &'static str;
    /// Column the collection is listed by, descending.
    const ORDER_BY: &'static str;

    fn id(&self) -> &str;
    fn owner(&self) -> &str;
    /// Sortable rendering of the `ORDER_BY` column.
    fn order_key(&self) -> String;
    fn from_draft(id: String, owner: String, draft: Self::Draft, timestamp: String) -> Self;
    fn apply_patch(&mut self, patch: &Self::Patch, timestamp: String);
}
