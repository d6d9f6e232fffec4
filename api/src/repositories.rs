pub mod memory;

use anyhow::Result;

use crate::domains::Dinosaur;

/// Listing captured in the same critical section as a mutation.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub outcome: T,
    pub dinosaurs: Vec<Dinosaur>,
}

#[async_trait::async_trait]
pub trait DinosaurRepository {
    async fn list(&self) -> Result<Vec<Dinosaur>>;
    async fn append(&self, name: &str) -> Result<Snapshot<Dinosaur>>;
    async fn update_by_id(&self, id: u64, name: &str) -> Result<Snapshot<bool>>;
    async fn delete_by_id(&self, id: u64) -> Result<Snapshot<bool>>;
}
