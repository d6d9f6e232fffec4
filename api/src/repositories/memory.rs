use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use crate::domains::Dinosaur;

use super::{DinosaurRepository, Snapshot};

/// Ordered dinosaur collection. Ids start at 1 and are never handed out twice.
#[derive(Debug)]
pub struct DinosaurStore {
    dinosaurs: Vec<Dinosaur>,
    next_id: u64,
}

impl Default for DinosaurStore {
    fn default() -> Self {
        Self {
            dinosaurs: Vec::new(),
            next_id: 1,
        }
    }
}

impl DinosaurStore {
    pub fn list(&self) -> &[Dinosaur] {
        &self.dinosaurs
    }

    pub fn append(&mut self, name: &str) -> Dinosaur {
        let dinosaur = Dinosaur::received(self.next_id, name);
        self.next_id += 1;
        self.dinosaurs.push(dinosaur.clone());

        dinosaur
    }

    pub fn update_by_id(&mut self, id: u64, name: &str) -> bool {
        match self.dinosaurs.iter_mut().find(|d| d.id == id) {
            Some(dinosaur) => {
                dinosaur.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn delete_by_id(&mut self, id: u64) -> bool {
        match self.dinosaurs.iter().position(|d| d.id == id) {
            Some(idx) => {
                self.dinosaurs.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDinosaurRepository {
    store: Mutex<DinosaurStore>,
}

impl MemoryDinosaurRepository {
    fn lock(&self) -> Result<MutexGuard<'_, DinosaurStore>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("dinosaur store lock poisoned"))
    }
}

#[async_trait::async_trait]
impl DinosaurRepository for MemoryDinosaurRepository {
    async fn list(&self) -> Result<Vec<Dinosaur>> {
        Ok(self.lock()?.list().to_vec())
    }

    async fn append(&self, name: &str) -> Result<Snapshot<Dinosaur>> {
        let mut store = self.lock()?;
        let outcome = store.append(name);

        Ok(Snapshot {
            outcome,
            dinosaurs: store.list().to_vec(),
        })
    }

    async fn update_by_id(&self, id: u64, name: &str) -> Result<Snapshot<bool>> {
        let mut store = self.lock()?;
        let outcome = store.update_by_id(id, name);

        Ok(Snapshot {
            outcome,
            dinosaurs: store.list().to_vec(),
        })
    }

    async fn delete_by_id(&self, id: u64) -> Result<Snapshot<bool>> {
        let mut store = self.lock()?;
        let outcome = store.delete_by_id(id);

        Ok(Snapshot {
            outcome,
            dinosaurs: store.list().to_vec(),
        })
    }
}
