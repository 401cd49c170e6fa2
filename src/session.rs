use std::collections::BTreeSet;

use crate::chunk::ChunkPlan;

/// What a session was negotiated for. A held session only applies to a
/// later call when the identity matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub filename: String,
    pub file_size: u64,
    pub chunk_size: u64,
}

/// Per-transfer state: the server-assigned session id and the chunk
/// indices the server has acknowledged. The acknowledged set only grows.
#[derive(Debug, Clone)]
pub struct UploadSession {
    session_id: String,
    identity: FileIdentity,
    plan: ChunkPlan,
    acknowledged: BTreeSet<u64>,
}

impl UploadSession {
    /// Indices outside the plan are ignored.
    pub fn new(
        session_id: String,
        identity: FileIdentity,
        plan: ChunkPlan,
        acknowledged: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut session = Self {
            session_id,
            identity,
            plan,
            acknowledged: BTreeSet::new(),
        };
        session.merge_acknowledged(acknowledged);
        session
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn is_acknowledged(&self, index: u64) -> bool {
        self.acknowledged.contains(&index)
    }

    pub fn acknowledge(&mut self, index: u64) {
        if index < self.plan.chunk_count() {
            self.acknowledged.insert(index);
        }
    }

    pub fn merge_acknowledged(&mut self, indices: impl IntoIterator<Item = u64>) {
        for index in indices {
            self.acknowledge(index);
        }
    }

    pub fn acknowledged(&self) -> impl Iterator<Item = u64> + '_ {
        self.acknowledged.iter().copied()
    }

    pub fn acknowledged_count(&self) -> u64 {
        self.acknowledged.len() as u64
    }

    pub fn is_complete(&self) -> bool {
        self.acknowledged_count() == self.plan.chunk_count()
    }
}
