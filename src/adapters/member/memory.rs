use crate::{
    adapters::database::memory::ErasedPoisonError,
    domain::Member,
    ports::member::{Error, MemberPort},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct MemoryMemberStore {
    members: Arc<Mutex<HashMap<Uuid, Member>>>,
}

impl MemoryMemberStore {
    /// Insert or replace a member
    ///
    /// Profile and subscription management live outside this crate, so this is how members get
    /// into the store.
    pub fn upsert(&self, member: Member) -> Result<(), Error> {
        self.members.lock()?.insert(member.member_id, member);
        Ok(())
    }

    pub fn remove(&self, member_id: Uuid) -> Result<Option<Member>, Error> {
        Ok(self.members.lock()?.remove(&member_id))
    }
}

#[async_trait::async_trait]
impl MemberPort for MemoryMemberStore {
    async fn get_member(&self, member_id: Uuid) -> Result<Member, Error> {
        self.members
            .lock()?
            .get(&member_id)
            .cloned()
            .ok_or(Error::MemberDoesNotExist(member_id))
    }

    async fn increment_total_sessions(
        &self,
        member_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Member, Error> {
        let mut members = self.members.lock()?;
        let member = members
            .get_mut(&member_id)
            .ok_or(Error::MemberDoesNotExist(member_id))?;
        member.total_sessions += 1;
        member.updated_at = at;

        Ok(member.clone())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
