use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    domain::{
        ChatId, ChatInfo, Group, NewQueue, Queue, QueueId, QueueMember, User, UserId, UserInfo,
    },
    errors::{Conflict, Error},
    positions,
    store::QueueStore,
    swap::{self, SwapResolution},
    Result,
};

#[derive(Clone, Debug, Default)]
struct State {
    groups: HashMap<ChatId, Group>,
    users: HashMap<UserId, User>,
    queues: HashMap<QueueId, Queue>,
    next_queue_id: i64,
}

/// On-disk shape of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    groups: Vec<Group>,
    users: Vec<User>,
    queues: Vec<Queue>,
    next_queue_id: i64,
}

impl From<Snapshot> for State {
    fn from(s: Snapshot) -> Self {
        let max_id = s.queues.iter().map(|q| q.id.0).max().unwrap_or(0);
        Self {
            groups: s.groups.into_iter().map(|g| (g.id, g)).collect(),
            users: s.users.into_iter().map(|u| (u.id, u)).collect(),
            queues: s.queues.into_iter().map(|q| (q.id, q)).collect(),
            next_queue_id: s.next_queue_id.max(max_id),
        }
    }
}

impl State {
    fn snapshot(&self) -> Snapshot {
        let mut groups: Vec<Group> = self.groups.values().cloned().collect();
        groups.sort_by_key(|g| g.id);
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        let mut queues: Vec<Queue> = self.queues.values().cloned().collect();
        queues.sort_by_key(|q| q.id);
        Snapshot {
            groups,
            users,
            queues,
            next_queue_id: self.next_queue_id,
        }
    }

    fn queue_mut(&mut self, id: QueueId) -> Option<&mut Queue> {
        self.queues.get_mut(&id)
    }
}

/// Store that keeps everything in memory behind a single lock.
///
/// Each trait call holds the lock for its whole duration, which makes every
/// call one transaction. With a snapshot path, the state is loaded at startup
/// and a mutation only becomes visible once its snapshot has been written.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON snapshot file (created on first write).
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(txt) => {
                let snap: Snapshot =
                    serde_json::from_str(&txt).map_err(|e| Error::Snapshot {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                State::from(snap)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            path = %path.display(),
            queues = state.queues.len(),
            groups = state.groups.len(),
            "store loaded"
        );
        Ok(Self {
            state: Mutex::new(state),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, state: &State) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let txt = serde_json::to_string(&state.snapshot())?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, txt).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Run `f` against a copy of the state; commit it after a successful
    /// persist. `f` reports whether it changed anything.
    async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut State) -> Result<(T, bool)> + Send,
    {
        let mut state = self.state.lock().await;
        if self.snapshot_path.is_none() {
            return f(&mut *state).map(|(out, _)| out);
        }
        let mut next = state.clone();
        let (out, changed) = f(&mut next)?;
        if changed {
            self.persist(&next).await?;
            *state = next;
        }
        Ok(out)
    }
}

#[async_trait]
impl QueueStore for InMemoryStore {
    async fn observe_user(&self, info: &UserInfo) -> Result<User> {
        let observed = User::from(info);
        self.mutate(|state| {
            match state.users.get(&info.id) {
                Some(existing) if *existing == observed => return Ok((existing.clone(), false)),
                Some(_) => tracing::debug!(user_id = info.id.0, "user name changed"),
                None => tracing::debug!(user_id = info.id.0, "new user"),
            }
            state.users.insert(info.id, observed.clone());
            Ok((observed, true))
        })
        .await
    }

    async fn observe_group(&self, chat: &ChatInfo, member: UserId) -> Result<Group> {
        let title = chat.title.clone().unwrap_or_default();
        self.mutate(|state| {
            let mut changed = false;
            let group = state.groups.entry(chat.id).or_insert_with(|| {
                tracing::debug!(chat_id = chat.id.0, "new group");
                changed = true;
                Group {
                    id: chat.id,
                    title: title.clone(),
                    members: Vec::new(),
                }
            });
            if group.title != title && !title.is_empty() {
                group.title = title;
                changed = true;
            }
            if !group.members.contains(&member) {
                group.members.push(member);
                changed = true;
            }
            Ok((group.clone(), changed))
        })
        .await
    }

    async fn group(&self, id: ChatId) -> Result<Option<Group>> {
        Ok(self.state.lock().await.groups.get(&id).cloned())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn groups_of_user(&self, user: UserId) -> Result<Vec<Group>> {
        let state = self.state.lock().await;
        let mut groups: Vec<Group> = state
            .groups
            .values()
            .filter(|g| g.members.contains(&user))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(groups)
    }

    async fn queues_in_group(&self, group: ChatId) -> Result<Vec<Queue>> {
        let state = self.state.lock().await;
        let mut queues: Vec<Queue> = state
            .queues
            .values()
            .filter(|q| q.group_id == group)
            .cloned()
            .collect();
        queues.sort_by_key(|q| q.id);
        Ok(queues)
    }

    async fn queue(&self, id: QueueId) -> Result<Option<Queue>> {
        Ok(self.state.lock().await.queues.get(&id).cloned())
    }

    async fn queue_by_name(&self, group: ChatId, name: &str) -> Result<Option<Queue>> {
        let state = self.state.lock().await;
        let wanted = name.to_lowercase();
        Ok(state
            .queues
            .values()
            .find(|q| q.group_id == group && q.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn create_queue(&self, new: NewQueue) -> Result<Queue> {
        self.mutate(|state| {
            let wanted = new.name.to_lowercase();
            if state
                .queues
                .values()
                .any(|q| q.group_id == new.group_id && q.name.to_lowercase() == wanted)
            {
                return Err(Conflict::QueueNameTaken.into());
            }
            state.next_queue_id += 1;
            let queue = Queue {
                id: QueueId(state.next_queue_id),
                group_id: new.group_id,
                name: new.name,
                creator_id: new.creator_id,
                is_dynamic: false,
                members: Vec::new(),
            };
            state.queues.insert(queue.id, queue.clone());
            Ok((queue, true))
        })
        .await
    }

    async fn delete_queue(&self, id: QueueId) -> Result<bool> {
        self.mutate(|state| {
            let removed = state.queues.remove(&id).is_some();
            Ok((removed, removed))
        })
        .await
    }

    async fn set_dynamic(&self, id: QueueId, is_dynamic: bool) -> Result<bool> {
        self.mutate(|state| {
            let Some(queue) = state.queue_mut(id) else {
                return Ok((false, false));
            };
            let changed = queue.is_dynamic != is_dynamic;
            queue.is_dynamic = is_dynamic;
            Ok((true, changed))
        })
        .await
    }

    async fn add_member(&self, id: QueueId, user: UserId, position: u32) -> Result<bool> {
        self.mutate(|state| {
            let Some(queue) = state.queue_mut(id) else {
                return Ok((false, false));
            };
            if queue.is_member(user) {
                return Err(Conflict::AlreadyMember.into());
            }
            if queue.members.iter().any(|m| m.position == position) {
                return Err(Conflict::PositionReserved(position).into());
            }
            queue.members.push(QueueMember {
                user_id: user,
                position,
            });
            queue.members.sort_by_key(|m| m.position);
            Ok((true, true))
        })
        .await
    }

    async fn remove_member(&self, id: QueueId, user: UserId) -> Result<Option<u32>> {
        self.mutate(|state| {
            let Some(queue) = state.queue_mut(id) else {
                return Ok((None, false));
            };
            let Some(idx) = queue.members.iter().position(|m| m.user_id == user) else {
                return Ok((None, false));
            };
            let removed = queue.members.remove(idx);
            Ok((Some(removed.position), true))
        })
        .await
    }

    async fn swap_positions(
        &self,
        id: QueueId,
        requester: UserId,
        expected: u32,
        target: UserId,
    ) -> Result<Option<SwapResolution>> {
        self.mutate(|state| {
            let Some(queue) = state.queue_mut(id) else {
                return Ok((None, false));
            };
            let resolution = swap::resolve(
                expected,
                queue.position_of(requester),
                queue.position_of(target),
            );
            let SwapResolution::Swap {
                requester_position,
                target_position,
            } = resolution
            else {
                return Ok((Some(resolution), false));
            };
            for m in queue.members.iter_mut() {
                if m.user_id == requester {
                    m.position = target_position;
                } else if m.user_id == target {
                    m.position = requester_position;
                }
            }
            queue.members.sort_by_key(|m| m.position);
            Ok((Some(resolution), true))
        })
        .await
    }

    async fn compress(&self, id: QueueId, starting_at: u32) -> Result<bool> {
        self.mutate(|state| {
            let moved = state
                .queue_mut(id)
                .is_some_and(|queue| positions::compress(&mut queue.members, starting_at));
            Ok((moved, moved))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: i64, title: &str) -> ChatInfo {
        ChatInfo {
            id: ChatId(id),
            title: Some(title.to_string()),
            is_private: false,
        }
    }

    fn user(id: i64, first: &str) -> UserInfo {
        UserInfo {
            id: UserId(id),
            first_name: first.to_string(),
            last_name: None,
        }
    }

    async fn queue_with(store: &InMemoryStore, members: &[(i64, u32)]) -> QueueId {
        let q = store
            .create_queue(NewQueue {
                group_id: ChatId(-1),
                name: "Snacks".to_string(),
                creator_id: UserId(1),
            })
            .await
            .unwrap();
        for &(u, p) in members {
            assert!(store.add_member(q.id, UserId(u), p).await.unwrap());
        }
        q.id
    }

    fn positions_of(q: &Queue) -> Vec<(i64, u32)> {
        q.members.iter().map(|m| (m.user_id.0, m.position)).collect()
    }

    #[tokio::test]
    async fn observe_updates_drifted_names_and_titles() {
        let store = InMemoryStore::new();
        store.observe_user(&user(1, "Ann")).await.unwrap();
        let renamed = store.observe_user(&user(1, "Anna")).await.unwrap();
        assert_eq!(renamed.first_name, "Anna");
        assert_eq!(store.user(UserId(1)).await.unwrap().unwrap().first_name, "Anna");

        store.observe_group(&chat(-1, "Old"), UserId(1)).await.unwrap();
        let g = store.observe_group(&chat(-1, "New"), UserId(2)).await.unwrap();
        assert_eq!(g.title, "New");
        assert_eq!(g.members, vec![UserId(1), UserId(2)]);

        let of_two = store.groups_of_user(UserId(2)).await.unwrap();
        assert_eq!(of_two.len(), 1);
        assert!(store.groups_of_user(UserId(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn queue_names_are_unique_per_group_ignoring_case() {
        let store = InMemoryStore::new();
        queue_with(&store, &[]).await;
        let dup = store
            .create_queue(NewQueue {
                group_id: ChatId(-1),
                name: "snacks".to_string(),
                creator_id: UserId(2),
            })
            .await;
        assert!(matches!(dup, Err(Error::Conflict(Conflict::QueueNameTaken))));

        let other_group = store
            .create_queue(NewQueue {
                group_id: ChatId(-2),
                name: "Snacks".to_string(),
                creator_id: UserId(2),
            })
            .await;
        assert!(other_group.is_ok());
        assert!(store
            .queue_by_name(ChatId(-1), "SNACKS")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn add_member_enforces_uniqueness() {
        let store = InMemoryStore::new();
        let id = queue_with(&store, &[(1, 1)]).await;

        let same_user = store.add_member(id, UserId(1), 2).await;
        assert!(matches!(same_user, Err(Error::Conflict(Conflict::AlreadyMember))));

        let same_pos = store.add_member(id, UserId(2), 1).await;
        assert!(matches!(
            same_pos,
            Err(Error::Conflict(Conflict::PositionReserved(1)))
        ));

        assert!(!store.add_member(QueueId(999), UserId(2), 1).await.unwrap());
    }

    #[tokio::test]
    async fn swap_remove_and_compress() {
        let store = InMemoryStore::new();
        let id = queue_with(&store, &[(1, 1), (2, 3), (3, 5)]).await;

        let swapped = store.swap_positions(id, UserId(1), 1, UserId(3)).await.unwrap();
        assert_eq!(
            swapped,
            Some(SwapResolution::Swap {
                requester_position: 1,
                target_position: 5
            })
        );
        let q = store.queue(id).await.unwrap().unwrap();
        assert_eq!(positions_of(&q), vec![(3, 1), (2, 3), (1, 5)]);

        assert_eq!(store.remove_member(id, UserId(2)).await.unwrap(), Some(3));
        assert_eq!(store.remove_member(id, UserId(2)).await.unwrap(), None);
        assert!(store.compress(id, 1).await.unwrap());
        let q = store.queue(id).await.unwrap().unwrap();
        assert_eq!(positions_of(&q), vec![(3, 1), (1, 2)]);

        assert_eq!(
            store.swap_positions(id, UserId(1), 2, UserId(9)).await.unwrap(),
            Some(SwapResolution::TargetLeft)
        );
        assert_eq!(
            store.swap_positions(QueueId(404), UserId(1), 2, UserId(3)).await.unwrap(),
            None
        );
        assert!(store.delete_queue(id).await.unwrap());
        assert!(!store.delete_queue(id).await.unwrap());
    }

    #[tokio::test]
    async fn stale_swap_moves_nobody() {
        let store = InMemoryStore::new();
        let id = queue_with(&store, &[(1, 5), (2, 7)]).await;

        let outcome = store.swap_positions(id, UserId(1), 2, UserId(2)).await.unwrap();
        assert_eq!(outcome, Some(SwapResolution::Stale { current: 5 }));
        let q = store.queue(id).await.unwrap().unwrap();
        assert_eq!(positions_of(&q), vec![(1, 5), (2, 7)]);

        store.remove_member(id, UserId(1)).await.unwrap();
        let outcome = store.swap_positions(id, UserId(1), 5, UserId(2)).await.unwrap();
        assert_eq!(outcome, Some(SwapResolution::RequesterLeft));
    }

    #[tokio::test]
    async fn failed_write_leaves_state_untouched() {
        let dir = std::env::temp_dir().join(format!("qbot-missing-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let store = InMemoryStore::open(dir.join("store.json")).await.unwrap();

        let created = store
            .create_queue(NewQueue {
                group_id: ChatId(-1),
                name: "Snacks".to_string(),
                creator_id: UserId(1),
            })
            .await;
        assert!(matches!(created, Err(Error::Io(_))));
        assert!(store.queues_in_group(ChatId(-1)).await.unwrap().is_empty());

        assert!(store.observe_user(&user(1, "Ann")).await.is_err());
        assert!(store.user(UserId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let path = std::env::temp_dir().join(format!("qbot-store-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        {
            let store = InMemoryStore::open(&path).await.unwrap();
            let q = store
                .create_queue(NewQueue {
                    group_id: ChatId(-7),
                    name: "Lunch".to_string(),
                    creator_id: UserId(1),
                })
                .await
                .unwrap();
            store.add_member(q.id, UserId(1), 2).await.unwrap();
        }

        let store = InMemoryStore::open(&path).await.unwrap();
        let q = store.queue_by_name(ChatId(-7), "lunch").await.unwrap().unwrap();
        assert_eq!(q.position_of(UserId(1)), Some(2));

        let next = store
            .create_queue(NewQueue {
                group_id: ChatId(-7),
                name: "Dinner".to_string(),
                creator_id: UserId(1),
            })
            .await
            .unwrap();
        assert_ne!(next.id, q.id);

        let _ = std::fs::remove_file(&path);
    }
}
