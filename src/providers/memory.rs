//! In-memory reference storage
//!
//! Brute-force cosine similarity over every stored vector. Good for tests,
//! demos and small personal collections; a real deployment puts a vector
//! index behind the `Storage` trait instead.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

use super::{Entity, Memo, ProviderError, Schedule, ScoredEntity, Storage};
use crate::temporal::{ScheduleQueryMode, TimeRange};

#[derive(Debug)]
struct Record {
    entity: Entity,
    vector: Option<Vec<f32>>,
}

/// Memos and schedules held in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a memo with its embedding
    pub fn add_memo(&self, memo: Memo, vector: Vec<f32>) {
        self.push(Entity::Memo(memo), Some(vector));
    }

    /// Add a schedule; with a vector it also takes part in vector search
    pub fn add_schedule(&self, schedule: Schedule, vector: Option<Vec<f32>>) {
        self.push(Entity::Schedule(schedule), vector);
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, entity: Entity, vector: Option<Vec<f32>>) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Record { entity, vector });
    }
}

fn owner(entity: &Entity) -> i32 {
    match entity {
        Entity::Memo(memo) => memo.creator_id,
        Entity::Schedule(schedule) => schedule.creator_id,
    }
}

/// Whether a schedule matches `range` under `mode`
fn schedule_matches(schedule: &Schedule, range: &TimeRange, mode: ScheduleQueryMode) -> bool {
    match (mode, schedule.end) {
        (ScheduleQueryMode::Strict, _) => {
            range.contains(schedule.start) && schedule.effective_end() <= range.end
        }
        (_, None) => range.contains(schedule.start),
        (_, Some(end)) => schedule.start < range.end && end > range.start,
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn list_schedules(
        &self,
        creator_id: i32,
        range: Option<&TimeRange>,
        mode: ScheduleQueryMode,
    ) -> Result<Vec<Schedule>, ProviderError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);

        let mut schedules: Vec<Schedule> = records
            .iter()
            .filter_map(|record| match &record.entity {
                Entity::Schedule(schedule) if schedule.creator_id == creator_id => Some(schedule),
                _ => None,
            })
            .filter(|schedule| range.map_or(true, |r| schedule_matches(schedule, r, mode)))
            .cloned()
            .collect();

        schedules.sort_by_key(|schedule| (schedule.start, schedule.id));
        Ok(schedules)
    }

    async fn vector_search(
        &self,
        user_id: i32,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredEntity>, ProviderError> {
        if vector.is_empty() {
            return Err(ProviderError::InvalidInput("Empty query vector".to_string()));
        }

        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut hits = Vec::new();

        for record in records.iter().filter(|r| owner(&r.entity) == user_id) {
            let Some(stored) = &record.vector else {
                continue;
            };
            if stored.len() != vector.len() {
                return Err(ProviderError::InvalidInput(format!(
                    "Dimension mismatch: expected {}, got {}",
                    stored.len(),
                    vector.len()
                )));
            }
            hits.push(ScoredEntity {
                entity: record.entity.clone(),
                score: cosine_similarity(vector, stored),
            });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, h, 0, 0).unwrap()
    }

    fn schedule(id: i64, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Schedule {
        Schedule {
            id,
            creator_id: 1,
            title: format!("schedule {}", id),
            description: String::new(),
            start,
            end,
        }
    }

    fn memo(id: i64, creator_id: i32) -> Memo {
        Memo {
            id,
            creator_id,
            content: format!("memo {}", id),
            created_at: at(1, 0),
        }
    }

    #[tokio::test]
    async fn test_list_schedules_modes() {
        let store = InMemoryStore::new();
        // Inside the day
        store.add_schedule(schedule(1, at(15, 9), Some(at(15, 10))), None);
        // Crosses midnight into the day
        store.add_schedule(schedule(2, at(14, 23), Some(at(15, 1))), None);
        // Next day
        store.add_schedule(schedule(3, at(16, 9), None), None);

        let day = TimeRange::new(at(15, 0), at(16, 0), "day").unwrap();

        let standard = store
            .list_schedules(1, Some(&day), ScheduleQueryMode::Standard)
            .await
            .unwrap();
        let ids: Vec<i64> = standard.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);

        let strict = store
            .list_schedules(1, Some(&day), ScheduleQueryMode::Strict)
            .await
            .unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].id, 1);

        let all = store
            .list_schedules(1, None, ScheduleQueryMode::Auto)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let other_user = store
            .list_schedules(2, None, ScheduleQueryMode::Auto)
            .await
            .unwrap();
        assert!(other_user.is_empty());
    }

    #[tokio::test]
    async fn test_vector_search_ranks_by_cosine() {
        let store = InMemoryStore::new();
        store.add_memo(memo(1, 1), vec![1.0, 0.0]);
        store.add_memo(memo(2, 1), vec![0.6, 0.8]);
        store.add_memo(memo(3, 2), vec![1.0, 0.0]);
        store.add_schedule(schedule(4, at(15, 9), None), Some(vec![0.0, 1.0]));

        let hits = store.vector_search(1, &[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.entity.id()).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert!((hits[1].score - 0.6).abs() < 1e-6);

        let limited = store.vector_search(1, &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_vector_search_rejects_bad_vectors() {
        let store = InMemoryStore::new();
        store.add_memo(memo(1, 1), vec![1.0, 0.0]);

        assert!(store.vector_search(1, &[], 5).await.is_err());
        assert!(store.vector_search(1, &[1.0, 0.0, 0.0], 5).await.is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
