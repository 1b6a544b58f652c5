//! In-memory port implementations for integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use domain_catalog::{
    AccordRef, BrandRef, CatalogReadRepository, CatalogResult, Concentration, MemberRating,
    PerfumeAggregate,
};
use domain_search::{
    query, MemberPreferences, PerfumeDocument, PreferenceRepository, PreferenceVector,
    SearchCriteria, SearchPage, SearchRepository, SearchResult,
};
use uuid::Uuid;

/// Relational catalog held in a map
#[derive(Default)]
pub struct InMemoryCatalog {
    perfumes: Mutex<HashMap<Uuid, PerfumeAggregate>>,
}

impl InMemoryCatalog {
    pub fn insert(&self, aggregate: PerfumeAggregate) {
        self.perfumes.lock().unwrap().insert(aggregate.id, aggregate);
    }

    pub fn remove(&self, id: Uuid) {
        self.perfumes.lock().unwrap().remove(&id);
    }

    pub fn ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.perfumes.lock().unwrap().keys().copied().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl CatalogReadRepository for InMemoryCatalog {
    async fn load_aggregate(&self, id: Uuid) -> CatalogResult<Option<PerfumeAggregate>> {
        Ok(self.perfumes.lock().unwrap().get(&id).cloned())
    }

    async fn list_aggregates(
        &self,
        offset: u64,
        limit: u64,
    ) -> CatalogResult<Vec<PerfumeAggregate>> {
        let guard = self.perfumes.lock().unwrap();
        let mut all: Vec<PerfumeAggregate> = guard.values().cloned().collect();
        all.sort_by_key(|a| a.id);

        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_perfumes(&self) -> CatalogResult<u64> {
        Ok(self.perfumes.lock().unwrap().len() as u64)
    }

    async fn list_member_ratings(&self, _member_id: Uuid) -> CatalogResult<Vec<MemberRating>> {
        Ok(vec![])
    }

    async fn list_reviewer_ids(&self) -> CatalogResult<Vec<Uuid>> {
        Ok(vec![])
    }
}

/// Document store held in a map; queries delegate to the pure query module
/// exactly like the MongoDB adapter does.
#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<HashMap<String, PerfumeDocument>>,
}

impl InMemoryStore {
    pub fn snapshot(&self) -> Vec<PerfumeDocument> {
        let mut docs: Vec<PerfumeDocument> =
            self.documents.lock().unwrap().values().cloned().collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.documents.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl SearchRepository for InMemoryStore {
    async fn upsert(&self, document: PerfumeDocument) -> SearchResult<()> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.id.clone(), document);
        Ok(())
    }

    async fn delete(&self, id: &str) -> SearchResult<bool> {
        Ok(self.documents.lock().unwrap().remove(id).is_some())
    }

    async fn get_by_id(&self, id: &str) -> SearchResult<Option<PerfumeDocument>> {
        Ok(self.documents.lock().unwrap().get(id).cloned())
    }

    async fn count(&self) -> SearchResult<u64> {
        Ok(self.documents.lock().unwrap().len() as u64)
    }

    async fn search(&self, criteria: &SearchCriteria) -> SearchResult<SearchPage> {
        let docs: Vec<PerfumeDocument> =
            self.documents.lock().unwrap().values().cloned().collect();
        Ok(query::execute(docs, criteria))
    }

    async fn find_similar(&self, id: &str, limit: usize) -> SearchResult<Vec<PerfumeDocument>> {
        let Some(reference) = self.get_by_id(id).await? else {
            return Ok(Vec::new());
        };

        let docs: Vec<PerfumeDocument> =
            self.documents.lock().unwrap().values().cloned().collect();
        Ok(query::rank_similar(docs, &reference, limit))
    }

    async fn find_recommended(
        &self,
        preferences: &PreferenceVector,
        limit: usize,
    ) -> SearchResult<Vec<PerfumeDocument>> {
        let docs: Vec<PerfumeDocument> =
            self.documents.lock().unwrap().values().cloned().collect();
        Ok(query::rank_recommended(docs, preferences, limit))
    }
}

/// Preference store held in a map
#[derive(Default)]
pub struct InMemoryPreferences {
    vectors: Mutex<HashMap<Uuid, MemberPreferences>>,
}

#[async_trait]
impl PreferenceRepository for InMemoryPreferences {
    async fn get_by_member(&self, member_id: Uuid) -> SearchResult<Option<MemberPreferences>> {
        Ok(self.vectors.lock().unwrap().get(&member_id).cloned())
    }

    async fn upsert(&self, preferences: MemberPreferences) -> SearchResult<()> {
        self.vectors
            .lock()
            .unwrap()
            .insert(preferences.member_id, preferences);
        Ok(())
    }
}

pub fn perfume(id: u128, name: &str, accords: &[(u128, &str)]) -> PerfumeAggregate {
    PerfumeAggregate {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        description: String::new(),
        brand: Some(BrandRef {
            id: Some(Uuid::from_u128(9000)),
            name: "House".to_string(),
        }),
        release_year: Some(2019),
        concentration: Concentration::Edp,
        image_url: None,
        average_rating: 4.0,
        review_count: 5,
        is_approved: true,
        notes: vec![],
        accords: accords
            .iter()
            .map(|(accord_id, accord_name)| AccordRef {
                id: Some(Uuid::from_u128(*accord_id)),
                name: accord_name.to_string(),
            })
            .collect(),
        designers: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
