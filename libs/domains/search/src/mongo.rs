//! MongoDB implementation of the search store ports.
//!
//! Cheap boolean filters (approval, brand, facets, ranges) are pushed into
//! the store; scoring and total ordering always run through [`crate::query`]
//! so the adapter cannot drift from the tested ranking contract.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::criteria::SearchCriteria;
use crate::document::{PerfumeDocument, SearchPage};
use crate::error::SearchResult;
use crate::preferences::{MemberPreferences, PreferenceRepository, PreferenceVector};
use crate::query;
use crate::repository::SearchRepository;

const DOCUMENTS_COLLECTION: &str = "perfume_documents";
const PREFERENCES_COLLECTION: &str = "member_preferences";

/// Case-insensitive whole-value match
fn exact_ci(value: &str) -> Document {
    doc! { "$regex": format!("^{}$", regex::escape(value.trim())), "$options": "i" }
}

/// MongoDB implementation of [`SearchRepository`]
pub struct MongoSearchRepository {
    collection: Collection<PerfumeDocument>,
}

impl MongoSearchRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<PerfumeDocument>(DOCUMENTS_COLLECTION),
        }
    }

    /// Build the MongoDB filter for the criteria's boolean constraints.
    ///
    /// The approved-only filter is unconditional. Keyword relevance is not
    /// expressible here; it stays in the query module.
    fn build_filter(criteria: &SearchCriteria) -> Document {
        let mut filter = doc! { "is_approved": true };

        if let Some(brand) = &criteria.brand_name {
            filter.insert("brand_name", exact_ci(brand));
        }

        if let Some(note_name) = &criteria.note_name {
            let mut elem = doc! { "name": exact_ci(note_name) };
            if let Some(note_type) = criteria.note_type {
                elem.insert("note_type", note_type.to_string());
            }
            filter.insert("notes", doc! { "$elemMatch": elem });
        }

        if let Some(accord) = &criteria.accord_name {
            filter.insert("accords.name", exact_ci(accord));
        }

        let mut year = Document::new();
        if let Some(from) = criteria.year_from {
            year.insert("$gte", from);
        }
        if let Some(to) = criteria.year_to {
            year.insert("$lte", to);
        }
        if !year.is_empty() {
            filter.insert("release_year", year);
        }

        let mut rating = Document::new();
        if let Some(min) = criteria.min_rating {
            rating.insert("$gte", min);
        }
        if let Some(max) = criteria.max_rating {
            rating.insert("$lte", max);
        }
        if !rating.is_empty() {
            filter.insert("average_rating", rating);
        }

        filter
    }

    async fn fetch(&self, filter: Document) -> SearchResult<Vec<PerfumeDocument>> {
        let cursor = self.collection.find(filter).await?;
        let docs: Vec<PerfumeDocument> = cursor.try_collect().await?;
        Ok(docs)
    }
}

#[async_trait]
impl SearchRepository for MongoSearchRepository {
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn upsert(&self, document: PerfumeDocument) -> SearchResult<()> {
        self.collection
            .replace_one(doc! { "_id": &document.id }, &document)
            .upsert(true)
            .await?;

        tracing::debug!(document_id = %document.id, "Upserted search document");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> SearchResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        // Deleting an absent id is a no-op success
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> SearchResult<Option<PerfumeDocument>> {
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(document)
    }

    async fn count(&self) -> SearchResult<u64> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    #[instrument(skip(self, criteria))]
    async fn search(&self, criteria: &SearchCriteria) -> SearchResult<SearchPage> {
        let candidates = self.fetch(Self::build_filter(criteria)).await?;
        Ok(query::execute(candidates, criteria))
    }

    #[instrument(skip(self))]
    async fn find_similar(&self, id: &str, limit: usize) -> SearchResult<Vec<PerfumeDocument>> {
        // Best-effort: an unknown reference is an empty result, not an error
        let Some(reference) = self.get_by_id(id).await? else {
            return Ok(Vec::new());
        };

        let candidates = self.fetch(doc! { "is_approved": true }).await?;
        Ok(query::rank_similar(candidates, &reference, limit))
    }

    #[instrument(skip(self, preferences))]
    async fn find_recommended(
        &self,
        preferences: &PreferenceVector,
        limit: usize,
    ) -> SearchResult<Vec<PerfumeDocument>> {
        if !preferences.has_signal() {
            return Ok(Vec::new());
        }

        let candidates = self.fetch(doc! { "is_approved": true }).await?;
        Ok(query::rank_recommended(candidates, preferences, limit))
    }
}

/// MongoDB implementation of [`PreferenceRepository`]
pub struct MongoPreferenceRepository {
    collection: Collection<MemberPreferences>,
}

impl MongoPreferenceRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<MemberPreferences>(PREFERENCES_COLLECTION),
        }
    }
}

#[async_trait]
impl PreferenceRepository for MongoPreferenceRepository {
    #[instrument(skip(self))]
    async fn get_by_member(&self, member_id: Uuid) -> SearchResult<Option<MemberPreferences>> {
        let filter = doc! { "_id": to_bson(&member_id).unwrap_or(Bson::Null) };
        let preferences = self.collection.find_one(filter).await?;
        Ok(preferences)
    }

    #[instrument(skip(self, preferences), fields(member_id = %preferences.member_id))]
    async fn upsert(&self, preferences: MemberPreferences) -> SearchResult<()> {
        let filter = doc! { "_id": to_bson(&preferences.member_id).unwrap_or(Bson::Null) };
        self.collection
            .replace_one(filter, &preferences)
            .upsert(true)
            .await?;

        Ok(())
    }
}

/// Create the indexes the query filters rely on. Idempotent; called at
/// service startup.
pub async fn init_indexes(db: &Database) -> SearchResult<()> {
    let documents = db.collection::<PerfumeDocument>(DOCUMENTS_COLLECTION);

    documents
        .create_index(IndexModel::builder().keys(doc! { "is_approved": 1 }).build())
        .await?;
    documents
        .create_index(IndexModel::builder().keys(doc! { "brand_name": 1 }).build())
        .await?;
    documents
        .create_index(IndexModel::builder().keys(doc! { "notes.name": 1 }).build())
        .await?;
    documents
        .create_index(
            IndexModel::builder()
                .keys(doc! { "accords.name": 1 })
                .build(),
        )
        .await?;

    tracing::info!("Search store indexes ensured");
    Ok(())
}
