use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entity,
    error::CatalogResult,
    models::{
        AccordRef, BrandRef, DesignerAssociation, MemberRating, NoteAssociation, PerfumeAggregate,
    },
    repository::CatalogReadRepository,
};

/// sea-orm implementation of the catalog read port.
///
/// Every aggregate is assembled from four queries (perfume + brand join, then
/// one join per association table), all eager. The returned snapshot holds
/// no connection and triggers no further I/O.
pub struct PgCatalogRepository {
    db: DatabaseConnection,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load_notes(&self, perfume_id: Uuid) -> CatalogResult<Vec<NoteAssociation>> {
        let rows = entity::perfume_note::Entity::find()
            .filter(entity::perfume_note::Column::PerfumeId.eq(perfume_id))
            .find_also_related(entity::note::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(link, note)| NoteAssociation {
                id: note.as_ref().map(|n| n.id),
                name: note.map(|n| n.name).unwrap_or_default(),
                note_type: link.note_type,
            })
            .collect())
    }

    async fn load_accords(&self, perfume_id: Uuid) -> CatalogResult<Vec<AccordRef>> {
        let rows = entity::perfume_accord::Entity::find()
            .filter(entity::perfume_accord::Column::PerfumeId.eq(perfume_id))
            .find_also_related(entity::accord::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(_, accord)| AccordRef {
                id: accord.as_ref().map(|a| a.id),
                name: accord.map(|a| a.name).unwrap_or_default(),
            })
            .collect())
    }

    async fn load_designers(&self, perfume_id: Uuid) -> CatalogResult<Vec<DesignerAssociation>> {
        let rows = entity::perfume_designer::Entity::find()
            .filter(entity::perfume_designer::Column::PerfumeId.eq(perfume_id))
            .find_also_related(entity::designer::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(link, designer)| DesignerAssociation {
                id: designer.as_ref().map(|d| d.id),
                name: designer.map(|d| d.name).unwrap_or_default(),
                role: link.role,
            })
            .collect())
    }

    async fn assemble(
        &self,
        perfume: entity::perfume::Model,
        brand: Option<entity::brand::Model>,
    ) -> CatalogResult<PerfumeAggregate> {
        let notes = self.load_notes(perfume.id).await?;
        let accords = self.load_accords(perfume.id).await?;
        let designers = self.load_designers(perfume.id).await?;

        Ok(PerfumeAggregate {
            id: perfume.id,
            name: perfume.name,
            description: perfume.description,
            brand: brand.map(|b| BrandRef {
                id: Some(b.id),
                name: b.name,
            }),
            release_year: perfume.release_year,
            concentration: perfume.concentration,
            image_url: perfume.image_url,
            average_rating: perfume.average_rating,
            review_count: perfume.review_count,
            is_approved: perfume.is_approved,
            notes,
            accords,
            designers,
            created_at: perfume.created_at.into(),
            updated_at: perfume.updated_at.into(),
        })
    }
}

#[async_trait]
impl CatalogReadRepository for PgCatalogRepository {
    #[instrument(skip(self))]
    async fn load_aggregate(&self, id: Uuid) -> CatalogResult<Option<PerfumeAggregate>> {
        let found = entity::perfume::Entity::find_by_id(id)
            .find_also_related(entity::brand::Entity)
            .one(&self.db)
            .await?;

        match found {
            Some((perfume, brand)) => Ok(Some(self.assemble(perfume, brand).await?)),
            None => Ok(None),
        }
    }

    async fn list_aggregates(
        &self,
        offset: u64,
        limit: u64,
    ) -> CatalogResult<Vec<PerfumeAggregate>> {
        let rows = entity::perfume::Entity::find()
            .find_also_related(entity::brand::Entity)
            .order_by_asc(entity::perfume::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        let mut aggregates = Vec::with_capacity(rows.len());
        for (perfume, brand) in rows {
            aggregates.push(self.assemble(perfume, brand).await?);
        }

        Ok(aggregates)
    }

    async fn count_perfumes(&self) -> CatalogResult<u64> {
        let count = entity::perfume::Entity::find().count(&self.db).await?;
        Ok(count)
    }

    async fn list_member_ratings(&self, member_id: Uuid) -> CatalogResult<Vec<MemberRating>> {
        let rows = entity::review::Entity::find()
            .filter(entity::review::Column::MemberId.eq(member_id))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemberRating {
                member_id: r.member_id,
                perfume_id: r.perfume_id,
                rating: r.rating,
            })
            .collect())
    }

    async fn list_reviewer_ids(&self) -> CatalogResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = entity::review::Entity::find()
            .select_only()
            .column(entity::review::Column::MemberId)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ids)
    }
}
