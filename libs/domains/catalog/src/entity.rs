//! Sea-ORM entities for the relational perfume catalog.
//!
//! Association tables carry composite primary keys and a `belongs_to`
//! relation towards their target so the repository can join them in a single
//! query per association kind.

use crate::models::{Concentration, DesignerRole, NoteType};

pub mod perfume {
    use super::Concentration;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "perfumes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub brand_id: Option<Uuid>,
        pub release_year: Option<i32>,
        pub concentration: Concentration,
        pub image_url: Option<String>,
        pub average_rating: f64,
        pub review_count: i64,
        pub is_approved: bool,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::brand::Entity",
            from = "Column::BrandId",
            to = "super::brand::Column::Id"
        )]
        Brand,
    }

    impl Related<super::brand::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Brand.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod brand {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "brands")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod note {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "notes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod perfume_note {
    use super::NoteType;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "perfume_notes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub perfume_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub note_id: Uuid,
        pub note_type: NoteType,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::note::Entity",
            from = "Column::NoteId",
            to = "super::note::Column::Id"
        )]
        Note,
    }

    impl Related<super::note::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Note.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod accord {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "accords")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod perfume_accord {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "perfume_accords")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub perfume_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub accord_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::accord::Entity",
            from = "Column::AccordId",
            to = "super::accord::Column::Id"
        )]
        Accord,
    }

    impl Related<super::accord::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Accord.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod designer {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "designers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod perfume_designer {
    use super::DesignerRole;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "perfume_designers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub perfume_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub designer_id: Uuid,
        pub role: DesignerRole,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::designer::Entity",
            from = "Column::DesignerId",
            to = "super::designer::Column::Id"
        )]
        Designer,
    }

    impl Related<super::designer::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Designer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod review {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "reviews")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub member_id: Uuid,
        pub perfume_id: Uuid,
        pub rating: f64,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
