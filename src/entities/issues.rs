use sea_orm::entity::prelude::*;

use crate::domain::{IssueStatus, Severity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub severity: Severity,
    pub status: IssueStatus,
    pub reporter_id: i32,
    pub assignee_id: Option<i32>,
    /// JSON array of tags, insertion order preserved.
    pub tags: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReporterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssigneeId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Assignee,
    #[sea_orm(has_many = "super::issue_files::Entity")]
    IssueFiles,
}

impl Related<super::issue_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IssueFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
