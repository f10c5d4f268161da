use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "daily_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Calendar date, `YYYY-MM-DD`.
    #[sea_orm(unique)]
    pub date: String,
    pub total_issues: i32,
    pub open_issues: i32,
    pub triaged_issues: i32,
    pub in_progress_issues: i32,
    pub done_issues: i32,
    pub critical_count: i32,
    pub high_count: i32,
    pub medium_count: i32,
    pub low_count: i32,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
