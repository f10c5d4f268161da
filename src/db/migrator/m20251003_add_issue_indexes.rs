use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_issues_reporter_id")
                    .table(Issues::Table)
                    .col(Issues::ReporterId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issue_files_issue_id")
                    .table(IssueFiles::Table)
                    .col(IssueFiles::IssueId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_issue_files_issue_id")
                    .table(IssueFiles::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_issues_reporter_id")
                    .table(Issues::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Issues {
    Table,
    ReporterId,
}

#[derive(DeriveIden)]
enum IssueFiles {
    Table,
    IssueId,
}
