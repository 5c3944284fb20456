use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProviderLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProviderLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserProviderLinks::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserProviderLinks::Provider)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserProviderLinks::ExternalId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserProviderLinks::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_provider_links_user_id")
                            .from(UserProviderLinks::Table, UserProviderLinks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户在同一提供商下只有一个绑定
        manager
            .create_index(
                Index::create()
                    .name("idx_user_provider_links_user_provider")
                    .table(UserProviderLinks::Table)
                    .col(UserProviderLinks::UserId)
                    .col(UserProviderLinks::Provider)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 查找索引，不是唯一约束
        manager
            .create_index(
                Index::create()
                    .name("idx_user_provider_links_provider_external")
                    .table(UserProviderLinks::Table)
                    .col(UserProviderLinks::Provider)
                    .col(UserProviderLinks::ExternalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProviderLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserProviderLinks {
    Table,
    Id,
    UserId,
    Provider,
    ExternalId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
