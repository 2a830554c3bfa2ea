use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_items_table::Migration)]
    }
}

mod m20240101_000001_create_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .binary_len(16)
                                .not_null()
                                .primary_key(),
                        )
                        // Unique: the conflict target of the upsert-by-name write
                        .col(ColumnDef::new(Items::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Items::Category).string().not_null())
                        .col(ColumnDef::new(Items::Price).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Items::LastUpdatedDt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_items_last_updated_dt")
                        .table(Items::Table)
                        .col(Items::LastUpdatedDt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Items {
        Table,
        Id,
        Name,
        Category,
        Price,
        LastUpdatedDt,
    }
}
