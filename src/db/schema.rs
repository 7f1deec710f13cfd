use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, Schema,
    sea_query::{Index, IndexCreateStatement, TableCreateStatement},
};
use tracing::info;

use super::entities::{
    alert, alert_channel, alert_rule, alert_rule_channel, alert_rule_target, alert_state, setting,
};

/// Creates every alerting table and index that does not exist yet.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents before children so foreign keys resolve.
    let tables: Vec<TableCreateStatement> = vec![
        table(&schema, alert::Entity),
        table(&schema, alert_rule::Entity),
        table(&schema, alert_rule_target::Entity),
        table(&schema, alert_channel::Entity),
        table(&schema, alert_rule_channel::Entity),
        table(&schema, alert_state::Entity),
        table(&schema, setting::Entity),
    ];
    for stmt in &tables {
        db.execute(backend.build(stmt)).await?;
    }

    for stmt in indexes() {
        db.execute(backend.build(&stmt)).await?;
    }

    info!("Alerting schema is up to date.");
    Ok(())
}

fn table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    stmt
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        // Channel dedup: saving a rule with an existing webhook reuses the row.
        Index::create()
            .name("ux_alert_channels_type_config")
            .table(alert_channel::Entity)
            .col(alert_channel::Column::ChannelType)
            .col(alert_channel::Column::ConfigJson)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ix_alert_rule_targets_server")
            .table(alert_rule_target::Entity)
            .col(alert_rule_target::Column::ServerId)
            .if_not_exists()
            .to_owned(),
    ]
}
