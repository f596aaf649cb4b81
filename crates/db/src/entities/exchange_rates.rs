//! `SeaORM` Entity for exchange_rates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Char(Some(3))")]
    pub from_currency: String,
    #[sea_orm(column_type = "Char(Some(3))")]
    pub to_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 10)))")]
    pub rate: Decimal,
    pub effective_date: Date,
    pub created_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currencies::Entity",
        from = "Column::FromCurrency",
        to = "super::currencies::Column::Code"
    )]
    FromCurrency,
    #[sea_orm(
        belongs_to = "super::currencies::Entity",
        from = "Column::ToCurrency",
        to = "super::currencies::Column::Code"
    )]
    ToCurrency,
}

impl ActiveModelBehavior for ActiveModel {}
