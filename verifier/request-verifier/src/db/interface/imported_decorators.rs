//! Interface methods for interacting with the imported contract decorators
//! table

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{
    client::{DbClient, DbConn},
    error::DbError,
    models::ImportedDecoratorModel,
    schema::imported_contract_decorators,
};

impl DbClient {
    // -----------
    // | Setters |
    // -----------

    /// Insert an imported decorator unless the project already holds one with
    /// the same contract ID. Returns whether a row was inserted.
    pub async fn insert_imported_decorator_if_absent(
        &self,
        decorator: ImportedDecoratorModel,
        conn: &mut DbConn<'_>,
    ) -> Result<bool, DbError> {
        let inserted = diesel::insert_into(imported_contract_decorators::table)
            .values(decorator)
            .on_conflict((
                imported_contract_decorators::project_id,
                imported_contract_decorators::contract_id,
            ))
            .do_nothing()
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(inserted > 0)
    }

    // -----------
    // | Getters |
    // -----------

    /// Get a project's imported decorator by contract ID
    pub async fn get_imported_decorator_record(
        &self,
        project_id: Uuid,
        contract_id: &str,
        conn: &mut DbConn<'_>,
    ) -> Result<Option<ImportedDecoratorModel>, DbError> {
        imported_contract_decorators::table
            .filter(imported_contract_decorators::project_id.eq(project_id))
            .filter(imported_contract_decorators::contract_id.eq(contract_id))
            .first(conn)
            .await
            .optional()
            .map_err(DbError::from)
    }
}
