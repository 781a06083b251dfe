//! Interface methods for interacting with the projects table

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{
    client::{DbClient, DbConn},
    error::DbError,
    models::ProjectModel,
    schema::projects,
};

impl DbClient {
    // -----------
    // | Setters |
    // -----------

    /// Insert a new project
    pub async fn insert_project_record(
        &self,
        project: ProjectModel,
        conn: &mut DbConn<'_>,
    ) -> Result<(), DbError> {
        diesel::insert_into(projects::table)
            .values(project)
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    // -----------
    // | Getters |
    // -----------

    /// Get a project by ID
    pub async fn get_project_record(
        &self,
        id: Uuid,
        conn: &mut DbConn<'_>,
    ) -> Result<Option<ProjectModel>, DbError> {
        projects::table
            .filter(projects::id.eq(id))
            .first(conn)
            .await
            .optional()
            .map_err(DbError::from)
    }
}
