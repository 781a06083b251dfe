//! Interface methods for interacting with the requests table.
//!
//! Attachment columns are written with a single conditional update which
//! only matches when the column is unset or already holds the given value,
//! so concurrent attaches of different values cannot both succeed.

use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, define_sql_function,
    sql_types::{Nullable, Text},
};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{
    client::{DbClient, DbConn},
    error::DbError,
    models::RequestModel,
    schema::requests,
};

define_sql_function! {
    /// Return the first non-null argument
    fn coalesce(x: Nullable<Text>, y: Nullable<Text>) -> Nullable<Text>;
}

impl DbClient {
    // -----------
    // | Setters |
    // -----------

    /// Insert a new request
    pub async fn insert_request_record(
        &self,
        request: RequestModel,
        conn: &mut DbConn<'_>,
    ) -> Result<(), DbError> {
        diesel::insert_into(requests::table)
            .values(request)
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    /// Delete a request, returning whether it existed
    pub async fn delete_request_record(&self, id: Uuid, conn: &mut DbConn<'_>) -> Result<bool, DbError> {
        let deleted = diesel::delete(requests::table.filter(requests::id.eq(id)))
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(deleted > 0)
    }

    /// Set the transaction hash of a request, recording the caller if none
    /// was recorded yet. Returns whether the update matched.
    pub async fn set_request_tx_hash(
        &self,
        id: Uuid,
        tx_hash: String,
        caller_address: String,
        conn: &mut DbConn<'_>,
    ) -> Result<bool, DbError> {
        let updated = diesel::update(requests::table)
            .filter(requests::id.eq(id))
            .filter(requests::tx_hash.is_null().or(requests::tx_hash.eq(tx_hash.clone())))
            .set((
                requests::tx_hash.eq(tx_hash),
                requests::caller_address.eq(coalesce(requests::caller_address, caller_address)),
            ))
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(updated > 0)
    }

    /// Set the approval transaction hash of a multi-send request, recording
    /// the caller if none was recorded yet. Returns whether the update
    /// matched.
    pub async fn set_request_approve_tx_hash(
        &self,
        id: Uuid,
        tx_hash: String,
        caller_address: String,
        conn: &mut DbConn<'_>,
    ) -> Result<bool, DbError> {
        let updated = diesel::update(requests::table)
            .filter(requests::id.eq(id))
            .filter(
                requests::approve_tx_hash
                    .is_null()
                    .or(requests::approve_tx_hash.eq(tx_hash.clone())),
            )
            .set((
                requests::approve_tx_hash.eq(tx_hash),
                requests::caller_address.eq(coalesce(requests::caller_address, caller_address)),
            ))
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(updated > 0)
    }

    /// Set the contract address of a deployment request. Returns whether the
    /// update matched.
    pub async fn set_request_contract_address(
        &self,
        id: Uuid,
        contract_address: String,
        conn: &mut DbConn<'_>,
    ) -> Result<bool, DbError> {
        let updated = diesel::update(requests::table)
            .filter(requests::id.eq(id))
            .filter(
                requests::contract_address
                    .is_null()
                    .or(requests::contract_address.eq(contract_address.clone())),
            )
            .set(requests::contract_address.eq(contract_address))
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(updated > 0)
    }

    /// Set the signed challenge message of a request. Returns whether the
    /// update matched.
    pub async fn set_request_signed_message(
        &self,
        id: Uuid,
        wallet_address: String,
        signature: String,
        conn: &mut DbConn<'_>,
    ) -> Result<bool, DbError> {
        let unset = requests::signed_wallet_address.is_null().and(requests::signed_message.is_null());
        let same = requests::signed_wallet_address
            .eq(wallet_address.clone())
            .and(requests::signed_message.eq(signature.clone()));

        let updated = diesel::update(requests::table)
            .filter(requests::id.eq(id))
            .filter(unset.or(same))
            .set((
                requests::signed_wallet_address.eq(wallet_address),
                requests::signed_message.eq(signature),
            ))
            .execute(conn)
            .await
            .map_err(DbError::from)?;

        Ok(updated > 0)
    }

    // -----------
    // | Getters |
    // -----------

    /// Get a request by ID
    pub async fn get_request_record(
        &self,
        id: Uuid,
        conn: &mut DbConn<'_>,
    ) -> Result<Option<RequestModel>, DbError> {
        requests::table
            .filter(requests::id.eq(id))
            .first(conn)
            .await
            .optional()
            .map_err(DbError::from)
    }

    /// Get all requests of a kind in a project, oldest first
    pub async fn get_request_records_by_project(
        &self,
        project_id: Uuid,
        kind: &str,
        conn: &mut DbConn<'_>,
    ) -> Result<Vec<RequestModel>, DbError> {
        requests::table
            .filter(requests::project_id.eq(project_id))
            .filter(requests::kind.eq(kind))
            .order(requests::created_at.asc())
            .load(conn)
            .await
            .map_err(DbError::from)
    }

    /// Get a project's request by alias
    pub async fn get_request_record_by_alias(
        &self,
        project_id: Uuid,
        alias: &str,
        conn: &mut DbConn<'_>,
    ) -> Result<Option<RequestModel>, DbError> {
        requests::table
            .filter(requests::project_id.eq(project_id))
            .filter(requests::alias.eq(alias))
            .first(conn)
            .await
            .optional()
            .map_err(DbError::from)
    }

    /// Get the oldest request of a kind whose attached contract address
    /// matches, across all projects on a chain
    pub async fn get_oldest_request_record_by_contract_address(
        &self,
        contract_address: &str,
        chain_id: i64,
        kind: &str,
        conn: &mut DbConn<'_>,
    ) -> Result<Option<RequestModel>, DbError> {
        requests::table
            .filter(requests::contract_address.eq(contract_address))
            .filter(requests::chain_id.eq(chain_id))
            .filter(requests::kind.eq(kind))
            .order(requests::created_at.asc())
            .first(conn)
            .await
            .optional()
            .map_err(DbError::from)
    }
}
