pub mod connection {
    use std::time::Duration;

    use crate::config::env_var;

    pub async fn create_sqlx_pool() -> sqlx::PgPool {
        let dburl = env_var::get().database_url.clone();
        sqlx::postgres::PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .acquire_timeout(Duration::from_millis(1000))
            .idle_timeout(Duration::from_millis(1000 * 30))
            .max_lifetime(Duration::from_millis(1000 * 60 * 10))
            .connect(&dburl)
            .await
            .expect("Expect to create a database pool with a open connection")
    }
}

pub mod schema {
    use sqlx::PgPool;

    use crate::error::persistence::PersistenceError;

    pub const SCHEMA_SQL: &str = include_str!("../../dbschema.sql");

    pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
        sql.split(';').map(str::trim).filter(|sttm| !sttm.is_empty())
    }

    /// Creates the document table when missing.
    pub async fn apply(pool: &PgPool) -> Result<(), PersistenceError> {
        let mut trx = pool.begin().await?;
        for sttm in statements(SCHEMA_SQL) {
            sqlx::query(sttm).execute(&mut trx).await?;
        }
        trx.commit().await?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn splits_schema_statements() {
            let sttms: Vec<_> = statements(SCHEMA_SQL).collect();
            assert_eq!(sttms.len(), 3);
            assert!(sttms[1].starts_with("CREATE TABLE IF NOT EXISTS analyzer.food_analysis"));
        }
    }
}

pub mod repository {
    use futures::TryStreamExt;
    use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
    use uuid::Uuid;

    use crate::{
        domain::entity::{
            analysis::{FoodAnalysis, FoodAnalysisState},
            Entity, EntityData,
        },
        error::persistence::PersistenceError,
    };

    const SELECT_ANALYSIS: &str = concat!(
        "SELECT id, created, original_filename, image_format, image_base64, ",
        "food_data, analysis_date, user_session FROM analyzer.food_analysis",
    );

    fn analysis_from_row(row: &PgRow) -> Result<FoodAnalysis, PersistenceError> {
        let image_format: String = row.try_get("image_format")?;
        let Json(food_data) = row.try_get("food_data")?;

        Ok(FoodAnalysis::restore(
            EntityData::restore(row.try_get("id")?, row.try_get("created")?),
            FoodAnalysisState::new(
                row.try_get("original_filename")?,
                image_format
                    .parse()
                    .map_err(|_| PersistenceError::DecodeData)?,
                row.try_get("image_base64")?,
                food_data,
                row.try_get("analysis_date")?,
                row.try_get("user_session")?,
            ),
        ))
    }

    pub async fn insert_analysis(
        pool: &PgPool,
        analysis: &FoodAnalysis,
    ) -> Result<(), PersistenceError> {
        sqlx::query(concat!(
            "INSERT INTO analyzer.food_analysis (id, created, original_filename, image_format, ",
            "image_base64, food_data, analysis_date, user_session) ",
            "VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        ))
        .bind(analysis.ident())
        .bind(analysis.created())
        .bind(analysis.original_filename())
        .bind(analysis.image_format().as_str())
        .bind(analysis.image_base64())
        .bind(Json(analysis.food_data()))
        .bind(analysis.analysis_date())
        .bind(analysis.user_session())
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Most recent analyses first.
    pub async fn list_analyses(
        pool: &PgPool,
        limit: u32,
    ) -> Result<Vec<FoodAnalysis>, PersistenceError> {
        let sql = format!("{SELECT_ANALYSIS} ORDER BY created DESC LIMIT $1");
        let mut rows = sqlx::query(&sql).bind(i64::from(limit)).fetch(pool);

        let mut analyses = Vec::new();
        while let Some(row) = rows.try_next().await? {
            analyses.push(analysis_from_row(&row)?);
        }

        Ok(analyses)
    }

    pub async fn find_analysis(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<FoodAnalysis>, PersistenceError> {
        let sql = format!("{SELECT_ANALYSIS} WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;

        row.as_ref().map(analysis_from_row).transpose()
    }

    /// Returns whether a document was deleted.
    pub async fn delete_analysis(pool: &PgPool, id: Uuid) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM analyzer.food_analysis WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
