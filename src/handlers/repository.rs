use crate::models::all_models::{
    group_kpi_assignments, CredentialRecord, Department, Kpi, KpiAssignmentRow,
    KpiResultMonthlySummary, KpiResultPayload, KpiWithEmployees, User, UserCreate,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("username already registered: {0}")]
    DuplicateUsername(String),

    #[error("record missing after write: {0}")]
    Missing(String),
}

/// Typed access to the KPI store. Domain logic lives in stored procedures;
/// implementations only call them and map rows.
#[async_trait]
pub trait KpiRepository: Send + Sync {
    async fn find_user_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError>;

    /// Creates the employee and its login together. Nothing is written if
    /// either step fails.
    async fn register_user(
        &self,
        new_user: UserCreate,
        password_hash: String,
    ) -> Result<User, RepositoryError>;

    async fn list_departments(&self) -> Result<Vec<Department>, RepositoryError>;

    async fn assigned_kpis(&self, employee_id: i32) -> Result<Vec<Kpi>, RepositoryError>;

    async fn insert_kpi_result(
        &self,
        employee_id: i32,
        result: &KpiResultPayload,
    ) -> Result<(), RepositoryError>;

    async fn kpis_with_assignments(&self) -> Result<Vec<KpiWithEmployees>, RepositoryError>;

    /// Monthly averages of the employee's results between `start` and `end`,
    /// both inclusive.
    async fn monthly_summary(
        &self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<KpiResultMonthlySummary>, RepositoryError>;
}

/// Stored-procedure backed repository.
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRepository { pool }
    }
}

#[async_trait]
impl KpiRepository for MySqlRepository {
    async fn find_user_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        let query = "
            SELECT e.id AS employees_id, e.full_name, e.position, e.depart_id,
                   l.user_name, l.password
            FROM login l JOIN employees e ON l.employees_id = e.id
            WHERE l.user_name = ?";

        let record = sqlx::query_as::<_, CredentialRecord>(query)
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn register_user(
        &self,
        new_user: UserCreate,
        password_hash: String,
    ) -> Result<User, RepositoryError> {
        // Dropping `tx` on an early return rolls both inserts back.
        let mut tx = self.pool.begin().await?;

        let employee_id = sqlx::query_scalar::<_, u64>("CALL sp_insert_employees(?, ?, ?)")
            .bind(&new_user.full_name)
            .bind(&new_user.position)
            .bind(new_user.depart_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("CALL sp_insert_login(?, ?, ?)")
            .bind(&new_user.user_name)
            .bind(&password_hash)
            .bind(employee_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    RepositoryError::DuplicateUsername(new_user.user_name.clone())
                }
                other => RepositoryError::Database(other),
            })?;

        tx.commit().await?;

        self.find_user_by_username(&new_user.user_name)
            .await?
            .map(|record| record.user)
            .ok_or(RepositoryError::Missing(new_user.user_name))
    }

    async fn list_departments(&self) -> Result<Vec<Department>, RepositoryError> {
        let departments = sqlx::query_as::<_, Department>("CALL sp_select_department(NULL)")
            .fetch_all(&self.pool)
            .await?;
        Ok(departments)
    }

    async fn assigned_kpis(&self, employee_id: i32) -> Result<Vec<Kpi>, RepositoryError> {
        let kpis = sqlx::query_as::<_, Kpi>("CALL sp_select_assigned_kpis_by_employee(?)")
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(kpis)
    }

    async fn insert_kpi_result(
        &self,
        employee_id: i32,
        result: &KpiResultPayload,
    ) -> Result<(), RepositoryError> {
        sqlx::query("CALL sp_insert_kpi_result(?, ?, ?, ?, ?, ?)")
            .bind(employee_id)
            .bind(result.kpi_id)
            .bind(result.kpi_dividend_value)
            .bind(result.kpi_divisor_value)
            .bind(result.kpi_value)
            .bind(result.kpi_date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn kpis_with_assignments(&self) -> Result<Vec<KpiWithEmployees>, RepositoryError> {
        let rows = sqlx::query_as::<_, KpiAssignmentRow>("CALL sp_select_kpi_with_assignments()")
            .fetch_all(&self.pool)
            .await?;
        Ok(group_kpi_assignments(rows))
    }

    async fn monthly_summary(
        &self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<KpiResultMonthlySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, KpiResultMonthlySummary>(
            "CALL sp_select_kpi_results_monthly_summary(?, ?, ?)",
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
