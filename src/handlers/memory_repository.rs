use crate::handlers::repository::{KpiRepository, RepositoryError};
use crate::models::all_models::{
    AssignedEmployee, CredentialRecord, Department, Kpi, KpiResultMonthlySummary,
    KpiResultPayload, KpiWithEmployees, User, UserCreate,
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    users: Vec<CredentialRecord>,
    departments: Vec<Department>,
    kpis: Vec<Kpi>,
    assignments: Vec<(i32, i32)>,
    results: Vec<(i32, KpiResultPayload)>,
    fail_writes: bool,
}

/// In-process stand-in for the stored procedures.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn add_department(&self, id: i32, depart_name: &str) {
        self.state.lock().unwrap().departments.push(Department {
            id,
            depart_name: depart_name.to_string(),
        });
    }

    pub fn add_kpi(&self, id: i32, kpi_name: &str, assigned_to: &[i32]) {
        let mut state = self.state.lock().unwrap();
        state.kpis.push(Kpi {
            id,
            kpi_name: Some(kpi_name.to_string()),
            kpi_decition: None,
            kpi_target_value: Some(100.0),
            kpi_frequency: Some("monthly".to_string()),
            kpi_dividend: None,
            kpi_divisor: None,
        });
        for employee_id in assigned_to {
            state.assignments.push((*employee_id, id));
        }
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    pub fn result_count(&self) -> usize {
        self.state.lock().unwrap().results.len()
    }
}

fn write_failure() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl KpiRepository for MemoryRepository {
    async fn find_user_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|r| r.user.user_name == user_name)
            .cloned())
    }

    async fn register_user(
        &self,
        new_user: UserCreate,
        password_hash: String,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(write_failure());
        }
        if state.users.iter().any(|r| r.user.user_name == new_user.user_name) {
            return Err(RepositoryError::DuplicateUsername(new_user.user_name));
        }

        let user = User {
            id: state.users.len() as i32 + 1,
            full_name: new_user.full_name,
            position: new_user.position,
            depart_id: new_user.depart_id,
            user_name: new_user.user_name,
        };
        state.users.push(CredentialRecord {
            user: user.clone(),
            password_hash,
        });
        Ok(user)
    }

    async fn list_departments(&self) -> Result<Vec<Department>, RepositoryError> {
        Ok(self.state.lock().unwrap().departments.clone())
    }

    async fn assigned_kpis(&self, employee_id: i32) -> Result<Vec<Kpi>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .kpis
            .iter()
            .filter(|kpi| state.assignments.contains(&(employee_id, kpi.id)))
            .cloned()
            .collect())
    }

    async fn insert_kpi_result(
        &self,
        employee_id: i32,
        result: &KpiResultPayload,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(write_failure());
        }
        state.results.push((employee_id, result.clone()));
        Ok(())
    }

    async fn kpis_with_assignments(&self) -> Result<Vec<KpiWithEmployees>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .kpis
            .iter()
            .map(|kpi| KpiWithEmployees {
                kpi: kpi.clone(),
                assigned_employees: state
                    .assignments
                    .iter()
                    .filter(|(_, kpi_id)| *kpi_id == kpi.id)
                    .filter_map(|(employee_id, _)| {
                        state.users.iter().find(|r| r.user.id == *employee_id)
                    })
                    .map(|r| AssignedEmployee {
                        id: r.user.id,
                        full_name: r.user.full_name.clone(),
                        position: r.user.position.clone(),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn monthly_summary(
        &self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<KpiResultMonthlySummary>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut buckets: Vec<(i32, NaiveDate, f64, u32)> = Vec::new();

        for (owner, result) in &state.results {
            if *owner != employee_id || result.kpi_date < start || result.kpi_date > end {
                continue;
            }
            let month = result.kpi_date.with_day(1).unwrap_or(result.kpi_date);
            match buckets
                .iter_mut()
                .find(|(kpi_id, m, _, _)| *kpi_id == result.kpi_id && *m == month)
            {
                Some(bucket) => {
                    bucket.2 += result.kpi_value;
                    bucket.3 += 1;
                }
                None => buckets.push((result.kpi_id, month, result.kpi_value, 1)),
            }
        }
        buckets.sort_by_key(|(kpi_id, month, _, _)| (*month, *kpi_id));

        Ok(buckets
            .into_iter()
            .map(|(kpi_id, month, sum, count)| {
                let kpi = state.kpis.iter().find(|k| k.id == kpi_id);
                KpiResultMonthlySummary {
                    kpi_id,
                    kpi_name: kpi.and_then(|k| k.kpi_name.clone()).unwrap_or_default(),
                    kpi_decition: kpi.and_then(|k| k.kpi_decition.clone()),
                    kpi_target_value: kpi.and_then(|k| k.kpi_target_value),
                    month,
                    avg_kpi_value: sum / f64::from(count),
                }
            })
            .collect())
    }
}
