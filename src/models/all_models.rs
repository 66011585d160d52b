use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        ErrorDetail {
            detail: detail.into(),
        }
    }
}

//  USERS & AUTHENTICATION

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[sqlx(rename = "employees_id")]
    pub id: i32,
    pub full_name: String,
    pub position: Option<String>,
    pub depart_id: i32,
    pub user_name: String,
}

/// A login row joined with its employee.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRecord {
    #[sqlx(flatten)]
    pub user: User,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserCreate {
    pub user_name: String,
    pub full_name: String,
    pub position: Option<String>,
    pub depart_id: i32,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

impl Token {
    pub fn bearer(access_token: String) -> Self {
        Token {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

//  DEPARTMENTS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i32,
    pub depart_name: String,
}

//  KPIS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Kpi {
    pub id: i32,
    pub kpi_name: Option<String>,
    pub kpi_decition: Option<String>,
    pub kpi_target_value: Option<f64>,
    pub kpi_frequency: Option<String>,
    pub kpi_dividend: Option<String>,
    pub kpi_divisor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedEmployee {
    pub id: i32,
    pub full_name: String,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiWithEmployees {
    #[serde(flatten)]
    pub kpi: Kpi,
    pub assigned_employees: Vec<AssignedEmployee>,
}

/// One row of `sp_select_kpi_with_assignments`: a KPI left-joined to a
/// single assigned employee.
#[derive(Debug, Clone, FromRow)]
pub struct KpiAssignmentRow {
    pub kpi_id: i32,
    pub kpi_name: Option<String>,
    pub kpi_decition: Option<String>,
    pub kpi_target_value: Option<f64>,
    pub kpi_frequency: Option<String>,
    pub kpi_dividend: Option<String>,
    pub kpi_divisor: Option<String>,
    pub employee_id: Option<i32>,
    pub employee_name: Option<String>,
    pub employee_position: Option<String>,
}

/// Folds joined rows into one entry per KPI, keeping the order in which KPIs
/// first appear and listing each employee once.
pub fn group_kpi_assignments(rows: Vec<KpiAssignmentRow>) -> Vec<KpiWithEmployees> {
    let mut grouped: Vec<KpiWithEmployees> = Vec::new();

    for row in rows {
        let index = match grouped.iter().position(|k| k.kpi.id == row.kpi_id) {
            Some(index) => index,
            None => {
                grouped.push(KpiWithEmployees {
                    kpi: Kpi {
                        id: row.kpi_id,
                        kpi_name: row.kpi_name,
                        kpi_decition: row.kpi_decition,
                        kpi_target_value: row.kpi_target_value,
                        kpi_frequency: row.kpi_frequency,
                        kpi_dividend: row.kpi_dividend,
                        kpi_divisor: row.kpi_divisor,
                    },
                    assigned_employees: Vec::new(),
                });
                grouped.len() - 1
            }
        };

        if let Some(employee_id) = row.employee_id {
            let employee = AssignedEmployee {
                id: employee_id,
                full_name: row.employee_name.unwrap_or_default(),
                position: row.employee_position,
            };
            let assigned = &mut grouped[index].assigned_employees;
            if !assigned.contains(&employee) {
                assigned.push(employee);
            }
        }
    }

    grouped
}

//  KPI RESULTS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResultPayload {
    pub kpi_id: i32,
    pub kpi_dividend_value: Option<f64>,
    pub kpi_divisor_value: Option<f64>,
    pub kpi_value: f64,
    pub kpi_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct KpiResultMonthlySummary {
    pub kpi_id: i32,
    pub kpi_name: String,
    pub kpi_decition: Option<String>,
    pub kpi_target_value: Option<f64>,
    pub month: NaiveDate,
    pub avg_kpi_value: f64,
}
