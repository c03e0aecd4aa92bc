use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{not_found, parse_id, EmployeeStore};
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeFilter, EmployeeUpdate, NewEmployee};

const COLUMNS: &str =
    "id, first_name, last_name, email, position, salary, date_of_joining, department, profile_pic";

pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        PgEmployeeStore { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let sql = format!(
            "INSERT INTO employees ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            COLUMNS, COLUMNS
        );
        let created = sqlx::query_as::<_, Employee>(&sql)
            .bind(Uuid::new_v4())
            .bind(&employee.first_name)
            .bind(&employee.last_name)
            .bind(&employee.email)
            .bind(&employee.position)
            .bind(employee.salary)
            .bind(employee.date_of_joining)
            .bind(&employee.department)
            .bind(&employee.profile_pic)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_all(&self) -> Result<Vec<Employee>, AppError> {
        self.list_by_filter(&EmployeeFilter::default()).await
    }

    async fn list_by_filter(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        let mut query_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM employees", COLUMNS));

        if filter.department.is_some() || filter.position.is_some() {
            query_builder.push(" WHERE ");
            let mut conditions = query_builder.separated(" AND ");
            if let Some(department) = &filter.department {
                conditions.push("department = ").push_bind_unseparated(department.clone());
            }
            if let Some(position) = &filter.position {
                conditions.push("position = ").push_bind_unseparated(position.clone());
            }
        }
        query_builder.push(" ORDER BY created_at, id");

        let employees = query_builder
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn get_by_id(&self, id: &str) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        let sql = format!("SELECT {} FROM employees WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    async fn update_by_id(&self, id: &str, update: EmployeeUpdate) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        if update.is_empty() {
            return self.get_by_id(&id.to_string()).await;
        }

        let mut query_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE employees SET ");
        {
            let mut set_clauses = query_builder.separated(", ");
            if let Some(first_name) = update.first_name {
                set_clauses.push("first_name = ").push_bind_unseparated(first_name);
            }
            if let Some(last_name) = update.last_name {
                set_clauses.push("last_name = ").push_bind_unseparated(last_name);
            }
            if let Some(email) = update.email {
                set_clauses.push("email = ").push_bind_unseparated(email);
            }
            if let Some(position) = update.position {
                set_clauses.push("position = ").push_bind_unseparated(position);
            }
            if let Some(salary) = update.salary {
                set_clauses.push("salary = ").push_bind_unseparated(salary);
            }
            if let Some(date_of_joining) = update.date_of_joining {
                set_clauses.push("date_of_joining = ").push_bind_unseparated(date_of_joining);
            }
            if let Some(department) = update.department {
                set_clauses.push("department = ").push_bind_unseparated(department);
            }
            if let Some(profile_pic) = update.profile_pic {
                set_clauses.push("profile_pic = ").push_bind_unseparated(profile_pic);
            }
        }
        query_builder.push(" WHERE id = ").push_bind(id);
        query_builder.push(format!(" RETURNING {}", COLUMNS));

        query_builder
            .build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        let sql = format!("DELETE FROM employees WHERE id = $1 RETURNING {}", COLUMNS);
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }
}
