use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{not_found, parse_id, EmployeeStore};
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeFilter, EmployeeUpdate, NewEmployee};

/// Process-local store. Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryEmployeeStore {
    records: RwLock<Vec<Employee>>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let created = Employee::from_new(Uuid::new_v4(), employee);
        self.records.write().await.push(created.clone());
        Ok(created)
    }

    async fn list_all(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.records.read().await.clone())
    }

    async fn list_by_filter(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|e| e.matches(filter)).cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        let records = self.records.read().await;
        records.iter().find(|e| e.id == id).cloned().ok_or_else(not_found)
    }

    async fn update_by_id(&self, id: &str, update: EmployeeUpdate) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        let mut records = self.records.write().await;
        let employee = records.iter_mut().find(|e| e.id == id).ok_or_else(not_found)?;
        employee.apply(update);
        Ok(employee.clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        let mut records = self.records.write().await;
        let index = records.iter().position(|e| e.id == id).ok_or_else(not_found)?;
        Ok(records.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(first_name: &str, department: &str, position: &str) -> NewEmployee {
        NewEmployee {
            first_name: first_name.into(),
            last_name: "Doe".into(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            department: Some(department.into()),
            position: Some(position.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn filters_by_department_and_position() {
        let store = MemoryEmployeeStore::new();
        store.create(employee("Ann", "Eng", "Lead")).await.unwrap();
        store.create(employee("Bob", "Eng", "Engineer")).await.unwrap();
        store.create(employee("Cid", "Sales", "Lead")).await.unwrap();

        let eng = EmployeeFilter { department: Some("Eng".into()), position: None };
        let names: Vec<_> = store
            .list_by_filter(&eng)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.first_name)
            .collect();
        assert_eq!(names, vec!["Ann", "Bob"]);

        let eng_leads = EmployeeFilter {
            department: Some("Eng".into()),
            position: Some("Lead".into()),
        };
        let found = store.list_by_filter(&eng_leads).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Ann");

        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_merges_and_delete_returns_prior_state() {
        let store = MemoryEmployeeStore::new();
        let created = store.create(employee("Ann", "Eng", "Lead")).await.unwrap();
        let id = created.id.to_string();

        let update = EmployeeUpdate { salary: Some(Some(5000.0)), ..Default::default() };
        let updated = store.update_by_id(&id, update).await.unwrap();
        assert_eq!(updated.salary, Some(5000.0));
        assert_eq!(updated.department, created.department);

        let deleted = store.delete_by_id(&id).await.unwrap();
        assert_eq!(deleted, updated);
        assert!(matches!(store.get_by_id(&id).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.delete_by_id(&id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_id_is_a_store_error() {
        let store = MemoryEmployeeStore::new();
        assert!(matches!(store.get_by_id("not-an-id").await, Err(AppError::Store(_))));
    }
}
