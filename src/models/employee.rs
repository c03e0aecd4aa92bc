use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub date_of_joining: Option<NaiveDate>,
    pub department: Option<String>,
    pub profile_pic: Option<String>,
}

/// Fields of a record about to be inserted. The identifier is assigned by the store.
#[derive(Debug, Clone, Default, Validate)]
pub struct NewEmployee {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub date_of_joining: Option<NaiveDate>,
    pub department: Option<String>,
    pub profile_pic: Option<String>,
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Validate)]
pub struct EmployeeUpdate {
    #[validate(length(min = 1, message = "first_name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "last_name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "email cannot be empty"))]
    pub email: Option<String>,
    pub position: Option<Option<String>>,
    pub salary: Option<Option<f64>>,
    pub date_of_joining: Option<Option<NaiveDate>>,
    pub department: Option<Option<String>>,
    pub profile_pic: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub position: Option<String>,
}

impl Employee {
    pub fn from_new(id: Uuid, new_employee: NewEmployee) -> Self {
        Employee {
            id,
            first_name: new_employee.first_name,
            last_name: new_employee.last_name,
            email: new_employee.email,
            position: new_employee.position,
            salary: new_employee.salary,
            date_of_joining: new_employee.date_of_joining,
            department: new_employee.department,
            profile_pic: new_employee.profile_pic,
        }
    }

    pub fn apply(&mut self, update: EmployeeUpdate) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(salary) = update.salary {
            self.salary = salary;
        }
        if let Some(date_of_joining) = update.date_of_joining {
            self.date_of_joining = date_of_joining;
        }
        if let Some(department) = update.department {
            self.department = department;
        }
        if let Some(profile_pic) = update.profile_pic {
            self.profile_pic = Some(profile_pic);
        }
    }

    pub fn matches(&self, filter: &EmployeeFilter) -> bool {
        let department_ok = match &filter.department {
            Some(department) => self.department.as_deref() == Some(department.as_str()),
            None => true,
        };
        let position_ok = match &filter.position {
            Some(position) => self.position.as_deref() == Some(position.as_str()),
            None => true,
        };
        department_ok && position_ok
    }
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.position.is_none()
            && self.salary.is_none()
            && self.date_of_joining.is_none()
            && self.department.is_none()
            && self.profile_pic.is_none()
    }
}

impl EmployeeFilter {
    /// Empty query values impose no constraint.
    pub fn normalized(self) -> Self {
        EmployeeFilter {
            department: self.department.filter(|v| !v.is_empty()),
            position: self.position.filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Employee {
        Employee::from_new(
            Uuid::new_v4(),
            NewEmployee {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                position: Some("Engineer".into()),
                salary: Some(4000.0),
                department: Some("Eng".into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn apply_only_touches_provided_fields() {
        let mut employee = sample();
        let before = employee.clone();
        employee.apply(EmployeeUpdate { salary: Some(Some(5000.0)), ..Default::default() });
        assert_eq!(employee.salary, Some(5000.0));
        assert_eq!(employee.first_name, before.first_name);
        assert_eq!(employee.department, before.department);
        assert_eq!(employee.id, before.id);
    }

    #[test]
    fn apply_can_clear_nullable_fields() {
        let mut employee = sample();
        employee.apply(EmployeeUpdate { position: Some(None), ..Default::default() });
        assert_eq!(employee.position, None);
    }

    #[test]
    fn filter_is_exact_and_combined_with_and() {
        let employee = sample();
        let eng = EmployeeFilter { department: Some("Eng".into()), position: None };
        let eng_lower = EmployeeFilter { department: Some("eng".into()), position: None };
        let both = EmployeeFilter {
            department: Some("Eng".into()),
            position: Some("Manager".into()),
        };
        assert!(employee.matches(&eng));
        assert!(!employee.matches(&eng_lower));
        assert!(!employee.matches(&both));
        assert!(employee.matches(&EmployeeFilter::default()));
    }

    #[test]
    fn serializes_identifier_as_underscore_id() {
        let employee = sample();
        let json = serde_json::to_value(&employee).unwrap();
        assert_eq!(json["_id"], employee.id.to_string());
        assert!(json["profile_pic"].is_null());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn empty_filter_values_are_dropped() {
        let filter = EmployeeFilter {
            department: Some(String::new()),
            position: Some("Lead".into()),
        };
        assert_eq!(
            filter.normalized(),
            EmployeeFilter { department: None, position: Some("Lead".into()) }
        );
    }
}
