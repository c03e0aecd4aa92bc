use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use validator::Validate;

use crate::errors::AppError;
use crate::models::employee::{EmployeeUpdate, NewEmployee};

/// Text fields of a create/update request, keyed by field name.
pub type RawFields = HashMap<String, String>;

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(AppError::from)
}

/// Decodes the text fields of a create request into typed values.
pub fn decode_new_employee(
    mut fields: RawFields,
    profile_pic: Option<String>,
) -> Result<NewEmployee, AppError> {
    let employee = NewEmployee {
        first_name: fields.remove("first_name").unwrap_or_default(),
        last_name: fields.remove("last_name").unwrap_or_default(),
        email: fields.remove("email").unwrap_or_default(),
        position: non_empty(fields.remove("position")),
        salary: non_empty(fields.remove("salary")).map(|v| parse_salary(&v)).transpose()?,
        date_of_joining: non_empty(fields.remove("date_of_joining"))
            .map(|v| parse_date(&v))
            .transpose()?,
        department: non_empty(fields.remove("department")),
        profile_pic,
    };
    validate_payload(&employee)?;
    Ok(employee)
}

/// Decodes the fields present in an update request. An empty value for a
/// nullable field clears it.
pub fn decode_update(
    mut fields: RawFields,
    profile_pic: Option<String>,
) -> Result<EmployeeUpdate, AppError> {
    let update = EmployeeUpdate {
        first_name: fields.remove("first_name"),
        last_name: fields.remove("last_name"),
        email: fields.remove("email"),
        position: fields.remove("position").map(|v| non_empty(Some(v))),
        salary: fields
            .remove("salary")
            .map(|v| non_empty(Some(v)).map(|v| parse_salary(&v)).transpose())
            .transpose()?,
        date_of_joining: fields
            .remove("date_of_joining")
            .map(|v| non_empty(Some(v)).map(|v| parse_date(&v)).transpose())
            .transpose()?,
        department: fields.remove("department").map(|v| non_empty(Some(v))),
        profile_pic,
    };
    validate_payload(&update)?;
    Ok(update)
}

/// Flattens a JSON object body into text fields. `null` becomes an empty value.
pub fn fields_from_json(body: &[u8]) -> Result<RawFields, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RawFields::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| AppError::Validation(format!("invalid JSON body: {}", err)))?;
    let Value::Object(object) = value else {
        return Err(AppError::Validation("JSON body must be an object".to_string()));
    };

    let mut fields = RawFields::new();
    for (name, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::Validation(format!("{} must be a scalar value", name)))
            }
        };
        fields.insert(name, text);
    }
    Ok(fields)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_salary(value: &str) -> Result<f64, AppError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|salary| salary.is_finite())
        .ok_or_else(|| AppError::Validation(format!("salary must be a number, got \"{}\"", value)))
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| {
            AppError::Validation(format!("date_of_joining must be a date, got \"{}\"", value))
        })
}
