use actix_web::error::QueryPayloadError;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::db::EmployeeStore;
use crate::errors::AppError;
use crate::models::employee::EmployeeFilter;
use crate::utils::upload::{self, EmployeePayload, UploadStore};
use crate::utils::validation;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/employees")
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .service(
                web::resource(vec!["", "/"])
                    .route(web::get().to(get_employees))
                    .route(web::post().to(create_employee)),
            )
            // Must stay ahead of "/{id}" or "search" is taken for an identifier.
            .service(web::resource("/search").route(web::get().to(search_employees)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_employee))
                    .route(web::put().to(update_employee))
                    .route(web::delete().to(delete_employee)),
            ),
    );
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Store(err.to_string()).into()
}

pub async fn get_employees(
    store: web::Data<dyn EmployeeStore>,
) -> Result<HttpResponse, AppError> {
    let employees = store.list_all().await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn search_employees(
    store: web::Data<dyn EmployeeStore>,
    query: web::Query<EmployeeFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().normalized();
    let employees = store.list_by_filter(&filter).await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee(
    store: web::Data<dyn EmployeeStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee = store.get_by_id(&id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn create_employee(
    req: HttpRequest,
    payload: web::Payload,
    store: web::Data<dyn EmployeeStore>,
    uploads: web::Data<UploadStore>,
) -> Result<HttpResponse, AppError> {
    let EmployeePayload { fields, profile_pic } =
        upload::read_payload(&req, payload, &uploads).await?;
    let reference = profile_pic.as_ref().map(|file| file.reference.clone());

    let created = match validation::decode_new_employee(fields, reference) {
        Ok(new_employee) => store.create(new_employee).await,
        Err(err) => Err(err),
    };

    match created {
        Ok(employee) => Ok(HttpResponse::Created().json(json!({
            "message": "Employee created successfully",
            "employee_id": employee.id,
        }))),
        Err(err) => {
            if let Some(file) = &profile_pic {
                uploads.discard(file).await;
            }
            Err(err.on_write())
        }
    }
}

pub async fn update_employee(
    req: HttpRequest,
    payload: web::Payload,
    id: web::Path<String>,
    store: web::Data<dyn EmployeeStore>,
    uploads: web::Data<UploadStore>,
) -> Result<HttpResponse, AppError> {
    let EmployeePayload { fields, profile_pic } =
        upload::read_payload(&req, payload, &uploads).await?;
    let reference = profile_pic.as_ref().map(|file| file.reference.clone());

    let updated = match validation::decode_update(fields, reference) {
        Ok(update) => store.update_by_id(&id, update).await,
        Err(err) => Err(err),
    };

    match updated {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Employee updated successfully",
        }))),
        Err(err) => {
            if let Some(file) = &profile_pic {
                uploads.discard(file).await;
            }
            Err(err.on_write())
        }
    }
}

pub async fn delete_employee(
    store: web::Data<dyn EmployeeStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    store.delete_by_id(&id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully",
    })))
}
