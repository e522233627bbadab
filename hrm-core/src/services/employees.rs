//! Employee service
//!
//! Local-first employee lifecycle: the repository write is the operation,
//! the cloud mirror is scheduled afterwards and never awaited.

use crate::database::{Employee, Repository};
use crate::error::{AppError, Result};
use crate::sync::{SyncDispatcher, SyncEvent};

/// Service for managing employees
#[derive(Clone)]
pub struct EmployeeService {
    repo: Repository,
    dispatcher: SyncDispatcher,
}

impl EmployeeService {
    pub fn new(repo: Repository, dispatcher: SyncDispatcher) -> Self {
        Self { repo, dispatcher }
    }

    /// Create or update an employee. Returns the EPF number.
    pub async fn save(&self, employee: &Employee) -> Result<String> {
        validate(employee)?;

        tracing::info!("Saving employee: {}", employee.epf_number);

        let epf_number = self.repo.save_employee(employee).await?;

        self.dispatcher.dispatch(SyncEvent::EmployeeSaved {
            epf_number: epf_number.clone(),
        });

        Ok(epf_number)
    }

    pub async fn get(&self, epf_number: &str) -> Result<Option<Employee>> {
        self.repo.get_employee(epf_number).await
    }

    pub async fn list(&self) -> Result<Vec<Employee>> {
        self.repo.list_employees().await
    }

    /// Delete an employee locally, then its mirror
    pub async fn delete(&self, epf_number: &str) -> Result<()> {
        tracing::info!("Deleting employee: {}", epf_number);

        self.repo.delete_employee(epf_number).await?;

        self.dispatcher.dispatch(SyncEvent::EmployeeDeleted {
            epf_number: epf_number.to_string(),
        });

        Ok(())
    }
}

fn validate(employee: &Employee) -> Result<()> {
    if employee.epf_number.trim().is_empty() {
        return Err(AppError::Validation("EPF Number is required".to_string()));
    }
    // The EPF number doubles as a remote document id
    if employee.epf_number.contains('/') {
        return Err(AppError::Validation(
            "EPF Number must not contain '/'".to_string(),
        ));
    }
    if employee.name_with_initials.trim().is_empty() {
        return Err(AppError::Validation("Name with initials is required".to_string()));
    }
    if employee.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    Ok(())
}
