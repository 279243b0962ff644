pub mod models;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use self::models::{Appointment, AppointmentStatus, Role, UserRecord};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("User not found")]
    UserNotFound,
    #[error("Appointment not found")]
    AppointmentNotFound,
}

/// In-memory storage for users and appointments. The application keeps all
/// records in process, so every method takes `&self` and clones on read.
pub struct Storage {
    users: DashMap<Uuid, UserRecord>,
    // Email uniqueness index; the entry lock makes insert_user atomic.
    emails: DashMap<String, Uuid>,
    appointments: DashMap<Uuid, Appointment>,
}

impl Storage {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            appointments: DashMap::new(),
        }
    }

    pub fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    pub fn user_by_id(&self, id: Uuid) -> Option<UserRecord> {
        self.users.get(&id).map(|u| u.value().clone())
    }

    pub fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        let id = *self.emails.get(email)?;
        self.user_by_id(id)
    }

    /// All registered doctors, oldest registration first. The booking form
    /// and the dashboard roster both render this order.
    pub fn doctors(&self) -> Vec<UserRecord> {
        let mut doctors: Vec<UserRecord> = self
            .users
            .iter()
            .filter(|u| u.value().role == Role::Doctor)
            .map(|u| u.value().clone())
            .collect();
        doctors.sort_by_key(|u| u.created_at);
        doctors
    }

    pub fn insert_appointment(&self, appointment: Appointment) {
        self.appointments.insert(appointment.id, appointment);
    }

    pub fn appointment(&self, id: Uuid) -> Option<Appointment> {
        self.appointments.get(&id).map(|a| a.value().clone())
    }

    pub fn appointments_for_patient(&self, patient_id: Uuid) -> Vec<Appointment> {
        self.appointments_where(|a| a.patient_id == patient_id)
    }

    pub fn appointments_for_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        self.appointments_where(|a| a.doctor_id == doctor_id)
    }

    fn appointments_where(&self, predicate: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        let mut matches: Vec<Appointment> = self
            .appointments
            .iter()
            .filter(|a| predicate(a.value()))
            .map(|a| a.value().clone())
            .collect();
        matches.sort_by_key(|a| a.created_at);
        matches
    }

    /// Records the doctor's findings and closes the appointment.
    pub fn submit_diagnosis(
        &self,
        id: Uuid,
        diagnosis: String,
        treatment_plan: String,
        prescription: String,
    ) -> Result<(), StoreError> {
        let mut appointment = self
            .appointments
            .get_mut(&id)
            .ok_or(StoreError::AppointmentNotFound)?;
        appointment.diagnosis = Some(diagnosis);
        appointment.treatment_plan = Some(treatment_plan);
        appointment.prescription = Some(prescription);
        appointment.status = AppointmentStatus::Completed;
        Ok(())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads one demo patient and one demo doctor so a fresh process has
/// something to log in with (`--seed`).
pub fn seed_demo_data(storage: &Storage) -> Result<(), StoreError> {
    let now = Utc::now();

    storage.insert_user(UserRecord {
        id: Uuid::new_v4(),
        role: Role::Patient,
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        password_hash: crate::auth::password::hash_password("patient123"),
        age: 34,
        mobile: "555-0100".to_string(),
        address: Some("12 Elm St".to_string()),
        specialization: None,
        created_at: now,
    })?;

    storage.insert_user(UserRecord {
        id: Uuid::new_v4(),
        role: Role::Doctor,
        name: "Gregory House".to_string(),
        email: "house@example.com".to_string(),
        password_hash: crate::auth::password::hash_password("doctor123"),
        age: 52,
        mobile: "555-0199".to_string(),
        address: None,
        specialization: Some("Diagnostics".to_string()),
        created_at: now,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(email: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            role: Role::Patient,
            name: "Test Patient".to_string(),
            email: email.to_string(),
            password_hash: "unused".to_string(),
            age: 30,
            mobile: "555-0000".to_string(),
            address: Some("1 Test Lane".to_string()),
            specialization: None,
            created_at: Utc::now(),
        }
    }

    fn appointment(patient_id: Uuid, doctor_id: Uuid) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            date: "2025-03-01".to_string(),
            time: "10:30".to_string(),
            symptoms: "Headache".to_string(),
            status: AppointmentStatus::Pending,
            diagnosis: None,
            treatment_plan: None,
            prescription: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_email_rejected() {
        let storage = Storage::new();
        storage.insert_user(patient("a@example.com")).unwrap();
        assert_eq!(
            storage.insert_user(patient("a@example.com")),
            Err(StoreError::DuplicateEmail)
        );
    }

    #[test]
    fn lookup_by_email_and_id() {
        let storage = Storage::new();
        let user = patient("b@example.com");
        let id = user.id;
        storage.insert_user(user).unwrap();

        assert_eq!(storage.user_by_email("b@example.com").unwrap().id, id);
        assert_eq!(storage.user_by_id(id).unwrap().email, "b@example.com");
        assert!(storage.user_by_email("missing@example.com").is_none());
    }

    #[test]
    fn diagnosis_completes_appointment() {
        let storage = Storage::new();
        let appt = appointment(Uuid::new_v4(), Uuid::new_v4());
        let id = appt.id;
        storage.insert_appointment(appt);

        storage
            .submit_diagnosis(
                id,
                "Migraine".to_string(),
                "Rest".to_string(),
                "Ibuprofen".to_string(),
            )
            .unwrap();

        let stored = storage.appointment(id).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);
        assert_eq!(stored.diagnosis.as_deref(), Some("Migraine"));

        assert_eq!(
            storage.submit_diagnosis(
                Uuid::new_v4(),
                String::new(),
                String::new(),
                String::new()
            ),
            Err(StoreError::AppointmentNotFound)
        );
    }

    #[test]
    fn appointments_filtered_per_party() {
        let storage = Storage::new();
        let patient_id = Uuid::new_v4();
        let doctor_id = Uuid::new_v4();

        storage.insert_appointment(appointment(patient_id, doctor_id));
        storage.insert_appointment(appointment(Uuid::new_v4(), doctor_id));

        assert_eq!(storage.appointments_for_patient(patient_id).len(), 1);
        assert_eq!(storage.appointments_for_doctor(doctor_id).len(), 2);
    }
}
