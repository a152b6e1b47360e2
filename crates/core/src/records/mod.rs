//! Typed record documents persisted as JSON text.

mod doctor;
mod patient;

pub use doctor::{
    Clinical, Digital, DoctorDocument, DutySchedule, Employment, Financial, Legal, Licensing,
    Performance, Personal, Qualifications, Research,
};
pub use patient::{
    Contact, DoseMark, History, MedicineEntry, PatientDocument, ScheduleSlot, Vitals,
};
