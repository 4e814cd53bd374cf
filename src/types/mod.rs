pub mod enums;
pub mod events;
pub mod records;
pub mod response;

pub use enums::{Education, InvalidEnumValue, PrimaryField, Role, Sex, WorkPreference};
pub use events::{EventRecord, LedgerEvent};
pub use records::{
    Application, ApplicationState, Company, CompanyInput, Individual, IndividualInput, Job,
    JobId, JobInput, Timestamp, Tx, unix_now,
};
