//! Company and job records, request payloads and repository functions.
//!
//! Repository functions take any [`GenericClient`](crate::GenericClient) and
//! run one autocommit statement per call (the duplicate pre-check on create is
//! a separate statement). Lookup misses are `NotFound`; duplicate natural keys
//! on create are `Conflict`.

mod company;
mod job;

pub use company::{COMPANY_FIELDS, Company, CompanyDetail, CompanyJob, CompanyUpdate, NewCompany};
pub use job::{JOB_FIELDS, Job, JobUpdate, NewJob};
