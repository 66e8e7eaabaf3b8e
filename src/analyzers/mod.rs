//! Failure classification and aggregation.
//!
//! Every clean record is graded against the passing threshold, then the
//! failures are summed per student, per group, per module and per
//! group-module pair.

pub mod aggregate;
pub mod grade;
pub mod types;
pub mod utility;
