pub mod dataset;
pub mod employee;
pub mod exception;
pub mod filters;
pub mod query;
