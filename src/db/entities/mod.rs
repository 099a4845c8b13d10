//! SeaORM entity definitions for the TMF632 tables.

pub mod authorized_user;
pub mod characteristic;
pub mod organization;
pub mod time_period;
