pub mod date_text;
pub mod salary;
pub mod time;
pub mod validation;
