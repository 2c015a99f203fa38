pub mod source_record;
pub mod vacancy;
