pub mod course;
pub mod curriculum;
pub mod enrollment;
pub mod intent;
pub mod student;
pub mod term;
