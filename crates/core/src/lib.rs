pub mod config;
pub mod domain;
pub mod errors;

pub use domain::course::{Course, Sigle, SigleError};
pub use domain::curriculum::{CurriculumEntry, Offering};
pub use domain::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment};
pub use domain::intent::{Intent, IntentAction, IntentParameters};
pub use domain::student::{ActiveEnrollment, Program, Student, StudentContext};
pub use domain::term::{Season, Term, TermError};
pub use errors::ValidationFailure;
