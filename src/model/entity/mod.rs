mod user;
pub use user::{BOOTSTRAP_ADMIN_EMAIL, BOOTSTRAP_ADMIN_USERNAME, UserEntity, UserEntityCreateUpdate};

mod classroom;
pub use classroom::{Classroom, ClassroomCreate};

mod membership;
pub use membership::{ClassMembership, EnrolledStudent};

mod course;
pub use course::{Course, CourseCreate};

mod exercise;
pub use exercise::{Exercise, ExerciseCreate, ExerciseFilter};

mod attempt;
pub use attempt::{ExerciseAttempt, ExerciseAttemptCreate};
