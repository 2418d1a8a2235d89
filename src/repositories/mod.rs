pub(crate) mod answers;
pub(crate) mod assessments;
pub(crate) mod assignments;
pub(crate) mod class_subjects;
pub(crate) mod enrollments;
pub(crate) mod events;
pub(crate) mod questions;
pub(crate) mod teaching_periods;
pub(crate) mod users;
