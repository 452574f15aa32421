pub mod category;
pub mod course;

pub use category::Category;
pub use course::{
    Course, CourseForm, CourseRequest, CourseType, ExecutionType, NewCourse, UnknownVariant,
};
