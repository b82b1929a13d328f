pub mod cascade_face_detector;
pub mod haar_cascade;
pub mod math;
pub mod model_resolver;
pub mod rect_grouping;
