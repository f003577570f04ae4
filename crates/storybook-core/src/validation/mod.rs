//! Validation modules

pub mod child_info;
pub mod photo;

pub use child_info::{
    validate_child_age, validate_child_first_name, validate_gender, validate_language,
    validate_photo_url, MAX_CHILD_AGE, MAX_CHILD_NAME_LENGTH, MIN_CHILD_AGE,
};
pub use photo::{
    validate_photo_file, PhotoPolicy, ALLOWED_PHOTO_CONTENT_TYPES, MAX_PHOTO_SIZE_BYTES,
};
