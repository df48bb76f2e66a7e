//! image-harvest — core library for building image-classification datasets on disk.

pub mod layout;
pub mod resize;
pub mod split;
pub mod types;
pub mod verify;

pub use layout::{
    create_category_directories, get_image_files, is_images_setup, path_contains_images,
    random_image,
};
pub use resize::{
    resize_image, resize_images, resize_images_with, resize_to, ResizeOptions, DEFAULT_MAX_SIZE,
};
pub use split::{
    split_dataset, DatasetSplit, LabeledImage, Subset, DEFAULT_SEED, DEFAULT_VALID_PCT,
};
pub use types::*;
pub use verify::{delete_failed_images, verify_image, verify_images};
