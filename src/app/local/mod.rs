//! The local mirror on disk
//!
//! - [`inventory`] - What is on disk, grouped by year
//! - [`validation`] - Out-of-place and size checks

pub mod inventory;
pub mod validation;

pub use inventory::{year_from_dir_name, LocalInventory};
pub use validation::{
    classify, find_out_of_place, remove_files, OutOfPlaceFile, OutOfPlaceReason, SizeMismatch,
    SizeReport, SizeValidator,
};
