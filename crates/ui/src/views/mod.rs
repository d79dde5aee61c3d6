pub mod dropdown;

pub use dropdown::{DropdownView, Section, render};
