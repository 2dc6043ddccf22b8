//! Modal implementations for the UI system

pub mod cell_edit;
pub mod confirm;

pub use cell_edit::CellEditModal;
pub use confirm::ConfirmModal;
