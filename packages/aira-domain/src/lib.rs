pub mod catalog;
pub mod history;
pub mod intent;
pub mod safety;
pub mod text;
