// Command handlers for the portcullis CLI

pub mod list;
pub mod run;
pub mod validate;

pub use list::ListCommand;
pub use run::{exit_code_for, RunCommand};
pub use validate::ValidateCommand;
