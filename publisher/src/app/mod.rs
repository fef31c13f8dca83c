pub mod console;
pub mod options;
pub mod replay;
pub mod state;
