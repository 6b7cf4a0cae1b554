pub mod caller;

pub use caller::{CALLER_HEADER, Caller, extract_caller};
