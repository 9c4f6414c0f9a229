pub mod fetch;
pub mod notify;
pub mod run;
pub mod source;
