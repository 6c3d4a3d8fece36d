pub mod picker;
pub mod run;
