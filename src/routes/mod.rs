pub mod health;
pub mod retest;
pub mod submission;
