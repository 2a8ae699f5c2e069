pub mod retest_dto;
pub mod submission_dto;
