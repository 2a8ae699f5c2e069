pub mod attempt_resolver;
pub mod attempt_service;
pub mod audit_service;
pub mod best_score_service;
pub mod eligibility_service;
pub mod grading_service;
pub mod retest_service;
pub mod retest_state;
pub mod submission_service;
