pub mod best_retest_result;
pub mod retest_assignment;
pub mod retest_target;
pub mod test_attempt;
