mod create_tests;
mod dry_run_tests;
mod failure_tests;
mod interactive_tests;
mod update_tests;
