mod config_test;
mod masking_test;
mod session_test;
