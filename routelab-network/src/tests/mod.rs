mod builder_tests;
mod support;
