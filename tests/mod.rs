mod smoke_tests;
mod store_mock;

// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the application:
// - smoke_tests: calculation, tier and report flows end to end
// - directory_mock: the directory actor against a mock worker API
// - store_mock: a JSON-backed store standing in for Redis
