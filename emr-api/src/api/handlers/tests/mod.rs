mod ai_test;
mod health_test;
