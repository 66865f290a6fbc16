#[cfg(test)]
mod completion_test;
