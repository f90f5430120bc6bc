/// Progress callback, receives the bytes done, the bytes expected and a label for the file
pub type ProgressFn<'a> = dyn Fn(u64, u64, &str) + Send + Sync + 'a;

/// Status callback, receives a human readable description of the current action
pub type StatusFn<'a> = dyn Fn(&str) + Send + Sync + 'a;
