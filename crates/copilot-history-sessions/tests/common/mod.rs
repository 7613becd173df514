#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

pub const SESSION1: &str = "abc123-session1";
pub const SESSION2: &str = "def456-session2";

/// Helper: create a temp directory holding two Copilot session logs.
///
/// `abc123-session1` (5 events) is older than `def456-session2` (4 events).
pub fn create_test_sessions_dir() -> TempDir {
    let dir = TempDir::new().unwrap();

    let session1 = r#"{"type":"session.start","timestamp":"2025-12-01T10:00:00Z","data":{"sessionId":"abc123-session1","selectedModel":"gpt-4o"}}
{"type":"user.message","timestamp":"2025-12-01T10:01:00Z","data":{"content":"How do I create a Python function?"}}
{"type":"assistant.message","timestamp":"2025-12-01T10:01:30Z","data":{"content":"Here's how to create a Python function:","toolRequests":[]}}
{"type":"user.message","timestamp":"2025-12-01T10:02:00Z","data":{"content":"Can you edit my file?","attachments":[{"displayName":"main.py","path":"/src/main.py"}]}}
{"type":"assistant.message","timestamp":"2025-12-01T10:02:30Z","data":{"content":"I'll edit the file for you.","toolRequests":[{"name":"replace_string_in_file","arguments":{"filePath":"/src/main.py","oldString":"foo"}}]}}
"#;
    write_session(dir.path(), SESSION1, session1, 100);

    let session2 = r#"{"type":"session.start","timestamp":"2025-12-02T14:00:00Z","data":{"sessionId":"def456-session2","selectedModel":"claude-sonnet"}}
{"type":"user.message","timestamp":"2025-12-02T14:01:00Z","data":{"content":"Help me debug this error in utils.py"}}
{"type":"assistant.message","timestamp":"2025-12-02T14:01:30Z","data":{"content":"Let me look at that file.","toolRequests":[{"name":"read_file","arguments":{"filePath":"/src/utils.py"}}]}}
{"type":"tool.result","timestamp":"2025-12-02T14:01:35Z","data":{"result":{"content":"def helper(): pass"}}}
"#;
    write_session(dir.path(), SESSION2, session2, 50);

    dir
}

/// Write `<id>.jsonl` and back-date its mtime by `age_secs`.
pub fn write_session(dir: &Path, id: &str, content: &str, age_secs: u64) {
    let path = dir.join(format!("{}.jsonl", id));
    fs::write(&path, content).unwrap();
    set_age(&path, age_secs);
}

pub fn set_age(path: &Path, age_secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}
