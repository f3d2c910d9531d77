/*!
 * Common test utilities for the aisylum test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use aisylum::providers::mock::MockRemote;
use aisylum::{FallbackDispatcher, SessionManager};

// Re-export the scripted device module
pub mod mock_device;

use mock_device::FakeDevice;

/// Route `log` output through the test harness; `RUST_LOG` selects the level
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Everything a dispatcher test needs to observe
pub struct Harness {
    pub device: FakeDevice,
    pub remote: MockRemote,
    pub sessions: Arc<SessionManager>,
    pub dispatcher: FallbackDispatcher,
}

impl Harness {
    pub fn new(device: FakeDevice, remote: MockRemote) -> Self {
        init_test_logging();
        let sessions = Arc::new(SessionManager::init());
        let dispatcher = FallbackDispatcher::new(
            Arc::new(device.runtime()),
            Arc::clone(&sessions),
            Arc::new(remote.clone()),
        );
        Self {
            device,
            remote,
            sessions,
            dispatcher,
        }
    }

    /// Every capability available on-device, working remote
    pub fn available() -> Self {
        Self::new(FakeDevice::available(), MockRemote::working())
    }
}
