//! Control of the media indexing service.
//!
//! The media database can only be deleted while the service that owns it is
//! stopped. [`ServiceManager`] is the seam between the reset command and the
//! operating system: [`SystemServiceManager`] talks to the Windows service
//! control manager, and reports service control as unsupported elsewhere.

use std::time::Duration;

use crate::error::Result;

/// Stops operating system services.
pub trait ServiceManager {
    /// Stop `name`, waiting up to `timeout` for it to reach the stopped
    /// state. A service that is already stopped is not an error.
    fn stop(&self, name: &str, timeout: Duration) -> Result<()>;
}

/// The platform's service control manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemServiceManager;

#[cfg(not(windows))]
impl ServiceManager for SystemServiceManager {
    fn stop(&self, name: &str, _timeout: Duration) -> Result<()> {
        Err(crate::error::Error::Service(format!(
            "cannot stop {:?}: service control is not supported on this platform",
            name
        )))
    }
}

#[cfg(windows)]
impl ServiceManager for SystemServiceManager {
    fn stop(&self, name: &str, timeout: Duration) -> Result<()> {
        windows::stop(name, timeout)
    }
}

#[cfg(windows)]
mod windows {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::ptr;
    use std::thread;
    use std::time::{Duration, Instant};

    use windows_sys::Win32::Foundation::{ERROR_SERVICE_NOT_ACTIVE, GetLastError};
    use windows_sys::Win32::System::Services::{
        CloseServiceHandle, ControlService, OpenSCManagerW, OpenServiceW, QueryServiceStatus,
        SC_HANDLE, SC_MANAGER_CONNECT, SERVICE_CONTROL_STOP, SERVICE_QUERY_STATUS, SERVICE_STATUS,
        SERVICE_STOP, SERVICE_STOPPED,
    };

    use crate::error::{Error, Result};

    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    /// Closes a service handle when dropped.
    struct Handle(SC_HANDLE);

    impl Drop for Handle {
        fn drop(&mut self) {
            unsafe {
                CloseServiceHandle(self.0);
            }
        }
    }

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    fn failure(name: &str, what: &str) -> Error {
        let code = unsafe { GetLastError() };
        Error::Service(format!("{} {:?} failed (error code: {})", what, name, code))
    }

    pub(super) fn stop(name: &str, timeout: Duration) -> Result<()> {
        let service_name = wide(name);
        unsafe {
            let manager = OpenSCManagerW(ptr::null(), ptr::null(), SC_MANAGER_CONNECT);
            if manager.is_null() {
                return Err(failure(name, "connecting to the service manager for"));
            }
            let manager = Handle(manager);

            let service = OpenServiceW(
                manager.0,
                service_name.as_ptr(),
                SERVICE_STOP | SERVICE_QUERY_STATUS,
            );
            if service.is_null() {
                return Err(failure(name, "opening service"));
            }
            let service = Handle(service);

            let mut status: SERVICE_STATUS = std::mem::zeroed();
            if ControlService(service.0, SERVICE_CONTROL_STOP, &mut status) == 0 {
                if GetLastError() == ERROR_SERVICE_NOT_ACTIVE {
                    tracing::debug!(service = name, "service already stopped");
                    return Ok(());
                }
                return Err(failure(name, "stopping service"));
            }

            let deadline = Instant::now() + timeout;
            loop {
                if status.dwCurrentState == SERVICE_STOPPED {
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    return Err(Error::Service(format!(
                        "service {:?} did not stop within {} seconds",
                        name,
                        timeout.as_secs()
                    )));
                }
                thread::sleep(POLL_INTERVAL);
                if QueryServiceStatus(service.0, &mut status) == 0 {
                    return Err(failure(name, "querying service"));
                }
            }
        }
    }
}
