//! Process identity used in filenames and record prefixes
//!
//! Program name, host name and OS user name back the `%P`, `%H` and `%U`
//! placeholders of the prefix templates.

use std::io;
use std::path::Path;

/// Identity of the running process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Basename of the executable
    pub program: String,
    /// Host name of the machine
    pub host: String,
    /// Name of the OS user running the process
    pub os_user: String,
}

impl Identity {
    /// Resolve the identity of the current process
    ///
    /// Fails only when the host name cannot be determined.
    pub fn resolve() -> io::Result<Self> {
        Ok(Self {
            program: program_name(),
            host: host_name()?,
            os_user: os_user_name(),
        })
    }
}

/// Keep the last component of a `\`-separated name (Windows account and
/// executable names)
fn last_backslash_component(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// Basename of `argv[0]`
pub fn program_name() -> String {
    let arg0 = std::env::args_os().next().unwrap_or_default();
    let base = Path::new(&arg0)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    last_backslash_component(&base).to_string()
}

/// Host name of the machine
#[cfg(unix)]
pub fn host_name() -> io::Result<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes and gethostname writes at most that many
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Host name of the machine
#[cfg(not(unix))]
pub fn host_name() -> io::Result<String> {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "host name not available"))
}

/// Name of the OS user, or "Unknown" if it cannot be determined
pub fn os_user_name() -> String {
    lookup_os_user()
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .filter(|name| !name.is_empty())
        .map(|name| last_backslash_component(&name).to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(unix)]
fn lookup_os_user() -> Option<String> {
    use std::ffi::CStr;

    // SAFETY: getuid has no preconditions
    let uid = unsafe { libc::getuid() };
    // SAFETY: passwd is a plain C struct; all-zero is a valid initial value
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    // SAFETY: every pointer refers to live storage of the advertised size
    let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
        return None;
    }

    // SAFETY: pw_name points into buf, which getpwuid_r NUL-terminated
    let name = unsafe { CStr::from_ptr(pwd.pw_name) };
    Some(name.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn lookup_os_user() -> Option<String> {
    None
}
