//! legacy exit status codes for system programs.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

/// value: 64 <br>
/// The command was used incorrectly, e.g., with the wrong number of arguments, a bad flag, a bad syntax in a parameter, etc.
pub const EX_USAGE: i32 = 64;

/// value: 66 <br>
/// The configuration file did not exist or was not readable.
pub const EX_NOINPUT: i32 = 66;

/// value: 69 <br>
/// A service is unavailable. Used when the transfer tool cannot be found on `PATH`.
pub const EX_UNAVAILABLE: i32 = 69;

/// value: 78 <br>
/// Something was found in an unconfigured or misconfigured state, e.g. an invalid
/// configuration file or a backup root that resolves to `/`.
pub const EX_CONFIG: i32 = 78;
