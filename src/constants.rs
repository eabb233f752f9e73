/// Package name.
pub(crate) const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
pub(crate) const CONFIG_NAME: &str = "config.toml";
/// Parent of the system-wide configuration directory.
pub(crate) const SYSTEM_CONFIG_DIR: &str = "/etc";
/// The external program every item is transferred with.
pub const TRANSFER_TOOL: &str = "rsync";
/// Flags every transfer starts with: archive mode, and delete extraneous files at the destination.
pub const MIRROR_FLAGS: [&str; 2] = ["-a", "--delete"];
