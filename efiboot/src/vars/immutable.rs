// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inode immutable flag handling for efivarfs.
//!
//! Recent kernels mark most files in efivarfs immutable (`chattr +i`) so
//! that a stray `rm` cannot brick a machine. Writing or deleting such a file
//! fails with `EPERM` even for root until the flag is cleared.

use std::io;
use std::path::Path;

/// Clear the immutable flag of the file at `path` if it is set.
///
/// A missing file, or a filesystem without inode flags, is left alone.
#[cfg(target_os = "linux")]
pub(super) fn clear_immutable(path: &Path) -> io::Result<()> {
    use log::{debug, trace};
    use nix::libc::{c_int, c_long};
    use std::fs::File;
    use std::os::fd::AsRawFd;

    const FS_IMMUTABLE_FL: c_int = 0x10;

    nix::ioctl_read_bad!(
        fs_ioc_getflags,
        nix::request_code_read!(b'f', 1, core::mem::size_of::<c_long>()),
        c_int
    );
    nix::ioctl_write_ptr_bad!(
        fs_ioc_setflags,
        nix::request_code_write!(b'f', 2, core::mem::size_of::<c_long>()),
        c_int
    );

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    let mut flags: c_int = 0;
    // Safety: the descriptor stays open while `file` lives and `flags` is a
    // valid `int` for the kernel to fill in.
    if let Err(errno) = unsafe { fs_ioc_getflags(file.as_raw_fd(), &mut flags) } {
        trace!("no inode flags for {}: {errno}", path.display());
        return Ok(());
    }
    if flags & FS_IMMUTABLE_FL == 0 {
        return Ok(());
    }

    debug!("clearing immutable flag of {}", path.display());
    flags &= !FS_IMMUTABLE_FL;
    // Safety: as above, the kernel only reads `flags`.
    unsafe { fs_ioc_setflags(file.as_raw_fd(), &flags) }.map_err(io::Error::from)?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub(super) fn clear_immutable(_path: &Path) -> io::Result<()> {
    Ok(())
}
