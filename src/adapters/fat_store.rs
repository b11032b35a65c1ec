//! FAT file store adapter.
//!
//! Implements [`FileStore`] with `std::fs` rooted at a base directory.  On
//! ESP-IDF the base is the VFS mount point of a wear-levelled FAT
//! partition, mounted by [`FatStore::mount`] and unmounted on drop; on the
//! host it is any directory.
//!
//! History file names (`YYYY-MM-DD.log`) are not 8.3 names, so the IDF
//! build must enable FATFS long file names (`CONFIG_FATFS_LFN_HEAP`).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{DirEntry, FileStore, StorageError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct FatStore {
    root: PathBuf,
    #[cfg(target_os = "espidf")]
    mount: Option<FatMount>,
}

#[cfg(target_os = "espidf")]
struct FatMount {
    base: [u8; 16],
    wl: wl_handle_t,
}

impl FatStore {
    /// Serve files from an existing directory.  Nothing is mounted.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            #[cfg(target_os = "espidf")]
            mount: None,
        }
    }

    /// Mount the FAT partition labelled `label` at `base` (e.g. `/fat`),
    /// formatting it if it cannot be mounted.
    #[cfg(target_os = "espidf")]
    pub fn mount(base: &str, label: &str) -> Result<Self, StorageError> {
        let c = |s: &str| -> Option<[u8; 16]> {
            (s.len() < 16 && !s.contains('\0')).then(|| {
                let mut buf = [0u8; 16];
                buf[..s.len()].copy_from_slice(s.as_bytes());
                buf
            })
        };
        let base_c = c(base).ok_or(StorageError::NotMounted)?;
        let label_c = c(label).ok_or(StorageError::NotMounted)?;

        let config = esp_vfs_fat_mount_config_t {
            format_if_mount_failed: true,
            max_files: 4,
            allocation_unit_size: 4096,
            ..Default::default()
        };
        let mut wl: wl_handle_t = WL_INVALID_HANDLE as wl_handle_t;
        // SAFETY: both strings are null-terminated and outlive the call;
        // `wl` is a valid out-pointer.
        let ret = unsafe {
            esp_vfs_fat_spiflash_mount_rw_wl(
                base_c.as_ptr() as *const _,
                label_c.as_ptr() as *const _,
                &config,
                &mut wl,
            )
        };
        if ret != ESP_OK as esp_err_t {
            log::error!("FatStore: mount of '{}' at {} failed (rc={})", label, base, ret);
            return Err(StorageError::NotMounted);
        }
        info!("FatStore: '{}' mounted at {}", label, base);
        Ok(Self {
            root: PathBuf::from(base),
            mount: Some(FatMount { base: base_c, wl }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a `/`-rooted store path onto the base directory.
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[cfg(target_os = "espidf")]
impl Drop for FatStore {
    fn drop(&mut self) {
        if let Some(m) = self.mount.take() {
            // SAFETY: `base` and `wl` are exactly what the mount returned.
            unsafe { esp_vfs_fat_spiflash_unmount_rw_wl(m.base.as_ptr() as *const _, m.wl) };
            info!("FatStore: unmounted");
        }
    }
}

fn storage_error(e: &io::Error) -> StorageError {
    match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound,
        io::ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError,
    }
}

impl FileStore for FatStore {
    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError> {
        let full = self.resolve(path);
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&full)
            .map_err(|e| storage_error(&e))?;
        writeln!(file, "{line}").map_err(|e| storage_error(&e))?;
        // Closed on drop; FAT only updates the directory entry on close.
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StorageError> {
        let full = self.resolve(path);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| storage_error(&e))? {
            let entry = entry.map_err(|e| storage_error(&e))?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        debug!("FatStore: {} entries under {}", entries.len(), full.display());
        Ok(entries)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(self.resolve(path)).map_err(|e| storage_error(&e))
    }
}
