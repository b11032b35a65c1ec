//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`KeyValueStore`] over one NVS namespace.  The namespace
//! handle is opened once by [`NvsAdapter::open`] and closed on drop, so the
//! store's lifetime is tied to whoever owns the adapter (normally
//! [`TempSensors`](crate::app::service::TempSensors)).
//!
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Keys are limited to 15 bytes by NVS; sensor identities use 14.
//! - The simulation backend is a plain in-memory map.

use log::info;

use crate::app::ports::{KeyValueStore, StorageError};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::warn;

/// Namespace holding names, the logging flag and the stored config.
pub const NAMESPACE: &str = "tempchain";

/// NVS limit for namespace and key names, excluding the terminator.
const MAX_KEY_LEN: usize = 15;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    handle: nvs_handle_t,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

/// Null-terminated copy of `name`, or `None` if NVS cannot hold it.
fn c_name(name: &str) -> Option<[u8; MAX_KEY_LEN + 1]> {
    if name.is_empty() || name.len() > MAX_KEY_LEN || name.contains('\0') {
        return None;
    }
    let mut buf = [0u8; MAX_KEY_LEN + 1];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    Some(buf)
}

impl NvsAdapter {
    /// Initialise NVS flash (erasing it on layout mismatch) and open
    /// `namespace` read-write.
    #[cfg(target_os = "espidf")]
    pub fn open(namespace: &str) -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
            || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
        {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK as esp_err_t
                || unsafe { nvs_flash_init() } != ESP_OK as esp_err_t
            {
                return Err(StorageError::IoError);
            }
        } else if ret != ESP_OK as esp_err_t {
            return Err(StorageError::IoError);
        }

        let ns = c_name(namespace).ok_or(StorageError::IoError)?;
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is null-terminated and `handle` is a valid out-pointer.
        let ret = unsafe {
            nvs_open(
                ns.as_ptr() as *const _,
                nvs_open_mode_t_NVS_READWRITE,
                &mut handle,
            )
        };
        if ret != ESP_OK as esp_err_t {
            warn!("NvsAdapter: nvs_open({}) failed (rc={})", namespace, ret);
            return Err(StorageError::IoError);
        }
        info!("NvsAdapter: namespace '{}' open", namespace);
        Ok(Self { handle })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn open(namespace: &str) -> Result<Self, StorageError> {
        c_name(namespace).ok_or(StorageError::IoError)?;
        info!("NvsAdapter: simulation backend for '{}'", namespace);
        Ok(Self {
            store: HashMap::new(),
        })
    }
}

#[cfg(target_os = "espidf")]
impl Drop for NvsAdapter {
    fn drop(&mut self) {
        // SAFETY: `handle` came from a successful nvs_open and is closed once.
        unsafe { nvs_close(self.handle) };
        info!("NvsAdapter: namespace closed");
    }
}

#[cfg(target_os = "espidf")]
impl KeyValueStore for NvsAdapter {
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key = c_name(key).ok_or(StorageError::IoError)?;
        let mut size = buf.len();
        // SAFETY: `buf` is valid for `size` bytes; NVS writes at most that.
        let ret = unsafe {
            nvs_get_blob(
                self.handle,
                key.as_ptr() as *const _,
                buf.as_mut_ptr() as *mut _,
                &mut size,
            )
        };
        if ret == ESP_OK as esp_err_t {
            Ok(size)
        } else if ret == ESP_ERR_NVS_NOT_FOUND as esp_err_t {
            Err(StorageError::NotFound)
        } else {
            Err(StorageError::IoError)
        }
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = c_name(key).ok_or(StorageError::IoError)?;
        // SAFETY: `data` is valid for `data.len()` bytes.
        let ret = unsafe {
            nvs_set_blob(
                self.handle,
                key.as_ptr() as *const _,
                data.as_ptr() as *const _,
                data.len(),
            )
        };
        if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t {
            return Err(StorageError::Full);
        }
        if ret != ESP_OK as esp_err_t
            || unsafe { nvs_commit(self.handle) } != ESP_OK as esp_err_t
        {
            return Err(StorageError::IoError);
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let key = c_name(key).ok_or(StorageError::IoError)?;
        // SAFETY: `key` is null-terminated.
        let ret = unsafe { nvs_erase_key(self.handle, key.as_ptr() as *const _) };
        if ret != ESP_OK as esp_err_t && ret != ESP_ERR_NVS_NOT_FOUND as esp_err_t {
            return Err(StorageError::IoError);
        }
        if unsafe { nvs_commit(self.handle) } != ESP_OK as esp_err_t {
            return Err(StorageError::IoError);
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        let Some(key) = c_name(key) else {
            return false;
        };
        // SAFETY: `key` is null-terminated; the type out-pointer may be null.
        let ret =
            unsafe { nvs_find_key(self.handle, key.as_ptr() as *const _, core::ptr::null_mut()) };
        ret == ESP_OK as esp_err_t
    }
}

#[cfg(not(target_os = "espidf"))]
impl KeyValueStore for NvsAdapter {
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        c_name(key).ok_or(StorageError::IoError)?;
        let data = self.store.get(key).ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        c_name(key).ok_or(StorageError::IoError)?;
        self.store.insert(key.to_owned(), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }
}
