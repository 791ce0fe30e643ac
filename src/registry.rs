//! Process-wide catalog
//!
//! The catalog is installed once at startup and then read from anywhere
//! without synchronization. There is no way to replace it afterwards.

use std::sync::OnceLock;
use tracing::info;

use crate::CatalogError;
use crate::catalog::{Catalog, Cloud};

/// Single, module-private catalog (set exactly once).
static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Install the process-wide catalog
pub fn init(catalog: Catalog) -> Result<&'static Catalog, CatalogError> {
    let clouds = catalog.len();
    CATALOG
        .set(catalog)
        .map_err(|_| CatalogError::AlreadyInitialized)?;
    info!("Installed catalog with {} clouds", clouds);
    get()
}

/// Install the bundled catalog
pub fn init_builtin() -> Result<&'static Catalog, CatalogError> {
    init(Catalog::builtin()?)
}

/// The installed catalog
pub fn get() -> Result<&'static Catalog, CatalogError> {
    CATALOG.get().ok_or(CatalogError::NotInitialized)
}

/// Find a cloud in the installed catalog
pub fn find_cloud_by_hostname(hostname: &str) -> Result<&'static Cloud, CatalogError> {
    get()?.find_cloud_by_hostname(hostname)
}
