//! Catalog-backed source.

use super::{ContentSource, MemberSource};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use storage::{Catalog, Material, MaterialId, MaterialSummary, Member};

/// Serves materials and the configured member from a local [`Catalog`].
pub struct LocalSource {
    catalog: Mutex<Catalog>,
    username: Option<String>,
}

impl LocalSource {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            username: None,
        }
    }

    /// Set the member reported by [`MemberSource::current_member`].
    pub fn with_member(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Direct access to the catalog for admin operations.
    pub fn catalog(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(err: storage::Error) -> Error {
    match err {
        storage::Error::NotFound(what) => Error::NotFound(what),
        other => Error::Storage(other),
    }
}

impl ContentSource for LocalSource {
    async fn list(&self, search: Option<&str>) -> Result<Vec<MaterialSummary>> {
        Ok(self.catalog().list_materials(search)?)
    }

    async fn fetch(&self, id: &MaterialId) -> Result<Material> {
        self.catalog().get_material(id).map_err(not_found)
    }
}

impl MemberSource for LocalSource {
    async fn current_member(&self) -> Result<Member> {
        let Some(username) = &self.username else {
            return Err(Error::Unauthorized("no member configured".to_string()));
        };

        self.catalog().get_member(username).map_err(|e| match e {
            storage::Error::NotFound(_) => Error::Unauthorized(format!("unknown member {username}")),
            other => Error::Storage(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::Rank;
    use storage::MaterialKind;

    #[tokio::test]
    async fn serves_catalog_contents() {
        let catalog = Catalog::in_memory().unwrap();
        let material = Material::new("Kuda-kuda", MaterialKind::Pdf, Rank::White, "file:///k.pdf");
        catalog.insert_material(&material).unwrap();
        catalog
            .upsert_member(&Member::new("dewi").with_rank(Rank::Yellow))
            .unwrap();

        let source = LocalSource::new(catalog).with_member("dewi");
        assert_eq!(source.list(None).await.unwrap().len(), 1);
        assert_eq!(source.fetch(&material.id).await.unwrap().url, "file:///k.pdf");
        assert_eq!(
            source.current_member().await.unwrap().rank,
            Some(Rank::Yellow)
        );
    }

    #[tokio::test]
    async fn missing_records_map_to_runtime_errors() {
        let source = LocalSource::new(Catalog::in_memory().unwrap());
        assert!(matches!(
            source.fetch(&MaterialId::from("nope")).await,
            Err(Error::NotFound(_))
        ));
        assert!(source.current_member().await.unwrap_err().is_unauthorized());

        let source = source.with_member("ghost");
        assert!(source.current_member().await.unwrap_err().is_unauthorized());
    }
}
