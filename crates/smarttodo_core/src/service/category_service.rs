//! Category use-case service.

use crate::model::category::{Category, CategoryId, CategoryNameError};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::RepoError;
use log::info;

#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error(transparent)]
    InvalidName(#[from] CategoryNameError),
    #[error("category name already in use: `{0}`")]
    NameConflict(String),
    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for CategoryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CategoryName(err) => Self::InvalidName(err),
            RepoError::CategoryNameConflict(name) => Self::NameConflict(name),
            RepoError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct CategoryService<C> {
    repo: C,
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Returns the category named `name`, creating it when missing. Usage
    /// counts are left alone.
    pub fn get_or_create_category(&self, name: &str) -> Result<Category, CategoryServiceError> {
        Ok(self.repo.get_or_create(name)?)
    }

    /// Most used first, ties by name; default limit 10.
    pub fn popular_categories(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.popular_categories(limit)?)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list_categories()?)
    }

    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CategoryServiceError> {
        Ok(self.repo.get_category(id)?)
    }

    pub fn rename_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, CategoryServiceError> {
        self.repo.rename_category(id, name)?;
        info!(
            "event=category_rename module=service status=ok category_id={}",
            id
        );
        self.repo
            .get_category(id)?
            .ok_or(CategoryServiceError::CategoryNotFound(id))
    }

    /// Deletes a category. Tasks that referenced it are kept uncategorized.
    pub fn delete_category(&self, id: CategoryId) -> Result<(), CategoryServiceError> {
        self.repo.delete_category(id)?;
        info!(
            "event=category_delete module=service status=ok category_id={}",
            id
        );
        Ok(())
    }
}
