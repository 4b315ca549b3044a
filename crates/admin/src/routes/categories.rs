//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::CategoryId;
use elegance_core::catalog::Category;
use elegance_core::checkout::FieldError;

use crate::db::{CategoryFields, CategoryRepository, CategoryRow, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{error_for, is_valid_slug, non_empty, slugify};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{Layout, redirect_with_error, redirect_with_success};

/// One row of the categories table.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub product_count: i64,
}

impl From<&CategoryRow> for CategoryView {
    fn from(row: &CategoryRow) -> Self {
        Self {
            id: row.category.id.as_i32(),
            name: row.category.name.clone(),
            slug: row.category.slug.clone(),
            description: row.category.description.clone().unwrap_or_default(),
            product_count: row.product_count,
        }
    }
}

/// Category form data.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
}

impl CategoryForm {
    fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone().unwrap_or_default(),
            image_url: category.image_url.clone().unwrap_or_default(),
        }
    }

    /// Validate, deriving a blank slug from the name.
    fn validate(&self) -> std::result::Result<CategoryFields, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        let slug = non_empty(&self.slug).map_or_else(|| slugify(name), |s| s.to_lowercase());
        if !is_valid_slug(&slug) {
            errors.push(FieldError::new(
                "slug",
                "Use lowercase letters, numbers, and single dashes",
            ));
        }
        let image_url = non_empty(&self.image_url);
        if image_url
            .as_deref()
            .is_some_and(|url| !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/')))
        {
            errors.push(FieldError::new("image_url", "Enter a URL or a /static path"));
        }

        if errors.is_empty() {
            Ok(CategoryFields {
                name: name.to_owned(),
                slug,
                description: non_empty(&self.description),
                image_url,
            })
        } else {
            Err(errors)
        }
    }
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
}

/// New/edit category template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub category_id: Option<i32>,
    pub form: CategoryForm,
    pub errors: Vec<FieldError>,
    pub form_error: Option<String>,
}

impl CategoryFormTemplate {
    /// First error message for a field.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        error_for(&self.errors, field)
    }

    /// Form action URL.
    #[must_use]
    pub fn action(&self) -> String {
        self.category_id
            .map_or_else(|| "/categories".to_owned(), |id| format!("/categories/{id}"))
    }
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(create))
        .route("/categories/new", get(new_category))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/edit", get(edit))
        .route("/categories/{id}/delete", post(delete))
}

/// List categories with product counts.
///
/// GET /categories
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
) -> Result<CategoriesIndexTemplate> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts()
        .await?;
    Ok(CategoriesIndexTemplate {
        layout,
        categories: categories.iter().map(CategoryView::from).collect(),
    })
}

/// Empty category form.
///
/// GET /categories/new
async fn new_category(
    RequireAdminAuth(_admin): RequireAdminAuth,
    layout: Layout,
) -> CategoryFormTemplate {
    CategoryFormTemplate {
        layout,
        category_id: None,
        form: CategoryForm::default(),
        errors: Vec::new(),
        form_error: None,
    }
}

/// Create a category.
///
/// POST /categories
#[instrument(skip(state, layout, admin, form), fields(admin_id = %admin.id))]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(&state, layout, None, form).await
}

/// Edit form for a category.
///
/// GET /categories/{id}/edit
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Path(id): Path<CategoryId>,
) -> Result<CategoryFormTemplate> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {id}")))?;

    Ok(CategoryFormTemplate {
        layout,
        category_id: Some(id.as_i32()),
        form: CategoryForm::from_category(&category),
        errors: Vec::new(),
        form_error: None,
    })
}

/// Update a category.
///
/// POST /categories/{id}
#[instrument(skip(state, layout, admin, form), fields(admin_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(&state, layout, Some(id), form).await
}

async fn save(
    state: &AppState,
    layout: Layout,
    id: Option<CategoryId>,
    form: CategoryForm,
) -> Result<Response> {
    let rerender = |form: CategoryForm, errors: Vec<FieldError>, form_error: Option<String>| {
        CategoryFormTemplate {
            layout,
            category_id: id.map(|id| id.as_i32()),
            form,
            errors,
            form_error,
        }
        .into_response()
    };

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => return Ok(rerender(form, errors, None)),
    };

    let repo = CategoryRepository::new(state.pool());
    let result = match id {
        Some(id) => repo.update(id, &fields).await.map(|()| id),
        None => repo.create(&fields).await,
    };

    match result {
        Ok(saved) => {
            tracing::info!(category_id = %saved, slug = %fields.slug, "Category saved");
            let message = if id.is_some() { "Category updated" } else { "Category created" };
            Ok(redirect_with_success("/categories", message).into_response())
        }
        Err(RepositoryError::Conflict(message)) => Ok(rerender(form, Vec::new(), Some(message))),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("Category".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Delete a category. Its products stay, uncategorised.
///
/// POST /categories/{id}/delete
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    match CategoryRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            Ok(redirect_with_success("/categories", "Category deleted"))
        }
        Err(RepositoryError::NotFound) => {
            Ok(redirect_with_error("/categories", "Category not found"))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_derives_slug() {
        let form = CategoryForm {
            name: "Occasion Abayas".to_owned(),
            ..CategoryForm::default()
        };
        let fields = form.validate().unwrap();
        assert_eq!(fields.slug, "occasion-abayas");
        assert_eq!(fields.description, None);
    }

    #[test]
    fn test_validate_errors() {
        let form = CategoryForm {
            name: " ".to_owned(),
            slug: "no spaces".to_owned(),
            image_url: "javascript:alert(1)".to_owned(),
            ..CategoryForm::default()
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "slug", "image_url"]);
    }
}
