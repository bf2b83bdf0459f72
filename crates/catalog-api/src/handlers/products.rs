//! Product admin pages: listing, create, edit, delete and image download.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use catalog_core::defaults::FIRST_PAGE;
use catalog_core::{
    format_price, parse_price_cents, Error, ImagePlan, PageRequest, ProductImage,
    ProductRepository, ProductSearch, ProductWithImages, ReorderList, SortDirection, SortField,
};

use crate::csrf::CsrfTokens;
use crate::error::ApiError;
use crate::flash::{self, Flash};
use crate::forms::{FieldErrors, ProductForm};
use crate::handlers::RequestContext;
use crate::state::AppState;
use crate::views::{self, FormMode, FormView};

const LIST_URL: &str = "/product";

/// Listing query string. Every value is optional and invalid ones are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    pub fn into_search(self) -> (ProductSearch, PageRequest) {
        let price = |raw: Option<String>| raw.as_deref().and_then(parse_price_cents);
        let search = ProductSearch {
            query: self.q,
            min_price_cents: price(self.min_price),
            max_price_cents: price(self.max_price),
            sort: self
                .sort
                .as_deref()
                .and_then(SortField::parse)
                .unwrap_or_default(),
            direction: self
                .direction
                .as_deref()
                .and_then(SortDirection::parse)
                .unwrap_or_default(),
        }
        .normalized();
        let page = self
            .page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(FIRST_PAGE);
        (search, PageRequest::new(page))
    }
}

/// Hidden fields of the delete form.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "_token")]
    pub token: Option<String>,
}

/// GET /product
pub async fn list_products(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let (search, page) = params.into_search();
    let results = state.db.products.list(&search, page).await?;

    Ok(ctx.render(StatusCode::OK, &[Flash::info("info.product.index")], |page_ctx| {
        views::index_page(page_ctx, &results, &search, &state.csrf)
    }))
}

/// GET /product/new
pub async fn new_product_form(ctx: RequestContext) -> Response {
    let errors = FieldErrors::default();
    let images = ReorderList::default();
    ctx.render(StatusCode::OK, &[Flash::info("info.product.new")], |page_ctx| {
        views::product_form_page(
            page_ctx,
            &FormView {
                mode: FormMode::New,
                name: "",
                description: "",
                price: "",
                errors: &errors,
                images: &images,
            },
        )
    })
}

/// POST /product/new
///
/// Field and image problems are reported together with status 422; nothing
/// is stored unless both pass.
pub async fn create_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = ProductForm::from_multipart(multipart).await?;
    let uploads = std::mem::take(&mut form.uploads);
    let fields = form.validate();
    let plan = state.lifecycle.plan_create(uploads);

    let (errors, image_error) = match (fields, plan) {
        (Ok(input), Ok(plan)) => {
            let image_count = plan.image_count();
            let id = state.db.create_product(input, plan).await?;
            info!(
                subsystem = "api",
                component = "products",
                op = "create",
                product_id = %id,
                image_count,
                "Product created"
            );
            return Ok(flash::redirect_with(LIST_URL, &[Flash::success("record.added")]));
        }
        (fields, plan) => (fields.err().unwrap_or_default(), plan.err()),
    };

    debug!(
        subsystem = "api",
        component = "products",
        op = "create",
        field_errors = !errors.is_empty(),
        image_error = image_error.as_ref().map(|e| e.message_id()),
        "Rejected product form"
    );

    let extra: Vec<Flash> = image_error
        .iter()
        .map(|e| Flash::error(e.message_id()))
        .collect();
    let images = ReorderList::default();
    Ok(ctx.render(StatusCode::UNPROCESSABLE_ENTITY, &extra, |page_ctx| {
        views::product_form_page(
            page_ctx,
            &FormView {
                mode: FormMode::New,
                name: &form.name,
                description: &form.description,
                price: &form.price,
                errors: &errors,
                images: &images,
            },
        )
    }))
}

async fn load_product(state: &AppState, id: Uuid) -> Result<ProductWithImages, ApiError> {
    state
        .db
        .products
        .fetch(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", id)))
}

/// GET /product/{id}/edit
pub async fn edit_product_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let existing = load_product(&state, id).await?;
    let product = &existing.product;
    let price = format_price(product.price_cents);
    let errors = FieldErrors::default();
    let images = ReorderList::from_images(&existing.images);

    Ok(ctx.render(StatusCode::OK, &[Flash::info("info.product.edit")], |page_ctx| {
        views::product_form_page(
            page_ctx,
            &FormView {
                mode: FormMode::Edit(id),
                name: &product.name,
                description: product.description.as_deref().unwrap_or(""),
                price: &price,
                errors: &errors,
                images: &images,
            },
        )
    }))
}

/// PUT /product/{id}/edit (POST accepted from HTML forms)
///
/// The widget's hidden fields are reconciled against the images loaded here,
/// before the form is bound. A rejected submission re-renders the form with
/// the order the user chose and changes nothing.
pub async fn update_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let existing = load_product(&state, id).await?;
    let mut form = ProductForm::from_multipart(multipart).await?;
    let uploads = std::mem::take(&mut form.uploads);
    let fields = form.validate();
    let outcome = state
        .lifecycle
        .plan_edit(&existing.images, &form.image_order, uploads);

    let (errors, shown, image_error) = match (fields, outcome) {
        (Ok(input), Ok(plan)) => {
            let image_count = plan.image_count();
            let removed = plan.removed.len();
            match state.db.update_product(id, input, plan).await {
                Ok(()) => {
                    info!(
                        subsystem = "api",
                        component = "products",
                        op = "update",
                        product_id = %id,
                        image_count,
                        removed_count = removed,
                        "Product updated"
                    );
                    return Ok(flash::redirect_with(
                        LIST_URL,
                        &[Flash::success("record.modified")],
                    ));
                }
                // Another edit removed every image this one kept
                Err(Error::Validation(e)) => {
                    let current = load_product(&state, id).await?;
                    (FieldErrors::default(), current.images, Some(e))
                }
                Err(e) => return Err(e.into()),
            }
        }
        (fields, Ok(plan)) => (
            fields.err().unwrap_or_default(),
            planned_images(&existing.images, &plan),
            None,
        ),
        (fields, Err((e, draft))) => (
            fields.err().unwrap_or_default(),
            draft.kept().to_vec(),
            Some(e),
        ),
    };

    debug!(
        subsystem = "api",
        component = "products",
        op = "update",
        product_id = %id,
        field_errors = !errors.is_empty(),
        image_error = image_error.as_ref().map(|e| e.message_id()),
        "Rejected product form"
    );

    let extra: Vec<Flash> = image_error
        .iter()
        .map(|e| Flash::error(e.message_id()))
        .collect();
    let images = ReorderList::from_images(&shown);
    Ok(ctx.render(StatusCode::UNPROCESSABLE_ENTITY, &extra, |page_ctx| {
        views::product_form_page(
            page_ctx,
            &FormView {
                mode: FormMode::Edit(id),
                name: &form.name,
                description: &form.description,
                price: &form.price,
                errors: &errors,
                images: &images,
            },
        )
    }))
}

/// Kept images of an accepted plan, in their new order.
fn planned_images(original: &[ProductImage], plan: &ImagePlan) -> Vec<ProductImage> {
    plan.reposition
        .iter()
        .filter_map(|update| {
            original
                .iter()
                .find(|image| image.id == update.image_id)
                .map(|image| ProductImage {
                    position: update.position,
                    ..image.clone()
                })
        })
        .collect()
}

/// DELETE /product/{id} (POST accepted from HTML forms)
///
/// Always answers 303 to the listing. A missing or invalid token, or a
/// product that no longer exists, deletes nothing and shows nothing.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    form: Option<Form<DeleteForm>>,
) -> Result<Response, ApiError> {
    let token = form
        .and_then(|Form(f)| f.token)
        .or_else(|| {
            headers
                .get("x-csrf-token")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();

    if !state
        .csrf
        .verify(&CsrfTokens::delete_intention(id), &token)
    {
        warn!(
            subsystem = "api",
            component = "products",
            op = "delete",
            product_id = %id,
            "Ignoring delete with invalid CSRF token"
        );
        return Ok(flash::redirect_with(LIST_URL, &[]));
    }

    match state.db.delete_product(id).await {
        Ok(freed) => {
            info!(
                subsystem = "api",
                component = "products",
                op = "delete",
                product_id = %id,
                image_count = freed,
                "Product deleted"
            );
            Ok(flash::redirect_with(LIST_URL, &[Flash::success("record.deleted")]))
        }
        Err(Error::ProductNotFound(_)) => {
            debug!(
                subsystem = "api",
                component = "products",
                op = "delete",
                product_id = %id,
                "Product already gone"
            );
            Ok(flash::redirect_with(LIST_URL, &[]))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /product/download-image/{id}
pub async fn download_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (image, data) = state.db.download_image(id).await?;

    let content_type = HeaderValue::from_str(&image.content_type)
        .map_err(|e| ApiError::Internal(format!("Invalid content type: {}", e)))?;
    let disposition = HeaderValue::from_str(&content_disposition(&image.display_name))
        .map_err(|e| ApiError::Internal(format!("Invalid filename header: {}", e)))?;

    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        data,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name.
fn content_disposition(display_name: &str) -> String {
    let ascii: String = display_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(display_name)
    )
}
