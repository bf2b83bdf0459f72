//! Server-rendered HTML pages.

use uuid::Uuid;

use catalog_core::defaults::THUMBNAIL_WIDTH;
use catalog_core::{
    format_price, ProductPage, ProductSearch, ProductSummary, ReorderList, SortDirection,
    SortField,
};

use crate::csrf::CsrfTokens;
use crate::flash::Flash;
use crate::forms::{FieldErrors, DESCRIPTION_FIELD, NAME_FIELD, NEW_IMAGES_FIELD, PRICE_FIELD};
use crate::messages::{translate, Locale};

const SORTABLE_JS: &str = "https://cdn.jsdelivr.net/npm/sortablejs@1.15.2/Sortable.min.js";

/// Per-request rendering context.
pub struct PageContext<'a> {
    pub locale: Locale,
    pub flashes: &'a [Flash],
}

impl PageContext<'_> {
    fn t(&self, id: &str) -> String {
        html_escape(translate(self.locale, id))
    }
}

/// One breadcrumb; the last one has no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub href: Option<String>,
}

/// Which product form is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    New,
    Edit(Uuid),
}

impl FormMode {
    fn action(&self) -> String {
        match self {
            FormMode::New => "/product/new".to_string(),
            FormMode::Edit(id) => format!("/product/{}/edit", id),
        }
    }

    fn title_id(&self) -> &'static str {
        match self {
            FormMode::New => "product.new",
            FormMode::Edit(_) => "product.edit",
        }
    }
}

/// Values shown in the product form.
pub struct FormView<'a> {
    pub mode: FormMode,
    pub name: &'a str,
    pub description: &'a str,
    pub price: &'a str,
    pub errors: &'a FieldErrors,
    /// Images currently shown by the reorder widget.
    pub images: &'a ReorderList,
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Home, product list, then the current page.
pub fn breadcrumbs(locale: Locale, current: Option<&str>) -> Vec<Crumb> {
    let mut crumbs = vec![Crumb {
        label: translate(locale, "breadcrumb.home").to_string(),
        href: Some("/".to_string()),
    }];
    let list = translate(locale, "product.list").to_string();
    match current {
        Some(id) => {
            crumbs.push(Crumb {
                label: list,
                href: Some("/product".to_string()),
            });
            crumbs.push(Crumb {
                label: translate(locale, id).to_string(),
                href: None,
            });
        }
        None => crumbs.push(Crumb {
            label: list,
            href: None,
        }),
    }
    crumbs
}

/// JSON list of `{id, name, url}` fed to the reorder widget.
pub fn images_data(images: &ReorderList) -> String {
    serde_json::to_string(images.items()).unwrap_or_else(|_| "[]".to_string())
}

/// Query string of a listing URL for `search` at `page`.
pub fn listing_query(search: &ProductSearch, page: i64, locale: Locale) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(q) = &search.query {
        params.push(("q", q.clone()));
    }
    if let Some(min) = search.min_price_cents {
        params.push(("min_price", format_price(min)));
    }
    if let Some(max) = search.max_price_cents {
        params.push(("max_price", format_price(max)));
    }
    if search.sort != SortField::default() {
        params.push(("sort", search.sort.as_str().to_string()));
    }
    if search.direction != SortDirection::default() {
        params.push(("direction", search.direction.as_str().to_string()));
    }
    if page > 1 {
        params.push(("page", page.to_string()));
    }
    if locale != Locale::default() {
        params.push(("locale", locale.as_str().to_string()));
    }
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn layout(ctx: &PageContext<'_>, title: &str, crumbs: &[Crumb], body: &str) -> String {
    let crumbs_html = crumbs
        .iter()
        .map(|c| match &c.href {
            Some(href) => format!(
                r#"<li><a href="{}">{}</a></li>"#,
                html_escape(href),
                html_escape(&c.label)
            ),
            None => format!(
                r#"<li aria-current="page">{}</li>"#,
                html_escape(&c.label)
            ),
        })
        .collect::<String>();

    let flashes_html = ctx
        .flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash flash-{kind}" role="alert">{text}</div>"#,
                kind = f.kind.as_str(),
                text = ctx.t(&f.message)
            )
        })
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Catalog</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0 auto; max-width: 960px; padding: 20px; color: #333; }}
        .breadcrumbs {{ list-style: none; display: flex; gap: 8px; padding: 0; font-size: 14px; }}
        .breadcrumbs li + li::before {{ content: "/"; margin-right: 8px; color: #999; }}
        .flash {{ padding: 12px; border-radius: 6px; margin-bottom: 12px; }}
        .flash-success {{ background: #e8f5e9; color: #2e7d32; }}
        .flash-error {{ background: #ffebee; color: #c62828; }}
        .flash-info {{ background: #e3f2fd; color: #1565c0; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 8px; border-bottom: 1px solid #eee; }}
        .field-error {{ color: #c62828; font-size: 13px; }}
        .reorder {{ list-style: none; padding: 0; display: flex; flex-wrap: wrap; gap: 12px; }}
        .reorder-item {{ border: 1px solid #ddd; border-radius: 6px; padding: 8px; cursor: move; background: #fff; }}
        .search {{ display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 16px; }}
    </style>
</head>
<body>
    <nav><ol class="breadcrumbs">{crumbs}</ol></nav>
    <h1>{title}</h1>
    {flashes}
    {body}
</body>
</html>"#,
        lang = ctx.locale.as_str(),
        title = html_escape(title),
        crumbs = crumbs_html,
        flashes = flashes_html,
        body = body,
    )
}

fn product_row(ctx: &PageContext<'_>, product: &ProductSummary, csrf: &CsrfTokens) -> String {
    let cover = match &product.cover_url {
        Some(url) => format!(
            r#"<img src="{}" width="{}" alt="{}">"#,
            html_escape(url),
            THUMBNAIL_WIDTH / 2,
            html_escape(&product.name)
        ),
        None => String::new(),
    };
    let token = csrf.token(&CsrfTokens::delete_intention(product.id));

    format!(
        r#"<tr>
        <td>{cover}</td>
        <td>{name}</td>
        <td>{price}</td>
        <td>{image_count}</td>
        <td>{created}</td>
        <td>
            <a href="/product/{id}/edit">{edit}</a>
            <form method="post" action="/product/{id}" onsubmit="return confirm('{confirm}');" style="display:inline">
                <input type="hidden" name="_method" value="DELETE">
                <input type="hidden" name="_token" value="{token}">
                <button type="submit">{delete}</button>
            </form>
        </td>
    </tr>"#,
        cover = cover,
        name = html_escape(&product.name),
        price = format_price(product.price_cents),
        image_count = product.image_count,
        created = product.created_at.format("%Y-%m-%d %H:%M"),
        id = product.id,
        edit = ctx.t("action.edit"),
        confirm = ctx.t("confirm.delete"),
        token = token,
        delete = ctx.t("action.delete"),
    )
}

fn search_form(ctx: &PageContext<'_>, search: &ProductSearch) -> String {
    let sort_options = SortField::ALL
        .iter()
        .map(|field| {
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = field.as_str(),
                selected = if *field == search.sort { " selected" } else { "" },
                label = ctx.t(&format!("sort.{}", field.as_str())),
            )
        })
        .collect::<String>();
    let direction_options = [SortDirection::Asc, SortDirection::Desc]
        .iter()
        .map(|dir| {
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = dir.as_str(),
                selected = if *dir == search.direction { " selected" } else { "" },
                label = ctx.t(&format!("direction.{}", dir.as_str())),
            )
        })
        .collect::<String>();

    format!(
        r#"<form class="search" method="get" action="/product">
        <input type="hidden" name="locale" value="{locale}">
        <input type="search" name="q" value="{q}" placeholder="{q_label}">
        <input type="text" name="min_price" value="{min}" placeholder="{min_label}" size="8">
        <input type="text" name="max_price" value="{max}" placeholder="{max_label}" size="8">
        <label>{sort_label} <select name="sort">{sort_options}</select></label>
        <label>{direction_label} <select name="direction">{direction_options}</select></label>
        <button type="submit">{search}</button>
    </form>"#,
        locale = ctx.locale.as_str(),
        q = html_escape(search.query.as_deref().unwrap_or("")),
        q_label = ctx.t("search.query"),
        min = search.min_price_cents.map(format_price).unwrap_or_default(),
        min_label = ctx.t("search.min_price"),
        max = search.max_price_cents.map(format_price).unwrap_or_default(),
        max_label = ctx.t("search.max_price"),
        sort_label = ctx.t("search.sort"),
        sort_options = sort_options,
        direction_label = ctx.t("search.direction"),
        direction_options = direction_options,
        search = ctx.t("action.search"),
    )
}

fn pagination(ctx: &PageContext<'_>, page: &ProductPage, search: &ProductSearch) -> String {
    let mut links = Vec::new();
    if page.has_previous() {
        links.push(format!(
            r#"<a rel="prev" href="/product?{}">{}</a>"#,
            html_escape(&listing_query(search, page.page - 1, ctx.locale)),
            ctx.t("pagination.previous")
        ));
    }
    links.push(format!(
        "<span>{} {} / {}</span>",
        ctx.t("pagination.page"),
        page.page,
        page.page_count()
    ));
    if page.has_next() {
        links.push(format!(
            r#"<a rel="next" href="/product?{}">{}</a>"#,
            html_escape(&listing_query(search, page.page + 1, ctx.locale)),
            ctx.t("pagination.next")
        ));
    }
    format!(r#"<nav class="pagination">{}</nav>"#, links.join(" "))
}

/// Product listing with search form, table and pagination.
pub fn index_page(
    ctx: &PageContext<'_>,
    page: &ProductPage,
    search: &ProductSearch,
    csrf: &CsrfTokens,
) -> String {
    let rows = if page.items.is_empty() {
        format!(r#"<tr><td colspan="6">{}</td></tr>"#, ctx.t("product.empty"))
    } else {
        page.items
            .iter()
            .map(|p| product_row(ctx, p, csrf))
            .collect::<String>()
    };

    let body = format!(
        r#"<p><a href="/product/new">{new}</a></p>
    {search_form}
    <table>
        <thead><tr><th></th><th>{name}</th><th>{price}</th><th>{images}</th><th>{created}</th><th></th></tr></thead>
        <tbody>{rows}</tbody>
    </table>
    {pagination}"#,
        new = ctx.t("product.new"),
        search_form = search_form(ctx, search),
        name = ctx.t("product.name"),
        price = ctx.t("product.price"),
        images = ctx.t("product.images"),
        created = ctx.t("product.created_at"),
        rows = rows,
        pagination = pagination(ctx, page, search),
    );

    layout(
        ctx,
        translate(ctx.locale, "product.list"),
        &breadcrumbs(ctx.locale, None),
        &body,
    )
}

/// The drag-and-drop list of current images with one hidden id field each.
fn reorder_widget(ctx: &PageContext<'_>, images: &ReorderList) -> String {
    let items = images
        .hidden_fields()
        .into_iter()
        .zip(images.items())
        .map(|((field, value), item)| {
            format!(
                r#"<li class="reorder-item" data-id="{id}">
                <img src="{url}" width="{width}" alt="{name}">
                <div>{name}</div>
                <input type="hidden" name="{field}" value="{value}">
                <a href="/product/download-image/{id}">{download}</a>
                <button type="button" class="reorder-remove">{remove}</button>
            </li>"#,
                id = item.id,
                url = html_escape(&item.url),
                width = THUMBNAIL_WIDTH,
                name = html_escape(&item.name),
                field = html_escape(&field),
                value = html_escape(&value),
                download = ctx.t("action.download"),
                remove = ctx.t("action.remove"),
            )
        })
        .collect::<String>();

    format!(
        r#"<ul id="image-reorder" class="reorder" data-images="{data}">{items}</ul>
    <script src="{sortable}"></script>
    <script>
        (function () {{
            var list = document.getElementById('image-reorder');
            function renumber() {{
                list.querySelectorAll('.reorder-item').forEach(function (item, i) {{
                    item.querySelector('input[type=hidden]').name = 'product[images][' + i + '][id]';
                }});
            }}
            list.addEventListener('click', function (e) {{
                if (e.target.classList.contains('reorder-remove')) {{
                    e.target.closest('.reorder-item').remove();
                    renumber();
                }}
            }});
            if (window.Sortable) {{
                Sortable.create(list, {{ animation: 150, onEnd: renumber }});
            }}
        }})();
    </script>"#,
        data = html_escape(&images_data(images)),
        items = items,
        sortable = SORTABLE_JS,
    )
}

fn field_error(ctx: &PageContext<'_>, errors: &FieldErrors, field: &str) -> String {
    match errors.get(field) {
        Some(id) => format!(r#"<div class="field-error">{}</div>"#, ctx.t(id)),
        None => String::new(),
    }
}

/// Create or edit form.
pub fn product_form_page(ctx: &PageContext<'_>, view: &FormView<'_>) -> String {
    let method_override = match view.mode {
        FormMode::New => "",
        FormMode::Edit(_) => r#"<input type="hidden" name="_method" value="PUT">"#,
    };
    let widget = match view.mode {
        FormMode::New => String::new(),
        FormMode::Edit(_) => format!(
            "<fieldset><legend>{}</legend>{}</fieldset>",
            ctx.t("product.images"),
            reorder_widget(ctx, view.images)
        ),
    };

    let body = format!(
        r#"<form method="post" action="{action}" enctype="multipart/form-data">
        {method_override}
        <p>
            <label for="name">{name_label}</label><br>
            <input id="name" type="text" name="{name_field}" value="{name}" required>
            {name_error}
        </p>
        <p>
            <label for="description">{description_label}</label><br>
            <textarea id="description" name="{description_field}" rows="5" cols="60">{description}</textarea>
            {description_error}
        </p>
        <p>
            <label for="price">{price_label}</label><br>
            <input id="price" type="text" name="{price_field}" value="{price}" inputmode="decimal" required>
            {price_error}
        </p>
        {widget}
        <p>
            <label for="new-images">{new_images_label}</label><br>
            <input id="new-images" type="file" name="{new_images_field}" accept="image/*" multiple>
        </p>
        <p><button type="submit">{save}</button> <a href="/product">{back}</a></p>
    </form>"#,
        action = view.mode.action(),
        method_override = method_override,
        name_label = ctx.t("product.name"),
        name_field = NAME_FIELD,
        name = html_escape(view.name),
        name_error = field_error(ctx, view.errors, NAME_FIELD),
        description_label = ctx.t("product.description"),
        description_field = DESCRIPTION_FIELD,
        description = html_escape(view.description),
        description_error = field_error(ctx, view.errors, DESCRIPTION_FIELD),
        price_label = ctx.t("product.price"),
        price_field = PRICE_FIELD,
        price = html_escape(view.price),
        price_error = field_error(ctx, view.errors, PRICE_FIELD),
        widget = widget,
        new_images_label = ctx.t("product.new_images"),
        new_images_field = NEW_IMAGES_FIELD,
        save = ctx.t("action.save"),
        back = ctx.t("action.back"),
    );

    let title_id = view.mode.title_id();
    layout(
        ctx,
        translate(ctx.locale, title_id),
        &breadcrumbs(ctx.locale, Some(title_id)),
        &body,
    )
}
