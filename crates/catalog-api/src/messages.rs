//! UI message catalog and locale negotiation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Fr];

    /// Parse a language tag, ignoring region and case (`fr-CA` is `fr`).
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// Pick the locale for a request: explicit `?locale=`, then the
    /// highest-weighted supported `Accept-Language` entry, then `fallback`.
    pub fn negotiate(query: Option<&str>, accept_language: Option<&str>, fallback: Locale) -> Self {
        if let Some(locale) = query.and_then(Locale::parse) {
            return locale;
        }

        let mut best: Option<(f32, Locale)> = None;
        for entry in accept_language.unwrap_or("").split(',') {
            let mut parts = entry.split(';');
            let Some(locale) = parts.next().and_then(Locale::parse) else {
                continue;
            };
            let weight = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            if weight > 0.0 && best.map_or(true, |(w, _)| weight > w) {
                best = Some((weight, locale));
            }
        }
        best.map(|(_, l)| l).unwrap_or(fallback)
    }
}

/// Translate a message id. Unknown ids are returned as-is.
pub fn translate(locale: Locale, id: &str) -> &str {
    match lookup(id) {
        Some((en, fr)) => match locale {
            Locale::En => en,
            Locale::Fr => fr,
        },
        None => id,
    }
}

fn lookup(id: &str) -> Option<(&'static str, &'static str)> {
    let pair = match id {
        // Flash messages
        "record.added" => ("The product has been created.", "Le produit a été créé."),
        "record.modified" => ("The product has been updated.", "Le produit a été modifié."),
        "record.deleted" => ("The product has been deleted.", "Le produit a été supprimé."),
        "you_have_not_added_an_image" => (
            "You have not added an image.",
            "Vous n'avez pas ajouté d'image.",
        ),
        "one_of_the_files_is_not_an_image" => (
            "One of the files is not an image.",
            "L'un des fichiers n'est pas une image.",
        ),
        "one_of_the_files_is_too_large" => (
            "One of the files is too large.",
            "L'un des fichiers est trop volumineux.",
        ),
        "the_image_order_is_invalid" => (
            "The submitted images do not match this product. Please reload the page.",
            "Les images envoyées ne correspondent pas à ce produit. Veuillez recharger la page.",
        ),
        "info.product.index" => (
            "Browse, search and manage the catalog products.",
            "Parcourez, recherchez et gérez les produits du catalogue.",
        ),
        "info.product.new" => (
            "Fill in the product details and add at least one image.",
            "Renseignez le produit et ajoutez au moins une image.",
        ),
        "info.product.edit" => (
            "Drag images to reorder them, remove the ones you no longer want, or add new ones.",
            "Faites glisser les images pour les réordonner, retirez celles dont vous ne voulez plus ou ajoutez-en.",
        ),

        // Field errors
        "field.required" => ("This value should not be blank.", "Cette valeur ne doit pas être vide."),
        "field.too_long" => ("This value is too long.", "Cette valeur est trop longue."),
        "field.invalid_price" => (
            "Enter a positive price with at most two decimals.",
            "Saisissez un prix positif avec au plus deux décimales.",
        ),

        // Navigation
        "breadcrumb.home" => ("Home", "Accueil"),
        "product.list" => ("Products", "Produits"),
        "product.new" => ("New product", "Nouveau produit"),
        "product.edit" => ("Edit product", "Modifier le produit"),
        "product.empty" => ("No products found.", "Aucun produit trouvé."),

        // Fields
        "product.name" => ("Name", "Nom"),
        "product.description" => ("Description", "Description"),
        "product.price" => ("Price", "Prix"),
        "product.images" => ("Images", "Images"),
        "product.new_images" => ("Add images", "Ajouter des images"),
        "product.created_at" => ("Created", "Créé le"),

        // Actions
        "action.save" => ("Save", "Enregistrer"),
        "action.edit" => ("Edit", "Modifier"),
        "action.delete" => ("Delete", "Supprimer"),
        "action.remove" => ("Remove", "Retirer"),
        "action.download" => ("Download", "Télécharger"),
        "action.search" => ("Search", "Rechercher"),
        "action.back" => ("Back to list", "Retour à la liste"),
        "confirm.delete" => (
            "Delete this product and all of its images?",
            "Supprimer ce produit et toutes ses images ?",
        ),

        // Search
        "search.query" => ("Search", "Recherche"),
        "search.min_price" => ("Min price", "Prix min"),
        "search.max_price" => ("Max price", "Prix max"),
        "search.sort" => ("Sort by", "Trier par"),
        "search.direction" => ("Order", "Ordre"),
        "sort.created_at" => ("Date created", "Date de création"),
        "sort.name" => ("Name", "Nom"),
        "sort.price" => ("Price", "Prix"),
        "direction.asc" => ("Ascending", "Croissant"),
        "direction.desc" => ("Descending", "Décroissant"),

        // Pagination
        "pagination.previous" => ("Previous", "Précédent"),
        "pagination.next" => ("Next", "Suivant"),
        "pagination.page" => ("Page", "Page"),
        _ => return None,
    };
    Some(pair)
}
