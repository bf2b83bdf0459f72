//! End-to-end image lifecycle against PostgreSQL and the filesystem backend.
//!
//! Covers creation with ordered images, edit reconciliation (reorder, remove,
//! append), rejected edits leaving the stored set untouched, concurrent edits
//! of one product, and deletion freeing every stored file.

use catalog_core::fixtures::sample_png;
use catalog_core::{
    Error, ImageLifecycleManager, ImageUpload, PageRequest, ProductImage, ProductInput,
    ProductRepository, ProductSearch, SortDirection, SortField, ValidationError,
};
use catalog_db::test_fixtures::TestDatabase;
use uuid::Uuid;

const LIMIT: usize = 10 * 1024 * 1024;

fn manager() -> ImageLifecycleManager {
    ImageLifecycleManager::new(LIMIT)
}

fn png(name: &str) -> ImageUpload {
    ImageUpload::new(name, "image/png", sample_png(2, 2))
}

fn input(name: &str, price_cents: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: None,
        price_cents,
    }
}

fn stored_file_count(test_db: &TestDatabase) -> usize {
    fn walk(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|entry| {
                        let path = entry.path();
                        if path.is_dir() {
                            walk(&path)
                        } else {
                            1
                        }
                    })
                    .sum()
            })
            .unwrap_or(0)
    }
    walk(&test_db.storage_dir)
}

async fn images_of(test_db: &TestDatabase, id: Uuid) -> Vec<ProductImage> {
    test_db
        .db
        .products
        .fetch(id)
        .await
        .expect("fetch")
        .expect("product exists")
        .images
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_create_with_two_images() {
    let test_db = TestDatabase::new().await;
    let plan = manager().plan_create(vec![png("a.png"), png("b.png")]).unwrap();
    let id = test_db.db.create_product(input("Lamp", 1999), plan).await.unwrap();

    let images = images_of(&test_db, id).await;
    let positions: Vec<i32> = images.iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(images[0].display_name, "a.png");
    assert_eq!(images[1].display_name, "b.png");
    for image in &images {
        assert!(test_db.has_file(&image.storage_path));
        assert_eq!(image.content_type, "image/png");
        assert_eq!((image.width, image.height), (2, 2));
    }

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_edit_keeps_two_of_three_in_new_order() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Chair", 3).await;
    let original = images_of(&test_db, id).await;

    let plan = manager()
        .plan_edit(&original, &[original[2].id, original[0].id], Vec::new())
        .map_err(|(e, _)| e)
        .unwrap();
    test_db
        .db
        .update_product(id, input("Chair", 500), plan)
        .await
        .unwrap();

    let after = images_of(&test_db, id).await;
    let ids: Vec<(Uuid, i32)> = after.iter().map(|i| (i.id, i.position)).collect();
    assert_eq!(ids, vec![(original[2].id, 0), (original[0].id, 1)]);

    // The removed image's file is freed; kept files remain
    assert!(!test_db.has_file(&original[1].storage_path));
    assert!(test_db.has_file(&original[0].storage_path));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_edit_appends_new_after_kept() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Desk", 2).await;
    let original = images_of(&test_db, id).await;

    let plan = manager()
        .plan_edit(
            &original,
            &[original[1].id, original[0].id],
            vec![png("new.png")],
        )
        .map_err(|(e, _)| e)
        .unwrap();
    test_db
        .db
        .update_product(id, input("Desk", 100), plan)
        .await
        .unwrap();

    let after = images_of(&test_db, id).await;
    assert_eq!(after.len(), 3);
    assert_eq!(after[0].id, original[1].id);
    assert_eq!(after[1].id, original[0].id);
    assert_eq!(after[2].display_name, "new.png");
    assert_eq!(after[2].position, 2);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_rejected_edit_changes_nothing() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Sofa", 2).await;
    let original = images_of(&test_db, id).await;

    let (err, _) = manager().plan_edit(&original, &[], Vec::new()).unwrap_err();
    assert_eq!(err, ValidationError::NoImages);

    let (err, _) = manager()
        .plan_edit(
            &original,
            &[original[0].id],
            vec![ImageUpload::new("a.txt", "text/plain", b"text".to_vec())],
        )
        .unwrap_err();
    assert!(matches!(err, ValidationError::NotAnImage { .. }));

    assert_eq!(images_of(&test_db, id).await, original);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_concurrent_edits_from_same_form_last_write_wins() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Sofa", 2).await;
    let original = images_of(&test_db, id).await;
    let kept = [original[0].id, original[1].id];

    let first = manager()
        .plan_edit(&original, &kept, vec![png("a.png")])
        .map_err(|(e, _)| e)
        .unwrap();
    let second = manager()
        .plan_edit(&original, &kept, vec![png("b.png")])
        .map_err(|(e, _)| e)
        .unwrap();

    let (r1, r2) = tokio::join!(
        test_db.db.update_product(id, input("Sofa", 100), first),
        test_db.db.update_product(id, input("Sofa", 200), second),
    );
    r1.unwrap();
    r2.unwrap();

    let after = test_db.db.products.fetch(id).await.unwrap().unwrap();
    let order: Vec<(&str, i32)> = after
        .images
        .iter()
        .map(|i| (i.display_name.as_str(), i.position))
        .collect();
    // Whichever edit committed last decides both the fields and the images
    let winner = if after.product.price_cents == 100 {
        "a.png"
    } else {
        "b.png"
    };
    assert_eq!(
        order,
        vec![("Sofa-0.png", 0), ("Sofa-1.png", 1), (winner, 2)]
    );

    // The losing upload's file is freed with its row
    assert_eq!(stored_file_count(&test_db), 3);
    for image in &after.images {
        assert!(test_db.has_file(&image.storage_path));
    }

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_edit_planned_before_a_removal_skips_the_removed_image() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Bench", 2).await;
    let original = images_of(&test_db, id).await;

    let stale = manager()
        .plan_edit(&original, &[original[1].id, original[0].id], Vec::new())
        .map_err(|(e, _)| e)
        .unwrap();
    let removal = manager()
        .plan_edit(&original, &[original[0].id], Vec::new())
        .map_err(|(e, _)| e)
        .unwrap();
    test_db
        .db
        .update_product(id, input("Bench", 100), removal)
        .await
        .unwrap();
    test_db
        .db
        .update_product(id, input("Bench", 150), stale)
        .await
        .unwrap();

    let after = images_of(&test_db, id).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, original[0].id);
    assert_eq!(after[0].position, 0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_edit_left_without_images_by_another_edit_is_rejected() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Stool", 2).await;
    let original = images_of(&test_db, id).await;

    let stale = manager()
        .plan_edit(&original, &[original[1].id], Vec::new())
        .map_err(|(e, _)| e)
        .unwrap();
    let removal = manager()
        .plan_edit(&original, &[original[0].id], Vec::new())
        .map_err(|(e, _)| e)
        .unwrap();
    test_db
        .db
        .update_product(id, input("Stool", 100), removal)
        .await
        .unwrap();

    let err = test_db
        .db
        .update_product(id, input("Renamed", 150), stale)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::ImagesChanged(p)) if p == id
    ));

    // The whole update rolled back
    let after = test_db.db.products.fetch(id).await.unwrap().unwrap();
    assert_eq!(after.product.name, "Stool");
    assert_eq!(after.images.len(), 1);
    assert_eq!(after.images[0].id, original[0].id);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_delete_removes_rows_and_files() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Table", 3).await;
    let original = images_of(&test_db, id).await;

    let removed = test_db.db.delete_product(id).await.unwrap();
    assert_eq!(removed, 3);

    assert!(!test_db.db.products.exists(id).await.unwrap());
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_image WHERE product_id = $1")
        .bind(id)
        .fetch_one(&test_db.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
    for image in &original {
        assert!(!test_db.has_file(&image.storage_path));
    }

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_delete_unknown_product() {
    let test_db = TestDatabase::new().await;
    let missing = Uuid::now_v7();
    assert!(matches!(
        test_db.db.delete_product(missing).await,
        Err(Error::ProductNotFound(id)) if id == missing
    ));
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_download_returns_stored_bytes() {
    let test_db = TestDatabase::new().await;
    let id = test_db.seed_product("Rug", 1).await;
    let image = images_of(&test_db, id).await.remove(0);

    let (row, data) = test_db.db.download_image(image.id).await.unwrap();
    assert_eq!(row.id, image.id);
    assert_eq!(data, sample_png(2, 2));

    assert!(matches!(
        test_db.db.download_image(Uuid::now_v7()).await,
        Err(Error::ImageNotFound(_))
    ));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_listing_paginates_four_per_page_newest_first() {
    let test_db = TestDatabase::new().await;
    let mut ids = Vec::new();
    for n in 0..6 {
        ids.push(test_db.seed_product(&format!("Item {}", n), 1).await);
    }

    let search = ProductSearch::default();
    let first = test_db
        .db
        .products
        .list(&search, PageRequest::new(1))
        .await
        .unwrap();
    assert_eq!(first.total, 6);
    assert_eq!(first.items.len(), 4);
    assert_eq!(first.page_count(), 2);
    assert_eq!(first.items[0].id, ids[5]);
    assert!(first.items.iter().all(|p| p.image_count == 1 && p.cover_url.is_some()));

    let second = test_db
        .db
        .products
        .list(&search, PageRequest::new(2))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.items[1].id, ids[0]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_listing_filters_and_sorts() {
    let test_db = TestDatabase::new().await;
    test_db.seed_product("Red lamp", 1).await;
    test_db.seed_product("Blue lamp", 1).await;
    test_db.seed_product("Green 100% chair", 1).await;

    let search = ProductSearch {
        query: Some("lamp".to_string()),
        sort: SortField::Name,
        direction: SortDirection::Asc,
        ..Default::default()
    };
    let page = test_db
        .db
        .products
        .list(&search, PageRequest::default())
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Blue lamp", "Red lamp"]);

    // Wildcards in the query match literally
    let search = ProductSearch {
        query: Some("100%".to_string()),
        ..Default::default()
    };
    let page = test_db
        .db
        .products
        .list(&search, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let search = ProductSearch {
        min_price_cents: Some(2000),
        ..Default::default()
    };
    let page = test_db
        .db
        .products
        .list(&search, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    test_db.cleanup().await;
}
