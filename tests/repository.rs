mod support;

use bonnes_adresses::{
    AccountService, AddressRepository, Backend, RepositoryError, TransferError,
    models::comment::NewComment,
    services::address_repository::{comments_collection, sort_comments_chronologically},
};
use bonnes_adresses::models::address::Address;
use std::{collections::BTreeSet, time::Duration};
use support::{Fixture, PUBLIC_URL};

fn ids<'a>(addresses: impl IntoIterator<Item = &'a Address>) -> BTreeSet<String> {
    addresses.into_iter().map(|a| a.id.clone()).collect()
}

#[tokio::test]
async fn empty_name_or_description_is_rejected_without_write() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);

    for (name, description) in [("", "Nice spot"), ("Café X", ""), ("  ", "Nice spot")] {
        let err = repo
            .create_address(name, description, true, None)
            .await
            .expect_err("validation error");
        assert!(matches!(err, RepositoryError::Validation(_)), "got {err:?}");
    }
    assert_eq!(fx.document_count("adresses").await, 0);
}

#[tokio::test]
async fn operations_requiring_a_session_fail_when_signed_out() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.device());

    let err = repo
        .create_address("Café X", "Nice spot", true, None)
        .await
        .expect_err("needs session");
    assert!(matches!(err, RepositoryError::Unauthenticated));

    let err = repo.get_user_addresses().await.expect_err("needs session");
    assert!(matches!(err, RepositoryError::Unauthenticated));

    assert!(repo.get_public_addresses().await.expect("public list").is_empty());
}

#[tokio::test]
async fn cafe_scenario_appears_in_public_and_owner_listings() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);

    let id = repo
        .create_address("Café X", "Nice spot", true, None)
        .await
        .expect("create address");
    assert!(!id.is_empty());

    let public = repo.get_public_addresses().await.expect("public");
    let mine = repo.get_user_addresses().await.expect("mine");
    assert!(public.iter().any(|a| a.id == id));
    assert!(mine.iter().any(|a| a.id == id));

    let created = mine.iter().find(|a| a.id == id).expect("created address");
    assert_eq!(created.name, "Café X");
    assert_eq!(created.description, "Nice spot");
    assert!(created.is_public);
    assert!(created.image_url.is_none());
}

#[tokio::test]
async fn listings_filter_by_owner_and_visibility() {
    let fx = Fixture::new().await;
    let ana = AddressRepository::new(fx.signed_in_device("ana").await);
    let bob = AddressRepository::new(fx.signed_in_device("bob").await);

    let a_pub = ana.create_address("A1", "d", true, None).await.unwrap();
    let a_priv = ana.create_address("A2", "d", false, None).await.unwrap();
    let b_pub = bob.create_address("B1", "d", true, None).await.unwrap();
    let b_priv = bob.create_address("B2", "d", false, None).await.unwrap();

    let mine = ana.get_user_addresses().await.unwrap();
    assert_eq!(ids(&mine), BTreeSet::from([a_pub.clone(), a_priv]));

    let public = bob.get_public_addresses().await.unwrap();
    assert_eq!(ids(&public), BTreeSet::from([a_pub, b_pub.clone()]));

    let bobs = bob.get_user_addresses().await.unwrap();
    assert_eq!(ids(&bobs), BTreeSet::from([b_pub, b_priv]));
}

#[tokio::test]
async fn deleted_address_disappears_from_both_listings_with_its_comments() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);

    let id = repo.create_address("Café X", "Nice spot", true, None).await.unwrap();
    repo.add_address_comment(
        &id,
        NewComment {
            text: Some("Top".into()),
            username: "ana".into(),
            image_url: None,
        },
    )
    .await
    .unwrap();

    repo.delete_address(&id).await.expect("delete");

    assert!(!repo.get_public_addresses().await.unwrap().iter().any(|a| a.id == id));
    assert!(!repo.get_user_addresses().await.unwrap().iter().any(|a| a.id == id));
    assert_eq!(fx.document_count(&comments_collection(&id)).await, 0);
}

#[tokio::test]
async fn only_the_owner_can_delete() {
    let fx = Fixture::new().await;
    let ana = AddressRepository::new(fx.signed_in_device("ana").await);
    let bob = AddressRepository::new(fx.signed_in_device("bob").await);

    let id = ana.create_address("Café X", "Nice spot", true, None).await.unwrap();

    let err = bob.delete_address(&id).await.expect_err("not owner");
    assert!(matches!(err, RepositoryError::Forbidden(_)));
    assert!(ana.get_public_addresses().await.unwrap().iter().any(|a| a.id == id));

    let err = ana.delete_address("missing").await.expect_err("missing");
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn comments_sort_into_posting_order() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);
    let id = repo.create_address("Café X", "Nice spot", true, None).await.unwrap();

    let first = repo
        .add_address_comment(
            &id,
            NewComment {
                text: Some("first".into()),
                username: "ana".into(),
                image_url: None,
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = repo
        .add_address_comment(
            &id,
            NewComment {
                text: Some("second".into()),
                username: "bob".into(),
                image_url: None,
            },
        )
        .await
        .unwrap();

    let mut comments = repo.get_address_comments(&id).await.unwrap();
    comments.reverse();
    sort_comments_chronologically(&mut comments);

    let order: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, [first.as_str(), second.as_str()]);
    assert!(comments[0].created_at < comments[1].created_at);
    assert_eq!(comments[1].username, "bob");
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);
    let id = repo.create_address("Café X", "Nice spot", true, None).await.unwrap();

    let err = repo
        .add_address_comment(
            &id,
            NewComment {
                text: Some(String::new()),
                username: "ana".into(),
                image_url: None,
            },
        )
        .await
        .expect_err("empty comment");
    assert!(matches!(err, RepositoryError::Validation(_)));
    assert_eq!(fx.document_count(&comments_collection(&id)).await, 0);
}

#[tokio::test]
async fn address_photo_is_uploaded_before_the_write() {
    let fx = Fixture::new().await;
    let backend = fx.signed_in_device("ana").await;
    let uid = backend.session.uid().expect("uid");
    let repo = AddressRepository::new(backend.clone());
    let image = fx.picked_image("cafe.jpg", b"jpeg-bytes");
    let uri = format!("file://{image}");

    let id = repo
        .create_address("Café X", "Nice spot", false, Some(uri.as_str()))
        .await
        .expect("create with image");

    let address = repo.get_address(&id).await.unwrap();
    let url = address.image_url.expect("image url");
    let prefix = format!("{PUBLIC_URL}/files/addresses/{uid}/");
    assert!(url.starts_with(&prefix), "unexpected url {url}");

    let key = url.trim_start_matches(&format!("{PUBLIC_URL}/files/"));
    let (meta, _file) = backend.blobs.open(key).await.expect("open blob");
    assert_eq!(meta.size_bytes, 10);
    assert_eq!(meta.content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn failed_upload_creates_no_address() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);

    let err = repo
        .create_address("Café X", "Nice spot", true, Some("/definitely/not/here.jpg"))
        .await
        .expect_err("missing image");
    assert!(matches!(err, RepositoryError::Transfer(TransferError::Read { .. })));
    assert_eq!(fx.document_count("adresses").await, 0);
}

#[tokio::test]
async fn images_outside_the_picker_directory_are_refused() {
    let fx = Fixture::new().await;
    let repo = AddressRepository::new(fx.signed_in_device("ana").await);
    let escaped = format!("{}/../meta/test.db", fx.picker_root().display());

    for uri in ["/etc/passwd", "file:///etc/passwd", escaped.as_str()] {
        let err = repo
            .create_address("Café X", "Nice spot", true, Some(uri))
            .await
            .expect_err("outside picker directory");
        assert!(
            matches!(err, RepositoryError::Transfer(TransferError::Read { .. })),
            "{uri}: got {err:?}"
        );
    }
    assert_eq!(fx.document_count("adresses").await, 0);
    assert_eq!(fx.total_blobs().await, 0);
}

#[tokio::test]
async fn uploads_are_refused_without_a_picker_directory() {
    let fx = Fixture::new().await;
    let backend = Backend::sqlite(fx.db.clone(), fx.blob_root(), PUBLIC_URL);
    let accounts = AccountService::new(backend);
    accounts
        .sign_up("ana", "ana@example.com", "secret-pass")
        .await
        .expect("sign up");

    let image = fx.picked_image("me.png", b"png-bytes");
    let err = accounts
        .upload_profile_image(&image)
        .await
        .expect_err("no picker directory");
    assert!(matches!(err, RepositoryError::Transfer(TransferError::Read { .. })));
    assert_eq!(fx.total_blobs().await, 0);
}

#[tokio::test]
async fn profile_image_key_is_overwritten_not_duplicated() {
    let fx = Fixture::new().await;
    let backend = fx.signed_in_device("ana").await;
    let uid = backend.session.uid().expect("uid");
    let accounts = AccountService::new(backend.clone());

    let first = fx.picked_image("one.png", b"first");
    let second = fx.picked_image("two.png", b"second-version");
    let url_one = accounts.upload_profile_image(&first).await.expect("upload one");
    let url_two = accounts.upload_profile_image(&second).await.expect("upload two");

    assert_eq!(url_one, url_two);
    let key = format!("profile_pics/{uid}");
    assert_eq!(fx.blob_rows(&key).await, 1);
    let (meta, _file) = backend.blobs.open(&key).await.unwrap();
    assert_eq!(meta.size_bytes, "second-version".len() as i64);
    assert_eq!(meta.etag, format!("{:x}", md5::compute(b"second-version")));
}

#[tokio::test]
async fn home_profile_reports_username_and_optional_picture() {
    let fx = Fixture::new().await;
    let backend = fx.signed_in_device("ana").await;
    let accounts = AccountService::new(backend);

    let home = accounts.home_profile().await.expect("home");
    assert_eq!(home.username.as_deref(), Some("ana"));
    assert!(home.profile_image_url.is_none());

    let image = fx.picked_image("me.jpg", b"me");
    accounts.upload_profile_image(&image).await.unwrap();
    let home = accounts.home_profile().await.unwrap();
    assert!(home.profile_image_url.is_some());
}

#[tokio::test]
async fn sign_up_and_sign_in_validate_credentials() {
    let fx = Fixture::new().await;
    let accounts = AccountService::new(fx.device());

    let err = accounts.sign_up("", "ana@example.com", "secret-pass").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    let err = accounts.sign_up("ana", "ana@example.com", "123").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    accounts.sign_up("ana", "ana@example.com", "secret-pass").await.unwrap();
    let err = accounts.sign_up("ana2", "ANA@example.com", "secret-pass").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    accounts.sign_out();
    assert!(accounts.current_user().is_none());

    let err = accounts.sign_in("ana@example.com", "wrong-pass").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
    assert!(accounts.current_user().is_none());

    let user = accounts.sign_in("ana@example.com", "secret-pass").await.unwrap();
    assert_eq!(accounts.current_user(), Some(user));
}
