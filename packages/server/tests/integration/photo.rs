use image::ImageFormat;

use crate::common::{TestApp, image_size, routes, sample_image};

mod upload {
    use super::*;

    #[tokio::test]
    async fn large_jpeg_is_downscaled_and_thumbnailed() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .upload_photo(
                "Big Shot.JPG",
                sample_image(2000, 1500, ImageFormat::Jpeg),
                Some("wide"),
                Some(&token),
            )
            .await;
        res.assert_redirect("/");

        let list = app.get_with_token(routes::MY_PHOTOS, &token).await;
        let photo = &list.body["data"][0];
        let pic_url = photo["pic_url"].as_str().unwrap();
        let thumb_url = photo["thumbnail_url"].as_str().unwrap();
        assert!(pic_url.starts_with("/media/photos/Big_Shot_"));
        assert!(pic_url.ends_with(".jpg"));
        assert!(thumb_url.starts_with("/media/thumbnails/thumb_Big_Shot_"));

        let pic = app.media_root.join(pic_url.trim_start_matches("/media/"));
        let thumb = app.media_root.join(thumb_url.trim_start_matches("/media/"));
        assert_eq!(image_size(&pic), (800, 600));
        assert_eq!(image_size(&thumb), (300, 225));
    }

    #[tokio::test]
    async fn tall_image_caps_height() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        app.upload_photo(
            "tall.png",
            sample_image(500, 1000, ImageFormat::Png),
            None,
            Some(&token),
        )
        .await
        .assert_redirect("/");

        let list = app.get_with_token(routes::MY_PHOTOS, &token).await;
        let photo = &list.body["data"][0];
        let pic = app
            .media_root
            .join(photo["pic_url"].as_str().unwrap().trim_start_matches("/media/"));
        let thumb = app.media_root.join(
            photo["thumbnail_url"]
                .as_str()
                .unwrap()
                .trim_start_matches("/media/"),
        );
        assert_eq!(image_size(&pic), (400, 800));
        assert_eq!(image_size(&thumb), (150, 300));
    }

    #[tokio::test]
    async fn small_image_is_stored_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let bytes = sample_image(640, 480, ImageFormat::Png);

        app.upload_photo("small.png", bytes.clone(), None, Some(&token))
            .await
            .assert_redirect("/");

        let list = app.get_with_token(routes::MY_PHOTOS, &token).await;
        let pic_url = list.body["data"][0]["pic_url"].as_str().unwrap().to_string();

        let served = app
            .client
            .get(app.url(&pic_url))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(served.as_ref(), bytes.as_slice());
    }

    #[tokio::test]
    async fn photo_is_attributed_to_the_uploader() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        app.create_photo(&token, "mine").await;

        let list = app.get_without_token(routes::INDEX).await;
        assert_eq!(list.body["data"][0]["username"], "alice");
        assert_eq!(list.body["data"][0]["message"], "mine");
    }

    #[tokio::test]
    async fn blank_message_defaults_to_no_comment() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        app.upload_photo(
            "cat.png",
            sample_image(10, 10, ImageFormat::Png),
            Some("   "),
            Some(&token),
        )
        .await
        .assert_redirect("/");

        let list = app.get_without_token(routes::INDEX).await;
        assert_eq!(list.body["data"][0]["message"], "no comment");
    }

    #[tokio::test]
    async fn anonymous_upload_redirects_to_login() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_photo(
                "cat.png",
                sample_image(10, 10, ImageFormat::Png),
                None,
                None,
            )
            .await;

        res.assert_redirect("/accounts/login/?next=/photos/create/");
        assert_eq!(app.photo_count().await, 0);
        assert!(app.media_files().is_empty());
    }

    #[tokio::test]
    async fn corrupt_image_is_rejected_without_leaving_files() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .upload_photo(
                "broken.jpg",
                b"this is not a jpeg".to_vec(),
                None,
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_IMAGE");
        assert_eq!(app.photo_count().await, 0);
        assert!(app.media_files().is_empty());
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .upload_photo(
                "notes.txt",
                sample_image(10, 10, ImageFormat::Png),
                None,
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.media_files().is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_with_413() {
        let app = TestApp::spawn_with(|config| config.media.max_upload_size = 1024).await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .upload_photo("huge.jpg", vec![0u8; 8 * 1024], None, Some(&token))
            .await;

        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(app.photo_count().await, 0);
        assert!(app.media_files().is_empty());
    }

    #[tokio::test]
    async fn large_webp_is_downscaled_and_thumbnailed() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .upload_photo(
                "wide.webp",
                sample_image(1200, 400, ImageFormat::WebP),
                None,
                Some(&token),
            )
            .await;
        res.assert_redirect("/");

        let list = app.get_with_token(routes::MY_PHOTOS, &token).await;
        let photo = &list.body["data"][0];
        let pic_url = photo["pic_url"].as_str().unwrap();
        let thumb_url = photo["thumbnail_url"].as_str().unwrap();
        assert!(pic_url.ends_with(".webp"));

        let pic = app.media_root.join(pic_url.trim_start_matches("/media/"));
        let thumb = app.media_root.join(thumb_url.trim_start_matches("/media/"));
        assert_eq!(image_size(&pic), (800, 266));
        assert_eq!(image_size(&thumb), (300, 100));
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let form = reqwest::multipart::Form::new().text("message", "no picture");
        let res = app
            .client
            .post(app.url(routes::CREATE_PHOTO))
            .header("Cookie", crate::common::session_cookie(&token))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn index_lists_newest_first_fifteen_per_page() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        for i in 0..17 {
            app.create_photo(&token, &format!("photo {i}")).await;
        }

        let first = app.get_without_token(routes::INDEX).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["data"].as_array().unwrap().len(), 15);
        assert_eq!(first.body["data"][0]["message"], "photo 16");
        assert_eq!(first.body["pagination"]["total"], 17);
        assert_eq!(first.body["pagination"]["total_pages"], 2);

        let second = app.get_without_token("/?page=2").await;
        assert_eq!(second.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(second.body["data"][1]["message"], "photo 0");
    }

    #[tokio::test]
    async fn my_photos_only_lists_the_callers_photos() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bobby").await;
        app.create_photo(&alice, "alice's").await;
        app.create_photo(&bob, "bob's").await;

        let res = app.get_with_token(routes::MY_PHOTOS, &alice).await;

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["message"], "alice's");
        assert_eq!(data[0]["editable"], true);
    }

    #[tokio::test]
    async fn index_marks_only_own_photos_editable() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bobby").await;
        app.create_photo(&alice, "alice's").await;

        let as_bob = app.get_with_token(routes::INDEX, &bob).await;
        assert_eq!(as_bob.body["data"][0]["editable"], false);

        let anonymous = app.get_without_token(routes::INDEX).await;
        assert_eq!(anonymous.body["data"][0]["editable"], false);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        app.create_photo(&token, "only one").await;

        let res = app.get_without_token("/?page=3").await;

        assert_eq!(res.status, 200);
        assert!(res.body["data"].as_array().unwrap().is_empty());
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["pagination"]["total_pages"], 1);
    }

    #[tokio::test]
    async fn huge_page_numbers_do_not_crash_the_listing() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        app.create_photo(&token, "only one").await;

        for page in ["18446744073709551615", "9223372036854775807"] {
            let res = app.get_without_token(&format!("/?page={page}")).await;
            assert_eq!(res.status, 200);
            assert!(res.body["data"].as_array().unwrap().is_empty());

            let mine = app
                .get_with_token(&format!("{}?page={page}", routes::MY_PHOTOS), &token)
                .await;
            assert_eq!(mine.status, 200);
            assert!(mine.body["data"].as_array().unwrap().is_empty());
        }

        // The server is still answering afterwards.
        let first = app.get_without_token(routes::INDEX).await;
        assert_eq!(first.body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_photo_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::photo_detail(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod editing {
    use super::*;

    #[tokio::test]
    async fn owner_edit_prepends_the_marker_once() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let id = app.create_photo(&token, "original").await;

        let res = app
            .post_form_with_token(&routes::photo_edit(id), &[("message", "changed")], &token)
            .await;
        res.assert_redirect("/");

        let detail = app.get_without_token(&routes::photo_detail(id)).await;
        let message = detail.body["photo"]["message"].as_str().unwrap().to_string();
        assert_eq!(message, "(edited) changed");

        // Re-submitting the stored text must not stack markers.
        app.post_form_with_token(&routes::photo_edit(id), &[("message", message.as_str())], &token)
            .await
            .assert_redirect("/");
        let detail = app.get_without_token(&routes::photo_detail(id)).await;
        assert_eq!(detail.body["photo"]["message"], "(edited) changed");
    }

    #[tokio::test]
    async fn message_at_the_limit_can_still_be_edited() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let id = app.create_photo(&token, "original").await;
        let long = "m".repeat(1995);

        app.post_form_with_token(&routes::photo_edit(id), &[("message", long.as_str())], &token)
            .await
            .assert_redirect("/");

        let detail = app.get_without_token(&routes::photo_detail(id)).await;
        assert_eq!(detail.body["photo"]["message"], format!("(edited) {long}"));

        let too_long = "m".repeat(2001);
        let res = app
            .post_form_with_token(&routes::photo_edit(id), &[("message", too_long.as_str())], &token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_owner_cannot_edit() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bobby").await;
        let id = app.create_photo(&alice, "original").await;

        let res = app
            .post_form_with_token(&routes::photo_edit(id), &[("message", "hijack")], &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        let detail = app.get_without_token(&routes::photo_detail(id)).await;
        assert_eq!(detail.body["photo"]["message"], "original");
    }

    #[tokio::test]
    async fn anonymous_edit_redirects_to_login() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_photo(&alice, "original").await;

        let res = app
            .post_form_without_token(&routes::photo_edit(id), &[("message", "x")])
            .await;

        res.assert_login_redirect();
    }

    #[tokio::test]
    async fn editing_an_unknown_photo_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_form_with_token(&routes::photo_edit(999), &[("message", "x")], &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod deletion {
    use photoboard::entity::photo_comment;
    use sea_orm::{EntityTrait, PaginatorTrait};

    use super::*;

    #[tokio::test]
    async fn owner_delete_removes_row_comments_and_files() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bobby").await;
        let id = app.create_photo(&alice, "bye").await;
        app.create_comment(id, "first", &bob).await;
        app.create_comment(id, "second", &alice).await;
        assert_eq!(app.media_files().len(), 2);

        let res = app
            .post_form_with_token(&routes::photo_delete(id), &[], &alice)
            .await;
        res.assert_redirect("/");

        assert_eq!(app.photo_count().await, 0);
        assert!(app.media_files().is_empty());
        let detail = app.get_without_token(&routes::photo_detail(id)).await;
        assert_eq!(detail.status, 404);

        let comments = photo_comment::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(comments, 0);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bobby").await;
        let id = app.create_photo(&alice, "keep").await;

        let res = app
            .post_form_with_token(&routes::photo_delete(id), &[], &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(app.photo_count().await, 1);
        assert_eq!(app.media_files().len(), 2);
    }
}
