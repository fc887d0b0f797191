// tests/image_tests.rs

mod common;

use bookmarks::counter::CounterStore;
use common::{image_items, spawn_app};

#[tokio::test]
async fn create_persists_for_submitter_and_records_one_action() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_and_login("alice").await;

    let response = app
        .client
        .post(app.url("/images/create"))
        .bearer_auth(&token)
        .form(&[
            ("title", "Sunset Over Lake"),
            ("url", "https://example.com/photos/sunset.jpg"),
            ("description", "<b>golden</b><script>alert(1)</script>"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 303);
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(location.starts_with("/images/detail/"));
    assert!(location.ends_with("/sunset-over-lake"));

    let (owner, description): (i64, Option<String>) =
        sqlx::query_as("SELECT user_id, description FROM images")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(owner, user_id);
    assert_eq!(description.as_deref(), Some("<b>golden</b>"));

    assert_eq!(
        app.count("SELECT COUNT(*) FROM actions WHERE verb = 'bookmarked image'").await,
        1
    );
}

#[tokio::test]
async fn invalid_submission_rerenders_form_without_persisting() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("bob").await;

    let response = app
        .client
        .post(app.url("/images/create"))
        .bearer_auth(&token)
        .form(&[("title", ""), ("url", "https://example.com/anim.gif")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("errorlist"));
    assert!(html.contains("does not match valid image extensions"));

    assert_eq!(app.count("SELECT COUNT(*) FROM images").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM actions").await, 0);
}

#[tokio::test]
async fn script_url_is_rejected_with_form_error() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("zoe").await;

    let response = app
        .client
        .post(app.url("/images/create"))
        .bearer_auth(&token)
        .form(&[
            ("title", "Sneaky"),
            ("url", "javascript://x/%0aalert(document.cookie)//a.jpg"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("Enter a valid URL."));
    assert_eq!(app.count("SELECT COUNT(*) FROM images").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM actions").await, 0);
}

#[tokio::test]
async fn bookmarklet_get_prefills_and_never_persists() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("carol").await;

    let response = app
        .client
        .get(app.url("/images/create"))
        .query(&[("title", "Mountain"), ("url", "https://example.com/m.png")])
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"value="Mountain""#));
    assert!(!html.contains("errorlist"));
    assert_eq!(app.count("SELECT COUNT(*) FROM images").await, 0);
}

#[tokio::test]
async fn create_requires_login() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/images/create"))
        .form(&[("title", "x"), ("url", "https://example.com/x.jpg")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(app.count("SELECT COUNT(*) FROM images").await, 0);
}

#[tokio::test]
async fn detail_counts_every_view() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("dave").await;
    let id = app.insert_image(user_id, "Cat", "cat").await;

    for expected in 1..=3 {
        let html = app
            .client
            .get(app.url(&format!("/images/detail/{}/cat", id)))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains(&format!(r#"<span class="views">{}</span>"#, expected)));
    }

    assert_eq!(app.counters.views(id).await.unwrap(), 3);
}

#[tokio::test]
async fn detail_without_payload_renders_fallback() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("erin").await;
    let id = app.insert_image(user_id, "No Pixels", "no-pixels").await;

    let response = app
        .client
        .get(app.url(&format!("/images/detail/{}/no-pixels", id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("No image available"));
    assert!(!html.contains("image-detail"));
}

#[tokio::test]
async fn like_button_only_for_logged_in_viewers() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_and_login("yuri").await;
    let id = app.insert_image(user_id, "Fern", "fern").await;
    let path = format!("/images/detail/{}/fern", id);

    let anonymous = app
        .client
        .get(app.url(&path))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!anonymous.contains(r#"class="like""#));
    assert!(!anonymous.contains("/images/like"));

    let logged_in = app
        .client
        .get(app.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(logged_in.contains(r#"class="like""#));
}

#[tokio::test]
async fn detail_requires_matching_slug() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("frank").await;
    let id = app.insert_image(user_id, "Dog", "dog").await;

    let wrong_slug = app
        .client
        .get(app.url(&format!("/images/detail/{}/cat", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_slug.status().as_u16(), 404);

    let missing = app
        .client
        .get(app.url("/images/detail/9999/dog"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    assert_eq!(app.counters.views(id).await.unwrap(), 0);
}

#[tokio::test]
async fn detail_shows_flash_once_after_create() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("gina").await;
    let id = app.insert_image(user_id, "Bird", "bird").await;

    let response = app
        .client
        .get(app.url(&format!("/images/detail/{}/bird", id)))
        .header(reqwest::header::COOKIE, "flash=image_added")
        .send()
        .await
        .unwrap();

    let cleared = response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("flash="));
    assert!(cleared, "flash cookie should be removed");
    assert!(response.text().await.unwrap().contains("Image added successfully"));
}

async fn like(app: &common::TestApp, token: &str, form: &[(&str, &str)]) -> serde_json::Value {
    app.client
        .post(app.url("/images/like"))
        .bearer_auth(token)
        .form(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn like_is_a_set_and_unlike_removes() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_and_login("hank").await;
    let id = app.insert_image(user_id, "Tree", "tree").await.to_string();

    for _ in 0..2 {
        let body = like(&app, &token, &[("id", id.as_str()), ("action", "like")]).await;
        assert_eq!(body["status"], "ok");
    }
    assert_eq!(app.count("SELECT COUNT(*) FROM image_likes").await, 1);
    // the repeat falls inside the duplicate window
    assert_eq!(app.count("SELECT COUNT(*) FROM actions WHERE verb = 'likes'").await, 1);

    let html = app
        .client
        .get(app.url(&format!("/images/detail/{}/tree", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"data-action="unlike""#));

    let body = like(&app, &token, &[("id", id.as_str()), ("action", "unlike")]).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(app.count("SELECT COUNT(*) FROM image_likes").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM actions WHERE verb = 'likes'").await, 1);
}

#[tokio::test]
async fn malformed_like_requests_return_error_status() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_and_login("ivy").await;
    let id = app.insert_image(user_id, "Leaf", "leaf").await.to_string();

    for form in [
        vec![("id", "9999"), ("action", "like")],
        vec![("action", "like")],
        vec![("id", id.as_str())],
        vec![("id", "abc"), ("action", "like")],
        vec![("id", id.as_str()), ("action", "love")],
    ] {
        let body = like(&app, &token, &form).await;
        assert_eq!(body["status"], "error", "form {:?}", form);
    }

    assert_eq!(app.count("SELECT COUNT(*) FROM image_likes").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM actions").await, 0);
}

async fn list(app: &common::TestApp, query: &str) -> (u16, String) {
    let response = app
        .client
        .get(app.url(&format!("/images/{}", query)))
        .send()
        .await
        .unwrap();
    (response.status().as_u16(), response.text().await.unwrap())
}

#[tokio::test]
async fn list_paginates_eight_per_page() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("jack").await;
    let mut ids = Vec::new();
    for n in 1..=17 {
        ids.push(app.insert_image(user_id, &format!("Image {}", n), &format!("image-{}", n)).await);
    }

    let (_, page1) = list(&app, "?page=1").await;
    let (_, page2) = list(&app, "?page=2").await;
    let (_, page3) = list(&app, "?page=3").await;
    assert_eq!(image_items(&page1), 8);
    assert_eq!(image_items(&page2), 8);
    assert_eq!(image_items(&page3), 1);

    // newest first; the oldest image is alone on the last page
    assert!(page1.contains(&format!(r#"data-image-id="{}""#, ids[16])));
    assert!(page3.contains(&format!(r#"data-image-id="{}""#, ids[0])));

    let (_, not_a_number) = list(&app, "?page=abc").await;
    assert_eq!(image_items(&not_a_number), 8);
    assert!(not_a_number.contains("Page 1 of 3"));

    let (_, no_page) = list(&app, "").await;
    assert!(no_page.contains("Page 1 of 3"));

    let (_, past_end) = list(&app, "?page=99").await;
    assert_eq!(image_items(&past_end), 1);
    assert!(past_end.contains("Page 3 of 3"));
}

#[tokio::test]
async fn list_fragment_reflects_current_page() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("kate").await;
    for n in 1..=17 {
        app.insert_image(user_id, &format!("Image {}", n), &format!("image-{}", n)).await;
    }

    let (status, fragment) = list(&app, "?images_only=1&page=3").await;
    assert_eq!(status, 200);
    assert_eq!(image_items(&fragment), 1);
    assert!(!fragment.contains("<html"));

    let (status, empty) = list(&app, "?images_only=1&page=99").await;
    assert_eq!(status, 200);
    assert!(empty.is_empty());
}

#[tokio::test]
async fn ranking_orders_by_views() {
    let app = spawn_app().await;
    let (user_id, _) = app.register_and_login("liam").await;
    let quiet = app.insert_image(user_id, "Quiet", "quiet").await;
    let popular = app.insert_image(user_id, "Popular", "popular").await;

    for (id, slug, views) in [(quiet, "quiet", 1), (popular, "popular", 3)] {
        for _ in 0..views {
            app.client
                .get(app.url(&format!("/images/detail/{}/{}", id, slug)))
                .send()
                .await
                .unwrap();
        }
    }

    let html = app
        .client
        .get(app.url("/images/ranking"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let popular_at = html.find(&format!(r#"data-image-id="{}""#, popular)).unwrap();
    let quiet_at = html.find(&format!(r#"data-image-id="{}""#, quiet)).unwrap();
    assert!(popular_at < quiet_at);
    assert!(html.contains(r#"<span class="views">3</span>"#));
}

#[tokio::test]
async fn actions_feed_lists_own_actions() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("mia").await;

    app.client
        .post(app.url("/images/create"))
        .bearer_auth(&token)
        .form(&[("title", "Wave"), ("url", "https://example.com/wave.png")])
        .send()
        .await
        .unwrap();

    let feed: Vec<serde_json::Value> = app
        .client
        .get(app.url("/account/actions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["verb"], "bookmarked image");
    assert_eq!(feed[0]["target_type"], "image");
}
